//! Whitespace-separated sample files.
//!
//! One sample per line; blank lines and lines starting with `#` are skipped.
//!
//! ```text
//! # points and swath pixel centers
//! longitude latitude value [value2] [note]
//! # profiles (--vertical)
//! longitude latitude elevation surface_elevation value [value2] [note]
//! ```
//!
//! A trailing field that is not a number is the sample's note. Every line
//! must agree on whether `value2` is present.

use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use regrid::Samples;

/// Column layout of a sample file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// `longitude latitude value`
    Surface,
    /// `longitude latitude elevation surface_elevation value`
    Profile,
}

impl Layout {
    fn leading_fields(self) -> usize {
        match self {
            Self::Surface => 3,
            Self::Profile => 5,
        }
    }
}

/// Parsed sample columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleColumns {
    pub longitudes: Vec<f64>,
    pub latitudes: Vec<f64>,
    pub elevations: Vec<f64>,
    pub surface_elevations: Vec<f64>,
    pub values: Vec<f64>,
    pub values2: Option<Vec<f64>>,
    pub notes: Option<Vec<String>>,
}

impl SampleColumns {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Borrow the columns as engine input.
    pub fn samples(&self, layout: Layout) -> Samples<'_> {
        let mut samples = Samples::new(&self.longitudes, &self.latitudes, &self.values);

        if layout == Layout::Profile {
            samples = samples.with_elevations(&self.elevations, &self.surface_elevations);
        }
        if let Some(values2) = &self.values2 {
            samples = samples.with_values2(values2);
        }
        if let Some(notes) = &self.notes {
            samples = samples.with_notes(notes);
        }

        samples
    }
}

/// Read a sample file, or standard input for `-`.
pub fn read_samples(path: &Path, layout: Layout) -> Result<SampleColumns> {
    let text = if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read samples from standard input")?;
        text
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read samples from {:?}", path))?
    };

    parse_samples(&text, layout).with_context(|| format!("Failed to parse samples in {:?}", path))
}

/// Parse sample lines.
pub fn parse_samples(text: &str, layout: Layout) -> Result<SampleColumns> {
    let leading = layout.leading_fields();
    let mut columns = SampleColumns::default();
    let mut values2 = Vec::new();
    let mut notes = Vec::new();
    let mut has_value2 = None;
    let mut has_notes = false;

    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields: Vec<&str> = line.split_whitespace().collect();

        let note = if fields.last().is_some_and(|last| last.parse::<f64>().is_err()) {
            fields.pop()
        } else {
            None
        };

        let numbers = fields
            .iter()
            .map(|field| field.parse::<f64>())
            .collect::<std::result::Result<Vec<f64>, _>>()
            .with_context(|| format!("line {}: expected numbers", number + 1))?;

        let second = match numbers.len() {
            n if n == leading => false,
            n if n == leading + 1 => true,
            n => bail!(
                "line {}: expected {} or {} numbers, found {}",
                number + 1,
                leading,
                leading + 1,
                n
            ),
        };

        match has_value2 {
            None => has_value2 = Some(second),
            Some(expected) if expected != second => {
                bail!("line {}: value2 column is not present on every line", number + 1)
            }
            Some(_) => {}
        }

        columns.longitudes.push(numbers[0]);
        columns.latitudes.push(numbers[1]);

        if layout == Layout::Profile {
            columns.elevations.push(numbers[2]);
            columns.surface_elevations.push(numbers[3]);
        }

        columns.values.push(numbers[leading - 1]);

        if second {
            values2.push(numbers[leading]);
        }

        has_notes |= note.is_some();
        notes.push(note.unwrap_or_default().to_string());
    }

    if has_value2 == Some(true) {
        columns.values2 = Some(values2);
    }
    if has_notes {
        columns.notes = Some(notes);
    }

    Ok(columns)
}

/// Parse a `ROWSxCOLUMNS` swath shape.
pub fn parse_shape(text: &str) -> Result<(usize, usize)> {
    let (rows, columns) = text
        .split_once(|c: char| c == 'x' || c == 'X')
        .with_context(|| format!("swath shape '{text}' is not ROWSxCOLUMNS"))?;

    let rows = rows
        .trim()
        .parse()
        .with_context(|| format!("invalid swath rows '{rows}'"))?;
    let columns = columns
        .trim()
        .parse()
        .with_context(|| format!("invalid swath columns '{columns}'"))?;

    Ok((rows, columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::ScratchDir;

    #[test]
    fn test_surface_lines() {
        let text = "# lon lat value\n-90.5 35.0 281.5\n\n-90.4 35.1 282.0\n";
        let columns = parse_samples(text, Layout::Surface).unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns.longitudes, vec![-90.5, -90.4]);
        assert_eq!(columns.values, vec![281.5, 282.0]);
        assert!(columns.values2.is_none());
        assert!(columns.notes.is_none());
        assert!(columns.elevations.is_empty());
    }

    #[test]
    fn test_profile_lines_with_value2_and_notes() {
        let text = "-90 35 1200 300 5.0 -2.0 flight_12\n-90 35 1500 300 6.0 -1.0\n";
        let columns = parse_samples(text, Layout::Profile).unwrap();
        assert_eq!(columns.elevations, vec![1200.0, 1500.0]);
        assert_eq!(columns.surface_elevations, vec![300.0, 300.0]);
        assert_eq!(columns.values, vec![5.0, 6.0]);
        assert_eq!(columns.values2, Some(vec![-2.0, -1.0]));
        assert_eq!(
            columns.notes,
            Some(vec!["flight_12".to_string(), String::new()])
        );
    }

    #[test]
    fn test_rejects_bad_lines() {
        assert!(parse_samples("1 2\n", Layout::Surface).is_err());
        assert!(parse_samples("1 2 3 4 5 6 7\n", Layout::Surface).is_err());
        assert!(parse_samples("1 x 3\n", Layout::Surface).is_err());
        assert!(parse_samples("1 2 3\n1 2 3 4\n", Layout::Surface).is_err());
    }

    #[test]
    fn test_nan_values_are_kept() {
        let columns = parse_samples("1 2 NaN\n", Layout::Surface).unwrap();
        assert!(columns.values[0].is_nan());
    }

    #[test]
    fn test_read_from_file() {
        let scratch = ScratchDir::new();
        let path = scratch.write("samples.txt", "0.5 0.5 1.0\n");
        let columns = read_samples(&path, Layout::Surface).unwrap();
        assert_eq!(columns.values, vec![1.0]);

        assert!(read_samples(&scratch.path("missing.txt"), Layout::Surface).is_err());
    }

    #[test]
    fn test_parse_shape() {
        assert_eq!(parse_shape("400x250").unwrap(), (400, 250));
        assert_eq!(parse_shape("3X2").unwrap(), (3, 2));
        assert!(parse_shape("400").is_err());
        assert!(parse_shape("ax2").is_err());
    }
}
