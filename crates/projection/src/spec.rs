//! Declarative projection definitions.
//!
//! A [`ProjectionSpec`] is what grid definition files and command lines
//! carry; [`ProjectionSpec::build`] turns it into a boxed [`Projector`], or
//! `None` for an identity longitude/latitude grid.
//!
//! YAML form:
//!
//! ```yaml
//! kind: lambert
//! lower_latitude: 33
//! upper_latitude: 45
//! central_longitude: -97
//! central_latitude: 40
//! ```
//!
//! Command-line form (optional trailing `major,minor` semi-axes):
//!
//! ```text
//! lonlat
//! lambert:33,45,-97,40
//! mercator:-98
//! stereographic:-98,90,45
//! lambert:33,45,-97,40,6378137,6356752.314245
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ellipsoid::Ellipsoid;
use crate::error::{ProjectionError, Result};
use crate::lambert::LambertConformal;
use crate::mercator::Mercator;
use crate::projector::Projector;
use crate::stereographic::Stereographic;

/// A projection definition as found in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProjectionSpec {
    /// Unprojected longitude/latitude grid.
    Lonlat,
    /// Lambert Conformal Conic.
    Lambert {
        lower_latitude: f64,
        upper_latitude: f64,
        central_longitude: f64,
        central_latitude: f64,
        #[serde(default)]
        false_easting: f64,
        #[serde(default)]
        false_northing: f64,
        #[serde(default)]
        ellipsoid: Ellipsoid,
    },
    /// Mercator.
    Mercator {
        central_longitude: f64,
        #[serde(default)]
        false_easting: f64,
        #[serde(default)]
        false_northing: f64,
        #[serde(default)]
        ellipsoid: Ellipsoid,
    },
    /// Polar or oblique stereographic.
    Stereographic {
        central_longitude: f64,
        central_latitude: f64,
        secant_latitude: f64,
        #[serde(default)]
        false_easting: f64,
        #[serde(default)]
        false_northing: f64,
        #[serde(default)]
        ellipsoid: Ellipsoid,
    },
}

impl Default for ProjectionSpec {
    fn default() -> Self {
        Self::Lonlat
    }
}

impl ProjectionSpec {
    /// Build the projector, or `None` for [`ProjectionSpec::Lonlat`].
    pub fn build(&self) -> Result<Option<Box<dyn Projector>>> {
        let projector: Box<dyn Projector> = match *self {
            Self::Lonlat => return Ok(None),
            Self::Lambert {
                lower_latitude,
                upper_latitude,
                central_longitude,
                central_latitude,
                false_easting,
                false_northing,
                ellipsoid,
            } => Box::new(LambertConformal::new(
                ellipsoid,
                lower_latitude,
                upper_latitude,
                central_longitude,
                central_latitude,
                false_easting,
                false_northing,
            )?),
            Self::Mercator {
                central_longitude,
                false_easting,
                false_northing,
                ellipsoid,
            } => Box::new(Mercator::new(
                ellipsoid,
                central_longitude,
                false_easting,
                false_northing,
            )?),
            Self::Stereographic {
                central_longitude,
                central_latitude,
                secant_latitude,
                false_easting,
                false_northing,
                ellipsoid,
            } => Box::new(Stereographic::new(
                ellipsoid,
                central_longitude,
                central_latitude,
                secant_latitude,
                false_easting,
                false_northing,
            )?),
        };

        tracing::debug!(
            projection = projector.name(),
            parameters = ?projector.parameters(),
            "built projector"
        );

        Ok(Some(projector))
    }

    /// The family name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Lonlat => "lonlat",
            Self::Lambert { .. } => "lambert",
            Self::Mercator { .. } => "mercator",
            Self::Stereographic { .. } => "stereographic",
        }
    }
}

/// Split trailing `major,minor` semi-axes off a parameter list.
fn split_ellipsoid(values: &[f64], required: usize, text: &str) -> Result<Ellipsoid> {
    match values.len() - required {
        0 => Ok(Ellipsoid::default()),
        2 => Ellipsoid::new(values[required], values[required + 1]),
        _ => Err(ProjectionError::Parse(text.to_string())),
    }
}

impl FromStr for ProjectionSpec {
    type Err = ProjectionError;

    fn from_str(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let (kind, rest) = match trimmed.split_once(':') {
            Some((kind, rest)) => (kind, rest),
            None => (trimmed, ""),
        };

        let values = rest
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| ProjectionError::Parse(text.to_string()))?;

        let need = |count: usize| -> Result<()> {
            if values.len() < count {
                Err(ProjectionError::Parse(text.to_string()))
            } else {
                Ok(())
            }
        };

        match kind.to_lowercase().as_str() {
            "lonlat" | "latlon" | "geographic" if values.is_empty() => Ok(Self::Lonlat),
            "lambert" | "lcc" => {
                need(4)?;
                Ok(Self::Lambert {
                    lower_latitude: values[0],
                    upper_latitude: values[1],
                    central_longitude: values[2],
                    central_latitude: values[3],
                    false_easting: 0.0,
                    false_northing: 0.0,
                    ellipsoid: split_ellipsoid(&values, 4, text)?,
                })
            }
            "mercator" => {
                need(1)?;
                Ok(Self::Mercator {
                    central_longitude: values[0],
                    false_easting: 0.0,
                    false_northing: 0.0,
                    ellipsoid: split_ellipsoid(&values, 1, text)?,
                })
            }
            "stereographic" | "stereo" => {
                need(3)?;
                Ok(Self::Stereographic {
                    central_longitude: values[0],
                    central_latitude: values[1],
                    secant_latitude: values[2],
                    false_easting: 0.0,
                    false_northing: 0.0,
                    ellipsoid: split_ellipsoid(&values, 3, text)?,
                })
            }
            _ => Err(ProjectionError::Parse(text.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_line_forms() {
        assert_eq!("lonlat".parse::<ProjectionSpec>().unwrap(), ProjectionSpec::Lonlat);

        let spec: ProjectionSpec = "lambert:33,45,-97,40".parse().unwrap();
        assert_eq!(spec.kind(), "lambert");
        let projector = spec.build().unwrap().expect("lambert is projected");
        assert!(projector.ellipsoid().is_sphere());

        let spec: ProjectionSpec = "stereographic:-98,90,45,6378137,6356752.314245".parse().unwrap();
        let projector = spec.build().unwrap().unwrap();
        assert!(!projector.ellipsoid().is_sphere());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("lambert:33,45".parse::<ProjectionSpec>().is_err());
        assert!("mercator:abc".parse::<ProjectionSpec>().is_err());
        assert!("mercator:0,1".parse::<ProjectionSpec>().is_err());
        assert!("albers:1,2,3,4".parse::<ProjectionSpec>().is_err());
    }

    #[test]
    fn test_yaml_definition() {
        let yaml = "kind: mercator\ncentral_longitude: -98.0\n";
        let spec: ProjectionSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            spec,
            ProjectionSpec::Mercator {
                central_longitude: -98.0,
                false_easting: 0.0,
                false_northing: 0.0,
                ellipsoid: Ellipsoid::MM5_SPHERE,
            }
        );
    }

    #[test]
    fn test_built_projectors_compare() {
        let a = "lambert:33,45,-97,40".parse::<ProjectionSpec>().unwrap().build().unwrap().unwrap();
        let b = a.clone();
        let c = "lambert:30,60,-97,40".parse::<ProjectionSpec>().unwrap().build().unwrap().unwrap();
        assert!(a.equal(b.as_ref()));
        assert!(!a.equal(c.as_ref()));
        assert!(a.invariant());
    }

    #[test]
    fn test_json_lonlat() {
        let spec: ProjectionSpec = serde_json::from_str(r#"{"kind":"lonlat"}"#).unwrap();
        assert!(spec.build().unwrap().is_none());
    }
}
