//! Aggregation policy, vertical placement and parallel reduction tests.

use regrid::{
    AggregationMethod, Grid, GridDefinition, PointBatch, RegridConfig, RegridError, Samples,
    VerticalSpec, VerticalType,
};
use test_utils::{
    assert_approx_eq, assert_slices_approx_eq, fixtures, profiles, scattered_points, with_missing,
};

fn lonlat_grid(columns: usize, rows: usize, config: RegridConfig) -> Grid {
    let (width, height) = (20.0 / columns as f64, 20.0 / rows as f64);
    let definition = GridDefinition::new(columns, rows, -10.0, -10.0, width, height);
    Grid::new(None, &definition, config).unwrap()
}

fn height_grid(config: RegridConfig) -> Grid {
    let definition = GridDefinition::new(2, 2, 0.0, 0.0, 1.0, 1.0)
        .with_vertical(VerticalSpec::new(VerticalType::H, 1.0, vec![0.0, 1000.0, 2000.0]));
    Grid::new(None, &definition, config).unwrap()
}

// ============================================================================
// Policies
// ============================================================================

#[test]
fn test_mean_is_order_independent() {
    let longitudes = [0.1, 0.2, 0.3, 0.4];
    let latitudes = [0.1, 0.2, 0.3, 0.4];
    let values = [2.0, 4.0, 6.0, 8.0];

    let mut forward = lonlat_grid(4, 4, RegridConfig::sequential());
    forward
        .regrid(AggregationMethod::Mean, 0.0, &Samples::new(&longitudes, &latitudes, &values))
        .unwrap();

    let mut reversed = lonlat_grid(4, 4, RegridConfig::sequential());
    let (mut lons, mut lats, mut vals) = (longitudes, latitudes, values);
    lons.reverse();
    lats.reverse();
    vals.reverse();
    reversed
        .regrid(AggregationMethod::Mean, 0.0, &Samples::new(&lons, &lats, &vals))
        .unwrap();

    let a = forward.compact().unwrap();
    let b = reversed.compact().unwrap();
    assert_eq!(a.count, 1);
    assert_approx_eq!(a.data[0], 5.0, 1e-12);
    assert_approx_eq!(a.data[0], b.data[0], 1e-12);
}

#[test]
fn test_invalid_samples_are_skipped() {
    let mut grid = lonlat_grid(4, 4, RegridConfig::sequential());
    let populated = grid
        .regrid(
            AggregationMethod::Mean,
            0.0,
            &Samples::new(&[0.1, 0.2, 0.3], &[0.1, 0.2, 0.3], &[-1.0, f64::NAN, 3.0]),
        )
        .unwrap();

    assert_eq!(populated, 1);
    let cells = grid.compact().unwrap();
    assert_eq!(cells.data[0], 3.0);
    assert!(cells.data[..cells.count].iter().all(|&v| v >= 0.0));
}

#[test]
fn test_nearest_keeps_closest_sample_in_either_order() {
    // One 1-degree cell centered on (0.5, 0.5).
    let definition = GridDefinition::new(1, 1, 0.0, 0.0, 1.0, 1.0);
    let near = (0.5, 0.5, 1.0);
    let far = (0.9, 0.1, 2.0);

    for order in [[near, far], [far, near]] {
        let mut grid = Grid::new(None, &definition, RegridConfig::sequential()).unwrap();
        let lons: Vec<f64> = order.iter().map(|s| s.0).collect();
        let lats: Vec<f64> = order.iter().map(|s| s.1).collect();
        let vals: Vec<f64> = order.iter().map(|s| s.2).collect();

        grid.regrid(AggregationMethod::Nearest, 0.0, &Samples::new(&lons, &lats, &vals))
            .unwrap();

        let cell = grid.cell(1, 1, 1).unwrap();
        assert_eq!(cell.count, 2);
        assert_eq!(cell.data, 1.0);
        assert!(cell.radius < 0.01);
    }
}

#[test]
fn test_weighted_favors_closer_samples() {
    let definition = GridDefinition::new(1, 1, 0.0, 0.0, 1.0, 1.0);
    let mut grid = Grid::new(None, &definition, RegridConfig::sequential()).unwrap();

    // Offsets (0.5, 0) and (1.0, 0) in normalized units: r² = 0.25 and 1.0.
    let lons = [0.75, 1.0];
    let lats = [0.5, 0.5];
    let vals = [10.0, 20.0];
    grid.regrid(AggregationMethod::Weighted, 0.0, &Samples::new(&lons, &lats, &vals))
        .unwrap();

    let cell = grid.cell(1, 1, 1).unwrap();
    let expected = (10.0 / 0.25 + 20.0 / 1.0) / (1.0 / 0.25 + 1.0 / 1.0);
    // Latitude 0.5 moves slightly on the sphere, so the radii are not exact.
    assert_approx_eq!(cell.data, expected, 1e-3);
    assert_approx_eq!(cell.weights, 5.0, 1e-2);
}

#[test]
fn test_second_component_and_notes() {
    let mut grid = lonlat_grid(4, 4, RegridConfig::sequential());
    let notes = vec!["pass_a".to_string(), "pass_b".to_string(), "pass_a".to_string()];
    let samples = Samples::new(&[0.1, 0.2, 0.3], &[0.1, 0.2, 0.3], &[1.0, 2.0, 3.0])
        .with_values2(&[10.0, 20.0, 30.0])
        .with_notes(&notes);

    grid.regrid(AggregationMethod::Mean, 0.0, &samples).unwrap();

    let cells = grid.compact().unwrap();
    assert!(cells.has_data2);
    assert_approx_eq!(cells.data2[0], 20.0, 1e-12);
    assert_eq!(cells.notes[0], "pass_a;pass_b");

    let full = grid.full_output();
    assert!(full.data2.is_some());
}

#[test]
fn test_aggregate_shares_one_projection() {
    let mut grid = lonlat_grid(10, 10, RegridConfig::default());
    let points = scattered_points(2000, (-12.0, -12.0, 12.0, 12.0), 5);
    let projected = grid.project_xy(&points.longitudes, &points.latitudes).unwrap();

    let temperature = grid
        .aggregate(
            AggregationMethod::Mean,
            0.0,
            &PointBatch::new(&projected.locations, &points.values),
        )
        .unwrap();
    let temperature_cells = grid.compact().unwrap();

    let doubled: Vec<f64> = points.values.iter().map(|v| 2.0 * v).collect();
    let doubled_count = grid
        .aggregate(
            AggregationMethod::Mean,
            0.0,
            &PointBatch::new(&projected.locations, &doubled),
        )
        .unwrap();
    let doubled_cells = grid.compact().unwrap();

    assert_eq!(temperature, doubled_count);
    assert_eq!(temperature_cells.rows, doubled_cells.rows);
    for (a, b) in temperature_cells.data.iter().zip(&doubled_cells.data) {
        assert_approx_eq!(2.0 * a, *b, 1e-9);
    }
}

#[test]
fn test_aggregate_requires_vertical_on_layered_grid() {
    let mut grid = height_grid(RegridConfig::sequential());
    let projected = grid.project_xy(&[0.5], &[0.5]).unwrap();
    let result = grid.aggregate(
        AggregationMethod::Mean,
        0.0,
        &PointBatch::new(&projected.locations, &[1.0]),
    );
    assert!(matches!(result, Err(RegridError::InvalidInput(_))));

    let vertical = grid.project_z(&[1500.0]).unwrap();
    let populated = grid
        .aggregate(
            AggregationMethod::Mean,
            0.0,
            &PointBatch::new(&projected.locations, &[1.0]).with_vertical(&vertical),
        )
        .unwrap();
    assert_eq!(populated, 1);
    assert_eq!(grid.compact().unwrap().layers[0], 2);
}

// ============================================================================
// Vertical placement
// ============================================================================

#[test]
fn test_regrid_uses_sample_surface_elevation() {
    let mut grid = height_grid(RegridConfig::sequential());

    // 1200 m is in layer 2 over sea level but layer 1 over 500 m terrain.
    let samples = Samples::new(&[0.5], &[0.5], &[7.0]).with_elevations(&[1200.0], &[500.0]);
    grid.regrid(AggregationMethod::Mean, 0.0, &samples).unwrap();
    let cells = grid.compact().unwrap();
    assert_eq!(cells.layers[0], 1);
    assert_eq!(cells.elevations[0], 1000.0);
    assert_eq!(grid.cell(1, 1, 1).unwrap().surface_elevation, 500.0);

    let sea_level = Samples::new(&[0.5], &[0.5], &[7.0]).with_elevations_only(&[1200.0]);
    grid.regrid(AggregationMethod::Mean, 0.0, &sea_level).unwrap();
    assert_eq!(grid.compact().unwrap().layers[0], 2);
}

#[test]
fn test_surface_tolerance_reuses_boundaries() {
    // Second sample's terrain is 20 m higher than the first's.
    let lons = [0.5, 0.5];
    let lats = [0.5, 0.5];
    let values = [1.0, 2.0];
    let elevations = [1000.0, 1510.0];
    let surfaces = [500.0, 520.0];
    let samples = Samples::new(&lons, &lats, &values).with_elevations(&elevations, &surfaces);

    // Within 40 m the boundaries derived for 500 m are reused: 1510 m is in layer 2.
    let mut cached = height_grid(RegridConfig::sequential());
    cached.regrid(AggregationMethod::Mean, 0.0, &samples).unwrap();
    assert_eq!(cached.cell(1, 1, 2).map(|cell| cell.count), Some(1));

    // With no tolerance they are rederived for 520 m: 1510 m is in layer 1.
    let config = RegridConfig {
        surface_elevation_tolerance: 0.0,
        ..RegridConfig::sequential()
    };
    let mut exact = height_grid(config);
    exact.regrid(AggregationMethod::Mean, 0.0, &samples).unwrap();
    assert_eq!(exact.cell(1, 1, 2).map(|cell| cell.count), Some(0));
    assert_eq!(exact.cell(1, 1, 1).map(|cell| cell.count), Some(2));
}

#[test]
fn test_samples_below_terrain_are_dropped() {
    let mut grid = height_grid(RegridConfig::sequential());
    let samples = Samples::new(&[0.5], &[0.5], &[1.0]).with_elevations(&[400.0], &[500.0]);
    assert_eq!(grid.regrid(AggregationMethod::Mean, 0.0, &samples).unwrap(), 0);
}

#[test]
fn test_regrid_requires_elevations_on_layered_grid() {
    let mut grid = height_grid(RegridConfig::sequential());
    let result = grid.regrid(AggregationMethod::Mean, 0.0, &Samples::new(&[0.5], &[0.5], &[1.0]));
    assert!(matches!(result, Err(RegridError::InvalidInput(_))));
}

#[test]
fn test_sigma_profiles_fill_layers() {
    let spec = VerticalSpec::new(
        VerticalType::NonHydrostaticSigmaPressure,
        fixtures::vertical::SIGMA_TOP_PRESSURE,
        fixtures::vertical::SIGMA_LEVELS.to_vec(),
    );
    let definition = GridDefinition::new(5, 5, -95.0, 30.0, 1.0, 1.0).with_vertical(spec);
    let mut grid = Grid::new(None, &definition, RegridConfig::default()).unwrap();

    let soundings = profiles(40, 30, (-95.0, 30.0, -90.0, 35.0), 15000.0, 21);
    let samples = Samples::new(&soundings.longitudes, &soundings.latitudes, &soundings.values)
        .with_elevations(&soundings.elevations, &soundings.surface_elevations);

    let populated = grid.regrid(AggregationMethod::Mean, 0.0, &samples).unwrap();
    assert!(populated > 0);

    let cells = grid.compact().unwrap();
    assert!(cells.vertical);
    assert!(cells.layers[..cells.count].iter().all(|&layer| (1..=13).contains(&layer)));
    assert!(cells.layers[..cells.count].iter().any(|&layer| layer > 1));
}

// ============================================================================
// Parallel reduction
// ============================================================================

fn run_with_workers(method: AggregationMethod, workers: usize) -> regrid::CompactedCells {
    let config = RegridConfig {
        workers,
        ..RegridConfig::default()
    };
    let mut grid = lonlat_grid(16, 16, config);
    let points = scattered_points(20_000, (-11.0, -11.0, 11.0, 11.0), 99);
    let values = with_missing(&points.values, 0.1, 7);

    grid.regrid(method, 0.0, &Samples::new(&points.longitudes, &points.latitudes, &values))
        .unwrap();
    grid.compact().unwrap()
}

#[test]
fn test_nearest_is_identical_across_worker_counts() {
    let single = run_with_workers(AggregationMethod::Nearest, 1);
    let many = run_with_workers(AggregationMethod::Nearest, 8);
    assert_eq!(single, many);
}

#[test]
fn test_mean_and_weighted_agree_across_worker_counts() {
    for method in [AggregationMethod::Mean, AggregationMethod::Weighted] {
        let single = run_with_workers(method, 1);
        let many = run_with_workers(method, 8);

        assert_eq!(single.count, many.count);
        assert_eq!(single.columns, many.columns);
        assert_eq!(single.rows, many.rows);
        assert_slices_approx_eq!(single.data, many.data, 1e-9);
    }
}

fn sigma_profiles_with_workers(workers: usize, tolerance: f64) -> regrid::CompactedCells {
    let spec = VerticalSpec::new(
        VerticalType::NonHydrostaticSigmaPressure,
        fixtures::vertical::SIGMA_TOP_PRESSURE,
        fixtures::vertical::SIGMA_LEVELS.to_vec(),
    );
    let definition = GridDefinition::new(5, 5, -95.0, 30.0, 1.0, 1.0).with_vertical(spec);
    let config = RegridConfig {
        workers,
        surface_elevation_tolerance: tolerance,
        ..RegridConfig::default()
    };
    let mut grid = Grid::new(None, &definition, config).unwrap();

    let soundings = profiles(40, 30, (-95.0, 30.0, -90.0, 35.0), 15000.0, 21);
    let samples = Samples::new(&soundings.longitudes, &soundings.latitudes, &soundings.values)
        .with_elevations(&soundings.elevations, &soundings.surface_elevations);

    grid.regrid(AggregationMethod::Mean, 0.0, &samples).unwrap();
    grid.compact().unwrap()
}

#[test]
fn test_zero_tolerance_layers_match_across_worker_counts() {
    let single = sigma_profiles_with_workers(1, 0.0);
    let many = sigma_profiles_with_workers(7, 0.0);

    assert!(single.count > 0);
    assert_eq!(single.count, many.count);
    assert_eq!(single.columns, many.columns);
    assert_eq!(single.rows, many.rows);
    assert_eq!(single.layers, many.layers);
    assert_slices_approx_eq!(single.data, many.data, 1e-9);
}
