//! Benchmarks for the regrid crate - projection, aggregation and swath binning.
//!
//! Run with: cargo bench --package regrid -- aggregate
//! Or: cargo bench --package regrid --bench regrid_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use projection::{Ellipsoid, LambertConformal};
use rand::Rng;
use regrid::{
    derive_corners, AggregationMethod, Grid, GridDefinition, PointBatch, RegridConfig, Samples,
    Swath, VerticalSpec, VerticalType,
};
use test_utils::{fixtures, profiles, scattered_points, swath_centers};

/// CONUS 12 km Lambert grid, optionally layered.
fn conus_grid(vertical: bool, config: RegridConfig) -> Grid {
    let l = fixtures::lattice::CONUS_12KM;
    let p = fixtures::projection::CONUS_LAMBERT;
    let projector = LambertConformal::new(
        Ellipsoid::MM5_SPHERE,
        p.lower_latitude,
        p.upper_latitude,
        p.central_longitude,
        p.central_latitude,
        0.0,
        0.0,
    )
    .unwrap();

    let mut definition = GridDefinition::new(
        l.columns,
        l.rows,
        l.west_edge,
        l.south_edge,
        l.cell_width,
        l.cell_height,
    );
    if vertical {
        definition = definition.with_vertical(VerticalSpec::new(
            VerticalType::HydrostaticSigmaPressure,
            fixtures::vertical::SIGMA_TOP_PRESSURE,
            fixtures::vertical::SIGMA_LEVELS.to_vec(),
        ));
    }

    Grid::new(Some(Box::new(projector)), &definition, config).unwrap()
}

fn bench_project_xy(c: &mut Criterion) {
    let mut group = c.benchmark_group("project_xy");
    let grid = conus_grid(false, RegridConfig::default());

    for count in [10_000, 100_000] {
        let points = scattered_points(count, fixtures::bbox::CONUS, 1);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("lambert", count), &points, |b, points| {
            b.iter(|| {
                grid.project_xy(black_box(&points.longitudes), black_box(&points.latitudes))
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");
    let count = 100_000;
    let points = scattered_points(count, fixtures::bbox::CONUS, 2);

    // Add sensor noise so cells see distinct values.
    let mut rng = rand::thread_rng();
    let values: Vec<f64> = points
        .values
        .iter()
        .map(|v| v + rng.gen_range(-3.0..3.0))
        .collect();

    group.throughput(Throughput::Elements(count as u64));

    for method in [
        AggregationMethod::Nearest,
        AggregationMethod::Mean,
        AggregationMethod::Weighted,
    ] {
        for workers in [1, 8] {
            let config = RegridConfig {
                workers,
                ..RegridConfig::default()
            };
            let mut grid = conus_grid(false, config);
            let projected = grid.project_xy(&points.longitudes, &points.latitudes).unwrap();

            group.bench_function(BenchmarkId::new(method.as_str(), workers), |b| {
                b.iter(|| {
                    grid.aggregate(
                        method,
                        0.0,
                        black_box(&PointBatch::new(&projected.locations, &values)),
                    )
                    .unwrap()
                })
            });
        }
    }

    group.finish();
}

fn bench_regrid_profiles(c: &mut Criterion) {
    let mut group = c.benchmark_group("regrid_profiles");
    let soundings = profiles(2000, 50, fixtures::bbox::SOUTHEAST, 15000.0, 3);
    let samples = Samples::new(&soundings.longitudes, &soundings.latitudes, &soundings.values)
        .with_elevations(&soundings.elevations, &soundings.surface_elevations);

    group.throughput(Throughput::Elements(samples.len() as u64));

    for tolerance in [0.0, 40.0] {
        let config = RegridConfig {
            surface_elevation_tolerance: tolerance,
            ..RegridConfig::default()
        };
        let mut grid = conus_grid(true, config);

        group.bench_function(BenchmarkId::new("sigma_tolerance", tolerance), |b| {
            b.iter(|| {
                grid.regrid(AggregationMethod::Mean, 0.0, black_box(&samples))
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn bench_swath(c: &mut Criterion) {
    let mut group = c.benchmark_group("swath");
    let (rows, columns) = (400, 250);
    let (longitudes, latitudes) = swath_centers(rows, columns, (-88.0, 30.0), 0.02, 12.0);
    let values = vec![280.0; rows * columns];

    group.throughput(Throughput::Elements((rows * columns) as u64));

    group.bench_function("derive_corners", |b| {
        b.iter(|| {
            derive_corners(
                rows,
                columns,
                black_box(&longitudes),
                black_box(&latitudes),
                3.0,
            )
            .unwrap()
        })
    });

    let corners = derive_corners(rows, columns, &longitudes, &latitudes, 3.0).unwrap();
    let mut grid = conus_grid(false, RegridConfig::default());

    group.bench_function("regrid_swath", |b| {
        b.iter(|| {
            grid.regrid_swath(0.0, black_box(&Swath::new(&corners, &values)))
                .unwrap()
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_project_xy,
    bench_aggregate,
    bench_regrid_profiles,
    bench_swath,
);
criterion_main!(benches);
