mod fixtures;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use nivcast::config::{ComputeOptions, DEFAULT_HORIZONS, ParameterOverrides};
use nivcast::engine;
use nivcast::forecast::ForecastGenerator;
use nivcast::scenario::ScenarioDefinition;
use nivcast::simulation::Simulator;
use nivcast::surface::{self, SURFACE_HORIZONS, SURFACE_OFFSETS};

use fixtures::{LARGE, MEDIUM, SMALL, params, series, state};

// ── Group 1: ensemble: path count scaling ──────────────────────────────────

fn bench_ensemble(c: &mut Criterion) {
    let mut group = c.benchmark_group("ensemble");
    let st = state(120);
    for &iterations in &[100usize, 1_000, 10_000, 50_000] {
        let p = params(iterations);
        if iterations >= 10_000 {
            group.sample_size(10);
        }
        group.throughput(Throughput::Elements(iterations as u64));
        group.bench_with_input(BenchmarkId::from_parameter(iterations), &iterations, |b, _| {
            b.iter(|| Simulator::new(&st, &p, 42).run_outcomes())
        });
    }
    group.finish();
}

// ── Group 2: forecast_curve: all default horizons ──────────────────────────

fn bench_forecast_curve(c: &mut Criterion) {
    let mut group = c.benchmark_group("forecast_curve");
    group.sample_size(10);
    let st = state(120);
    let anchor = series(120).last().map(|p| p.date).unwrap();
    for (name, fixture) in [("small", &SMALL), ("medium", &MEDIUM), ("large", &LARGE)] {
        let p = params(fixture.iterations);
        group.bench_function(BenchmarkId::from_parameter(name), |b| {
            b.iter(|| ForecastGenerator::new(&st, &p, anchor, 42).generate(&DEFAULT_HORIZONS))
        });
    }
    group.finish();
}

// ── Group 3: risk_surface: closed-form grid ────────────────────────────────

fn bench_risk_surface(c: &mut Criterion) {
    let st = state(120);
    let p = params(1_000);
    c.bench_function("risk_surface", |b| {
        b.iter(|| surface::generate(&st, &p, &SURFACE_HORIZONS, &SURFACE_OFFSETS))
    });
}

// ── Group 4: compute: end-to-end with presets ──────────────────────────────

fn bench_compute(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute");
    group.sample_size(10);
    for (name, fixture) in [("small", &SMALL), ("medium", &MEDIUM)] {
        let s = series(fixture.months);
        let overrides = ParameterOverrides { iterations: Some(fixture.iterations), ..ParameterOverrides::default() };
        let options = ComputeOptions {
            forecast: true,
            risk_surface: true,
            scenarios: ScenarioDefinition::presets(),
            seed: Some(42),
            ..ComputeOptions::default()
        };
        group.throughput(Throughput::Elements(fixture.months as u64));
        group.bench_function(BenchmarkId::from_parameter(name), |b| {
            b.iter(|| engine::compute(&s, &overrides, &options).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_ensemble, bench_forecast_curve, bench_risk_surface, bench_compute);
criterion_main!(benches);
