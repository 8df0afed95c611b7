use std::fs::File;
use std::io::{BufReader, BufWriter, Write};

use chrono::NaiveDate;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::Deserialize;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use nivcast::backtest::BacktestRequest;
use nivcast::config::{ComputeOptions, ParameterOverrides};
use nivcast::engine::{self, ComputeResult};
use nivcast::scenario::ScenarioDefinition;
use nivcast::synthetic::synthetic_series;
use nivcast::types::ObservedPoint;

/// One compute request as read from disk.
#[derive(Deserialize)]
struct Request {
    series: Vec<ObservedPoint>,
    #[serde(default)]
    params: ParameterOverrides,
    #[serde(default)]
    options: ComputeOptions,
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("error: {msg}");
    std::process::exit(1);
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut input_path: Option<String> = None;
    let mut output_path = "forecast.json".to_string();
    let mut seed_override: Option<u64> = None;
    let mut iterations_override: Option<usize> = None;
    let mut demo_months: Option<usize> = None;
    let mut with_presets = false;
    let mut with_backtest = false;
    let mut quiet = false;

    let mut i = 1;
    while i < args.len() {
        let value = |i: usize| {
            args.get(i).cloned().unwrap_or_else(|| fail(format!("{} requires a value", args[i - 1])))
        };
        match args[i].as_str() {
            "--input" => {
                i += 1;
                input_path = Some(value(i));
            }
            "--output" => {
                i += 1;
                output_path = value(i);
            }
            "--seed" => {
                i += 1;
                seed_override = Some(value(i).parse().unwrap_or_else(|_| fail("--seed requires a u64")));
            }
            "--iterations" => {
                i += 1;
                iterations_override =
                    Some(value(i).parse().unwrap_or_else(|_| fail("--iterations requires a positive integer")));
            }
            "--demo" => {
                i += 1;
                demo_months = Some(value(i).parse().unwrap_or_else(|_| fail("--demo requires a month count")));
            }
            "--presets" => with_presets = true,
            "--backtest" => with_backtest = true,
            "--quiet" => quiet = true,
            other if input_path.is_none() && !other.starts_with("--") => input_path = Some(other.to_string()),
            other => fail(format!("unrecognised argument `{other}`")),
        }
        i += 1;
    }

    let mut request = match (demo_months, &input_path) {
        (Some(months), _) => demo_request(months, seed_override.unwrap_or(42)),
        (None, Some(path)) => load_request(path),
        (None, None) => fail("usage: nivcast [--input] <request.json> | --demo <months> [--seed N] [--iterations N] [--presets] [--backtest] [--output PATH] [--quiet]"),
    };

    if let Some(seed) = seed_override {
        request.options.seed = Some(seed);
    }
    if let Some(n) = iterations_override {
        request.params.iterations = Some(n);
    }
    if with_presets {
        request.options.scenarios.extend(ScenarioDefinition::presets());
    }
    if with_backtest && request.options.backtest.is_none() {
        request.options.backtest = Some(BacktestRequest::default());
    }

    let result = engine::compute(&request.series, &request.params, &request.options)
        .unwrap_or_else(|e| fail(e));

    let file = File::create(&output_path).unwrap_or_else(|e| fail(format!("cannot create {output_path}: {e}")));
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &result).unwrap_or_else(|e| fail(e));
    writeln!(writer).unwrap_or_else(|e| fail(e));

    if !quiet {
        print_summary(&result);
        println!("\nResult written to {output_path}");
    }
}

fn load_request(path: &str) -> Request {
    let file = File::open(path).unwrap_or_else(|e| fail(format!("cannot open {path}: {e}")));
    serde_json::from_reader(BufReader::new(file)).unwrap_or_else(|e| fail(format!("invalid request in {path}: {e}")))
}

fn demo_request(months: usize, seed: u64) -> Request {
    let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default();
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    Request {
        series: synthetic_series(start, months, &mut rng),
        params: ParameterOverrides::default(),
        options: ComputeOptions {
            forecast: true,
            risk_surface: true,
            histogram_buckets: Some(nivcast::analysis::DEFAULT_HISTOGRAM_BUCKETS),
            ..ComputeOptions::default()
        },
    }
}

fn print_summary(result: &ComputeResult) {
    let s = &result.state;
    let m = &result.metadata;

    println!("=== Current state ({} points, seed {}) ===", m.input_points, m.seed);
    println!("  Indicator (current):     {:>10.5}", s.current_indicator);
    println!("  Indicator (window avg):  {:>10.5}", s.avg_indicator);
    println!("  Friction (window avg):   {:>10.5}", s.avg_friction);
    println!("  Volatility:              {:>10.5}", s.volatility);
    println!("  Acceleration:            {:>10.5}  ({:?})", s.acceleration, result.acceleration_trend);
    println!("  Effective rate:          {:>10.5}", result.effective_rate);
    println!(
        "  Collapse probability:    {:>9.1}%  [{}]",
        result.collapse_probability * 100.0,
        result.risk_level.label()
    );
    println!(
        "  Projected ({}y):           {:>10.5}",
        m.parameters.horizon_years, result.projected_value
    );

    if let Some(curve) = &result.forecast {
        println!("\n=== Forecast curve ({} paths per horizon) ===", m.parameters.iterations);
        println!(
            "{:>4} | {:>10} | {:>9} | {:>9} | {:>9} | {:>9} | {:>9} | {:>8} | {:>8}",
            "Yrs", "Date", "p5", "p25", "p50", "p75", "p95", "Collapse", "Level"
        );
        println!("{}", "-".repeat(100));
        for p in curve {
            println!(
                "{:>4} | {:>10} | {:>9.5} | {:>9.5} | {:>9.5} | {:>9.5} | {:>9.5} | {:>7.1}% | {:>8}",
                p.horizon_years,
                p.date,
                p.bands.p5,
                p.bands.p25,
                p.bands.p50,
                p.bands.p75,
                p.bands.p95,
                p.collapse_probability * 100.0,
                p.risk_level.label(),
            );
        }
    }

    if let Some(dist) = &result.distribution {
        let ds = &dist.stats;
        println!("\n=== Terminal distribution ({}y, N={}) ===", dist.horizon_years, ds.n);
        println!("  mean {:.5}  std {:.5}  min {:.5}  max {:.5}", ds.mean, ds.std_dev, ds.min, ds.max);
        let peak = dist.histogram.iter().map(|b| b.count).max().unwrap_or(1).max(1);
        for b in &dist.histogram {
            let bar = "#".repeat(b.count * 40 / peak);
            println!("  [{:>9.5}, {:>9.5}) {:>6} {bar}", b.range_start, b.range_end, b.count);
        }
    }

    if let Some(cells) = &result.risk_surface {
        println!("\n=== Risk surface (tier by momentum σ ↓ / friction σ →) ===");
        let mut horizons: Vec<u32> = cells.iter().map(|c| c.horizon_years).collect();
        horizons.dedup();
        for h in horizons {
            println!("  {h}y");
            let rows: Vec<_> = cells.iter().filter(|c| c.horizon_years == h).collect();
            let mut offsets: Vec<i32> = rows.iter().map(|c| c.momentum_offset).collect();
            offsets.dedup();
            for m_off in offsets {
                let line: Vec<String> = rows
                    .iter()
                    .filter(|c| c.momentum_offset == m_off)
                    .map(|c| format!("{:>8}", format!("{:?}", c.tier)))
                    .collect();
                println!("  {m_off:>+3} | {}", line.join(" "));
            }
        }
    }

    if let Some(outcomes) = &result.scenarios {
        println!("\n=== Scenarios ===");
        println!("{:>20} | {:>12} | {:>14}", "Scenario", "Impact p50", "ΔCollapse (pp)");
        for o in outcomes {
            let impact = o
                .terminal_impact_pct
                .map(|v| format!("{v:>+11.1}%"))
                .unwrap_or_else(|| format!("{:>12}", "undefined"));
            println!(
                "{:>20} | {impact} | {:>+14.1}",
                o.scenario.name,
                o.collapse_probability_change * 100.0
            );
        }
    }

    if let Some(report) = &result.sensitivity {
        println!("\n=== Sensitivity: {:?} (baseline {:.3}) ===", report.target, report.baseline_value);
        for p in &report.points {
            println!(
                "  {:>8.3} | collapse {:>6.1}% ({:>+6.1}) | projected {:>9.5} ({:>+9.5})",
                p.value,
                p.collapse_probability * 100.0,
                p.collapse_delta * 100.0,
                p.projected_value,
                p.projected_delta,
            );
        }
    }

    if let Some(bt) = &result.backtest {
        let pct = |v: Option<f64>| v.map(|r| format!("{:.1}%", r * 100.0)).unwrap_or_else(|| "n/a".to_string());
        println!("\n=== Backtest (signal > {:.0}%) ===", bt.threshold * 100.0);
        println!("  Months scored:   {:>6}   flagged adverse: {:>6}", bt.evaluated_points, bt.adverse_months);
        println!("  Signals:         {:>6}   hits: {:>6}   false alarms: {:>6}   misses: {:>6}", bt.signals, bt.hits, bt.false_alarms, bt.misses);
        println!("  Hit rate:        {:>6}   false alarm ratio: {:>6}", pct(bt.hit_rate), pct(bt.false_alarm_ratio));
        println!(
            "  Probability:     avg {:.1}%  min {:.1}%  max {:.1}%",
            bt.avg_probability * 100.0,
            bt.min_probability * 100.0,
            bt.max_probability * 100.0
        );
    }

    if !result.warnings.is_empty() {
        println!("\n=== Warnings ===");
        for w in &result.warnings {
            println!("  {w:?}");
        }
    }
}
