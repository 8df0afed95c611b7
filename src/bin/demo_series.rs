use std::env;

use chrono::NaiveDate;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde_json::json;

use nivcast::scenario::ScenarioDefinition;
use nivcast::synthetic::synthetic_series;

fn main() {
    let months: usize = env::args().nth(1).and_then(|s| s.parse().ok()).unwrap_or(240);
    let seed: u64 = env::args().nth(2).and_then(|s| s.parse().ok()).unwrap_or(42);

    let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default();
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let series = synthetic_series(start, months, &mut rng);

    // Full request document to stdout.
    let request = json!({
        "series": series,
        "options": {
            "forecast": true,
            "risk_surface": true,
            "scenarios": ScenarioDefinition::presets(),
            "backtest": {},
            "seed": seed,
        },
    });
    match serde_json::to_string_pretty(&request) {
        Ok(s) => println!("{s}"),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }

    // Per-component summary to stderr.
    let stressed = series.iter().filter(|p| p.adverse_event).count();
    eprintln!("demo_series: {months} months from {start}, seed {seed}, {stressed} stressed months");
    if series.is_empty() {
        return;
    }
    let names: Vec<&str> = series[0].numeric_fields().iter().map(|(n, _)| *n).collect();
    for (k, name) in names.iter().enumerate() {
        let values: Vec<f64> = series.iter().map(|p| p.numeric_fields()[k].1).collect();
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        eprintln!("  {name:<10}  mean={mean:>9.5}  min={min:>9.5}  max={max:>9.5}");
    }
}
