pub mod analysis;
pub mod backtest;
pub mod config;
pub mod engine;
pub mod error;
pub mod forecast;
pub mod projection;
pub mod rate;
pub mod scenario;
pub mod sensitivity;
pub mod simulation;
pub mod stats;
pub mod surface;
pub mod synthetic;
pub mod types;
