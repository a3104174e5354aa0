//! Vigil - periodic market-structure scanner with multi-timeframe signal
//! scoring, CSV history, heatmap rendering and email alerting.

pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;
