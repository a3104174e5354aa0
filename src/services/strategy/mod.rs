//! Evaluation strategies behind a common trait.
//!
//! A strategy declares which kline series it needs, how its signal log is
//! laid out, and how raw confidence maps onto the shared 0..=1 alert scale.
//! Evaluation itself is pure: the same frames always produce the same
//! signal, which keeps every strategy testable without a network.

use std::collections::HashMap;

use chrono::DateTime;
use chrono_tz::Tz;

use crate::config::{Config, StrategyKind};
use crate::types::{Candle, Interval, Signal};

pub mod confluence;
pub mod consensus;

pub use confluence::ConfluenceStrategy;
pub use consensus::ConsensusStrategy;

/// One kline series a strategy wants fetched each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KlineRequest {
    pub interval: Interval,
    pub limit: usize,
}

/// Candle frames for one evaluation tick, keyed by interval.
#[derive(Debug, Default)]
pub struct MarketData {
    frames: HashMap<Interval, Vec<Candle>>,
}

impl MarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, interval: Interval, candles: Vec<Candle>) {
        self.frames.insert(interval, candles);
    }

    /// Candles for an interval; a missing frame reads as empty.
    pub fn frame(&self, interval: Interval) -> &[Candle] {
        self.frames.get(&interval).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn closes(&self, interval: Interval) -> Vec<f64> {
        self.frame(interval).iter().map(|c| c.close).collect()
    }

    pub fn highs(&self, interval: Interval) -> Vec<f64> {
        self.frame(interval).iter().map(|c| c.high).collect()
    }

    pub fn lows(&self, interval: Interval) -> Vec<f64> {
        self.frame(interval).iter().map(|c| c.low).collect()
    }
}

/// A signal evaluation strategy.
pub trait Strategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Kline series this strategy needs each tick.
    fn requests(&self) -> Vec<KlineRequest>;

    /// Column layout of this strategy's signal log.
    fn log_header(&self) -> &'static [&'static str];

    /// Upper bound of the raw confidence scale, used to normalize alerts
    /// and heat values.
    fn confidence_ceiling(&self) -> f64;

    /// Evaluate one tick against the fetched frames. Must not perform I/O.
    fn evaluate(&self, data: &MarketData, now: DateTime<Tz>) -> Signal;
}

/// Build the strategy selected in the config.
pub fn build_strategy(config: &Config) -> Box<dyn Strategy> {
    match config.strategy {
        StrategyKind::Confluence => Box::new(ConfluenceStrategy::new(config)),
        StrategyKind::Consensus => Box::new(ConsensusStrategy::new(config)),
    }
}
