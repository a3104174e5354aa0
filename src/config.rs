use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::types::Interval;

/// Which evaluation strategy the scanner runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Weighted multi-timeframe confluence scoring with pullback entries.
    Confluence,
    /// Agreement counting across bias, structure and trend regime.
    Consensus,
}

impl Default for StrategyKind {
    fn default() -> Self {
        Self::Confluence
    }
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confluence => "confluence",
            Self::Consensus => "consensus",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// SMTP settings for email alerts.
///
/// The password is never read from the config file; set SMTP_PASSWORD in the
/// environment (or a .env file) instead.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmailConfig {
    /// Sender address, also used as the SMTP username.
    pub sender: String,
    /// Recipient address.
    pub receiver: String,
    /// SMTP relay host.
    pub smtp_server: String,
    /// SMTP port (STARTTLS).
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// Filled from SMTP_PASSWORD at load time.
    #[serde(skip)]
    pub password: Option<String>,
}

/// Application configuration, loaded from a JSON file.
///
/// Every field is validated at startup; a bad value aborts the process
/// instead of surfacing mid-scan.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Exchange symbol to scan, e.g. "BTCUSDT".
    pub symbol: String,
    /// Primary kline interval for the confluence strategy.
    #[serde(default)]
    pub interval: Interval,
    /// Candles fetched per kline request.
    #[serde(default = "default_candles")]
    pub candles: usize,
    /// Evaluation strategy to run.
    #[serde(default)]
    pub strategy: StrategyKind,
    /// Fast EMA length.
    #[serde(default = "default_ema_fast")]
    pub ema_fast: usize,
    /// Slow EMA length.
    #[serde(default = "default_ema_slow")]
    pub ema_slow: usize,
    /// Structure lookback windows per interval; absent entries fall back to
    /// the strategy's own default.
    #[serde(default)]
    pub structure_lookbacks: HashMap<Interval, usize>,
    /// Seconds between scans; ticks fire on wall-clock boundaries.
    #[serde(default = "default_scan_interval")]
    pub scan_interval_seconds: u64,
    /// Minimum normalized confidence before an alert is sent.
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: f64,
    /// IANA timezone the scan boundaries align to.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// CSV signal log path.
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
    /// Rolling heatmap output path (SVG).
    #[serde(default = "default_heatmap_path")]
    pub heatmap_path: PathBuf,
    /// Number of recent ticks shown in the heatmap.
    #[serde(default = "default_heatmap_rows")]
    pub heatmap_rows: usize,
    /// Email alert settings; alerts are disabled when absent.
    #[serde(default)]
    pub email: Option<EmailConfig>,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_candles() -> usize {
    300
}

fn default_ema_fast() -> usize {
    20
}

fn default_ema_slow() -> usize {
    50
}

fn default_scan_interval() -> u64 {
    300
}

fn default_alert_threshold() -> f64 {
    0.2
}

fn default_timezone() -> String {
    "America/New_York".to_string()
}

fn default_log_path() -> PathBuf {
    PathBuf::from("signal_log.csv")
}

fn default_heatmap_path() -> PathBuf {
    PathBuf::from("signal_heatmap.svg")
}

fn default_heatmap_rows() -> usize {
    50
}

impl Config {
    /// Load and validate configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let mut config: Config = serde_json::from_str(&raw)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        if let Some(email) = config.email.as_mut() {
            email.password = env::var("SMTP_PASSWORD").ok();
        }
        config.validate()?;
        Ok(config)
    }

    /// Validate all fields; any failure here is fatal at startup.
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(AppError::Config("symbol must not be empty".to_string()));
        }
        if self.ema_fast < 1 {
            return Err(AppError::Config("ema_fast must be at least 1".to_string()));
        }
        if self.ema_slow <= self.ema_fast {
            return Err(AppError::Config(format!(
                "ema_slow ({}) must be greater than ema_fast ({})",
                self.ema_slow, self.ema_fast
            )));
        }
        if self.candles < self.ema_slow + 2 {
            return Err(AppError::Config(format!(
                "candles ({}) must cover the slow EMA plus closed-candle offset ({})",
                self.candles,
                self.ema_slow + 2
            )));
        }
        if self.candles > 1000 {
            return Err(AppError::Config(
                "candles must not exceed the exchange limit of 1000".to_string(),
            ));
        }
        if self.scan_interval_seconds == 0 || self.scan_interval_seconds > 86_400 {
            return Err(AppError::Config(format!(
                "scan_interval_seconds ({}) must be between 1 and 86400",
                self.scan_interval_seconds
            )));
        }
        if !(0.0..=1.0).contains(&self.alert_threshold) {
            return Err(AppError::Config(format!(
                "alert_threshold ({}) must be between 0.0 and 1.0",
                self.alert_threshold
            )));
        }
        if self.timezone.parse::<Tz>().is_err() {
            return Err(AppError::Config(format!(
                "unknown timezone: {}",
                self.timezone
            )));
        }
        if self.heatmap_rows == 0 {
            return Err(AppError::Config(
                "heatmap_rows must be at least 1".to_string(),
            ));
        }
        for (interval, lookback) in &self.structure_lookbacks {
            if *lookback < 4 {
                return Err(AppError::Config(format!(
                    "structure lookback for {} ({}) must be at least 4",
                    interval, lookback
                )));
            }
        }
        if let Some(email) = &self.email {
            if !email.sender.contains('@') || !email.receiver.contains('@') {
                return Err(AppError::Config(
                    "email sender and receiver must be full addresses".to_string(),
                ));
            }
            if email.smtp_server.trim().is_empty() {
                return Err(AppError::Config(
                    "email smtp_server must not be empty".to_string(),
                ));
            }
            match &email.password {
                Some(password) if !password.is_empty() => {}
                _ => {
                    return Err(AppError::Config(
                        "email alerts enabled but SMTP_PASSWORD is not set".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// The parsed scan timezone. Validated at load, so the fallback is
    /// unreachable in practice.
    pub fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or(chrono_tz::UTC)
    }

    /// Structure lookback for an interval, or the caller's default when the
    /// config has no entry for it.
    pub fn structure_lookback(&self, interval: Interval, fallback: usize) -> usize {
        self.structure_lookbacks
            .get(&interval)
            .copied()
            .unwrap_or(fallback)
    }
}
