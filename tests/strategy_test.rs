/**
 * Strategy Evaluation Tests
 *
 * Drives both evaluation strategies through the public API with synthetic
 * candle frames:
 * - Confluence pullback detection and weighted scoring
 * - Consensus agreement counting across conflicting frames
 * - Log rows lining up with each strategy's schema
 */

use chrono::TimeZone;
use chrono_tz::America::New_York;

use vigil::config::Config;
use vigil::services::strategy::{build_strategy, MarketData};
use vigil::types::{Direction, Interval, CONFLUENCE_LOG_HEADER, CONSENSUS_LOG_HEADER};

mod common {
    use vigil::types::Candle;

    pub fn frame(closes: &[f64], step_ms: i64) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, close)| Candle {
                open_time: 1_700_000_000_000 + i as i64 * step_ms,
                open: *close,
                high: close + 1.0,
                low: close - 1.0,
                close: *close,
                volume: 10.0,
            })
            .collect()
    }

    pub fn uptrend(count: usize) -> Vec<f64> {
        (0..count).map(|i| 100.0 + i as f64 * 1.5).collect()
    }

    pub fn downtrend(count: usize) -> Vec<f64> {
        (0..count).map(|i| 400.0 - i as f64 * 1.5).collect()
    }
}

fn eval_time() -> chrono::DateTime<chrono_tz::Tz> {
    New_York.with_ymd_and_hms(2024, 3, 1, 10, 5, 0).unwrap()
}

fn confluence_config() -> Config {
    serde_json::from_str(r#"{"symbol": "BTCUSDT"}"#).unwrap()
}

fn consensus_config() -> Config {
    serde_json::from_str(r#"{"symbol": "BTCUSDT", "strategy": "consensus"}"#).unwrap()
}

fn confluence_data(htf: &[f64], ltf: &[f64], primary: &[f64]) -> MarketData {
    let mut data = MarketData::new();
    data.insert(Interval::FourHours, common::frame(htf, 14_400_000));
    data.insert(Interval::OneHour, common::frame(ltf, 3_600_000));
    data.insert(Interval::FifteenMinutes, common::frame(primary, 900_000));
    data
}

fn consensus_data(local: &[f64], htf: &[f64]) -> MarketData {
    let mut data = MarketData::new();
    data.insert(Interval::OneHour, common::frame(local, 3_600_000));
    data.insert(Interval::FourHours, common::frame(htf, 14_400_000));
    data
}

#[test]
fn test_confluence_downtrend_reads_bearish_without_entry() {
    let strategy = build_strategy(&confluence_config());
    let down = common::downtrend(100);
    let signal = strategy.evaluate(&confluence_data(&down, &down, &down), eval_time());

    assert_eq!(signal.direction, Direction::None);

    let row = signal.log_row();
    assert_eq!(row.len(), CONFLUENCE_LOG_HEADER.len());
    assert_eq!(row[6], "lower_high");
    assert_eq!(row[7], "BEAR");
    assert_eq!(row[9], "NONE");
}

#[test]
fn test_confluence_pullback_long_through_public_api() {
    let strategy = build_strategy(&confluence_config());

    // Flat base with a final nudge that parks the last closed candle just
    // above the slow EMA while both bias frames trend up.
    let mut primary = vec![100.0; 58];
    primary.push(100.2);
    primary.push(100.05);
    let up = common::uptrend(100);

    let signal = strategy.evaluate(&confluence_data(&up, &up, &primary), eval_time());
    assert_eq!(signal.direction, Direction::Long);
    assert!((signal.confidence - 0.9).abs() < 1e-9);

    let row = signal.log_row();
    assert_eq!(row[0], "2024-03-01 10:05");
    assert_eq!(row[9], "LONG");
    assert_eq!(row[10], "0.90");
}

#[test]
fn test_consensus_full_alignment_long() {
    let strategy = build_strategy(&consensus_config());
    let up = common::uptrend(100);
    let signal = strategy.evaluate(&consensus_data(&up, &up), eval_time());

    assert_eq!(signal.direction, Direction::Long);
    assert_eq!(signal.confidence, 4.0);

    let row = signal.log_row();
    assert_eq!(row.len(), CONSENSUS_LOG_HEADER.len());
    assert_eq!(row[7], "4");
    assert!(row[12].contains("trend continuation"));
    assert!(row[12].contains("Trending regime: Yes"));
}

#[test]
fn test_consensus_conflicting_frames_stay_flat() {
    let strategy = build_strategy(&consensus_config());
    let signal = strategy.evaluate(
        &consensus_data(&common::uptrend(100), &common::downtrend(100)),
        eval_time(),
    );

    assert_eq!(signal.direction, Direction::None);
    assert_eq!(signal.confidence, 2.0);
    assert!(signal
        .reasons
        .contains(&"Confidence too low for signal.".to_string()));
}

#[test]
fn test_strategies_use_distinct_schemas() {
    let confluence = build_strategy(&confluence_config());
    let consensus = build_strategy(&consensus_config());

    assert_ne!(confluence.log_header(), consensus.log_header());
    assert_eq!(confluence.confidence_ceiling(), 1.0);
    assert_eq!(consensus.confidence_ceiling(), 4.0);
}

#[test]
fn test_missing_frames_never_panic() {
    for config in [confluence_config(), consensus_config()] {
        let strategy = build_strategy(&config);
        let signal = strategy.evaluate(&MarketData::new(), eval_time());
        assert_eq!(signal.direction, Direction::None);
        assert_eq!(signal.log_row().len(), strategy.log_header().len());
    }
}
