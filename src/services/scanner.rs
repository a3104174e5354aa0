//! The periodic scan loop tying fetch, evaluation, logging and alerting
//! together.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::config::Config;
use crate::error::Result;
use crate::services::alert::AlertState;
use crate::services::heatmap::HeatmapRenderer;
use crate::services::notifier::{self, EmailNotifier};
use crate::services::scheduler::TickScheduler;
use crate::services::signal_log::SignalLog;
use crate::services::strategy::{KlineRequest, MarketData, Strategy};
use crate::sources::BinanceClient;
use crate::types::{AlertLevel, Breakdown, Interval, Signal};

pub struct Scanner {
    config: Config,
    client: BinanceClient,
    strategy: Box<dyn Strategy>,
    log: SignalLog,
    notifier: Option<EmailNotifier>,
    heatmap: HeatmapRenderer,
    scheduler: TickScheduler,
    alert_state: AlertState,
}

/// Collapses duplicate interval requests, keeping the largest limit, so a
/// strategy asking for the same frame twice costs one API call.
fn dedupe_requests(requests: &[KlineRequest]) -> HashMap<Interval, usize> {
    let mut wanted: HashMap<Interval, usize> = HashMap::new();
    for request in requests {
        let limit = wanted.entry(request.interval).or_insert(0);
        *limit = (*limit).max(request.limit);
    }
    wanted
}

impl Scanner {
    pub fn new(
        config: Config,
        client: BinanceClient,
        strategy: Box<dyn Strategy>,
        log: SignalLog,
        notifier: Option<EmailNotifier>,
        heatmap: HeatmapRenderer,
    ) -> Self {
        let scheduler = TickScheduler::new(config.scan_interval_seconds, config.tz());
        Self {
            config,
            client,
            strategy,
            log,
            notifier,
            heatmap,
            scheduler,
            alert_state: AlertState::new(),
        }
    }

    async fn fetch_market_data(&self) -> Result<MarketData> {
        let mut data = MarketData::new();
        for (interval, limit) in dedupe_requests(&self.strategy.requests()) {
            let candles = self
                .client
                .fetch_klines(&self.config.symbol, interval, limit)
                .await?;
            data.insert(interval, candles);
        }
        Ok(data)
    }

    /// Evaluates one tick from already-fetched market data: log the row,
    /// fire the alert gate, refresh the heatmap.
    ///
    /// Alert delivery and heatmap failures are logged but do not fail the
    /// tick; the signal log append does, since a log that silently drops
    /// rows is worse than a halted scanner.
    pub async fn process(&mut self, data: &MarketData, now: DateTime<chrono_tz::Tz>) -> Result<Signal> {
        let signal = self.strategy.evaluate(data, now);

        match &signal.breakdown {
            Breakdown::Confluence(scores) => info!(
                symbol = %self.config.symbol,
                price = signal.price,
                direction = %signal.direction,
                confidence = signal.confidence,
                structure = scores.structure.as_str(),
                htf_bias = %scores.htf_bias,
                ltf_bias = %scores.ltf_bias,
                stoch_rsi = scores.stoch_rsi,
                "Scan tick evaluated"
            ),
            Breakdown::Consensus(scores) => info!(
                symbol = %self.config.symbol,
                price = signal.price,
                direction = %signal.direction,
                confidence = signal.confidence,
                structure = scores.structure.as_str(),
                htf_bias = %scores.htf_bias,
                ltf_bias = %scores.ltf_bias,
                score_htf = scores.score_htf,
                score_ltf = scores.score_ltf,
                score_structure = scores.score_structure,
                score_trend = scores.score_trend,
                "Scan tick evaluated"
            ),
        }
        if !signal.reasons.is_empty() {
            info!("Reasoning: {}", signal.reasons.join(" | "));
        }

        self.log.append(&signal.log_row())?;

        let ceiling = self.strategy.confidence_ceiling();
        let normalized = if ceiling > 0.0 {
            signal.confidence / ceiling
        } else {
            0.0
        };
        let (next_state, fire) =
            self.alert_state
                .observe(signal.direction, normalized, self.config.alert_threshold);
        self.alert_state = next_state;

        if fire {
            let level = AlertLevel::from_normalized(normalized);
            info!(
                level = %level,
                "Alert: {} {} at {:.0}% confidence",
                self.config.symbol,
                signal.direction,
                normalized * 100.0
            );
            if let Some(notifier) = &self.notifier {
                let subject =
                    notifier::alert_subject(&self.config.symbol, signal.direction, level, normalized);
                let body = notifier::alert_body(&signal, level, normalized);
                if let Err(e) = notifier.send(&subject, &body).await {
                    error!("Failed to send alert email: {}", e);
                }
            }
        }

        match self.log.tail(self.config.heatmap_rows) {
            Ok(rows) => {
                if let Err(e) = self.heatmap.render(&rows) {
                    error!("Failed to render heatmap: {}", e);
                }
            }
            Err(e) => error!("Failed to read signal log tail: {}", e),
        }

        Ok(signal)
    }

    /// One full scan: fetch every frame the strategy asks for, then process.
    pub async fn tick(&mut self) -> Result<()> {
        let data = self.fetch_market_data().await?;
        let now = Utc::now().with_timezone(&self.config.tz());
        self.process(&data, now).await?;
        Ok(())
    }

    /// Runs forever, ticking on wall-clock boundaries of the scan interval.
    /// A failed tick is logged and the loop moves on to the next boundary.
    pub async fn run(mut self) {
        info!(
            symbol = %self.config.symbol,
            strategy = self.strategy.name(),
            interval_secs = self.config.scan_interval_seconds,
            timezone = %self.config.timezone,
            "Scanner started"
        );

        loop {
            let wait = self.scheduler.wait_from(Utc::now());
            if !wait.is_zero() {
                let next = Utc::now().with_timezone(&self.config.tz())
                    + chrono::Duration::milliseconds(wait.as_millis() as i64);
                info!("Next scan at {}", next.format("%Y-%m-%d %H:%M:%S %Z"));
                tokio::time::sleep(wait).await;
            }

            if let Err(e) = self.tick().await {
                error!("Scan tick failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedupe_keeps_largest_limit() {
        let requests = vec![
            KlineRequest {
                interval: Interval::OneHour,
                limit: 200,
            },
            KlineRequest {
                interval: Interval::OneHour,
                limit: 300,
            },
            KlineRequest {
                interval: Interval::FourHours,
                limit: 200,
            },
        ];

        let wanted = dedupe_requests(&requests);
        assert_eq!(wanted.len(), 2);
        assert_eq!(wanted[&Interval::OneHour], 300);
        assert_eq!(wanted[&Interval::FourHours], 200);
    }

    #[test]
    fn test_dedupe_empty() {
        assert!(dedupe_requests(&[]).is_empty());
    }
}
