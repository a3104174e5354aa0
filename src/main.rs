use std::env;
use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vigil::config::Config;
use vigil::services::strategy::build_strategy;
use vigil::services::{EmailNotifier, HeatmapRenderer, Scanner, SignalLog};
use vigil::sources::BinanceClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vigil=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path =
        PathBuf::from(env::var("VIGIL_CONFIG").unwrap_or_else(|_| "config.json".to_string()));
    let config = Config::load(&config_path)?;

    let strategy = build_strategy(&config);
    info!(
        "Starting {} scan of {} every {}s, boundaries aligned to {}",
        strategy.name(),
        config.symbol,
        config.scan_interval_seconds,
        config.timezone
    );

    let client = BinanceClient::new();
    let log = SignalLog::open(config.log_path.clone(), strategy.log_header())?;

    let notifier = match &config.email {
        Some(email) => Some(EmailNotifier::new(email)?),
        None => {
            info!("Email alerts disabled (no email config)");
            None
        }
    };

    let heatmap = HeatmapRenderer::new(
        config.heatmap_path.clone(),
        config.heatmap_rows,
        strategy.confidence_ceiling(),
        config.symbol.as_str(),
    )?;

    let scanner = Scanner::new(config, client, strategy, log, notifier, heatmap);
    scanner.run().await;

    Ok(())
}
