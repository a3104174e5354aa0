pub mod alert;
pub mod analysis;
pub mod heatmap;
pub mod indicators;
pub mod notifier;
pub mod scanner;
pub mod scheduler;
pub mod signal_log;
pub mod strategy;

pub use alert::AlertState;
pub use heatmap::HeatmapRenderer;
pub use notifier::EmailNotifier;
pub use scanner::Scanner;
pub use scheduler::TickScheduler;
pub use signal_log::{LogRow, SignalLog};
