//! Pure market analysis over candle series: directional bias, structure
//! classification and trend regime. Everything here is deterministic and
//! side-effect free; the strategies compose these into signals.

pub mod bias;
pub mod regime;
pub mod structure;

pub use bias::{close_vs_average, fast_vs_slow};
pub use regime::is_trending;
pub use structure::{direction_aware_score, split_window_structure, swing_structure};
