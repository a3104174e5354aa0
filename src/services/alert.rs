//! Alert deduplication.

use crate::types::Direction;

/// Dedup gate for alert fan-out.
///
/// Remembers the last (direction, confidence) pair that fired. Repeating
/// that exact pair stays silent; any change in direction or confidence
/// fires again. A NONE evaluation clears the memory, so the next
/// actionable signal always fires even if it matches the pair from before
/// the gap.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlertState {
    last_fired: Option<(Direction, f64)>,
}

impl AlertState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one evaluation into the gate. Returns the successor state and
    /// whether an alert should fire.
    ///
    /// `confidence` and `threshold` are on the normalized 0..=1 scale. A
    /// below-threshold signal neither fires nor disturbs the memory.
    pub fn observe(
        &self,
        direction: Direction,
        confidence: f64,
        threshold: f64,
    ) -> (AlertState, bool) {
        if !direction.is_actionable() {
            return (AlertState { last_fired: None }, false);
        }
        if confidence < threshold {
            return (self.clone(), false);
        }

        let candidate = (direction, confidence);
        if self.last_fired == Some(candidate) {
            return (self.clone(), false);
        }

        (
            AlertState {
                last_fired: Some(candidate),
            },
            true,
        )
    }
}
