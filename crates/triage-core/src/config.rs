use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use super::window::DEFAULT_LOOKAHEAD;

pub const MIN_UNDO_WINDOW_SECS: u64 = 6;
pub const MAX_UNDO_WINDOW_SECS: u64 = 10;

/// Tunables for a triage session. Every section falls back to its defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    pub gesture: GestureConfig,
    pub stack: StackConfig,
    pub undo: UndoConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub commit_threshold: f64,
    pub reveal_distance: f64,
    pub haptic_threshold: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            commit_threshold: 80.0,
            reveal_distance: 200.0,
            haptic_threshold: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    pub lookahead: usize,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            lookahead: DEFAULT_LOOKAHEAD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UndoConfig {
    pub window_secs: u64,
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self { window_secs: 8 }
    }
}

impl UndoConfig {
    /// Configured window, clamped to the supported range.
    pub fn window(self) -> Duration {
        Duration::from_secs(
            self.window_secs
                .clamp(MIN_UNDO_WINDOW_SECS, MAX_UNDO_WINDOW_SECS),
        )
    }
}
