//! High score tracking
//!
//! Kept in memory for the lifetime of the process only.

use serde::{Deserialize, Serialize};

/// Best score across every run of this process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScore {
    best: u64,
    /// Runs submitted so far
    runs: u32,
}

impl HighScore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn best(&self) -> u64 {
        self.best
    }

    pub fn runs(&self) -> u32 {
        self.runs
    }

    /// Whether a score would replace the current best
    pub fn qualifies(&self, score: u64) -> bool {
        score > self.best
    }

    /// Record a finished run. Returns true if it set a new best.
    pub fn submit(&mut self, score: u64) -> bool {
        self.runs = self.runs.saturating_add(1);
        self.observe(score)
    }

    /// Raise the best to `score` without counting a run
    pub fn observe(&mut self, score: u64) -> bool {
        if self.qualifies(score) {
            log::info!("New high score: {} (was {})", score, self.best);
            self.best = score;
            true
        } else {
            false
        }
    }
}
