//! Diary log entry.
//!
//! # Invariants
//! - `calories` is a snapshot taken when the entry was created and is never
//!   recomputed from the catalog.

use serde::{Deserialize, Serialize};

/// Tolerance used when matching servings of otherwise identical entries.
pub const SERVINGS_TOLERANCE: f64 = 0.001;

/// One consumed food on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Catalog food name at the time of logging.
    pub food: String,
    pub servings: f64,
    /// Snapshot of `food calories * servings`.
    pub calories: f64,
}

impl LogEntry {
    pub fn new(food: impl Into<String>, servings: f64, calories: f64) -> Self {
        Self {
            food: food.into(),
            servings,
            calories,
        }
    }

    /// Returns whether this entry was produced by logging `servings` of `food`.
    pub fn matches(&self, food: &str, servings: f64) -> bool {
        self.food == food && (self.servings - servings).abs() < SERVINGS_TOLERANCE
    }
}
