//! Continuous-mode best time
//!
//! Tracks the fastest full cycle through every category. Persisted as a
//! single number of milliseconds.

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::storage::{KeyValueStore, load_json, save_json};

/// Best full-cycle completion time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestTime {
    /// Fastest cycle in ms, if any cycle was ever finished
    pub millis: Option<u64>,
}

impl BestTime {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "emoji_fall_best_time";

    pub fn new() -> Self {
        Self { millis: None }
    }

    /// Check if an elapsed cycle time beats the record (strictly faster)
    pub fn qualifies(&self, elapsed_ms: u64) -> bool {
        self.millis.is_none_or(|best| elapsed_ms < best)
    }

    /// Record a cycle time. Returns true if it became the new best.
    pub fn submit(&mut self, elapsed_ms: u64) -> bool {
        if !self.qualifies(elapsed_ms) {
            return false;
        }
        self.millis = Some(elapsed_ms);
        true
    }

    /// Load the stored record. A missing or corrupt entry means no record.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match load_json::<u64>(store, Self::STORAGE_KEY) {
            Ok(Some(millis)) => {
                log::info!("Loaded best time: {} ms", millis);
                Self {
                    millis: Some(millis),
                }
            }
            Ok(None) => {
                log::info!("No best time found, starting fresh");
                Self::new()
            }
            Err(err) => {
                log::warn!("Best time unavailable: {}", err);
                Self::new()
            }
        }
    }

    /// Persist the record (no-op when there is none)
    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), StorageError> {
        let Some(millis) = self.millis else {
            return Ok(());
        };
        save_json(store, Self::STORAGE_KEY, &millis)?;
        log::info!("Best time saved ({} ms)", millis);
        Ok(())
    }
}

/// Format a duration as `m:ss.t`
pub fn format_millis(millis: u64) -> String {
    let tenths = (millis / 100) % 10;
    let secs = (millis / 1000) % 60;
    let mins = millis / 60_000;
    format!("{}:{:02}.{}", mins, secs, tenths)
}
