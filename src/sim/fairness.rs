//! Fairness tracking
//!
//! Remembers when each item last appeared on screen so decoy selection can
//! lean toward items the child has not seen for a while. The stale set is
//! cached and only rebuilt after an invalidation (new appearances, a
//! periodic sweep, or a category change).

use std::collections::HashMap;

use rand::Rng;
use rand::seq::IndexedRandom;

use super::catalog::VocabularyItem;

#[derive(Debug, Clone)]
pub struct FairnessTracker {
    rotation_threshold_ms: u64,
    last_seen: HashMap<&'static str, u64>,
    /// None when invalidated
    stale_cache: Option<Vec<VocabularyItem>>,
    recomputations: u64,
}

impl FairnessTracker {
    pub fn new(rotation_threshold_ms: u64) -> Self {
        Self {
            rotation_threshold_ms,
            last_seen: HashMap::new(),
            stale_cache: None,
            recomputations: 0,
        }
    }

    /// Forget everything (new category vocabulary)
    pub fn reset(&mut self) {
        self.last_seen.clear();
        self.stale_cache = None;
    }

    /// Force the stale set to be rebuilt on next use
    pub fn invalidate(&mut self) {
        self.stale_cache = None;
    }

    pub fn record_appearance(&mut self, item: &VocabularyItem, now: u64) {
        self.last_seen.insert(item.name, now);
        self.stale_cache = None;
    }

    pub fn last_seen(&self, item: &VocabularyItem) -> Option<u64> {
        self.last_seen.get(item.name).copied()
    }

    /// Number of times the stale set was rebuilt
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }

    /// Items never seen, or unseen for longer than the rotation threshold
    pub fn stale_items(&mut self, now: u64, items: &[VocabularyItem]) -> &[VocabularyItem] {
        if self.stale_cache.is_none() {
            let threshold = self.rotation_threshold_ms;
            let stale = items
                .iter()
                .filter(|item| {
                    self.last_seen
                        .get(item.name)
                        .is_none_or(|&seen| now.saturating_sub(seen) > threshold)
                })
                .copied()
                .collect();
            self.recomputations += 1;
            self.stale_cache = Some(stale);
        }
        self.stale_cache.as_deref().unwrap_or(&[])
    }

    /// Pick a decoy candidate (never `exclude`). Stale items win with
    /// probability `stale_bias`; otherwise any non-excluded item can come up.
    pub fn pick_decoy<R: Rng + ?Sized>(
        &mut self,
        now: u64,
        items: &[VocabularyItem],
        exclude: &VocabularyItem,
        stale_bias: f64,
        rng: &mut R,
    ) -> Option<VocabularyItem> {
        let pool: Vec<VocabularyItem> = items
            .iter()
            .filter(|item| item.emoji != exclude.emoji)
            .copied()
            .collect();
        if pool.is_empty() {
            return None;
        }

        let stale: Vec<VocabularyItem> = self
            .stale_items(now, items)
            .iter()
            .filter(|item| item.emoji != exclude.emoji)
            .copied()
            .collect();

        if !stale.is_empty() && rng.random_bool(stale_bias.clamp(0.0, 1.0)) {
            return stale.choose(rng).copied();
        }
        pool.choose(rng).copied()
    }
}
