//! Spawn scheduler and overflow pruner
//!
//! One call is one spawn tick. The tick builds the pruned pool and the new
//! batch off to the side, then commits both in a single assignment, so a
//! failed tick leaves the pool untouched.

use std::collections::HashSet;

use glam::Vec2;
use rand::Rng;

use super::catalog::{Category, VocabularyItem};
use super::engagement::difficulty;
use super::placement::{find_safe_position, sample_candidate};
use super::state::{GameObject, Lane, SessionContext};
use crate::consts::{TARGET_STARVATION_MS, VISIBLE_DUPLICATE_REJECT_CHANCE};
use crate::error::EngineError;
use crate::tuning::Tuning;

/// What a spawn tick did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpawnOutcome {
    pub targets: usize,
    pub decoys: usize,
    pub pruned: usize,
    /// Target spawn was forced by starvation
    pub forced: bool,
    /// Forced spawn pushed the pool past its soft capacity
    pub overrun: bool,
    /// Items spawned this tick, in spawn order
    pub spawned: Vec<VocabularyItem>,
}

impl SpawnOutcome {
    pub fn total(&self) -> usize {
        self.targets + self.decoys
    }
}

/// True when no target has spawned for longer than the starvation window
pub fn target_starved(last_target_spawn_at: Option<u64>, now: u64) -> bool {
    last_target_spawn_at.is_none_or(|last| now.saturating_sub(last) > TARGET_STARVATION_MS)
}

/// Drop decoys until the pool is back under the prune threshold.
///
/// Lowest objects on screen go first. Targets are never removed and at
/// least `min_decoy_slots` decoys survive. Returns the kept pool and how
/// many objects were removed.
pub fn prune_overflow(
    pool: &[GameObject],
    target: &VocabularyItem,
    tuning: &Tuning,
) -> (Vec<GameObject>, usize) {
    let threshold = tuning.prune_threshold();
    if pool.len() <= threshold {
        return (pool.to_vec(), 0);
    }

    let mut decoys: Vec<&GameObject> = pool.iter().filter(|obj| !obj.shows(target)).collect();
    let removable = decoys.len().saturating_sub(tuning.min_decoy_slots);
    let to_remove = (pool.len() - threshold).min(removable);
    if to_remove == 0 {
        return (pool.to_vec(), 0);
    }

    decoys.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.id.cmp(&b.id)));
    let doomed: HashSet<u32> = decoys.iter().take(to_remove).map(|obj| obj.id).collect();
    let kept = pool
        .iter()
        .filter(|obj| !doomed.contains(&obj.id))
        .cloned()
        .collect();
    (kept, to_remove)
}

/// Pick one decoy with duplicate avoidance.
///
/// Items already spawned in this batch are always rejected; items visible
/// on screen are rejected with a 70% chance. At most
/// `max(1, 2 * visible.len())` candidates are sampled, after which the last
/// candidate is accepted as-is.
#[allow(clippy::too_many_arguments)]
fn select_decoy<R: Rng + ?Sized>(
    ctx: &mut SessionContext,
    category: &Category,
    target: &VocabularyItem,
    visible: &HashSet<&'static str>,
    batch: &HashSet<&'static str>,
    now: u64,
    tuning: &Tuning,
    rng: &mut R,
) -> Option<VocabularyItem> {
    let max_attempts = (2 * visible.len()).max(1);
    let mut last = None;
    for _ in 0..max_attempts {
        let candidate =
            ctx.fairness
                .pick_decoy(now, category.items, target, tuning.stale_bias, rng)?;
        last = Some(candidate);
        if batch.contains(candidate.name) {
            continue;
        }
        if visible.contains(candidate.name) && rng.random_bool(VISIBLE_DUPLICATE_REJECT_CHANCE) {
            continue;
        }
        return Some(candidate);
    }
    last
}

fn object_size<R: Rng + ?Sized>(tuning: &Tuning, rng: &mut R) -> f32 {
    let jitter = tuning.object_size_jitter_px;
    if jitter > 0.0 {
        tuning.object_size_px + rng.random_range(-jitter..jitter)
    } else {
        tuning.object_size_px
    }
}

/// Run one spawn tick against `pool`.
///
/// Errors are raised before anything is committed.
#[allow(clippy::too_many_arguments)]
pub fn spawn_tick<R: Rng + ?Sized>(
    pool: &mut Vec<GameObject>,
    ctx: &mut SessionContext,
    category: &Category,
    target: &VocabularyItem,
    progress: u8,
    now: u64,
    tuning: &Tuning,
    rng: &mut R,
) -> Result<SpawnOutcome, EngineError> {
    if !category.contains(target) {
        return Err(EngineError::InvariantViolation(format!(
            "target {} ({}) has no entry in category '{}'",
            target.emoji, target.name, category.name
        )));
    }

    let forced = target_starved(ctx.last_target_spawn_at, now);
    let (mut working, pruned) = prune_overflow(pool, target, tuning);
    if pruned > 0 {
        log::debug!("Pruned {} decoys before spawning ({} left)", pruned, working.len());
    }

    let available = tuning.max_active_objects.saturating_sub(working.len());
    let mut count = available.min(tuning.spawn_count);
    let mut overrun = false;
    if forced && count == 0 {
        // Liveness beats capacity: one target goes out even with no free slot.
        count = 1;
        overrun = true;
        log::warn!(
            "Forced target spawn with no free slot: pool will hold {} of {}",
            working.len() + 1,
            tuning.max_active_objects
        );
    }

    let mut outcome = SpawnOutcome {
        pruned,
        forced,
        overrun,
        ..Default::default()
    };

    if count == 0 {
        *pool = working;
        return Ok(outcome);
    }

    let mut target_count = tuning.target_guarantee_count.min(count);
    if forced {
        target_count = target_count.max(1);
    }

    let mut visible: HashSet<&'static str> = working.iter().map(|obj| obj.item.name).collect();
    let mut in_batch: HashSet<&'static str> = HashSet::new();
    let fall_speed = difficulty(progress, tuning).fall_speed;
    let first_lane = if rng.random_bool(0.5) { 0 } else { 1 };
    let mut batch: Vec<GameObject> = Vec::with_capacity(count);

    for index in 0..count {
        let item = if index < target_count {
            *target
        } else {
            match select_decoy(ctx, category, target, &visible, &in_batch, now, tuning, rng) {
                Some(item) => item,
                // Single-item category: nothing to use as a decoy
                None => break,
            }
        };

        let lane = Lane::BOTH[(first_lane + index) % 2];
        let size = object_size(tuning, rng);
        let candidate = sample_candidate(lane, index / 2, size, tuning, rng);
        let existing: Vec<Vec2> = working
            .iter()
            .chain(batch.iter())
            .filter(|obj| obj.lane == lane)
            .map(|obj| Vec2::new(obj.x, obj.y))
            .collect();
        let placement = find_safe_position(candidate, lane, &existing, tuning, rng);

        batch.push(GameObject {
            id: ctx.next_entity_id(),
            item,
            lane,
            x: placement.pos.x,
            y: placement.pos.y,
            fall_speed,
            size,
        });
        visible.insert(item.name);
        in_batch.insert(item.name);

        if index < target_count {
            outcome.targets += 1;
        } else {
            outcome.decoys += 1;
        }
        outcome.spawned.push(item);
    }

    working.extend(batch);
    *pool = working;

    for item in &outcome.spawned {
        ctx.fairness.record_appearance(item, now);
    }
    if outcome.targets > 0 {
        ctx.last_target_spawn_at = Some(now);
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::catalog::Catalog;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn fruits() -> Category {
        Catalog::builtin().get(0).copied().unwrap()
    }

    fn object(id: u32, item: VocabularyItem, y: f32) -> GameObject {
        GameObject {
            id,
            item,
            lane: Lane::Left,
            x: 20.0,
            y,
            fall_speed: 90.0,
            size: 80.0,
        }
    }

    #[test]
    fn test_first_tick_is_forced_and_spawns_targets_first() {
        let category = fruits();
        let target = category.items[0];
        let tuning = Tuning::default();
        let mut ctx = SessionContext::new(tuning.rotation_threshold_ms);
        let mut rng = Pcg32::seed_from_u64(11);
        let mut pool = Vec::new();

        let outcome =
            spawn_tick(&mut pool, &mut ctx, &category, &target, 0, 1_000, &tuning, &mut rng)
                .unwrap();

        assert!(outcome.forced);
        assert_eq!(outcome.targets, tuning.target_guarantee_count);
        assert_eq!(outcome.total(), tuning.spawn_count);
        assert_eq!(pool.len(), tuning.spawn_count);
        assert!(pool[0].shows(&target));
        assert!(pool[1].shows(&target));
        assert!(pool[2..].iter().all(|obj| !obj.shows(&target)));
        assert!(pool.iter().all(|obj| obj.y < 0.0));
        assert_eq!(ctx.last_target_spawn_at, Some(1_000));
    }

    #[test]
    fn test_decoys_unique_within_batch_when_vocabulary_allows() {
        let category = fruits();
        let target = category.items[0];
        let tuning = Tuning::default();
        let mut ctx = SessionContext::new(tuning.rotation_threshold_ms);
        let mut rng = Pcg32::seed_from_u64(5);
        let mut pool = Vec::new();

        spawn_tick(&mut pool, &mut ctx, &category, &target, 0, 0, &tuning, &mut rng).unwrap();

        let decoys: Vec<_> = pool.iter().filter(|o| !o.shows(&target)).map(|o| o.item.name).collect();
        let unique: HashSet<_> = decoys.iter().collect();
        assert_eq!(decoys.len(), unique.len());
    }

    #[test]
    fn test_targets_spawn_every_tick_even_with_targets_on_screen() {
        let category = fruits();
        let target = category.items[0];
        let tuning = Tuning::default();
        let mut ctx = SessionContext::new(tuning.rotation_threshold_ms);
        ctx.last_target_spawn_at = Some(0);
        let mut rng = Pcg32::seed_from_u64(9);
        let mut pool = vec![object(1, target, 100.0), object(2, target, 200.0)];

        let outcome =
            spawn_tick(&mut pool, &mut ctx, &category, &target, 0, 2_000, &tuning, &mut rng)
                .unwrap();
        assert!(!outcome.forced);
        assert_eq!(outcome.targets, tuning.target_guarantee_count);
        assert_eq!(outcome.decoys, tuning.spawn_count - tuning.target_guarantee_count);
        assert_eq!(pool.iter().filter(|o| o.shows(&target)).count(), 4);
        assert_eq!(ctx.last_target_spawn_at, Some(2_000));
    }

    #[test]
    fn test_target_count_limited_by_free_slots() {
        let category = fruits();
        let target = category.items[0];
        let tuning = Tuning::default();
        let mut ctx = SessionContext::new(tuning.rotation_threshold_ms);
        ctx.last_target_spawn_at = Some(0);
        let mut rng = Pcg32::seed_from_u64(4);
        // 29 targets: nothing to prune, one free slot
        let mut pool: Vec<GameObject> = (0..29).map(|id| object(id, target, 0.0)).collect();

        let outcome =
            spawn_tick(&mut pool, &mut ctx, &category, &target, 0, 1_000, &tuning, &mut rng)
                .unwrap();
        assert_eq!(outcome.targets, 1);
        assert_eq!(outcome.decoys, 0);
        assert_eq!(pool.len(), tuning.max_active_objects);
    }

    #[test]
    fn test_starvation_window_is_strict() {
        let category = fruits();
        let target = category.items[0];
        let tuning = Tuning::default();
        let mut ctx = SessionContext::new(tuning.rotation_threshold_ms);
        ctx.last_target_spawn_at = Some(0);
        let mut rng = Pcg32::seed_from_u64(9);
        let mut pool: Vec<GameObject> = (0..30).map(|id| object(id, target, 0.0)).collect();

        // Exactly 6000ms is not yet starved: a full pool stays untouched
        let outcome =
            spawn_tick(&mut pool, &mut ctx, &category, &target, 0, 6_000, &tuning, &mut rng)
                .unwrap();
        assert!(!outcome.forced);
        assert_eq!(outcome.targets, 0);

        let outcome =
            spawn_tick(&mut pool, &mut ctx, &category, &target, 0, 6_001, &tuning, &mut rng)
                .unwrap();
        assert!(outcome.forced);
        assert_eq!(outcome.targets, 1);
        assert_eq!(ctx.last_target_spawn_at, Some(6_001));
    }

    #[test]
    fn test_pruner_keeps_targets_and_minimum_decoys() {
        let category = fruits();
        let target = category.items[0];
        let decoy = category.items[1];
        let tuning = Tuning::default();

        let mut pool = Vec::new();
        for id in 0..5 {
            pool.push(object(id, target, id as f32));
        }
        for id in 5..30 {
            pool.push(object(id, decoy, id as f32 * 10.0));
        }

        let (kept, removed) = prune_overflow(&pool, &target, &tuning);
        assert_eq!(kept.len(), tuning.prune_threshold());
        assert_eq!(removed, 5);
        assert_eq!(kept.iter().filter(|o| o.shows(&target)).count(), 5);
        // The five lowest decoys (largest y) are gone
        assert!(kept.iter().all(|o| o.id < 25));
    }

    #[test]
    fn test_pruner_stops_at_minimum_decoys() {
        let category = fruits();
        let target = category.items[0];
        let decoy = category.items[1];
        let tuning = Tuning::default();

        let mut pool: Vec<GameObject> = (0..26).map(|id| object(id, target, 0.0)).collect();
        pool.extend((26..30).map(|id| object(id, decoy, 0.0)));

        let (kept, removed) = prune_overflow(&pool, &target, &tuning);
        assert_eq!(removed, 1);
        assert_eq!(kept.iter().filter(|o| !o.shows(&target)).count(), tuning.min_decoy_slots);
    }

    #[test]
    fn test_forced_spawn_overruns_when_pool_is_all_targets() {
        let category = fruits();
        let target = category.items[0];
        let tuning = Tuning::default();
        let mut ctx = SessionContext::new(tuning.rotation_threshold_ms);
        ctx.last_target_spawn_at = Some(0);
        let mut rng = Pcg32::seed_from_u64(1);
        let mut pool: Vec<GameObject> = (0..30).map(|id| object(id, target, 0.0)).collect();

        let outcome =
            spawn_tick(&mut pool, &mut ctx, &category, &target, 0, 10_000, &tuning, &mut rng)
                .unwrap();
        assert!(outcome.overrun);
        assert_eq!(outcome.targets, 1);
        assert_eq!(pool.len(), tuning.max_active_objects + 1);
    }

    #[test]
    fn test_full_pool_without_starvation_is_noop() {
        let category = fruits();
        let target = category.items[0];
        let tuning = Tuning::default();
        let mut ctx = SessionContext::new(tuning.rotation_threshold_ms);
        ctx.last_target_spawn_at = Some(0);
        let mut rng = Pcg32::seed_from_u64(1);
        let mut pool: Vec<GameObject> = (0..30).map(|id| object(id, target, 0.0)).collect();

        let outcome =
            spawn_tick(&mut pool, &mut ctx, &category, &target, 0, 1_000, &tuning, &mut rng)
                .unwrap();
        assert_eq!(outcome.total(), 0);
        assert_eq!(pool.len(), 30);
    }

    #[test]
    fn test_unknown_target_is_invariant_violation_and_commits_nothing() {
        let category = fruits();
        let stranger = VocabularyItem::new("🚗", "car");
        let tuning = Tuning::default();
        let mut ctx = SessionContext::new(tuning.rotation_threshold_ms);
        let mut rng = Pcg32::seed_from_u64(1);
        let mut pool = vec![object(1, category.items[1], 0.0)];

        let err = spawn_tick(&mut pool, &mut ctx, &category, &stranger, 0, 0, &tuning, &mut rng)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvariantViolation(_)));
        assert_eq!(pool.len(), 1);
        assert_eq!(ctx.last_target_spawn_at, None);
    }

    #[test]
    fn test_two_item_category_terminates_with_duplicates() {
        const ITEMS: &[VocabularyItem] = &[
            VocabularyItem::new("1️⃣", "one"),
            VocabularyItem::new("2️⃣", "two"),
        ];
        let category = Category {
            name: "Counting",
            items: ITEMS,
            requires_sequence: false,
        };
        let tuning = Tuning::default();
        let mut ctx = SessionContext::new(tuning.rotation_threshold_ms);
        let mut rng = Pcg32::seed_from_u64(2);
        let mut pool = Vec::new();

        let outcome =
            spawn_tick(&mut pool, &mut ctx, &category, &ITEMS[0], 0, 0, &tuning, &mut rng)
                .unwrap();
        assert_eq!(outcome.total(), tuning.spawn_count);
        assert_eq!(outcome.decoys, tuning.spawn_count - 2);
        assert!(pool[2..].iter().all(|o| o.item == ITEMS[1]));
    }

    #[test]
    fn test_appearances_recorded() {
        let category = fruits();
        let target = category.items[0];
        let tuning = Tuning::default();
        let mut ctx = SessionContext::new(tuning.rotation_threshold_ms);
        let mut rng = Pcg32::seed_from_u64(4);
        let mut pool = Vec::new();
        let outcome =
            spawn_tick(&mut pool, &mut ctx, &category, &target, 0, 777, &tuning, &mut rng)
                .unwrap();
        for item in &outcome.spawned {
            assert_eq!(ctx.fairness.last_seen(item), Some(777));
        }
    }
}
