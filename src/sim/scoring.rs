//! Tap validation, scoring and level completion
//!
//! Functions here only touch session state. Anything the outside world has
//! to do in response (sounds, the deferred target spawn, persisting a best
//! time, cancelling timers) is returned as an [`Effect`] for the session to
//! carry out.

use rand::Rng;
use rand::seq::IndexedRandom;

use super::catalog::{Catalog, Category, VocabularyItem};
use super::engagement::{points_for, streak_multiplier};
use super::state::{GameObject, SessionContext, SessionPhase, SessionState};
use crate::audio::SoundEffect;
use crate::besttime::BestTime;
use crate::consts::*;
use crate::error::EngineError;

/// Follow-up work requested by a state transition
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    Sound(SoundEffect),
    /// Phase two of a target change: spawn against the new target
    ImmediateSpawn,
    /// Non-continuous win; every timer must stop
    LevelWon,
    /// Continuous mode moved on to another category
    LevelAdvanced { from: usize, to: usize },
    /// Full cycle finished faster than the stored record
    NewBestTime(u64),
}

/// Result of a validated tap
#[derive(Debug, Clone, PartialEq)]
pub struct TapOutcome {
    pub correct: bool,
    pub item: VocabularyItem,
    /// Time since the target was assigned
    pub latency_ms: u64,
    pub effects: Vec<Effect>,
}

/// Choose the target for a category. Sequence categories always get the
/// item under the cursor; others get a random item, avoiding `current`
/// when there is a choice.
pub fn choose_target<R: Rng + ?Sized>(
    category: &Category,
    cursor: usize,
    current: Option<&VocabularyItem>,
    rng: &mut R,
) -> Option<VocabularyItem> {
    if category.requires_sequence {
        return category.sequence_item(cursor);
    }
    let others: Vec<&VocabularyItem> = category
        .items
        .iter()
        .filter(|item| current.is_none_or(|cur| cur.emoji != item.emoji))
        .collect();
    match others.choose(rng) {
        Some(item) => Some(**item),
        None => category.items.first().copied(),
    }
}

/// Commit a new target with a fresh deadline
pub fn assign_target(state: &mut SessionState, item: VocabularyItem, now: u64) {
    state.target = Some(item);
    state.target_assigned_at = now;
    state.target_deadline = now.saturating_add(TARGET_DEADLINE_MS);
}

fn current_category<'a>(
    state: &SessionState,
    catalog: &'a Catalog,
) -> Result<&'a Category, EngineError> {
    catalog.get(state.level_index).ok_or_else(|| {
        EngineError::InvariantViolation(format!(
            "level {} has no category ({} in catalog)",
            state.level_index,
            catalog.len()
        ))
    })
}

fn assign_next_target<R: Rng + ?Sized>(
    state: &mut SessionState,
    ctx: &SessionContext,
    category: &Category,
    now: u64,
    rng: &mut R,
) -> Result<(), EngineError> {
    let next = choose_target(category, ctx.sequence_cursor, state.target.as_ref(), rng)
        .ok_or_else(|| {
            EngineError::InvariantViolation(format!("category '{}' is empty", category.name))
        })?;
    assign_target(state, next, now);
    Ok(())
}

/// Validate and score a tap on object `id`.
///
/// `Ok(None)` when the session is not in play. `LookupMiss` when the object
/// is already gone.
#[allow(clippy::too_many_arguments)]
pub fn apply_tap<R: Rng + ?Sized>(
    state: &mut SessionState,
    ctx: &mut SessionContext,
    pool: &mut Vec<GameObject>,
    catalog: &Catalog,
    id: u32,
    now: u64,
    shake_enabled: bool,
    rng: &mut R,
) -> Result<Option<TapOutcome>, EngineError> {
    if !state.is_playing() {
        return Ok(None);
    }
    let index = pool
        .iter()
        .position(|obj| obj.id == id)
        .ok_or(EngineError::LookupMiss { id })?;
    let category = *current_category(state, catalog)?;
    let target = state
        .target
        .ok_or_else(|| EngineError::InvariantViolation("no target while playing".into()))?;

    let tapped = pool[index].item;
    let correct = if category.requires_sequence {
        category
            .sequence_item(ctx.sequence_cursor)
            .is_some_and(|expected| expected.name == tapped.name)
    } else {
        tapped.emoji == target.emoji
    };

    pool.remove(index);
    let latency_ms = now.saturating_sub(state.target_assigned_at);
    let mut effects = Vec::new();

    if correct {
        state.streak += 1;
        state.multiplier = streak_multiplier(state.streak);
        state.score += points_for(state.streak);
        state.progress = (state.progress + PROGRESS_STEP).min(PROGRESS_MAX);
        effects.push(Effect::Sound(SoundEffect::Success));

        if category.requires_sequence {
            ctx.sequence_cursor += 1;
        }

        if state.progress >= PROGRESS_MAX {
            complete_level(state, ctx, catalog, now, rng, &mut effects)?;
        } else {
            assign_next_target(state, ctx, &category, now, rng)?;
            effects.push(Effect::ImmediateSpawn);
        }
    } else {
        state.streak = 0;
        state.multiplier = streak_multiplier(0);
        state.progress = state.progress.saturating_sub(PROGRESS_STEP);
        if shake_enabled {
            state.shake_until = Some(now + SHAKE_DURATION_MS);
        }
        effects.push(Effect::Sound(SoundEffect::Miss));
    }

    Ok(Some(TapOutcome {
        correct,
        item: tapped,
        latency_ms,
        effects,
    }))
}

/// Progress reached 100: win, or lap in continuous mode
pub fn complete_level<R: Rng + ?Sized>(
    state: &mut SessionState,
    ctx: &mut SessionContext,
    catalog: &Catalog,
    now: u64,
    rng: &mut R,
    effects: &mut Vec<Effect>,
) -> Result<(), EngineError> {
    if !state.continuous {
        state.phase = SessionPhase::Won;
        effects.push(Effect::Sound(SoundEffect::Win));
        effects.push(Effect::LevelWon);
        return Ok(());
    }

    state.lap_count += 1;
    state.progress = 0;
    effects.push(Effect::Sound(SoundEffect::Lap));

    let mut advanced = false;
    if state.lap_count % LAPS_PER_LEVEL == 0 && !catalog.is_empty() {
        let from = state.level_index;
        let to = (from + 1) % catalog.len();
        state.level_index = to;
        ctx.sequence_cursor = 0;
        ctx.fairness.reset();
        advanced = true;
        effects.push(Effect::LevelAdvanced { from, to });
        effects.push(Effect::Sound(SoundEffect::LevelUp));

        if to == 0 {
            let elapsed = now.saturating_sub(state.cycle_start_time);
            let mut record = BestTime {
                millis: state.best_time,
            };
            if record.submit(elapsed) {
                state.best_time = record.millis;
                effects.push(Effect::NewBestTime(elapsed));
            }
            state.cycle_start_time = now;
        }
    }

    let category = *current_category(state, catalog)?;
    // A new level must not inherit the old level's target as "current"
    if advanced {
        state.target = None;
    }
    assign_next_target(state, ctx, &category, now, rng)?;
    effects.push(Effect::ImmediateSpawn);
    Ok(())
}

/// Rotate the target without scoring (deadline expiry or manual change).
///
/// Sequence categories keep their expected item and only get a fresh
/// deadline. Returns true if the target item changed.
pub fn rotate_target<R: Rng + ?Sized>(
    state: &mut SessionState,
    ctx: &SessionContext,
    catalog: &Catalog,
    now: u64,
    rng: &mut R,
) -> Result<bool, EngineError> {
    let category = *current_category(state, catalog)?;
    let before = state.target;
    assign_next_target(state, ctx, &category, now, rng)?;
    Ok(state.target != before)
}
