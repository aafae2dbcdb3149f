//! Worm hazards
//!
//! Worms crawl around the play field independently of the falling objects.
//! Tapping a live worm kills it, releases a fairy, and makes the survivors
//! faster.

use glam::Vec2;
use rand::Rng;
use serde::Serialize;

use super::fairy::FairyTransform;
use super::state::{Lane, SessionContext};
use crate::consts::WORM_SPEED_ESCALATION;
use crate::error::EngineError;
use crate::tuning::Tuning;

/// Spawn margin from the screen edges (percent)
const SPAWN_MARGIN: f32 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WormObject {
    pub id: u32,
    /// Position in percent of the viewport
    pub pos: Vec2,
    /// Percent per second, before the session speed factor
    pub velocity: Vec2,
    pub alive: bool,
    /// Heading in radians
    pub angle: f32,
}

impl WormObject {
    /// Create a worm at a random spot with a random heading
    pub fn spawn<R: Rng + ?Sized>(id: u32, tuning: &Tuning, rng: &mut R) -> Self {
        let pos = Vec2::new(
            rng.random_range(SPAWN_MARGIN..100.0 - SPAWN_MARGIN),
            rng.random_range(SPAWN_MARGIN..100.0 - SPAWN_MARGIN),
        );
        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        let velocity = Vec2::new(angle.cos(), angle.sin()) * tuning.worm_base_speed;
        Self {
            id,
            pos,
            velocity,
            alive: true,
            angle,
        }
    }
}

/// Result of killing a worm
#[derive(Debug, Clone, PartialEq)]
pub struct WormTapOutcome {
    pub fairy: FairyTransform,
    /// Live worms left after this one died
    pub live_remaining: usize,
    /// Session speed factor after escalation
    pub speed_factor: f32,
}

pub fn live_worm_count(worms: &[WormObject]) -> usize {
    worms.iter().filter(|w| w.alive).count()
}

/// Kill worm `id`.
///
/// `Ok(None)` for a worm that is already dead (duplicate tap); `LookupMiss`
/// if no such worm exists. Escalates the shared speed factor by
/// 1.2 per surviving worm, compounding, saturating at
/// `tuning.max_worm_speed_factor`.
pub fn tap_worm<R: Rng + ?Sized>(
    worms: &mut [WormObject],
    ctx: &mut SessionContext,
    id: u32,
    lane: Lane,
    now: u64,
    tuning: &Tuning,
    rng: &mut R,
) -> Result<Option<WormTapOutcome>, EngineError> {
    let worm = worms
        .iter_mut()
        .find(|w| w.id == id)
        .ok_or(EngineError::LookupMiss { id })?;
    if !worm.alive {
        return Ok(None);
    }
    worm.alive = false;
    let start = worm.pos;

    let live_remaining = live_worm_count(worms);
    let escalated = ctx.worm_speed_factor * WORM_SPEED_ESCALATION.powi(live_remaining as i32);
    ctx.worm_speed_factor = escalated.min(tuning.max_worm_speed_factor);
    let fairy = FairyTransform::new(ctx.next_entity_id(), start, now, lane, rng);

    Ok(Some(WormTapOutcome {
        fairy,
        live_remaining,
        speed_factor: ctx.worm_speed_factor,
    }))
}
