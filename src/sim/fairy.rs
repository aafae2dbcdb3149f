//! Fairy transformation
//!
//! A tapped worm turns into a fairy that morphs in place, flies off along a
//! quadratic Bezier arc toward one screen edge, and leaves a fading trail.
//! Everything random is decided at creation; afterwards every query is a
//! pure function of the fairy's age.

use glam::Vec2;
use rand::Rng;
use serde::Serialize;

use super::state::Lane;
use crate::ease_out_cubic;

/// Morph in place (ms)
pub const MORPH_MS: u64 = 3_000;
/// Flight along the arc (ms)
pub const FLY_MS: u64 = 2_000;
/// Trail fade after the fairy has left (ms)
pub const TRAIL_FADE_MS: u64 = 5_000;
/// Total lifetime; consumers discard fairies older than this
pub const LIFETIME_MS: u64 = MORPH_MS + FLY_MS + TRAIL_FADE_MS;

/// How far past the edge the fairy flies (percent)
const EDGE_OVERSHOOT: f32 = 10.0;
/// Maximum sideways bend of the flight arc (percent)
const MAX_BEND: f32 = 30.0;
/// Sparkle jitter radius (percent)
const SPARKLE_RADIUS: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FairyPhase {
    Morphing,
    Flying,
    TrailFading,
    Expired,
}

/// Screen edge the fairy flies toward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EdgeTarget {
    Top,
    Bottom,
    Left,
    Right,
}

impl EdgeTarget {
    pub const ALL: [EdgeTarget; 4] = [
        EdgeTarget::Top,
        EdgeTarget::Bottom,
        EdgeTarget::Left,
        EdgeTarget::Right,
    ];

    /// Exit point for a flight starting at `start` (percent space)
    pub fn exit_point(self, start: Vec2) -> Vec2 {
        match self {
            EdgeTarget::Top => Vec2::new(start.x, -EDGE_OVERSHOOT),
            EdgeTarget::Bottom => Vec2::new(start.x, 100.0 + EDGE_OVERSHOOT),
            EdgeTarget::Left => Vec2::new(-EDGE_OVERSHOOT, start.y),
            EdgeTarget::Right => Vec2::new(100.0 + EDGE_OVERSHOOT, start.y),
        }
    }
}

/// Point on a quadratic Bezier curve
pub fn quadratic_bezier(p0: Vec2, p1: Vec2, p2: Vec2, t: f32) -> Vec2 {
    let u = 1.0 - t;
    p0 * (u * u) + p1 * (2.0 * u * t) + p2 * (t * t)
}

/// A fairy spawned from a tapped worm
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FairyTransform {
    pub id: u32,
    /// Worm position at the tap (percent)
    pub start: Vec2,
    pub created_at: u64,
    pub lane: Lane,
    pub edge: EdgeTarget,
    /// Bezier control point
    pub control: Vec2,
    /// Bezier end point (just past the edge)
    pub end: Vec2,
    /// Seed for cosmetic sparkle jitter
    pub sparkle_seed: u32,
}

impl FairyTransform {
    /// Create a fairy, rolling its edge, arc bend and sparkle seed once
    pub fn new<R: Rng + ?Sized>(
        id: u32,
        start: Vec2,
        created_at: u64,
        lane: Lane,
        rng: &mut R,
    ) -> Self {
        let edge = EdgeTarget::ALL[rng.random_range(0..EdgeTarget::ALL.len())];
        let bend = rng.random_range(-MAX_BEND..MAX_BEND);
        let sparkle_seed = rng.random();
        Self::from_seeds(id, start, created_at, lane, edge, bend, sparkle_seed)
    }

    /// Build a fairy from explicit seed values
    pub fn from_seeds(
        id: u32,
        start: Vec2,
        created_at: u64,
        lane: Lane,
        edge: EdgeTarget,
        bend: f32,
        sparkle_seed: u32,
    ) -> Self {
        let end = edge.exit_point(start);
        let chord = end - start;
        let normal = Vec2::new(-chord.y, chord.x).normalize_or_zero();
        let control = (start + end) * 0.5 + normal * bend;
        Self {
            id,
            start,
            created_at,
            lane,
            edge,
            control,
            end,
            sparkle_seed,
        }
    }

    pub fn age(&self, now: u64) -> u64 {
        now.saturating_sub(self.created_at)
    }

    pub fn phase(&self, now: u64) -> FairyPhase {
        match self.age(now) {
            age if age < MORPH_MS => FairyPhase::Morphing,
            age if age < MORPH_MS + FLY_MS => FairyPhase::Flying,
            age if age < LIFETIME_MS => FairyPhase::TrailFading,
            _ => FairyPhase::Expired,
        }
    }

    pub fn is_expired(&self, now: u64) -> bool {
        self.phase(now) == FairyPhase::Expired
    }

    /// Worm-to-fairy morph, 0..=1
    pub fn morph_progress(&self, now: u64) -> f32 {
        (self.age(now) as f32 / MORPH_MS as f32).min(1.0)
    }

    /// Eased flight progress along the arc, 0..=1
    pub fn flight_progress(&self, now: u64) -> f32 {
        let flown = self.age(now).saturating_sub(MORPH_MS);
        ease_out_cubic(flown as f32 / FLY_MS as f32)
    }

    /// Fairy body position (percent space)
    pub fn position(&self, now: u64) -> Vec2 {
        match self.phase(now) {
            FairyPhase::Morphing => self.start,
            FairyPhase::Flying => {
                quadratic_bezier(self.start, self.control, self.end, self.flight_progress(now))
            }
            FairyPhase::TrailFading | FairyPhase::Expired => self.end,
        }
    }

    /// Opacity of the flight trail
    pub fn trail_opacity(&self, now: u64) -> f32 {
        match self.phase(now) {
            FairyPhase::Morphing => 0.0,
            FairyPhase::Flying => 1.0,
            FairyPhase::TrailFading => {
                let faded = self.age(now) - MORPH_MS - FLY_MS;
                1.0 - faded as f32 / TRAIL_FADE_MS as f32
            }
            FairyPhase::Expired => 0.0,
        }
    }

    /// Cosmetic sparkle offset for sparkle `index`; deterministic in age
    pub fn sparkle_jitter(&self, now: u64, index: u32) -> Vec2 {
        let frame = (self.age(now) / 50) as u32;
        let hash = self
            .sparkle_seed
            .wrapping_mul(2654435761)
            .wrapping_add(index.wrapping_mul(31337))
            .wrapping_add(frame.wrapping_mul(7919));
        let rand1 = (hash % 1000) as f32 / 1000.0;
        let rand2 = ((hash >> 10) % 1000) as f32 / 1000.0;
        Vec2::new(rand1 - 0.5, rand2 - 0.5) * (2.0 * SPARKLE_RADIUS)
    }
}
