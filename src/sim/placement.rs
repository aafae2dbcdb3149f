//! Safe position placement
//!
//! New objects start above the viewport at a random spot in their lane.
//! A spot too close to an existing object in the same lane gets nudged
//! further up and re-rolled horizontally, a bounded number of times.

use glam::Vec2;
use rand::Rng;

use super::state::Lane;
use crate::tuning::{LaneBounds, Tuning};

/// Result of a placement search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// x in percent of viewport width, y in px
    pub pos: Vec2,
    /// False when every attempt was blocked and the last candidate was kept
    pub clear: bool,
}

pub fn lane_bounds(lane: Lane, tuning: &Tuning) -> LaneBounds {
    match lane {
        Lane::Left => tuning.left_lane,
        Lane::Right => tuning.right_lane,
    }
}

fn sample_x<R: Rng + ?Sized>(bounds: LaneBounds, rng: &mut R) -> f32 {
    if bounds.max_x > bounds.min_x {
        rng.random_range(bounds.min_x..bounds.max_x)
    } else {
        bounds.min_x
    }
}

/// Random starting point for the `index`-th object of a batch
pub fn sample_candidate<R: Rng + ?Sized>(
    lane: Lane,
    index: usize,
    size: f32,
    tuning: &Tuning,
    rng: &mut R,
) -> Vec2 {
    let x = sample_x(lane_bounds(lane, tuning), rng);
    let jitter = if tuning.stagger_jitter_px > 0.0 {
        rng.random_range(0.0..tuning.stagger_jitter_px)
    } else {
        0.0
    };
    let y = -size - index as f32 * tuning.stagger_px - jitter;
    Vec2::new(x, y)
}

/// Distance in px between two positions (x in percent, y in px)
pub fn separation(a: Vec2, b: Vec2, viewport_width_px: f32) -> f32 {
    let dx = (a.x - b.x) / 100.0 * viewport_width_px;
    Vec2::new(dx, a.y - b.y).length()
}

fn is_clear(candidate: Vec2, existing: &[Vec2], tuning: &Tuning) -> bool {
    existing
        .iter()
        .all(|&other| separation(candidate, other, tuning.viewport_width_px) >= tuning.min_separation_px)
}

/// Nudge `candidate` away from `existing` (positions in the same lane).
/// Gives up after `tuning.placement_attempts` nudges and keeps the last spot.
pub fn find_safe_position<R: Rng + ?Sized>(
    candidate: Vec2,
    lane: Lane,
    existing: &[Vec2],
    tuning: &Tuning,
    rng: &mut R,
) -> Placement {
    let bounds = lane_bounds(lane, tuning);
    let mut pos = candidate;

    for _ in 0..tuning.placement_attempts {
        if is_clear(pos, existing, tuning) {
            return Placement { pos, clear: true };
        }
        pos.y -= tuning.min_separation_px;
        pos.x = sample_x(bounds, rng);
    }

    let clear = is_clear(pos, existing, tuning);
    if !clear {
        log::debug!(
            "No clear spot in {:?} lane after {} attempts, keeping ({:.1}, {:.1})",
            lane,
            tuning.placement_attempts,
            pos.x,
            pos.y
        );
    }
    Placement { pos, clear }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_clear_candidate_is_kept() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(1);
        let candidate = Vec2::new(20.0, -100.0);
        let placement = find_safe_position(candidate, Lane::Left, &[], &tuning, &mut rng);
        assert!(placement.clear);
        assert_eq!(placement.pos, candidate);
    }

    #[test]
    fn test_blocked_candidate_moves_up_and_stays_in_lane() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(2);
        let candidate = Vec2::new(20.0, -100.0);
        let existing = [candidate];
        let placement = find_safe_position(candidate, Lane::Left, &existing, &tuning, &mut rng);
        assert!(placement.clear);
        assert!(placement.pos.y < candidate.y);
        assert!(placement.pos.x >= tuning.left_lane.min_x);
        assert!(placement.pos.x < tuning.left_lane.max_x);
        assert!(separation(placement.pos, candidate, tuning.viewport_width_px) >= tuning.min_separation_px);
    }

    #[test]
    fn test_gives_up_after_bounded_attempts() {
        let tuning = Tuning {
            placement_attempts: 3,
            ..Default::default()
        };
        let mut rng = Pcg32::seed_from_u64(3);
        let candidate = Vec2::new(20.0, 0.0);
        // A wall of objects covering every nudge the search can reach
        let existing: Vec<Vec2> = (0..40)
            .flat_map(|row| {
                (0..8).map(move |col| Vec2::new(8.0 + col as f32 * 5.0, -(row as f32) * 30.0))
            })
            .collect();
        let placement = find_safe_position(candidate, Lane::Left, &existing, &tuning, &mut rng);
        assert!(!placement.clear);
        assert!((placement.pos.y - (-3.0 * tuning.min_separation_px)).abs() < 0.001);
    }

    #[test]
    fn test_candidate_starts_above_viewport() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(4);
        for index in 0..5 {
            let pos = sample_candidate(Lane::Right, index, 80.0, &tuning, &mut rng);
            assert!(pos.y <= -80.0 - index as f32 * tuning.stagger_px);
            assert!(pos.x >= tuning.right_lane.min_x && pos.x < tuning.right_lane.max_x);
        }
    }
}
