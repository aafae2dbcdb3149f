//! Engagement calculators
//!
//! Pure functions: streak to score multiplier, progress to difficulty.

use serde::Serialize;

use crate::consts::PROGRESS_MAX;
use crate::lerp;
use crate::tuning::Tuning;

/// Score multiplier for a streak
pub fn streak_multiplier(streak: u32) -> f32 {
    match streak {
        0..=2 => 1.0,
        3..=4 => 1.5,
        5..=9 => 2.0,
        _ => 3.0,
    }
}

/// Points awarded for a correct tap at a given streak
pub fn points_for(streak: u32) -> u64 {
    (crate::consts::BASE_POINTS as f32 * streak_multiplier(streak)).round() as u64
}

/// Difficulty derived from level progress
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Difficulty {
    /// px per second for newly spawned objects
    pub fall_speed: f32,
    /// Delay until the next regular spawn tick
    pub spawn_interval_ms: u64,
}

/// Map progress (0..=100) to fall speed and spawn cadence
pub fn difficulty(progress: u8, tuning: &Tuning) -> Difficulty {
    let t = f32::from(progress.min(PROGRESS_MAX)) / f32::from(PROGRESS_MAX);
    let fall_speed = lerp(
        tuning.base_fall_speed,
        tuning.base_fall_speed * tuning.max_fall_speed_scale,
        t,
    );
    let base = tuning.base_spawn_interval_ms as f32;
    let min = tuning.min_spawn_interval_ms.min(tuning.base_spawn_interval_ms) as f32;
    let spawn_interval_ms = lerp(base, min, t).round() as u64;
    Difficulty {
        fall_speed,
        spawn_interval_ms: spawn_interval_ms.max(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiplier_steps() {
        assert_eq!(streak_multiplier(0), 1.0);
        assert_eq!(streak_multiplier(2), 1.0);
        assert_eq!(streak_multiplier(3), 1.5);
        assert_eq!(streak_multiplier(5), 2.0);
        assert_eq!(streak_multiplier(10), 3.0);
        assert_eq!(streak_multiplier(u32::MAX), 3.0);
    }

    #[test]
    fn test_points_scale_with_streak() {
        assert_eq!(points_for(1), 10);
        assert_eq!(points_for(4), 15);
        assert_eq!(points_for(12), 30);
    }

    #[test]
    fn test_difficulty_endpoints() {
        let tuning = Tuning::default();
        let easy = difficulty(0, &tuning);
        let hard = difficulty(100, &tuning);
        assert_eq!(easy.fall_speed, tuning.base_fall_speed);
        assert_eq!(easy.spawn_interval_ms, tuning.base_spawn_interval_ms);
        assert!((hard.fall_speed - tuning.base_fall_speed * tuning.max_fall_speed_scale).abs() < 0.01);
        assert_eq!(hard.spawn_interval_ms, tuning.min_spawn_interval_ms);
    }

    #[test]
    fn test_difficulty_monotonic() {
        let tuning = Tuning::default();
        let mut last = difficulty(0, &tuning);
        for progress in (20..=100).step_by(20) {
            let next = difficulty(progress, &tuning);
            assert!(next.fall_speed >= last.fall_speed);
            assert!(next.spawn_interval_ms <= last.spawn_interval_ms);
            last = next;
        }
    }
}
