//! Data-driven game balance
//!
//! Everything here can be overridden from JSON; missing fields keep their
//! defaults.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Horizontal bounds of a lane, in percent of viewport width
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaneBounds {
    pub min_x: f32,
    pub max_x: f32,
}

/// Balance knobs for spawning, placement, difficulty and worms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Pool ===
    pub max_active_objects: usize,
    pub spawn_count: usize,
    pub target_guarantee_count: usize,
    pub min_decoy_slots: usize,

    // === Fairness ===
    pub rotation_threshold_ms: u64,
    /// Chance a decoy is drawn from the stale set when one exists
    pub stale_bias: f64,
    pub fairness_sweep_ms: u64,

    // === Layout ===
    pub viewport_width_px: f32,
    pub viewport_height_px: f32,
    pub left_lane: LaneBounds,
    pub right_lane: LaneBounds,
    pub object_size_px: f32,
    pub object_size_jitter_px: f32,
    /// Vertical distance between objects of the same batch
    pub stagger_px: f32,
    pub stagger_jitter_px: f32,

    // === Placement ===
    pub min_separation_px: f32,
    pub placement_attempts: u32,

    // === Difficulty ===
    pub base_fall_speed: f32,
    pub max_fall_speed_scale: f32,
    pub base_spawn_interval_ms: u64,
    pub min_spawn_interval_ms: u64,

    // === Worms ===
    pub initial_worm_count: u32,
    pub worm_first_delay_ms: u64,
    pub worm_stagger_ms: u64,
    pub worm_spawn_interval_ms: u64,
    pub max_worms: usize,
    /// Base worm speed in percent of viewport per second
    pub worm_base_speed: f32,
    /// Ceiling for the compounding worm speed escalation
    pub max_worm_speed_factor: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            max_active_objects: MAX_ACTIVE_OBJECTS,
            spawn_count: SPAWN_COUNT,
            target_guarantee_count: TARGET_GUARANTEE_COUNT,
            min_decoy_slots: MIN_DECOY_SLOTS,

            rotation_threshold_ms: ROTATION_THRESHOLD_MS,
            stale_bias: 0.6,
            fairness_sweep_ms: 2_000,

            viewport_width_px: 1024.0,
            viewport_height_px: 768.0,
            left_lane: LaneBounds {
                min_x: 8.0,
                max_x: 42.0,
            },
            right_lane: LaneBounds {
                min_x: 58.0,
                max_x: 92.0,
            },
            object_size_px: 80.0,
            object_size_jitter_px: 12.0,
            stagger_px: 110.0,
            stagger_jitter_px: 60.0,

            min_separation_px: 90.0,
            placement_attempts: 6,

            base_fall_speed: 90.0,
            max_fall_speed_scale: 1.6,
            base_spawn_interval_ms: 2_000,
            min_spawn_interval_ms: 1_200,

            initial_worm_count: 3,
            worm_first_delay_ms: 3_000,
            worm_stagger_ms: 2_500,
            worm_spawn_interval_ms: 15_000,
            max_worms: 5,
            worm_base_speed: 6.0,
            max_worm_speed_factor: 8.0,
        }
    }
}

impl Tuning {
    /// Parse overrides from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Slots the pruner keeps free before a spawn
    pub fn required_slots(&self) -> usize {
        self.target_guarantee_count + self.min_decoy_slots
    }

    /// Pool size above which the pruner runs
    pub fn prune_threshold(&self) -> usize {
        self.max_active_objects.saturating_sub(self.required_slots())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_consts() {
        let tuning = Tuning::default();
        assert_eq!(tuning.max_active_objects, MAX_ACTIVE_OBJECTS);
        assert_eq!(tuning.prune_threshold(), 25);
    }

    #[test]
    fn test_partial_override() {
        let tuning = Tuning::from_json(r#"{"spawn_count": 4, "max_worms": 1}"#).unwrap();
        assert_eq!(tuning.spawn_count, 4);
        assert_eq!(tuning.max_worms, 1);
        assert_eq!(tuning.min_decoy_slots, MIN_DECOY_SLOTS);
    }

    #[test]
    fn test_lanes_do_not_overlap() {
        let tuning = Tuning::default();
        assert!(tuning.left_lane.max_x < tuning.right_lane.min_x);
    }
}
