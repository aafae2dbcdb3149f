//! Session state and core entity types
//!
//! `SessionState` is the read-only snapshot the presentation layer renders.
//! `SessionContext` holds the session-scoped counters that callbacks share.

use serde::{Deserialize, Serialize};

use super::catalog::VocabularyItem;
use super::fairness::FairnessTracker;

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// No level started (or reset)
    Idle,
    /// Active gameplay
    Playing,
    /// Level won in non-continuous mode; frozen until reset
    Won,
}

/// One of the two horizontal regions objects fall through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lane {
    Left,
    Right,
}

impl Lane {
    pub const BOTH: [Lane; 2] = [Lane::Left, Lane::Right];

    /// Lane containing a horizontal position (percent of viewport width)
    pub fn containing(x_pct: f32) -> Self {
        if x_pct < 50.0 { Lane::Left } else { Lane::Right }
    }
}

/// A falling object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameObject {
    pub id: u32,
    pub item: VocabularyItem,
    pub lane: Lane,
    /// Horizontal position, percent of viewport width
    pub x: f32,
    /// Vertical position in px; negative is above the viewport
    pub y: f32,
    /// px per second
    pub fall_speed: f32,
    /// px
    pub size: f32,
}

impl GameObject {
    /// Check if this object shows the given item
    pub fn shows(&self, item: &VocabularyItem) -> bool {
        self.item.emoji == item.emoji
    }
}

/// Read-only session snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    pub phase: SessionPhase,
    /// Index of the current category in the catalog
    pub level_index: usize,
    /// Item currently sought
    pub target: Option<VocabularyItem>,
    /// Time (ms) at which the target rotates if not found
    pub target_deadline: u64,
    /// Time (ms) the current target was assigned (tap latency)
    pub target_assigned_at: u64,
    /// 0..=100
    pub progress: u8,
    /// Consecutive correct taps
    pub streak: u32,
    /// Score multiplier derived from the streak
    pub multiplier: f32,
    pub score: u64,
    /// Endless play enabled for this session
    pub continuous: bool,
    /// Completions in continuous mode
    pub lap_count: u32,
    /// Start of the current full pass through all categories (ms)
    pub cycle_start_time: u64,
    /// Best full-cycle time (ms)
    pub best_time: Option<u64>,
    /// Shake is visible until this time (ms); never set under reduced motion
    pub shake_until: Option<u64>,
}

impl SessionState {
    pub fn new(continuous: bool, best_time: Option<u64>) -> Self {
        Self {
            phase: SessionPhase::Idle,
            level_index: 0,
            target: None,
            target_deadline: 0,
            target_assigned_at: 0,
            progress: 0,
            streak: 0,
            multiplier: 1.0,
            score: 0,
            continuous,
            lap_count: 0,
            cycle_start_time: 0,
            best_time,
            shake_until: None,
        }
    }

    /// Level has been won (non-continuous mode)
    pub fn winner(&self) -> bool {
        self.phase == SessionPhase::Won
    }

    pub fn is_playing(&self) -> bool {
        self.phase == SessionPhase::Playing
    }

    /// Completions toward the next level in continuous mode
    pub fn laps_in_level(&self) -> u32 {
        self.lap_count % crate::consts::LAPS_PER_LEVEL
    }

    pub fn is_shaking(&self, now: u64) -> bool {
        self.shake_until.is_some_and(|until| now < until)
    }
}

/// Session-scoped counters shared by callbacks
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Compounding worm speed escalation
    pub worm_speed_factor: f32,
    /// Last time a target object spawned (None: never this level)
    pub last_target_spawn_at: Option<u64>,
    /// Position in a sequence category; only ever grows
    pub sequence_cursor: usize,
    pub fairness: FairnessTracker,
    next_id: u32,
}

impl SessionContext {
    pub fn new(rotation_threshold_ms: u64) -> Self {
        Self {
            worm_speed_factor: 1.0,
            last_target_spawn_at: None,
            sequence_cursor: 0,
            fairness: FairnessTracker::new(rotation_threshold_ms),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}
