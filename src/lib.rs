//! Emoji Fall - session engine for a two-lane matching game
//!
//! Core modules:
//! - `sim`: Deterministic session engine (spawning, scoring, worms, fairies)
//! - `audio`: Fire-and-forget audio feedback port
//! - `storage`: Key-value persistence port
//! - `besttime`: Continuous-mode best completion time
//! - `settings`: Player preferences
//! - `tuning`: Data-driven game balance
//! - `telemetry`: Observational event stream

pub mod audio;
pub mod besttime;
pub mod error;
pub mod settings;
pub mod sim;
pub mod storage;
pub mod telemetry;
pub mod tuning;

pub use besttime::BestTime;
pub use error::{EngineError, StorageError};
pub use settings::Settings;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Hard ceiling for falling objects on screen (soft cap, see spawn scheduler)
    pub const MAX_ACTIVE_OBJECTS: usize = 30;
    /// Objects spawned per regular spawn tick
    pub const SPAWN_COUNT: usize = 8;
    /// Target objects kept on screen when slots allow
    pub const TARGET_GUARANTEE_COUNT: usize = 2;
    /// Decoy slots the pruner never eats into
    pub const MIN_DECOY_SLOTS: usize = 3;

    /// A target must spawn at least this often (ms)
    pub const TARGET_STARVATION_MS: u64 = 6_000;
    /// Time the player has to find a target before it rotates (ms)
    pub const TARGET_DEADLINE_MS: u64 = 10_000;

    /// Progress gained per correct tap, lost per miss
    pub const PROGRESS_STEP: u8 = 20;
    /// Progress at which a level (or lap) completes
    pub const PROGRESS_MAX: u8 = 100;

    /// Screen shake duration after a miss (ms)
    pub const SHAKE_DURATION_MS: u64 = 500;

    /// Completions per level in continuous mode
    pub const LAPS_PER_LEVEL: u32 = 5;

    /// Items unseen for longer than this are considered stale (ms)
    pub const ROTATION_THRESHOLD_MS: u64 = 10_000;
    /// Chance to reject a decoy already visible on screen
    pub const VISIBLE_DUPLICATE_REJECT_CHANCE: f64 = 0.7;

    /// Worm speed escalation per live worm when one is tapped
    pub const WORM_SPEED_ESCALATION: f32 = 1.2;

    /// Base points for a correct tap (scaled by streak multiplier)
    pub const BASE_POINTS: u32 = 10;
}

/// Cubic ease-out over [0, 1]
#[inline]
pub fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
