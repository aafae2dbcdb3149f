//! Deterministic session engine
//!
//! All gameplay logic lives here. Given the same seed, the same commands
//! and the same clock values, a session produces the same results:
//! - Time only comes in through command arguments
//! - Seeded RNG only
//! - No rendering or platform dependencies

pub mod catalog;
pub mod engagement;
pub mod fairness;
pub mod fairy;
pub mod motion;
pub mod placement;
pub mod scoring;
pub mod session;
pub mod spawn;
pub mod state;
pub mod timer;
pub mod worm;

pub use catalog::{Catalog, Category, VocabularyItem};
pub use engagement::{Difficulty, difficulty, streak_multiplier};
pub use fairness::FairnessTracker;
pub use fairy::{EdgeTarget, FairyPhase, FairyTransform};
pub use scoring::{Effect, TapOutcome};
pub use session::{Ports, Session, SessionSnapshot};
pub use spawn::SpawnOutcome;
pub use state::{GameObject, Lane, SessionContext, SessionPhase, SessionState};
pub use timer::{Scheduler, Task, TimerId};
pub use worm::WormObject;
