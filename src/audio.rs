//! Audio feedback port
//!
//! The engine only names what happened; hosts decide what it sounds like.
//! Every call is fire-and-forget.

use std::cell::RefCell;
use std::rc::Rc;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Correct object tapped
    Success,
    /// Wrong object tapped
    Miss,
    /// Level won (non-continuous mode)
    Win,
    /// Progress completed in continuous mode
    Lap,
    /// Continuous mode moved to the next category
    LevelUp,
    /// Worm tapped
    Worm,
    /// Fairy appeared
    Fairy,
}

impl SoundEffect {
    /// Semantic event name passed to hosts
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundEffect::Success => "success",
            SoundEffect::Miss => "miss",
            SoundEffect::Win => "win",
            SoundEffect::Lap => "lap",
            SoundEffect::LevelUp => "level-up",
            SoundEffect::Worm => "worm",
            SoundEffect::Fairy => "fairy",
        }
    }
}

/// Audio playback port
pub trait AudioPort {
    fn play(&mut self, effect: SoundEffect, volume: f32);
}

/// Silent audio (headless runs)
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioPort for NullAudio {
    fn play(&mut self, _effect: SoundEffect, _volume: f32) {}
}

/// Audio that only logs what it would play
#[derive(Debug, Default)]
pub struct LogAudio;

impl AudioPort for LogAudio {
    fn play(&mut self, effect: SoundEffect, volume: f32) {
        log::debug!("♪ {} ({:.2})", effect.as_str(), volume);
    }
}

/// Keeps every played effect. Clones share the same log, so a test can
/// hand one clone to a session and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingAudio {
    played: Rc<RefCell<Vec<SoundEffect>>>,
}

impl RecordingAudio {
    pub fn played(&self) -> Vec<SoundEffect> {
        self.played.borrow().clone()
    }

    pub fn contains(&self, effect: SoundEffect) -> bool {
        self.played.borrow().contains(&effect)
    }
}

impl AudioPort for RecordingAudio {
    fn play(&mut self, effect: SoundEffect, _volume: f32) {
        self.played.borrow_mut().push(effect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semantic_names() {
        assert_eq!(SoundEffect::Success.as_str(), "success");
        assert_eq!(SoundEffect::Miss.as_str(), "miss");
        assert_eq!(SoundEffect::LevelUp.as_str(), "level-up");
    }

    #[test]
    fn test_recording_clones_share_log() {
        let audio = RecordingAudio::default();
        let mut port: Box<dyn AudioPort> = Box::new(audio.clone());
        port.play(SoundEffect::Worm, 0.5);
        port.play(SoundEffect::Fairy, 0.5);
        assert_eq!(audio.played(), vec![SoundEffect::Worm, SoundEffect::Fairy]);
    }
}
