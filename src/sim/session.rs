//! Session controller
//!
//! Owns all session state and is the only thing the presentation layer
//! talks to. Every command and every timer task runs as one serialized
//! callback: it sees the last committed state, and on failure its changes
//! are rolled back, the error is reported, and the session keeps ticking.

use std::sync::Arc;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::catalog::{Catalog, Category};
use super::engagement::difficulty;
use super::fairy::FairyTransform;
use super::motion::{step_objects, step_worms};
use super::scoring::{Effect, apply_tap, assign_target, choose_target, rotate_target};
use super::spawn::spawn_tick;
use super::state::{GameObject, Lane, SessionContext, SessionPhase, SessionState};
use super::timer::{Fired, Scheduler, Task};
use super::worm::{WormObject, live_worm_count, tap_worm};
use crate::audio::{AudioPort, NullAudio, SoundEffect};
use crate::besttime::{BestTime, format_millis};
use crate::error::EngineError;
use crate::settings::Settings;
use crate::storage::{KeyValueStore, MemoryStore};
use crate::telemetry::{NullTelemetry, TelemetryEvent, TelemetrySink};
use crate::tuning::Tuning;

/// External collaborators
pub struct Ports {
    pub audio: Box<dyn AudioPort>,
    pub storage: Box<dyn KeyValueStore>,
    pub telemetry: Box<dyn TelemetrySink>,
}

impl Default for Ports {
    fn default() -> Self {
        Self {
            audio: Box::new(NullAudio),
            storage: Box::new(MemoryStore::new()),
            telemetry: Box::new(NullTelemetry),
        }
    }
}

/// Everything the presentation layer draws, in one serializable view
#[derive(Debug, Serialize)]
pub struct SessionSnapshot<'a> {
    pub state: &'a SessionState,
    /// Continuous-mode completions toward the next category
    pub laps_in_level: u32,
    pub objects: &'a [GameObject],
    pub worms: &'a [WormObject],
    pub fairies: &'a [FairyTransform],
}

/// State restored when a callback fails
struct Checkpoint {
    state: SessionState,
    ctx: SessionContext,
    objects: Vec<GameObject>,
    worms: Vec<WormObject>,
    fairies: Vec<FairyTransform>,
}

impl Checkpoint {
    fn take(session: &Session) -> Self {
        Self {
            state: session.state.clone(),
            ctx: session.ctx.clone(),
            objects: session.objects.clone(),
            worms: session.worms.clone(),
            fairies: session.fairies.clone(),
        }
    }

    fn restore(self, session: &mut Session) {
        session.state = self.state;
        session.ctx = self.ctx;
        session.objects = self.objects;
        session.worms = self.worms;
        session.fairies = self.fairies;
    }
}

pub struct Session {
    catalog: Arc<Catalog>,
    settings: Settings,
    tuning: Tuning,
    ports: Ports,
    rng: Pcg32,
    state: SessionState,
    ctx: SessionContext,
    objects: Vec<GameObject>,
    worms: Vec<WormObject>,
    fairies: Vec<FairyTransform>,
    scheduler: Scheduler,
    clock: u64,
}

impl Session {
    pub fn new(
        catalog: Arc<Catalog>,
        settings: Settings,
        tuning: Tuning,
        ports: Ports,
        seed: u64,
    ) -> Self {
        let best = BestTime::load(ports.storage.as_ref());
        let state = SessionState::new(settings.continuous_mode, best.millis);
        let ctx = SessionContext::new(tuning.rotation_threshold_ms);
        Self {
            catalog,
            settings,
            tuning,
            ports,
            rng: Pcg32::seed_from_u64(seed),
            state,
            ctx,
            objects: Vec::new(),
            worms: Vec::new(),
            fairies: Vec::new(),
            scheduler: Scheduler::new(),
            clock: 0,
        }
    }

    /// Create a session with settings read from the storage port
    pub fn load(catalog: Arc<Catalog>, tuning: Tuning, ports: Ports, seed: u64) -> Self {
        let settings = Settings::load(ports.storage.as_ref());
        Self::new(catalog, settings, tuning, ports, seed)
    }

    // === Read-only views ===

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn objects(&self) -> &[GameObject] {
        &self.objects
    }

    pub fn worms(&self) -> &[WormObject] {
        &self.worms
    }

    pub fn fairies(&self) -> &[FairyTransform] {
        &self.fairies
    }

    pub fn snapshot(&self) -> SessionSnapshot<'_> {
        SessionSnapshot {
            state: &self.state,
            laps_in_level: self.state.laps_in_level(),
            objects: &self.objects,
            worms: &self.worms,
            fairies: &self.fairies,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn current_category(&self) -> Option<&Category> {
        self.catalog.get(self.state.level_index)
    }

    pub fn worm_speed_factor(&self) -> f32 {
        self.ctx.worm_speed_factor
    }

    pub fn sequence_cursor(&self) -> usize {
        self.ctx.sequence_cursor
    }

    /// Pending timers of one kind
    pub fn pending_timers(&self, task: Task) -> usize {
        self.scheduler.pending(task)
    }

    /// All pending timers
    pub fn pending_timer_count(&self) -> usize {
        self.scheduler.len()
    }

    /// Last time the session observed (ms)
    pub fn clock(&self) -> u64 {
        self.clock
    }

    // === Commands ===

    /// Start (or restart) play at `level_index`
    pub fn start_game(&mut self, level_index: usize, now: u64) {
        let cancelled = self.scheduler.cancel_all();
        if cancelled > 0 {
            log::debug!("Cancelled {} pending timers before start", cancelled);
        }
        self.clock = now;

        if self.catalog.is_empty() {
            self.report("start", EngineError::InvariantViolation("empty catalog".into()));
            return;
        }
        let level = level_index % self.catalog.len();
        if level != level_index {
            log::warn!("Level {} out of range, using {}", level_index, level);
        }

        self.reinitialize();
        self.state.phase = SessionPhase::Playing;
        self.state.level_index = level;
        self.state.cycle_start_time = now;

        let Some(category) = self.catalog.get(level).copied() else {
            return;
        };
        match choose_target(&category, 0, None, &mut self.rng) {
            Some(target) => assign_target(&mut self.state, target, now),
            None => {
                self.state.phase = SessionPhase::Idle;
                self.report(
                    "start",
                    EngineError::InvariantViolation(format!("category '{}' is empty", category.name)),
                );
                return;
            }
        }

        self.arm_timers(now);
        log::info!(
            "Level {} ({}) started{}",
            level,
            category.name,
            if self.state.continuous { " in continuous mode" } else { "" }
        );
        self.record_state_change();
    }

    /// Stop play and clear the field. The best time survives.
    pub fn reset_game(&mut self, now: u64) {
        let cancelled = self.scheduler.cancel_all();
        self.clock = now;
        self.reinitialize();
        log::info!("Session reset ({} timers cancelled)", cancelled);
        self.record_state_change();
    }

    /// Player tapped a falling object
    pub fn handle_object_tap(&mut self, id: u32, side: Lane, now: u64) {
        self.clock = self.clock.max(now);
        self.guarded("object_tap", |s| s.tap_object(id, side, now));
    }

    /// Player tapped a worm
    pub fn handle_worm_tap(&mut self, id: u32, side: Lane, now: u64) {
        self.clock = self.clock.max(now);
        self.guarded("worm_tap", |s| s.kill_worm(id, side, now));
    }

    /// Pick a different target on request
    pub fn change_target_manually(&mut self, now: u64) {
        self.clock = self.clock.max(now);
        self.guarded("change_target", |s| s.rotate(now, "manual"));
    }

    /// Run every timer due at or before `now`, then rotate an expired target
    pub fn advance(&mut self, now: u64) {
        if now < self.clock {
            log::debug!("Clock moved backwards ({} < {}), ignoring", now, self.clock);
            return;
        }
        self.drain(now);
        if self.state.is_playing() && now >= self.state.target_deadline {
            self.guarded("deadline", |s| s.rotate(now, "deadline"));
            self.drain(now);
        }
        self.clock = now;
    }

    /// Reference motion: fall, cull, crawl. `dt` in seconds.
    pub fn step_motion(&mut self, dt: f32) {
        if !self.state.is_playing() {
            return;
        }
        let culled = step_objects(&mut self.objects, dt, self.tuning.viewport_height_px);
        if culled > 0 {
            log::trace!("Culled {} objects below the viewport", culled);
        }
        step_worms(&mut self.worms, self.ctx.worm_speed_factor, dt);
    }

    /// Drop fairies past their lifetime. Returns how many were removed.
    pub fn discard_expired_fairies(&mut self, now: u64) -> usize {
        let before = self.fairies.len();
        self.fairies.retain(|fairy| !fairy.is_expired(now));
        before - self.fairies.len()
    }

    /// Replace settings and persist them. Mode changes apply at next start.
    pub fn update_settings(&mut self, settings: Settings) {
        if let Err(err) = settings.save(self.ports.storage.as_mut()) {
            self.report("settings", err.into());
        }
        self.settings = settings;
    }

    // === Internals ===

    fn reinitialize(&mut self) {
        let best = self.state.best_time;
        self.state = SessionState::new(self.settings.continuous_mode, best);
        self.ctx = SessionContext::new(self.tuning.rotation_threshold_ms);
        self.objects.clear();
        self.worms.clear();
        self.fairies.clear();
    }

    fn arm_timers(&mut self, now: u64) {
        self.scheduler.schedule(now, 0, Task::ImmediateSpawn);
        self.scheduler.schedule(
            now,
            difficulty(0, &self.tuning).spawn_interval_ms,
            Task::SpawnTick,
        );
        self.scheduler
            .schedule_every(now, self.tuning.fairness_sweep_ms, Task::FairnessSweep);
        for i in 0..u64::from(self.tuning.initial_worm_count) {
            let delay = self.tuning.worm_first_delay_ms + i * self.tuning.worm_stagger_ms;
            self.scheduler.schedule(now, delay, Task::WormSpawn);
        }
        self.scheduler
            .schedule_every(now, self.tuning.worm_spawn_interval_ms, Task::WormInterval);
    }

    fn drain(&mut self, now: u64) {
        while let Some(fired) = self.scheduler.pop_due(now) {
            self.clock = fired.due;
            self.run_task(fired);
        }
    }

    fn run_task(&mut self, fired: Fired) {
        if !self.state.is_playing() {
            return;
        }
        let at = fired.due;
        match fired.task {
            Task::SpawnTick => {
                self.guarded("spawn_tick", |s| s.spawn(at));
                if self.state.is_playing() {
                    let interval = difficulty(self.state.progress, &self.tuning).spawn_interval_ms;
                    self.scheduler.schedule(at, interval, Task::SpawnTick);
                }
            }
            Task::ImmediateSpawn => self.guarded("immediate_spawn", |s| s.spawn(at)),
            Task::WormSpawn => self.guarded("worm_spawn", |s| s.spawn_worm(false)),
            Task::WormInterval => self.guarded("worm_interval", |s| s.spawn_worm(true)),
            Task::FairnessSweep => {
                self.ctx.fairness.invalidate();
                log::trace!("Fairness sweep at {}", at);
            }
        }
    }

    /// Run one callback; roll back and report if it fails
    fn guarded<F>(&mut self, label: &'static str, f: F)
    where
        F: FnOnce(&mut Self) -> Result<(), EngineError>,
    {
        let checkpoint = Checkpoint::take(self);
        if let Err(err) = f(self) {
            checkpoint.restore(self);
            self.report(label, err);
        }
    }

    fn report(&mut self, label: &str, err: EngineError) {
        match &err {
            EngineError::LookupMiss { .. } => {
                log::debug!("{}: {}", label, err);
                return;
            }
            EngineError::Storage(_) => log::warn!("{}: {}", label, err),
            _ => log::error!("{}: {}", label, err),
        }
        self.ports.telemetry.record(TelemetryEvent::Error {
            kind: err.kind(),
            message: format!("{}: {}", label, err),
        });
    }

    fn play(&mut self, effect: SoundEffect) {
        let volume = self.settings.effective_volume();
        if volume > 0.0 {
            self.ports.audio.play(effect, volume);
        }
    }

    fn record_state_change(&mut self) {
        self.ports.telemetry.record(TelemetryEvent::StateChange {
            level_index: self.state.level_index,
            progress: self.state.progress,
            streak: self.state.streak,
            lap_count: self.state.lap_count,
            winner: self.state.winner(),
        });
    }

    fn category(&self) -> Result<Category, EngineError> {
        self.catalog
            .get(self.state.level_index)
            .copied()
            .ok_or_else(|| {
                EngineError::InvariantViolation(format!(
                    "level {} has no category",
                    self.state.level_index
                ))
            })
    }

    fn spawn(&mut self, now: u64) -> Result<(), EngineError> {
        let category = self.category()?;
        let target = self
            .state
            .target
            .ok_or_else(|| EngineError::InvariantViolation("spawn tick without a target".into()))?;

        let outcome = spawn_tick(
            &mut self.objects,
            &mut self.ctx,
            &category,
            &target,
            self.state.progress,
            now,
            &self.tuning,
            &mut self.rng,
        )?;

        if outcome.overrun {
            self.ports.telemetry.record(TelemetryEvent::CapacityOverrun {
                pool_size: self.objects.len(),
                max: self.tuning.max_active_objects,
            });
        }
        if outcome.total() > 0 {
            log::debug!(
                "Spawned {} targets + {} decoys at {} (pool {})",
                outcome.targets,
                outcome.decoys,
                now,
                self.objects.len()
            );
            self.ports.telemetry.record(TelemetryEvent::SpawnBatch {
                targets: outcome.targets,
                decoys: outcome.decoys,
                pruned: outcome.pruned,
                pool_size: self.objects.len(),
                forced: outcome.forced,
            });
            for item in &outcome.spawned {
                self.ports
                    .telemetry
                    .record(TelemetryEvent::EmojiAppearance { emoji: item.emoji });
            }
        }
        Ok(())
    }

    fn spawn_worm(&mut self, periodic: bool) -> Result<(), EngineError> {
        if periodic {
            self.worms.retain(|w| w.alive);
        }
        if live_worm_count(&self.worms) >= self.tuning.max_worms {
            return Ok(());
        }
        let worm = WormObject::spawn(self.ctx.next_entity_id(), &self.tuning, &mut self.rng);
        log::debug!("Worm {} appeared at ({:.0}, {:.0})", worm.id, worm.pos.x, worm.pos.y);
        self.worms.push(worm);
        Ok(())
    }

    fn tap_object(&mut self, id: u32, side: Lane, now: u64) -> Result<(), EngineError> {
        let shake = self.settings.effective_screen_shake();
        let Some(outcome) = apply_tap(
            &mut self.state,
            &mut self.ctx,
            &mut self.objects,
            &self.catalog,
            id,
            now,
            shake,
            &mut self.rng,
        )?
        else {
            return Ok(());
        };

        log::debug!(
            "Tap {} on {} ({:?} lane): {}",
            id,
            outcome.item.name,
            side,
            if outcome.correct { "correct" } else { "miss" }
        );
        self.ports.telemetry.record(TelemetryEvent::Tap {
            correct: outcome.correct,
            latency_ms: outcome.latency_ms,
            lane: side,
        });
        self.dispatch(&outcome.effects, now);
        self.record_state_change();
        Ok(())
    }

    fn kill_worm(&mut self, id: u32, side: Lane, now: u64) -> Result<(), EngineError> {
        if !self.state.is_playing() {
            return Ok(());
        }
        match tap_worm(
            &mut self.worms,
            &mut self.ctx,
            id,
            side,
            now,
            &self.tuning,
            &mut self.rng,
        )? {
            Some(outcome) => {
                log::debug!(
                    "Worm {} became a fairy; {} left, speed x{:.2}",
                    id,
                    outcome.live_remaining,
                    outcome.speed_factor
                );
                self.fairies.push(outcome.fairy);
                self.play(SoundEffect::Worm);
                self.play(SoundEffect::Fairy);
            }
            None => log::debug!("Worm {} already transformed", id),
        }
        Ok(())
    }

    fn rotate(&mut self, now: u64, reason: &str) -> Result<(), EngineError> {
        if !self.state.is_playing() {
            return Ok(());
        }
        let changed = rotate_target(&mut self.state, &self.ctx, &self.catalog, now, &mut self.rng)?;
        if let Some(target) = self.state.target {
            log::debug!(
                "Target {} ({}): {}",
                if changed { "changed" } else { "refreshed" },
                reason,
                target.name
            );
        }
        self.scheduler.schedule(now, 0, Task::ImmediateSpawn);
        Ok(())
    }

    fn dispatch(&mut self, effects: &[Effect], now: u64) {
        for effect in effects {
            match *effect {
                Effect::Sound(sound) => self.play(sound),
                Effect::ImmediateSpawn => {
                    self.scheduler.schedule(now, 0, Task::ImmediateSpawn);
                }
                Effect::LevelWon => {
                    let cancelled = self.scheduler.cancel_all();
                    log::info!(
                        "Level {} won with score {} ({} timers stopped)",
                        self.state.level_index,
                        self.state.score,
                        cancelled
                    );
                }
                Effect::LevelAdvanced { from, to } => {
                    let name = self.catalog.get(to).map_or("?", |c| c.name);
                    log::info!("Level {} -> {} ({})", from, to, name);
                }
                Effect::NewBestTime(millis) => {
                    log::info!("New best cycle time: {}", format_millis(millis));
                    let best = BestTime {
                        millis: Some(millis),
                    };
                    if let Err(err) = best.save(self.ports.storage.as_mut()) {
                        self.report("best_time", err.into());
                    }
                }
            }
        }
    }
}
