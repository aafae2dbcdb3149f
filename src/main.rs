//! Emoji Fall headless demo
//!
//! Runs one session against a simple autoplayer and logs what happens.

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::sync::Arc;

    use emoji_fall::audio::LogAudio;
    use emoji_fall::besttime::format_millis;
    use emoji_fall::sim::{Catalog, Lane, Ports, Session};
    use emoji_fall::storage::MemoryStore;
    use emoji_fall::telemetry::LogTelemetry;
    use emoji_fall::{Settings, Tuning};
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    /// Frame length at 60 Hz (ms)
    const FRAME_MS: u64 = 16;
    /// The autoplayer considers a tap this often (ms)
    const TAP_EVERY_MS: u64 = 450;
    /// Chance the autoplayer picks the right object
    const ACCURACY: f64 = 0.85;
    /// Chance the autoplayer goes after a worm instead
    const WORM_CHANCE: f64 = 0.1;

    /// Headless Emoji Fall session with a simple autoplayer.
    #[derive(clap::Parser, Debug)]
    #[command(name = "emoji-fall", version, about)]
    pub struct Cli {
        /// Category to start at
        #[arg(default_value_t = 0)]
        pub level: usize,

        /// Loop back to the first category after the last one
        #[arg(long)]
        pub continuous: bool,

        /// Seed for the session and the autoplayer
        #[arg(long, default_value_t = 42)]
        pub seed: u64,

        /// Simulated play time in seconds
        #[arg(long, default_value_t = 60)]
        pub seconds: u64,
    }

    /// Pick something to tap: usually the target, sometimes a miss or a worm
    fn autoplay(session: &mut Session, player: &mut Pcg32, now: u64) {
        if player.random_bool(WORM_CHANCE) {
            if let Some(worm) = session.worms().iter().find(|w| w.alive).cloned() {
                session.handle_worm_tap(worm.id, Lane::containing(worm.pos.x), now);
                return;
            }
        }

        let Some(target) = session.state().target else {
            return;
        };
        let visible: Vec<_> = session.objects().iter().filter(|o| o.y >= 0.0).collect();
        let pick = if player.random_bool(ACCURACY) {
            visible.iter().find(|o| o.item == target)
        } else {
            visible.iter().find(|o| o.item != target)
        };
        if let Some(obj) = pick {
            let (id, lane) = (obj.id, obj.lane);
            session.handle_object_tap(id, lane, now);
        }
    }

    pub fn run(opts: Cli) {
        let settings = Settings {
            continuous_mode: opts.continuous,
            ..Default::default()
        };
        let ports = Ports {
            audio: Box::new(LogAudio),
            storage: Box::new(MemoryStore::new()),
            telemetry: Box::new(LogTelemetry),
        };
        let mut session = Session::new(
            Arc::new(Catalog::builtin()),
            settings,
            Tuning::default(),
            ports,
            opts.seed,
        );
        let mut player = Pcg32::seed_from_u64(opts.seed.wrapping_add(1));

        session.start_game(opts.level, 0);
        let end = opts.seconds * 1_000;
        let mut now = 0;
        let mut next_tap = TAP_EVERY_MS;
        while now < end {
            now += FRAME_MS;
            session.step_motion(FRAME_MS as f32 / 1_000.0);
            session.advance(now);
            session.discard_expired_fairies(now);
            if now >= next_tap {
                autoplay(&mut session, &mut player, now);
                next_tap += TAP_EVERY_MS;
            }
            if session.state().winner() {
                break;
            }
        }

        let state = session.state();
        log::info!(
            "Finished after {}: level {}, progress {}, score {}, laps {}, winner {}",
            format_millis(now),
            state.level_index,
            state.progress,
            state.score,
            state.lap_count,
            state.winner()
        );
        if let Some(best) = state.best_time {
            log::info!("Best cycle: {}", format_millis(best));
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use clap::Parser;

    let cli = demo::Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Emoji Fall (headless) starting...");

    demo::run(cli);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Hosts embed the library directly
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::demo::Cli;
    use clap::Parser;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["emoji-fall"]).unwrap();
        assert_eq!(cli.level, 0);
        assert!(!cli.continuous);
        assert_eq!(cli.seed, 42);
        assert_eq!(cli.seconds, 60);
    }

    #[test]
    fn test_all_options() {
        let cli = Cli::try_parse_from([
            "emoji-fall",
            "3",
            "--continuous",
            "--seed",
            "7",
            "--seconds",
            "90",
        ])
        .unwrap();
        assert_eq!(cli.level, 3);
        assert!(cli.continuous);
        assert_eq!(cli.seed, 7);
        assert_eq!(cli.seconds, 90);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Cli::try_parse_from(["emoji-fall", "first"]).is_err());
        assert!(Cli::try_parse_from(["emoji-fall", "--seed"]).is_err());
        assert!(Cli::try_parse_from(["emoji-fall", "--seconds", "-5"]).is_err());
    }
}
