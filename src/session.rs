//! Game session controller
//!
//! Owns the game state, the loudness smoother and the loudness source, and
//! runs two independent schedules through one entry point, [`Session::pump`]:
//! the 1 Hz countdown and the ~16 ms physics tick. Everything happens on
//! the caller's thread; the only cross-thread path is the loudness slot.
//!
//! ```text
//! Idle --start--> Countdown(3,2,1) --0--> Running --hit--> GameOver
//!   ^                                                         |
//!   +------------------------ start/reset --------------------+
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::error::SessionError;
use crate::loudness::{LoudnessReader, LoudnessSink, LoudnessSlot, LoudnessSource, Smoother};
use crate::sim::{GameEvent, GamePhase, GameState, Obstacle, ScreenGeometry, TickInput, tick};
use crate::tuning::Tuning;

/// Read-only view of a session, refreshed after every pump
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    pub countdown: u32,
    pub score: u32,
    pub running: bool,
    pub has_started: bool,
    pub player_x: f32,
    pub player_y: f32,
    pub player_radius: f32,
    pub ground_y: f32,
    pub smoothed_loudness: f32,
    pub obstacles: Vec<Obstacle>,
    pub screen_width: f32,
    pub screen_height: f32,
}

impl Snapshot {
    /// The host's game-over rule: started, countdown finished, no longer running
    pub fn is_game_over(&self) -> bool {
        self.has_started && self.countdown == 0 && !self.running
    }
}

/// Deadlines for the two periodic activities of a live run
#[derive(Debug, Clone, Copy)]
struct Schedule {
    last_tick: Instant,
    next_tick: Instant,
    next_countdown: Option<Instant>,
}

/// One player's game session
pub struct Session {
    tuning: Tuning,
    geometry: ScreenGeometry,
    state: GameState,
    smoother: Smoother,
    slot: Arc<LoudnessSlot>,
    reader: LoudnessReader,
    source: Box<dyn LoudnessSource>,
    schedule: Option<Schedule>,
    next_seed: u64,
}

impl Session {
    pub fn new(tuning: Tuning, source: Box<dyn LoudnessSource>) -> Self {
        Self::with_seed(tuning, source, crate::consts::DEFAULT_SEED)
    }

    /// Create a session whose first run uses `seed`
    pub fn with_seed(tuning: Tuning, source: Box<dyn LoudnessSource>, seed: u64) -> Self {
        let slot = Arc::new(LoudnessSlot::new());
        let reader = LoudnessReader::new(Arc::clone(&slot));
        Self {
            smoother: Smoother::new(tuning.smoothing_alpha, tuning.silence_floor_db),
            tuning,
            geometry: ScreenGeometry::default(),
            state: GameState::new(seed),
            slot,
            reader,
            source,
            schedule: None,
            next_seed: seed,
        }
    }

    /// Report the screen size; may be called at any time
    pub fn set_screen_size(&mut self, width: f32, height: f32) {
        self.geometry = ScreenGeometry::new(width, height);
        // Nothing has moved yet, so re-seat the player on the new ground line
        if matches!(self.state.phase, GamePhase::Idle | GamePhase::Countdown) {
            self.state.player.y = self.geometry.metrics(&self.tuning).floor_y();
            self.state.player.velocity_y = 0.0;
        }
    }

    /// Start a fresh run with the next seed in sequence
    pub fn start_game(&mut self, now: Instant) -> Result<(), SessionError> {
        let seed = self.next_seed;
        self.start_game_seeded(now, seed)
    }

    /// Start a fresh run with an explicit obstacle seed. Fails if the
    /// loudness source cannot be acquired; a run that was still live is
    /// then stopped, since it has lost its input.
    pub fn start_game_seeded(&mut self, now: Instant, seed: u64) -> Result<(), SessionError> {
        if let Err(e) = self.source.start(LoudnessSink::new(Arc::clone(&self.slot))) {
            log::warn!("Loudness source unavailable: {}", e);
            if self.state.is_running() {
                self.stop();
            }
            return Err(e.into());
        }

        let metrics = self.geometry.metrics(&self.tuning);
        self.state.reset(seed, self.tuning.countdown_secs, &metrics);
        self.smoother = Smoother::new(self.tuning.smoothing_alpha, self.tuning.silence_floor_db);
        self.reader.skip_pending();
        self.next_seed = next_seed(seed);

        let countdown_step = self.tuning.countdown_step();
        self.schedule = Some(Schedule {
            last_tick: now,
            next_tick: now + self.tuning.tick_interval(),
            next_countdown: (self.state.countdown > 0).then(|| now + countdown_step),
        });

        log::info!(
            "Session started (seed {}, countdown {}, screen {}x{})",
            self.state.seed(),
            self.state.countdown,
            self.geometry.width,
            self.geometry.height
        );
        Ok(())
    }

    /// Same as [`Session::start_game`]
    pub fn reset_game(&mut self, now: Instant) -> Result<(), SessionError> {
        self.start_game(now)
    }

    /// Tear down: halt both schedules and release the loudness source.
    /// A live run, countdown included, ends as if it had collided;
    /// obstacles stay as they are.
    pub fn stop(&mut self) {
        if self.state.is_running() {
            self.state.game_over();
            log::info!("Session stopped, score {}", self.state.score);
        }
        self.halt();
    }

    fn halt(&mut self) {
        self.schedule = None;
        self.source.stop();
    }

    /// Run whatever is due at `now`: drain loudness, step the countdown,
    /// and tick physics with the wall-clock time since the previous tick.
    pub fn pump(&mut self, now: Instant) -> Vec<GameEvent> {
        if let Some(db) = self.reader.take() {
            self.smoother.update(db);
        }

        let Some(schedule) = self.schedule.as_mut() else {
            return Vec::new();
        };

        let step = self.tuning.countdown_step();
        while let Some(at) = schedule.next_countdown {
            if now < at {
                break;
            }
            self.state.count_down();
            log::debug!("Countdown {}", self.state.countdown);
            schedule.next_countdown = (self.state.countdown > 0).then(|| at + step);
        }

        if now < schedule.next_tick {
            return Vec::new();
        }
        let dt = now.saturating_duration_since(schedule.last_tick).as_secs_f32();
        schedule.last_tick = now;
        schedule.next_tick = now + self.tuning.tick_interval();

        let input = TickInput {
            loudness: self.smoother.value(),
            geometry: self.geometry,
        };
        let events = tick(&mut self.state, &input, &self.tuning, dt);

        if self.state.phase == GamePhase::GameOver {
            log::info!("Game over, score {}", self.state.score);
            self.halt();
        }
        events
    }

    /// When the driver should call [`Session::pump`] next; None when idle
    pub fn next_deadline(&self) -> Option<Instant> {
        let schedule = self.schedule.as_ref()?;
        Some(match schedule.next_countdown {
            Some(at) => at.min(schedule.next_tick),
            None => schedule.next_tick,
        })
    }

    /// Time until the next deadline, zero if overdue
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.next_deadline()
            .map(|at| at.saturating_duration_since(now))
    }

    /// Producer handle for pushing raw readings from the host
    pub fn sink(&self) -> LoudnessSink {
        LoudnessSink::new(Arc::clone(&self.slot))
    }

    pub fn snapshot(&self) -> Snapshot {
        let metrics = self.geometry.metrics(&self.tuning);
        Snapshot {
            phase: self.state.phase,
            countdown: self.state.countdown,
            score: self.state.score,
            running: self.state.is_running(),
            has_started: self.state.has_started,
            player_x: metrics.player_x,
            player_y: self.state.player.y,
            player_radius: metrics.player_radius,
            ground_y: metrics.ground_y,
            smoothed_loudness: self.smoother.value(),
            obstacles: self.state.obstacles.clone(),
            screen_width: self.geometry.width,
            screen_height: self.geometry.height,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn smoothed_loudness(&self) -> f32 {
        self.smoother.value()
    }

    /// Whether the tick/countdown schedules are live
    pub fn is_scheduled(&self) -> bool {
        self.schedule.is_some()
    }

    pub fn source_active(&self) -> bool {
        self.source.is_active()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.source.stop();
    }
}

/// PCG-style LCG step for the seed of the following run
fn next_seed(seed: u64) -> u64 {
    seed.wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407)
}
