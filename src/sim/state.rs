//! Game state and core simulation types
//!
//! Everything a session mutates per tick lives in [`GameState`]. The
//! session controller owns it; the presentation layer only ever sees a
//! cloned [`Snapshot`](crate::session::Snapshot).

use std::collections::BTreeSet;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::geometry::Metrics;

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// No run started yet
    #[default]
    Idle,
    /// Counting down before physics starts
    Countdown,
    /// Active gameplay
    Running,
    /// Run ended by a collision
    GameOver,
}

/// Which half of a pair an obstacle is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleKind {
    /// Hangs from the top of the screen down to the gap
    Top,
    /// Stands on the ground line up to the gap
    Bottom,
}

/// One rectangle of an obstacle pair (top-left origin)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Pair id, shared by the top and bottom piece of one spawn
    pub id: u32,
    pub kind: ObstacleKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Obstacle {
    /// Right edge
    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// A copy shifted horizontally by `dx`
    #[inline]
    pub fn shifted(&self, dx: f32) -> Self {
        Self {
            x: self.x + dx,
            ..*self
        }
    }

    /// Fully scrolled past the left edge
    #[inline]
    pub fn is_off_screen(&self) -> bool {
        self.right() <= 0.0
    }
}

/// The player's vertical motion (horizontal position is fixed by geometry)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub y: f32,
    pub velocity_y: f32,
}

/// Notable things that happened during a tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum GameEvent {
    /// A new obstacle pair entered at the right edge
    Spawned { id: u32, gap_top: f32 },
    /// A pair's trailing edge crossed the player column
    Scored { id: u32, score: u32 },
    /// The player touched an obstacle; the run is over
    Collided { id: u32 },
}

/// RNG state wrapper, reseeded on every reset
#[derive(Debug, Clone)]
pub struct RngState {
    pub seed: u64,
    rng: Pcg32,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }
}

/// Complete per-session state (deterministic given seed and inputs)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Obstacle RNG
    pub rng: RngState,
    pub phase: GamePhase,
    /// Seconds left before physics starts (0 while running)
    pub countdown: u32,
    /// Pairs passed this run
    pub score: u32,
    /// Sticky once the first run begins
    pub has_started: bool,
    pub player: Player,
    /// Active obstacles, two per pair
    pub obstacles: Vec<Obstacle>,
    /// Pair ids already credited to the score
    pub passed: BTreeSet<u32>,
    /// Physics ticks executed this run
    pub time_ticks: u64,
    /// Id of the most recently spawned pair
    pub newest_pair: Option<u32>,
    next_id: u32,
}

impl GameState {
    /// Create an idle state; nothing moves until [`GameState::reset`]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: RngState::new(seed),
            phase: GamePhase::Idle,
            countdown: 0,
            score: 0,
            has_started: false,
            player: Player::default(),
            obstacles: Vec::new(),
            passed: BTreeSet::new(),
            time_ticks: 0,
            newest_pair: None,
            next_id: 0,
        }
    }

    /// Begin a fresh run: clears score, obstacles, passed ids and id
    /// counter, rests the player on the ground line and arms the countdown.
    pub fn reset(&mut self, seed: u64, countdown: u32, metrics: &Metrics) {
        self.rng = RngState::new(seed);
        self.countdown = countdown;
        self.phase = if countdown > 0 {
            GamePhase::Countdown
        } else {
            GamePhase::Running
        };
        self.score = 0;
        self.has_started = true;
        self.player = Player {
            y: metrics.floor_y(),
            velocity_y: 0.0,
        };
        self.obstacles.clear();
        self.passed.clear();
        self.time_ticks = 0;
        self.newest_pair = None;
        self.next_id = 0;
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed
    }

    /// True from session start until game over (countdown included)
    pub fn is_running(&self) -> bool {
        matches!(self.phase, GamePhase::Countdown | GamePhase::Running)
    }

    /// Allocate the next pair id
    pub fn next_pair_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Both pieces of a pair, in storage order
    pub fn pair(&self, id: u32) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.iter().filter(move |o| o.id == id)
    }

    /// Leftmost x of the newest pair, or None when it is gone
    pub fn newest_pair_x(&self) -> Option<f32> {
        let id = self.newest_pair?;
        self.pair(id).map(|o| o.x).reduce(f32::min)
    }

    /// Step the countdown by one; enters Running when it reaches zero
    pub fn count_down(&mut self) {
        if self.phase != GamePhase::Countdown {
            return;
        }
        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown == 0 {
            self.phase = GamePhase::Running;
        }
    }

    /// End the run; obstacle and passed-id state stay as they are, an
    /// interrupted countdown is cleared
    pub fn game_over(&mut self) {
        self.phase = GamePhase::GameOver;
        self.countdown = 0;
    }
}
