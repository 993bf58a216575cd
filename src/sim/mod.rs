//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Measured `dt` and smoothed loudness are the only inputs
//! - Seeded RNG only
//! - Pairs are grouped by id, never by position in storage
//! - No threads, clocks or platform dependencies

pub mod collision;
pub mod geometry;
pub mod spawn;
pub mod state;
pub mod tick;

pub use collision::{CollisionResult, credit_passed_pairs, find_collision, player_overlaps};
pub use geometry::{Metrics, ScreenGeometry};
pub use spawn::{obstacle_pair, spawn_pair};
pub use state::{GameEvent, GamePhase, GameState, Obstacle, ObstacleKind, Player};
pub use tick::{TickInput, loudness_force, tick};
