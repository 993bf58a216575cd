//! Variable timestep simulation tick
//!
//! Advances the player, scrolls and spawns obstacles, then resolves
//! collisions and scoring. `dt` is measured wall-clock time between ticks,
//! so nothing here assumes a constant step.

use super::collision::{credit_passed_pairs, find_collision};
use super::geometry::ScreenGeometry;
use super::spawn::spawn_pair;
use super::state::{GameEvent, GamePhase, GameState};
use crate::tuning::Tuning;

/// Inputs for a single tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickInput {
    /// Smoothed loudness (dB)
    pub loudness: f32,
    /// Current screen size
    pub geometry: ScreenGeometry,
}

/// Push strength for a smoothed loudness, 0 at the threshold and 1 at
/// `threshold + loudness_range_db` and above
#[inline]
pub fn loudness_force(loudness: f32, tuning: &Tuning) -> f32 {
    ((loudness - tuning.jump_threshold_db) / tuning.loudness_range_db).clamp(0.0, 1.0)
}

/// Advance the game state by `dt` seconds
pub fn tick(state: &mut GameState, input: &TickInput, tuning: &Tuning, dt: f32) -> Vec<GameEvent> {
    let mut events = Vec::new();

    // Physics only runs once the countdown is over
    if state.phase != GamePhase::Running || state.countdown > 0 {
        return events;
    }

    let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
    let metrics = input.geometry.metrics(tuning);
    state.time_ticks += 1;

    // --- PLAYER ---
    let player = &mut state.player;
    if input.loudness > tuning.jump_threshold_db {
        let force = loudness_force(input.loudness, tuning);
        player.velocity_y += force * tuning.impulse_factor * dt;
    }
    player.velocity_y += tuning.gravity * dt;
    player.y += player.velocity_y * dt;

    let floor = metrics.floor_y();
    let ceiling = metrics.ceiling_y().min(floor);
    if player.y > floor {
        player.y = floor;
        if tuning.zero_velocity_on_clamp {
            player.velocity_y = 0.0;
        }
    } else if player.y < ceiling {
        player.y = ceiling;
        if tuning.zero_velocity_on_clamp {
            player.velocity_y = 0.0;
        }
    }

    // --- OBSTACLES ---
    let dx = -metrics.obstacle_speed * dt;
    for obstacle in state.obstacles.iter_mut() {
        *obstacle = obstacle.shifted(dx);
    }
    state.obstacles.retain(|o| !o.is_off_screen());

    let needs_spawn = match state.newest_pair_x() {
        None => true,
        Some(x) => x < metrics.spawn_trigger_x,
    };
    if needs_spawn {
        events.extend(spawn_pair(state, &input.geometry, &metrics));
    }

    // --- COLLISION ---
    if let Some(hit) = find_collision(state, &metrics) {
        log::info!(
            "Collision with pair {} at y={:.1}, final score {}",
            hit.id,
            hit.point.y,
            state.score
        );
        state.game_over();
        events.push(GameEvent::Collided { id: hit.id });
    }

    // --- SCORING ---
    events.extend(credit_passed_pairs(state, &metrics));

    events
}
