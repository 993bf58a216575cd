//! Collision and pass-through scoring
//!
//! The player is a circle but is tested as its bounding square, which is
//! what the ground/ceiling clamp and the obstacle rectangles both assume.
//! Scoring groups obstacles by pair id, never by storage position.

use std::collections::BTreeSet;

use glam::Vec2;

use super::geometry::Metrics;
use super::state::{GameEvent, GameState, Obstacle};

/// Result of a collision check against the obstacle field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionResult {
    /// Pair id of the obstacle that was hit
    pub id: u32,
    /// Player center at the time of the hit
    pub point: Vec2,
}

/// Strict overlap between the player's bounding square and an obstacle.
/// Touching edges do not count.
#[inline]
pub fn player_overlaps(center: Vec2, radius: f32, o: &Obstacle) -> bool {
    center.x + radius > o.x
        && center.x - radius < o.right()
        && center.y + radius > o.y
        && center.y - radius < o.bottom()
}

/// First obstacle the player overlaps, in storage order
pub fn find_collision(state: &GameState, metrics: &Metrics) -> Option<CollisionResult> {
    let center = metrics.player_center(state.player.y);
    state
        .obstacles
        .iter()
        .find(|o| player_overlaps(center, metrics.player_radius, o))
        .map(|o| CollisionResult {
            id: o.id,
            point: center,
        })
}

/// Trailing (rightmost) edge of every pair currently on screen, by id
fn trailing_edges(obstacles: &[Obstacle]) -> Vec<(u32, f32)> {
    let ids: BTreeSet<u32> = obstacles.iter().map(|o| o.id).collect();
    ids.into_iter()
        .filter_map(|id| {
            obstacles
                .iter()
                .filter(|o| o.id == id)
                .map(Obstacle::right)
                .reduce(f32::max)
                .map(|edge| (id, edge))
        })
        .collect()
}

/// Credit every pair whose trailing edge is strictly left of the player
/// column and that has not been credited yet. Returns one event per point.
pub fn credit_passed_pairs(state: &mut GameState, metrics: &Metrics) -> Vec<GameEvent> {
    let mut events = Vec::new();
    for (id, edge) in trailing_edges(&state.obstacles) {
        if edge < metrics.player_x && state.passed.insert(id) {
            state.score += 1;
            log::debug!("Pair {} passed, score {}", id, state.score);
            events.push(GameEvent::Scored {
                id,
                score: state.score,
            });
        }
    }
    events
}
