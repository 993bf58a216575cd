//! Procedural obstacle spawning
//!
//! Each spawn produces one top/bottom pair sharing an id. The pair enters
//! fully off the right edge with a gap at a random height.

use rand::Rng;

use super::geometry::{Metrics, ScreenGeometry};
use super::state::{GameEvent, GameState, Obstacle, ObstacleKind};

/// Build a pair for the given gap position
pub fn obstacle_pair(id: u32, gap_top: f32, metrics: &Metrics) -> [Obstacle; 2] {
    let x = metrics.screen_width + metrics.obstacle_width;
    let gap_bottom = gap_top + metrics.gap_height;
    [
        Obstacle {
            id,
            kind: ObstacleKind::Top,
            x,
            y: 0.0,
            width: metrics.obstacle_width,
            height: gap_top,
        },
        Obstacle {
            id,
            kind: ObstacleKind::Bottom,
            x,
            y: gap_bottom,
            width: metrics.obstacle_width,
            height: metrics.ground_y - gap_bottom,
        },
    ]
}

/// Draw a gap position uniformly from `[padding, ground - gap - padding]`
pub fn roll_gap_top<R: Rng>(rng: &mut R, metrics: &Metrics) -> f32 {
    let min = metrics.gap_padding;
    let max = metrics.ground_y - metrics.gap_height - metrics.gap_padding;
    rng.random::<f32>() * (max - min) + min
}

/// Spawn a new pair into the state; no-op while geometry is unknown
pub fn spawn_pair(
    state: &mut GameState,
    geometry: &ScreenGeometry,
    metrics: &Metrics,
) -> Option<GameEvent> {
    if !geometry.is_known() {
        return None;
    }

    let gap_top = roll_gap_top(state.rng.rng(), metrics);
    let id = state.next_pair_id();
    state.obstacles.extend(obstacle_pair(id, gap_top, metrics));
    state.newest_pair = Some(id);

    log::debug!(
        "Spawned pair {}: gap {:.1}..{:.1}",
        id,
        gap_top,
        gap_top + metrics.gap_height
    );
    Some(GameEvent::Spawned { id, gap_top })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;
    use proptest::prelude::*;

    fn setup(width: f32, height: f32) -> (GameState, ScreenGeometry, Metrics) {
        let geometry = ScreenGeometry::new(width, height);
        let metrics = geometry.metrics(&Tuning::default());
        let mut state = GameState::new(42);
        state.reset(42, 0, &metrics);
        (state, geometry, metrics)
    }

    #[test]
    fn test_spawn_suppressed_without_geometry() {
        let (mut state, _, _) = setup(0.0, 0.0);
        let geometry = ScreenGeometry::new(800.0, 0.0);
        let metrics = geometry.metrics(&Tuning::default());
        assert!(spawn_pair(&mut state, &geometry, &metrics).is_none());
        assert!(state.obstacles.is_empty());
        assert_eq!(state.newest_pair, None);
    }

    #[test]
    fn test_spawn_enters_off_screen_right() {
        let (mut state, geometry, metrics) = setup(1000.0, 1000.0);
        let event = spawn_pair(&mut state, &geometry, &metrics);
        assert!(matches!(event, Some(GameEvent::Spawned { id: 0, .. })));
        assert_eq!(state.obstacles.len(), 2);
        for o in &state.obstacles {
            assert_eq!(o.x, 1000.0 + metrics.obstacle_width);
            assert_eq!(o.width, metrics.obstacle_width);
        }
    }

    #[test]
    fn test_ids_increment_per_pair() {
        let (mut state, geometry, metrics) = setup(1000.0, 1000.0);
        for _ in 0..3 {
            spawn_pair(&mut state, &geometry, &metrics);
        }
        let ids: Vec<u32> = state.obstacles.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![0, 0, 1, 1, 2, 2]);
        assert_eq!(state.newest_pair, Some(2));
    }

    #[test]
    fn test_same_seed_same_gaps() {
        let (mut a, geometry, metrics) = setup(1000.0, 1000.0);
        let (mut b, _, _) = setup(1000.0, 1000.0);
        for _ in 0..5 {
            assert_eq!(
                spawn_pair(&mut a, &geometry, &metrics),
                spawn_pair(&mut b, &geometry, &metrics)
            );
        }
    }

    proptest! {
        #[test]
        fn prop_pair_spans_cover_ground_minus_gap(
            width in 100.0f32..4000.0,
            height in 100.0f32..4000.0,
            seed in any::<u64>(),
        ) {
            let geometry = ScreenGeometry::new(width, height);
            let metrics = geometry.metrics(&Tuning::default());
            let mut state = GameState::new(seed);
            state.reset(seed, 0, &metrics);
            spawn_pair(&mut state, &geometry, &metrics);

            let top = state.obstacles.iter().find(|o| o.kind == ObstacleKind::Top).unwrap();
            let bottom = state.obstacles.iter().find(|o| o.kind == ObstacleKind::Bottom).unwrap();
            prop_assert_eq!(top.id, bottom.id);

            // Disjoint spans with the gap in between
            prop_assert_eq!(top.y, 0.0);
            prop_assert!(top.bottom() < bottom.y);
            let tol = 1e-3 * height;
            prop_assert!((bottom.bottom() - metrics.ground_y).abs() <= tol);
            prop_assert!((bottom.y - top.bottom() - metrics.gap_height).abs() <= tol);
            let covered = top.height + bottom.height;
            prop_assert!((covered - (metrics.ground_y - metrics.gap_height)).abs() <= tol);

            // Gap honours the padding on both sides
            prop_assert!(top.height >= metrics.gap_padding - tol);
            prop_assert!(bottom.height >= metrics.gap_padding - tol);
        }
    }
}
