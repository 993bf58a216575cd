//! Screen geometry and the gameplay metrics derived from it
//!
//! The host may resize at any time, so nothing here is cached: every
//! metric is recomputed from the current width/height on each call.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;

/// Screen size in screen-space units (y grows downward)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenGeometry {
    pub width: f32,
    pub height: f32,
}

impl ScreenGeometry {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Geometry is unknown until the host reports a positive height
    #[inline]
    pub fn is_known(&self) -> bool {
        self.height > 0.0 && self.width > 0.0
    }

    /// Shorter screen side, the base unit for sizes and speeds
    #[inline]
    pub fn base_size(&self) -> f32 {
        self.width.min(self.height).max(0.0)
    }

    /// Derive all gameplay metrics for the current size
    pub fn metrics(&self, tuning: &Tuning) -> Metrics {
        let base = self.base_size();
        let height = self.height.max(0.0);
        let width = self.width.max(0.0);
        Metrics {
            ground_y: height * tuning.ground_ratio,
            player_radius: base * tuning.player_radius_ratio,
            max_jump_height: base * tuning.max_jump_ratio,
            obstacle_speed: base * tuning.obstacle_speed_ratio,
            obstacle_width: base * tuning.obstacle_width_ratio,
            player_x: width * tuning.player_x_ratio,
            gap_height: height * tuning.gap_ratio,
            gap_padding: height * tuning.gap_padding_ratio,
            spawn_trigger_x: width * tuning.spawn_trigger_ratio,
            screen_width: width,
        }
    }
}

/// Gameplay metrics for one screen size
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub ground_y: f32,
    pub player_radius: f32,
    pub max_jump_height: f32,
    pub obstacle_speed: f32,
    pub obstacle_width: f32,
    pub player_x: f32,
    pub gap_height: f32,
    pub gap_padding: f32,
    pub spawn_trigger_x: f32,
    pub screen_width: f32,
}

impl Metrics {
    /// Highest point the player may reach (smallest y)
    #[inline]
    pub fn ceiling_y(&self) -> f32 {
        self.ground_y - self.max_jump_height
    }

    /// Lowest point the player may reach (resting on the ground line)
    #[inline]
    pub fn floor_y(&self) -> f32 {
        self.ground_y - self.player_radius
    }

    /// Player center for a given vertical position
    #[inline]
    pub fn player_center(&self, player_y: f32) -> Vec2 {
        Vec2::new(self.player_x, player_y)
    }
}
