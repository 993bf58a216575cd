//! Gameplay tuning
//!
//! Every constant the simulation reads lives here so a run can be
//! reproduced (or rebalanced) from a JSON file. Geometry values are
//! ratios of the current screen size, never absolute pixels.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Gameplay constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Loudness ===
    /// Weight of a new reading in the moving average (0..=1)
    pub smoothing_alpha: f32,
    /// Level reported for silence and failed reads (dB)
    pub silence_floor_db: f32,
    /// Smoothed level above which the player gets pushed (dB)
    pub jump_threshold_db: f32,
    /// dB span above the threshold that maps to full push force
    pub loudness_range_db: f32,

    // === Physics ===
    /// Velocity gained per second at full loudness (px/s²)
    pub impulse_factor: f32,
    /// Constant vertical acceleration (px/s², +y points at the ground line)
    pub gravity: f32,
    /// Zero the vertical velocity when the player is clamped at a bound
    pub zero_velocity_on_clamp: bool,

    // === Geometry (ratios) ===
    /// Ground line, fraction of screen height
    pub ground_ratio: f32,
    /// Player radius, fraction of the shorter screen side
    pub player_radius_ratio: f32,
    /// Jump ceiling above the ground line, fraction of the shorter side
    pub max_jump_ratio: f32,
    /// Scroll speed per second, fraction of the shorter side
    pub obstacle_speed_ratio: f32,
    /// Obstacle width, fraction of the shorter side
    pub obstacle_width_ratio: f32,
    /// Player column, fraction of screen width
    pub player_x_ratio: f32,
    /// Gap height, fraction of screen height
    pub gap_ratio: f32,
    /// Minimum distance between a gap and the screen edges, fraction of height
    pub gap_padding_ratio: f32,
    /// A new pair spawns once the newest one is left of this fraction of width
    pub spawn_trigger_ratio: f32,

    // === Timing ===
    /// Physics tick cadence (ms)
    pub tick_interval_ms: u64,
    /// Countdown length in steps
    pub countdown_secs: u32,
    /// Duration of one countdown step (ms)
    pub countdown_step_ms: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            smoothing_alpha: 0.15,
            silence_floor_db: crate::consts::SILENCE_FLOOR_DB,
            jump_threshold_db: -15.0,
            loudness_range_db: 50.0,

            impulse_factor: 2200.0,
            gravity: -500.0,
            zero_velocity_on_clamp: true,

            ground_ratio: 0.82,
            player_radius_ratio: 0.05,
            max_jump_ratio: 0.15,
            obstacle_speed_ratio: 0.30,
            obstacle_width_ratio: 0.12,
            player_x_ratio: 0.15,
            gap_ratio: 0.35,
            gap_padding_ratio: 0.10,
            spawn_trigger_ratio: 0.6,

            tick_interval_ms: crate::consts::TICK_INTERVAL_MS,
            countdown_secs: crate::consts::COUNTDOWN_SECS,
            countdown_step_ms: 1000,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a file, falling back to defaults on any error
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path.display());
                tuning
            }
            Err(e) => {
                log::warn!("Using default tuning ({}): {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load tuning from a file
    pub fn try_load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Save tuning as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Reject values that would make the simulation produce NaN or stall
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            ("smoothing_alpha", self.smoothing_alpha),
            ("silence_floor_db", self.silence_floor_db),
            ("jump_threshold_db", self.jump_threshold_db),
            ("impulse_factor", self.impulse_factor),
            ("gravity", self.gravity),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(ConfigError::Invalid { field });
            }
        }

        if !(0.0..=1.0).contains(&self.smoothing_alpha) {
            return Err(ConfigError::Invalid { field: "smoothing_alpha" });
        }
        if !(self.loudness_range_db.is_finite() && self.loudness_range_db > 0.0) {
            return Err(ConfigError::Invalid { field: "loudness_range_db" });
        }

        let ratios = [
            ("ground_ratio", self.ground_ratio),
            ("player_radius_ratio", self.player_radius_ratio),
            ("max_jump_ratio", self.max_jump_ratio),
            ("obstacle_speed_ratio", self.obstacle_speed_ratio),
            ("obstacle_width_ratio", self.obstacle_width_ratio),
            ("player_x_ratio", self.player_x_ratio),
            ("gap_ratio", self.gap_ratio),
            ("gap_padding_ratio", self.gap_padding_ratio),
            ("spawn_trigger_ratio", self.spawn_trigger_ratio),
        ];
        for (field, value) in ratios {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid { field });
            }
        }

        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid { field: "tick_interval_ms" });
        }
        if self.countdown_step_ms == 0 {
            return Err(ConfigError::Invalid { field: "countdown_step_ms" });
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn countdown_step(&self) -> Duration {
        Duration::from_millis(self.countdown_step_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "gravity": 650.0, "countdown_secs": 5 }"#).unwrap();
        assert_eq!(tuning.gravity, 650.0);
        assert_eq!(tuning.countdown_secs, 5);
        assert_eq!(tuning.smoothing_alpha, 0.15);
        assert_eq!(tuning.tick_interval_ms, 16);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = Tuning::from_json(r#"{ "smoothing_alpha": 1.5 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "smoothing_alpha" }));

        let err = Tuning::from_json(r#"{ "tick_interval_ms": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "tick_interval_ms" }));

        let err = Tuning::from_json(r#"{ "gap_ratio": -0.2 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "gap_ratio" }));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = Tuning::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let path = std::env::temp_dir().join("voice_hop_tuning_does_not_exist.json");
        assert_eq!(Tuning::load(&path), Tuning::default());
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!("voice_hop_tuning_{}.json", std::process::id()));
        let tuning = Tuning {
            impulse_factor: 1800.0,
            ..Default::default()
        };
        tuning.save(&path).unwrap();
        assert_eq!(Tuning::try_load(&path).unwrap(), tuning);
        let _ = fs::remove_file(&path);
    }
}
