use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    BLINKY_RELEASE_PELLETS, CHASE_MS, CLYDE_RELEASE_PELLETS, FRIGHTEN_MS, INKY_RELEASE_PELLETS,
    LEVEL_CLEAR_PAUSE_MS, MAX_PHASE_CHANGES, PINKY_RELEASE_PELLETS, PLAYER_SPEED,
    PURSUER_EATEN_PAUSE_MS, PURSUER_EATEN_SPEED, PURSUER_FRIGHTENED_SPEED, PURSUER_SPEED,
    READY_DELAY_MS, SCATTER_MS, STARTING_LIVES, TICK_MS,
};
use crate::error::ConfigError;
use crate::types::PursuerKind;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub tick_ms: u32,
    pub starting_lives: i32,
    pub player_speed: f32,
    pub pursuer_speed: f32,
    pub frightened_speed: f32,
    pub eaten_speed: f32,
    pub scatter_ms: u32,
    pub chase_ms: u32,
    pub max_phase_changes: u32,
    pub frighten_ms: u32,
    pub ready_delay_ms: u32,
    pub pursuer_eaten_pause_ms: u32,
    pub level_clear_pause_ms: u32,
    pub blinky_release_pellets: u32,
    pub inky_release_pellets: u32,
    pub pinky_release_pellets: u32,
    pub clyde_release_pellets: u32,
    /// Player can never be caught.
    pub god_mode: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_ms: TICK_MS,
            starting_lives: STARTING_LIVES,
            player_speed: PLAYER_SPEED,
            pursuer_speed: PURSUER_SPEED,
            frightened_speed: PURSUER_FRIGHTENED_SPEED,
            eaten_speed: PURSUER_EATEN_SPEED,
            scatter_ms: SCATTER_MS,
            chase_ms: CHASE_MS,
            max_phase_changes: MAX_PHASE_CHANGES,
            frighten_ms: FRIGHTEN_MS,
            ready_delay_ms: READY_DELAY_MS,
            pursuer_eaten_pause_ms: PURSUER_EATEN_PAUSE_MS,
            level_clear_pause_ms: LEVEL_CLEAR_PAUSE_MS,
            blinky_release_pellets: BLINKY_RELEASE_PELLETS,
            inky_release_pellets: INKY_RELEASE_PELLETS,
            pinky_release_pellets: PINKY_RELEASE_PELLETS,
            clyde_release_pellets: CLYDE_RELEASE_PELLETS,
            god_mode: false,
        }
    }
}

impl SimConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_ms == 0 {
            return Err(invalid("tick_ms", "must be greater than zero"));
        }
        let speeds = [
            ("player_speed", self.player_speed),
            ("pursuer_speed", self.pursuer_speed),
            ("frightened_speed", self.frightened_speed),
            ("eaten_speed", self.eaten_speed),
        ];
        for (field, speed) in speeds {
            if !speed.is_finite() || speed <= 0.0 {
                return Err(invalid(field, format!("must be positive, got {speed}")));
            }
        }
        let timers = [
            ("scatter_ms", self.scatter_ms),
            ("chase_ms", self.chase_ms),
            ("frighten_ms", self.frighten_ms),
        ];
        for (field, ms) in timers {
            if ms == 0 {
                return Err(invalid(field, "must be greater than zero"));
            }
        }
        Ok(())
    }

    pub fn release_pellets(&self, kind: PursuerKind) -> u32 {
        match kind {
            PursuerKind::Blinky => self.blinky_release_pellets,
            PursuerKind::Inky => self.inky_release_pellets,
            PursuerKind::Pinky => self.pinky_release_pellets,
            PursuerKind::Clyde => self.clyde_release_pellets,
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config = SimConfig::from_json_str("{}").expect("defaults should parse");
        assert_eq!(config, SimConfig::default());
        assert_eq!(config.release_pellets(PursuerKind::Inky), 50);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = SimConfig::from_json_str(r#"{"god_mode": true, "frighten_ms": 5000}"#)
            .expect("partial config should parse");
        assert!(config.god_mode);
        assert_eq!(config.frighten_ms, 5_000);
        assert_eq!(config.scatter_ms, SCATTER_MS);
    }

    #[test]
    fn zero_tick_is_rejected() {
        let err = SimConfig::from_json_str(r#"{"tick_ms": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "tick_ms", .. }));
    }

    #[test]
    fn negative_speed_is_rejected() {
        let err = SimConfig::from_json_str(r#"{"eaten_speed": -0.1}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "eaten_speed", .. }));
    }

    #[test]
    fn malformed_json_reports_parse_error() {
        let err = SimConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }
}
