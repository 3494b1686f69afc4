//! World configuration
//!
//! Every field has a serde default, so a config file only needs to name what it
//! changes. `WorldConfig::default()` reproduces the stock arena: an 800x600
//! area with the field centered on the player start.

use crate::{Color, Error, Result};
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Complete configuration for a [`World`](crate::World)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub field: FieldConfig,
    pub player: PlayerConfig,
    pub projectile: ProjectileConfig,
    pub timers: TimerGrid,
    pub rewind: RewindConfig,
    /// Units per second the field center moves under a drift intent
    pub field_drift_speed: f64,
    /// Timeline colors, indexed by `timeline id % len`
    pub palette: Vec<Color>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            field: FieldConfig::default(),
            player: PlayerConfig::default(),
            projectile: ProjectileConfig::default(),
            timers: TimerGrid::default(),
            rewind: RewindConfig::default(),
            field_drift_speed: 200.0,
            palette: default_palette(),
        }
    }
}

impl WorldConfig {
    /// Check that every tunable is usable
    pub fn validate(&self) -> Result<()> {
        positive("field.max_radius", self.field.max_radius)?;
        positive("field.exponent", self.field.exponent)?;
        if !(self.field.min_factor > 0.0 && self.field.min_factor <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "field.min_factor must be in (0, 1], got {}",
                self.field.min_factor
            )));
        }
        positive("player.move_speed", self.player.move_speed)?;
        positive("player.projectile_speed", self.player.projectile_speed)?;
        non_negative("player.shoot_cooldown", self.player.shoot_cooldown)?;
        non_negative("player.shot_delay", self.player.shot_delay)?;
        positive("projectile.max_lifetime", self.projectile.max_lifetime)?;
        positive("projectile.bake_step", self.projectile.bake_step)?;
        non_negative("field_drift_speed", self.field_drift_speed)?;
        if self.rewind.max_charges == 0 {
            return Err(Error::InvalidConfig(
                "rewind.max_charges must be at least 1".to_string(),
            ));
        }
        if self.palette.is_empty() {
            return Err(Error::InvalidConfig("palette must not be empty".to_string()));
        }
        if self.timers.columns.checked_mul(self.timers.rows).is_none() {
            return Err(Error::InvalidConfig(format!(
                "timers grid {}x{} is too large",
                self.timers.columns, self.timers.rows
            )));
        }
        Ok(())
    }

    /// Color assigned to a timeline
    pub fn timeline_color(&self, timeline: crate::TimelineId) -> Color {
        if self.palette.is_empty() {
            return Color::GHOST;
        }
        self.palette[(timeline.raw() % self.palette.len() as u64) as usize]
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!("{} must be positive, got {}", name, value)))
    }
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "{} must not be negative, got {}",
            name, value
        )))
    }
}

/// The seven timeline colors
pub fn default_palette() -> Vec<Color> {
    vec![
        Color::new(255, 80, 80),
        Color::new(60, 190, 255),
        Color::new(80, 255, 80),
        Color::new(255, 255, 80),
        Color::new(200, 80, 255),
        Color::new(255, 170, 60),
        Color::new(60, 255, 190),
    ]
}

/// Initial time-dilation field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub center: DVec2,
    pub max_radius: f64,
    pub exponent: f64,
    /// Floor applied to the factor so local time never stops
    pub min_factor: f64,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            center: DVec2::new(400.0, 300.0),
            max_radius: 500.0,
            exponent: 2.3,
            min_factor: crate::field::DEFAULT_MIN_FACTOR,
        }
    }
}

/// The controlled actor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub start: DVec2,
    pub move_speed: f64,
    /// Minimum local time between two shots
    pub shoot_cooldown: f64,
    pub projectile_speed: f64,
    /// How far after the current local time a shot is scheduled
    pub shot_delay: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            start: DVec2::new(400.0, 300.0),
            move_speed: 170.0,
            shoot_cooldown: 0.15,
            projectile_speed: 250.0,
            shot_delay: 0.01,
        }
    }
}

/// Projectiles fired by the player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    pub max_lifetime: f64,
    /// Fixed step used to bake projectile paths
    pub bake_step: f64,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            max_lifetime: 1.4,
            bake_step: 0.05,
        }
    }
}

/// Layout of the timer entities
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerGrid {
    pub origin: DVec2,
    pub spacing: DVec2,
    pub columns: u32,
    pub rows: u32,
}

impl TimerGrid {
    /// Positions of every timer, column-major
    pub fn positions(&self) -> Vec<DVec2> {
        let mut positions = Vec::with_capacity(self.columns as usize * self.rows as usize);
        for column in 0..self.columns {
            for row in 0..self.rows {
                positions.push(
                    self.origin + DVec2::new(column as f64, row as f64) * self.spacing,
                );
            }
        }
        positions
    }
}

impl Default for TimerGrid {
    fn default() -> Self {
        Self {
            origin: DVec2::new(100.0, 100.0),
            spacing: DVec2::new(100.0, 100.0),
            columns: 7,
            rows: 5,
        }
    }
}

/// Rewind charge pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewindConfig {
    pub max_charges: u32,
}

impl Default for RewindConfig {
    fn default() -> Self {
        Self { max_charges: 3 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TimelineId;

    #[test]
    fn test_default_is_valid() {
        WorldConfig::default().validate().unwrap();
    }

    #[test]
    fn test_default_timer_grid() {
        let positions = TimerGrid::default().positions();
        assert_eq!(positions.len(), 35);
        assert_eq!(positions[0], DVec2::new(100.0, 100.0));
        assert_eq!(positions[34], DVec2::new(700.0, 500.0));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = WorldConfig::default();
        config.field.max_radius = 0.0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = WorldConfig::default();
        config.rewind.max_charges = 0;
        assert!(config.validate().is_err());

        let mut config = WorldConfig::default();
        config.palette.clear();
        assert!(config.validate().is_err());

        let mut config = WorldConfig::default();
        config.field.min_factor = 0.0;
        assert!(config.validate().is_err());

        let mut config = WorldConfig::default();
        config.projectile.bake_step = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = WorldConfig::default();
        config.timers.columns = u32::MAX;
        config.timers.rows = 2;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_timeline_color_wraps() {
        let config = WorldConfig::default();
        assert_eq!(config.timeline_color(TimelineId::new(1)), Color::new(60, 190, 255));
        assert_eq!(
            config.timeline_color(TimelineId::new(8)),
            config.timeline_color(TimelineId::new(1))
        );
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config: WorldConfig = ron::from_str("(rewind: (max_charges: 5))").unwrap();
        assert_eq!(config.rewind.max_charges, 5);
        assert_eq!(config.player, PlayerConfig::default());
    }
}
