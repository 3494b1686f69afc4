//! Time-dilation field
//!
//! Maps a position to the rate at which time passes there. The factor is `1.0`
//! at the field center and falls off towards `max_radius`:
//!
//! ```text
//! factor(p) = max((1 - min(|p - center| / max_radius, 1))^exponent, min_factor)
//! ```
//!
//! Live clocks and baked movement paths must read the same field, otherwise
//! ghosts replay a trajectory that never happened.

use crate::config::FieldConfig;
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Smallest factor the field ever returns, so local time never freezes
pub const DEFAULT_MIN_FACTOR: f64 = 0.001;

/// A radial time-dilation field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeField {
    center: DVec2,
    max_radius: f64,
    exponent: f64,
    min_factor: f64,
}

/// Dilation factor sampled at the center of one grid cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSample {
    pub center: DVec2,
    pub factor: f64,
}

impl TimeField {
    /// Create a field with the default floor factor
    pub fn new(center: DVec2, max_radius: f64, exponent: f64) -> Self {
        Self {
            center,
            max_radius,
            exponent,
            min_factor: DEFAULT_MIN_FACTOR,
        }
    }

    /// Build the field described by a config section
    pub fn from_config(config: &FieldConfig) -> Self {
        Self {
            center: config.center,
            max_radius: config.max_radius,
            exponent: config.exponent,
            min_factor: config.min_factor,
        }
    }

    /// Dilation factor at `pos`, always in `(0, 1]`
    pub fn factor(&self, pos: DVec2) -> f64 {
        let dist = pos.distance(self.center);
        let t = (dist / self.max_radius).min(1.0);
        (1.0 - t).powf(self.exponent).clamp(self.min_factor, 1.0)
    }

    /// Sample the field over a `width` x `height` area in square cells
    ///
    /// Returns samples row by row, each taken at its cell center.
    pub fn sample_grid(&self, width: f64, height: f64, cell: f64) -> Vec<FieldSample> {
        if cell <= 0.0 || width <= 0.0 || height <= 0.0 {
            return Vec::new();
        }
        let columns = (width / cell).ceil() as usize;
        let rows = (height / cell).ceil() as usize;
        let mut samples = Vec::with_capacity(columns * rows);
        for row in 0..rows {
            for column in 0..columns {
                let center = DVec2::new(
                    (column as f64 + 0.5) * cell,
                    (row as f64 + 0.5) * cell,
                );
                samples.push(FieldSample {
                    center,
                    factor: self.factor(center),
                });
            }
        }
        samples
    }

    pub fn center(&self) -> DVec2 {
        self.center
    }

    pub fn max_radius(&self) -> f64 {
        self.max_radius
    }

    pub fn exponent(&self) -> f64 {
        self.exponent
    }

    pub fn min_factor(&self) -> f64 {
        self.min_factor
    }

    /// Move the field center (not recorded as a command)
    pub fn set_center(&mut self, center: DVec2) {
        self.center = center;
    }

    /// Shift the field center by `delta`
    pub fn translate(&mut self, delta: DVec2) {
        self.center += delta;
    }

    /// Resize the field; non-positive radii are ignored
    pub fn set_max_radius(&mut self, max_radius: f64) {
        if max_radius > 0.0 {
            self.max_radius = max_radius;
        }
    }
}

impl Default for TimeField {
    fn default() -> Self {
        Self::from_config(&FieldConfig::default())
    }
}
