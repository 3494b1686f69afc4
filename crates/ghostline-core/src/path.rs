//! Movement paths for deterministic position replay
//!
//! A path is a time-ordered list of `(time, position)` samples. Lookups between
//! two samples interpolate linearly; lookups outside the sampled range clamp to
//! the nearest endpoint.
//!
//! Projectile paths are baked once, at creation, with a fixed step so that a
//! replay queried at any time reproduces the same trajectory regardless of the
//! frame rate that produced it.

use crate::{Error, Result, TimeField};
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// One recorded position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathSample {
    pub time: f64,
    pub pos: DVec2,
}

impl PathSample {
    pub fn new(time: f64, pos: DVec2) -> Self {
        Self { time, pos }
    }
}

/// Append-only, strictly time-ordered sample sequence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovementPath {
    samples: Vec<PathSample>,
}

impl MovementPath {
    /// Create an empty path
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a path holding a single sample
    pub fn starting_at(time: f64, pos: DVec2) -> Self {
        Self {
            samples: vec![PathSample::new(time, pos)],
        }
    }

    /// Build a path from samples, sorting them by time
    ///
    /// Samples sharing a time collapse to the first one seen.
    pub fn from_samples(mut samples: Vec<PathSample>) -> Self {
        samples.sort_by(|a, b| a.time.total_cmp(&b.time));
        samples.dedup_by(|later, earlier| later.time == earlier.time);
        Self { samples }
    }

    /// Append a sample; `time` must be later than the last sample
    pub fn add_step(&mut self, time: f64, pos: DVec2) -> Result<()> {
        if let Some(last) = self.samples.last() {
            if time <= last.time {
                return Err(Error::NonMonotonicSample {
                    last: last.time,
                    time,
                });
            }
        }
        self.samples.push(PathSample::new(time, pos));
        Ok(())
    }

    /// Bake samples forward until `until_time` using a fixed `step`
    ///
    /// Starts from the last sample, or from `(0, start_pos)` on an empty path.
    /// Each step advances by `velocity * step * factor`, with the factor read
    /// at the position the step starts from.
    pub fn ensure_path(
        &mut self,
        until_time: f64,
        step: f64,
        start_pos: DVec2,
        velocity: DVec2,
        field: &TimeField,
    ) {
        if step <= 0.0 {
            return;
        }
        let (mut t, mut pos) = match self.samples.last() {
            Some(last) => (last.time, last.pos),
            None => (0.0, start_pos),
        };
        while t < until_time {
            t += step;
            let factor = field.factor(pos);
            pos += velocity * step * factor;
            self.samples.push(PathSample::new(t, pos));
        }
    }

    /// Position at `query_time`, or `None` on an empty path
    pub fn get_pos(&self, query_time: f64) -> Option<DVec2> {
        let first = self.samples.first()?;
        if query_time <= first.time {
            return Some(first.pos);
        }
        // First sample strictly after the query
        let idx = self.samples.partition_point(|s| s.time <= query_time);
        if idx == 0 {
            // NaN compares false against every sample
            return Some(first.pos);
        }
        if idx >= self.samples.len() {
            return self.samples.last().map(|s| s.pos);
        }
        let before = self.samples[idx - 1];
        let after = self.samples[idx];
        let alpha = interpolation_factor(before.time, after.time, query_time);
        Some(before.pos.lerp(after.pos, alpha))
    }

    /// Keep only samples at or before `time`
    pub fn truncate_after(&mut self, time: f64) {
        let keep = self.samples.partition_point(|s| s.time <= time);
        self.samples.truncate(keep);
    }

    /// Keep only samples strictly before `time`
    pub fn truncate_from(&mut self, time: f64) {
        let keep = self.samples.partition_point(|s| s.time < time);
        self.samples.truncate(keep);
    }

    /// Time span `[first, last]` covered by the samples
    pub fn window(&self) -> Option<(f64, f64)> {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => Some((first.time, last.time)),
            _ => None,
        }
    }

    pub fn samples(&self) -> &[PathSample] {
        &self.samples
    }

    pub fn last(&self) -> Option<&PathSample> {
        self.samples.last()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Fraction of the way from `before` to `after` that `target` lies, in `[0, 1]`
fn interpolation_factor(before: f64, after: f64, target: f64) -> f64 {
    if after <= before {
        return 0.0;
    }
    ((target - before) / (after - before)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn straight_path() -> MovementPath {
        let mut path = MovementPath::new();
        path.add_step(0.0, DVec2::new(0.0, 0.0)).unwrap();
        path.add_step(1.0, DVec2::new(10.0, 0.0)).unwrap();
        path.add_step(2.0, DVec2::new(10.0, 20.0)).unwrap();
        path
    }

    #[test]
    fn test_empty_path_is_unavailable() {
        assert_eq!(MovementPath::new().get_pos(1.0), None);
        assert_eq!(MovementPath::new().window(), None);
    }

    #[test]
    fn test_exact_sample_times() {
        let path = straight_path();
        assert_eq!(path.get_pos(0.0), Some(DVec2::new(0.0, 0.0)));
        assert_eq!(path.get_pos(1.0), Some(DVec2::new(10.0, 0.0)));
        assert_eq!(path.get_pos(2.0), Some(DVec2::new(10.0, 20.0)));
    }

    #[test]
    fn test_interpolates_between_samples() {
        let path = straight_path();
        assert_eq!(path.get_pos(0.5), Some(DVec2::new(5.0, 0.0)));
        assert_eq!(path.get_pos(1.25), Some(DVec2::new(10.0, 5.0)));
    }

    #[test]
    fn test_clamps_outside_range() {
        let path = straight_path();
        assert_eq!(path.get_pos(-3.0), Some(DVec2::new(0.0, 0.0)));
        assert_eq!(path.get_pos(99.0), Some(DVec2::new(10.0, 20.0)));
        assert_eq!(path.get_pos(f64::NAN), Some(DVec2::new(0.0, 0.0)));
    }

    #[test]
    fn test_add_step_rejects_non_monotonic() {
        let mut path = straight_path();
        let err = path.add_step(2.0, DVec2::ZERO).unwrap_err();
        assert_eq!(err, Error::NonMonotonicSample { last: 2.0, time: 2.0 });
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn test_truncate() {
        let mut path = straight_path();
        path.truncate_after(1.0);
        assert_eq!(path.window(), Some((0.0, 1.0)));

        let mut path = straight_path();
        path.truncate_from(1.0);
        assert_eq!(path.window(), Some((0.0, 0.0)));

        path.truncate_after(-1.0);
        assert!(path.is_empty());
    }

    #[test]
    fn test_from_samples_sorts() {
        let path = MovementPath::from_samples(vec![
            PathSample::new(2.0, DVec2::new(2.0, 0.0)),
            PathSample::new(1.0, DVec2::new(1.0, 0.0)),
        ]);
        assert_eq!(path.window(), Some((1.0, 2.0)));
    }

    #[test]
    fn test_ensure_path_uniform_field() {
        // A field large enough to be ~1.0 near its center
        let field = TimeField::new(DVec2::ZERO, 1.0e9, 1.0);
        let mut path = MovementPath::new();
        path.ensure_path(1.0, 0.25, DVec2::ZERO, DVec2::new(100.0, 0.0), &field);

        assert_eq!(path.len(), 4);
        assert_eq!(path.last().unwrap().time, 1.0);
        let end = path.get_pos(1.0).unwrap();
        assert!((end.x - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_ensure_path_slows_away_from_center() {
        let field = TimeField::new(DVec2::new(400.0, 300.0), 500.0, 2.3);
        let mut path = MovementPath::new();
        path.ensure_path(1.4, 0.05, DVec2::new(400.0, 300.0), DVec2::new(250.0, 0.0), &field);

        let samples = path.samples();
        let mut last_dx = f64::INFINITY;
        for pair in samples.windows(2) {
            let dx = pair[1].pos.x - pair[0].pos.x;
            assert!(dx > 0.0);
            assert!(dx <= last_dx);
            last_dx = dx;
        }
    }

    #[test]
    fn test_ensure_path_extends_existing() {
        let field = TimeField::new(DVec2::ZERO, 1.0e9, 1.0);
        let mut path = MovementPath::starting_at(0.0, DVec2::new(5.0, 5.0));
        path.ensure_path(0.5, 0.5, DVec2::ZERO, DVec2::new(0.0, 10.0), &field);
        assert_eq!(path.len(), 2);
        assert!((path.get_pos(0.5).unwrap().y - 10.0).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_queries_stay_within_bounds(t in -10.0f64..10.0) {
            let path = straight_path();
            let pos = path.get_pos(t).unwrap();
            prop_assert!(pos.x >= 0.0 && pos.x <= 10.0);
            prop_assert!(pos.y >= 0.0 && pos.y <= 20.0);
        }
    }
}
