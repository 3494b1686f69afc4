//! Clocks for frame-stepped simulation
//!
//! - `Frame` - Frame counter (one per `World::step`)
//! - `Direction` - Whether time currently runs forward or is being rewound
//! - `GlobalClock` - The world clock, floor-clamped at zero
//! - `LocalClock` - A per-entity clock scaled by the dilation factor

use serde::{Deserialize, Serialize};
use std::fmt;

/// A frame counter
pub type Frame = u64;

/// Direction in which clocks move this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Direction {
    #[default]
    Forward,
    Rewinding,
}

impl Direction {
    pub fn from_rewinding(rewinding: bool) -> Self {
        if rewinding {
            Direction::Rewinding
        } else {
            Direction::Forward
        }
    }

    pub fn is_rewinding(&self) -> bool {
        matches!(self, Direction::Rewinding)
    }

    /// Sign applied to elapsed real time
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Rewinding => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Rewinding => write!(f, "rewinding"),
        }
    }
}

/// World clock
///
/// Increases by `dt` each forward frame and decreases by `dt` while rewinding,
/// never dropping below zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalClock {
    /// Current global time in seconds
    pub time: f64,
    /// Frames stepped so far
    pub frame: Frame,
    /// Direction applied on the next advance
    pub direction: Direction,
    /// Direction used by the previous frame
    previous: Direction,
}

impl GlobalClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Step one frame of `dt` real seconds
    pub fn advance(&mut self, dt: f64) {
        self.time = (self.time + self.direction.sign() * dt).max(0.0);
        self.frame += 1;
    }

    /// Remember this frame's direction for the next frame's comparison
    pub fn end_frame(&mut self) {
        self.previous = self.direction;
    }

    pub fn is_rewinding(&self) -> bool {
        self.direction.is_rewinding()
    }

    /// Whether the previous frame was rewinding
    pub fn was_rewinding(&self) -> bool {
        self.previous.is_rewinding()
    }

    /// True on the first forward frame after a rewind
    pub fn rewind_just_ended(&self) -> bool {
        self.was_rewinding() && !self.is_rewinding()
    }
}

/// Per-entity clock
///
/// `advance` scales the frame delta by the dilation factor at the entity and
/// clamps the result at zero, so `time()` is never negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalClock {
    time: f64,
}

impl LocalClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one frame: `time += sign(direction) * dt * factor`, floored at 0
    ///
    /// Returns the signed delta actually applied.
    pub fn advance(&mut self, dt: f64, factor: f64, direction: Direction) -> f64 {
        let before = self.time;
        self.time = (self.time + direction.sign() * dt * factor).max(0.0);
        self.time - before
    }

    /// Pin the clock to `time` (used by replays driven by global time)
    pub fn set(&mut self, time: f64) {
        self.time = time.max(0.0);
    }

    pub fn time(&self) -> f64 {
        self.time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_global_clock_forward_and_back() {
        let mut clock = GlobalClock::new();
        clock.advance(0.5);
        clock.advance(0.5);
        assert_eq!(clock.time, 1.0);
        assert_eq!(clock.frame, 2);

        clock.direction = Direction::Rewinding;
        clock.advance(0.25);
        assert_eq!(clock.time, 0.75);
    }

    #[test]
    fn test_global_clock_floor() {
        let mut clock = GlobalClock::new();
        clock.advance(0.1);
        clock.direction = Direction::Rewinding;
        clock.advance(1.0);
        assert_eq!(clock.time, 0.0);
    }

    #[test]
    fn test_rewind_just_ended() {
        let mut clock = GlobalClock::new();
        assert!(!clock.rewind_just_ended());

        clock.direction = Direction::Rewinding;
        clock.end_frame();
        assert!(clock.was_rewinding());

        clock.direction = Direction::Forward;
        assert!(clock.rewind_just_ended());
        clock.end_frame();
        assert!(!clock.rewind_just_ended());
    }

    #[test]
    fn test_local_clock_dilation() {
        let mut clock = LocalClock::new();
        let delta = clock.advance(1.0, 0.5, Direction::Forward);
        assert_eq!(delta, 0.5);
        assert_eq!(clock.time(), 0.5);

        let delta = clock.advance(2.0, 0.5, Direction::Rewinding);
        assert_eq!(delta, -0.5);
        assert_eq!(clock.time(), 0.0);
    }

    #[test]
    fn test_direction() {
        assert!(Direction::from_rewinding(true).is_rewinding());
        assert_eq!(Direction::Forward.sign(), 1.0);
        assert_eq!(Direction::Rewinding.to_string(), "rewinding");
    }

    proptest! {
        #[test]
        fn prop_local_time_never_negative(
            steps in proptest::collection::vec((0.0f64..0.1, 0.001f64..1.0, any::<bool>()), 1..200)
        ) {
            let mut clock = LocalClock::new();
            for (dt, factor, rewinding) in steps {
                clock.advance(dt, factor, Direction::from_rewinding(rewinding));
                prop_assert!(clock.time() >= 0.0);
            }
        }
    }
}
