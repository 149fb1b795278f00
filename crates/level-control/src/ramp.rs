//! Fixed-point level ramp
//!
//! Levels are tracked internally with three implied decimal digits
//! (`192_456` is level 192.456) so that slow ramps accumulate fractional
//! steps instead of stalling.

use crate::cluster::{clamp_level, MAX_LEVEL};
use std::time::Duration;

/// Fixed-point scale of the accumulator and rates
pub const FIXED_POINT_SCALE: u32 = 1000;

/// Period between two ticks of a running ramp
pub const TICK_PERIOD: Duration = Duration::from_millis(100);

/// Ticks in one second at [`TICK_PERIOD`]
pub const TICKS_PER_SECOND: u32 = 10;

/// Fixed-point units per tick for a rate of one level per second
pub const RATE_PER_SECOND_TO_TICK: u32 = FIXED_POINT_SCALE / TICKS_PER_SECOND;

/// Rate numerator for a full-range (0..255) traversal, in fixed-point units
pub const FULL_RANGE: u32 = 255 * FIXED_POINT_SCALE;

/// Direction a ramp is moving in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Up,
    Down,
}

/// Ramp parameters shared by the rate- and time-driven entry points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ramp {
    /// Level reached when the ramp completes
    pub target_level: u8,
    /// Ticks left; 0 means idle
    pub remaining_ticks: u32,
    /// Fixed-point units per tick
    pub rate: u32,
    /// Fixed-point position of the light
    pub accumulator: u32,
    pub direction: Direction,
}

impl Ramp {
    /// A settled ramp sitting at `level`
    #[must_use]
    pub fn idle(level: u8) -> Self {
        Self {
            target_level: level,
            remaining_ticks: 0,
            rate: 0,
            accumulator: u32::from(level) * FIXED_POINT_SCALE,
            direction: Direction::default(),
        }
    }

    /// Start a ramp from `current` to `target` at `rate` units per tick
    ///
    /// The tick count is the fixed-point distance divided by the rate, but
    /// never less than one so a ramp always makes progress.
    #[must_use]
    pub fn from_rate(current: u8, target: u8, rate: u32) -> Self {
        let (mut ramp, diff) = Self::towards(current, target);
        ramp.rate = rate;
        ramp.remaining_ticks = diff.checked_div(rate).unwrap_or(0).max(1);
        ramp
    }

    /// Start a ramp from `current` to `target` lasting `ticks` ticks
    ///
    /// The rate is truncated; the last tick snaps to the target anyway.
    #[must_use]
    pub fn from_ticks(current: u8, target: u8, ticks: u16) -> Self {
        let ticks = u32::from(ticks.max(1));
        let (mut ramp, diff) = Self::towards(current, target);
        ramp.rate = diff / ticks;
        ramp.remaining_ticks = ticks;
        ramp
    }

    fn towards(current: u8, target: u8) -> (Self, u32) {
        let current = clamp_level(current);
        let target = clamp_level(target);
        let start = u32::from(current) * FIXED_POINT_SCALE;
        let end = u32::from(target) * FIXED_POINT_SCALE;

        let direction = if current > target {
            Direction::Down
        } else {
            Direction::Up
        };

        let ramp = Self {
            target_level: target,
            remaining_ticks: 0,
            rate: 0,
            accumulator: start,
            direction,
        };
        (ramp, start.abs_diff(end))
    }

    /// Whether ticks are still outstanding
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.remaining_ticks > 0
    }

    /// Consume one tick and return the integer level to show
    ///
    /// The final tick returns `target_level` exactly, discarding any
    /// truncation error collected in the accumulator.
    pub fn tick(&mut self) -> u8 {
        self.remaining_ticks = self.remaining_ticks.saturating_sub(1);

        if self.remaining_ticks == 0 {
            self.accumulator = u32::from(self.target_level) * FIXED_POINT_SCALE;
            return self.target_level;
        }

        self.accumulator = match self.direction {
            Direction::Up => self.accumulator.saturating_add(self.rate),
            Direction::Down => self.accumulator.saturating_sub(self.rate),
        };
        let level = (self.accumulator / FIXED_POINT_SCALE).min(u32::from(MAX_LEVEL));
        clamp_level(u8::try_from(level).unwrap_or(MAX_LEVEL))
    }
}
