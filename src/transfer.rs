/*
 * This file is part of smcfan.
 *
 * Copyright (C) 2025 smcfan contributors
 *
 * smcfan is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * smcfan is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with smcfan. If not, see <https://www.gnu.org/licenses/>.
 */

//! Temperature to speed step mapping
//!
//! A straight line through `(t_low, 0)` and `(t_high, step_max)`, clamped at
//! both ends. Arithmetic is integer only, multiply before divide, truncating
//! toward zero. The calibration points were tuned against exactly this
//! rounding, so it must not be replaced by floating point.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Discrete control output in `[0, step_max]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeedStep(u32);

impl SpeedStep {
    pub const ZERO: SpeedStep = SpeedStep(0);

    pub fn new(step: u32) -> Self {
        Self(step)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SpeedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Calibrated linear transfer function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    t_low: i32,
    t_high: i32,
    step_max: u32,
}

impl Transfer {
    /// Callers guarantee `t_high > t_low` and `step_max > 0` (see
    /// `Calibration::validate`).
    pub fn new(t_low: i32, t_high: i32, step_max: u32) -> Self {
        debug_assert!(t_high > t_low);
        Self { t_low, t_high, step_max }
    }

    pub fn step_max(&self) -> u32 {
        self.step_max
    }

    /// Map a temperature in whole degrees to a speed step
    ///
    /// Widened to i128: an i32 offset times a u32 step count can exceed i64.
    pub fn temperature_to_step(&self, t: i32) -> SpeedStep {
        let span = i128::from(self.t_high) - i128::from(self.t_low);
        let raw = (i128::from(t) - i128::from(self.t_low)) * i128::from(self.step_max) / span;
        SpeedStep(raw.clamp(0, i128::from(self.step_max)) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> Transfer {
        Transfer::new(70, 80, 20)
    }

    #[test]
    fn test_reference_points() {
        let tf = reference();
        assert_eq!(tf.temperature_to_step(75), SpeedStep::new(10));
        assert_eq!(tf.temperature_to_step(65), SpeedStep::new(0));
        assert_eq!(tf.temperature_to_step(95), SpeedStep::new(20));
    }

    #[test]
    fn test_calibration_endpoints() {
        let tf = reference();
        assert_eq!(tf.temperature_to_step(70), SpeedStep::ZERO);
        assert_eq!(tf.temperature_to_step(80), SpeedStep::new(20));
    }

    #[test]
    fn test_monotonic_and_bounded() {
        let tf = reference();
        let mut last = SpeedStep::ZERO;
        for t in -50..=150 {
            let step = tf.temperature_to_step(t);
            assert!(step.get() <= tf.step_max(), "step {} out of range at {}", step, t);
            assert!(step >= last, "not monotonic at {}", t);
            last = step;
        }
    }

    #[test]
    fn test_multiply_before_divide() {
        // 3 steps over a 7 degree span: (t - 70) * 3 / 7
        let tf = Transfer::new(70, 77, 3);
        assert_eq!(tf.temperature_to_step(72).get(), 0); // 6 / 7
        assert_eq!(tf.temperature_to_step(73).get(), 1); // 9 / 7
        assert_eq!(tf.temperature_to_step(75).get(), 2); // 15 / 7
        assert_eq!(tf.temperature_to_step(77).get(), 3);
    }

    #[test]
    fn test_just_below_low_truncates_to_zero() {
        // (69 - 70) * 20 / 10 = -2, clamped
        assert_eq!(reference().temperature_to_step(69), SpeedStep::ZERO);
        // (70 - 71) * 1 / 3 truncates toward zero before the clamp
        assert_eq!(Transfer::new(71, 74, 1).temperature_to_step(70), SpeedStep::ZERO);
    }

    #[test]
    fn test_widest_calibration_does_not_overflow() {
        let tf = Transfer::new(i32::MIN, i32::MAX, u32::MAX);
        // (70 + 2^31) * (2^32 - 1) / (2^32 - 1)
        assert_eq!(tf.temperature_to_step(70).get(), 2_147_483_718);
        assert_eq!(tf.temperature_to_step(i32::MIN), SpeedStep::ZERO);
        assert_eq!(tf.temperature_to_step(i32::MAX).get(), u32::MAX);
    }

    #[test]
    fn test_extreme_temperatures_saturate() {
        let tf = reference();
        assert_eq!(tf.temperature_to_step(i32::MIN), SpeedStep::ZERO);
        assert_eq!(tf.temperature_to_step(i32::MAX), SpeedStep::new(20));
    }
}
