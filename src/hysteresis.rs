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

//! Debounce filter for the control loop
//!
//! The speed step is only re-evaluated after the temperature has moved in
//! the same direction on two consecutive ticks. A sensor jittering by one
//! degree back and forth never triggers a fan change; a real trend is acted
//! on within two poll periods.

use crate::constants::thermal::DEBOUNCE_RUN;
use crate::transfer::SpeedStep;

/// Loop memory carried from one tick to the next
///
/// Owned by the control loop driver and passed by `&mut` into each tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopState {
    pub previous_temperature: i32,
    pub previous_speed_step: SpeedStep,
    pub consecutive_colder: u32,
    pub consecutive_hotter: u32,
}

impl LoopState {
    /// State after the first reading
    ///
    /// Both counters start at 1, so the first move in either direction after
    /// startup is acted on immediately.
    pub fn new(temperature: i32, speed_step: SpeedStep) -> Self {
        Self {
            previous_temperature: temperature,
            previous_speed_step: speed_step,
            consecutive_colder: 1,
            consecutive_hotter: 1,
        }
    }

    /// Feed one aggregated temperature
    ///
    /// Returns the temperature to re-evaluate when the debounce run completes,
    /// `None` otherwise.
    pub fn observe(&mut self, t: i32) -> Option<i32> {
        if t < self.previous_temperature {
            self.consecutive_colder += 1;
            self.consecutive_hotter = 0;
        }
        if t > self.previous_temperature {
            self.consecutive_hotter += 1;
            self.consecutive_colder = 0;
        }
        self.previous_temperature = t;

        if self.consecutive_colder == DEBOUNCE_RUN || self.consecutive_hotter == DEBOUNCE_RUN {
            self.consecutive_colder = 0;
            self.consecutive_hotter = 0;
            Some(t)
        } else {
            None
        }
    }

    /// Record the step last written to the fans
    ///
    /// Returns `false` when `step` equals the previous one, in which case no
    /// write is needed.
    pub fn commit_step(&mut self, step: SpeedStep) -> bool {
        if step == self.previous_speed_step {
            return false;
        }
        self.previous_speed_step = step;
        true
    }
}
