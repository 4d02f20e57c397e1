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

//! smcfan - closed-loop fan control for Apple SMC machines
//!
//! Reads die temperatures from the `applesmc` sysfs driver, maps the hottest
//! readings onto a small set of speed steps and writes the resulting minimum
//! fan speeds back, with a two-tick debounce so sensor jitter never reaches
//! the fans. The fans are returned to firmware control on every exit path
//! that runs code.

pub mod actuators;
pub mod aggregate;
pub mod cli;
pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod hysteresis;
pub mod lifecycle;
pub mod logging;
pub mod sensors;
pub mod supervisor;
pub mod transfer;

#[cfg(test)]
pub mod test_utils;

pub use config::Calibration;
pub use controller::{Controller, ExitReason, SleepOutcome, Sleeper};
pub use error::{Result, SmcFanError};
