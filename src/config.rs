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

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::actuators::FanSpec;
use crate::constants::{fans, paths, thermal, timing};
use crate::error::{Result, SmcFanError};
use crate::sensors::SensorId;
use crate::transfer::Transfer;

/// What the daemon does with `fanN_manual` when it starts
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum StartupMode {
    /// Take software control of every fan
    #[default]
    Manual,
    /// Leave the firmware in charge and only raise the `fanN_min` floors
    FirmwareFloor,
}

impl StartupMode {
    pub fn engages_manual(self) -> bool {
        matches!(self, StartupMode::Manual)
    }
}

/// Every calibration input of the control loop
///
/// Fixed for the lifetime of the process: built from the compiled-in
/// defaults plus command line overrides, validated once, never reloaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Calibration {
    /// Directory with the `fanN_min` / `fanN_manual` files
    pub smc_dir: PathBuf,
    /// Directory with the `tempN_input` files
    pub sensor_dir: PathBuf,
    pub sensors: Vec<SensorId>,
    pub fans: Vec<FanSpec>,
    /// °C mapped to speed step 0
    pub t_low: i32,
    /// °C mapped to `step_max`
    pub t_high: i32,
    pub step_max: u32,
    pub poll_interval_ms: u64,
    pub write_delay_ms: u64,
    #[serde(default)]
    pub startup_mode: StartupMode,
    pub pid_file: PathBuf,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            smc_dir: PathBuf::from(paths::SMC_DIR),
            sensor_dir: PathBuf::from(paths::SENSOR_DIR),
            sensors: thermal::SENSORS.iter().copied().map(SensorId).collect(),
            fans: fans::FANS
                .iter()
                .map(|&(id, min, max)| FanSpec::new(id, min, max))
                .collect(),
            t_low: thermal::T_LOW,
            t_high: thermal::T_HIGH,
            step_max: thermal::STEP_MAX,
            poll_interval_ms: timing::POLL_INTERVAL_MS,
            write_delay_ms: timing::WRITE_DELAY_MS,
            startup_mode: StartupMode::default(),
            pid_file: PathBuf::from(paths::PID_FILE),
        }
    }
}

impl Calibration {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn write_delay(&self) -> Duration {
        Duration::from_millis(self.write_delay_ms)
    }

    pub fn transfer(&self) -> Transfer {
        Transfer::new(self.t_low, self.t_high, self.step_max)
    }

    /// Reject calibrations the control loop has no defined behavior for
    pub fn validate(&self) -> Result<()> {
        if self.sensors.is_empty() {
            return Err(SmcFanError::invalid_config("sensors", "at least one sensor is required"));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.sensors.iter().find(|s| !seen.insert(**s)) {
            return Err(SmcFanError::invalid_config("sensors", format!("{} listed twice", dup)));
        }

        if self.fans.is_empty() {
            return Err(SmcFanError::invalid_config("fans", "at least one fan is required"));
        }
        let mut seen = HashSet::new();
        for fan in &self.fans {
            if !seen.insert(fan.id) {
                return Err(SmcFanError::invalid_config("fans", format!("{} listed twice", fan.id)));
            }
            if fan.min_speed > fan.max_speed {
                return Err(SmcFanError::invalid_config(
                    "fans",
                    format!("{}: min {} is above max {}", fan.id, fan.min_speed, fan.max_speed),
                ));
            }
        }

        if self.t_high <= self.t_low {
            return Err(SmcFanError::invalid_config(
                "t_high",
                format!("{} must be above t_low {}", self.t_high, self.t_low),
            ));
        }
        if self.step_max == 0 {
            return Err(SmcFanError::invalid_config("step_max", "must be at least 1"));
        }
        if self.poll_interval_ms == 0 {
            return Err(SmcFanError::invalid_config("poll_interval_ms", "must be at least 1"));
        }
        Ok(())
    }

    /// Pretty JSON of the effective calibration
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SmcFanError::invalid_config("calibration", e.to_string()))
    }
}
