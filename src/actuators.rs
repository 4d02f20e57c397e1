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

//! Fan actuator writer
//!
//! applesmc exposes per-fan control files:
//! - `fanN_min`: lowest speed the firmware may run the fan at (RPM)
//! - `fanN_output`: speed the SMC holds the fan at while in manual mode (RPM)
//! - `fanN_manual`: 1 = software controls the fan, 0 = firmware regulation
//!
//! In manual mode the SMC ignores the `fanN_min` floor and drives the fan to
//! `fanN_output`, so a writer that owns the fans writes both.
//!
//! Writes are best effort per fan. One missing or read-only fan is logged and
//! skipped while the rest of the batch still goes out. The SMC cannot absorb
//! back-to-back writes, so every write is preceded by a short pacing delay.

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::fans::{MANUAL_OFF, MANUAL_ON};
use crate::error::{Result, SmcFanError};
use crate::transfer::SpeedStep;

/// Numeric suffix of the `fanN_*` control files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActuatorId(pub u32);

impl fmt::Display for ActuatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fan{}", self.0)
    }
}

/// One controlled fan and its physical speed range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanSpec {
    pub id: ActuatorId,
    /// RPM written at speed step 0
    pub min_speed: u32,
    /// RPM written at the top speed step
    pub max_speed: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl FanSpec {
    pub fn new(id: u32, min_speed: u32, max_speed: u32) -> Self {
        Self {
            id: ActuatorId(id),
            min_speed,
            max_speed,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Linear interpolation between `min_speed` and `max_speed`
    ///
    /// Integer division, truncating. `step` above `step_max` is treated as
    /// `step_max`.
    pub fn target(&self, step: SpeedStep, step_max: u32) -> u32 {
        if step_max == 0 {
            return self.min_speed;
        }
        let step = u64::from(step.get().min(step_max));
        let span = u64::from(self.max_speed.saturating_sub(self.min_speed));
        self.min_speed + (step * span / u64::from(step_max)) as u32
    }
}

/// Destination for fan commands
#[cfg_attr(test, mockall::automock)]
pub trait FanBackend {
    /// Set the minimum speed in RPM
    fn write_min_speed(&self, fan: ActuatorId, rpm: u32) -> Result<()>;

    /// Set the speed held while in manual mode, in RPM
    fn write_target_speed(&self, fan: ActuatorId, rpm: u32) -> Result<()>;

    /// Switch software (manual) control on or off
    fn write_manual(&self, fan: ActuatorId, manual: bool) -> Result<()>;
}

/// Fans controlled through `<dir>/fanN_min`, `fanN_output` and `fanN_manual`
#[derive(Debug, Clone)]
pub struct SysfsFans {
    dir: PathBuf,
}

impl SysfsFans {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn min_path(&self, fan: ActuatorId) -> PathBuf {
        self.dir.join(format!("fan{}_min", fan.0))
    }

    pub fn output_path(&self, fan: ActuatorId) -> PathBuf {
        self.dir.join(format!("fan{}_output", fan.0))
    }

    pub fn manual_path(&self, fan: ActuatorId) -> PathBuf {
        self.dir.join(format!("fan{}_manual", fan.0))
    }

    fn write_value(path: PathBuf, value: impl ToString) -> Result<()> {
        let value = value.to_string();
        // The control file must already exist; never create one.
        fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&path)
            .and_then(|mut file| {
                use std::io::Write;
                file.write_all(value.as_bytes())
            })
            .map_err(|e| SmcFanError::actuator_write(&path, &value, e.to_string()))
    }
}

impl FanBackend for SysfsFans {
    fn write_min_speed(&self, fan: ActuatorId, rpm: u32) -> Result<()> {
        Self::write_value(self.min_path(fan), rpm)
    }

    fn write_target_speed(&self, fan: ActuatorId, rpm: u32) -> Result<()> {
        Self::write_value(self.output_path(fan), rpm)
    }

    fn write_manual(&self, fan: ActuatorId, manual: bool) -> Result<()> {
        let value = if manual { MANUAL_ON } else { MANUAL_OFF };
        Self::write_value(self.manual_path(fan), value)
    }
}

/// Outcome of one pass over all fans
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub written: Vec<ActuatorId>,
    pub failed: Vec<ActuatorId>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Expands speed steps into per-fan targets and writes them
pub struct ActuatorWriter<F> {
    backend: F,
    fans: Vec<FanSpec>,
    step_max: u32,
    write_delay: Duration,
    drive_output: bool,
}

impl<F: FanBackend> ActuatorWriter<F> {
    pub fn new(backend: F, fans: Vec<FanSpec>, step_max: u32, write_delay: Duration) -> Self {
        Self {
            backend,
            fans,
            step_max,
            write_delay,
            drive_output: false,
        }
    }

    /// Also write `fanN_output`, for fans held in manual mode
    pub fn with_output_control(mut self, drive_output: bool) -> Self {
        self.drive_output = drive_output;
        self
    }

    pub fn fans(&self) -> &[FanSpec] {
        &self.fans
    }

    /// Per-fan targets for `step`, in configuration order
    pub fn targets(&self, step: SpeedStep) -> Vec<(ActuatorId, u32)> {
        self.fans
            .iter()
            .map(|fan| (fan.id, fan.target(step, self.step_max)))
            .collect()
    }

    /// Write the speed for `step` to every fan
    ///
    /// Always raises the `fanN_min` floor; with output control the manual
    /// target follows. A fan counts as failed if either write fails.
    pub fn apply(&self, step: SpeedStep) -> BatchReport {
        let mut report = BatchReport::default();
        for fan in &self.fans {
            let rpm = fan.target(step, self.step_max);
            match self.write_speed(fan.id, rpm) {
                Ok(()) => {
                    debug!(fan = %fan.id, label = fan.label.as_deref().unwrap_or(""), rpm, "fan speed set");
                    report.written.push(fan.id);
                }
                Err(e) => {
                    warn!(fan = %fan.id, error = %e, "Error writing fan speed, check if applesmc module loaded");
                    report.failed.push(fan.id);
                }
            }
        }
        report
    }

    fn write_speed(&self, fan: ActuatorId, rpm: u32) -> Result<()> {
        self.pace();
        self.backend.write_min_speed(fan, rpm)?;
        if self.drive_output {
            self.pace();
            self.backend.write_target_speed(fan, rpm)?;
        }
        Ok(())
    }

    /// Hand every fan to software (`true`) or firmware (`false`) control
    pub fn set_all_manual(&self, manual: bool) -> BatchReport {
        let mut report = BatchReport::default();
        for fan in &self.fans {
            self.pace();
            match self.backend.write_manual(fan.id, manual) {
                Ok(()) => {
                    debug!(fan = %fan.id, manual, "fan control mode set");
                    report.written.push(fan.id);
                }
                Err(e) => {
                    warn!(fan = %fan.id, error = %e, "Error writing fan mode, check if applesmc module loaded");
                    report.failed.push(fan.id);
                }
            }
        }
        report
    }

    fn pace(&self) {
        if !self.write_delay.is_zero() {
            thread::sleep(self.write_delay);
        }
    }
}
