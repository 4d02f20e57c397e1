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

//! Temperature sensor reader
//!
//! Each configured sensor is a `tempN_input` file reporting millidegrees
//! Celsius. Every read is a short open-read-close; nothing is cached between
//! ticks.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Result, SmcFanError};

/// Numeric suffix of a `tempN_input` file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorId(pub u32);

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "temp{}", self.0)
    }
}

/// One successful sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    pub sensor: SensorId,
    pub millidegrees: i32,
}

/// Source of raw temperature samples
#[cfg_attr(test, mockall::automock)]
pub trait SensorBackend {
    /// Read one sensor in millidegrees Celsius
    fn read(&self, sensor: SensorId) -> Result<i32>;
}

/// Sensors exposed as `<dir>/tempN_input`
#[derive(Debug, Clone)]
pub struct SysfsSensors {
    dir: PathBuf,
}

impl SysfsSensors {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn input_path(&self, sensor: SensorId) -> PathBuf {
        self.dir.join(format!("temp{}_input", sensor.0))
    }
}

impl SensorBackend for SysfsSensors {
    fn read(&self, sensor: SensorId) -> Result<i32> {
        let path = self.input_path(sensor);
        let value = read_millidegrees(&path)?;
        trace!(sensor = %sensor, millidegrees = value, "sensor read");
        Ok(value)
    }
}

/// Parse a hwmon temperature file
///
/// An empty or non-numeric file is an error rather than a zero reading.
pub fn read_millidegrees(path: &Path) -> Result<i32> {
    let content = fs::read_to_string(path)
        .map_err(|e| SmcFanError::sensor_read(path, format!("Failed to read: {}", e)))?;

    content
        .trim()
        .parse::<i32>()
        .map_err(|e| SmcFanError::sensor_read(path, format!("Failed to parse '{}': {}", content.trim(), e)))
}

/// Read every configured sensor, in order
///
/// Stops at the first failure: the aggregator has no meaning for a partial
/// set, so the caller treats any error here as fatal.
pub fn read_all<B: SensorBackend + ?Sized>(backend: &B, sensors: &[SensorId]) -> Result<Vec<Reading>> {
    sensors
        .iter()
        .map(|&sensor| {
            backend
                .read(sensor)
                .map(|millidegrees| Reading { sensor, millidegrees })
        })
        .collect()
}
