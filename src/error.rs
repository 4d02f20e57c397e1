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

//! Error type shared by every smcfan component.
//!
//! Sensor and sleep errors are fatal to the control loop, actuator errors are
//! logged and skipped. The split is decided by the caller; this module only
//! names what went wrong and where.

use std::io;
use std::path::PathBuf;

/// Result type alias using SmcFanError
pub type Result<T> = std::result::Result<T, SmcFanError>;

#[derive(thiserror::Error, Debug)]
pub enum SmcFanError {
    // ============================================================================
    // Hardware Access Errors
    // ============================================================================
    #[error("Failed to read temperature from {path}: {reason}")]
    SensorRead {
        path: PathBuf,
        reason: String,
    },

    #[error("Failed to write {value} to {path}: {reason}")]
    ActuatorWrite {
        path: PathBuf,
        value: String,
        reason: String,
    },

    // ============================================================================
    // Loop Timing Errors
    // ============================================================================
    #[error("Poll sleep interrupted unexpectedly: {0}")]
    SleepInterrupted(#[source] io::Error),

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidConfig {
        field: String,
        reason: String,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ============================================================================
    // Process Lifecycle Errors
    // ============================================================================
    #[error("Daemon already running (pidfile {0} is locked)")]
    AlreadyRunning(PathBuf),

    #[error("Pidfile {path}: {source}")]
    PidFile {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to register signal handling: {0}")]
    Signal(#[source] io::Error),

    #[error("Failed to daemonize: {0}")]
    Daemonize(String),
}

impl SmcFanError {
    /// Create a sensor read error
    pub fn sensor_read(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::SensorRead {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an actuator write error
    pub fn actuator_write(
        path: impl Into<PathBuf>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::ActuatorWrite {
            path: path.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_read_display_names_path() {
        let err = SmcFanError::sensor_read("/sys/x/temp22_input", "No such file or directory");
        let msg = err.to_string();
        assert!(msg.contains("/sys/x/temp22_input"));
        assert!(msg.contains("No such file"));
    }

    #[test]
    fn test_actuator_write_display_names_value() {
        let err = SmcFanError::actuator_write("/sys/x/fan1_min", 1600, "Permission denied");
        assert_eq!(
            err.to_string(),
            "Failed to write 1600 to /sys/x/fan1_min: Permission denied"
        );
    }

    #[test]
    fn test_sleep_error_keeps_source() {
        use std::error::Error;
        let err = SmcFanError::SleepInterrupted(io::Error::other("boom"));
        assert_eq!(err.source().map(|e| e.to_string()), Some("boom".to_string()));
    }

    #[test]
    fn test_already_running_names_pidfile() {
        let err = SmcFanError::AlreadyRunning(PathBuf::from("/var/run/smcfancontrol.pid"));
        assert!(err.to_string().contains("/var/run/smcfancontrol.pid"));
    }
}
