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

//! Build-time calibration defaults.
//!
//! Values are for a dual-Xeon Mac Pro driven through the applesmc module.
//! They must be recalibrated for other boxes; everything here can be
//! overridden on the command line at start time.

/// Sysfs locations
pub mod paths {
    /// applesmc platform device exposing `fanN_*` and `tempN_input`
    pub const SMC_DIR: &str = "/sys/devices/platform/applesmc.768";

    /// Directory holding the `tempN_input` files that are read
    pub const SENSOR_DIR: &str = SMC_DIR;

    pub const PID_FILE: &str = "/var/run/smcfancontrol.pid";

    /// Present when systemd-journald is running
    pub const JOURNALD_SOCKET: &str = "/run/systemd/journal/socket";
}

/// Temperature sources and the transfer function
pub mod thermal {
    /// Suffixes of the `tempN_input` files to aggregate
    pub const SENSORS: &[u32] = &[22];

    /// Temperature (°C) mapped to speed step 0
    pub const T_LOW: i32 = 70;

    /// Temperature (°C) mapped to the top speed step
    pub const T_HIGH: i32 = 80;

    /// Number of speed steps above step 0
    pub const STEP_MAX: u32 = 20;

    /// hwmon reports millidegrees Celsius
    pub const MILLIDEGREES_PER_DEGREE: i32 = 1000;

    /// How many of the hottest sensors are averaged
    pub const HOTTEST_SAMPLES: usize = 2;

    /// Consecutive same-direction moves needed before the step is re-evaluated
    pub const DEBOUNCE_RUN: u32 = 2;
}

/// Controlled fans
pub mod fans {
    /// (suffix, min RPM, max RPM)
    ///
    /// EFI limits on the reference box are min 500/800/600/600 and
    /// max 2900/2900/2900/2800 for CPU_MEM, IO, EXHAUST and PS.
    pub const FANS: &[(u32, u32, u32)] = &[
        (1, 1000, 2200),
        (2, 1000, 2200),
        (3, 1000, 2200),
        (4, 1000, 2200),
    ];

    /// Value written to `fanN_manual` to take software control
    pub const MANUAL_ON: u8 = 1;

    /// Value written to `fanN_manual` to hand control back to firmware
    pub const MANUAL_OFF: u8 = 0;
}

/// Loop cadence
pub mod timing {
    /// Delay between sensor polls
    pub const POLL_INTERVAL_MS: u64 = 500;

    /// The SMC drops back-to-back writes; every write waits this long first
    pub const WRITE_DELAY_MS: u64 = 5;
}

/// Logging
pub mod logging {
    /// Environment variable holding the tracing filter
    pub const ENV_VAR: &str = "SMCFAN_LOG";

    pub const DEFAULT_FILTER: &str = "info";

    /// syslog identifier used by the journald layer
    pub const SYSLOG_IDENTIFIER: &str = "smcfancontrol";
}
