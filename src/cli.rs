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

//! Command line handling for `smcfand`
//!
//! Start-time overrides for the compiled-in calibration. There is no
//! configuration file.

use std::path::PathBuf;
use std::str::FromStr;

use crate::actuators::FanSpec;
use crate::config::{Calibration, StartupMode};
use crate::error::{Result, SmcFanError};
use crate::sensors::SensorId;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// What `main` should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(RunOptions),
    PrintConfig(Calibration),
    Help,
    Version,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub calibration: Calibration,
    /// Fork into the background and detach from the terminal
    pub daemonize: bool,
}

/// Parse arguments, excluding the program name
///
/// The resulting calibration is validated.
pub fn parse_args<I, S>(args: I) -> Result<Command>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let args: Vec<String> = args.into_iter().map(Into::into).collect();
    let mut calibration = Calibration::default();
    let mut daemonize = false;
    let mut print_config = false;

    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "-h" | "--help" => return Ok(Command::Help),
            "-v" | "--version" => return Ok(Command::Version),
            "-d" | "--daemon" => daemonize = true,
            "-f" | "--foreground" => daemonize = false,
            "--firmware-floor" => calibration.startup_mode = StartupMode::FirmwareFloor,
            "--print-config" => print_config = true,
            "--pidfile" => calibration.pid_file = PathBuf::from(value(&args, &mut i)?),
            "--smc-dir" => calibration.smc_dir = PathBuf::from(value(&args, &mut i)?),
            "--sensor-dir" => calibration.sensor_dir = PathBuf::from(value(&args, &mut i)?),
            "--sensors" => calibration.sensors = parse_sensors(value(&args, &mut i)?)?,
            "--fans" => calibration.fans = parse_fans(value(&args, &mut i)?)?,
            "--t-low" => calibration.t_low = number(arg, value(&args, &mut i)?)?,
            "--t-high" => calibration.t_high = number(arg, value(&args, &mut i)?)?,
            "--steps" => calibration.step_max = number(arg, value(&args, &mut i)?)?,
            "--interval-ms" => calibration.poll_interval_ms = number(arg, value(&args, &mut i)?)?,
            "--write-delay-ms" => calibration.write_delay_ms = number(arg, value(&args, &mut i)?)?,
            other => {
                return Err(SmcFanError::InvalidArgument(format!("unknown argument: {}", other)));
            }
        }
        i += 1;
    }

    calibration.validate()?;

    if print_config {
        return Ok(Command::PrintConfig(calibration));
    }
    Ok(Command::Run(RunOptions { calibration, daemonize }))
}

fn value<'a>(args: &'a [String], i: &mut usize) -> Result<&'a str> {
    let flag = &args[*i];
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| SmcFanError::InvalidArgument(format!("{} requires a value", flag)))
}

fn number<T: FromStr>(flag: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| SmcFanError::InvalidArgument(format!("{} {}: {}", flag, raw, e)))
}

/// `22` or `0,1,22`
pub fn parse_sensors(raw: &str) -> Result<Vec<SensorId>> {
    raw.split(',')
        .map(|part| number::<u32>("--sensors", part).map(SensorId))
        .collect()
}

/// `1:1000:2200,2:800:2900` with an optional `:LABEL` per fan
pub fn parse_fans(raw: &str) -> Result<Vec<FanSpec>> {
    raw.split(',')
        .map(|part| {
            let fields: Vec<&str> = part.split(':').collect();
            match fields.as_slice() {
                [id, min, max] | [id, min, max, _] => {
                    let mut fan = FanSpec::new(
                        number("--fans", id)?,
                        number("--fans", min)?,
                        number("--fans", max)?,
                    );
                    if let Some(label) = fields.get(3).filter(|l| !l.is_empty()) {
                        fan = fan.with_label(*label);
                    }
                    Ok(fan)
                }
                _ => Err(SmcFanError::InvalidArgument(format!(
                    "--fans entry '{}' must be ID:MIN:MAX[:LABEL]",
                    part
                ))),
            }
        })
        .collect()
}

pub fn help_text() -> String {
    format!(
        "smcfand {VERSION} - temperature driven fan control for Apple SMC machines

USAGE:
    smcfand [OPTIONS]

OPTIONS:
    -d, --daemon             Fork into the background
    -f, --foreground         Stay in the foreground (default)
        --pidfile PATH       Lock file (default /var/run/smcfancontrol.pid)
        --smc-dir PATH       Directory with fanN_min / fanN_manual
        --sensor-dir PATH    Directory with tempN_input
        --sensors LIST       Sensor suffixes, e.g. 0,1,22
        --fans LIST          Fans as ID:MIN:MAX[:LABEL], comma separated
        --t-low N            Temperature (C) for speed step 0
        --t-high N           Temperature (C) for the top speed step
        --steps N            Number of speed steps
        --interval-ms N      Sensor poll interval
        --write-delay-ms N   Delay before each SMC write
        --firmware-floor     Leave fans in firmware mode, only raise fanN_min
        --print-config       Print the effective calibration as JSON and exit
    -v, --version            Print version
    -h, --help               Print this help

ENVIRONMENT:
    SMCFAN_LOG               Log filter (trace, debug, info, warn, error)
"
    )
}
