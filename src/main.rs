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

//! smcfand - fan control daemon for Apple SMC machines

use std::path::Path;

use anyhow::Context;
use tracing::{error, info};

use smcfan::actuators::SysfsFans;
use smcfan::cli::{self, Command, RunOptions, VERSION};
use smcfan::constants::paths;
use smcfan::controller::Controller;
use smcfan::lifecycle::{self, PidFile, TerminationPipe};
use smcfan::sensors::SysfsSensors;
use smcfan::{logging, supervisor};

fn main() {
    // PHASE 0: Panics are logged like any other fatal error
    logging::install_panic_hook();

    // PHASE 1: Arguments, before anything touches the hardware
    let command = match cli::parse_args(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Try 'smcfand --help' for more information.");
            std::process::exit(1);
        }
    };

    let options = match command {
        Command::Help => {
            print!("{}", cli::help_text());
            return;
        }
        Command::Version => {
            println!("smcfand {}", VERSION);
            return;
        }
        Command::PrintConfig(calibration) => match calibration.to_json() {
            Ok(json) => {
                println!("{}", json);
                return;
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        Command::Run(options) => options,
    };

    match run(options) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("smcfand: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Everything from daemonizing to the loop's exit status
fn run(options: RunOptions) -> anyhow::Result<i32> {
    let RunOptions { calibration, daemonize } = options;

    // PHASE 2: Detach while still single threaded
    if daemonize {
        logging::ensure_daemon_sink(Path::new(paths::JOURNALD_SOCKET))?;
        lifecycle::daemonize().context("could not daemonize")?;
    }

    // PHASE 3: Logging
    let sink = logging::init();
    info!("STARTUP: smcfand {} starting, logging to {}", VERSION, sink);

    // PHASE 4: Termination signals, then the single-instance lock
    let mut pipe = TerminationPipe::install().context("could not install signal handlers")?;
    let pidfile = PidFile::acquire(&calibration.pid_file)
        .with_context(|| format!("could not lock {}", calibration.pid_file.display()))?;

    info!(
        smc_dir = %calibration.smc_dir.display(),
        sensors = calibration.sensors.len(),
        fans = calibration.fans.len(),
        t_low = calibration.t_low,
        t_high = calibration.t_high,
        step_max = calibration.step_max,
        startup_mode = ?calibration.startup_mode,
        "STARTUP: pid {}",
        std::process::id()
    );

    // PHASE 5: Control loop until termination or a fatal error
    let controller = Controller::new(
        &calibration,
        SysfsSensors::new(&calibration.sensor_dir),
        SysfsFans::new(&calibration.smc_dir),
        supervisor::from_env(),
    );
    let reason = controller.run(&mut pipe);

    // PHASE 6: Cleanup; process::exit skips destructors
    pidfile.release();
    drop(pipe);

    let code = reason.exit_code();
    info!(code, "SHUTDOWN: smcfand exiting");
    Ok(code)
}
