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

//! Control loop driver
//!
//! `STARTING -> RUNNING -> STOPPING`, once per process:
//!
//! 1. **Starting**: set the startup fan mode, take one reading, seed the loop
//!    state and write the initial speed step unconditionally.
//! 2. **Running**: read, aggregate, debounce, and write a new step only when
//!    it changed; report liveness; sleep for the poll interval.
//! 3. **Stopping**: hand every fan back to firmware control.
//!
//! A sensor failure or an unexpected sleep error ends the loop through the
//! same shutdown path as a termination request, only with a failure status.
//! Actuator failures never end the loop.

use std::time::Duration;

use tracing::{debug, error, info};

use crate::actuators::{ActuatorWriter, BatchReport, FanBackend};
use crate::aggregate::aggregate;
use crate::config::{Calibration, StartupMode};
use crate::error::{Result, SmcFanError};
use crate::hysteresis::LoopState;
use crate::sensors::{self, SensorBackend, SensorId};
use crate::supervisor::{Notification, Supervisor};
use crate::transfer::{SpeedStep, Transfer};

/// Why the inter-tick sleep ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepOutcome {
    /// The full interval passed
    Elapsed,
    /// The lifecycle collaborator asked the loop to stop
    Terminate,
}

/// The loop's only suspension point
pub trait Sleeper {
    /// Errors are fatal to the loop
    fn sleep(&mut self, interval: Duration) -> Result<SleepOutcome>;
}

/// How the loop ended
#[derive(Debug)]
pub enum ExitReason {
    /// Orderly shutdown on request
    Terminated,
    Fatal(SmcFanError),
}

impl ExitReason {
    pub fn exit_code(&self) -> i32 {
        match self {
            ExitReason::Terminated => 0,
            ExitReason::Fatal(_) => 1,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExitReason::Terminated)
    }
}

/// What one RUNNING tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    pub temperature: i32,
    /// Set when the debounce run completed this tick
    pub evaluated: Option<SpeedStep>,
    /// Set when a new step was written to the fans
    pub applied: Option<BatchReport>,
}

pub struct Controller<S, F, V> {
    sensors: S,
    sensor_ids: Vec<SensorId>,
    writer: ActuatorWriter<F>,
    transfer: Transfer,
    startup_mode: StartupMode,
    poll_interval: Duration,
    supervisor: V,
}

impl<S, F, V> Controller<S, F, V>
where
    S: SensorBackend,
    F: FanBackend,
    V: Supervisor,
{
    /// `calibration` is expected to have passed `Calibration::validate`
    pub fn new(calibration: &Calibration, sensors: S, fans: F, supervisor: V) -> Self {
        Self {
            sensors,
            sensor_ids: calibration.sensors.clone(),
            writer: ActuatorWriter::new(
                fans,
                calibration.fans.clone(),
                calibration.step_max,
                calibration.write_delay(),
            )
            .with_output_control(calibration.startup_mode.engages_manual()),
            transfer: calibration.transfer(),
            startup_mode: calibration.startup_mode,
            poll_interval: calibration.poll_interval(),
            supervisor,
        }
    }

    /// Aggregated temperature in whole degrees
    pub fn read_temperature(&self) -> Result<i32> {
        let readings = sensors::read_all(&self.sensors, &self.sensor_ids)?;
        aggregate(&readings)
            .ok_or_else(|| SmcFanError::invalid_config("sensors", "no sensors configured"))
    }

    /// STARTING: seed the loop state and write the first step
    pub fn start(&mut self) -> Result<LoopState> {
        let manual = self.startup_mode.engages_manual();
        self.writer.set_all_manual(manual);

        let t = self.read_temperature()?;
        let step = self.transfer.temperature_to_step(t);
        self.writer.apply(step);
        info!(
            step = step.get(),
            step_max = self.transfer.step_max(),
            temperature = t,
            manual,
            "initial speed step {} (of {}) at temperature {}",
            step,
            self.transfer.step_max(),
            t
        );

        self.supervisor.notify(Notification::Ready);
        Ok(LoopState::new(t, step))
    }

    /// RUNNING: one poll
    pub fn tick(&mut self, state: &mut LoopState) -> Result<TickOutcome> {
        let t = self.read_temperature()?;
        let mut outcome = TickOutcome {
            temperature: t,
            evaluated: None,
            applied: None,
        };

        if let Some(t) = state.observe(t) {
            let step = self.transfer.temperature_to_step(t);
            outcome.evaluated = Some(step);
            if state.commit_step(step) {
                outcome.applied = Some(self.writer.apply(step));
                info!(
                    step = step.get(),
                    temperature = t,
                    "changed to speed step {} (of {}) at temperature {}",
                    step,
                    self.transfer.step_max(),
                    t
                );
                self.supervisor.notify(Notification::Status(format!(
                    "speed step {} of {} at {}C",
                    step,
                    self.transfer.step_max(),
                    t
                )));
            }
        }
        debug!(temperature = t, step = state.previous_speed_step.get(), "tick");

        self.supervisor.notify(Notification::Watchdog);
        Ok(outcome)
    }

    /// Drive the loop until termination or a fatal error, then shut down
    pub fn run<Z: Sleeper + ?Sized>(mut self, sleeper: &mut Z) -> ExitReason {
        let mut state = match self.start() {
            Ok(state) => state,
            Err(e) => {
                error!(error = %e, "startup failed");
                return self.shutdown(ExitReason::Fatal(e));
            }
        };

        loop {
            if let Err(e) = self.tick(&mut state) {
                error!(error = %e, "control loop failed");
                return self.shutdown(ExitReason::Fatal(e));
            }
            match sleeper.sleep(self.poll_interval) {
                Ok(SleepOutcome::Elapsed) => {}
                Ok(SleepOutcome::Terminate) => {
                    info!("termination requested");
                    return self.shutdown(ExitReason::Terminated);
                }
                Err(e) => {
                    error!(error = %e, "poll sleep failed");
                    return self.shutdown(ExitReason::Fatal(e));
                }
            }
        }
    }

    /// STOPPING: return every fan to firmware control
    ///
    /// Consumes the controller so the shutdown writes run exactly once.
    pub fn shutdown(mut self, reason: ExitReason) -> ExitReason {
        self.supervisor.notify(Notification::Stopping);
        let report = self.writer.set_all_manual(false);
        if report.is_complete() {
            info!(fans = report.written.len(), "fans returned to automatic control, exiting");
        } else {
            error!(failed = ?report.failed, "some fans could not be returned to automatic control");
        }
        reason
    }
}
