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

//! Termination signals as a sleep outcome
//!
//! SIGTERM, SIGINT and SIGQUIT each write a byte into a socket pair (the
//! self-pipe trick). The control loop's inter-tick sleep is a timed read on
//! the other end, so it wakes either because the interval elapsed or because
//! a termination was requested. No handler touches loop state. SIGHUP is
//! ignored outright and never reaches the loop.

use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::time::{Duration, Instant};

use signal_hook::consts::signal::{SIGINT, SIGQUIT, SIGTERM};
use signal_hook::SigId;
use tracing::debug;

use crate::controller::{SleepOutcome, Sleeper};
use crate::error::{Result, SmcFanError};

/// Signals that request an orderly shutdown
pub const TERMINATION_SIGNALS: &[libc::c_int] = &[SIGTERM, SIGINT, SIGQUIT];

/// Read end of the termination pipe
#[derive(Debug)]
pub struct TerminationPipe {
    reader: UnixStream,
    writer: UnixStream,
    registrations: Vec<SigId>,
}

/// Requests termination without sending a signal
#[derive(Debug)]
pub struct Terminator {
    writer: UnixStream,
}

impl Terminator {
    pub fn request(&self) -> io::Result<()> {
        (&self.writer).write_all(&[1]).or_else(|e| match e.kind() {
            // A full pipe already holds a pending request
            io::ErrorKind::WouldBlock => Ok(()),
            _ => Err(e),
        })
    }
}

impl TerminationPipe {
    /// Pipe with no signal handlers attached
    pub fn new() -> Result<Self> {
        let (reader, writer) = UnixStream::pair().map_err(SmcFanError::Signal)?;
        writer.set_nonblocking(true).map_err(SmcFanError::Signal)?;
        Ok(Self {
            reader,
            writer,
            registrations: Vec::new(),
        })
    }

    /// Pipe fed by the termination signals, with SIGHUP ignored
    pub fn install() -> Result<Self> {
        ignore_hangup()?;
        let mut pipe = Self::new()?;
        for &signal in TERMINATION_SIGNALS {
            let writer = pipe.writer.try_clone().map_err(SmcFanError::Signal)?;
            let id = signal_hook::low_level::pipe::register(signal, writer).map_err(SmcFanError::Signal)?;
            pipe.registrations.push(id);
        }
        debug!(signals = ?TERMINATION_SIGNALS, "termination signals routed to control loop");
        Ok(pipe)
    }

    pub fn terminator(&self) -> Result<Terminator> {
        let writer = self.writer.try_clone().map_err(SmcFanError::Signal)?;
        Ok(Terminator { writer })
    }

    /// Block until `timeout` passes or a termination request arrives
    pub fn wait(&mut self, timeout: Duration) -> Result<SleepOutcome> {
        let deadline = Instant::now() + timeout;
        let mut buf = [0u8; 16];
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(SleepOutcome::Elapsed);
            }
            self.reader
                .set_read_timeout(Some(remaining))
                .map_err(SmcFanError::SleepInterrupted)?;

            match self.reader.read(&mut buf) {
                Ok(0) => {
                    return Err(SmcFanError::SleepInterrupted(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "termination pipe closed",
                    )));
                }
                Ok(_) => return Ok(SleepOutcome::Terminate),
                Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                    return Ok(SleepOutcome::Elapsed);
                }
                // Some other signal landed mid-read; sleep out the rest
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(SmcFanError::SleepInterrupted(e)),
            }
        }
    }
}

impl Sleeper for TerminationPipe {
    fn sleep(&mut self, interval: Duration) -> Result<SleepOutcome> {
        self.wait(interval)
    }
}

impl Drop for TerminationPipe {
    fn drop(&mut self) {
        for id in self.registrations.drain(..) {
            signal_hook::low_level::unregister(id);
        }
    }
}

fn ignore_hangup() -> Result<()> {
    // SAFETY: installing SIG_IGN has no handler code to run and is
    // async-signal-safe; SIGHUP is a valid signal number.
    let previous = unsafe { libc::signal(libc::SIGHUP, libc::SIG_IGN) };
    if previous == libc::SIG_ERR {
        return Err(SmcFanError::Signal(io::Error::last_os_error()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_without_request() {
        let mut pipe = TerminationPipe::new().unwrap();
        let start = Instant::now();
        assert_eq!(pipe.wait(Duration::from_millis(30)).unwrap(), SleepOutcome::Elapsed);
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_request_wakes_sleep() {
        let mut pipe = TerminationPipe::new().unwrap();
        pipe.terminator().unwrap().request().unwrap();
        let start = Instant::now();
        assert_eq!(pipe.wait(Duration::from_secs(10)).unwrap(), SleepOutcome::Terminate);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_request_from_other_thread() {
        let mut pipe = TerminationPipe::new().unwrap();
        let terminator = pipe.terminator().unwrap();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            terminator.request().unwrap();
        });
        assert_eq!(pipe.wait(Duration::from_secs(10)).unwrap(), SleepOutcome::Terminate);
        handle.join().unwrap();
    }

    #[test]
    fn test_request_during_tick_is_seen_at_next_sleep() {
        let mut pipe = TerminationPipe::new().unwrap();
        assert_eq!(pipe.wait(Duration::from_millis(5)).unwrap(), SleepOutcome::Elapsed);
        pipe.terminator().unwrap().request().unwrap();
        // work happens here, the request stays queued
        assert_eq!(pipe.wait(Duration::from_millis(500)).unwrap(), SleepOutcome::Terminate);
    }

    #[test]
    fn test_zero_timeout_elapses_immediately() {
        let mut pipe = TerminationPipe::new().unwrap();
        assert_eq!(pipe.wait(Duration::ZERO).unwrap(), SleepOutcome::Elapsed);
    }
}
