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

//! Process-wide tracing subscriber
//!
//! Events go to the systemd journal when its socket exists and to stderr
//! otherwise. `SMCFAN_LOG` takes an `EnvFilter` directive and defaults to
//! `info`, which is the level the speed step changes are logged at.
//!
//! A detached daemon has its stderr on `/dev/null`, so `--daemon` is only
//! accepted when the journal is there to receive the records.

use std::any::Any;
use std::fmt;
use std::path::Path;

use tracing::error;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::constants::{logging, paths};
use crate::error::{Result, SmcFanError};

/// Where log events end up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSink {
    Journald,
    Stderr,
}

impl fmt::Display for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogSink::Journald => write!(f, "systemd journal"),
            LogSink::Stderr => write!(f, "stderr"),
        }
    }
}

/// Refuse to detach when nothing would receive the log records
///
/// Runs before forking, while stderr still reaches the caller.
pub fn ensure_daemon_sink(journald_socket: &Path) -> Result<()> {
    if journald_socket.exists() {
        return Ok(());
    }
    Err(SmcFanError::Daemonize(format!(
        "no systemd journal at {}, logs would be lost once detached; run in the foreground",
        journald_socket.display()
    )))
}

/// Filter directive from `SMCFAN_LOG`, or the default
pub fn filter_directive() -> String {
    std::env::var(logging::ENV_VAR)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| logging::DEFAULT_FILTER.to_string())
}

fn build_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|e| {
        eprintln!(
            "invalid {} directive {:?}: {}, using {:?}",
            logging::ENV_VAR,
            directive,
            e,
            logging::DEFAULT_FILTER
        );
        EnvFilter::new(logging::DEFAULT_FILTER)
    })
}

/// Install the global subscriber
///
/// Safe to call more than once; later calls leave the first subscriber in
/// place.
pub fn init() -> LogSink {
    let directive = filter_directive();

    if Path::new(paths::JOURNALD_SOCKET).exists() {
        match tracing_journald::layer() {
            Ok(layer) => {
                let layer = layer.with_syslog_identifier(logging::SYSLOG_IDENTIFIER.to_string());
                let _ = tracing_subscriber::registry()
                    .with(layer)
                    .with(build_filter(&directive))
                    .try_init();
                return LogSink::Journald;
            }
            Err(e) => {
                eprintln!("Failed to create journald layer: {}, falling back to stderr", e);
            }
        }
    }

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_env_filter(build_filter(&directive))
        .try_init();
    LogSink::Stderr
}

/// Route panics through tracing so they reach the journal
///
/// Records sent before `init` only reach stderr.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());
        let message = panic_message(panic_info.payload());

        error!(location = %location, "PANIC: {}", message);
        eprintln!("PANIC at {}: {}", location, message);
    }));
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
