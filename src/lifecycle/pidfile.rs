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

//! Single-instance pidfile
//!
//! The file is locked with an `fcntl` write lock for as long as the process
//! runs. The lock disappears with the process, so a pidfile left behind by a
//! crash never blocks the next start.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Result, SmcFanError};

/// Held pidfile lock; released and unlinked on drop
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
    _lock: File,
}

impl PidFile {
    /// Create, lock and fill in the pidfile
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let pid_err = |source: io::Error| SmcFanError::PidFile { path: path.clone(), source };

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .mode(0o644)
            .open(&path)
            .map_err(pid_err)?;

        if let Err(e) = lock_whole_file(&file) {
            return Err(match e.raw_os_error() {
                Some(libc::EACCES) | Some(libc::EAGAIN) => SmcFanError::AlreadyRunning(path.clone()),
                _ => pid_err(e),
            });
        }

        file.set_len(0).map_err(pid_err)?;
        writeln!(file, "{}", std::process::id()).map_err(pid_err)?;
        file.flush().map_err(pid_err)?;

        debug!(path = %path.display(), "pidfile locked");
        Ok(Self { path, _lock: file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unlink the file and drop the lock
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to remove pidfile");
        }
    }
}

fn lock_whole_file(file: &File) -> io::Result<()> {
    // SAFETY: flock is a plain C struct; all-zero is a valid starting value.
    let mut lock: libc::flock = unsafe { std::mem::zeroed() };
    lock.l_type = libc::F_WRLCK as _;
    lock.l_whence = libc::SEEK_SET as _;
    lock.l_start = 0;
    lock.l_len = 0;

    // SAFETY: the descriptor is owned by `file` and open for writing; `lock`
    // is a valid flock for the duration of the call.
    let rc = unsafe { libc::fcntl(file.as_raw_fd(), libc::F_SETLK, &lock as *const libc::flock) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}
