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

use std::ffi::CStr;
use std::io;

use crate::error::{Result, SmcFanError};

const DEV_NULL: &CStr = c"/dev/null";

/// Detach from the terminal and continue in a background session
///
/// Must run before any thread is spawned and before logging is set up: the
/// parent exits inside this call and the standard streams of the child end
/// up on `/dev/null`.
pub fn daemonize() -> Result<()> {
    // SAFETY: umask only changes the file creation mask of this process.
    unsafe { libc::umask(0) };

    // SAFETY: called while the process is still single threaded.
    match unsafe { libc::fork() } {
        -1 => return Err(SmcFanError::Daemonize(format!("fork failed: {}", io::Error::last_os_error()))),
        0 => {}
        _ => std::process::exit(0),
    }

    // SAFETY: setsid has no memory-safety preconditions.
    if unsafe { libc::setsid() } < 0 {
        return Err(SmcFanError::Daemonize(format!("setsid failed: {}", io::Error::last_os_error())));
    }

    std::env::set_current_dir("/")
        .map_err(|e| SmcFanError::Daemonize(format!("can't change directory to /: {}", e)))?;

    redirect_stdio()
}

fn redirect_stdio() -> Result<()> {
    // SAFETY: DEV_NULL is a valid NUL-terminated path.
    let fd = unsafe { libc::open(DEV_NULL.as_ptr(), libc::O_RDWR) };
    if fd < 0 {
        return Err(SmcFanError::Daemonize(format!("open /dev/null: {}", io::Error::last_os_error())));
    }
    for target in [libc::STDIN_FILENO, libc::STDOUT_FILENO, libc::STDERR_FILENO] {
        // SAFETY: both descriptors are open; dup2 replaces `target` atomically.
        if unsafe { libc::dup2(fd, target) } < 0 {
            return Err(SmcFanError::Daemonize(format!(
                "unexpected file descriptor {}: {}",
                target,
                io::Error::last_os_error()
            )));
        }
    }
    if fd > libc::STDERR_FILENO {
        // SAFETY: fd was opened above and is no longer needed.
        unsafe { libc::close(fd) };
    }
    Ok(())
}
