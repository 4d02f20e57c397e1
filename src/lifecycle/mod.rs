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

//! Process plumbing around the control loop
//!
//! - [`daemon`]: fork into the background
//! - [`pidfile`]: single-instance lock
//! - [`signals`]: termination signals delivered as a tagged sleep result

pub mod daemon;
pub mod pidfile;
pub mod signals;

pub use daemon::daemonize;
pub use pidfile::PidFile;
pub use signals::{TerminationPipe, Terminator};
