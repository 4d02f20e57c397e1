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

//! Liveness notifications to the service supervisor (sd_notify protocol).

use std::ffi::OsString;
use std::os::unix::net::UnixDatagram;
use std::path::PathBuf;

use tracing::debug;

/// State changes reported to the supervisor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Startup finished, the loop is running
    Ready,
    /// One tick completed
    Watchdog,
    /// Shutdown has begun
    Stopping,
    /// Free-form status line
    Status(String),
}

impl Notification {
    pub fn as_message(&self) -> String {
        match self {
            Notification::Ready => "READY=1".to_string(),
            Notification::Watchdog => "WATCHDOG=1".to_string(),
            Notification::Stopping => "STOPPING=1".to_string(),
            Notification::Status(s) => format!("STATUS={}", s.replace('\n', " ")),
        }
    }
}

/// Receiver of liveness notifications
///
/// Delivery is best effort: the loop never fails because the supervisor is
/// missing or unreachable.
pub trait Supervisor {
    fn notify(&mut self, notification: Notification);
}

/// Drops every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSupervisor;

impl Supervisor for NoSupervisor {
    fn notify(&mut self, _notification: Notification) {}
}

/// Keeps every notification, for inspecting what a loop reported
#[derive(Debug, Default, Clone)]
pub struct RecordingSupervisor {
    pub sent: Vec<Notification>,
}

impl Supervisor for RecordingSupervisor {
    fn notify(&mut self, notification: Notification) {
        self.sent.push(notification);
    }
}

/// systemd notification socket named by `NOTIFY_SOCKET`
#[derive(Debug)]
pub struct SystemdNotifier {
    socket: UnixDatagram,
    target: NotifyTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NotifyTarget {
    Path(PathBuf),
    /// Linux abstract namespace (`@name` in the environment)
    Abstract(Vec<u8>),
}

impl NotifyTarget {
    fn parse(value: OsString) -> Option<Self> {
        use std::os::unix::ffi::OsStringExt;
        let bytes = value.into_vec();
        match bytes.first() {
            None => None,
            Some(b'@') => Some(NotifyTarget::Abstract(bytes[1..].to_vec())),
            Some(b'/') => Some(NotifyTarget::Path(PathBuf::from(OsString::from_vec(bytes)))),
            Some(_) => None,
        }
    }
}

impl SystemdNotifier {
    /// Connect to `NOTIFY_SOCKET`, if the service manager set one
    pub fn from_env() -> Option<Self> {
        let target = NotifyTarget::parse(std::env::var_os("NOTIFY_SOCKET")?)?;
        match UnixDatagram::unbound() {
            Ok(socket) => Some(Self { socket, target }),
            Err(e) => {
                debug!(error = %e, "could not create notification socket");
                None
            }
        }
    }

    fn send(&self, message: &str) -> std::io::Result<usize> {
        match &self.target {
            NotifyTarget::Path(path) => self.socket.send_to(message.as_bytes(), path),
            NotifyTarget::Abstract(name) => send_abstract(&self.socket, name, message.as_bytes()),
        }
    }
}

#[cfg(target_os = "linux")]
fn send_abstract(socket: &UnixDatagram, name: &[u8], buf: &[u8]) -> std::io::Result<usize> {
    use std::os::linux::net::SocketAddrExt;

    let addr = std::os::unix::net::SocketAddr::from_abstract_name(name)?;
    socket.send_to_addr(buf, &addr)
}

#[cfg(not(target_os = "linux"))]
fn send_abstract(_socket: &UnixDatagram, _name: &[u8], _buf: &[u8]) -> std::io::Result<usize> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "abstract sockets are Linux only",
    ))
}

impl Supervisor for SystemdNotifier {
    fn notify(&mut self, notification: Notification) {
        let message = notification.as_message();
        if let Err(e) = self.send(&message) {
            debug!(message = %message, error = %e, "sd_notify failed");
        }
    }
}

/// Pick the systemd notifier when available, otherwise drop notifications
pub fn from_env() -> Box<dyn Supervisor> {
    match SystemdNotifier::from_env() {
        Some(notifier) => Box::new(notifier),
        None => Box::new(NoSupervisor),
    }
}

impl<S: Supervisor + ?Sized> Supervisor for Box<S> {
    fn notify(&mut self, notification: Notification) {
        (**self).notify(notification)
    }
}

impl<S: Supervisor + ?Sized> Supervisor for &mut S {
    fn notify(&mut self, notification: Notification) {
        (**self).notify(notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_messages() {
        assert_eq!(Notification::Ready.as_message(), "READY=1");
        assert_eq!(Notification::Watchdog.as_message(), "WATCHDOG=1");
        assert_eq!(Notification::Stopping.as_message(), "STOPPING=1");
        assert_eq!(
            Notification::Status("step 3\nof 20".into()).as_message(),
            "STATUS=step 3 of 20"
        );
    }

    #[test]
    fn test_parse_target() {
        assert_eq!(
            NotifyTarget::parse(OsString::from("/run/systemd/notify")),
            Some(NotifyTarget::Path(PathBuf::from("/run/systemd/notify")))
        );
        assert_eq!(
            NotifyTarget::parse(OsString::from("@sd-notify")),
            Some(NotifyTarget::Abstract(b"sd-notify".to_vec()))
        );
        assert_eq!(NotifyTarget::parse(OsString::from("")), None);
        assert_eq!(NotifyTarget::parse(OsString::from("relative")), None);
    }

    #[test]
    fn test_notifier_delivers_datagram() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notify.sock");
        let receiver = UnixDatagram::bind(&path).unwrap();

        let mut notifier = SystemdNotifier {
            socket: UnixDatagram::unbound().unwrap(),
            target: NotifyTarget::Path(path),
        };
        notifier.notify(Notification::Watchdog);

        let mut buf = [0u8; 64];
        let n = receiver.recv(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"WATCHDOG=1");
    }

    #[test]
    fn test_unreachable_socket_is_ignored() {
        let dir = TempDir::new().unwrap();
        let mut notifier = SystemdNotifier {
            socket: UnixDatagram::unbound().unwrap(),
            target: NotifyTarget::Path(dir.path().join("missing.sock")),
        };
        notifier.notify(Notification::Ready);
    }

    #[test]
    fn test_recording_supervisor() {
        let mut sup = RecordingSupervisor::default();
        sup.notify(Notification::Ready);
        sup.notify(Notification::Watchdog);
        assert_eq!(sup.sent, vec![Notification::Ready, Notification::Watchdog]);
    }
}
