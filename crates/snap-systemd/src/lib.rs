//! The init system, as seen by the service wrappers.

use std::io;
use std::time::Duration;

use thiserror::Error;

pub use escape::{escape_unit_path, mount_unit_name};
pub use nix::sys::signal::Signal;
pub use systemctl::{CommandRunner, SystemRunner, Systemctl};

mod escape;
mod systemctl;

/// How long to wait for a service to stop when it does not declare a stop timeout.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum Error {
    #[error("Timed out after {}s waiting for `{unit}` to stop", timeout.as_secs_f64())]
    Timeout { unit: String, timeout: Duration },
    #[error("`systemctl {}` failed ({}): {}", args.join(" "), exit_code(*code), stderr.trim())]
    Command {
        args: Vec<String>,
        code: Option<i32>,
        stderr: String,
    },
    #[error("Failed to run `systemctl`")]
    Io(#[from] io::Error),
}

impl Error {
    /// Returns `true` if a unit did not stop within its timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

fn exit_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// The process supervisor that units are installed into and controlled through.
///
/// None of the operations are transactional; callers compensate for partial failures.
pub trait Supervisor {
    /// Reload all unit files.
    fn daemon_reload(&self) -> Result<(), Error>;

    /// Enable a unit, so that it is started by the target it is wanted by.
    fn enable(&self, unit: &str) -> Result<(), Error>;

    fn disable(&self, unit: &str) -> Result<(), Error>;

    /// Start all of the given units.
    fn start(&self, units: &[String]) -> Result<(), Error>;

    /// Stop a unit, failing with [`Error::Timeout`] if it is still active after `timeout`.
    fn stop(&self, unit: &str, timeout: Duration) -> Result<(), Error>;

    /// Send `signal` to the processes of a unit.
    fn kill(&self, unit: &str, signal: Signal) -> Result<(), Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_distinguished() {
        let timeout = Error::Timeout {
            unit: "hello_svc_1.0.service".to_string(),
            timeout: Duration::from_millis(1500),
        };
        assert!(timeout.is_timeout());
        assert_eq!(
            timeout.to_string(),
            "Timed out after 1.5s waiting for `hello_svc_1.0.service` to stop"
        );

        let failure = Error::Command {
            args: vec!["stop".to_string(), "x.service".to_string()],
            code: Some(5),
            stderr: "Unit x.service not loaded.\n".to_string(),
        };
        assert!(!failure.is_timeout());
        assert_eq!(
            failure.to_string(),
            "`systemctl stop x.service` failed (exit code 5): Unit x.service not loaded."
        );
    }
}
