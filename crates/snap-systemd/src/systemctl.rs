use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use snap_dirs::Dirs;

use crate::{Error, Signal, Supervisor};

/// Runs `systemctl` invocations.
pub trait CommandRunner {
    /// Run `systemctl` with the given arguments, returning its standard output.
    fn run(&self, args: &[&str]) -> Result<String, Error>;
}

impl<F> CommandRunner for F
where
    F: Fn(&[&str]) -> Result<String, Error>,
{
    fn run(&self, args: &[&str]) -> Result<String, Error> {
        self(args)
    }
}

/// Runs the `systemctl` found on the `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, args: &[&str]) -> Result<String, Error> {
        trace!("Running `systemctl {}`", args.join(" "));
        let output = Command::new("systemctl").args(args).output()?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(Error::Command {
                args: args.iter().map(ToString::to_string).collect(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        }
    }
}

/// A [`Supervisor`] backed by `systemctl`.
#[derive(Debug, Clone)]
pub struct Systemctl<R = SystemRunner> {
    root: PathBuf,
    runner: R,
    poll_interval: Duration,
}

impl Systemctl {
    /// Control the system instance of systemd, installing into the root of `dirs`.
    pub fn new(dirs: &Dirs) -> Self {
        Self::with_runner(dirs, SystemRunner)
    }
}

impl<R: CommandRunner> Systemctl<R> {
    pub fn with_runner(dirs: &Dirs, runner: R) -> Self {
        Self {
            root: dirs.root().to_path_buf(),
            runner,
            poll_interval: Duration::from_millis(250),
        }
    }

    /// Set how often a stopping unit is polled for its state.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run a command that changes the enablement state of a unit.
    ///
    /// Enablement only manipulates symlinks, so it also works on a staged root.
    fn run_rooted(&self, verb: &str, unit: &str) -> Result<String, Error> {
        if self.root == Path::new("/") {
            self.runner.run(&[verb, unit])
        } else {
            let root = self.root.to_string_lossy();
            self.runner.run(&["--root", &*root, verb, unit])
        }
    }

    fn is_stopped(&self, unit: &str) -> Result<bool, Error> {
        let output = self
            .runner
            .run(&["show", "--property=ActiveState", unit])?;
        let state = output.trim().strip_prefix("ActiveState=").unwrap_or("");
        trace!("`{unit}` is {state}");
        Ok(matches!(state, "inactive" | "failed"))
    }
}

impl<R: CommandRunner> Supervisor for Systemctl<R> {
    fn daemon_reload(&self) -> Result<(), Error> {
        debug!("Reloading unit files");
        self.runner.run(&["daemon-reload"])?;
        Ok(())
    }

    fn enable(&self, unit: &str) -> Result<(), Error> {
        debug!("Enabling `{unit}`");
        self.run_rooted("enable", unit)?;
        Ok(())
    }

    fn disable(&self, unit: &str) -> Result<(), Error> {
        debug!("Disabling `{unit}`");
        self.run_rooted("disable", unit)?;
        Ok(())
    }

    fn start(&self, units: &[String]) -> Result<(), Error> {
        debug!("Starting {}", units.join(", "));
        let mut args = vec!["start"];
        args.extend(units.iter().map(String::as_str));
        self.runner.run(&args)?;
        Ok(())
    }

    fn stop(&self, unit: &str, timeout: Duration) -> Result<(), Error> {
        debug!("Stopping `{unit}` (timeout: {}s)", timeout.as_secs_f64());
        // A timeout too large to represent never expires.
        let deadline = Instant::now().checked_add(timeout);
        self.runner.run(&["stop", unit])?;

        loop {
            if self.is_stopped(unit)? {
                return Ok(());
            }
            let now = Instant::now();
            let wait = match deadline {
                Some(deadline) if now >= deadline => {
                    return Err(Error::Timeout {
                        unit: unit.to_string(),
                        timeout,
                    });
                }
                Some(deadline) => self.poll_interval.min(deadline - now),
                None => self.poll_interval,
            };
            std::thread::sleep(wait);
        }
    }

    fn kill(&self, unit: &str, signal: Signal) -> Result<(), Error> {
        debug!("Sending {signal} to `{unit}`");
        self.runner.run(&["kill", unit, "-s", signal.as_str()])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// A runner that records every invocation and reports units as being in `state`.
    fn recording<'a>(
        calls: &'a Mutex<Vec<String>>,
        state: &'static str,
    ) -> impl CommandRunner + 'a {
        move |args: &[&str]| {
            calls.lock().unwrap().push(args.join(" "));
            if args.first() == Some(&"show") {
                Ok(format!("ActiveState={state}\n"))
            } else {
                Ok(String::new())
            }
        }
    }

    #[test]
    fn enable_on_system_root() {
        let calls = Mutex::new(Vec::new());
        let systemctl = Systemctl::with_runner(&Dirs::default(), recording(&calls, "inactive"));
        systemctl.enable("foo.service").unwrap();
        systemctl.disable("foo.service").unwrap();
        systemctl.daemon_reload().unwrap();
        assert_eq!(
            *calls.lock().unwrap(),
            ["enable foo.service", "disable foo.service", "daemon-reload"]
        );
    }

    #[test]
    fn enable_on_staged_root() {
        let calls = Mutex::new(Vec::new());
        let dirs = Dirs::from_root("/tmp/staged");
        let systemctl = Systemctl::with_runner(&dirs, recording(&calls, "inactive"));
        systemctl.enable("foo.service").unwrap();
        assert_eq!(
            *calls.lock().unwrap(),
            ["--root /tmp/staged enable foo.service"]
        );
    }

    #[test]
    fn start_batches_units() {
        let calls = Mutex::new(Vec::new());
        let systemctl = Systemctl::with_runner(&Dirs::default(), recording(&calls, "inactive"));
        systemctl
            .start(&["a.service".to_string(), "b.service".to_string()])
            .unwrap();
        systemctl.kill("a.service", Signal::SIGTERM).unwrap();
        assert_eq!(
            *calls.lock().unwrap(),
            ["start a.service b.service", "kill a.service -s SIGTERM"]
        );
    }

    #[test]
    fn stop_waits_for_inactive() {
        let calls = Mutex::new(Vec::new());
        let systemctl = Systemctl::with_runner(&Dirs::default(), recording(&calls, "inactive"));
        systemctl
            .stop("foo.service", Duration::from_secs(1))
            .unwrap();
        assert_eq!(
            *calls.lock().unwrap(),
            ["stop foo.service", "show --property=ActiveState foo.service"]
        );
    }

    #[test]
    fn stop_with_unbounded_timeout() {
        let calls = Mutex::new(Vec::new());
        let systemctl = Systemctl::with_runner(&Dirs::default(), recording(&calls, "failed"));
        systemctl.stop("foo.service", Duration::MAX).unwrap();
        assert_eq!(
            *calls.lock().unwrap(),
            ["stop foo.service", "show --property=ActiveState foo.service"]
        );
    }

    #[test]
    fn stop_times_out() {
        let calls = Mutex::new(Vec::new());
        let systemctl = Systemctl::with_runner(&Dirs::default(), recording(&calls, "active"))
            .with_poll_interval(Duration::from_millis(5));
        let err = systemctl
            .stop("foo.service", Duration::from_millis(20))
            .unwrap_err();
        assert!(err.is_timeout(), "{err}");
        assert!(calls.lock().unwrap().len() > 2);
    }

    #[test]
    fn command_failures_are_not_timeouts() {
        let runner = |args: &[&str]| -> Result<String, Error> {
            Err(Error::Command {
                args: args.iter().map(ToString::to_string).collect(),
                code: Some(1),
                stderr: "boom".to_string(),
            })
        };
        let systemctl = Systemctl::with_runner(&Dirs::default(), runner);
        let err = systemctl
            .stop("foo.service", Duration::from_secs(1))
            .unwrap_err();
        assert!(!err.is_timeout());
    }
}
