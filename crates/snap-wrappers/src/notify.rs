use tracing::info;

use snap_warnings::warn_user;

/// Receives human-readable progress while failures are compensated for.
pub trait Notifier {
    fn notify(&self, status: &str);
}

impl<T: Notifier + ?Sized> Notifier for &T {
    fn notify(&self, status: &str) {
        (**self).notify(status);
    }
}

/// Shows notifications to the user as warnings.
#[derive(Debug, Clone, Copy, Default)]
pub struct WarningNotifier;

impl Notifier for WarningNotifier {
    fn notify(&self, status: &str) {
        warn_user!("{status}");
    }
}

/// Records notifications in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, status: &str) {
        info!("{status}");
    }
}
