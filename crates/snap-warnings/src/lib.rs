//! Warnings shown to the user on stderr, as opposed to diagnostics recorded through `tracing`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{LazyLock, Mutex};

// macro hygiene: The user might not have direct dependencies on those crates
#[doc(hidden)]
pub use anstream;
use owo_colors::OwoColorize;
use rustc_hash::FxHashSet;

/// Whether user-facing warnings are enabled.
pub static ENABLED: AtomicBool = AtomicBool::new(false);

/// The warnings already shown by [`warn_user_once!`].
pub static WARNINGS: LazyLock<Mutex<FxHashSet<String>>> = LazyLock::new(Mutex::default);

pub fn enable() {
    ENABLED.store(true, Ordering::Relaxed);
}

pub fn disable() {
    ENABLED.store(false, Ordering::Relaxed);
}

/// Returns `true` if user-facing warnings are enabled.
pub fn enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

/// Style `message` as a warning line, e.g., `warning: hello_svc_1.0.service refused to stop`.
pub fn format_warning(message: &str) -> String {
    format!(
        "{}{} {}",
        "warning".yellow().bold(),
        ":".bold(),
        message.bold()
    )
}

/// Returns `true` if `message` has not been shown before, and records it as shown.
#[doc(hidden)]
pub fn first_occurrence(message: &str) -> bool {
    WARNINGS
        .lock()
        .map(|mut shown| shown.insert(message.to_string()))
        .unwrap_or(false)
}

/// Warn a user, if warnings are enabled.
#[macro_export]
macro_rules! warn_user {
    ($($arg:tt)*) => {{
        if $crate::enabled() {
            let message = format!("{}", format_args!($($arg)*));
            $crate::anstream::eprintln!("{}", $crate::format_warning(&message));
        }
    }};
}

/// Warn a user once, if warnings are enabled, with uniqueness determined by the content of the
/// message.
#[macro_export]
macro_rules! warn_user_once {
    ($($arg:tt)*) => {{
        if $crate::enabled() {
            let message = format!("{}", format_args!($($arg)*));
            if $crate::first_occurrence(&message) {
                $crate::anstream::eprintln!("{}", $crate::format_warning(&message));
            }
        }
    }};
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    #[test]
    fn warning_style() {
        let styled = format_warning("hello_svc_1.0.service refused to stop, killing.");
        assert_ne!(styled, "warning: hello_svc_1.0.service refused to stop, killing.");
        assert_snapshot!(
            anstream::adapter::strip_str(&styled),
            @"warning: hello_svc_1.0.service refused to stop, killing."
        );
    }

    #[test]
    fn repeated_warnings() {
        assert!(first_occurrence("`SNAPD_ROOT_DIR` is relative"));
        assert!(!first_occurrence("`SNAPD_ROOT_DIR` is relative"));
        assert!(first_occurrence("`SNAPD_KILL_WAIT` is invalid"));
    }

    #[test]
    fn toggle() {
        enable();
        assert!(enabled());
        disable();
        assert!(!enabled());
    }
}
