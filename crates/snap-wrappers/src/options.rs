use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use snap_static::EnvVars;

/// Settings for the service lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct ServiceOptions {
    /// How long to wait between asking a service that refused to stop to terminate, and killing
    /// it. Expressed in seconds.
    #[serde(
        serialize_with = "serialize_seconds",
        deserialize_with = "deserialize_seconds"
    )]
    pub kill_wait: Duration,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            kill_wait: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Invalid value for `{name}`: `{value}` is not a non-negative number of seconds")]
    InvalidSeconds { name: &'static str, value: String },
}

impl ServiceOptions {
    /// Read the options from the environment, falling back to the defaults.
    pub fn from_settings() -> Result<Self, SettingsError> {
        let mut options = Self::default();
        if let Some(value) = std::env::var_os(EnvVars::SNAPD_KILL_WAIT) {
            let value = value.to_string_lossy();
            options.kill_wait =
                parse_seconds(&value).ok_or_else(|| SettingsError::InvalidSeconds {
                    name: EnvVars::SNAPD_KILL_WAIT,
                    value: value.to_string(),
                })?;
        }
        Ok(options)
    }
}

fn parse_seconds(value: &str) -> Option<Duration> {
    let seconds = value.trim().parse::<f64>().ok()?;
    Duration::try_from_secs_f64(seconds).ok()
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_seconds<S: Serializer>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

fn deserialize_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let seconds = f64::deserialize(deserializer)?;
    Duration::try_from_secs_f64(seconds).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn defaults_to_five_seconds() {
        assert_eq!(ServiceOptions::default().kill_wait, Duration::from_secs(5));
    }

    #[test]
    fn from_toml() {
        let options: ServiceOptions = toml::from_str("kill-wait = 0.25").unwrap();
        assert_eq!(options.kill_wait, Duration::from_millis(250));

        let options: ServiceOptions = toml::from_str("").unwrap();
        assert_eq!(options, ServiceOptions::default());

        assert!(toml::from_str::<ServiceOptions>("kill-wait = -1.0").is_err());
        assert!(toml::from_str::<ServiceOptions>("kill-after = 1.0").is_err());
    }

    #[test]
    fn whole_seconds() {
        let options: ServiceOptions = toml::from_str(indoc! {r"
            # Give stuck services longer to clean up.
            kill-wait = 10
        "})
        .unwrap();
        assert_eq!(options.kill_wait, Duration::from_secs(10));
        assert_eq!(toml::to_string(&options).unwrap(), "kill-wait = 10.0\n");
    }

    #[test]
    fn from_environment() {
        temp_env::with_var(EnvVars::SNAPD_KILL_WAIT, Some("1.5"), || {
            let options = ServiceOptions::from_settings().unwrap();
            assert_eq!(options.kill_wait, Duration::from_millis(1500));
        });

        temp_env::with_var(EnvVars::SNAPD_KILL_WAIT, Some("soon"), || {
            let err = ServiceOptions::from_settings().unwrap_err();
            assert_eq!(
                err.to_string(),
                "Invalid value for `SNAPD_KILL_WAIT`: `soon` is not a non-negative number of seconds"
            );
        });

        temp_env::with_var_unset(EnvVars::SNAPD_KILL_WAIT, || {
            assert_eq!(
                ServiceOptions::from_settings().unwrap(),
                ServiceOptions::default()
            );
        });
    }
}
