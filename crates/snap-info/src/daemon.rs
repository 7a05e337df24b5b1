use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the init system decides that a service has finished starting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DaemonType {
    Simple,
    Forking,
    Oneshot,
    Dbus,
    Notify,
}

impl DaemonType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Forking => "forking",
            Self::Oneshot => "oneshot",
            Self::Dbus => "dbus",
            Self::Notify => "notify",
        }
    }
}

impl fmt::Display for DaemonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DaemonType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simple" => Ok(Self::Simple),
            "forking" => Ok(Self::Forking),
            "oneshot" => Ok(Self::Oneshot),
            "dbus" => Ok(Self::Dbus),
            "notify" => Ok(Self::Notify),
            _ => Err(UnknownVariant {
                kind: "daemon type",
                value: s.to_string(),
            }),
        }
    }
}

/// When the init system restarts a service that exited.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestartCondition {
    No,
    OnSuccess,
    #[default]
    OnFailure,
    OnAbnormal,
    OnAbort,
    Always,
}

impl RestartCondition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::No => "no",
            Self::OnSuccess => "on-success",
            Self::OnFailure => "on-failure",
            Self::OnAbnormal => "on-abnormal",
            Self::OnAbort => "on-abort",
            Self::Always => "always",
        }
    }
}

impl fmt::Display for RestartCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RestartCondition {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "no" => Ok(Self::No),
            "on-success" => Ok(Self::OnSuccess),
            "on-failure" => Ok(Self::OnFailure),
            "on-abnormal" => Ok(Self::OnAbnormal),
            "on-abort" => Ok(Self::OnAbort),
            "always" => Ok(Self::Always),
            _ => Err(UnknownVariant {
                kind: "restart condition",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind}: `{value}`")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restart_condition_defaults_to_on_failure() {
        assert_eq!(RestartCondition::default(), RestartCondition::OnFailure);
        assert_eq!(RestartCondition::default().to_string(), "on-failure");
    }

    #[test]
    fn parse_and_display_agree() {
        for daemon in ["simple", "forking", "oneshot", "dbus", "notify"] {
            assert_eq!(DaemonType::from_str(daemon).unwrap().to_string(), daemon);
        }
        let err = DaemonType::from_str("exotic").unwrap_err();
        assert_eq!(err.to_string(), "Unknown daemon type: `exotic`");
    }

    #[test]
    fn serde_uses_kebab_case() {
        let condition: RestartCondition = serde_json::from_str(r#""on-abnormal""#).unwrap();
        assert_eq!(condition, RestartCondition::OnAbnormal);
        assert_eq!(
            serde_json::to_string(&DaemonType::Oneshot).unwrap(),
            r#""oneshot""#
        );
    }
}
