use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::{AppInfo, DaemonType};

static VALID_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9](?:-?[a-zA-Z0-9])*$").unwrap());

/// The characters allowed in the commands of an app.
static VALID_COMMAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9/. _#:$-]*$").unwrap());

static VALID_BUS_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_-][A-Za-z0-9_-]*(?:\.[A-Za-z_-][A-Za-z0-9_-]*)+$").unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid app name: `{0}`")]
    InvalidAppName(String),
    #[error("App `{0}` does not declare a command")]
    MissingCommand(String),
    #[error("App `{app}` has a `{field}` with invalid characters: `{command}`")]
    InvalidCommand {
        app: String,
        field: &'static str,
        command: String,
    },
    #[error("App `{0}` is a `dbus` daemon but does not declare a bus name")]
    MissingBusName(String),
    #[error("App `{app}` has an invalid bus name: `{bus_name}`")]
    InvalidBusName { app: String, bus_name: String },
    #[error("App `{0}` declares sockets but is not a service")]
    SocketsWithoutDaemon(String),
    #[error("App `{app}` has an invalid socket name: `{socket}`")]
    InvalidSocketName { app: String, socket: String },
    #[error("Socket `{socket}` of app `{app}` is declared under the name `{declared}`")]
    SocketNameMismatch {
        app: String,
        socket: String,
        declared: String,
    },
    #[error("Socket `{socket}` of app `{app}` does not declare a listen-stream")]
    MissingListenStream { app: String, socket: String },
    #[error("Socket `{socket}` of app `{app}` has an invalid socket mode: {mode:#o}")]
    InvalidSocketMode {
        app: String,
        socket: String,
        mode: u32,
    },
    #[error("App `{0}` cannot be ordered relative to itself")]
    SelfOrdering(String),
}

/// Validate the structure of an app before anything is rendered or written for it.
pub fn validate_app(app: &AppInfo) -> Result<(), ValidationError> {
    if !VALID_NAME.is_match(&app.name) {
        return Err(ValidationError::InvalidAppName(app.name.clone()));
    }

    if app.command.trim().is_empty() {
        return Err(ValidationError::MissingCommand(app.name.clone()));
    }
    let commands = [
        ("command", Some(&app.command)),
        ("stop-command", app.stop_command.as_ref()),
        ("reload-command", app.reload_command.as_ref()),
        ("post-stop-command", app.post_stop_command.as_ref()),
    ];
    for (field, command) in commands {
        let Some(command) = command else {
            continue;
        };
        if !VALID_COMMAND.is_match(command) {
            return Err(ValidationError::InvalidCommand {
                app: app.name.clone(),
                field,
                command: command.clone(),
            });
        }
    }

    match (&app.daemon, &app.bus_name) {
        (Some(DaemonType::Dbus), None) => {
            return Err(ValidationError::MissingBusName(app.name.clone()));
        }
        (_, Some(bus_name)) if !VALID_BUS_NAME.is_match(bus_name) => {
            return Err(ValidationError::InvalidBusName {
                app: app.name.clone(),
                bus_name: bus_name.clone(),
            });
        }
        _ => {}
    }

    if !app.sockets.is_empty() && !app.is_service() {
        return Err(ValidationError::SocketsWithoutDaemon(app.name.clone()));
    }
    for (name, socket) in &app.sockets {
        if !VALID_NAME.is_match(name) {
            return Err(ValidationError::InvalidSocketName {
                app: app.name.clone(),
                socket: name.clone(),
            });
        }
        if socket.name != *name {
            return Err(ValidationError::SocketNameMismatch {
                app: app.name.clone(),
                socket: socket.name.clone(),
                declared: name.clone(),
            });
        }
        if socket.listen_stream.trim().is_empty() {
            return Err(ValidationError::MissingListenStream {
                app: app.name.clone(),
                socket: name.clone(),
            });
        }
        if let Some(mode) = socket.socket_mode {
            if mode > 0o7777 {
                return Err(ValidationError::InvalidSocketMode {
                    app: app.name.clone(),
                    socket: name.clone(),
                    mode,
                });
            }
        }
    }

    if app.before.contains(&app.name) || app.after.contains(&app.name) {
        return Err(ValidationError::SelfOrdering(app.name.clone()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SocketInfo;

    #[test]
    fn accepts_plain_service() {
        let app = AppInfo::service("svc", "bin/svc --port 8080", DaemonType::Simple);
        assert_eq!(validate_app(&app), Ok(()));
    }

    #[test]
    fn rejects_missing_command() {
        let app = AppInfo::service("svc", "", DaemonType::Simple);
        assert_eq!(
            validate_app(&app),
            Err(ValidationError::MissingCommand("svc".to_string()))
        );
    }

    #[test]
    fn rejects_shell_metacharacters() {
        let mut app = AppInfo::service("svc", "bin/svc", DaemonType::Simple);
        app.stop_command = Some("bin/stop; rm -rf /".to_string());
        let err = validate_app(&app).unwrap_err();
        assert_eq!(
            err.to_string(),
            "App `svc` has a `stop-command` with invalid characters: `bin/stop; rm -rf /`"
        );
    }

    #[test]
    fn rejects_invalid_names() {
        for name in ["", "-svc", "svc-", "s--vc", "sv c"] {
            let app = AppInfo::service(name, "bin/svc", DaemonType::Simple);
            assert_eq!(
                validate_app(&app),
                Err(ValidationError::InvalidAppName(name.to_string())),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn dbus_requires_bus_name() {
        let mut app = AppInfo::service("bus", "bin/bus", DaemonType::Dbus);
        assert_eq!(
            validate_app(&app),
            Err(ValidationError::MissingBusName("bus".to_string()))
        );
        app.bus_name = Some("org.example.Hello".to_string());
        assert_eq!(validate_app(&app), Ok(()));
        app.bus_name = Some("nodots".to_string());
        assert!(matches!(
            validate_app(&app),
            Err(ValidationError::InvalidBusName { .. })
        ));
    }

    #[test]
    fn sockets_require_a_daemon() {
        let app = AppInfo::new("cli", "bin/cli").with_socket(SocketInfo::new("sock", "80"));
        assert_eq!(
            validate_app(&app),
            Err(ValidationError::SocketsWithoutDaemon("cli".to_string()))
        );
    }

    #[test]
    fn sockets_are_checked() {
        let app = AppInfo::service("svc", "bin/svc", DaemonType::Simple)
            .with_socket(SocketInfo::new("sock", " "));
        assert!(matches!(
            validate_app(&app),
            Err(ValidationError::MissingListenStream { .. })
        ));

        let app = AppInfo::service("svc", "bin/svc", DaemonType::Simple)
            .with_socket(SocketInfo::new("sock", "80").with_mode(0o17777));
        assert_eq!(
            validate_app(&app).unwrap_err().to_string(),
            "Socket `sock` of app `svc` has an invalid socket mode: 0o17777"
        );
    }

    #[test]
    fn socket_names_match_their_keys() {
        let mut app = AppInfo::service("svc", "bin/svc", DaemonType::Simple);
        app.sockets
            .insert("http".to_string(), SocketInfo::new("admin", "8080"));
        assert_eq!(
            validate_app(&app).unwrap_err().to_string(),
            "Socket `admin` of app `svc` is declared under the name `http`"
        );
    }

    #[test]
    fn rejects_self_ordering() {
        let mut app = AppInfo::service("svc", "bin/svc", DaemonType::Simple);
        app.after = vec!["svc".to_string()];
        assert_eq!(
            validate_app(&app),
            Err(ValidationError::SelfOrdering("svc".to_string()))
        );
    }
}
