use std::fmt::Write;
use std::path::Path;

/// Escape a path for use in a unit name, like `systemd-escape --path`.
///
/// For example, `/snap/hello-world/42` becomes `snap-hello\x2dworld-42`.
pub fn escape_unit_path(path: &Path) -> String {
    let path = path.to_string_lossy();
    let components: Vec<&str> = path.split('/').filter(|part| !part.is_empty()).collect();
    if components.is_empty() {
        return "-".to_string();
    }

    let mut escaped = String::with_capacity(path.len());
    for (index, byte) in components.join("/").bytes().enumerate() {
        match byte {
            b'/' => escaped.push('-'),
            b'.' if index == 0 => {
                let _ = write!(escaped, "\\x{byte:02x}");
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b':' | b'_' | b'.' => {
                escaped.push(char::from(byte));
            }
            _ => {
                let _ = write!(escaped, "\\x{byte:02x}");
            }
        }
    }
    escaped
}

/// The name of the mount unit for `dir`, e.g., `snap-hello-42.mount` for `/snap/hello/42`.
pub fn mount_unit_name(dir: &Path) -> String {
    format!("{}.mount", escape_unit_path(dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_paths() {
        assert_eq!(escape_unit_path(Path::new("/snap/hello/42")), "snap-hello-42");
        assert_eq!(
            escape_unit_path(Path::new("/snap/hello-world/x1")),
            r"snap-hello\x2dworld-x1"
        );
        assert_eq!(escape_unit_path(Path::new("//var//lib/")), "var-lib");
        assert_eq!(escape_unit_path(Path::new("/.hidden/a b")), r"\x2ehidden-a\x20b");
        assert_eq!(escape_unit_path(Path::new("/")), "-");
    }

    #[test]
    fn mount_units() {
        assert_eq!(
            mount_unit_name(Path::new("/snap/hello/42")),
            "snap-hello-42.mount"
        );
    }
}
