// ── Semantic checks ──
//
// Run after conversion. Each check fails fast with its own error variant.

use std::net::ToSocketAddrs;
use std::path::Path;

use loxhook_core::registry::{WALK_BUDGET, definition_files};

use crate::ConfigError;

/// Highest accepted listen port.
const MAX_LISTEN_PORT: i64 = 65534;

pub fn validate_listen_port(port: i64) -> Result<u16, ConfigError> {
    if !(1..=MAX_LISTEN_PORT).contains(&port) {
        return Err(ConfigError::InvalidPort { port });
    }
    u16::try_from(port).map_err(|_| ConfigError::InvalidPort { port })
}

/// DNS hostname grammar: dot-separated labels of letters, digits and
/// inner hyphens.
pub fn is_valid_hostname(host: &str) -> bool {
    !host.is_empty() && host.split('.').all(is_valid_label)
}

fn is_valid_label(label: &str) -> bool {
    let bytes = label.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(first), Some(last)) => {
            first.is_ascii_alphanumeric()
                && last.is_ascii_alphanumeric()
                && bytes.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'-')
        }
        _ => false,
    }
}

/// Check grammar, reject URL schemes, then require a name lookup to succeed.
pub fn validate_hostname(host: &str) -> Result<(), ConfigError> {
    if !is_valid_hostname(host) {
        let lower = host.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Err(ConfigError::HostnameHasScheme {
                hostname: host.to_owned(),
            });
        }
        return Err(ConfigError::InvalidHostname {
            hostname: host.to_owned(),
        });
    }

    (host, 0u16)
        .to_socket_addrs()
        .map(|_| ())
        .map_err(|source| ConfigError::HostnameLookup {
            hostname: host.to_owned(),
            source,
        })
}

/// The controls directory must exist and hold at least one definition file.
pub fn validate_controls_dir(dir: &Path) -> Result<(), ConfigError> {
    let meta = std::fs::metadata(dir).map_err(|source| ConfigError::ControlsDir {
        path: dir.to_path_buf(),
        source,
    })?;
    if !meta.is_dir() {
        return Err(ConfigError::ControlsNotDir {
            path: dir.to_path_buf(),
        });
    }

    if definition_files(dir, WALK_BUDGET)?.is_empty() {
        return Err(ConfigError::NoDefinitionFiles {
            path: dir.to_path_buf(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn port_bounds() {
        assert_eq!(validate_listen_port(1).unwrap(), 1);
        assert_eq!(validate_listen_port(65534).unwrap(), 65534);
        assert!(validate_listen_port(0).is_err());
        assert!(validate_listen_port(65535).is_err());
    }

    #[test]
    fn hostname_grammar() {
        for ok in ["localhost", "home.example.com", "a", "my-home.example.com", "10.0.0.1"] {
            assert!(is_valid_hostname(ok), "{ok}");
        }
        for bad in ["", "-lead.example.com", "trail-.example.com", "a..b", "under_score.com", "sp ace"] {
            assert!(!is_valid_hostname(bad), "{bad}");
        }
    }

    #[test]
    fn scheme_prefix_has_its_own_error() {
        for host in ["http://home.example.com", "HTTPS://home.example.com"] {
            let err = validate_hostname(host).unwrap_err();
            assert!(matches!(err, ConfigError::HostnameHasScheme { .. }), "{host}");
        }
        let err = validate_hostname("bad_host").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHostname { .. }));
    }

    #[test]
    fn localhost_resolves() {
        validate_hostname("localhost").unwrap();
    }

    #[test]
    fn controls_dir_checks() {
        let tmp = tempfile::tempdir().unwrap();

        let err = validate_controls_dir(&tmp.path().join("missing")).unwrap_err();
        assert!(matches!(err, ConfigError::ControlsDir { .. }), "{err:?}");

        let err = validate_controls_dir(tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::NoDefinitionFiles { .. }), "{err:?}");

        let file = tmp.path().join("notes.txt");
        std::fs::write(&file, "x").unwrap();
        let err = validate_controls_dir(&file).unwrap_err();
        assert!(matches!(err, ConfigError::ControlsNotDir { .. }), "{err:?}");

        std::fs::create_dir(tmp.path().join("sub")).unwrap();
        std::fs::write(tmp.path().join("sub/door.toml"), "").unwrap();
        validate_controls_dir(tmp.path()).unwrap();
    }
}
