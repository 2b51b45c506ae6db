// Transport configuration for building the Miniserver `reqwest::Client`.
//
// The configured timeout bounds both connection setup and the whole
// request, so a stalled Miniserver never holds a request worker longer
// than one timeout period.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::Error;

/// HTTP Basic credentials for the Miniserver.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

/// Transport configuration for the Miniserver client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub credentials: Credentials,
}

impl TransportConfig {
    pub fn new(timeout: Duration, credentials: Credentials) -> Self {
        Self {
            timeout,
            credentials,
        }
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .user_agent(concat!("loxhook/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::ClientBuild(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_client_with_timeout() {
        let config = TransportConfig::new(
            Duration::from_secs(2),
            Credentials::new("admin", SecretString::from("admin".to_string())),
        );
        assert!(config.build_client().is_ok());
        assert_eq!(config.credentials.username, "admin");
    }
}
