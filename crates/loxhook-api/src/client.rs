// Miniserver HTTP client
//
// Wraps `reqwest::Client` with Miniserver-specific URL construction and
// error classification. Every call is a single attempt: timeouts and
// connection failures are returned to the caller, never retried here.

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use secrecy::ExposeSecret;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::{Credentials, TransportConfig};

/// Lightweight endpoint answered by every Miniserver, used as a liveness probe.
pub const PROBE_PATH: &str = "/jdev/cfg/api";

/// A response received from the Miniserver, ready to be forwarded.
#[derive(Debug, Clone)]
pub struct MiniserverResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// Raw HTTP client for the Miniserver web services.
pub struct MiniserverClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    timeout_secs: u64,
}

impl MiniserverClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the Miniserver root (e.g. `http://192.168.1.2:80`);
    /// request paths replace whatever path it carries.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(
            http,
            base_url,
            transport.credentials.clone(),
            transport.timeout.as_secs(),
        ))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        credentials: Credentials,
        timeout_secs: u64,
    ) -> Self {
        Self {
            http,
            base_url,
            credentials,
            timeout_secs,
        }
    }

    /// The Miniserver base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build a full URL for an absolute Miniserver path.
    pub fn url_for(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    /// Check that the Miniserver is reachable and answers with a 2xx status.
    pub async fn probe(&self) -> Result<(), Error> {
        let url = self.url_for(PROBE_PATH)?;
        debug!(%url, "probing miniserver");
        let resp = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(())
    }

    /// POST a command path to the Miniserver and return its response.
    ///
    /// Any HTTP status is returned as-is; only transport failures and
    /// timeouts are errors.
    pub async fn send_command(&self, path: &str) -> Result<MiniserverResponse, Error> {
        let url = self.url_for(path)?;
        debug!(%url, "sending command to miniserver");
        let resp = self
            .http
            .post(url)
            .basic_auth(
                &self.credentials.username,
                Some(self.credentials.password.expose_secret()),
            )
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = resp.bytes().await.map_err(|e| self.classify(e))?;
        trace!(status, bytes = body.len(), "miniserver responded");

        Ok(MiniserverResponse {
            status,
            content_type,
            body,
        })
    }

    fn classify(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            Error::Transport(err)
        }
    }
}
