use thiserror::Error;

/// Top-level error type for the `loxhook-api` crate.
///
/// Covers every failure mode of talking to a Miniserver: building the
/// HTTP client, URL construction, transport failures, timeouts, and
/// non-success responses to the reachability probe.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL joining or parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out (connect or read).
    #[error("Request to Miniserver timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    // ── Responses ───────────────────────────────────────────────────
    /// The Miniserver answered with a non-success status.
    #[error("Miniserver responded with status code {status} for {url}")]
    Status { status: u16, url: String },
}

impl Error {
    /// Returns `true` if the request ran into the configured timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Transport(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Returns `true` if the Miniserver could not be reached at all.
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_connect())
    }
}
