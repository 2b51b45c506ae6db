// ── Core error types ──
//
// Load-time errors (`ControlError`) abort startup. Request-time errors
// (`CommandError`, `AuthError`) are values the HTTP layer turns into a
// status code; none of them ever panics a request worker.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failure to load or validate control definitions.
#[derive(Debug, Error)]
pub enum ControlError {
    // ── Discovery / parsing ──────────────────────────────────────────
    #[error("Cannot read control definitions from {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot walk control definitions directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error(
        "Searching for control files in {} took longer than {}s, the directory tree is too large",
        dir.display(),
        budget.as_secs()
    )]
    WalkTimeout { dir: PathBuf, budget: Duration },

    #[error("Invalid control definition file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },

    // ── Collisions ───────────────────────────────────────────────────
    #[error("Control '{name}' is defined more than once (again in {})", path.display())]
    DuplicateControl { name: String, path: PathBuf },

    #[error("Credential '{name}' is defined more than once with different secrets (again in {})", path.display())]
    DuplicateCredential { name: String, path: PathBuf },

    #[error("Credentials '{first}' and '{second}' share the same secret")]
    DuplicateSecret { first: String, second: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid control name: {name}")]
    InvalidControlName { name: String },

    #[error("Invalid category for control '{control}': {category}")]
    InvalidCategory { control: String, category: String },

    #[error("Invalid id for control '{control}': {id} (must be a positive integer)")]
    InvalidId { control: String, id: i64 },

    #[error("Invalid command for category {category}: {command}")]
    InvalidCommand { category: String, command: String },

    #[error("Invalid credential: {name}")]
    InvalidCredential { name: String },
}

/// A request-time command that is not part of the category's vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown command for {category}: {command}")]
pub struct CommandError {
    pub category: &'static str,
    pub command: String,
}

/// Authorization denial.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Unknown credential")]
    UnknownCredential,

    #[error("Credential '{credential}' is not valid for control '{control}'")]
    CredentialNotValidForControl { credential: String, control: String },

    #[error("Command '{command}' is not allowed on control '{control}'")]
    CommandNotAllowed { command: String, control: String },
}
