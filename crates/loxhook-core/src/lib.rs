//! Decision logic between the webhook front end and the Miniserver.
//!
//! - **[`Registry`]** loads control definitions from a directory tree,
//!   merges them, and validates the whole set once at startup.
//! - **[`authorize`]** decides whether a presented secret may run a
//!   command on a control.
//! - **[`translate`]** turns an authorized command into the Miniserver
//!   web service path.
//! - **[`RateLimiter`]** is the GCRA limiter gating admission to the
//!   authorization path.
//!
//! Everything except the rate limiter is immutable after load and is
//! shared by request workers without locking.

pub mod authorize;
pub mod command;
pub mod error;
pub mod model;
pub mod rate_limit;
pub mod registry;

// ── Primary re-exports ──────────────────────────────────────────────
pub use authorize::authorize;
pub use command::{AllowedCommand, DviAction, DviCommand, VIRTUAL_INPUT_BASE_PATH, translate};
pub use error::{AuthError, CommandError, ControlError};
pub use model::{Category, Control, CredentialTable};
pub use rate_limit::{Quota, RateLimiter};
pub use registry::{DefinitionFile, Definitions, Registry};
