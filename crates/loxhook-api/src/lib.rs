// loxhook-api: HTTP client for the Loxone Miniserver web services

pub mod client;
pub mod error;
pub mod transport;

pub use client::{MiniserverClient, MiniserverResponse, PROBE_PATH};
pub use error::Error;
pub use transport::{Credentials, TransportConfig};
