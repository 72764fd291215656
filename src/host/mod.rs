//! Binding to the assistant host's HTTP API.

pub mod client;
pub mod ephemeral;

pub use client::{DEFAULT_SERVER_URL, HostClient, SessionClient};
pub use ephemeral::EphemeralSessionGenerator;
