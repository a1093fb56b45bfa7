//! Integration test common infrastructure.
//!
//! Runs a real [`Supervisor`](yunshen::supervisor::Supervisor) against the
//! in-memory connector so tests can play the server side of each connection.

pub mod host;

#[allow(unused_imports)]
pub use host::{TestHost, quiet_config};
