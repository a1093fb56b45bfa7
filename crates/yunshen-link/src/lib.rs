//! # yunshen-link
//!
//! The contract between the YunShen runtime host and the game-protocol
//! client it drives. The host never speaks the game protocol itself; it
//! consumes named [`Event`]s and calls back through a [`Connection`].
//!
//! Two connectors ship with the crate:
//!
//! - [`jsonl::JsonLinesConnector`] bridges to an external protocol sidecar
//!   over newline-delimited JSON (feature `tcp`, on by default).
//! - [`memory::MemoryConnector`] is an in-process scripted peer for tests
//!   and demos.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod connection;
pub mod error;
pub mod event;
#[cfg(feature = "tcp")]
pub mod jsonl;
pub mod memory;

pub use self::connection::{AuthMode, ConnectOptions, Connection, Connector, EventStream, Link};
pub use self::error::LinkError;
pub use self::event::Event;
