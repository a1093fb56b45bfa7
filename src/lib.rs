//! YunShen - a runtime host for a game-playing chat agent.
//!
//! The host keeps one connection to a game server alive, routes its events
//! through a [`events::Dispatcher`], turns prefixed chat lines into
//! [`commands::Command`] invocations, and lets independently developed
//! [`registry::Unit`]s be enabled and disabled at runtime.
//!
//! The protocol client itself lives behind the [`yunshen_link::Connector`]
//! trait; the binary uses the JSON-lines sidecar bridge.

pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod http;
pub mod metrics;
pub mod modules;
pub mod registry;
pub mod supervisor;
pub mod telemetry;

pub use yunshen_link;
