//! Unified error handling for the YunShen runtime host.
//!
//! Every failure is contained at the boundary of the unit, handler or
//! command that produced it. Only [`ConnectionFailure`] with auto-reconnect
//! disabled ever reaches the binary.

use thiserror::Error;
use yunshen_link::LinkError;

// ============================================================================
// Registry Errors
// ============================================================================

/// Errors returned by registry lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("no such unit: {0}")]
    NotFound(String),
}

impl RegistryError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
        }
    }
}

// ============================================================================
// Load Errors (manifest candidates)
// ============================================================================

/// Why a manifest candidate could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("candidate {0} has an empty name")]
    MissingName(String),

    #[error("candidate {source_key} failed to build: {reason}")]
    Factory { source_key: String, reason: String },

    #[error("candidate {source_key} panicked while building")]
    Panicked { source_key: String },

    #[error("{0} failed to initialise: {1}")]
    Init(String, #[source] HookError),
}

impl LoadError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingName(_) => "missing_name",
            Self::Factory { .. } => "factory_failed",
            Self::Panicked { .. } => "factory_panicked",
            Self::Init(..) => "init_failed",
        }
    }
}

// ============================================================================
// Hook Errors (lifecycle transitions)
// ============================================================================

/// Failure raised by a unit's `init`, `on_enable` or `on_disable` hook.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("{0}")]
    Failed(String),

    #[error("hook panicked")]
    Panicked,

    #[error(transparent)]
    Link(#[from] LinkError),
}

impl HookError {
    /// Shorthand for a failure with a message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Failed(_) => "hook_failed",
            Self::Panicked => "hook_panicked",
            Self::Link(_) => "link_error",
        }
    }
}

// ============================================================================
// Dispatch Errors (event handlers)
// ============================================================================

/// Failure raised by an event handler.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{0}")]
    Failed(String),

    #[error("handler panicked")]
    Panicked,

    #[error("missing or malformed argument {0}")]
    BadArgument(usize),

    #[error(transparent)]
    Link(#[from] LinkError),
}

impl DispatchError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Failed(_) => "handler_failed",
            Self::Panicked => "handler_panicked",
            Self::BadArgument(_) => "bad_argument",
            Self::Link(_) => "link_error",
        }
    }
}

// ============================================================================
// Command Errors
// ============================================================================

/// Failure raised by a command handler.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("usage: {0}")]
    Usage(String),

    #[error("{0}")]
    Failed(String),

    #[error("command panicked")]
    Panicked,

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Link(#[from] LinkError),
}

impl CommandError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Usage(_) => "usage",
            Self::Failed(_) => "command_failed",
            Self::Panicked => "command_panicked",
            Self::Registry(e) => e.error_code(),
            Self::Link(_) => "link_error",
        }
    }
}

/// Result type for command handlers.
pub type CommandResult = Result<(), CommandError>;

// ============================================================================
// Connection Errors (supervisor)
// ============================================================================

/// A connection attempt that never reached the ready state.
#[derive(Debug, Error)]
pub enum ConnectionFailure {
    #[error("connect failed: {0}")]
    Connect(#[from] LinkError),

    #[error("no ready signal within {0:?}")]
    ReadyTimeout(std::time::Duration),

    #[error("connection terminated before ready: {0}")]
    TerminatedEarly(String),
}

impl ConnectionFailure {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Connect(_) => "connect_failed",
            Self::ReadyTimeout(_) => "ready_timeout",
            Self::TerminatedEarly(_) => "terminated_early",
        }
    }
}
