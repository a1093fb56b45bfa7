//! Bundled modules and plugins.

mod auto_responder;

pub use auto_responder::AutoResponder;

use crate::context::HostContext;
use crate::registry::{Manifest, Unit};

/// Modules loaded on every session (the command router is added separately).
pub fn module_manifest() -> Manifest<Box<dyn Unit>> {
    Manifest::new()
}

/// Plugins, each subject to its `[plugins]` override.
pub fn plugin_manifest() -> Manifest<Box<dyn Unit>> {
    Manifest::new().with("plugins/auto_responder", |host: &HostContext| {
        Box::new(AutoResponder::new(host.config.auto_responder.clone())) as Box<dyn Unit>
    })
}
