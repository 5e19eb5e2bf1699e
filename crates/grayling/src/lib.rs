#![forbid(unsafe_code)]

//! Invocation layer for the grayling graph tools.
//!
//! Takes a raw argument vector to the point where a renderer can run:
//! - resolve arguments into an immutable [`Invocation`]
//! - select a layout engine and output device from the [`PluginRegistry`],
//!   with name-based fallback and diagnostics
//! - stream graph documents out of the input sources, one at a time, with
//!   provenance tracking and partial-failure semantics
//! - initialize each graph's [`LayoutConfig`] from its attributes with
//!   typed coercion and scope-aware defaulting
//!
//! Everything is synchronous and strictly ordered; diagnostics ordering and
//! provenance numbering are part of the observable contract.

pub mod attr;
pub mod diag;
pub mod error;
pub mod graph;
pub mod layout;
pub mod options;
pub mod plugin;
pub mod stream;

pub use attr::{AttrScope, AttributeStore, GlobalDefaults};
pub use diag::{Diagnostics, Suppression};
pub use error::{Error, Result};
pub use graph::{DocScanner, GraphDoc};
pub use layout::{InitContext, LayoutConfig, init_graph_config};
pub use options::{
    HostEnv, Invocation, OutputTarget, Resolved, command_basename, resolve_invocation, usage_text,
    version_banner,
};
pub use plugin::{
    DEFAULT_DEVICE, EngineAliases, INTERNAL_SOURCE, PluginHandle, PluginKind, PluginRegistry,
    PluginSelection, inventory_graph, select_plugins,
};
pub use stream::{GraphHandle, InputGraphStream, STDIN_SOURCE};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Unit conversion constant for attributes expressed in inches.
pub const POINTS_PER_INCH: f64 = 72.0;

#[cfg(test)]
mod tests;
