//! Plugin registry and selection.
//!
//! Plugin implementations live elsewhere; this layer only resolves names to
//! opaque handles. The registry is an ordered list and resolution is
//! first-match-wins, so registration order is observable.

use crate::attr::AttributeStore;
use crate::error::{Error, Result};
use crate::graph::GraphDoc;
use crate::options::Invocation;
use serde::Serialize;
use std::fmt;

/// Provenance name of the plugin-inventory pseudo-graph.
pub const INTERNAL_SOURCE: &str = "<internal>";

/// Device selected when no `-T` flag was given.
pub const DEFAULT_DEVICE: &str = "json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginKind {
    Layout,
    Device,
    Library,
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PluginKind::Layout => "layout",
            PluginKind::Device => "device",
            PluginKind::Library => "library",
        };
        f.write_str(name)
    }
}

/// Opaque resolved plugin: the downstream renderer interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginHandle {
    pub kind: PluginKind,
    pub name: String,
}

#[derive(Debug, Clone)]
struct PluginEntry {
    kind: PluginKind,
    name: String,
}

#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    entries: Vec<PluginEntry>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: PluginKind, name: impl Into<String>) {
        self.entries.push(PluginEntry {
            kind,
            name: name.into(),
        });
    }

    /// The plugins compiled into this build.
    pub fn builtin() -> Self {
        let mut reg = Self::new();
        reg.add(PluginKind::Layout, "layered");
        reg.add(PluginKind::Layout, "radial");
        reg.add(PluginKind::Layout, "spring");
        reg.add(PluginKind::Device, "json");
        reg.add(PluginKind::Device, "plain");
        reg
    }

    pub fn resolve(&self, kind: PluginKind, name: &str) -> Option<PluginHandle> {
        let found = self
            .entries
            .iter()
            .find(|e| e.kind == kind && e.name == name);
        tracing::debug!(kind = %kind, name, found = found.is_some(), "plugin lookup");
        found.map(|e| PluginHandle {
            kind: e.kind,
            name: e.name.clone(),
        })
    }

    /// Names available for a kind, in registration order. The filter is the
    /// name that failed to resolve; it is currently informational only.
    pub fn available(&self, kind: PluginKind, _name_filter: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.name.as_str())
            .collect()
    }
}

/// Command-name variants that select the canonical default engine.
///
/// The variants cover historical packaging conventions (static and builtin
/// builds, libtool wrappers) plus the empty basename some host launchers
/// produce. Kept as data so the set can evolve without touching the
/// selection logic.
#[derive(Debug, Clone)]
pub struct EngineAliases {
    pub canonical: String,
    pub variants: Vec<String>,
}

impl Default for EngineAliases {
    fn default() -> Self {
        let canonical = "layered".to_string();
        let variants = [
            "grayling",
            "grayling-cli",
            "layered_static",
            "layered_builtins",
            "lt-layered",
            "lt-layered_builtins",
            "",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();
        Self { canonical, variants }
    }
}

impl EngineAliases {
    /// Maps a command basename to an engine name.
    pub fn engine_for<'a>(&'a self, cmd_name: &'a str) -> &'a str {
        if self.variants.iter().any(|v| v == cmd_name) {
            &self.canonical
        } else {
            cmd_name
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PluginSelection {
    pub engine: PluginHandle,
    pub device: PluginHandle,
}

/// Resolves the layout engine and output device for an invocation.
///
/// Engine fallback: an explicit `-K` name is resolved as-is; otherwise the
/// command basename is mapped through the alias table and resolved. Either
/// path fails fatally with a diagnostic listing the alternatives. The device
/// falls back to [`DEFAULT_DEVICE`]; failure to resolve even that is
/// reported as a registry-configuration problem rather than a bad request.
pub fn select_plugins(
    registry: &PluginRegistry,
    invocation: &Invocation,
    aliases: &EngineAliases,
) -> Result<PluginSelection> {
    let engine_name = match invocation.engine.as_deref() {
        Some(name) => name,
        None => aliases.engine_for(&invocation.cmd_name),
    };
    let engine = registry
        .resolve(PluginKind::Layout, engine_name)
        .ok_or_else(|| engine_not_found(registry, engine_name))?;

    let device = match invocation.format.as_deref() {
        Some(name) => registry
            .resolve(PluginKind::Device, name)
            .ok_or_else(|| format_not_recognized(registry, name))?,
        None => registry
            .resolve(PluginKind::Device, DEFAULT_DEVICE)
            .ok_or_else(|| Error::PluginResolution {
                message: format!(
                    "Unable to find even the default \"-T{DEFAULT_DEVICE}\" device. Has the plugin registry for this build been configured?"
                ),
            })?,
    };

    Ok(PluginSelection { engine, device })
}

fn engine_not_found(registry: &PluginRegistry, name: &str) -> Error {
    let mut message = format!("There is no layout engine support for \"{name}\"\n");
    let available = registry.available(PluginKind::Layout, name);
    if available.is_empty() {
        message.push_str("No layout engines found. Has the plugin registry for this build been configured?");
    } else {
        message.push_str(&format!("Use one of: {}", available.join(" ")));
    }
    Error::PluginResolution { message }
}

fn format_not_recognized(registry: &PluginRegistry, name: &str) -> Error {
    let mut message = format!("Format: \"{name}\" not recognized.");
    let available = registry.available(PluginKind::Device, name);
    if available.is_empty() {
        message.push_str(
            " No output devices found. Has the plugin registry for this build been configured?",
        );
    } else {
        message.push_str(&format!(" Use one of: {}", available.join(" ")));
    }
    Error::PluginResolution { message }
}

/// Builds the `-P` pseudo-graph: a degenerate document describing the
/// registry contents, to be injected into the graph stream exactly once.
pub fn inventory_graph(registry: &PluginRegistry) -> GraphDoc {
    let mut label = String::from("plugins");
    for kind in [PluginKind::Layout, PluginKind::Device, PluginKind::Library] {
        let names = registry.available(kind, "");
        if !names.is_empty() {
            label.push_str(&format!("\n{kind}: {}", names.join(" ")));
        }
    }
    let mut attrs = AttributeStore::new();
    attrs.set("label", label);
    attrs.set("rankdir", "LR");
    GraphDoc {
        name: "plugins".to_string(),
        directed: true,
        strict: false,
        attrs,
        subgraphs: Vec::new(),
    }
}
