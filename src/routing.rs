//! The plugin routing data model: per-plugin resolver state, per-bundle
//! routing tables, and the catalog of all bundles.

use crate::fqn::{BundleFqn, Fqn};
use crate::plugin_type::PluginType;
use crate::removal::RemovalRecord;
use indexmap::IndexMap;

/// A redirect target, replacing the upstream sentinel (`...`) used to mark
/// "this plugin's redirect chain terminated in a cycle" with a proper
/// algebraic variant.
///
/// The target is stored as a raw string rather than a parsed [`Fqn`]: a
/// redirect is only required to be a string at load time, and whether it is
/// actually shaped like an FQN (and, if so, whether that bundle exists) is
/// determined during resolution, not loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    /// No redirect configured.
    None,
    /// The redirect chain starting here loops back on itself.
    Cycle,
    /// A concrete redirect target, as written in the metadata.
    Target(String),
}

impl Redirect {
    pub fn is_none(&self) -> bool {
        matches!(self, Redirect::None)
    }

    pub fn is_cycle(&self) -> bool {
        matches!(self, Redirect::Cycle)
    }

    pub fn target(&self) -> Option<&str> {
        match self {
            Redirect::Target(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// The resolver state for a single plugin entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PluginRouting {
    /// Only meaningful for `PluginType::Module` entries.
    pub action_plugin: Option<String>,
    pub redirect: Redirect,
    pub redirect_chain: Option<Vec<Fqn>>,
    pub redirect_deprecations: Option<Vec<(Fqn, RemovalRecord)>>,
    pub redirect_tombstone: bool,
    pub redirect_dead_end: bool,
    pub redirect_error: Option<String>,
    pub deprecation: Option<RemovalRecord>,
    pub tombstone: Option<RemovalRecord>,
}

impl Default for Redirect {
    fn default() -> Self {
        Redirect::None
    }
}

impl PluginRouting {
    /// Whether this entry's chain has already been resolved (or there is
    /// nothing to resolve).
    pub fn is_resolved(&self) -> bool {
        self.redirect.is_none() || self.redirect.is_cycle() || self.redirect_chain.is_some()
    }
}

/// Per-bundle routing table: plugin type to plugin name to routing state.
#[derive(Debug, Clone, Default)]
pub struct BundleRouting {
    pub plugin_data: IndexMap<PluginType, IndexMap<String, PluginRouting>>,
}

impl BundleRouting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, plugin_type: PluginType, plugin: &str) -> Option<&PluginRouting> {
        self.plugin_data.get(&plugin_type)?.get(plugin)
    }

    pub fn get_mut(&mut self, plugin_type: PluginType, plugin: &str) -> Option<&mut PluginRouting> {
        self.plugin_data.get_mut(&plugin_type)?.get_mut(plugin)
    }

    pub fn entry_mapping(&mut self, plugin_type: PluginType) -> &mut IndexMap<String, PluginRouting> {
        self.plugin_data.entry(plugin_type).or_default()
    }
}

/// The whole-catalog map from bundle FQN to its routing table.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub bundles: IndexMap<BundleFqn, BundleRouting>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, bundle: &BundleFqn) -> Option<&BundleRouting> {
        self.bundles.get(bundle)
    }

    pub fn get_mut(&mut self, bundle: &BundleFqn) -> Option<&mut BundleRouting> {
        self.bundles.get_mut(bundle)
    }

    pub fn insert(&mut self, bundle: BundleFqn, routing: BundleRouting) {
        self.bundles.insert(bundle, routing);
    }

    /// Looks up the routing for an arbitrary FQN, if its bundle and plugin
    /// type/name both exist in the catalog.
    pub fn lookup(&self, plugin_type: PluginType, fqn: &Fqn) -> Option<&PluginRouting> {
        self.get(&fqn.bundle_fqn())?.get(plugin_type, fqn.plugin())
    }
}
