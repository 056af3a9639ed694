//! The closed set of plugin types a bundle's routing metadata can describe.

use std::fmt;
use std::str::FromStr;

/// A plugin type, spanning the documentable core types, the other core
/// types, and the extension-runtime (EDA) types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PluginType {
    Become,
    Cache,
    Callback,
    Cliconf,
    Connection,
    Filter,
    Httpapi,
    Inventory,
    Lookup,
    Module,
    Netconf,
    Shell,
    Strategy,
    Test,
    Vars,
    Action,
    ModuleUtils,
    PluginUtils,
    DocFragments,
    EdaEventFilter,
    EdaEventSource,
}

impl PluginType {
    /// The documentable core plugin types.
    pub const DOCUMENTABLE: &'static [PluginType] = &[
        PluginType::Become,
        PluginType::Cache,
        PluginType::Callback,
        PluginType::Cliconf,
        PluginType::Connection,
        PluginType::Filter,
        PluginType::Httpapi,
        PluginType::Inventory,
        PluginType::Lookup,
        PluginType::Module,
        PluginType::Netconf,
        PluginType::Shell,
        PluginType::Strategy,
        PluginType::Test,
        PluginType::Vars,
    ];

    /// The "other" core plugin types (not independently documented).
    pub const OTHER_CORE: &'static [PluginType] = &[
        PluginType::Action,
        PluginType::ModuleUtils,
        PluginType::PluginUtils,
        PluginType::DocFragments,
    ];

    /// The extension-runtime (EDA) plugin types.
    pub const EDA: &'static [PluginType] = &[PluginType::EdaEventFilter, PluginType::EdaEventSource];

    /// All plugin types.
    pub fn all() -> impl Iterator<Item = PluginType> {
        Self::DOCUMENTABLE
            .iter()
            .chain(Self::OTHER_CORE)
            .chain(Self::EDA)
            .copied()
    }

    pub fn is_eda(self) -> bool {
        matches!(self, PluginType::EdaEventFilter | PluginType::EdaEventSource)
    }

    /// The canonical metadata label for this type (what appears under
    /// `plugin_routing` after alias resolution).
    pub fn label(self) -> &'static str {
        match self {
            PluginType::Become => "become",
            PluginType::Cache => "cache",
            PluginType::Callback => "callback",
            PluginType::Cliconf => "cliconf",
            PluginType::Connection => "connection",
            PluginType::Filter => "filter",
            PluginType::Httpapi => "httpapi",
            PluginType::Inventory => "inventory",
            PluginType::Lookup => "lookup",
            PluginType::Module => "module",
            PluginType::Netconf => "netconf",
            PluginType::Shell => "shell",
            PluginType::Strategy => "strategy",
            PluginType::Test => "test",
            PluginType::Vars => "vars",
            PluginType::Action => "action",
            PluginType::ModuleUtils => "module_utils",
            PluginType::PluginUtils => "plugin_utils",
            PluginType::DocFragments => "doc_fragments",
            PluginType::EdaEventFilter => "eda_event_filter",
            PluginType::EdaEventSource => "eda_event_source",
        }
    }

    /// Resolves a raw metadata label to a canonical plugin type, applying
    /// the `modules` -> `module` alias. Returns `None` for an unrecognized
    /// (ignored) label.
    pub fn from_label(label: &str) -> Option<PluginType> {
        if label == "modules" {
            return Some(PluginType::Module);
        }
        Self::all().find(|t| t.label() == label)
    }
}

impl fmt::Display for PluginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PluginType {
    type Err = UnknownPluginLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PluginType::from_label(s).ok_or_else(|| UnknownPluginLabel(s.to_string()))
    }
}

/// Returned when a metadata label does not correspond to any known plugin
/// type (and is not the `modules` alias).
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown plugin type label '{0}'")]
pub struct UnknownPluginLabel(pub String);
