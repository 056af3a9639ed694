//! Loader and whole-catalog resolver for namespaced plugin bundle routing
//! metadata: given a bundle's `plugin_routing` document, resolve every
//! plugin's redirect chain to its terminal target, cycle, dead-end, or
//! tombstone, accumulating deprecation history along the way.

pub mod collector;
pub mod config;
pub mod directory;
pub mod discovery;
pub mod document;
pub mod error;
pub mod fqn;
pub mod inventory;
pub mod loader;
pub mod plugin_type;
pub mod removal;
pub mod resolver;
pub mod routing;

pub use error::{CatalogError, Result};
pub use fqn::{BundleFqn, Fqn};
pub use plugin_type::PluginType;
pub use routing::{Catalog, PluginRouting, Redirect};
