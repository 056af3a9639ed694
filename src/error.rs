//! Error types for the catalog loader and resolver.
//!
//! This module defines the error taxonomy used throughout the crate, grouped
//! by the subsystem that raises them.

use thiserror::Error;

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// The crate-wide error type.
#[derive(Error, Debug)]
pub enum CatalogError {
    // ========================================================================
    // Catalog tool discovery errors
    // ========================================================================
    /// The catalog tool could not be queried or its output could not be parsed.
    #[error("Failed to list bundles: {message}")]
    ListingCollectionsFailure {
        /// Description of what went wrong.
        message: String,
    },

    /// The catalog tool is too old to support bundle listing.
    #[error("Catalog tool does not support 'collection list': {message}")]
    Ansible29Failure {
        /// Description of what went wrong.
        message: String,
    },

    // ========================================================================
    // Metadata loader errors
    // ========================================================================
    /// A routing metadata document violated the expected shape.
    #[error("Invalid routing metadata at '{path}' (plugin type '{plugin_type}', plugin '{plugin}'): {message}")]
    MetadataShapeFailure {
        /// Document path where the violation was found (dotted key path).
        path: String,
        /// Plugin type label being parsed when the error occurred.
        plugin_type: String,
        /// Plugin name being parsed when the error occurred.
        plugin: String,
        /// Description of the violation.
        message: String,
    },

    // ========================================================================
    // Bundle inventory errors
    // ========================================================================
    /// The bundle inventory is structurally invalid.
    #[error("Invalid bundle inventory: {0}")]
    CatalogStructureFailure(String),

    // ========================================================================
    // Plugin directory mapping errors
    // ========================================================================
    /// A plugin directory was requested for a type/bundle combination that
    /// does not support it.
    #[error("Plugin type '{plugin_type}' has no known directory in bundle '{bundle}'")]
    UnknownPluginTypeFailure {
        /// The plugin type label.
        plugin_type: String,
        /// The bundle's full name, or "ansible-core" for the core bundle.
        bundle: String,
    },

    // ========================================================================
    // Resolver internal errors
    // ========================================================================
    /// An internal resolver invariant was violated. This indicates a bug.
    #[error("Internal resolver assertion failed: {0}")]
    ResolverInternalAssertion(String),

    // ========================================================================
    // Serialization / IO
    // ========================================================================
    /// JSON parsing error (catalog tool `--format json` output).
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CatalogError {
    /// Creates a metadata shape failure.
    pub fn metadata_shape(
        path: impl Into<String>,
        plugin_type: impl Into<String>,
        plugin: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::MetadataShapeFailure {
            path: path.into(),
            plugin_type: plugin_type.into(),
            plugin: plugin.into(),
            message: message.into(),
        }
    }

    /// Creates a listing-collections failure.
    pub fn listing_failed(message: impl Into<String>) -> Self {
        Self::ListingCollectionsFailure {
            message: message.into(),
        }
    }

    /// Returns true if this is the "tool too old to list" subtype.
    pub fn is_ansible_29(&self) -> bool {
        matches!(self, CatalogError::Ansible29Failure { .. })
    }

    /// Returns the error code for CLI exit status.
    pub fn exit_code(&self) -> i32 {
        match self {
            CatalogError::ListingCollectionsFailure { .. }
            | CatalogError::Ansible29Failure { .. } => 2,
            CatalogError::MetadataShapeFailure { .. } => 3,
            CatalogError::CatalogStructureFailure(_) => 4,
            CatalogError::UnknownPluginTypeFailure { .. } => 5,
            CatalogError::ResolverInternalAssertion(_) => 70,
            _ => 1,
        }
    }
}
