//! Bundle inventory construction: de-aliasing `ansible.builtin` /
//! `ansible.legacy`, and enforcing the single-core invariant.

use crate::error::CatalogError;
use std::path::PathBuf;

/// One located bundle (or the core bundle).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleInfo {
    pub path: PathBuf,
    pub namespace: String,
    pub name: String,
    pub version: Option<String>,
    pub is_core: bool,
}

impl BundleInfo {
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }
}

/// The de-aliased set of bundles a catalog will be built from.
#[derive(Debug, Clone, Default)]
pub struct BundleInventory {
    bundles: Vec<BundleInfo>,
}

impl BundleInventory {
    /// Builds an inventory from a flat list of located bundles, applying:
    /// - at most one bundle may be marked `is_core`
    /// - a declared core bundle must have full name `ansible.builtin`
    /// - any bundle (core or not) named `ansible.builtin`/`ansible.legacy`
    ///   is dropped unless it is the declared core
    /// - the first bundle registered under a given full name wins; later
    ///   duplicates are silently ignored
    pub fn build(bundles: impl IntoIterator<Item = BundleInfo>) -> Result<BundleInventory, CatalogError> {
        let mut core_seen = false;
        let mut seen_names = std::collections::HashSet::new();
        let mut result = Vec::new();

        for bundle in bundles {
            if bundle.is_core {
                if core_seen {
                    return Err(CatalogError::CatalogStructureFailure(
                        "more than one bundle is marked as the core bundle".to_string(),
                    ));
                }
                if bundle.full_name() != "ansible.builtin" {
                    return Err(CatalogError::CatalogStructureFailure(format!(
                        "the core bundle must be named 'ansible.builtin', found '{}'",
                        bundle.full_name()
                    )));
                }
                core_seen = true;
            } else if bundle.full_name() == "ansible.builtin" || bundle.full_name() == "ansible.legacy"
            {
                continue;
            }

            if !seen_names.insert(bundle.full_name()) {
                continue;
            }
            result.push(bundle);
        }

        Ok(BundleInventory { bundles: result })
    }

    pub fn bundles(&self) -> impl Iterator<Item = &BundleInfo> {
        self.bundles.iter()
    }

    pub fn core(&self) -> Option<&BundleInfo> {
        self.bundles.iter().find(|b| b.is_core)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(ns: &str, name: &str, is_core: bool) -> BundleInfo {
        BundleInfo {
            path: PathBuf::from(format!("/collections/{ns}/{name}")),
            namespace: ns.to_string(),
            name: name.to_string(),
            version: None,
            is_core,
        }
    }

    #[test]
    fn drops_legacy_alias_keeps_builtin_core_and_others() {
        let inventory = BundleInventory::build(vec![
            bundle("ansible", "builtin", true),
            bundle("ansible", "legacy", false),
            bundle("community", "general", false),
        ])
        .unwrap();

        let names: Vec<_> = inventory.bundles().map(|b| b.full_name()).collect();
        assert_eq!(names, vec!["ansible.builtin", "community.general"]);
        assert!(inventory.core().is_some());
    }

    #[test]
    fn rejects_multiple_core_bundles() {
        let err = BundleInventory::build(vec![
            bundle("ansible", "builtin", true),
            bundle("other", "core", true),
        ])
        .unwrap_err();
        assert!(matches!(err, CatalogError::CatalogStructureFailure(_)));
    }

    #[test]
    fn rejects_core_with_wrong_name() {
        let err = BundleInventory::build(vec![bundle("not", "builtin", true)]).unwrap_err();
        assert!(matches!(err, CatalogError::CatalogStructureFailure(_)));
    }

    #[test]
    fn first_registration_wins_on_collision() {
        let mut first = bundle("community", "general", false);
        first.version = Some("1.0.0".to_string());
        let mut second = bundle("community", "general", false);
        second.version = Some("2.0.0".to_string());

        let inventory = BundleInventory::build(vec![first, second]).unwrap();
        let only: Vec<_> = inventory.bundles().collect();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].version.as_deref(), Some("1.0.0"));
    }
}
