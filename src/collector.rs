//! Runs the metadata loader over every bundle in an inventory, building a
//! whole-catalog [`Catalog`].

use crate::document::Document;
use crate::error::CatalogError;
use crate::fqn::BundleFqn;
use crate::inventory::{BundleInfo, BundleInventory};
use crate::loader::load_bundle_routing;
use crate::routing::{BundleRouting, Catalog};

/// Supplies the parsed routing document for a given bundle. Kept separate
/// from [`BundleInventory`] because how a bundle's metadata bytes are read
/// and parsed is outside this crate's scope.
pub trait RoutingSource {
    fn routing_document(&self, bundle: &BundleInfo) -> std::io::Result<Document>;
}

/// Outcome of a single bundle's load, handed to the broken-bundle callback.
pub enum Broken {
    /// Skip this bundle; it will be absent from the catalog.
    Skip,
    /// Substitute a routing table for this bundle.
    Substitute(BundleRouting),
}

/// Loads routing information for every bundle in `inventory`.
///
/// `source` supplies each bundle's parsed document. `handle_broken`, if
/// given, is called with the failing bundle and error for any load failure;
/// if it returns `None` the error propagates, otherwise its `Broken` value
/// determines what (if anything) is recorded for that bundle. Without a
/// handler, the first failure propagates immediately.
pub fn collect_routing_information<S: RoutingSource>(
    inventory: &BundleInventory,
    source: &S,
    mut handle_broken: Option<&mut dyn FnMut(&BundleInfo, &CatalogError) -> Option<Broken>>,
) -> Result<Catalog, CatalogError> {
    let mut catalog = Catalog::new();

    for bundle in inventory.bundles() {
        let fqn = BundleFqn::new(bundle.namespace.clone(), bundle.name.clone());
        match load_one(bundle, source) {
            Ok(routing) => catalog.insert(fqn, routing),
            Err(err) => match handle_broken.as_deref_mut() {
                None => return Err(err),
                Some(handler) => match handler(bundle, &err) {
                    None => return Err(err),
                    Some(Broken::Skip) => continue,
                    Some(Broken::Substitute(routing)) => catalog.insert(fqn, routing),
                },
            },
        }
    }

    Ok(catalog)
}

fn load_one<S: RoutingSource>(bundle: &BundleInfo, source: &S) -> Result<BundleRouting, CatalogError> {
    let doc = source
        .routing_document(bundle)
        .map_err(CatalogError::Io)?;
    let fqn = BundleFqn::new(bundle.namespace.clone(), bundle.name.clone());
    load_bundle_routing(&doc, &fqn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct StaticSource {
        doc: Document,
    }

    impl RoutingSource for StaticSource {
        fn routing_document(&self, _bundle: &BundleInfo) -> std::io::Result<Document> {
            Ok(self.doc.clone())
        }
    }

    struct FailingSource;

    impl RoutingSource for FailingSource {
        fn routing_document(&self, _bundle: &BundleInfo) -> std::io::Result<Document> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"))
        }
    }

    fn bundle(ns: &str, name: &str) -> BundleInfo {
        BundleInfo {
            path: PathBuf::from(format!("/collections/{ns}/{name}")),
            namespace: ns.to_string(),
            name: name.to_string(),
            version: None,
            is_core: false,
        }
    }

    #[test]
    fn collects_empty_catalog_for_blank_documents() {
        let inventory = BundleInventory::build(vec![bundle("foo", "bar")]).unwrap();
        let source = StaticSource { doc: Document::Null };
        let catalog = collect_routing_information(&inventory, &source, None).unwrap();
        assert!(catalog.get(&BundleFqn::new("foo", "bar")).is_some());
    }

    #[test]
    fn propagates_failure_without_handler() {
        let inventory = BundleInventory::build(vec![bundle("foo", "bar")]).unwrap();
        let err = collect_routing_information(&inventory, &FailingSource, None).unwrap_err();
        assert!(matches!(err, CatalogError::Io(_)));
    }

    #[test]
    fn handler_can_skip_broken_bundle() {
        let inventory = BundleInventory::build(vec![bundle("foo", "bar")]).unwrap();
        let mut handler = |_b: &BundleInfo, _e: &CatalogError| Some(Broken::Skip);
        let catalog =
            collect_routing_information(&inventory, &FailingSource, Some(&mut handler)).unwrap();
        assert!(catalog.get(&BundleFqn::new("foo", "bar")).is_none());
    }

    #[test]
    fn handler_can_substitute() {
        let inventory = BundleInventory::build(vec![bundle("foo", "bar")]).unwrap();
        let mut handler = |_b: &BundleInfo, _e: &CatalogError| {
            Some(Broken::Substitute(BundleRouting::new()))
        };
        let catalog =
            collect_routing_information(&inventory, &FailingSource, Some(&mut handler)).unwrap();
        assert!(catalog.get(&BundleFqn::new("foo", "bar")).is_some());
    }
}
