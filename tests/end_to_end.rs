//! Exercises the public pipeline end to end: bundle inventory, routing
//! metadata loading, and whole-catalog resolution wired together the way
//! `plugincat discover` wires them, without going through a real filesystem
//! or subprocess.

use indexmap::IndexMap;
use plugincat::collector::{collect_routing_information, RoutingSource};
use plugincat::document::Document;
use plugincat::inventory::{BundleInfo, BundleInventory};
use plugincat::plugin_type::PluginType;
use plugincat::resolver::complete_redirects;
use plugincat::routing::Redirect;
use plugincat::BundleFqn;
use std::collections::HashMap;
use std::path::PathBuf;

fn bundle(ns: &str, name: &str, is_core: bool) -> BundleInfo {
    BundleInfo {
        path: PathBuf::from(format!("/collections/{ns}/{name}")),
        namespace: ns.to_string(),
        name: name.to_string(),
        version: Some("1.0.0".to_string()),
        is_core,
    }
}

fn mapping(pairs: Vec<(&str, Document)>) -> Document {
    let mut m = IndexMap::new();
    for (k, v) in pairs {
        m.insert(k.to_string(), v);
    }
    Document::Mapping(m)
}

fn string(s: &str) -> Document {
    Document::String(s.to_string())
}

/// A `RoutingSource` backed by a fixed per-bundle document map, standing in
/// for reading `meta/runtime.yml` off disk.
struct FixtureSource {
    documents: HashMap<(String, String), Document>,
}

impl RoutingSource for FixtureSource {
    fn routing_document(&self, bundle: &BundleInfo) -> std::io::Result<Document> {
        Ok(self
            .documents
            .get(&(bundle.namespace.clone(), bundle.name.clone()))
            .cloned()
            .unwrap_or(Document::Null))
    }
}

#[test]
fn inventory_collection_and_resolution_wire_together_across_bundles() {
    let core = bundle("ansible", "builtin", true);
    let foo = bundle("foo", "bar", false);
    let baz = bundle("bar", "baz", false);

    let inventory = BundleInventory::build(vec![core, foo, baz]).expect("valid inventory");

    let foo_routing = mapping(vec![(
        "plugin_routing",
        mapping(vec![(
            "module",
            mapping(vec![(
                "old_name",
                mapping(vec![
                    ("redirect", string("bar.baz.new_name")),
                    (
                        "deprecation",
                        mapping(vec![("warning_text", string("moved to bar.baz"))]),
                    ),
                ]),
            )]),
        )]),
    )]);

    let mut documents = HashMap::new();
    documents.insert(("foo".to_string(), "bar".to_string()), foo_routing);
    let source = FixtureSource { documents };

    let mut catalog =
        collect_routing_information(&inventory, &source, None).expect("collection succeeds");

    complete_redirects(&mut catalog);

    let foo_bundle = BundleFqn::new("foo", "bar");
    let routing = catalog.get(&foo_bundle).expect("foo.bar present");
    let entry = routing
        .get(PluginType::Module, "old_name")
        .expect("old_name present");

    // bar.baz exists as a bundle but never registers a `new_name` module, so
    // the chain resolves cleanly and stops there rather than erroring.
    assert!(!entry.redirect_dead_end);
    assert_eq!(entry.redirect, Redirect::Target("bar.baz.new_name".to_string()));
    assert_eq!(
        entry.redirect_chain,
        Some(vec![
            BundleFqn::new("foo", "bar").plugin("old_name"),
            BundleFqn::new("bar", "baz").plugin("new_name"),
        ])
    );
    assert_eq!(
        entry.redirect_deprecations,
        Some(vec![(
            BundleFqn::new("foo", "bar").plugin("old_name"),
            entry.deprecation.clone().unwrap(),
        )])
    );
}

#[test]
fn core_bundle_must_be_ansible_builtin() {
    let fake_core = bundle("not", "builtin", true);
    let err = BundleInventory::build(vec![fake_core]).unwrap_err();
    assert!(format!("{err}").contains("ansible.builtin"));
}
