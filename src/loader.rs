//! Converts a parsed [`Document`] tree into a [`BundleRouting`], applying
//! the shape rules of a single bundle's routing metadata file.

use crate::document::Document;
use crate::error::{CatalogError, Result};
use crate::fqn::{BundleFqn, Fqn};
use crate::plugin_type::PluginType;
use crate::removal::RemovalRecord;
use crate::routing::{BundleRouting, PluginRouting, Redirect};

/// Loads a bundle's routing table from its `plugin_routing` document.
///
/// `bundle` supplies the `<namespace>.<bundle>` prefix used to detect
/// self-redirects. An empty or absent document produces an empty routing
/// table.
pub fn load_bundle_routing(doc: &Document, bundle: &BundleFqn) -> Result<BundleRouting> {
    let mut routing = BundleRouting::new();

    if doc.is_blank() {
        return Ok(routing);
    }

    let top = doc.as_mapping().ok_or_else(|| {
        CatalogError::metadata_shape("", "", "", "routing document must be a mapping")
    })?;

    let plugin_routing = match top.get("plugin_routing") {
        None | Some(Document::Null) => return Ok(routing),
        Some(doc) if doc.is_blank() => return Ok(routing),
        Some(doc) => doc.as_mapping().ok_or_else(|| {
            CatalogError::metadata_shape(
                "plugin_routing",
                "",
                "",
                "plugin_routing must be a mapping",
            )
        })?,
    };

    for (label, plugins_doc) in plugin_routing {
        let Some(plugin_type) = PluginType::from_label(label) else {
            continue; // unrecognized type label is silently ignored
        };
        if plugins_doc.is_blank() {
            continue;
        }
        let plugins = plugins_doc.as_mapping().ok_or_else(|| {
            CatalogError::metadata_shape(
                format!("plugin_routing.{label}"),
                label,
                "",
                "expected a mapping of plugin name to routing entry",
            )
        })?;

        let table = routing.entry_mapping(plugin_type);
        for (plugin_name, entry_doc) in plugins {
            let path = format!("plugin_routing.{label}.{plugin_name}");
            let entry = parse_plugin_entry(entry_doc, &path, label, plugin_name, bundle, plugin_type)?;
            table.insert(plugin_name.clone(), entry);
        }
    }

    Ok(routing)
}

fn parse_plugin_entry(
    doc: &Document,
    path: &str,
    plugin_type_label: &str,
    plugin_name: &str,
    bundle: &BundleFqn,
    plugin_type: PluginType,
) -> Result<PluginRouting> {
    if doc.is_blank() {
        return Ok(PluginRouting::default());
    }

    let mapping = doc.as_mapping().ok_or_else(|| {
        CatalogError::metadata_shape(path, plugin_type_label, plugin_name, "expected a mapping")
    })?;

    let mut entry = PluginRouting::default();

    if plugin_type == PluginType::Module {
        if let Some(action_doc) = mapping.get("action_plugin") {
            let action = action_doc.as_str().ok_or_else(|| {
                CatalogError::metadata_shape(
                    format!("{path}.action_plugin"),
                    plugin_type_label,
                    plugin_name,
                    "action_plugin must be a string",
                )
            })?;
            entry.action_plugin = Some(action.to_string());
        }
    }

    if let Some(dep_doc) = mapping.get("deprecation") {
        if !dep_doc.is_blank() {
            entry.deprecation = Some(RemovalRecord::load(
                dep_doc,
                &format!("{path}.deprecation"),
                plugin_type_label,
                plugin_name,
            )?);
        }
    }

    if let Some(tomb_doc) = mapping.get("tombstone") {
        if !tomb_doc.is_blank() {
            entry.tombstone = Some(RemovalRecord::load(
                tomb_doc,
                &format!("{path}.tombstone"),
                plugin_type_label,
                plugin_name,
            )?);
        }
    }

    if let Some(redirect_doc) = mapping.get("redirect") {
        let redirect_target = redirect_doc.as_str().ok_or_else(|| {
            CatalogError::metadata_shape(
                format!("{path}.redirect"),
                plugin_type_label,
                plugin_name,
                "redirect must be a string",
            )
        })?;

        let own_fqn = Fqn::new(
            bundle.namespace().to_string(),
            bundle.bundle().to_string(),
            plugin_name.to_string(),
        );

        if redirect_target == own_fqn.to_string() {
            entry.redirect = Redirect::Cycle;
            entry.redirect_chain = Some(vec![own_fqn.clone(), own_fqn.clone()]);
            entry.redirect_error = Some("Detected circular redirect".to_string());
            if let Some(dep) = entry.deprecation.clone() {
                entry.redirect_deprecations = Some(vec![(own_fqn, dep)]);
            }
        } else {
            entry.redirect = Redirect::Target(redirect_target.to_string());
        }
    }

    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn mapping(pairs: Vec<(&str, Document)>) -> Document {
        let mut m = IndexMap::new();
        for (k, v) in pairs {
            m.insert(k.to_string(), v);
        }
        Document::Mapping(m)
    }

    #[test]
    fn empty_document_produces_empty_routing() {
        let bundle = BundleFqn::new("foo", "bar");
        let routing = load_bundle_routing(&Document::Null, &bundle).unwrap();
        assert!(routing.plugin_data.is_empty());
    }

    #[test]
    fn modules_label_aliases_to_module_type() {
        let bundle = BundleFqn::new("foo", "bar");
        let entry = mapping(vec![("redirect", Document::String("foo.bar.other".into()))]);
        let plugins = mapping(vec![("old_name", entry)]);
        let plugin_routing = mapping(vec![("modules", plugins)]);
        let doc = mapping(vec![("plugin_routing", plugin_routing)]);

        let routing = load_bundle_routing(&doc, &bundle).unwrap();
        assert!(routing.get(PluginType::Module, "old_name").is_some());
    }

    #[test]
    fn self_redirect_is_detected_as_cycle() {
        let bundle = BundleFqn::new("foo", "bar");
        let entry = mapping(vec![(
            "redirect",
            Document::String("foo.bar.self_loop".into()),
        )]);
        let plugins = mapping(vec![("self_loop", entry)]);
        let plugin_routing = mapping(vec![("module", plugins)]);
        let doc = mapping(vec![("plugin_routing", plugin_routing)]);

        let routing = load_bundle_routing(&doc, &bundle).unwrap();
        let plugin = routing.get(PluginType::Module, "self_loop").unwrap();
        assert!(plugin.redirect.is_cycle());
        assert_eq!(
            plugin.redirect_chain,
            Some(vec![
                Fqn::new("foo", "bar", "self_loop"),
                Fqn::new("foo", "bar", "self_loop"),
            ])
        );
        assert_eq!(
            plugin.redirect_error.as_deref(),
            Some("Detected circular redirect")
        );
    }

    #[test]
    fn action_plugin_ignored_outside_module_type() {
        let bundle = BundleFqn::new("foo", "bar");
        let entry = mapping(vec![("action_plugin", Document::String("foo.bar.act".into()))]);
        let plugins = mapping(vec![("x", entry)]);
        let plugin_routing = mapping(vec![("lookup", plugins)]);
        let doc = mapping(vec![("plugin_routing", plugin_routing)]);

        let routing = load_bundle_routing(&doc, &bundle).unwrap();
        let plugin = routing.get(PluginType::Lookup, "x").unwrap();
        assert_eq!(plugin.action_plugin, None);
    }

    #[test]
    fn unknown_type_label_is_ignored() {
        let bundle = BundleFqn::new("foo", "bar");
        let plugins = mapping(vec![("x", Document::Null)]);
        let plugin_routing = mapping(vec![("not_a_type", plugins)]);
        let doc = mapping(vec![("plugin_routing", plugin_routing)]);

        let routing = load_bundle_routing(&doc, &bundle).unwrap();
        assert!(routing.plugin_data.is_empty());
    }
}
