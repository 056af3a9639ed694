//! Plugin directory mapping for consumer tooling: given a bundle and a
//! plugin type, compute the on-disk directory where that type's plugins
//! live.

use crate::error::CatalogError;
use crate::inventory::BundleInfo;
use crate::plugin_type::PluginType;
use std::path::PathBuf;

/// Returns the on-disk directory for `plugin_type` within `bundle`.
///
/// `module` plugins live directly under `modules/` in the core bundle but
/// under `plugins/modules/` everywhere else; EDA plugin types only exist
/// outside the core bundle.
pub fn plugin_directory(bundle: &BundleInfo, plugin_type: PluginType) -> Result<PathBuf, CatalogError> {
    if plugin_type == PluginType::Module {
        return Ok(if bundle.is_core {
            bundle.path.join("modules")
        } else {
            bundle.path.join("plugins").join("modules")
        });
    }

    if !plugin_type.is_eda() {
        return Ok(bundle.path.join("plugins").join(plugin_type.label()));
    }

    if !bundle.is_core {
        let suffix = match plugin_type {
            PluginType::EdaEventFilter => "event_filter",
            PluginType::EdaEventSource => "event_source",
            _ => unreachable!("is_eda() only admits EdaEventFilter/EdaEventSource"),
        };
        return Ok(bundle
            .path
            .join("extensions")
            .join("eda")
            .join("plugins")
            .join(suffix));
    }

    let what = if bundle.is_core {
        "ansible-core".to_string()
    } else {
        format!("collection {}", bundle.full_name())
    };
    Err(CatalogError::UnknownPluginTypeFailure {
        plugin_type: plugin_type.label().to_string(),
        bundle: what,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn bundle(path: &str, is_core: bool) -> BundleInfo {
        BundleInfo {
            path: PathBuf::from(path),
            namespace: "ansible".to_string(),
            name: "builtin".to_string(),
            version: None,
            is_core,
        }
    }

    #[test]
    fn core_modules_live_directly_under_modules() {
        let b = bundle("/core", true);
        assert_eq!(
            plugin_directory(&b, PluginType::Module).unwrap(),
            PathBuf::from("/core/modules")
        );
    }

    #[test]
    fn collection_modules_live_under_plugins_modules() {
        let b = bundle("/coll", false);
        assert_eq!(
            plugin_directory(&b, PluginType::Module).unwrap(),
            PathBuf::from("/coll/plugins/modules")
        );
    }

    #[test]
    fn core_documentable_type_maps_to_plugins_subdir() {
        let b = bundle("/core", true);
        assert_eq!(
            plugin_directory(&b, PluginType::Lookup).unwrap(),
            PathBuf::from("/core/plugins/lookup")
        );
    }

    #[test]
    fn eda_types_only_resolve_outside_core() {
        let collection = bundle("/coll", false);
        assert_eq!(
            plugin_directory(&collection, PluginType::EdaEventFilter).unwrap(),
            PathBuf::from("/coll/extensions/eda/plugins/event_filter")
        );

        let core = bundle("/core", true);
        let err = plugin_directory(&core, PluginType::EdaEventFilter).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownPluginTypeFailure { .. }));
    }
}
