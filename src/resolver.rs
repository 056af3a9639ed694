//! Whole-catalog completion of plugin redirects.
//!
//! This is the hardest component: it walks redirect chains across bundles,
//! classifies their termination (clean, cycle, dead-end, tombstone),
//! accumulates deprecation history along the way, and rewrites every node
//! visited in-place so a later lookup resolves in one step.

use crate::fqn::{BundleFqn, Fqn};
use crate::plugin_type::PluginType;
use crate::removal::RemovalRecord;
use crate::routing::{Catalog, PluginRouting, Redirect};
use tracing::{debug, warn};

/// One step already taken while walking a redirect chain.
struct PathEntry {
    fqn: Fqn,
    bundle: BundleFqn,
    plugin: String,
    /// Absent for the unknown-bundle dead-end target, which has no routing
    /// record to rewrite.
    routing: Option<PluginRouting>,
    /// Whether this entry may be written back into the catalog. True only
    /// for entries appended while "continuing" the walk (the redirect
    /// target itself had a further redirect); the starting node and
    /// clean/dead-end terminal nodes are never self-writing here — the
    /// start node's update happens via the caller persisting the returned
    /// value, and terminal nodes are endpoints, not rewritten.
    owned: bool,
}

enum Termination {
    Clean,
    Cycle { start_index: usize },
    DeadEnd { reason: String },
    Tombstone { at: Fqn, record: RemovalRecord },
    Reused {
        chain: Option<Vec<Fqn>>,
        deprecations: Option<Vec<(Fqn, RemovalRecord)>>,
        tombstone: bool,
        dead_end: bool,
        error: Option<String>,
        is_loop: bool,
    },
}

/// Completes every redirect in the catalog.
pub fn complete_redirects(catalog: &mut Catalog) {
    let bundle_fqns: Vec<BundleFqn> = catalog.bundles.keys().cloned().collect();
    for bundle in bundle_fqns {
        complete_redirects_for_collection(catalog, &bundle);
    }
}

/// Completes every redirect reachable from the named bundle's own plugins.
pub fn complete_redirects_for_collection(catalog: &mut Catalog, bundle: &BundleFqn) {
    let Some(routing) = catalog.get(bundle) else {
        return;
    };
    let plugin_types: Vec<PluginType> = routing.plugin_data.keys().copied().collect();

    for plugin_type in plugin_types {
        // Snapshot plugin names before rewriting: resolving one plugin can
        // transitively resolve others in this same map via the reuse path.
        let plugin_names: Vec<String> = catalog
            .get(bundle)
            .and_then(|r| r.plugin_data.get(&plugin_type))
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();

        for plugin_name in plugin_names {
            resolve_and_store(catalog, bundle, plugin_type, &plugin_name);
        }
    }
}

/// Resolves a single plugin's redirect (if not already resolved) and writes
/// the result back into its owning bundle's routing table.
fn resolve_and_store(catalog: &mut Catalog, bundle: &BundleFqn, plugin_type: PluginType, plugin_name: &str) {
    let Some(current) = catalog
        .get(bundle)
        .and_then(|r| r.get(plugin_type, plugin_name))
        .cloned()
    else {
        return;
    };

    if current.is_resolved() {
        return;
    }

    let resolved = resolve(catalog, bundle, plugin_type, plugin_name, current);

    if let Some(table) = catalog.get_mut(bundle).map(|r| r.entry_mapping(plugin_type)) {
        table.insert(plugin_name.to_string(), resolved);
    }
}

fn as_fqn(s: &str) -> Fqn {
    Fqn::parse_redirect_target(s).unwrap_or_else(|| Fqn::new("", "", s.to_string()))
}

/// The per-node resolution algorithm (`_complete_redirect` in the reference
/// implementation).
fn resolve(
    catalog: &mut Catalog,
    start_bundle: &BundleFqn,
    plugin_type: PluginType,
    start_name: &str,
    start_routing: PluginRouting,
) -> PluginRouting {
    let start_fqn = start_bundle.plugin(start_name);

    let Redirect::Target(first_target) = start_routing.redirect.clone() else {
        return start_routing;
    };

    let mut visited = std::collections::HashSet::new();
    visited.insert(start_fqn.clone());

    let mut path = vec![PathEntry {
        fqn: start_fqn.clone(),
        bundle: start_bundle.clone(),
        plugin: start_name.to_string(),
        routing: Some(start_routing),
        owned: false,
    }];

    let mut next_name = first_target;
    let termination;
    let mut prefix_len;

    loop {
        if visited.contains(&as_fqn(&next_name)) {
            let start_index = path
                .iter()
                .position(|e| e.fqn.to_string() == next_name)
                .unwrap_or(0);
            prefix_len = start_index;
            termination = Termination::Cycle { start_index };
            break;
        }
        visited.insert(as_fqn(&next_name));

        let Some(target) = Fqn::parse_redirect_target(&next_name) else {
            prefix_len = path.len();
            termination = Termination::DeadEnd {
                reason: format!("Found redirect to non-FQCN {next_name}"),
            };
            break;
        };

        let target_bundle = target.bundle_fqn();
        if catalog.get(&target_bundle).is_none() {
            path.push(PathEntry {
                fqn: target.clone(),
                bundle: target_bundle.clone(),
                plugin: target.plugin().to_string(),
                routing: None,
                owned: false,
            });
            prefix_len = path.len();
            termination = Termination::DeadEnd {
                reason: format!("Found redirect to unknown collection {target_bundle}"),
            };
            break;
        }

        let pd = catalog
            .get(&target_bundle)
            .and_then(|r| r.get(plugin_type, target.plugin()))
            .cloned();

        if let Some(pd) = &pd {
            if let Some(tombstone) = &pd.tombstone {
                prefix_len = path.len();
                termination = Termination::Tombstone {
                    at: target.clone(),
                    record: tombstone.clone(),
                };
                break;
            }
        }

        match pd {
            None => {
                path.push(PathEntry {
                    fqn: target.clone(),
                    bundle: target_bundle,
                    plugin: target.plugin().to_string(),
                    routing: None,
                    owned: false,
                });
                prefix_len = path.len();
                termination = Termination::Clean;
                break;
            }
            Some(pd) if pd.redirect.is_none() => {
                path.push(PathEntry {
                    fqn: target.clone(),
                    bundle: target_bundle,
                    plugin: target.plugin().to_string(),
                    routing: Some(pd),
                    owned: false,
                });
                prefix_len = path.len();
                termination = Termination::Clean;
                break;
            }
            Some(pd) if pd.redirect_error.is_some() || pd.redirect_tombstone || pd.redirect_dead_end => {
                prefix_len = path.len();
                termination = Termination::Reused {
                    chain: pd.redirect_chain.clone(),
                    deprecations: pd.redirect_deprecations.clone(),
                    tombstone: pd.redirect_tombstone,
                    dead_end: pd.redirect_dead_end,
                    error: pd.redirect_error.clone(),
                    is_loop: pd.redirect.is_cycle(),
                };
                break;
            }
            Some(pd) => {
                // `redirect.is_none()`, tombstone, and already-resolved
                // (error/tombstone/dead-end) cases were handled above, and
                // `Redirect::Cycle` always carries `redirect_error`, which
                // was also handled above — so only `Redirect::Target`
                // reaches here.
                let owning_target = pd
                    .redirect
                    .target()
                    .expect("remaining branch only reaches non-terminal string redirects")
                    .to_string();
                path.push(PathEntry {
                    fqn: target.clone(),
                    bundle: target_bundle,
                    plugin: target.plugin().to_string(),
                    routing: Some(pd),
                    owned: true,
                });
                debug!(target = %owning_target, "following redirect");
                next_name = owning_target;
                continue;
            }
        }
    }

    apply_termination(
        catalog,
        plugin_type,
        &mut path,
        prefix_len,
        termination,
        &next_name,
        &start_fqn,
    )
}

/// Applies a termination outcome to the linear prefix of `path` (everything
/// before a detected cycle's start index, or the whole path for a
/// non-cyclic termination), writing rewritten records back into their
/// owning maps and returning the start node's new record.
fn apply_termination(
    catalog: &mut Catalog,
    plugin_type: PluginType,
    path: &mut [PathEntry],
    prefix_len: usize,
    termination: Termination,
    next_name: &str,
    start_fqn: &Fqn,
) -> PluginRouting {
    let mut cycle_start_override = None;

    let (mut redirect_chain, mut redirect_deprecations, tombstone_flag, dead_end_flag, error, is_loop) =
        match &termination {
            Termination::Clean => (None, None, false, false, None, false),
            Termination::Cycle { start_index } => {
                let (seed_chain, seed_deprecations, start_in_cycle) =
                    resolve_cycle(catalog, plugin_type, path, *start_index, start_fqn);
                cycle_start_override = start_in_cycle;
                let seed_deprecations = if seed_deprecations.is_empty() {
                    None
                } else {
                    Some(seed_deprecations)
                };
                (Some(seed_chain), seed_deprecations, false, false, None, true)
            }
            Termination::DeadEnd { reason } => {
                warn!(reason = %reason, "dead-end redirect");
                (None, None, false, true, Some(reason.clone()), false)
            }
            Termination::Tombstone { at, record } => {
                warn!(at = %at, "tombstoned redirect target");
                (None, Some(vec![(at.clone(), record.clone())]), true, false, None, false)
            }
            Termination::Reused {
                chain,
                deprecations,
                tombstone,
                dead_end,
                error,
                is_loop,
            } => (
                chain.clone(),
                deprecations.clone(),
                *tombstone,
                *dead_end,
                error.clone(),
                *is_loop,
            ),
        };

    let prefix = &path[..prefix_len];
    let mut start_result = None;

    for entry in prefix.iter().rev() {
        let fqn = entry.fqn.clone();
        redirect_chain.get_or_insert_with(Vec::new).insert(0, fqn.clone());

        let Some(routing) = &entry.routing else {
            continue;
        };

        if let Some(dep) = &routing.deprecation {
            redirect_deprecations
                .get_or_insert_with(Vec::new)
                .insert(0, (fqn.clone(), dep.clone()));
        }

        let new_redirect = if is_loop {
            Redirect::Cycle
        } else {
            Redirect::Target(next_name.to_string())
        };

        let new_routing = PluginRouting {
            action_plugin: routing.action_plugin.clone(),
            redirect: new_redirect,
            redirect_chain: redirect_chain.clone(),
            redirect_deprecations: redirect_deprecations.clone(),
            redirect_tombstone: tombstone_flag,
            redirect_dead_end: dead_end_flag,
            redirect_error: error.clone(),
            deprecation: routing.deprecation.clone(),
            tombstone: routing.tombstone.clone(),
        };

        if entry.owned {
            write_back(catalog, plugin_type, entry, &new_routing);
        }

        if fqn == *start_fqn {
            start_result = Some(new_routing);
        }
    }

    // When the cycle's entry point is the start node itself (an empty
    // prefix), the loop above never runs: the rewritten record comes from
    // `resolve_cycle`'s own rewrite of that node instead.
    start_result.or(cycle_start_override).unwrap_or_default()
}

fn write_back(catalog: &mut Catalog, plugin_type: PluginType, entry: &PathEntry, new_routing: &PluginRouting) {
    if let Some(table) = catalog.get_mut(&entry.bundle) {
        table
            .entry_mapping(plugin_type)
            .insert(entry.plugin.clone(), new_routing.clone());
    }
}

/// Rewrites every node in the detected cycle with its own rotated chain and
/// deprecation list, and returns the *unrotated* chain (cycle FQNs followed
/// by the repeated entry point) and deprecation list, for the linear prefix
/// (if any) leading into this cycle to prepend itself onto, plus the
/// rewritten record for `start_fqn` if the cycle contains it directly
/// (mirrors routing.py's `if plugin_fqcn == fqcn: plugin_data = new_plugin_data`).
fn resolve_cycle(
    catalog: &mut Catalog,
    plugin_type: PluginType,
    path: &mut [PathEntry],
    start_index: usize,
    start_fqn: &Fqn,
) -> (Vec<Fqn>, Vec<(Fqn, RemovalRecord)>, Option<PluginRouting>) {
    let cycle = &path[start_index..];
    let len = cycle.len();

    let mut cycle_deprecations: Vec<(Fqn, RemovalRecord)> = Vec::new();
    for entry in cycle {
        if let Some(routing) = &entry.routing {
            if let Some(dep) = &routing.deprecation {
                cycle_deprecations.push((entry.fqn.clone(), dep.clone()));
            }
        }
    }

    let cycle_fqns: Vec<Fqn> = cycle.iter().map(|e| e.fqn.clone()).collect();

    let mut start_in_cycle = None;

    for offset in 0..len {
        let entry = &cycle[offset];
        let Some(routing) = &entry.routing else { continue };

        let mut chain = Vec::with_capacity(len + 1);
        chain.extend(cycle_fqns[offset..].iter().cloned());
        chain.extend(cycle_fqns[..offset].iter().cloned());
        chain.push(cycle_fqns[offset].clone());

        let rotated_deprecations: Vec<(Fqn, RemovalRecord)> = cycle_deprecations
            .iter()
            .filter(|(fqn, _)| cycle_fqns[offset..].contains(fqn))
            .cloned()
            .chain(
                cycle_deprecations
                    .iter()
                    .filter(|(fqn, _)| cycle_fqns[..offset].contains(fqn))
                    .cloned(),
            )
            .collect();

        let new_routing = PluginRouting {
            action_plugin: routing.action_plugin.clone(),
            redirect: Redirect::Cycle,
            redirect_chain: Some(chain),
            redirect_deprecations: if rotated_deprecations.is_empty() {
                None
            } else {
                Some(rotated_deprecations)
            },
            redirect_tombstone: false,
            redirect_dead_end: false,
            redirect_error: Some("Detected circular redirect".to_string()),
            deprecation: routing.deprecation.clone(),
            tombstone: routing.tombstone.clone(),
        };

        // The cycle's entry node (offset 0, i.e. the node the outer walk
        // re-encountered) is always the start of some traversal and must be
        // written even when it wasn't reached via a "continue" step.
        if entry.owned || offset == 0 {
            write_back(catalog, plugin_type, entry, &new_routing);
        }

        if entry.fqn == *start_fqn {
            start_in_cycle = Some(new_routing);
        }
    }

    let mut seed_chain = cycle_fqns.clone();
    seed_chain.push(cycle_fqns[0].clone());
    (seed_chain, cycle_deprecations, start_in_cycle)
}
