//! Locating the core bundle and listing installed bundles via an external
//! catalog tool (`ansible-galaxy` and friends), following the teacher's
//! pattern of isolating subprocess invocation behind a small trait.

use crate::error::CatalogError;
use crate::inventory::BundleInfo;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Executes a named external command and returns its captured output.
///
/// Kept separate from any concrete subprocess implementation so discovery
/// logic can be exercised without spawning a real catalog tool.
pub trait Runner {
    fn run(&self, args: &[&str], env: Option<&HashMap<String, String>>) -> (Vec<u8>, Vec<u8>, i32);
}

/// A [`Runner`] backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl Runner for ProcessRunner {
    fn run(&self, args: &[&str], env: Option<&HashMap<String, String>>) -> (Vec<u8>, Vec<u8>, i32) {
        let mut command = std::process::Command::new(args[0]);
        command.args(&args[1..]);
        if let Some(env) = env {
            command.env_clear();
            command.envs(env);
        }
        match command.output() {
            Ok(output) => (
                output.stdout,
                output.stderr,
                output.status.code().unwrap_or(-1),
            ),
            Err(err) => (Vec::new(), err.to_string().into_bytes(), -1),
        }
    }
}

static VERSION_NEW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ansible(?:-[a-z0-9]+)? \[(?:core|base) ([0-9][^\]]+)\]").unwrap());
static VERSION_OLD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ansible(?:-[a-z0-9]+)? ([0-9][^\s]+)").unwrap());

/// Plugin-path environment variables neutralized before invoking the
/// catalog tool, so ambient configuration cannot influence discovery.
const NEUTRALIZED_ENV_VARS: &[&str] = &[
    "ANSIBLE_ACTION_PLUGINS",
    "ANSIBLE_CACHE_PLUGINS",
    "ANSIBLE_CALLBACK_PLUGINS",
    "ANSIBLE_CLICONF_PLUGINS",
    "ANSIBLE_CONNECTION_PLUGINS",
    "ANSIBLE_FILTER_PLUGINS",
    "ANSIBLE_HTTPAPI_PLUGINS",
    "ANSIBLE_INVENTORY_PLUGINS",
    "ANSIBLE_LOOKUP_PLUGINS",
    "ANSIBLE_LIBRARY",
    "ANSIBLE_MODULE_UTILS",
    "ANSIBLE_NETCONF_PLUGINS",
    "ANSIBLE_ROLES_PATH",
    "ANSIBLE_STRATEGY_PLUGINS",
    "ANSIBLE_TERMINAL_PLUGINS",
    "ANSIBLE_TEST_PLUGINS",
    "ANSIBLE_VARS_PLUGINS",
    "ANSIBLE_DOC_FRAGMENT_PLUGINS",
];

fn prepare_env(collections_path: Option<&str>, compat: bool, updates_only: bool) -> HashMap<String, String> {
    let mut env: HashMap<String, String> = if updates_only {
        HashMap::new()
    } else {
        std::env::vars().collect()
    };

    for var in NEUTRALIZED_ENV_VARS {
        env.insert((*var).to_string(), "/dev/null".to_string());
    }

    if let Some(path) = collections_path {
        env.insert("ANSIBLE_COLLECTIONS_PATH".to_string(), path.to_string());
        if compat {
            env.insert("ANSIBLE_COLLECTIONS_PATHS".to_string(), path.to_string());
        }
    }

    env
}

/// Locates the core bundle (`ansible.builtin`) by querying `<tool> --version`.
pub fn locate_core_bundle(runner: &dyn Runner, tool: &str) -> Result<BundleInfo, CatalogError> {
    let (stdout, stderr, rc) = runner.run(&[tool, "--version"], None);
    if rc != 0 {
        return Err(CatalogError::listing_failed(format!(
            "Unexpected return code {rc} when querying version. Standard error output: {}",
            String::from_utf8_lossy(&stderr)
        )));
    }

    let stdout = String::from_utf8_lossy(&stdout);
    let mut path: Option<PathBuf> = None;
    let mut version: Option<String> = None;

    for line in stdout.lines() {
        if line.trim_start().starts_with("ansible python module location") {
            if let Some((_, value)) = line.split_once('=') {
                path = Some(PathBuf::from(value.trim()));
            }
        }
        if let Some(caps) = VERSION_NEW.captures(line).or_else(|| VERSION_OLD.captures(line)) {
            version = Some(caps[1].to_string());
        }
    }

    let path = path.ok_or_else(|| {
        CatalogError::listing_failed(format!(
            "Cannot extract module location path from {tool} --version output: {stdout}"
        ))
    })?;
    let version = version.ok_or_else(|| {
        CatalogError::listing_failed(format!(
            "Cannot extract ansible-core version from {tool} --version output: {stdout}"
        ))
    })?;

    debug!(%version, path = %path.display(), "located core bundle");

    Ok(BundleInfo {
        path,
        namespace: "ansible".to_string(),
        name: "builtin".to_string(),
        version: Some(version),
        is_core: true,
    })
}

fn yield_collection(fqn: &str, version: Option<&str>, root: &Path) -> Option<BundleInfo> {
    let mut parts = fqn.splitn(2, '.');
    let namespace = parts.next()?;
    let name = parts.next()?;
    if name.is_empty() || namespace.is_empty() {
        return None;
    }
    let version = version
        .filter(|v| *v != "*")
        .map(|v| v.to_string());
    Some(BundleInfo {
        path: root.join(namespace).join(name),
        namespace: namespace.to_string(),
        name: name.to_string(),
        version,
        is_core: false,
    })
}

/// Lists every non-core bundle installed for `tool`, falling back to the
/// legacy tabular output for catalog tools that predate `--format json`.
pub fn list_bundles(
    runner: &dyn Runner,
    tool: &str,
    collections_path: Option<&str>,
) -> Result<Vec<BundleInfo>, CatalogError> {
    let env = prepare_env(collections_path, false, false);
    let (stdout, stderr, rc) = runner.run(&[tool, "collection", "list", "--format", "json"], Some(&env));

    let stderr_text = String::from_utf8_lossy(&stderr);
    if rc == 2 && stderr_text.contains("error: argument COLLECTION_ACTION: invalid choice: 'list'") {
        return Err(CatalogError::Ansible29Failure {
            message: format!("{tool} does not support the 'collection list' command"),
        });
    }
    if rc == 2 && stderr_text.contains("error: unrecognized arguments: --format") {
        warn!(tool, "catalog tool predates --format json, falling back to tabular output");
        return list_bundles_compat(runner, tool, collections_path);
    }
    if rc == 5 && stderr_text.contains("None of the provided paths were usable.") {
        return Ok(Vec::new());
    }
    if rc != 0 {
        return Err(CatalogError::listing_failed(format!(
            "Unexpected return code {rc} when listing collections. Standard error output: {stderr_text}"
        )));
    }

    let data: HashMap<String, HashMap<String, serde_json::Value>> = serde_json::from_slice(&stdout)?;
    let mut bundles = Vec::new();
    for (root, collections) in data {
        let root = PathBuf::from(root);
        for (fqn, info) in collections {
            let version = info.get("version").and_then(|v| v.as_str());
            if let Some(bundle) = yield_collection(&fqn, version, &root) {
                bundles.push(bundle);
            }
        }
    }
    Ok(bundles)
}

fn list_bundles_compat(
    runner: &dyn Runner,
    tool: &str,
    collections_path: Option<&str>,
) -> Result<Vec<BundleInfo>, CatalogError> {
    let env = prepare_env(collections_path, true, false);
    let (stdout, stderr, rc) = runner.run(&[tool, "collection", "list"], Some(&env));

    let stderr_text = String::from_utf8_lossy(&stderr);
    if rc == 5 && stderr_text.contains("None of the provided paths were usable.") {
        return Ok(Vec::new());
    }
    if rc != 0 {
        return Err(CatalogError::listing_failed(format!(
            "Unexpected return code {rc} when listing collections. Standard error output: {stderr_text}"
        )));
    }

    let stdout = String::from_utf8_lossy(&stdout);
    let mut root: Option<PathBuf> = None;
    let mut bundles = Vec::new();

    for line in stdout.lines() {
        let mut parts = line.splitn(2, char::is_whitespace);
        let Some(first) = parts.next() else { continue };
        let rest = parts.next().map(str::trim_start);

        if first == "#" {
            if let Some(rest) = rest {
                root = Some(PathBuf::from(rest));
            }
            continue;
        }

        let Some(root) = &root else { continue };
        let Some(version_field) = rest else { continue };
        let version = version_field.split_whitespace().next();
        if let Some(bundle) = yield_collection(first, version, root) {
            bundles.push(bundle);
        }
    }

    Ok(bundles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct ScriptedRunner {
        responses: RefCell<Vec<(Vec<u8>, Vec<u8>, i32)>>,
    }

    impl Runner for ScriptedRunner {
        fn run(&self, _args: &[&str], _env: Option<&HashMap<String, String>>) -> (Vec<u8>, Vec<u8>, i32) {
            self.responses.borrow_mut().remove(0)
        }
    }

    fn scripted(responses: Vec<(&str, &str, i32)>) -> ScriptedRunner {
        ScriptedRunner {
            responses: RefCell::new(
                responses
                    .into_iter()
                    .map(|(out, err, rc)| (out.as_bytes().to_vec(), err.as_bytes().to_vec(), rc))
                    .collect(),
            ),
        }
    }

    #[test]
    fn locates_core_bundle_from_version_output() {
        let runner = scripted(vec![(
            "ansible python module location = /usr/lib/python3/ansible\nansible [core 2.16.3]\n",
            "",
            0,
        )]);
        let bundle = locate_core_bundle(&runner, "ansible").unwrap();
        assert_eq!(bundle.version.as_deref(), Some("2.16.3"));
        assert_eq!(bundle.path, PathBuf::from("/usr/lib/python3/ansible"));
        assert!(bundle.is_core);
    }

    #[test]
    fn missing_version_line_is_an_error() {
        let runner = scripted(vec![("ansible python module location = /x\n", "", 0)]);
        assert!(locate_core_bundle(&runner, "ansible").is_err());
    }

    #[test]
    fn json_listing_parses_bundles_and_drops_wildcard_version() {
        let runner = scripted(vec![(
            r#"{"/root/.ansible/collections/ansible_collections": {"community.general": {"version": "8.1.0"}, "foo.bar": {"version": "*"}}}"#,
            "",
            0,
        )]);
        let bundles = list_bundles(&runner, "ansible-galaxy", None).unwrap();
        let general = bundles.iter().find(|b| b.full_name() == "community.general").unwrap();
        assert_eq!(general.version.as_deref(), Some("8.1.0"));
        let foo = bundles.iter().find(|b| b.full_name() == "foo.bar").unwrap();
        assert_eq!(foo.version, None);
    }

    #[test]
    fn ansible_29_is_detected_and_not_retried() {
        let runner = scripted(vec![(
            "",
            "error: argument COLLECTION_ACTION: invalid choice: 'list'",
            2,
        )]);
        let err = list_bundles(&runner, "ansible-galaxy", None).unwrap_err();
        assert!(err.is_ansible_29());
    }

    #[test]
    fn unrecognized_format_flag_falls_back_to_tabular() {
        let runner = scripted(vec![
            ("", "error: unrecognized arguments: --format", 2),
            (
                "# /root/.ansible/collections/ansible_collections\ncommunity.general 8.1.0\n",
                "",
                0,
            ),
        ]);
        let bundles = list_bundles(&runner, "ansible-galaxy", None).unwrap();
        assert_eq!(bundles.len(), 1);
        assert_eq!(bundles[0].full_name(), "community.general");
    }

    #[test]
    fn no_usable_paths_is_an_empty_result_not_an_error() {
        let runner = scripted(vec![("", "None of the provided paths were usable.", 5)]);
        let bundles = list_bundles(&runner, "ansible-galaxy", None).unwrap();
        assert!(bundles.is_empty());
    }
}
