//! plugincat - loader and resolver for Ansible-style plugin bundle routing
//! metadata.
//!
//! `plugincat discover` lists installed bundles and resolves every plugin's
//! redirect chain; `plugincat directory` prints the on-disk plugin directory
//! for a given bundle and plugin type.

use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use plugincat::collector::{collect_routing_information, Broken, RoutingSource};
use plugincat::config::CatalogConfig;
use plugincat::directory::plugin_directory;
use plugincat::discovery::{list_bundles, locate_core_bundle, ProcessRunner};
use plugincat::document::Document;
use plugincat::error::CatalogError;
use plugincat::fqn::BundleFqn;
use plugincat::inventory::{BundleInfo, BundleInventory};
use plugincat::plugin_type::PluginType;
use plugincat::resolver::complete_redirects;
use std::path::PathBuf;
use tracing::{error, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "plugincat")]
#[command(author = "Plugincat Contributors")]
#[command(version)]
#[command(about = "Resolves plugin bundle routing metadata into a flat catalog")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a plugincat.toml/plugincat.yml configuration file.
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Locate the core bundle and every installed collection, then resolve
    /// every plugin's redirect chain.
    Discover {
        /// Extra collection search path passed to the catalog tool.
        #[arg(long)]
        collections_path: Option<String>,
    },
    /// Print the on-disk plugin directory for a bundle and plugin type.
    Directory {
        /// Bundle path on disk.
        path: PathBuf,
        /// Bundle full name, e.g. `community.general`, or `ansible.builtin`.
        bundle: String,
        /// Plugin type label, e.g. `module`, `lookup`, `eda_event_filter`.
        plugin_type: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = CatalogConfig::load(cli.config.as_ref()).unwrap_or_else(|e| {
        warn!(error = %e, "failed to load configuration, using defaults");
        CatalogConfig::default()
    });

    let exit_code = match &cli.command {
        Commands::Discover { collections_path } => {
            let path = collections_path.as_deref().or(config.collections_path.as_deref());
            run_discover(&config, path)
        }
        Commands::Directory {
            path,
            bundle,
            plugin_type,
        } => run_directory(path, bundle, plugin_type),
    };

    std::process::exit(exit_code);
}

fn init_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(verbosity >= 3))
        .with(env_filter)
        .init();
}

fn run_discover(config: &CatalogConfig, collections_path: Option<&str>) -> i32 {
    let runner = ProcessRunner;

    let core = match locate_core_bundle(&runner, &config.tool) {
        Ok(core) => core,
        Err(e) => {
            error!(error = %e, "failed to locate core bundle");
            return e.exit_code();
        }
    };

    let mut bundles = match list_bundles(&runner, &config.tool, collections_path) {
        Ok(bundles) => bundles,
        Err(e) => {
            error!(error = %e, "failed to list bundles");
            return e.exit_code();
        }
    };
    bundles.insert(0, core);

    let inventory = match BundleInventory::build(bundles) {
        Ok(inventory) => inventory,
        Err(e) => {
            error!(error = %e, "invalid bundle inventory");
            return e.exit_code();
        }
    };

    let source = FilesystemRoutingSource;
    let mut handler = |bundle: &BundleInfo, err: &CatalogError| {
        warn!(bundle = %bundle.full_name(), error = %err, "skipping bundle with unreadable routing metadata");
        Some(Broken::Skip)
    };
    let mut catalog = match collect_routing_information(&inventory, &source, Some(&mut handler)) {
        Ok(catalog) => catalog,
        Err(e) => {
            error!(error = %e, "failed to collect routing information");
            return e.exit_code();
        }
    };

    complete_redirects(&mut catalog);

    print_catalog_summary(&catalog);
    0
}

fn print_catalog_summary(catalog: &plugincat::routing::Catalog) {
    for (bundle, routing) in &catalog.bundles {
        for (plugin_type, plugins) in &routing.plugin_data {
            for (name, entry) in plugins {
                let fqn = bundle.plugin(name);
                if entry.redirect.is_cycle() {
                    println!("{fqn} [{plugin_type}] -> cycle");
                } else if let Some(target) = entry.redirect.target() {
                    println!("{fqn} [{plugin_type}] -> {target}");
                }
            }
        }
    }
}

fn run_directory(path: &PathBuf, bundle: &str, plugin_type: &str) -> i32 {
    let Some((namespace, name)) = bundle.split_once('.') else {
        error!(bundle, "bundle must be <namespace>.<name>");
        return 1;
    };
    let info = BundleInfo {
        path: path.clone(),
        namespace: namespace.to_string(),
        name: name.to_string(),
        version: None,
        is_core: BundleFqn::new(namespace, name).is_builtin(),
    };

    let Ok(plugin_type) = plugin_type.parse::<PluginType>() else {
        error!(plugin_type, "unrecognized plugin type");
        return 1;
    };

    match plugin_directory(&info, plugin_type) {
        Ok(dir) => {
            println!("{}", dir.display());
            0
        }
        Err(e) => {
            error!(error = %e, "cannot resolve plugin directory");
            e.exit_code()
        }
    }
}

/// Reads a bundle's `meta/runtime.yml` (or `config/ansible_builtin_runtime.yml`
/// for the core bundle) from disk.
struct FilesystemRoutingSource;

impl RoutingSource for FilesystemRoutingSource {
    fn routing_document(&self, bundle: &BundleInfo) -> std::io::Result<Document> {
        let relative = if bundle.is_core {
            "config/ansible_builtin_runtime.yml"
        } else {
            "meta/runtime.yml"
        };
        let path = bundle.path.join(relative);
        if !path.exists() {
            return Ok(Document::Mapping(IndexMap::new()));
        }
        let content = std::fs::read_to_string(path)?;
        let value: serde_yaml::Value =
            serde_yaml::from_str(&content).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(Document::from(value))
    }
}
