//! Service plugins and the registry the client manager resolves them from.
//!
//! Plugins are discovered once at start-up from two ordered groups of static
//! descriptors, "base" first and "extension" second. A later registration
//! under an API name replaces the earlier one. A descriptor that fails to load
//! or initialize is skipped with a warning so one broken plugin cannot keep
//! the client from starting.

use clap::{ArgMatches, Command};
use std::collections::BTreeMap;
use std::sync::Arc;
use strum::{Display, EnumIter};
use tracing::{debug, warn};

use crate::cache::ServiceHandle;
use crate::client_manager::{ClientManager, ClientManagerError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PluginError {
    #[error("failed to load plugin {name:?}: {reason}")]
    LoadFailed { name: String, reason: String },
    #[error("failed to initialize plugin {name:?}: {reason}")]
    InitializeFailed { name: String, reason: String },
}

/// Descriptor groups, in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, EnumIter)]
pub enum PluginGroup {
    #[strum(serialize = "openstack.cli.base")]
    Base,
    #[strum(serialize = "openstack.cli.extension")]
    Extension,
}

pub trait ServicePlugin: Send + Sync {
    /// Name of the client accessor on the client manager, e.g. `compute`.
    fn api_name(&self) -> &str;

    fn make_client(&self, manager: &mut ClientManager) -> Result<ServiceHandle, ClientManagerError>;

    /// One-time hook run when the plugin is registered.
    fn initialize(&self) -> Result<(), PluginError> {
        Ok(())
    }

    /// Add plugin-specific global options.
    fn build_option_parser(&self, command: Command) -> Command {
        command
    }

    /// Id of the argument that selects this service's API version.
    fn api_version_arg(&self) -> Option<&str> {
        None
    }
}

/// Statically discoverable plugin entry: a name and a constructor.
#[derive(Clone, Copy)]
pub struct PluginDescriptor {
    pub name: &'static str,
    pub load: fn() -> Result<Arc<dyn ServicePlugin>, PluginError>,
}

impl std::fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginDescriptor").field("name", &self.name).finish()
    }
}

#[derive(Clone)]
pub struct RegisteredPlugin {
    pub group: PluginGroup,
    pub descriptor: &'static str,
    pub plugin: Arc<dyn ServicePlugin>,
}

/// Mapping from API name to the plugin that builds its client.
#[derive(Default, Clone)]
pub struct PluginRegistry {
    plugins: BTreeMap<String, RegisteredPlugin>,
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.names())
            .finish()
    }
}

impl PluginRegistry {
    pub fn new() -> PluginRegistry {
        PluginRegistry::default()
    }

    /// Registry populated from the base group, then the extension group.
    pub fn discover(base: &[PluginDescriptor], extension: &[PluginDescriptor]) -> PluginRegistry {
        let mut registry = PluginRegistry::new();
        registry.load_group(PluginGroup::Base, base);
        registry.load_group(PluginGroup::Extension, extension);
        registry
    }

    pub fn load_group(&mut self, group: PluginGroup, descriptors: &[PluginDescriptor]) {
        for descriptor in descriptors {
            debug!("Loading plugin {} from {}", descriptor.name, group);
            let plugin = match (descriptor.load)() {
                Ok(plugin) => plugin,
                Err(e) => {
                    warn!("Skipping plugin {} from {}: {}", descriptor.name, group, e);
                    continue;
                }
            };
            if let Err(e) = plugin.initialize() {
                warn!("Skipping plugin {} from {}: {}", descriptor.name, group, e);
                continue;
            }
            self.insert(group, descriptor.name, plugin);
        }
    }

    /// Register a plugin directly in the extension group.
    pub fn register(&mut self, plugin: Arc<dyn ServicePlugin>) {
        self.insert(PluginGroup::Extension, "", plugin);
    }

    fn insert(&mut self, group: PluginGroup, descriptor: &'static str, plugin: Arc<dyn ServicePlugin>) {
        let api_name = plugin.api_name().to_string();
        if let Some(previous) = self.plugins.get(&api_name) {
            debug!(
                "Plugin {:?} from {} replaces the one from {}",
                api_name, group, previous.group
            );
        }
        self.plugins.insert(
            api_name,
            RegisteredPlugin {
                group,
                descriptor,
                plugin,
            },
        );
    }

    pub fn get(&self, api_name: &str) -> Option<Arc<dyn ServicePlugin>> {
        self.plugins.get(api_name).map(|registered| registered.plugin.clone())
    }

    pub fn registered(&self, api_name: &str) -> Option<&RegisteredPlugin> {
        self.plugins.get(api_name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.keys().map(String::as_str).collect()
    }

    pub fn plugins(&self) -> impl Iterator<Item = &RegisteredPlugin> {
        self.plugins.values()
    }

    /// Let every plugin add its global options.
    pub fn build_option_parser(&self, command: Command) -> Command {
        self.plugins
            .values()
            .fold(command, |command, registered| registered.plugin.build_option_parser(command))
    }

    /// API version overrides keyed by API name.
    pub fn api_versions(&self, matches: &ArgMatches) -> BTreeMap<String, String> {
        self.plugins
            .iter()
            .filter_map(|(api_name, registered)| {
                let arg = registered.plugin.api_version_arg()?;
                let value = matches.try_get_one::<String>(arg).ok().flatten()?;
                Some((api_name.clone(), value.clone()))
            })
            .collect()
    }
}
