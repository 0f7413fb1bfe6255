//! Command dispatch.
//!
//! Loads clouds.yaml only for commands that need a cloud, resolves the
//! connection options from it and the command line, then builds the client
//! manager for the invocation and runs the selected action.

use clap::ArgMatches;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::actions;
use crate::client_manager::ClientManager;
use crate::commands::params::{
    PARAMETER_INSECURE, PARAMETER_OS_AUTH_TYPE, PARAMETER_OS_AUTH_URL, PARAMETER_OS_CACERT, PARAMETER_OS_CLOUD,
    PARAMETER_OS_ENDPOINT, PARAMETER_OS_INTERFACE, PARAMETER_OS_PASSWORD, PARAMETER_OS_PROJECT_DOMAIN_NAME,
    PARAMETER_OS_PROJECT_NAME, PARAMETER_OS_REGION_NAME, PARAMETER_OS_TOKEN, PARAMETER_OS_USERNAME,
    PARAMETER_OS_USER_DOMAIN_NAME, PARAMETER_TIMEOUT,
};
use crate::commands::{
    COMMAND_CATALOG, COMMAND_CONFIGURATION, COMMAND_CONTAINER, COMMAND_FORGET, COMMAND_IMAGE, COMMAND_ISSUE,
    COMMAND_LIST, COMMAND_MODULE, COMMAND_NETWORK, COMMAND_PASSWORD, COMMAND_PROJECT, COMMAND_SERVER,
    COMMAND_SHOW, COMMAND_STORE, COMMAND_TOKEN, COMMAND_VOLUME,
};
use crate::configuration::{Configuration, ConfigurationError, ConnectionOverrides};
use crate::error::CliError;
use crate::keyring::password_callback;
use crate::plugin::PluginRegistry;

fn extract_subcommand_name(matches: &ArgMatches) -> String {
    match matches.subcommand() {
        Some((name, _)) => name.to_string(),
        None => "unknown".to_string(),
    }
}

/// Command-line connection values, including the plugins' API versions.
pub fn connection_overrides(matches: &ArgMatches, registry: &PluginRegistry) -> ConnectionOverrides {
    let value = |id: &str| matches.get_one::<String>(id).cloned();

    ConnectionOverrides {
        cloud: value(PARAMETER_OS_CLOUD),
        auth_type: value(PARAMETER_OS_AUTH_TYPE),
        auth_url: value(PARAMETER_OS_AUTH_URL),
        username: value(PARAMETER_OS_USERNAME),
        password: value(PARAMETER_OS_PASSWORD),
        project_name: value(PARAMETER_OS_PROJECT_NAME),
        project_domain_name: value(PARAMETER_OS_PROJECT_DOMAIN_NAME),
        user_domain_name: value(PARAMETER_OS_USER_DOMAIN_NAME),
        token: value(PARAMETER_OS_TOKEN),
        endpoint: value(PARAMETER_OS_ENDPOINT),
        region_name: value(PARAMETER_OS_REGION_NAME),
        interface: value(PARAMETER_OS_INTERFACE),
        cacert: matches.get_one::<PathBuf>(PARAMETER_OS_CACERT).cloned(),
        insecure: matches.get_flag(PARAMETER_INSECURE),
        timeout: matches.get_one::<u64>(PARAMETER_TIMEOUT).copied(),
        api_version: registry.api_versions(matches),
    }
}

/// Command groups that talk to a cloud.
pub fn auth_required(group: &str) -> bool {
    !matches!(group, COMMAND_MODULE | COMMAND_CONFIGURATION | COMMAND_PASSWORD)
}

/// Run the selected command. `load_configuration` is only called for
/// commands that resolve a cloud.
pub fn execute_command<L>(
    matches: &ArgMatches,
    registry: Arc<PluginRegistry>,
    load_configuration: L,
) -> Result<(), CliError>
where
    L: FnOnce() -> Result<Configuration, ConfigurationError>,
{
    let (group, group_matches) = matches
        .subcommand()
        .ok_or_else(|| CliError::UnsupportedSubcommand(extract_subcommand_name(matches)))?;
    let (action, action_matches) = group_matches
        .subcommand()
        .ok_or_else(|| CliError::UnsupportedSubcommand(group.to_string()))?;
    let overrides = connection_overrides(matches, &registry);

    // Commands that need neither a cloud nor a client manager
    match (group, action) {
        (COMMAND_MODULE, COMMAND_LIST) => return Ok(actions::common::list_modules(&registry, action_matches)?),
        (COMMAND_PASSWORD, COMMAND_STORE) => {
            return Ok(actions::common::store_password(overrides.cloud.as_deref())?)
        }
        (COMMAND_PASSWORD, COMMAND_FORGET) => {
            return Ok(actions::common::forget_password(overrides.cloud.as_deref())?)
        }
        _ => {}
    }

    let configuration = load_configuration()?;
    let options = configuration.resolve(&overrides)?;
    debug!("Resolved options: {:?}", options);

    let mut manager = ClientManager::new(
        options,
        overrides.api_version.clone(),
        Some(password_callback(overrides.cloud.clone())),
        registry,
    );
    manager.set_auth_required(auth_required(group));

    let manager = &mut manager;
    match (group, action) {
        (COMMAND_CONFIGURATION, COMMAND_SHOW) => actions::common::show_configuration(manager, action_matches)?,
        (COMMAND_TOKEN, COMMAND_ISSUE) => actions::identity::issue_token(manager, action_matches)?,
        (COMMAND_CATALOG, COMMAND_LIST) => actions::identity::list_catalog(manager, action_matches)?,
        (COMMAND_PROJECT, COMMAND_LIST) => actions::identity::list_projects(manager, action_matches)?,
        (COMMAND_SERVER, COMMAND_LIST) => actions::resources::list_servers(manager, action_matches)?,
        (COMMAND_NETWORK, COMMAND_LIST) => actions::resources::list_networks(manager, action_matches)?,
        (COMMAND_VOLUME, COMMAND_LIST) => actions::resources::list_volumes(manager, action_matches)?,
        (COMMAND_CONTAINER, COMMAND_LIST) => actions::resources::list_containers(manager, action_matches)?,
        (COMMAND_IMAGE, COMMAND_LIST) => actions::resources::list_images(manager, action_matches)?,
        _ => return Err(CliError::UnsupportedSubcommand(format!("{} {}", group, action))),
    }
    Ok(())
}
