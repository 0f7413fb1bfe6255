//! CLI command definitions and argument parsing.
//!
//! The command tree is built with the clap builder API. Service plugins add
//! their own global options (API version selectors) through
//! [`PluginRegistry::build_option_parser`].

use clap::Command;

use crate::plugin::PluginRegistry;

pub mod common;
pub mod identity;
pub mod params;
pub mod resources;

pub use params::{
    COMMAND_CATALOG, COMMAND_CONFIGURATION, COMMAND_CONTAINER, COMMAND_FORGET, COMMAND_IMAGE, COMMAND_ISSUE,
    COMMAND_LIST, COMMAND_MODULE, COMMAND_NETWORK, COMMAND_PASSWORD, COMMAND_PROJECT, COMMAND_SERVER,
    COMMAND_SHOW, COMMAND_STORE, COMMAND_TOKEN, COMMAND_VOLUME,
};

/// Create the command tree, including every plugin's global options.
pub fn create_cli_commands(registry: &PluginRegistry) -> Command {
    let command = Command::new("openstack")
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .propagate_version(true)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(params::verbose_parameter())
        .args(params::connection_parameters())
        .subcommand(identity::token_command())
        .subcommand(identity::catalog_command())
        .subcommand(identity::project_command())
        .subcommand(resources::server_command())
        .subcommand(resources::network_command())
        .subcommand(resources::volume_command())
        .subcommand(resources::container_command())
        .subcommand(resources::image_command())
        .subcommand(common::module_command())
        .subcommand(common::configuration_command())
        .subcommand(common::password_command());

    registry.build_option_parser(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::default_registry;

    #[test]
    fn test_command_tree_is_valid() {
        create_cli_commands(&default_registry()).debug_assert();
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let matches = create_cli_commands(&default_registry())
            .try_get_matches_from([
                "openstack",
                "server",
                "list",
                "--os-cloud",
                "devstack",
                "--os-compute-api-version",
                "2.79",
                "-f",
                "csv",
            ])
            .unwrap();

        assert_eq!(
            matches.get_one::<String>(params::PARAMETER_OS_CLOUD).map(String::as_str),
            Some("devstack")
        );
        let (group, sub_matches) = matches.subcommand().unwrap();
        assert_eq!(group, COMMAND_SERVER);
        let (action, list_matches) = sub_matches.subcommand().unwrap();
        assert_eq!(action, COMMAND_LIST);
        assert_eq!(
            list_matches.get_one::<String>(params::PARAMETER_FORMAT).map(String::as_str),
            Some("csv")
        );
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let result = create_cli_commands(&default_registry()).try_get_matches_from(["openstack", "image", "list", "-f", "yaml"]);
        assert!(result.is_err());
    }
}
