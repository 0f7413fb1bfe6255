//! Identity command definitions: tokens, the service catalog and projects.

use crate::commands::params::{
    format_parameter, format_pretty_parameter, format_with_headers_parameter, list_subcommand,
    COMMAND_CATALOG, COMMAND_ISSUE, COMMAND_PROJECT, COMMAND_TOKEN,
};
use clap::Command;

pub fn token_command() -> Command {
    Command::new(COMMAND_TOKEN)
        .about("Authentication tokens")
        .subcommand_required(true)
        .subcommand(
            Command::new(COMMAND_ISSUE)
                .about("Issue a new token")
                .arg(format_parameter())
                .arg(format_pretty_parameter())
                .arg(format_with_headers_parameter()),
        )
}

pub fn catalog_command() -> Command {
    Command::new(COMMAND_CATALOG)
        .about("Service catalog of the current token")
        .subcommand_required(true)
        .subcommand(list_subcommand("List services in the service catalog"))
}

pub fn project_command() -> Command {
    Command::new(COMMAND_PROJECT)
        .about("Identity projects")
        .subcommand_required(true)
        .subcommand(list_subcommand("List projects"))
}
