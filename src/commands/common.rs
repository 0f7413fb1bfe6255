//! Commands that never authenticate: loaded modules, the effective
//! configuration and stored passwords.

use crate::commands::params::{
    format_parameter, format_pretty_parameter, format_with_headers_parameter, list_subcommand,
    unmask_parameter, COMMAND_CONFIGURATION, COMMAND_FORGET, COMMAND_MODULE, COMMAND_PASSWORD, COMMAND_SHOW,
    COMMAND_STORE,
};
use clap::Command;

pub fn module_command() -> Command {
    Command::new(COMMAND_MODULE)
        .about("Service plugins")
        .subcommand_required(true)
        .subcommand(list_subcommand("List the registered service plugins"))
}

pub fn configuration_command() -> Command {
    Command::new(COMMAND_CONFIGURATION)
        .about("Effective connection configuration")
        .subcommand_required(true)
        .subcommand(
            Command::new(COMMAND_SHOW)
                .about("Show the merged configuration")
                .arg(unmask_parameter())
                .arg(format_parameter())
                .arg(format_pretty_parameter())
                .arg(format_with_headers_parameter()),
        )
}

pub fn password_command() -> Command {
    Command::new(COMMAND_PASSWORD)
        .about("Passwords stored in the system keyring for the selected cloud")
        .subcommand_required(true)
        .subcommand(Command::new(COMMAND_STORE).about("Prompt for a password and store it"))
        .subcommand(Command::new(COMMAND_FORGET).about("Delete the stored password"))
}
