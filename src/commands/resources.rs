//! Resource listing commands of the compute, network, volume, object store
//! and image services.

use crate::commands::params::{
    list_subcommand, COMMAND_CONTAINER, COMMAND_IMAGE, COMMAND_NETWORK, COMMAND_SERVER, COMMAND_VOLUME,
};
use clap::Command;

fn resource_command(name: &'static str, about: &'static str, list_about: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .subcommand_required(true)
        .subcommand(list_subcommand(list_about))
}

pub fn server_command() -> Command {
    resource_command(COMMAND_SERVER, "Compute servers", "List servers")
}

pub fn network_command() -> Command {
    resource_command(COMMAND_NETWORK, "Networks", "List networks")
}

pub fn volume_command() -> Command {
    resource_command(COMMAND_VOLUME, "Block storage volumes", "List volumes")
}

pub fn container_command() -> Command {
    resource_command(COMMAND_CONTAINER, "Object store containers", "List containers")
}

pub fn image_command() -> Command {
    resource_command(COMMAND_IMAGE, "Images", "List images")
}
