use clap::ArgMatches;
use tracing::debug;

use crate::actions::{print_records, CliActionError};
use crate::client_manager::ClientManager;
use crate::services::volume;

pub fn list_servers(manager: &mut ClientManager, matches: &ArgMatches) -> Result<(), CliActionError> {
    if !manager.is_compute_endpoint_enabled()? {
        return Err(CliActionError::ServiceUnavailable("compute"));
    }
    let servers = manager.compute()?.list_servers()?;
    debug!("Found {} servers", servers.len());
    print_records(&servers, matches)
}

pub fn list_networks(manager: &mut ClientManager, matches: &ArgMatches) -> Result<(), CliActionError> {
    if !manager.is_network_endpoint_enabled()? {
        return Err(CliActionError::ServiceUnavailable("network"));
    }
    let networks = manager.network()?.list_networks()?;
    print_records(&networks, matches)
}

pub fn list_volumes(manager: &mut ClientManager, matches: &ArgMatches) -> Result<(), CliActionError> {
    let version = volume::requested_api_version(manager)?;
    if !manager.is_volume_endpoint_enabled(&version)? {
        return Err(CliActionError::ServiceUnavailable("volume"));
    }
    let volumes = manager.volume()?.list_volumes()?;
    print_records(&volumes, matches)
}

pub fn list_containers(manager: &mut ClientManager, matches: &ArgMatches) -> Result<(), CliActionError> {
    let containers = manager.object_store()?.list_containers()?;
    print_records(&containers, matches)
}

pub fn list_images(manager: &mut ClientManager, matches: &ArgMatches) -> Result<(), CliActionError> {
    let images = manager.image()?.list_images()?;
    print_records(&images, matches)
}
