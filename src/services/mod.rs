//! Built-in service plugins.
//!
//! Each module exposes the API name the client manager registers it under, a
//! `load` constructor used by the descriptor tables below, the typed client
//! and the records its listing operations return.

use clap::{Arg, Command};
use std::fmt;
use std::str::FromStr;

use crate::client_manager::{ClientManager, ClientManagerError};
use crate::plugin::{PluginDescriptor, PluginRegistry};
use crate::session::RestClient;

pub mod compute;
pub mod identity;
pub mod image;
pub mod network;
pub mod object_store;
pub mod volume;

/// Plugins shipped with the client.
pub const BASE_PLUGINS: &[PluginDescriptor] = &[
    PluginDescriptor {
        name: identity::API_NAME,
        load: identity::load,
    },
    PluginDescriptor {
        name: compute::API_NAME,
        load: compute::load,
    },
    PluginDescriptor {
        name: network::API_NAME,
        load: network::load,
    },
    PluginDescriptor {
        name: volume::API_NAME,
        load: volume::load,
    },
    PluginDescriptor {
        name: object_store::API_NAME,
        load: object_store::load,
    },
    PluginDescriptor {
        name: image::API_NAME,
        load: image::load,
    },
];

/// Plugins registered after the base group; an entry here replaces the base
/// plugin with the same API name.
pub const EXTENSION_PLUGINS: &[PluginDescriptor] = &[];

pub fn default_registry() -> PluginRegistry {
    PluginRegistry::discover(BASE_PLUGINS, EXTENSION_PLUGINS)
}

/// `major[.minor]` API version, with an optional leading `v`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ApiVersion {
    pub major: u32,
    pub minor: Option<u32>,
}

impl ApiVersion {
    pub const fn new(major: u32, minor: Option<u32>) -> ApiVersion {
        ApiVersion { major, minor }
    }
}

impl FromStr for ApiVersion {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix(|c: char| c.eq_ignore_ascii_case(&'v')).unwrap_or(s);
        match s.split_once('.') {
            Some((major, minor)) => Ok(ApiVersion::new(major.parse()?, Some(minor.parse()?))),
            None => Ok(ApiVersion::new(s.parse()?, None)),
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.minor {
            Some(minor) => write!(f, "{}.{}", self.major, minor),
            None => write!(f, "{}", self.major),
        }
    }
}

/// Clients that know which API version they speak.
pub trait VersionedClient {
    fn api_version(&self) -> &ApiVersion;
}

impl VersionedClient for ApiVersion {
    fn api_version(&self) -> &ApiVersion {
        self
    }
}

/// Requested version for `api_name`, falling back to `default`.
pub(crate) fn requested_version(
    manager: &ClientManager,
    api_name: &str,
    default: &str,
) -> Result<ApiVersion, ClientManagerError> {
    let raw = manager.api_version(api_name).unwrap_or(default);
    raw.parse().map_err(|_| ClientManagerError::InvalidApiVersion {
        service: api_name.to_string(),
        version: raw.to_string(),
    })
}

/// Authenticated REST client for the catalog endpoint of `service_type`.
pub(crate) fn rest_client(
    manager: &mut ClientManager,
    service_type: &str,
) -> Result<RestClient, ClientManagerError> {
    let endpoint = manager.get_endpoint_for_service_type(service_type)?;
    let token = manager.auth_token()?;
    let session = manager.session()?;
    Ok(RestClient::new(session, endpoint, token))
}

/// Global `--os-<service>-api-version` option.
pub(crate) fn version_option(
    command: Command,
    id: &'static str,
    env: &'static str,
    help: &'static str,
) -> Command {
    command.arg(
        Arg::new(id)
            .long(id)
            .env(env)
            .value_name("VERSION")
            .global(true)
            .help_heading("Service API versions")
            .help(help),
    )
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_api_version() {
        assert_eq!("2.1".parse::<ApiVersion>().unwrap(), ApiVersion::new(2, Some(1)));
        assert_eq!("v3".parse::<ApiVersion>().unwrap(), ApiVersion::new(3, None));
        assert_eq!(" 2 ".parse::<ApiVersion>().unwrap(), ApiVersion::new(2, None));
        assert!("latest".parse::<ApiVersion>().is_err());
        assert!("2.".parse::<ApiVersion>().is_err());
        assert_eq!(ApiVersion::new(2, Some(79)).to_string(), "2.79");
    }

    #[test]
    fn test_default_registry_has_base_services() {
        let registry = default_registry();
        assert_eq!(
            registry.names(),
            vec!["compute", "identity", "image", "network", "object_store", "volume"]
        );
    }

    #[test]
    fn test_version_options_are_registered() {
        let registry = default_registry();
        let command = registry.build_option_parser(Command::new("openstack"));
        let matches = command
            .try_get_matches_from(["openstack", "--os-volume-api-version", "2", "--os-compute-api-version", "2.79"])
            .unwrap();

        let versions = registry.api_versions(&matches);
        assert_eq!(versions.get("volume").map(String::as_str), Some("2"));
        assert_eq!(versions.get("compute").map(String::as_str), Some("2.79"));
    }
}
