use clap::Command;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{requested_version, rest_client, version_option, ApiVersion, VersionedClient};
use crate::cache::ServiceHandle;
use crate::client_manager::{ClientManager, ClientManagerError};
use crate::format::Record;
use crate::plugin::{PluginError, ServicePlugin};
use crate::session::{RequestError, RestClient};

pub const API_NAME: &str = "network";
pub const SERVICE_TYPE: &str = "network";
pub const DEFAULT_API_VERSION: &str = "2.0";
pub const API_VERSION_OPTION: &str = "os-network-api-version";
const API_VERSION_ENV: &str = "OS_NETWORK_API_VERSION";

#[derive(Debug, Default)]
pub struct NetworkPlugin;

impl ServicePlugin for NetworkPlugin {
    fn api_name(&self) -> &str {
        API_NAME
    }

    fn make_client(&self, manager: &mut ClientManager) -> Result<ServiceHandle, ClientManagerError> {
        let api_version = requested_version(manager, API_NAME, DEFAULT_API_VERSION)?;
        let rest = rest_client(manager, SERVICE_TYPE)?;
        Ok(Arc::new(NetworkClient::new(rest, api_version)))
    }

    fn build_option_parser(&self, command: Command) -> Command {
        version_option(
            command,
            API_VERSION_OPTION,
            API_VERSION_ENV,
            "Network API version, default=2.0 (Env: OS_NETWORK_API_VERSION)",
        )
    }

    fn api_version_arg(&self) -> Option<&str> {
        Some(API_VERSION_OPTION)
    }
}

pub fn load() -> Result<Arc<dyn ServicePlugin>, PluginError> {
    Ok(Arc::new(NetworkPlugin))
}

#[derive(Debug, Clone)]
pub struct NetworkClient {
    rest: RestClient,
    api_version: ApiVersion,
}

impl VersionedClient for NetworkClient {
    fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }
}

#[derive(Debug, Deserialize)]
struct NetworkList {
    networks: Vec<Network>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub subnets: Vec<String>,
}

impl Record for Network {
    fn columns() -> Vec<&'static str> {
        vec!["ID", "NAME", "SUBNETS"]
    }

    fn values(&self) -> Vec<String> {
        vec![self.id.clone(), self.name.clone(), self.subnets.join(", ")]
    }
}

impl NetworkClient {
    pub fn new(rest: RestClient, api_version: ApiVersion) -> NetworkClient {
        NetworkClient { rest, api_version }
    }

    pub fn list_networks(&self) -> Result<Vec<Network>, RequestError> {
        let path = format!("v{}/networks", self.api_version);
        let list: NetworkList = self.rest.get_json(&path)?;
        Ok(list.networks)
    }
}
