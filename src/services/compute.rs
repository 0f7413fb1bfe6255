use clap::Command;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use super::{requested_version, rest_client, version_option, ApiVersion, VersionedClient};
use crate::cache::ServiceHandle;
use crate::client_manager::{ClientManager, ClientManagerError};
use crate::format::Record;
use crate::plugin::{PluginError, ServicePlugin};
use crate::session::{RequestError, RestClient};

pub const API_NAME: &str = "compute";
pub const SERVICE_TYPE: &str = "compute";
pub const DEFAULT_API_VERSION: &str = "2.1";
pub const API_VERSION_OPTION: &str = "os-compute-api-version";
const API_VERSION_ENV: &str = "OS_COMPUTE_API_VERSION";

/// Microversion header understood by every Nova release.
pub const MICROVERSION_HEADER: &str = "X-OpenStack-Nova-API-Version";

#[derive(Debug, Default)]
pub struct ComputePlugin;

impl ServicePlugin for ComputePlugin {
    fn api_name(&self) -> &str {
        API_NAME
    }

    fn make_client(&self, manager: &mut ClientManager) -> Result<ServiceHandle, ClientManagerError> {
        let api_version = requested_version(manager, API_NAME, DEFAULT_API_VERSION)?;
        let rest = rest_client(manager, SERVICE_TYPE)?;
        debug!("Compute client uses microversion {} at {}", api_version, rest.endpoint());
        Ok(Arc::new(ComputeClient::new(rest, api_version)))
    }

    fn build_option_parser(&self, command: Command) -> Command {
        version_option(
            command,
            API_VERSION_OPTION,
            API_VERSION_ENV,
            "Compute API version, default=2.1 (Env: OS_COMPUTE_API_VERSION)",
        )
    }

    fn api_version_arg(&self) -> Option<&str> {
        Some(API_VERSION_OPTION)
    }
}

pub fn load() -> Result<Arc<dyn ServicePlugin>, PluginError> {
    Ok(Arc::new(ComputePlugin))
}

#[derive(Debug, Clone)]
pub struct ComputeClient {
    rest: RestClient,
    api_version: ApiVersion,
}

impl VersionedClient for ComputeClient {
    fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }
}

#[derive(Debug, Deserialize)]
struct ServerList {
    servers: Vec<Server>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerAddress {
    pub addr: String,
    #[serde(default)]
    pub version: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub id: String,
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub addresses: BTreeMap<String, Vec<ServerAddress>>,
}

impl Server {
    /// `net1=10.0.0.3, fd00::3; net2=192.168.1.4`
    pub fn networks(&self) -> String {
        self.addresses
            .iter()
            .map(|(network, addresses)| {
                let addrs: Vec<&str> = addresses.iter().map(|a| a.addr.as_str()).collect();
                format!("{}={}", network, addrs.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl Record for Server {
    fn columns() -> Vec<&'static str> {
        vec!["ID", "NAME", "STATUS", "NETWORKS"]
    }

    fn values(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.status.clone(),
            self.networks(),
        ]
    }
}

impl ComputeClient {
    pub fn new(rest: RestClient, api_version: ApiVersion) -> ComputeClient {
        ComputeClient { rest, api_version }
    }

    pub fn list_servers(&self) -> Result<Vec<Server>, RequestError> {
        let request = self
            .rest
            .get("servers/detail")?
            .header(MICROVERSION_HEADER, self.api_version.to_string());
        let list: ServerList = self.rest.send_json(request)?;
        Ok(list.servers)
    }
}
