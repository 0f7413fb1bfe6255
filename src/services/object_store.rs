use clap::Command;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{requested_version, rest_client, version_option, ApiVersion, VersionedClient};
use crate::cache::ServiceHandle;
use crate::client_manager::{ClientManager, ClientManagerError};
use crate::format::Record;
use crate::plugin::{PluginError, ServicePlugin};
use crate::session::{RequestError, RestClient};

pub const API_NAME: &str = "object_store";
pub const SERVICE_TYPE: &str = "object-store";
pub const DEFAULT_API_VERSION: &str = "1";
pub const API_VERSION_OPTION: &str = "os-object-api-version";
const API_VERSION_ENV: &str = "OS_OBJECT_API_VERSION";

#[derive(Debug, Default)]
pub struct ObjectStorePlugin;

impl ServicePlugin for ObjectStorePlugin {
    fn api_name(&self) -> &str {
        API_NAME
    }

    fn make_client(&self, manager: &mut ClientManager) -> Result<ServiceHandle, ClientManagerError> {
        let api_version = requested_version(manager, API_NAME, DEFAULT_API_VERSION)?;
        let rest = rest_client(manager, SERVICE_TYPE)?;
        Ok(Arc::new(ObjectStoreClient::new(rest, api_version)))
    }

    fn build_option_parser(&self, command: Command) -> Command {
        version_option(
            command,
            API_VERSION_OPTION,
            API_VERSION_ENV,
            "Object API version, default=1 (Env: OS_OBJECT_API_VERSION)",
        )
    }

    fn api_version_arg(&self) -> Option<&str> {
        Some(API_VERSION_OPTION)
    }
}

pub fn load() -> Result<Arc<dyn ServicePlugin>, PluginError> {
    Ok(Arc::new(ObjectStorePlugin))
}

#[derive(Debug, Clone)]
pub struct ObjectStoreClient {
    rest: RestClient,
    api_version: ApiVersion,
}

impl VersionedClient for ObjectStoreClient {
    fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub name: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub bytes: u64,
}

impl Record for Container {
    fn columns() -> Vec<&'static str> {
        vec!["NAME", "COUNT", "BYTES"]
    }

    fn values(&self) -> Vec<String> {
        vec![self.name.clone(), self.count.to_string(), self.bytes.to_string()]
    }
}

impl ObjectStoreClient {
    pub fn new(rest: RestClient, api_version: ApiVersion) -> ObjectStoreClient {
        ObjectStoreClient { rest, api_version }
    }

    /// The endpoint is the account URL itself (`.../v1/AUTH_<project>`).
    pub fn list_containers(&self) -> Result<Vec<Container>, RequestError> {
        let mut url = self.rest.endpoint().clone();
        url.query_pairs_mut().append_pair("format", "json");
        self.rest.send_json(self.rest.get_url(url))
    }
}
