use clap::Command;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{requested_version, version_option, ApiVersion, VersionedClient};
use crate::cache::ServiceHandle;
use crate::client_manager::{ClientManager, ClientManagerError};
use crate::format::Record;
use crate::plugin::{PluginError, ServicePlugin};
use crate::session::{RequestError, RestClient};

pub const API_NAME: &str = "volume";
pub const SERVICE_TYPE: &str = "volume";
pub const DEFAULT_API_VERSION: &str = "3";
pub const API_VERSION_OPTION: &str = "os-volume-api-version";
const API_VERSION_ENV: &str = "OS_VOLUME_API_VERSION";

#[derive(Debug, Default)]
pub struct VolumePlugin;

impl ServicePlugin for VolumePlugin {
    fn api_name(&self) -> &str {
        API_NAME
    }

    /// Prefers the versioned catalog type (`volumev3`) and falls back to
    /// `volume`.
    fn make_client(&self, manager: &mut ClientManager) -> Result<ServiceHandle, ClientManagerError> {
        let api_version = requested_api_version(manager)?;
        let versioned = format!("{}v{}", SERVICE_TYPE, api_version.major);
        let endpoint = match manager.get_endpoint_for_service_type(&versioned) {
            Ok(endpoint) => endpoint,
            Err(ClientManagerError::EndpointNotFound { .. }) => manager.get_endpoint_for_service_type(SERVICE_TYPE)?,
            Err(e) => return Err(e),
        };
        let token = manager.auth_token()?;
        let session = manager.session()?;
        Ok(Arc::new(VolumeClient::new(
            RestClient::new(session, endpoint, token),
            api_version,
        )))
    }

    fn build_option_parser(&self, command: Command) -> Command {
        version_option(
            command,
            API_VERSION_OPTION,
            API_VERSION_ENV,
            "Volume API version, default=3 (Env: OS_VOLUME_API_VERSION)",
        )
    }

    fn api_version_arg(&self) -> Option<&str> {
        Some(API_VERSION_OPTION)
    }
}

/// Version the volume client will be built with.
pub fn requested_api_version(manager: &ClientManager) -> Result<ApiVersion, ClientManagerError> {
    requested_version(manager, API_NAME, DEFAULT_API_VERSION)
}

pub fn load() -> Result<Arc<dyn ServicePlugin>, PluginError> {
    Ok(Arc::new(VolumePlugin))
}

#[derive(Debug, Clone)]
pub struct VolumeClient {
    rest: RestClient,
    api_version: ApiVersion,
}

impl VersionedClient for VolumeClient {
    fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }
}

#[derive(Debug, Deserialize)]
struct VolumeList {
    volumes: Vec<Volume>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub status: String,
    pub size: u64,
    #[serde(default)]
    pub bootable: Option<String>,
}

impl Record for Volume {
    fn columns() -> Vec<&'static str> {
        vec!["ID", "NAME", "STATUS", "SIZE"]
    }

    fn values(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone().unwrap_or_default(),
            self.status.clone(),
            self.size.to_string(),
        ]
    }
}

impl VolumeClient {
    pub fn new(rest: RestClient, api_version: ApiVersion) -> VolumeClient {
        VolumeClient { rest, api_version }
    }

    pub fn list_volumes(&self) -> Result<Vec<Volume>, RequestError> {
        let mut request = self.rest.get("volumes/detail")?;
        if let Some(minor) = self.api_version.minor {
            request = request.header(
                "OpenStack-API-Version",
                format!("volume {}.{}", self.api_version.major, minor),
            );
        }
        let list: VolumeList = self.rest.send_json(request)?;
        Ok(list.volumes)
    }
}
