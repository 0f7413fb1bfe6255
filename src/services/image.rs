use clap::Command;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{requested_version, rest_client, version_option, ApiVersion, VersionedClient};
use crate::cache::ServiceHandle;
use crate::client_manager::{ClientManager, ClientManagerError};
use crate::format::Record;
use crate::plugin::{PluginError, ServicePlugin};
use crate::session::{RequestError, RestClient};

pub const API_NAME: &str = "image";
pub const SERVICE_TYPE: &str = "image";
pub const DEFAULT_API_VERSION: &str = "2";
pub const API_VERSION_OPTION: &str = "os-image-api-version";
const API_VERSION_ENV: &str = "OS_IMAGE_API_VERSION";

#[derive(Debug, Default)]
pub struct ImagePlugin;

impl ServicePlugin for ImagePlugin {
    fn api_name(&self) -> &str {
        API_NAME
    }

    fn make_client(&self, manager: &mut ClientManager) -> Result<ServiceHandle, ClientManagerError> {
        let api_version = requested_version(manager, API_NAME, DEFAULT_API_VERSION)?;
        let rest = rest_client(manager, SERVICE_TYPE)?;
        Ok(Arc::new(ImageClient::new(rest, api_version)))
    }

    fn build_option_parser(&self, command: Command) -> Command {
        version_option(
            command,
            API_VERSION_OPTION,
            API_VERSION_ENV,
            "Image API version, default=2 (Env: OS_IMAGE_API_VERSION)",
        )
    }

    fn api_version_arg(&self) -> Option<&str> {
        Some(API_VERSION_OPTION)
    }
}

pub fn load() -> Result<Arc<dyn ServicePlugin>, PluginError> {
    Ok(Arc::new(ImagePlugin))
}

#[derive(Debug, Clone)]
pub struct ImageClient {
    rest: RestClient,
    api_version: ApiVersion,
}

impl VersionedClient for ImageClient {
    fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }
}

#[derive(Debug, Deserialize)]
struct ImageList {
    images: Vec<Image>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub status: String,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

impl Record for Image {
    fn columns() -> Vec<&'static str> {
        vec!["ID", "NAME", "STATUS"]
    }

    fn values(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone().unwrap_or_default(),
            self.status.clone(),
        ]
    }
}

impl ImageClient {
    pub fn new(rest: RestClient, api_version: ApiVersion) -> ImageClient {
        ImageClient { rest, api_version }
    }

    pub fn list_images(&self) -> Result<Vec<Image>, RequestError> {
        let path = format!("v{}/images", self.api_version.major);
        let list: ImageList = self.rest.get_json(&path)?;
        Ok(list.images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test(flavor = "multi_thread")]
    async fn test_list_images() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/images"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "images": [
                    {"id": "i1", "name": "cirros", "status": "active", "visibility": "public", "size": 16338944}
                ],
                "first": "/v2/images"
            })))
            .mount(&server)
            .await;

        let uri = server.uri();
        let images = tokio::task::spawn_blocking(move || {
            ImageClient::new(test_support::rest_client(&uri), ApiVersion::new(2, None)).list_images()
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(images[0].values(), vec!["i1", "cirros", "active"]);
    }
}
