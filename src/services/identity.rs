use clap::Command;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{requested_version, rest_client, version_option, ApiVersion, VersionedClient};
use crate::cache::ServiceHandle;
use crate::client_manager::{ClientManager, ClientManagerError};
use crate::format::Record;
use crate::plugin::{PluginError, ServicePlugin};
use crate::session::{RequestError, RestClient};

pub const API_NAME: &str = "identity";
pub const SERVICE_TYPE: &str = "identity";
pub const DEFAULT_API_VERSION: &str = "3";
pub const API_VERSION_OPTION: &str = "os-identity-api-version";
const API_VERSION_ENV: &str = "OS_IDENTITY_API_VERSION";

#[derive(Debug, Default)]
pub struct IdentityPlugin;

impl ServicePlugin for IdentityPlugin {
    fn api_name(&self) -> &str {
        API_NAME
    }

    fn make_client(&self, manager: &mut ClientManager) -> Result<ServiceHandle, ClientManagerError> {
        let api_version = requested_version(manager, API_NAME, DEFAULT_API_VERSION)?;
        if api_version.major != 3 {
            return Err(ClientManagerError::InvalidApiVersion {
                service: API_NAME.to_string(),
                version: api_version.to_string(),
            });
        }
        let rest = rest_client(manager, SERVICE_TYPE)?;
        Ok(Arc::new(IdentityClient::new(rest, api_version)))
    }

    fn build_option_parser(&self, command: Command) -> Command {
        version_option(
            command,
            API_VERSION_OPTION,
            API_VERSION_ENV,
            "Identity API version, default=3 (Env: OS_IDENTITY_API_VERSION)",
        )
    }

    fn api_version_arg(&self) -> Option<&str> {
        Some(API_VERSION_OPTION)
    }
}

pub fn load() -> Result<Arc<dyn ServicePlugin>, PluginError> {
    Ok(Arc::new(IdentityPlugin))
}

#[derive(Debug, Clone)]
pub struct IdentityClient {
    rest: RestClient,
    api_version: ApiVersion,
}

impl VersionedClient for IdentityClient {
    fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }
}

#[derive(Debug, Deserialize)]
struct ProjectList {
    projects: Vec<Project>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub domain_id: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub description: Option<String>,
}

impl Record for Project {
    fn columns() -> Vec<&'static str> {
        vec!["ID", "NAME", "DOMAIN_ID", "ENABLED"]
    }

    fn values(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.domain_id.clone().unwrap_or_default(),
            self.enabled.to_string(),
        ]
    }
}

impl IdentityClient {
    pub fn new(rest: RestClient, api_version: ApiVersion) -> IdentityClient {
        IdentityClient { rest, api_version }
    }

    /// Catalog identity endpoints may be unversioned.
    fn versioned_path(&self, path: &str) -> String {
        if self.rest.endpoint().path().trim_end_matches('/').ends_with("/v3") {
            path.to_string()
        } else {
            format!("v3/{}", path)
        }
    }

    pub fn list_projects(&self) -> Result<Vec<Project>, RequestError> {
        let list: ProjectList = self.rest.get_json(&self.versioned_path("projects"))?;
        Ok(list.projects)
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
    async fn test_list_projects_on_unversioned_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/identity/v3/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "projects": [
                    {"id": "p1", "name": "admin", "domain_id": "default", "enabled": true},
                    {"id": "p2", "name": "demo", "domain_id": "default", "enabled": false}
                ]
            })))
            .mount(&server)
            .await;

        let uri = format!("{}/identity", server.uri());
        let projects = tokio::task::spawn_blocking(move || {
            IdentityClient::new(test_support::rest_client(&uri), ApiVersion::new(3, None)).list_projects()
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(projects.len(), 2);
        assert_eq!(projects[1].values(), vec!["p2", "demo", "default", "false"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_list_projects_forbidden() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/projects"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let uri = format!("{}/v3", server.uri());
        let result = tokio::task::spawn_blocking(move || {
            IdentityClient::new(test_support::rest_client(&uri), ApiVersion::new(3, None)).list_projects()
        })
        .await
        .unwrap();

        assert!(matches!(result, Err(RequestError::UnexpectedResponse { .. })));
    }
}
