//! Service catalog returned by the Identity service with a token.

use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEndpoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub interface: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_id: Option<String>,
    pub url: Url,
}

impl CatalogEndpoint {
    fn in_region(&self, region: Option<&str>) -> bool {
        match region {
            None => true,
            Some(region) => {
                self.region.as_deref() == Some(region) || self.region_id.as_deref() == Some(region)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub endpoints: Vec<CatalogEndpoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceCatalog {
    entries: Vec<CatalogEntry>,
}

impl ServiceCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> ServiceCatalog {
        ServiceCatalog { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// A service is available when its type is listed with at least one
    /// endpoint.
    pub fn is_service_available(&self, service_type: &str) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.service_type == service_type && !entry.endpoints.is_empty())
    }

    pub fn endpoint_for(&self, service_type: &str, interface: &str, region: Option<&str>) -> Option<&Url> {
        self.entries
            .iter()
            .filter(|entry| entry.service_type == service_type)
            .flat_map(|entry| entry.endpoints.iter())
            .find(|endpoint| endpoint.interface == interface && endpoint.in_region(region))
            .map(|endpoint| &endpoint.url)
    }
}
