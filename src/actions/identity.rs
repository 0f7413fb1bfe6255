use clap::ArgMatches;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::trace;

use crate::actions::{output_format, print_records, CliActionError};
use crate::auth::CatalogEntry;
use crate::client_manager::ClientManager;
use crate::format::{format_properties, Record};

/// One service of the catalog, endpoints flattened into a single column.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogRow {
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub endpoints: Vec<String>,
}

impl From<&CatalogEntry> for CatalogRow {
    fn from(entry: &CatalogEntry) -> Self {
        let endpoints = entry
            .endpoints
            .iter()
            .map(|endpoint| {
                format!(
                    "{} {}: {}",
                    endpoint.region.as_deref().unwrap_or("-"),
                    endpoint.interface,
                    endpoint.url
                )
            })
            .collect();
        CatalogRow {
            name: entry.name.clone(),
            service_type: entry.service_type.clone(),
            endpoints,
        }
    }
}

impl Record for CatalogRow {
    fn columns() -> Vec<&'static str> {
        vec!["NAME", "TYPE", "ENDPOINTS"]
    }

    fn values(&self) -> Vec<String> {
        vec![self.name.clone(), self.service_type.clone(), self.endpoints.join("; ")]
    }
}

pub fn issue_token(manager: &mut ClientManager, matches: &ArgMatches) -> Result<(), CliActionError> {
    let access = manager.auth_ref()?.ok_or(CliActionError::NotAuthenticated)?;
    trace!("Issued token for user {:?}", access.user_id);

    let mut properties = Map::new();
    properties.insert("expires".to_string(), Value::from(access.expires_at.clone()));
    properties.insert("id".to_string(), Value::from(access.token.clone()));
    properties.insert("project_id".to_string(), Value::from(access.project_id.clone()));
    properties.insert("user_id".to_string(), Value::from(access.user_id.clone()));

    println!("{}", format_properties(&properties, &output_format(matches)?)?);
    Ok(())
}

pub fn list_catalog(manager: &mut ClientManager, matches: &ArgMatches) -> Result<(), CliActionError> {
    let rows: Vec<CatalogRow> = manager
        .auth_ref()?
        .and_then(|access| access.service_catalog.as_ref())
        .map(|catalog| catalog.entries().iter().map(CatalogRow::from).collect())
        .unwrap_or_default();
    print_records(&rows, matches)
}

pub fn list_projects(manager: &mut ClientManager, matches: &ArgMatches) -> Result<(), CliActionError> {
    let projects = manager.identity()?.list_projects()?;
    print_records(&projects, matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CatalogEndpoint;
    use url::Url;

    #[test]
    fn test_catalog_row_flattens_endpoints() {
        let entry = CatalogEntry {
            id: None,
            service_type: "compute".to_string(),
            name: "nova".to_string(),
            endpoints: vec![
                CatalogEndpoint {
                    id: None,
                    interface: "public".to_string(),
                    region: Some("RegionOne".to_string()),
                    region_id: None,
                    url: Url::parse("https://nova.example.com/v2.1").unwrap(),
                },
                CatalogEndpoint {
                    id: None,
                    interface: "internal".to_string(),
                    region: None,
                    region_id: None,
                    url: Url::parse("http://10.0.0.5:8774/v2.1").unwrap(),
                },
            ],
        };

        let row = CatalogRow::from(&entry);
        assert_eq!(
            row.values(),
            vec![
                "nova",
                "compute",
                "RegionOne public: https://nova.example.com/v2.1; - internal: http://10.0.0.5:8774/v2.1"
            ]
        );
    }
}
