use clap::ArgMatches;
use serde::Serialize;

use crate::actions::{output_format, print_records, CliActionError};
use crate::client_manager::ClientManager;
use crate::commands::params::PARAMETER_UNMASK;
use crate::format::{format_properties, Record};
use crate::keyring::Keyring;
use crate::plugin::PluginRegistry;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleRow {
    pub name: String,
    pub group: String,
    pub version_option: Option<String>,
}

impl Record for ModuleRow {
    fn columns() -> Vec<&'static str> {
        vec!["NAME", "GROUP", "VERSION_OPTION"]
    }

    fn values(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.group.clone(),
            self.version_option.clone().unwrap_or_default(),
        ]
    }
}

pub fn module_rows(registry: &PluginRegistry) -> Vec<ModuleRow> {
    registry
        .plugins()
        .map(|registered| ModuleRow {
            name: registered.plugin.api_name().to_string(),
            group: registered.group.to_string(),
            version_option: registered.plugin.api_version_arg().map(|arg| format!("--{}", arg)),
        })
        .collect()
}

pub fn list_modules(registry: &PluginRegistry, matches: &ArgMatches) -> Result<(), CliActionError> {
    print_records(&module_rows(registry), matches)
}

pub fn show_configuration(manager: &ClientManager, matches: &ArgMatches) -> Result<(), CliActionError> {
    let configuration = if matches.get_flag(PARAMETER_UNMASK) {
        manager.options().config().clone()
    } else {
        manager.get_configuration()
    };
    println!("{}", format_properties(&configuration, &output_format(matches)?)?);
    Ok(())
}

fn require_cloud(cloud: Option<&str>) -> Result<&str, CliActionError> {
    cloud.ok_or_else(|| CliActionError::MissingRequiredArgument("--os-cloud".to_string()))
}

pub fn store_password(cloud: Option<&str>) -> Result<(), CliActionError> {
    let cloud = require_cloud(cloud)?;
    let password = inquire::Password::new(&format!("Password for cloud {}:", cloud))
        .prompt()
        .map_err(|e| CliActionError::PasswordPrompt(e.to_string()))?;
    Keyring::default().put(cloud, &password)?;
    Ok(())
}

pub fn forget_password(cloud: Option<&str>) -> Result<(), CliActionError> {
    Keyring::default().delete(require_cloud(cloud)?)?;
    Ok(())
}
