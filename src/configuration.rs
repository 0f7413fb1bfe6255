use crate::options::{CliOptions, Verify, DEFAULT_AUTH_TYPE, DEFAULT_INTERFACE};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use serde_yaml;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

pub const DEFAULT_APPLICATION_ID: &str = "openstack";
pub const DEFAULT_CONFIGURATION_FILE_NAME: &str = "clouds.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("failed to resolve the configuration directory")]
    FailedToFindConfigurationDirectory,
    #[error("failed to load configuration data from {path:?}, because of: {cause}")]
    FailedToLoadData {
        path: PathBuf,
        cause: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("cloud {name:?} was not found in {path:?}")]
    UnknownCloud { name: String, path: PathBuf },
    #[error("invalid value for {name:?}: {reason}")]
    InvalidPropertyValue { name: String, reason: String },
}

/// `verify` in clouds.yaml is either a boolean or a CA bundle path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VerifySetting {
    Flag(bool),
    CaBundle(PathBuf),
}

/// One entry of the `clouds` mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CloudConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<String>,
    #[serde(default)]
    pub auth: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify: Option<VerifySetting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cacert: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_timeout: Option<u64>,
    /// `<service>_api_version` keys, e.g. `compute_api_version: "2.1"`.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl CloudConfig {
    pub fn api_versions(&self) -> BTreeMap<String, String> {
        self.extra
            .iter()
            .filter_map(|(key, value)| {
                let service = key.strip_suffix("_api_version")?;
                let version = match value {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    _ => return None,
                };
                Some((service.to_string(), version))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    clouds: BTreeMap<String, CloudConfig>,
    #[serde(skip)]
    source: Option<PathBuf>,
}

/// Values given on the command line; each one overrides the cloud's value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionOverrides {
    pub cloud: Option<String>,
    pub auth_type: Option<String>,
    pub auth_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub project_name: Option<String>,
    pub project_domain_name: Option<String>,
    pub user_domain_name: Option<String>,
    pub token: Option<String>,
    pub endpoint: Option<String>,
    pub region_name: Option<String>,
    pub interface: Option<String>,
    pub cacert: Option<PathBuf>,
    pub insecure: bool,
    pub timeout: Option<u64>,
    pub api_version: BTreeMap<String, String>,
}

impl Configuration {
    pub fn clouds(&self) -> &BTreeMap<String, CloudConfig> {
        &self.clouds
    }

    pub fn cloud(&self, name: &str) -> Option<&CloudConfig> {
        self.clouds.get(name)
    }

    pub fn add_cloud(&mut self, name: &str, cloud: CloudConfig) {
        self.clouds.insert(name.to_string(), cloud);
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Locate clouds.yaml: `OS_CLIENT_CONFIG_FILE`, then `OSC_CONFIG_DIR`,
    /// then the working directory, then the user configuration directory.
    pub fn get_default_configuration_file_path() -> Result<PathBuf, ConfigurationError> {
        if let Ok(path) = std::env::var("OS_CLIENT_CONFIG_FILE") {
            return Ok(PathBuf::from(path));
        }

        if let Ok(config_dir_str) = std::env::var("OSC_CONFIG_DIR") {
            let mut config_path = PathBuf::from(config_dir_str);
            config_path.push(DEFAULT_CONFIGURATION_FILE_NAME);
            return Ok(config_path);
        }

        let local = PathBuf::from(DEFAULT_CONFIGURATION_FILE_NAME);
        if local.is_file() {
            return Ok(local);
        }

        match config_dir() {
            Some(mut default_config_file_path) => {
                default_config_file_path.push(DEFAULT_APPLICATION_ID);
                default_config_file_path.push(DEFAULT_CONFIGURATION_FILE_NAME);
                Ok(default_config_file_path)
            }
            None => Err(ConfigurationError::FailedToFindConfigurationDirectory),
        }
    }

    /// Load the default clouds.yaml. A missing file is an empty configuration.
    pub fn load_default() -> Result<Configuration, ConfigurationError> {
        let path = Configuration::get_default_configuration_file_path()?;
        if !path.exists() {
            debug!("No clouds file at {}, using an empty configuration", path.display());
            return Ok(Configuration::default());
        }
        Configuration::load_from_file(path)
    }

    pub fn load_from_file(path: PathBuf) -> Result<Configuration, ConfigurationError> {
        debug!("Loading configuration from {}...", path.display());
        let content = fs::read_to_string(&path).map_err(|cause| ConfigurationError::FailedToLoadData {
            path: path.clone(),
            cause: Box::new(cause),
        })?;
        let mut configuration: Configuration =
            serde_yaml::from_str(&content).map_err(|cause| ConfigurationError::FailedToLoadData {
                path: path.clone(),
                cause: Box::new(cause),
            })?;
        configuration.source = Some(path);
        Ok(configuration)
    }

    /// Merge the selected cloud with the command-line values.
    ///
    /// When no auth type was requested and neither a token nor a username is
    /// known, the token/endpoint placeholders are injected; the client
    /// manager restores the requested type when the plugin rejects them.
    pub fn resolve(&self, overrides: &ConnectionOverrides) -> Result<CliOptions, ConfigurationError> {
        let cloud = match &overrides.cloud {
            Some(name) => Some(self.cloud(name).ok_or_else(|| ConfigurationError::UnknownCloud {
                name: name.clone(),
                path: self.source.clone().unwrap_or_default(),
            })?),
            None => None,
        };
        let cloud = cloud.cloned().unwrap_or_default();

        let requested_auth_type = overrides.auth_type.clone().or(cloud.auth_type.clone());
        let auth_type = requested_auth_type.clone().unwrap_or_else(|| {
            select_auth_type(
                overrides.token.is_some() || cloud.auth.contains_key("token"),
                overrides.endpoint.is_some() || cloud.auth.contains_key("endpoint"),
            )
        });

        let mut options = CliOptions::new(&auth_type);
        options.cloud = overrides.cloud.clone();

        for (key, value) in &cloud.auth {
            options.set_auth_option(key, value.clone());
        }
        let auth_overrides = [
            ("auth_url", &overrides.auth_url),
            ("username", &overrides.username),
            ("password", &overrides.password),
            ("project_name", &overrides.project_name),
            ("project_domain_name", &overrides.project_domain_name),
            ("user_domain_name", &overrides.user_domain_name),
            ("token", &overrides.token),
            ("endpoint", &overrides.endpoint),
        ];
        for (key, value) in auth_overrides {
            if let Some(value) = value {
                options.set_auth_option(key, value.as_str());
            }
        }

        options.region_name = overrides.region_name.clone().or(cloud.region_name.clone());
        options.interface = overrides
            .interface
            .clone()
            .or(cloud.interface.clone())
            .unwrap_or_else(|| DEFAULT_INTERFACE.to_string());
        options.timeout = overrides.timeout.or(cloud.api_timeout);

        let (insecure, cacert) = match (&cloud.verify, overrides.cacert.clone().or(cloud.cacert.clone())) {
            _ if overrides.insecure => (true, None),
            (Some(VerifySetting::Flag(false)), cacert) => (true, cacert),
            (Some(VerifySetting::CaBundle(path)), None) => (false, Some(path.clone())),
            (_, cacert) => (false, cacert),
        };
        options.cacert = cacert.clone();
        options.verify = Verify::derive(insecure, cacert);

        options.api_version = cloud.api_versions();
        options
            .api_version
            .extend(overrides.api_version.iter().map(|(k, v)| (k.clone(), v.clone())));

        if let Some(region) = options.region_name.clone() {
            options.set_config_value("region_name", region);
        }
        options.set_config_value("interface", options.interface.clone());

        if requested_auth_type.is_none()
            && options.auth_option("token").is_none()
            && options.auth_option("username").is_none()
            && options.auth_option("user_id").is_none()
        {
            debug!("No credentials given, injecting token/endpoint placeholders");
            options.inject_placeholder_auth();
        }

        Ok(options)
    }
}

/// Pick a plugin from the supplied options when none was requested.
pub fn select_auth_type(has_token: bool, has_endpoint: bool) -> String {
    match (has_token, has_endpoint) {
        (true, true) => "token_endpoint".to_string(),
        (true, false) => "token".to_string(),
        _ => DEFAULT_AUTH_TYPE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CLOUDS: &str = r#"
clouds:
  devstack:
    auth_type: password
    auth:
      auth_url: https://keystone.example.com/v3
      username: demo
      password: secret
      project_name: demo
      user_domain_name: Default
      project_domain_name: Default
    region_name: RegionOne
    interface: internal
    compute_api_version: "2.79"
    volume_api_version: 3
  lab:
    auth:
      auth_url: https://lab.example.com/v3
      username: admin
    verify: false
"#;

    fn load() -> Configuration {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(CLOUDS.as_bytes()).unwrap();
        Configuration::load_from_file(file.path().to_path_buf()).unwrap()
    }

    #[test]
    fn test_load_clouds_file() {
        let configuration = load();
        assert_eq!(configuration.clouds().len(), 2);

        let devstack = configuration.cloud("devstack").unwrap();
        assert_eq!(devstack.auth_type.as_deref(), Some("password"));
        assert_eq!(devstack.region_name.as_deref(), Some("RegionOne"));

        let versions = devstack.api_versions();
        assert_eq!(versions.get("compute").map(String::as_str), Some("2.79"));
        assert_eq!(versions.get("volume").map(String::as_str), Some("3"));
    }

    #[test]
    fn test_resolve_overrides_win() {
        let configuration = load();
        let overrides = ConnectionOverrides {
            cloud: Some("devstack".to_string()),
            region_name: Some("RegionTwo".to_string()),
            password: Some("from-cli".to_string()),
            ..Default::default()
        };

        let options = configuration.resolve(&overrides).unwrap();
        assert_eq!(options.auth_type, "password");
        assert_eq!(options.config_auth_type(), "password");
        assert_eq!(options.region_name.as_deref(), Some("RegionTwo"));
        assert_eq!(
            options.config().get("region_name").and_then(|v| v.as_str()),
            Some("RegionTwo")
        );
        assert_eq!(options.interface, "internal");
        assert_eq!(options.auth_option("password"), Some("from-cli"));
        assert_eq!(options.auth_option("username"), Some("demo"));
        assert_eq!(options.verify, Verify::System);
        assert!(!options.has_placeholder_token());
    }

    #[test]
    fn test_resolve_verify_false_is_insecure() {
        let configuration = load();
        let overrides = ConnectionOverrides {
            cloud: Some("lab".to_string()),
            cacert: Some(PathBuf::from("/tmp/ca.pem")),
            ..Default::default()
        };

        let options = configuration.resolve(&overrides).unwrap();
        assert!(options.insecure());
        assert_eq!(options.auth_type, "password");
    }

    #[test]
    fn test_resolve_cacert() {
        let configuration = Configuration::default();
        let overrides = ConnectionOverrides {
            cacert: Some(PathBuf::from("/tmp/ca.pem")),
            token: Some("abc".to_string()),
            endpoint: Some("https://nova.example.com".to_string()),
            ..Default::default()
        };

        let options = configuration.resolve(&overrides).unwrap();
        assert_eq!(options.verify, Verify::CaBundle(PathBuf::from("/tmp/ca.pem")));
        assert_eq!(options.auth_type, "token_endpoint");
    }

    #[test]
    fn test_resolve_without_credentials_injects_placeholder() {
        let configuration = Configuration::default();
        let options = configuration.resolve(&ConnectionOverrides::default()).unwrap();

        assert_eq!(options.auth_type, "password");
        assert_eq!(options.config_auth_type(), "token_endpoint");
        assert!(options.has_placeholder_token());
    }

    #[test]
    fn test_resolve_unknown_cloud() {
        let configuration = load();
        let overrides = ConnectionOverrides {
            cloud: Some("missing".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            configuration.resolve(&overrides),
            Err(ConfigurationError::UnknownCloud { .. })
        ));
    }

    #[test]
    fn test_select_auth_type() {
        assert_eq!(select_auth_type(true, true), "token_endpoint");
        assert_eq!(select_auth_type(true, false), "token");
        assert_eq!(select_auth_type(false, true), "password");
    }
}
