//! Connection options handed to the [`ClientManager`](crate::client_manager::ClientManager).
//!
//! `CliOptions` is the merged view of the selected cloud from `clouds.yaml`
//! and the command-line flags. Besides the typed connection settings it keeps
//! the raw options blob (`config`) that auth plugin loading works from.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::AuthLoadError;

/// Value injected for `auth.token` and `auth.endpoint` when a plugin needs
/// the fields present before the real credentials are known.
pub const PLACEHOLDER: &str = "x";

pub const DEFAULT_INTERFACE: &str = "public";
pub const DEFAULT_AUTH_TYPE: &str = "password";
pub const TOKEN_ENDPOINT_AUTH_TYPE: &str = "token_endpoint";

const MASK: &str = "***";
const SECRET_KEYS: [&str; 4] = ["password", "token", "secret", "application_credential_secret"];

/// Interactive password source used by plugins that are missing a secret.
pub type PasswordCallback = Arc<dyn Fn(&str) -> Result<String, AuthLoadError> + Send + Sync>;

/// TLS verification policy.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Verify {
    /// Verify against the system trust store
    #[default]
    System,
    /// Skip certificate verification
    Insecure,
    /// Verify against this CA bundle
    CaBundle(PathBuf),
}

impl Verify {
    /// An explicit insecure flag wins over a CA bundle; otherwise the bundle
    /// wins over the default.
    pub fn derive(insecure: bool, cacert: Option<PathBuf>) -> Verify {
        match (insecure, cacert) {
            (true, _) => Verify::Insecure,
            (false, Some(path)) => Verify::CaBundle(path),
            (false, None) => Verify::System,
        }
    }

    pub fn is_insecure(&self) -> bool {
        matches!(self, Verify::Insecure)
    }

    pub fn ca_bundle(&self) -> Option<&PathBuf> {
        match self {
            Verify::CaBundle(path) => Some(path),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct CliOptions {
    pub cloud: Option<String>,
    pub region_name: Option<String>,
    pub interface: String,
    pub cacert: Option<PathBuf>,
    pub verify: Verify,
    pub api_version: BTreeMap<String, String>,
    /// Auth type the user asked for; the blob may temporarily hold another.
    pub auth_type: String,
    pub timeout: Option<u64>,
    config: Map<String, Value>,
    password_callback: Option<PasswordCallback>,
}

impl fmt::Debug for CliOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CliOptions")
            .field("cloud", &self.cloud)
            .field("region_name", &self.region_name)
            .field("interface", &self.interface)
            .field("verify", &self.verify)
            .field("auth_type", &self.auth_type)
            .field("config", &self.masked_config())
            .finish()
    }
}

impl Default for CliOptions {
    fn default() -> Self {
        CliOptions::new(DEFAULT_AUTH_TYPE)
    }
}

impl CliOptions {
    pub fn new(auth_type: &str) -> CliOptions {
        let mut config = Map::new();
        config.insert("auth_type".to_string(), Value::String(auth_type.to_string()));
        config.insert("auth".to_string(), Value::Object(Map::new()));

        CliOptions {
            cloud: None,
            region_name: None,
            interface: DEFAULT_INTERFACE.to_string(),
            cacert: None,
            verify: Verify::System,
            api_version: BTreeMap::new(),
            auth_type: auth_type.to_string(),
            timeout: None,
            config,
            password_callback: None,
        }
    }

    /// Raw options blob passed through to the auth plugin loader.
    pub fn config(&self) -> &Map<String, Value> {
        &self.config
    }

    /// Auth type currently recorded in the options blob.
    pub fn config_auth_type(&self) -> &str {
        self.config
            .get("auth_type")
            .and_then(Value::as_str)
            .unwrap_or(&self.auth_type)
    }

    pub fn set_config_auth_type(&mut self, auth_type: &str) {
        self.config
            .insert("auth_type".to_string(), Value::String(auth_type.to_string()));
    }

    pub fn auth(&self) -> Option<&Map<String, Value>> {
        self.config.get("auth").and_then(Value::as_object)
    }

    fn auth_mut(&mut self) -> &mut Map<String, Value> {
        let auth = self
            .config
            .entry("auth".to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !auth.is_object() {
            *auth = Value::Object(Map::new());
        }
        match auth {
            Value::Object(map) => map,
            _ => unreachable!("auth was normalised to an object above"),
        }
    }

    pub fn auth_option(&self, key: &str) -> Option<&str> {
        self.auth().and_then(|auth| auth.get(key)).and_then(Value::as_str)
    }

    pub fn set_auth_option(&mut self, key: &str, value: impl Into<Value>) {
        self.auth_mut().insert(key.to_string(), value.into());
    }

    pub fn remove_auth_option(&mut self, key: &str) -> Option<Value> {
        self.auth_mut().remove(key)
    }

    /// Inserts a top-level (non-auth) entry into the options blob.
    pub fn set_config_value(&mut self, key: &str, value: impl Into<Value>) {
        self.config.insert(key.to_string(), value.into());
    }

    /// Fill `auth.token`/`auth.endpoint` with [`PLACEHOLDER`] and select the
    /// token/endpoint plugin in the blob. `auth_type` keeps the requested type.
    pub fn inject_placeholder_auth(&mut self) {
        self.set_auth_option("token", PLACEHOLDER);
        self.set_auth_option("endpoint", PLACEHOLDER);
        self.set_config_auth_type(TOKEN_ENDPOINT_AUTH_TYPE);
    }

    pub fn has_placeholder_token(&self) -> bool {
        self.auth_option("token") == Some(PLACEHOLDER)
    }

    pub fn insecure(&self) -> bool {
        self.verify.is_insecure()
    }

    pub fn set_password_callback(&mut self, callback: PasswordCallback) {
        self.password_callback = Some(callback);
    }

    pub fn has_password_callback(&self) -> bool {
        self.password_callback.is_some()
    }

    /// Ask the installed callback for a secret; `None` when no callback is set.
    pub fn prompt_for_password(&self, prompt: &str) -> Option<Result<String, AuthLoadError>> {
        self.password_callback.as_ref().map(|callback| callback(prompt))
    }

    /// Copy of the options blob with secrets replaced by `***`.
    pub fn masked_config(&self) -> Map<String, Value> {
        mask_secrets(&self.config)
    }
}

fn mask_secrets(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .map(|(key, value)| {
            let value = match value {
                Value::Object(inner) => Value::Object(mask_secrets(inner)),
                Value::Null => Value::Null,
                _ if SECRET_KEYS.contains(&key.as_str()) => Value::String(MASK.to_string()),
                other => other.clone(),
            };
            (key.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_derivation() {
        let ca = PathBuf::from("/etc/ssl/cloud.pem");
        assert_eq!(Verify::derive(false, None), Verify::System);
        assert_eq!(Verify::derive(false, Some(ca.clone())), Verify::CaBundle(ca.clone()));
        assert_eq!(Verify::derive(true, Some(ca)), Verify::Insecure);
        assert!(Verify::derive(true, None).is_insecure());
    }

    #[test]
    fn test_placeholder_injection_keeps_requested_type() {
        let mut options = CliOptions::new("password");
        options.inject_placeholder_auth();

        assert!(options.has_placeholder_token());
        assert_eq!(options.auth_option("endpoint"), Some(PLACEHOLDER));
        assert_eq!(options.config_auth_type(), TOKEN_ENDPOINT_AUTH_TYPE);
        assert_eq!(options.auth_type, "password");
    }

    #[test]
    fn test_remove_auth_option() {
        let mut options = CliOptions::default();
        options.set_auth_option("token", "abc");
        assert_eq!(options.remove_auth_option("token"), Some(Value::from("abc")));
        assert_eq!(options.auth_option("token"), None);
    }

    #[test]
    fn test_masked_config_hides_secrets() {
        let mut options = CliOptions::default();
        options.set_auth_option("username", "demo");
        options.set_auth_option("password", "secret");
        options.set_auth_option("token", "gAAAA");

        let masked = options.masked_config();
        let auth = masked["auth"].as_object().unwrap();
        assert_eq!(auth["username"], "demo");
        assert_eq!(auth["password"], "***");
        assert_eq!(auth["token"], "***");
        // the original blob is untouched
        assert_eq!(options.auth_option("password"), Some("secret"));
    }

    #[test]
    fn test_password_callback() {
        let mut options = CliOptions::default();
        assert!(options.prompt_for_password("Password: ").is_none());

        options.set_password_callback(Arc::new(|_: &str| -> Result<String, AuthLoadError> {
            Ok("hunter2".to_string())
        }));
        let password = options.prompt_for_password("Password: ").unwrap().unwrap();
        assert_eq!(password, "hunter2");
    }
}
