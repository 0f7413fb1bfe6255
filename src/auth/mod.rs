//! Authentication plugins and the loader that selects one from the options.
//!
//! A plugin is chosen by the `auth_type` recorded in the options blob:
//!
//! - `password` / `v3password`: Identity v3 password authentication
//! - `token` / `v3token`: Identity v3 token (re)scoping
//! - `token_endpoint` / `admin_token`: a fixed token for a fixed endpoint
//! - `none` / `noauth`: no token at all, a fixed endpoint
//!
//! Loading validates the options but performs no I/O. Authentication itself
//! happens in [`AuthPlugin::get_access`].

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

use crate::options::CliOptions;
use crate::session::{HttpSession, RequestError};

pub mod catalog;
pub mod identity;
pub mod static_token;

pub use catalog::{CatalogEndpoint, CatalogEntry, ServiceCatalog};
pub use identity::{PasswordPlugin, Scope, TokenPlugin};
pub use static_token::{NoAuthPlugin, TokenEndpointPlugin};

/// Failure while constructing an auth plugin from the options.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthLoadError {
    /// An option the plugin does not accept, or a value of the wrong shape
    #[error("auth type {auth_type:?} cannot use the supplied options: {message}")]
    TypeMismatch { auth_type: String, message: String },
    #[error("auth type {auth_type:?} requires the {option:?} option")]
    MissingOption { auth_type: String, option: String },
    #[error("unknown auth type {0:?}")]
    UnknownAuthType(String),
    #[error("failed to read password: {0}")]
    PasswordPrompt(String),
}

impl AuthLoadError {
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, AuthLoadError::TypeMismatch { .. })
    }
}

/// Failure while authenticating with a loaded plugin.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("authentication request failed: {0}")]
    Request(#[from] RequestError),
    #[error("identity service did not return a token")]
    MissingSubjectToken,
}

/// Result of a successful authentication.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccessInfo {
    pub token: Option<String>,
    pub expires_at: Option<String>,
    pub user_id: Option<String>,
    pub project_id: Option<String>,
    pub project_name: Option<String>,
    /// `None` for flows that never see a catalog (token/endpoint, noauth)
    pub service_catalog: Option<ServiceCatalog>,
}

pub trait AuthPlugin: fmt::Debug + Send + Sync {
    fn auth_type(&self) -> &str;

    fn get_access(&self, session: &HttpSession) -> Result<AccessInfo, AuthError>;

    /// Endpoint every service should use instead of the catalog.
    fn endpoint_override(&self) -> Option<&Url> {
        None
    }
}

pub trait AuthLoader {
    fn load_auth_plugin(&self, options: &CliOptions) -> Result<Box<dyn AuthPlugin>, AuthLoadError>;
}

/// Outcome of one loader call, as seen by the client manager.
#[derive(Debug)]
pub enum AuthAttempt {
    Loaded(Box<dyn AuthPlugin>),
    /// The plugin rejected the injected placeholder token/endpoint
    PlaceholderMismatch(AuthLoadError),
    Fatal(AuthLoadError),
}

impl AuthAttempt {
    pub fn classify(
        result: Result<Box<dyn AuthPlugin>, AuthLoadError>,
        options: &CliOptions,
    ) -> AuthAttempt {
        match result {
            Ok(plugin) => AuthAttempt::Loaded(plugin),
            Err(e) if e.is_type_mismatch() && options.has_placeholder_token() => {
                AuthAttempt::PlaceholderMismatch(e)
            }
            Err(e) => AuthAttempt::Fatal(e),
        }
    }
}

/// Loader for the built-in plugins.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultAuthLoader;

impl AuthLoader for DefaultAuthLoader {
    fn load_auth_plugin(&self, options: &CliOptions) -> Result<Box<dyn AuthPlugin>, AuthLoadError> {
        let auth_type = options.config_auth_type();
        tracing::debug!("Loading auth plugin {:?}", auth_type);

        match auth_type {
            "password" | "v3password" => Ok(Box::new(PasswordPlugin::from_options(auth_type, options)?)),
            "token" | "v3token" => Ok(Box::new(TokenPlugin::from_options(auth_type, options)?)),
            "token_endpoint" | "admin_token" => {
                Ok(Box::new(TokenEndpointPlugin::from_options(auth_type, options)?))
            }
            "none" | "noauth" => Ok(Box::new(NoAuthPlugin::from_options(auth_type, options)?)),
            other => Err(AuthLoadError::UnknownAuthType(other.to_string())),
        }
    }
}

/// String-valued auth options accepted by one plugin.
pub(crate) struct PluginOptions {
    auth_type: String,
    values: BTreeMap<String, String>,
}

impl PluginOptions {
    /// Rejects keys outside `accepted` and values that are not scalars.
    pub(crate) fn collect(
        auth_type: &str,
        options: &CliOptions,
        accepted: &[&str],
    ) -> Result<PluginOptions, AuthLoadError> {
        let mut values = BTreeMap::new();
        if let Some(auth) = options.auth() {
            for (key, value) in auth {
                if !accepted.contains(&key.as_str()) {
                    return Err(AuthLoadError::TypeMismatch {
                        auth_type: auth_type.to_string(),
                        message: format!("unexpected option {:?}", key),
                    });
                }
                let value = match value {
                    Value::Null => continue,
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    Value::Array(_) | Value::Object(_) => {
                        return Err(AuthLoadError::TypeMismatch {
                            auth_type: auth_type.to_string(),
                            message: format!("option {:?} must be a string", key),
                        })
                    }
                };
                if !value.is_empty() {
                    values.insert(key.clone(), value);
                }
            }
        }

        Ok(PluginOptions {
            auth_type: auth_type.to_string(),
            values,
        })
    }

    pub(crate) fn take(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    pub(crate) fn require(&mut self, key: &str) -> Result<String, AuthLoadError> {
        self.take(key).ok_or_else(|| AuthLoadError::MissingOption {
            auth_type: self.auth_type.clone(),
            option: key.to_string(),
        })
    }

    /// Required option that must be an absolute URL.
    pub(crate) fn require_url(&mut self, key: &str) -> Result<Url, AuthLoadError> {
        let value = self.require(key)?;
        Url::parse(&value).map_err(|e| AuthLoadError::TypeMismatch {
            auth_type: self.auth_type.clone(),
            message: format!("option {:?} is not a URL ({}): {:?}", key, e, value),
        })
    }
}
