use url::Url;

use super::{AccessInfo, AuthError, AuthLoadError, AuthPlugin, PluginOptions};
use crate::options::CliOptions;
use crate::session::HttpSession;

/// A pre-issued token used against one endpoint, bypassing the catalog.
#[derive(Debug, Clone)]
pub struct TokenEndpointPlugin {
    auth_type: String,
    token: String,
    endpoint: Url,
}

impl TokenEndpointPlugin {
    pub fn from_options(auth_type: &str, options: &CliOptions) -> Result<TokenEndpointPlugin, AuthLoadError> {
        let mut values = PluginOptions::collect(auth_type, options, &["token", "endpoint"])?;
        Ok(TokenEndpointPlugin {
            auth_type: auth_type.to_string(),
            token: values.require("token")?,
            endpoint: values.require_url("endpoint")?,
        })
    }
}

impl AuthPlugin for TokenEndpointPlugin {
    fn auth_type(&self) -> &str {
        &self.auth_type
    }

    fn get_access(&self, _session: &HttpSession) -> Result<AccessInfo, AuthError> {
        Ok(AccessInfo {
            token: Some(self.token.clone()),
            ..Default::default()
        })
    }

    fn endpoint_override(&self) -> Option<&Url> {
        Some(&self.endpoint)
    }
}

/// Standalone services deployed without Keystone.
#[derive(Debug, Clone)]
pub struct NoAuthPlugin {
    auth_type: String,
    endpoint: Url,
}

impl NoAuthPlugin {
    pub fn from_options(auth_type: &str, options: &CliOptions) -> Result<NoAuthPlugin, AuthLoadError> {
        let mut values = PluginOptions::collect(auth_type, options, &["endpoint"])?;
        Ok(NoAuthPlugin {
            auth_type: auth_type.to_string(),
            endpoint: values.require_url("endpoint")?,
        })
    }
}

impl AuthPlugin for NoAuthPlugin {
    fn auth_type(&self) -> &str {
        &self.auth_type
    }

    fn get_access(&self, _session: &HttpSession) -> Result<AccessInfo, AuthError> {
        Ok(AccessInfo::default())
    }

    fn endpoint_override(&self) -> Option<&Url> {
        Some(&self.endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_endpoint_access_has_no_catalog() {
        let mut options = CliOptions::new("admin_token");
        options.set_auth_option("token", "secret-token");
        options.set_auth_option("endpoint", "http://ironic.local:6385");

        let plugin = TokenEndpointPlugin::from_options("admin_token", &options).unwrap();
        let session = HttpSession::from_options(&options).unwrap();
        let access = plugin.get_access(&session).unwrap();
        assert_eq!(access.token.as_deref(), Some("secret-token"));
        assert!(access.service_catalog.is_none());
    }

    #[test]
    fn test_noauth_rejects_token() {
        let mut options = CliOptions::new("none");
        options.set_auth_option("endpoint", "http://ironic.local:6385");
        options.set_auth_option("token", "unused");

        let err = NoAuthPlugin::from_options("none", &options).unwrap_err();
        assert!(err.is_type_mismatch());
    }
}
