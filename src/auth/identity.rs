//! Identity v3 password and token plugins.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, trace};
use url::Url;

use super::{AccessInfo, AuthError, AuthLoadError, AuthPlugin, CatalogEntry, PluginOptions, ServiceCatalog};
use crate::options::CliOptions;
use crate::session::{check_status, join_url, HttpSession};

const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";

const SCOPE_OPTIONS: [&str; 8] = [
    "project_id",
    "project_name",
    "project_domain_id",
    "project_domain_name",
    "domain_id",
    "domain_name",
    "system_scope",
    "tenant_name",
];

/// What the requested token is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    ProjectId(String),
    ProjectName { name: String, domain: DomainRef },
    DomainId(String),
    DomainName(String),
    System,
    Unscoped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainRef {
    Id(String),
    Name(String),
}

impl DomainRef {
    fn to_json(&self) -> Value {
        match self {
            DomainRef::Id(id) => json!({ "id": id }),
            DomainRef::Name(name) => json!({ "name": name }),
        }
    }

    fn take(options: &mut PluginOptions, id_key: &str, name_key: &str) -> DomainRef {
        match (options.take(id_key), options.take(name_key)) {
            (Some(id), _) => DomainRef::Id(id),
            (None, Some(name)) => DomainRef::Name(name),
            (None, None) => DomainRef::Id("default".to_string()),
        }
    }
}

impl Scope {
    fn take(options: &mut PluginOptions) -> Scope {
        let project_name = options.take("project_name").or_else(|| options.take("tenant_name"));
        if let Some(id) = options.take("project_id") {
            Scope::ProjectId(id)
        } else if let Some(name) = project_name {
            let domain = DomainRef::take(options, "project_domain_id", "project_domain_name");
            Scope::ProjectName { name, domain }
        } else if let Some(id) = options.take("domain_id") {
            Scope::DomainId(id)
        } else if let Some(name) = options.take("domain_name") {
            Scope::DomainName(name)
        } else if options.take("system_scope").is_some() {
            Scope::System
        } else {
            Scope::Unscoped
        }
    }

    fn to_json(&self) -> Option<Value> {
        match self {
            Scope::ProjectId(id) => Some(json!({ "project": { "id": id } })),
            Scope::ProjectName { name, domain } => {
                Some(json!({ "project": { "name": name, "domain": domain.to_json() } }))
            }
            Scope::DomainId(id) => Some(json!({ "domain": { "id": id } })),
            Scope::DomainName(name) => Some(json!({ "domain": { "name": name } })),
            Scope::System => Some(json!({ "system": { "all": true } })),
            Scope::Unscoped => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum UserRef {
    Id(String),
    Name { name: String, domain: DomainRef },
}

#[derive(Debug, Clone)]
pub struct PasswordPlugin {
    auth_type: String,
    auth_url: Url,
    user: UserRef,
    password: String,
    scope: Scope,
}

impl PasswordPlugin {
    pub fn from_options(auth_type: &str, options: &CliOptions) -> Result<PasswordPlugin, AuthLoadError> {
        let mut accepted = vec![
            "auth_url",
            "username",
            "user_id",
            "password",
            "user_domain_id",
            "user_domain_name",
        ];
        accepted.extend(SCOPE_OPTIONS);
        let mut values = PluginOptions::collect(auth_type, options, &accepted)?;

        let auth_url = values.require_url("auth_url")?;
        let user = match (values.take("user_id"), values.take("username")) {
            (Some(id), _) => UserRef::Id(id),
            (None, Some(name)) => UserRef::Name {
                name,
                domain: DomainRef::take(&mut values, "user_domain_id", "user_domain_name"),
            },
            (None, None) => {
                return Err(AuthLoadError::MissingOption {
                    auth_type: auth_type.to_string(),
                    option: "username".to_string(),
                })
            }
        };

        let password = match values.take("password") {
            Some(password) => password,
            None => {
                let who = match &user {
                    UserRef::Id(id) => id.as_str(),
                    UserRef::Name { name, .. } => name.as_str(),
                };
                match options.prompt_for_password(&format!("Password for {}: ", who)) {
                    Some(password) => password?,
                    None => {
                        return Err(AuthLoadError::MissingOption {
                            auth_type: auth_type.to_string(),
                            option: "password".to_string(),
                        })
                    }
                }
            }
        };

        Ok(PasswordPlugin {
            auth_type: auth_type.to_string(),
            auth_url,
            user,
            password,
            scope: Scope::take(&mut values),
        })
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    fn identity(&self) -> Value {
        let user = match &self.user {
            UserRef::Id(id) => json!({ "id": id, "password": self.password }),
            UserRef::Name { name, domain } => {
                json!({ "name": name, "domain": domain.to_json(), "password": self.password })
            }
        };
        json!({ "methods": ["password"], "password": { "user": user } })
    }
}

impl AuthPlugin for PasswordPlugin {
    fn auth_type(&self) -> &str {
        &self.auth_type
    }

    fn get_access(&self, session: &HttpSession) -> Result<AccessInfo, AuthError> {
        issue_token(session, &self.auth_url, self.identity(), &self.scope)
    }
}

#[derive(Debug, Clone)]
pub struct TokenPlugin {
    auth_type: String,
    auth_url: Url,
    token: String,
    scope: Scope,
}

impl TokenPlugin {
    pub fn from_options(auth_type: &str, options: &CliOptions) -> Result<TokenPlugin, AuthLoadError> {
        let mut accepted = vec!["auth_url", "token"];
        accepted.extend(SCOPE_OPTIONS);
        let mut values = PluginOptions::collect(auth_type, options, &accepted)?;

        Ok(TokenPlugin {
            auth_type: auth_type.to_string(),
            auth_url: values.require_url("auth_url")?,
            token: values.require("token")?,
            scope: Scope::take(&mut values),
        })
    }
}

impl AuthPlugin for TokenPlugin {
    fn auth_type(&self) -> &str {
        &self.auth_type
    }

    fn get_access(&self, session: &HttpSession) -> Result<AccessInfo, AuthError> {
        let identity = json!({ "methods": ["token"], "token": { "id": self.token } });
        issue_token(session, &self.auth_url, identity, &self.scope)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: TokenBody,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    #[serde(default)]
    expires_at: Option<String>,
    #[serde(default)]
    user: Option<NamedRef>,
    #[serde(default)]
    project: Option<NamedRef>,
    #[serde(default)]
    catalog: Option<Vec<CatalogEntry>>,
}

#[derive(Debug, Deserialize)]
struct NamedRef {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

/// `auth_url` may name the v3 root or the unversioned Identity endpoint.
fn tokens_url(auth_url: &Url) -> Result<Url, AuthError> {
    let versioned = auth_url.path().trim_end_matches('/').ends_with("/v3");
    let base = if versioned {
        auth_url.clone()
    } else {
        join_url(auth_url, "v3")?
    };
    Ok(join_url(&base, "auth/tokens")?)
}

fn issue_token(
    session: &HttpSession,
    auth_url: &Url,
    identity: Value,
    scope: &Scope,
) -> Result<AccessInfo, AuthError> {
    let url = tokens_url(auth_url)?;
    let mut auth = json!({ "identity": identity });
    if let Some(scope) = scope.to_json() {
        auth["scope"] = scope;
    }
    let body = json!({ "auth": auth });

    debug!("Requesting a token from {}", url);
    let response = session
        .client()
        .post(url)
        .header("Accept", "application/json")
        .json(&body)
        .send()
        .map_err(|e| AuthError::Request(e.into()))?;
    let response = check_status(response)?;

    let token = response
        .headers()
        .get(SUBJECT_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .ok_or(AuthError::MissingSubjectToken)?;
    let text = response.text().map_err(|e| AuthError::Request(e.into()))?;
    let body: TokenResponse = serde_json::from_str(&text).map_err(|e| AuthError::Request(e.into()))?;
    trace!("Token expires at {:?}", body.token.expires_at);

    Ok(AccessInfo {
        token: Some(token),
        expires_at: body.token.expires_at,
        user_id: body.token.user.map(|user| user.id),
        project_id: body.token.project.as_ref().map(|project| project.id.clone()),
        project_name: body.token.project.and_then(|project| project.name),
        service_catalog: body.token.catalog.map(ServiceCatalog::new),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn password_options(auth_url: &str) -> CliOptions {
        let mut options = CliOptions::new("password");
        options.set_auth_option("auth_url", auth_url);
        options.set_auth_option("username", "demo");
        options.set_auth_option("password", "secret");
        options.set_auth_option("project_name", "demo");
        options.set_auth_option("project_domain_name", "Default");
        options
    }

    #[test]
    fn test_tokens_url() {
        let versioned = Url::parse("https://keystone.example.com/identity/v3").unwrap();
        assert_eq!(
            tokens_url(&versioned).unwrap().as_str(),
            "https://keystone.example.com/identity/v3/auth/tokens"
        );

        let root = Url::parse("https://keystone.example.com:5000").unwrap();
        assert_eq!(
            tokens_url(&root).unwrap().as_str(),
            "https://keystone.example.com:5000/v3/auth/tokens"
        );
    }

    #[test]
    fn test_password_identity_body() {
        let plugin = PasswordPlugin::from_options("password", &password_options("https://k/v3")).unwrap();
        let identity = plugin.identity();
        assert_eq!(identity["methods"][0], "password");
        assert_eq!(identity["password"]["user"]["name"], "demo");
        assert_eq!(identity["password"]["user"]["domain"]["id"], "default");
        assert_eq!(
            plugin.scope(),
            &Scope::ProjectName {
                name: "demo".to_string(),
                domain: DomainRef::Name("Default".to_string())
            }
        );
    }

    #[test]
    fn test_token_scope_by_project_id() {
        let mut options = CliOptions::new("token");
        options.set_auth_option("auth_url", "https://k/v3");
        options.set_auth_option("token", "gAAAA");
        options.set_auth_option("project_id", "p-1");
        let plugin = TokenPlugin::from_options("token", &options).unwrap();
        assert_eq!(plugin.scope, Scope::ProjectId("p-1".to_string()));
        assert_eq!(plugin.scope.to_json().unwrap()["project"]["id"], "p-1");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_password_authentication() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/auth/tokens"))
            .and(body_partial_json(json!({
                "auth": { "scope": { "project": { "name": "demo" } } }
            })))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("X-Subject-Token", "gAAAAB-token")
                    .set_body_json(json!({
                        "token": {
                            "expires_at": "2026-10-15T12:00:00.000000Z",
                            "user": { "id": "u-1", "name": "demo" },
                            "project": { "id": "p-1", "name": "demo" },
                            "catalog": [{
                                "type": "compute",
                                "name": "nova",
                                "endpoints": [{
                                    "interface": "public",
                                    "region": "RegionOne",
                                    "url": "https://nova.example.com/v2.1"
                                }]
                            }]
                        }
                    })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let auth_url = format!("{}/v3", server.uri());
        let access = tokio::task::spawn_blocking(move || {
            let options = password_options(&auth_url);
            let session = HttpSession::from_options(&options).unwrap();
            let plugin = PasswordPlugin::from_options("password", &options).unwrap();
            plugin.get_access(&session)
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(access.token.as_deref(), Some("gAAAAB-token"));
        assert_eq!(access.project_id.as_deref(), Some("p-1"));
        assert_eq!(access.user_id.as_deref(), Some("u-1"));
        let catalog = access.service_catalog.unwrap();
        assert!(catalog.is_service_available("compute"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_rejected_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/auth/tokens"))
            .respond_with(ResponseTemplate::new(401).set_body_string("The request you have made requires authentication."))
            .mount(&server)
            .await;

        let auth_url = format!("{}/v3", server.uri());
        let result = tokio::task::spawn_blocking(move || {
            let options = password_options(&auth_url);
            let session = HttpSession::from_options(&options).unwrap();
            let plugin = PasswordPlugin::from_options("password", &options).unwrap();
            plugin.get_access(&session)
        })
        .await
        .unwrap();

        assert!(matches!(
            result,
            Err(AuthError::Request(crate::session::RequestError::UnexpectedResponse { status, .. })) if status.as_u16() == 401
        ));
    }
}
