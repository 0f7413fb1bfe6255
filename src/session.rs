//! HTTP plumbing shared by the auth plugins and the service clients.

use crate::options::{CliOptions, Verify};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{Certificate, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

pub const USER_AGENT: &str = concat!("openstackclient/", env!("CARGO_PKG_VERSION"));
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

const DEFAULT_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("failed to read CA bundle {path}: {cause}")]
    CaBundle {
        path: String,
        cause: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("invalid URL {url}: {cause}")]
    InvalidUrl { url: String, cause: url::ParseError },
    #[error("unexpected response from server: {status}: {body}")]
    UnexpectedResponse { status: StatusCode, body: String },
}

/// Blocking HTTP session configured from the connection options.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpSession {
    client: Client,
}

impl HttpSession {
    pub fn from_options(options: &CliOptions) -> Result<HttpSession, RequestError> {
        let timeout = options.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS);
        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout));

        match &options.verify {
            Verify::System => {}
            Verify::Insecure => {
                debug!("TLS certificate verification is disabled");
                builder = builder.danger_accept_invalid_certs(true);
            }
            Verify::CaBundle(path) => {
                trace!("Loading CA bundle from {}", path.display());
                let pem = std::fs::read(path).map_err(|cause| RequestError::CaBundle {
                    path: path.display().to_string(),
                    cause: Box::new(cause),
                })?;
                let certificate = Certificate::from_pem(&pem).map_err(|cause| RequestError::CaBundle {
                    path: path.display().to_string(),
                    cause: Box::new(cause),
                })?;
                builder = builder.add_root_certificate(certificate);
            }
        }

        Ok(HttpSession {
            client: builder.build()?,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Turn a non-success response into [`RequestError::UnexpectedResponse`].
pub fn check_status(response: Response) -> Result<Response, RequestError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let body = response.text().unwrap_or_default();
        debug!("Request failed with status {}: {}", status, body);
        Err(RequestError::UnexpectedResponse { status, body })
    }
}

/// Join `path` onto `base`, treating `base` as a directory.
pub fn join_url(base: &Url, path: &str) -> Result<Url, RequestError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path.trim_start_matches('/'))
        .map_err(|cause| RequestError::InvalidUrl {
            url: format!("{}{}", base, path),
            cause,
        })
}

/// Session, endpoint and token for one service.
#[derive(Debug, Clone)]
pub struct RestClient {
    session: HttpSession,
    endpoint: Url,
    token: Option<String>,
}

impl RestClient {
    pub fn new(session: HttpSession, endpoint: Url, token: Option<String>) -> RestClient {
        RestClient {
            session,
            endpoint,
            token,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn get(&self, path: &str) -> Result<RequestBuilder, RequestError> {
        Ok(self.get_url(join_url(&self.endpoint, path)?))
    }

    pub fn get_url(&self, url: Url) -> RequestBuilder {
        trace!("GET {}", url);
        let mut request = self.session.client().get(url).header("Accept", "application/json");
        if let Some(token) = &self.token {
            request = request.header(AUTH_TOKEN_HEADER, token);
        }
        request
    }

    pub fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RequestError> {
        self.send_json(self.get(path)?)
    }

    pub fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RequestError> {
        let response = check_status(request.send()?)?;
        let text = response.text()?;
        Ok(serde_json::from_str(&text)?)
    }
}
