//! Per-invocation façade over authentication and the service clients.
//!
//! The client manager holds the connection options, resolves the auth plugin
//! on demand and hands out one memoized client per registered service.
//! Construction performs no I/O: the plugin is loaded by the first
//! [`ClientManager::setup_auth`] call and the token is only requested when a
//! client or the service catalog is needed.
//!
//! Auth setup moves through `Uninitialized → Loading → Ready | Failed` once.
//! A failed setup is terminal; every later call returns the same error.

use serde_json::{Map, Value};
use std::any::Any;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, trace};
use url::Url;

use crate::auth::{AccessInfo, AuthAttempt, AuthError, AuthLoadError, AuthLoader, AuthPlugin, DefaultAuthLoader};
use crate::cache::{ClientCache, ServiceHandle};
use crate::options::{CliOptions, PasswordCallback, Verify};
use crate::plugin::PluginRegistry;
use crate::services::{
    compute::ComputeClient, identity::IdentityClient, image::ImageClient, network::NetworkClient,
    object_store::ObjectStoreClient, volume::VolumeClient, VersionedClient,
};
use crate::session::{HttpSession, RequestError};

#[derive(Debug, thiserror::Error)]
pub enum ClientManagerError {
    #[error(transparent)]
    AuthPlugin(#[from] AuthLoadError),
    #[error(transparent)]
    Authentication(#[from] AuthError),
    #[error("authentication setup is already in progress")]
    AuthInProgress,
    #[error("no client is registered for service {0:?}")]
    UnknownService(String),
    #[error("the {name:?} client is not a {expected}")]
    ClientType { name: String, expected: &'static str },
    #[error("no {interface} endpoint for service type {service_type:?} in region {region:?}")]
    EndpointNotFound {
        service_type: String,
        interface: String,
        region: Option<String>,
    },
    #[error("invalid {service} API version {version:?}")]
    InvalidApiVersion { service: String, version: String },
    #[error(transparent)]
    Request(#[from] RequestError),
}

/// Externally visible auth setup state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Uninitialized,
    Loading,
    Ready,
    Failed,
}

enum AuthState {
    Uninitialized,
    Loading,
    Ready(Box<dyn AuthPlugin>),
    Failed(AuthLoadError),
}

pub struct ClientManager {
    options: CliOptions,
    region_name: Option<String>,
    interface: String,
    cacert: Option<PathBuf>,
    verify: Verify,
    insecure: bool,
    api_version: BTreeMap<String, String>,
    original_auth_type: String,
    password_callback: Option<PasswordCallback>,
    auth_required: bool,
    auth_state: AuthState,
    access: Option<AccessInfo>,
    session: Option<HttpSession>,
    auth_loader: Box<dyn AuthLoader>,
    registry: Arc<PluginRegistry>,
    clients: ClientCache,
}

impl std::fmt::Debug for ClientManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientManager")
            .field("region_name", &self.region_name)
            .field("interface", &self.interface)
            .field("verify", &self.verify)
            .field("api_version", &self.api_version)
            .field("auth_status", &self.auth_status())
            .field("clients", &self.clients)
            .finish()
    }
}

impl ClientManager {
    /// `api_version` entries override versions already present in the options.
    pub fn new(
        cli_options: CliOptions,
        api_version: BTreeMap<String, String>,
        password_callback: Option<PasswordCallback>,
        registry: Arc<PluginRegistry>,
    ) -> ClientManager {
        let mut versions = cli_options.api_version.clone();
        versions.extend(api_version);

        ClientManager {
            region_name: cli_options.region_name.clone(),
            interface: cli_options.interface.clone(),
            cacert: cli_options.cacert.clone(),
            verify: cli_options.verify.clone(),
            insecure: cli_options.insecure(),
            original_auth_type: cli_options.auth_type.clone(),
            api_version: versions,
            password_callback,
            auth_required: true,
            auth_state: AuthState::Uninitialized,
            access: None,
            session: None,
            auth_loader: Box::new(DefaultAuthLoader),
            registry,
            clients: ClientCache::new(),
            options: cli_options,
        }
    }

    pub fn with_auth_loader(mut self, auth_loader: Box<dyn AuthLoader>) -> ClientManager {
        self.auth_loader = auth_loader;
        self
    }

    pub fn set_auth_required(&mut self, auth_required: bool) {
        self.auth_required = auth_required;
    }

    pub fn auth_required(&self) -> bool {
        self.auth_required
    }

    pub fn region_name(&self) -> Option<&str> {
        self.region_name.as_deref()
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn cacert(&self) -> Option<&PathBuf> {
        self.cacert.as_ref()
    }

    pub fn verify(&self) -> &Verify {
        &self.verify
    }

    pub fn insecure(&self) -> bool {
        self.insecure
    }

    pub fn api_versions(&self) -> &BTreeMap<String, String> {
        &self.api_version
    }

    pub fn api_version(&self, api_name: &str) -> Option<&str> {
        self.api_version.get(api_name).map(String::as_str)
    }

    pub fn options(&self) -> &CliOptions {
        &self.options
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Options blob with secrets masked.
    pub fn get_configuration(&self) -> Map<String, Value> {
        self.options.masked_config()
    }

    pub fn auth_status(&self) -> AuthStatus {
        match self.auth_state {
            AuthState::Uninitialized => AuthStatus::Uninitialized,
            AuthState::Loading => AuthStatus::Loading,
            AuthState::Ready(_) => AuthStatus::Ready,
            AuthState::Failed(_) => AuthStatus::Failed,
        }
    }

    /// Name of the loaded plugin, or the auth type the options select.
    pub fn auth_plugin_name(&self) -> &str {
        match &self.auth_state {
            AuthState::Ready(plugin) => plugin.auth_type(),
            _ => self.options.config_auth_type(),
        }
    }

    fn auth_plugin(&self) -> Option<&dyn AuthPlugin> {
        match &self.auth_state {
            AuthState::Ready(plugin) => Some(plugin.as_ref()),
            _ => None,
        }
    }

    /// Load the auth plugin once.
    ///
    /// A no-op when the command does not require auth. If the loader rejects
    /// the injected placeholder token/endpoint, the placeholders are removed,
    /// the requested auth type is restored and loading is retried exactly
    /// once.
    pub fn setup_auth(&mut self) -> Result<(), ClientManagerError> {
        if !self.auth_required {
            trace!("Auth is not required for this command");
            return Ok(());
        }

        match &self.auth_state {
            AuthState::Ready(_) => return Ok(()),
            AuthState::Failed(e) => return Err(e.clone().into()),
            AuthState::Loading => return Err(ClientManagerError::AuthInProgress),
            AuthState::Uninitialized => {}
        }

        self.auth_state = AuthState::Loading;
        if let Some(callback) = &self.password_callback {
            self.options.set_password_callback(callback.clone());
        }

        match self.load_auth_plugin() {
            Ok(plugin) => {
                debug!("Using auth plugin {}", plugin.auth_type());
                self.auth_state = AuthState::Ready(plugin);
                Ok(())
            }
            Err(e) => {
                debug!("Auth plugin setup failed: {}", e);
                self.auth_state = AuthState::Failed(e.clone());
                Err(e.into())
            }
        }
    }

    fn load_auth_plugin(&mut self) -> Result<Box<dyn AuthPlugin>, AuthLoadError> {
        let result = self.auth_loader.load_auth_plugin(&self.options);
        match AuthAttempt::classify(result, &self.options) {
            AuthAttempt::Loaded(plugin) => Ok(plugin),
            AuthAttempt::Fatal(e) => Err(e),
            AuthAttempt::PlaceholderMismatch(e) => {
                debug!(
                    "Auth plugin rejected the placeholder token ({}), retrying as {:?}",
                    e, self.original_auth_type
                );
                self.options.set_config_auth_type(&self.original_auth_type);
                self.options.remove_auth_option("token");
                self.options.remove_auth_option("endpoint");
                self.auth_loader.load_auth_plugin(&self.options)
            }
        }
    }

    pub fn session(&mut self) -> Result<HttpSession, ClientManagerError> {
        if let Some(session) = &self.session {
            return Ok(session.clone());
        }
        let session = HttpSession::from_options(&self.options)?;
        self.session = Some(session.clone());
        Ok(session)
    }

    /// Authenticate on first use; `None` when the command needs no auth.
    pub fn auth_ref(&mut self) -> Result<Option<&AccessInfo>, ClientManagerError> {
        if !self.auth_required {
            return Ok(None);
        }
        self.setup_auth()?;

        if self.access.is_none() {
            let session = self.session()?;
            let access = match self.auth_plugin() {
                Some(plugin) => plugin.get_access(&session)?,
                None => return Ok(None),
            };
            self.access = Some(access);
        }
        Ok(self.access.as_ref())
    }

    pub fn auth_token(&mut self) -> Result<Option<String>, ClientManagerError> {
        Ok(self.auth_ref()?.and_then(|access| access.token.clone()))
    }

    /// `None` when there is no catalog to consult.
    pub fn is_service_available(&mut self, service_type: &str) -> Result<Option<bool>, ClientManagerError> {
        let available = self
            .auth_ref()?
            .and_then(|access| access.service_catalog.as_ref())
            .map(|catalog| catalog.is_service_available(service_type));
        trace!("Service {} available: {:?}", service_type, available);
        Ok(available)
    }

    /// Enabled unless the catalog explicitly lacks the service. No catalog
    /// (no auth yet, or a token/endpoint flow) counts as enabled.
    pub fn is_network_endpoint_enabled(&mut self) -> Result<bool, ClientManagerError> {
        Ok(self.is_service_available("network")? != Some(false))
    }

    pub fn is_compute_endpoint_enabled(&mut self) -> Result<bool, ClientManagerError> {
        Ok(self.is_service_available("compute")? != Some(false))
    }

    /// Probes the versioned service type (`volumev3`) first, then `volume`.
    pub fn is_volume_endpoint_enabled<C>(&mut self, volume_client: &C) -> Result<bool, ClientManagerError>
    where
        C: VersionedClient + ?Sized,
    {
        let versioned = format!("volumev{}", volume_client.api_version().major);
        if self.is_service_available(&versioned)? != Some(false) {
            return Ok(true);
        }
        Ok(self.is_service_available("volume")? != Some(false))
    }

    /// Endpoint override of the auth plugin, else the catalog entry for the
    /// configured interface and region.
    pub fn get_endpoint_for_service_type(&mut self, service_type: &str) -> Result<Url, ClientManagerError> {
        self.setup_auth()?;
        if let Some(endpoint) = self.auth_plugin().and_then(|plugin| plugin.endpoint_override()) {
            return Ok(endpoint.clone());
        }

        let interface = self.interface.clone();
        let region = self.region_name.clone();
        let endpoint = self
            .auth_ref()?
            .and_then(|access| access.service_catalog.as_ref())
            .and_then(|catalog| catalog.endpoint_for(service_type, &interface, region.as_deref()))
            .cloned();

        endpoint.ok_or(ClientManagerError::EndpointNotFound {
            service_type: service_type.to_string(),
            interface,
            region,
        })
    }

    /// Memoized client for `api_name`, built by its plugin on first access.
    pub fn client(&mut self, api_name: &str) -> Result<ServiceHandle, ClientManagerError> {
        if let Some(handle) = self.clients.get(api_name) {
            return Ok(handle);
        }

        let plugin = self
            .registry
            .get(api_name)
            .ok_or_else(|| ClientManagerError::UnknownService(api_name.to_string()))?;
        debug!("Creating the {} client", api_name);
        let handle = plugin.make_client(self)?;
        Ok(self.clients.insert_if_absent(api_name, handle))
    }

    pub fn client_as<T: Any + Send + Sync>(&mut self, api_name: &str) -> Result<Arc<T>, ClientManagerError> {
        self.client(api_name)?
            .downcast::<T>()
            .map_err(|_| ClientManagerError::ClientType {
                name: api_name.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    pub fn identity(&mut self) -> Result<Arc<IdentityClient>, ClientManagerError> {
        self.client_as(crate::services::identity::API_NAME)
    }

    pub fn compute(&mut self) -> Result<Arc<ComputeClient>, ClientManagerError> {
        self.client_as(crate::services::compute::API_NAME)
    }

    pub fn network(&mut self) -> Result<Arc<NetworkClient>, ClientManagerError> {
        self.client_as(crate::services::network::API_NAME)
    }

    pub fn volume(&mut self) -> Result<Arc<VolumeClient>, ClientManagerError> {
        self.client_as(crate::services::volume::API_NAME)
    }

    pub fn object_store(&mut self) -> Result<Arc<ObjectStoreClient>, ClientManagerError> {
        self.client_as(crate::services::object_store::API_NAME)
    }

    pub fn image(&mut self) -> Result<Arc<ImageClient>, ClientManagerError> {
        self.client_as(crate::services::image::API_NAME)
    }
}
