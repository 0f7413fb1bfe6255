//! Cloud passwords stored in the platform keyring.

use keyring::Entry;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::auth::AuthLoadError;
use crate::options::PasswordCallback;

pub const KEYRING_SERVICE: &str = "openstackclient";
const PASSWORD_KEY: &str = "password";

#[derive(Debug, Error)]
pub enum KeyringError {
    #[error("keyring error: {0}")]
    KeyringAccessError(#[from] keyring::Error),
}

#[derive(Debug, Default)]
pub struct Keyring {}

impl Keyring {
    fn entry(&self, cloud: &str) -> Result<Entry, KeyringError> {
        let key = [cloud, PASSWORD_KEY].join(":");
        Ok(Entry::new(KEYRING_SERVICE, key.as_str())?)
    }

    pub fn get(&self, cloud: &str) -> Result<Option<String>, KeyringError> {
        match self.entry(cloud)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(KeyringError::from(e)),
        }
    }

    pub fn put(&self, cloud: &str, password: &str) -> Result<(), KeyringError> {
        self.entry(cloud)?.set_password(password)?;
        Ok(())
    }

    /// Removing an entry that does not exist is not an error.
    pub fn delete(&self, cloud: &str) -> Result<(), KeyringError> {
        match self.entry(cloud)?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(KeyringError::from(e)),
        }
    }
}

/// Password source used when the options carry no password: the keyring
/// entry of the named cloud, then an interactive prompt.
pub fn password_callback(cloud: Option<String>) -> PasswordCallback {
    Arc::new(move |prompt: &str| {
        if let Some(cloud) = &cloud {
            match Keyring::default().get(cloud) {
                Ok(Some(password)) => {
                    debug!("Using the keyring password for cloud {}", cloud);
                    return Ok(password);
                }
                Ok(None) => {}
                Err(e) => warn!("Cannot read the keyring password for cloud {}: {}", cloud, e),
            }
        }

        inquire::Password::new(prompt)
            .without_confirmation()
            .prompt()
            .map_err(|e| AuthLoadError::PasswordPrompt(e.to_string()))
    })
}
