use thiserror::Error;

use crate::actions::CliActionError;
use crate::auth::AuthError;
use crate::client_manager::ClientManagerError;
use crate::exit_codes::OscExitCode;
use crate::session::RequestError;

/// Error types that can occur during CLI command execution
#[derive(Debug, Error)]
pub enum CliError {
    /// Error when an unsupported or undefined subcommand is encountered
    #[error("Undefined or unsupported subcommand: {0}")]
    UnsupportedSubcommand(String),
    /// Error related to clouds.yaml loading or cloud selection
    #[error("Configuration error: {0}")]
    ConfigurationError(#[from] crate::configuration::ConfigurationError),
    /// Error related to data formatting
    #[error("Formatting error: {0}")]
    FormattingError(#[from] crate::format::FormattingError),
    #[error("{0}")]
    ActionError(#[from] CliActionError),
}

fn request_exit_code(error: &RequestError) -> OscExitCode {
    match error {
        RequestError::HttpError(_) | RequestError::CaBundle { .. } => OscExitCode::NetworkError,
        RequestError::UnexpectedResponse { status, .. } if status.as_u16() == 401 => OscExitCode::AuthError,
        RequestError::UnexpectedResponse { .. } => OscExitCode::ApiError,
        RequestError::JsonError(_) => OscExitCode::DataError,
        RequestError::InvalidUrl { .. } => OscExitCode::ConfigError,
    }
}

fn client_manager_exit_code(error: &ClientManagerError) -> OscExitCode {
    match error {
        ClientManagerError::AuthPlugin(_) | ClientManagerError::AuthInProgress => OscExitCode::AuthError,
        ClientManagerError::Authentication(AuthError::Request(e)) => match request_exit_code(e) {
            OscExitCode::ApiError => OscExitCode::AuthError,
            other => other,
        },
        ClientManagerError::Authentication(_) => OscExitCode::AuthError,
        ClientManagerError::UnknownService(_) | ClientManagerError::EndpointNotFound { .. } => {
            OscExitCode::Unavailable
        }
        ClientManagerError::InvalidApiVersion { .. } => OscExitCode::UsageError,
        ClientManagerError::ClientType { .. } => OscExitCode::SoftwareError,
        ClientManagerError::Request(e) => request_exit_code(e),
    }
}

impl CliError {
    /// Get the appropriate exit code for this error
    ///
    /// - `UsageError` for unsupported commands, missing arguments and bad API versions
    /// - `ConfigError` for clouds.yaml problems
    /// - `DataError` for formatting errors
    /// - `AuthError` when the auth plugin cannot be loaded or authentication fails
    /// - `Unavailable` when a service is missing from the catalog
    /// - `NetworkError` / `ApiError` for transport and remote failures
    pub fn exit_code(&self) -> OscExitCode {
        match self {
            CliError::UnsupportedSubcommand(_) => OscExitCode::UsageError,
            CliError::ConfigurationError(_) => OscExitCode::ConfigError,
            CliError::FormattingError(_) => OscExitCode::DataError,
            CliError::ActionError(e) => match e {
                CliActionError::ClientManagerError(e) => client_manager_exit_code(e),
                CliActionError::RequestError(e) => request_exit_code(e),
                CliActionError::FormattingError(_) => OscExitCode::DataError,
                CliActionError::KeyringError(_) => OscExitCode::SoftwareError,
                CliActionError::ServiceUnavailable(_) => OscExitCode::Unavailable,
                CliActionError::NotAuthenticated | CliActionError::PasswordPrompt(_) => OscExitCode::AuthError,
                CliActionError::MissingRequiredArgument(_) => OscExitCode::UsageError,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthLoadError;
    use crate::configuration::ConfigurationError;

    #[test]
    fn test_exit_codes() {
        let missing = ClientManagerError::AuthPlugin(AuthLoadError::MissingOption {
            auth_type: "password".to_string(),
            option: "auth_url".to_string(),
        });
        assert_eq!(
            CliError::from(CliActionError::from(missing)).exit_code(),
            OscExitCode::AuthError
        );

        let unavailable = CliActionError::ServiceUnavailable("network");
        assert_eq!(CliError::from(unavailable).exit_code(), OscExitCode::Unavailable);

        let endpoint = ClientManagerError::EndpointNotFound {
            service_type: "image".to_string(),
            interface: "public".to_string(),
            region: None,
        };
        assert_eq!(
            CliError::from(CliActionError::from(endpoint)).exit_code().code(),
            exitcode::UNAVAILABLE
        );

        let config = ConfigurationError::UnknownCloud {
            name: "lab".to_string(),
            path: Default::default(),
        };
        assert_eq!(CliError::from(config).exit_code().code(), exitcode::CONFIG);
    }
}
