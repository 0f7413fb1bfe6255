//! Exit codes for the `openstack` binary
//!
//! The codes follow the BSD sysexits.h conventions (through the `exitcode`
//! crate) and extend them with a few client-specific values so scripts can
//! tell authentication problems apart from remote API failures.

/// Process exit codes reported by the `openstack` binary
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OscExitCode {
    /// Command completed successfully
    Success = exitcode::OK,

    /// Command line usage error
    UsageError = exitcode::USAGE,

    /// Input or response data was malformed
    DataError = exitcode::DATAERR,

    /// Requested service is absent or disabled in the catalog
    Unavailable = exitcode::UNAVAILABLE,

    /// Unexpected application error
    SoftwareError = exitcode::SOFTWARE,

    /// Invalid cloud configuration (clouds.yaml or command line)
    ConfigError = exitcode::CONFIG,

    /// Authentication plugin could not be loaded or authentication failed
    AuthError = 100,

    /// Connection or TLS problems
    NetworkError = 101,

    /// Remote API returned an error
    ApiError = 102,
}

impl OscExitCode {
    /// Convert to numeric exit code
    pub fn code(&self) -> i32 {
        *self as i32
    }

    /// Get descriptive message for the exit code
    pub fn message(&self) -> &'static str {
        match self {
            OscExitCode::Success => "Success",
            OscExitCode::UsageError => "Command line usage error",
            OscExitCode::DataError => "Data format error",
            OscExitCode::Unavailable => "Service unavailable",
            OscExitCode::SoftwareError => "Internal software error",
            OscExitCode::ConfigError => "Configuration error",
            OscExitCode::AuthError => "Authentication error",
            OscExitCode::NetworkError => "Network communication error",
            OscExitCode::ApiError => "Remote API error",
        }
    }
}

impl From<OscExitCode> for i32 {
    fn from(code: OscExitCode) -> Self {
        code.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sysexits_values() {
        assert_eq!(OscExitCode::Success.code(), 0);
        assert_eq!(OscExitCode::UsageError.code(), 64);
        assert_eq!(OscExitCode::ConfigError.code(), 78);
        assert_eq!(i32::from(OscExitCode::AuthError), 100);
    }
}
