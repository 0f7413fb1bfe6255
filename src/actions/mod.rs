use clap::ArgMatches;
use thiserror::Error;

use crate::client_manager::ClientManagerError;
use crate::commands::params::{PARAMETER_FORMAT, PARAMETER_HEADERS, PARAMETER_PRETTY};
use crate::format::{Formattable, FormattingError, OutputFormat, OutputFormatOptions, Record, JSON};
use crate::keyring::KeyringError;
use crate::session::RequestError;

pub mod common;
pub mod identity;
pub mod resources;

#[derive(Debug, Error)]
pub enum CliActionError {
    #[error("{0}")]
    ClientManagerError(#[from] ClientManagerError),

    #[error("{0}")]
    RequestError(#[from] RequestError),

    #[error("{0}")]
    FormattingError(#[from] FormattingError),

    #[error("{0}")]
    KeyringError(#[from] KeyringError),

    #[error("the {0} service is not enabled in the service catalog")]
    ServiceUnavailable(&'static str),

    #[error("the command requires authentication")]
    NotAuthenticated,

    #[error("Missing required argument: {0}")]
    MissingRequiredArgument(String),

    #[error("failed to read password: {0}")]
    PasswordPrompt(String),
}

/// Output format selected by `-f/--format`, `--pretty` and `--headers`.
pub fn output_format(matches: &ArgMatches) -> Result<OutputFormat, CliActionError> {
    let name = matches
        .get_one::<String>(PARAMETER_FORMAT)
        .map(String::as_str)
        .unwrap_or(JSON);
    let options = OutputFormatOptions {
        with_headers: matches.get_flag(PARAMETER_HEADERS),
        pretty: matches.get_flag(PARAMETER_PRETTY),
    };
    Ok(OutputFormat::from_string_with_options(name, options)?)
}

pub fn print_records<T: Record>(records: &[T], matches: &ArgMatches) -> Result<(), CliActionError> {
    let output = records.format(&output_format(matches)?)?;
    println!("{}", output);
    Ok(())
}
