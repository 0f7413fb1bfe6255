//! Shared command parameters for all CLI commands.
//!
//! Parameter ids double as long option names, so `matches.get_one` lookups
//! and the rendered help always agree.

use crate::format::OutputFormat;
use clap::{Arg, ArgAction};
use std::path::PathBuf;

// Command groups
pub const COMMAND_TOKEN: &str = "token";
pub const COMMAND_CATALOG: &str = "catalog";
pub const COMMAND_MODULE: &str = "module";
pub const COMMAND_CONFIGURATION: &str = "configuration";
pub const COMMAND_PROJECT: &str = "project";
pub const COMMAND_SERVER: &str = "server";
pub const COMMAND_NETWORK: &str = "network";
pub const COMMAND_VOLUME: &str = "volume";
pub const COMMAND_CONTAINER: &str = "container";
pub const COMMAND_IMAGE: &str = "image";
pub const COMMAND_PASSWORD: &str = "password";

// Actions
pub const COMMAND_ISSUE: &str = "issue";
pub const COMMAND_LIST: &str = "list";
pub const COMMAND_SHOW: &str = "show";
pub const COMMAND_STORE: &str = "store";
pub const COMMAND_FORGET: &str = "forget";

// Connection parameters
pub const PARAMETER_VERBOSE: &str = "verbose";
pub const PARAMETER_OS_CLOUD: &str = "os-cloud";
pub const PARAMETER_OS_AUTH_TYPE: &str = "os-auth-type";
pub const PARAMETER_OS_AUTH_URL: &str = "os-auth-url";
pub const PARAMETER_OS_USERNAME: &str = "os-username";
pub const PARAMETER_OS_PASSWORD: &str = "os-password";
pub const PARAMETER_OS_PROJECT_NAME: &str = "os-project-name";
pub const PARAMETER_OS_PROJECT_DOMAIN_NAME: &str = "os-project-domain-name";
pub const PARAMETER_OS_USER_DOMAIN_NAME: &str = "os-user-domain-name";
pub const PARAMETER_OS_TOKEN: &str = "os-token";
pub const PARAMETER_OS_ENDPOINT: &str = "os-endpoint";
pub const PARAMETER_OS_REGION_NAME: &str = "os-region-name";
pub const PARAMETER_OS_INTERFACE: &str = "os-interface";
pub const PARAMETER_OS_CACERT: &str = "os-cacert";
pub const PARAMETER_INSECURE: &str = "insecure";
pub const PARAMETER_TIMEOUT: &str = "timeout";

// Command parameters
pub const PARAMETER_FORMAT: &str = "format";
pub const PARAMETER_PRETTY: &str = "pretty";
pub const PARAMETER_HEADERS: &str = "headers";
pub const PARAMETER_UNMASK: &str = "unmask";

const CONNECTION_HEADING: &str = "Connection";

fn connection_parameter(id: &'static str, env: &'static str, value_name: &'static str, help: &'static str) -> Arg {
    Arg::new(id)
        .long(id)
        .num_args(1)
        .required(false)
        .env(env)
        .value_name(value_name)
        .global(true)
        .help_heading(CONNECTION_HEADING)
        .help(help)
}

pub fn verbose_parameter() -> Arg {
    Arg::new(PARAMETER_VERBOSE)
        .short('v')
        .long(PARAMETER_VERBOSE)
        .action(ArgAction::SetTrue)
        .global(true)
        .help("Enable verbose output for debugging")
}

/// Global options shared by every command.
pub fn connection_parameters() -> Vec<Arg> {
    vec![
        connection_parameter(PARAMETER_OS_CLOUD, "OS_CLOUD", "NAME", "Cloud name in clouds.yaml"),
        connection_parameter(
            PARAMETER_OS_AUTH_TYPE,
            "OS_AUTH_TYPE",
            "AUTH_TYPE",
            "Authentication type (password, token, token_endpoint, none)",
        ),
        connection_parameter(PARAMETER_OS_AUTH_URL, "OS_AUTH_URL", "URL", "Identity service URL"),
        connection_parameter(PARAMETER_OS_USERNAME, "OS_USERNAME", "NAME", "Authentication username"),
        connection_parameter(
            PARAMETER_OS_PASSWORD,
            "OS_PASSWORD",
            "PASSWORD",
            "Authentication password",
        )
        .hide_env_values(true),
        connection_parameter(PARAMETER_OS_PROJECT_NAME, "OS_PROJECT_NAME", "NAME", "Project to scope to"),
        connection_parameter(
            PARAMETER_OS_PROJECT_DOMAIN_NAME,
            "OS_PROJECT_DOMAIN_NAME",
            "NAME",
            "Domain of the project",
        ),
        connection_parameter(
            PARAMETER_OS_USER_DOMAIN_NAME,
            "OS_USER_DOMAIN_NAME",
            "NAME",
            "Domain of the user",
        ),
        connection_parameter(PARAMETER_OS_TOKEN, "OS_TOKEN", "TOKEN", "Pre-issued authentication token")
            .hide_env_values(true),
        connection_parameter(
            PARAMETER_OS_ENDPOINT,
            "OS_ENDPOINT",
            "URL",
            "Service endpoint to use instead of the catalog",
        ),
        connection_parameter(PARAMETER_OS_REGION_NAME, "OS_REGION_NAME", "NAME", "Service region"),
        connection_parameter(
            PARAMETER_OS_INTERFACE,
            "OS_INTERFACE",
            "INTERFACE",
            "Endpoint interface (public, internal, admin)",
        )
        .value_parser(["public", "internal", "admin"]),
        connection_parameter(PARAMETER_OS_CACERT, "OS_CACERT", "PATH", "CA certificate bundle file")
            .value_parser(clap::value_parser!(PathBuf)),
        Arg::new(PARAMETER_INSECURE)
            .long(PARAMETER_INSECURE)
            .action(ArgAction::SetTrue)
            .global(true)
            .help_heading(CONNECTION_HEADING)
            .help("Disable server certificate verification"),
        connection_parameter(PARAMETER_TIMEOUT, "OS_TIMEOUT", "SECONDS", "HTTP request timeout")
            .value_parser(clap::value_parser!(u64)),
    ]
}

pub fn format_parameter() -> Arg {
    Arg::new(PARAMETER_FORMAT)
        .short('f')
        .long(PARAMETER_FORMAT)
        .num_args(1)
        .required(false)
        .default_value("json")
        .help("Output data format")
        .value_parser(OutputFormat::names())
}

pub fn format_pretty_parameter() -> Arg {
    Arg::new(PARAMETER_PRETTY)
        .long(PARAMETER_PRETTY)
        .action(ArgAction::SetTrue)
        .required(false)
        .help("Format the output pretty")
}

pub fn format_with_headers_parameter() -> Arg {
    Arg::new(PARAMETER_HEADERS)
        .long(PARAMETER_HEADERS)
        .action(ArgAction::SetTrue)
        .required(false)
        .help("Format the output with headers")
}

pub fn unmask_parameter() -> Arg {
    Arg::new(PARAMETER_UNMASK)
        .long(PARAMETER_UNMASK)
        .action(ArgAction::SetTrue)
        .required(false)
        .help("Show secrets in clear text")
}

/// `list` subcommand with the output format options.
pub fn list_subcommand(about: &'static str) -> clap::Command {
    clap::Command::new(COMMAND_LIST)
        .about(about)
        .visible_alias("ls")
        .arg(format_parameter())
        .arg(format_pretty_parameter())
        .arg(format_with_headers_parameter())
}
