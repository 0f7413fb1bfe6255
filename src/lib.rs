//! OpenStack command-line client library.
//!
//! The per-invocation [`client_manager::ClientManager`] owns the connection
//! options, loads the authentication plugin on demand and hands out one
//! memoized client per registered service plugin.
//!
//! # Modules
//!
//! - `actions`: command implementations
//! - `auth`: authentication plugins, the plugin loader and the service catalog
//! - `cache`: memoized service clients
//! - `cli`: command dispatch
//! - `client_manager`: auth setup, endpoint lookup and client access
//! - `commands`: CLI command parsing
//! - `configuration`: clouds.yaml loading and option resolution
//! - `format`: output formatting (JSON, CSV, plain values)
//! - `keyring`: passwords stored in the system keyring
//! - `options`: the resolved connection options
//! - `plugin`: service plugin trait and registry
//! - `services`: built-in identity, compute, network, volume, object store and image clients
//! - `session`: blocking HTTP session and REST helpers

pub mod actions;
pub mod auth;
pub mod cache;
pub mod cli;
pub mod client_manager;
pub mod commands;
pub mod configuration;
pub mod error;
pub mod exit_codes;
pub mod format;
pub mod keyring;
pub mod options;
pub mod plugin;
pub mod services;
pub mod session;
