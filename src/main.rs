use color_print::ceprintln;
use openstackclient::{
    cli::execute_command,
    commands::{create_cli_commands, params::PARAMETER_VERBOSE},
    configuration::Configuration,
    services::default_registry,
};
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter};

/// Main entry point for the program
fn main() {
    // RUST_LOG wins; otherwise start at warn so plugin discovery can report skipped plugins
    let from_env = EnvFilter::try_from_default_env().ok();
    let explicit_filter = from_env.is_some();
    let (filter, filter_handle) = reload::Layer::new(from_env.unwrap_or_else(|| EnvFilter::new("warn")));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let registry = Arc::new(default_registry());
    let matches = create_cli_commands(&registry).get_matches();

    if !explicit_filter && matches.get_flag(PARAMETER_VERBOSE) {
        if let Err(e) = filter_handle.reload(EnvFilter::new("debug")) {
            warn!("Failed to enable verbose logging: {}", e);
        }
    }

    if let Err(e) = execute_command(&matches, registry, Configuration::load_default) {
        ceprintln!("<r>ERROR:</r> {}", e);
        ::std::process::exit(e.exit_code().code());
    }
}
