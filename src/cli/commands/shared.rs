//! Shared setup for CLI commands: logging, configuration, storage

use crate::cli::args::Args;
use crate::config::Config;
use crate::{Result, SchemaModel, Store};
use serde::Serialize;
use tracing::debug;

/// Set up structured logging on stderr
///
/// `RUST_LOG` wins over the -v / -q flags when set.
pub fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tm_results={}", log_level)));

    let layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr);

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.compact())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.with_timer(fmt::time::uptime()))
            .init();
    }

    debug!("Logging initialized at level: {}", log_level);
}

/// Layered configuration with the --db override applied
pub fn load_config(args: &Args) -> Result<Config> {
    let config_file = match &args.config {
        Some(path) => Some(path.clone()),
        None => Config::default_config_path().ok().filter(|path| path.exists()),
    };

    let mut config = Config::load_layered(config_file.as_deref())?;
    if let Some(db) = &args.db {
        config = config.with_database_path(db);
        config.validate()?;
    }
    debug!("Configuration: {:?}", config);
    Ok(config)
}

/// Configuration plus an open store
pub fn open_store(args: &Args) -> Result<(Config, Store)> {
    let config = load_config(args)?;
    let store = Store::from_config(&config)?;
    Ok((config, store))
}

pub fn load_schema(config: &Config) -> Result<SchemaModel> {
    SchemaModel::load(&config.schema)
}

/// Pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
