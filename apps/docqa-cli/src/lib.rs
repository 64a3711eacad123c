//! Process setup shared by the `docqa-*` binaries.

use docqa_core::config::Config;
use docqa_core::settings::{LoggingSettings, Settings};
use tracing_subscriber::EnvFilter;

/// Load and validate settings for the active `RUST_ENV`.
pub fn load_settings() -> anyhow::Result<Settings> {
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings().map_err(|e| { eprintln!("Invalid config ({}): {}", config.env_name(), e); e })?;
    Ok(settings)
}

/// Install the global subscriber. `RUST_LOG` overrides `logging.level`.
pub fn init_logging(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Value following `flag`, parsed; exits with a usage error when missing or malformed.
pub fn flag_value<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> T {
    match args.get(i + 1).and_then(|v| v.parse::<T>().ok()) {
        Some(v) => v,
        None => {
            eprintln!("Error: {flag} requires a value");
            std::process::exit(1);
        }
    }
}
