//! Configuration loading

use anyhow::Result;

use crate::Config;

/// Load configuration from an explicit path, a config file, or environment variables
///
/// Config file search order:
/// 1. `explicit` argument (e.g. `--config` on the command line)
/// 2. `KIOSK_CONFIG_PATH` environment variable
/// 3. ./config.yaml (current working directory)
/// 4. /config/config.yaml (container mount path)
/// 5. Fall back to environment variables only
///
/// Runs before logging is initialised, so progress goes to stderr.
pub fn load_config(explicit: Option<&str>) -> Result<Config> {
    let config_path = explicit
        .map(str::to_string)
        .or_else(|| {
            std::env::var("KIOSK_CONFIG_PATH")
                .ok()
                .filter(|p| std::path::Path::new(p).exists())
        })
        .or_else(|| {
            ["config.yaml", "/config/config.yaml"]
                .into_iter()
                .find(|p| std::path::Path::new(p).exists())
                .map(str::to_string)
        });

    let config = if let Some(path) = config_path {
        eprintln!("Loading config from {path}");
        match Config::from_file(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Failed to load {path}: {e}");
                eprintln!("Falling back to environment variables");
                Config::from_env().unwrap_or_default()
            }
        }
    } else {
        eprintln!("No config file found, using environment variables");
        Config::from_env().unwrap_or_else(|e| {
            eprintln!("Failed to load config: {e}");
            eprintln!("Using default configuration");
            Config::default()
        })
    };

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Config validation error: {error}");
        }
        return Err(anyhow::anyhow!(
            "Configuration validation failed with {} error(s): {}",
            errors.len(),
            errors.join("; ")
        ));
    }

    Ok(config)
}
