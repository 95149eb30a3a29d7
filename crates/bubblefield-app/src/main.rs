use std::path::PathBuf;

use bubblefield_core::FieldConfig;
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod app;
mod driver;
mod host;

const CONFIG_ENV: &str = "BUBBLEFIELD_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "bubblefield.toml";

fn main() {
    // Init logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_env_filter(filter)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    info!("Bubblefield starting");
    let config = load_config();
    if let Err(e) = app::run_app(config) {
        eprintln!("Bubblefield error: {e}");
    }
}

fn load_config() -> FieldConfig {
    let path = std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    if !path.exists() {
        return FieldConfig::default();
    }
    match FieldConfig::load(&path) {
        Ok(config) => {
            info!("loaded {}", path.display());
            config
        }
        Err(err) => {
            warn!("ignoring {}: {err}", path.display());
            FieldConfig::default()
        }
    }
}
