/// Config file loading and creation for the pawrank CLI.
///
/// Config lives at ~/.config/pawrank/config.toml.
/// All fields are optional; CLI flags override config values.
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::bail;

#[derive(Deserialize, Default, Debug)]
pub struct PawrankConfig {
    pub database: Option<PathBuf>,
    pub method: Option<String>,
    pub format: Option<String>,
    pub seed: Option<u64>,
    pub elo_k: Option<f64>,
}

const DEFAULT_CONFIG_TEMPLATE: &str = "\
# pawrank configuration
# All values here can be overridden by CLI flags.

# SQLite database holding items, voters and votes
# database = \"/home/me/pawrank.sqlite\"

# Default ranking method:
# ranked_pairs, copeland, elo, minimax, win_ratio or win_tie_ratio
# method = \"ranked_pairs\"

# Output format: table, json or columns
# format = \"table\"

# Fixed seed for Elo replay order and pair selection (unset = random)
# seed = 42

# Elo K-factor
# elo_k = 10.0
";

/// Returns the default config path: ~/.config/pawrank/config.toml
pub fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| bail("HOME environment variable not set"));
    PathBuf::from(home).join(".config").join("pawrank").join("config.toml")
}

/// Load config from a file path. Returns default (all None) if file doesn't exist.
pub fn load_config(path: &Path) -> PawrankConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content)
            .unwrap_or_else(|e| bail(format!("Failed to parse config at {}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => PawrankConfig::default(),
        Err(e) => bail(format!("Failed to read config at {}: {e}", path.display())),
    }
}

fn parse_config(content: &str) -> Result<PawrankConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Create the default config file at `path`. Errors if it already exists.
pub fn create_default_config(path: &Path) {
    if path.exists() {
        bail(format!("Config file already exists at {}", path.display()));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .unwrap_or_else(|e| bail(format!("Failed to create directory {}: {e}", parent.display())));
    }

    std::fs::write(path, DEFAULT_CONFIG_TEMPLATE)
        .unwrap_or_else(|e| bail(format!("Failed to write config to {}: {e}", path.display())));
}
