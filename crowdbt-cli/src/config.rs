/// Config file loading and creation for the crowdbt CLI.
///
/// Config lives at ~/.config/crowdbt/config.toml.
/// All fields are optional. CLI args override config values, config values
/// override the library defaults.
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::bail;

#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CrowdbtConfig {
    pub accuracy: Option<f64>,
    pub regularization: Option<f64>,
    pub max_iterations: Option<usize>,
    pub standardize: Option<bool>,
}

const DEFAULT_CONFIG_TEMPLATE: &str = "\
# crowdbt configuration
# All values here can be overridden by CLI flags.

# Probability an annotator's stated preference is correct.
# 0.5 models a spammer, 0.0 a malicious annotator.
# accuracy = 0.9

# Regularization strength toward the virtual anchor object, roughly 0.1 to 10.
# regularization = 0.5

# BFGS iteration cap. The best iterate is used if the cap is hit.
# max_iterations = 99

# Z-score the output scores (ranks are unaffected)
# standardize = false
";

/// Returns the default config path: ~/.config/crowdbt/config.toml
pub fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| bail("HOME environment variable not set"));
    PathBuf::from(home).join(".config").join("crowdbt").join("config.toml")
}

/// Parse config text.
pub fn parse_config(content: &str) -> Result<CrowdbtConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Load config from a file path. Returns default (all None) if file doesn't exist.
pub fn load_config(path: &Path) -> CrowdbtConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content)
            .unwrap_or_else(|e| bail(format!("Failed to parse config at {}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => CrowdbtConfig::default(),
        Err(e) => bail(format!("Failed to read config at {}: {e}", path.display())),
    }
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
