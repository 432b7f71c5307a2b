use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Ok, Result};
use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::core::analyzer::DEFAULT_MODULE_NAME;

pub const CONFIG_FILE_NAME: &str = ".nlsrc.json";

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Glob patterns, relative to `root`, of files to rewrite.
    #[serde(default = "default_includes")]
    pub includes: Vec<String>,
    #[serde(default = "default_ignores")]
    pub ignores: Vec<String>,
    /// Directory holding the compiled output to rewrite.
    #[serde(default = "default_root")]
    pub root: String,
    /// Write rewritten files here instead of in place.
    #[serde(default)]
    pub out_dir: Option<String>,
    /// Module whose imports mark a file as localized.
    #[serde(default = "default_module_name")]
    pub module_name: String,
    /// Fill load calls with a path relative to `__dirname` instead of `__filename`.
    #[serde(default)]
    pub relative_paths: bool,
    /// Identifier of the bundled metadata; no bundle is written when unset.
    #[serde(default)]
    pub bundle_id: Option<String>,
    /// Folder with translated `.i18n.json` files, one sub-folder per language.
    #[serde(default = "default_i18n_root")]
    pub i18n_root: String,
}

fn default_includes() -> Vec<String> {
    vec!["**/*.js".to_string()]
}

fn default_ignores() -> Vec<String> {
    vec!["**/node_modules/**".to_string()]
}

fn default_root() -> String {
    "./out".to_string()
}

fn default_module_name() -> String {
    DEFAULT_MODULE_NAME.to_string()
}

fn default_i18n_root() -> String {
    "./i18n".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            includes: default_includes(),
            ignores: default_ignores(),
            root: default_root(),
            out_dir: None,
            module_name: default_module_name(),
            relative_paths: false,
            bundle_id: None,
            i18n_root: default_i18n_root(),
        }
    }
}

impl Config {
    /// Validate configuration values.
    ///
    /// Returns an error if any glob pattern in `includes` or `ignores` is invalid.
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.includes {
            Pattern::new(pattern)
                .with_context(|| format!("Invalid glob pattern in 'includes': \"{}\"", pattern))?;
        }
        for pattern in &self.ignores {
            Pattern::new(pattern)
                .with_context(|| format!("Invalid glob pattern in 'ignores': \"{}\"", pattern))?;
        }
        if self.module_name.trim().is_empty() {
            anyhow::bail!("'moduleName' must not be empty");
        }
        Ok(())
    }
}

pub fn default_config_json() -> Result<String> {
    let config = Config::default();
    serde_json::to_string_pretty(&config).context("Failed to generate default config.")
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if current.join(".git").exists() {
            return None;
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Result of loading configuration.
pub struct ConfigLoadResult {
    pub config: Config,
    /// Directory relative paths in the config are resolved against.
    pub base_dir: PathBuf,
    /// True if config was loaded from a file, false if using defaults.
    pub from_file: bool,
}

pub fn load_config(start_dir: &Path) -> Result<ConfigLoadResult> {
    match find_config_file(start_dir) {
        Some(path) => {
            let content = fs::read_to_string(&path)?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            config.validate()?;
            let base_dir = path
                .parent()
                .map_or_else(|| start_dir.to_path_buf(), Path::to_path_buf);
            Ok(ConfigLoadResult {
                config,
                base_dir,
                from_file: true,
            })
        }
        None => Ok(ConfigLoadResult {
            config: Config::default(),
            base_dir: start_dir.to_path_buf(),
            from_file: false,
        }),
    }
}
