//! Configuration File Loading
//!
//! Finds the configuration file in the usual locations, parses it as TOML
//! or JSON, and falls back to defaults when nothing usable is found.

use super::Config;
use crate::error::{Error, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "MOSAICSH_CONFIG";

/// Configuration file loader
pub struct ConfigLoader {
    /// Search paths for configuration files, without extension
    search_paths: Vec<PathBuf>,
    /// Supported configuration file formats, in lookup order
    supported_formats: Vec<ConfigFormat>,
    /// Path the configuration was loaded from, if any
    current_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    fn name(self) -> &'static str {
        match self {
            ConfigFormat::Toml => "TOML",
            ConfigFormat::Json => "JSON",
        }
    }

    fn extension(self) -> &'static str {
        match self {
            ConfigFormat::Toml => "toml",
            ConfigFormat::Json => "json",
        }
    }

    /// Format implied by a file extension; TOML when unknown
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Use defaults when no configuration file exists
    pub create_default: bool,
    /// Validate configuration after loading
    pub validate: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            create_default: true,
            validate: true,
        }
    }
}

impl ConfigLoader {
    /// Create a loader over the default search paths
    pub fn new() -> Self {
        Self {
            search_paths: Self::default_search_paths(),
            supported_formats: vec![ConfigFormat::Toml, ConfigFormat::Json],
            current_path: None,
        }
    }

    /// Create a loader that looks at `explicit` before the default paths
    pub fn with_explicit_path(explicit: Option<&Path>) -> Self {
        let mut loader = Self::new();
        if let Some(path) = explicit {
            loader.search_paths.insert(0, path.to_path_buf());
        }
        loader
    }

    /// Load configuration from the default locations
    pub fn load() -> Result<Config> {
        Self::new().load_with_options(LoadOptions::default())
    }

    /// Load configuration with custom options
    pub fn load_with_options(&mut self, options: LoadOptions) -> Result<Config> {
        if let Some((path, config)) = self.find_and_load_config() {
            info!("loaded configuration from {}", path.display());
            self.current_path = Some(path);
            if options.validate {
                config.validate()?;
            }
            return Ok(config);
        }

        if options.create_default {
            debug!("no configuration file found, using defaults");
            Ok(Config::default())
        } else {
            Err(Error::ConfigNotFound)
        }
    }

    /// Load a specific configuration file, picking the format by extension
    pub fn load_from_path(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| Error::ConfigLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config = parse(&content, ConfigFormat::from_path(path))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let format = ConfigFormat::from_path(path);
        let content = match format {
            ConfigFormat::Json => serde_json::to_string_pretty(config).map_err(|e| {
                Error::ConfigSerializationFailed {
                    format: format.name().to_string(),
                    reason: e.to_string(),
                }
            })?,
            ConfigFormat::Toml => {
                toml::to_string_pretty(config).map_err(|e| Error::ConfigSerializationFailed {
                    format: format.name().to_string(),
                    reason: e.to_string(),
                })?
            }
        };

        fs::write(path, content)?;
        Ok(())
    }

    /// Find the first parseable configuration along the search paths.
    /// Broken files are reported and skipped.
    fn find_and_load_config(&self) -> Option<(PathBuf, Config)> {
        for base in &self.search_paths {
            for format in &self.supported_formats {
                let path = Self::path_for_format(base, *format);
                if !path.is_file() {
                    continue;
                }

                match fs::read_to_string(&path)
                    .map_err(Error::from)
                    .and_then(|content| parse(&content, *format))
                {
                    Ok(config) => return Some((path, config)),
                    Err(e) => {
                        warn!("failed to load config from {}: {}", path.display(), e);
                    }
                }
            }
        }
        None
    }

    /// `base` as-is when it already has the format's extension, otherwise
    /// `base` with that extension appended
    fn path_for_format(base: &Path, format: ConfigFormat) -> PathBuf {
        if base.extension().and_then(|e| e.to_str()) == Some(format.extension()) {
            return base.to_path_buf();
        }
        let mut name = base.as_os_str().to_owned();
        name.push(".");
        name.push(format.extension());
        PathBuf::from(name)
    }

    /// Default search paths, most specific first
    fn default_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(explicit) = env::var(CONFIG_ENV_VAR) {
            if !explicit.is_empty() {
                paths.push(PathBuf::from(explicit));
            }
        }

        if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg_config).join("mosaicsh").join("config"));
        }

        if let Some(config_dir) = dirs::config_dir() {
            let path = config_dir.join("mosaicsh").join("config");
            if !paths.contains(&path) {
                paths.push(path);
            }
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".mosaicsh"));
        }

        paths
    }

    /// Path the configuration was loaded from
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    /// List all search paths
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Clear all search paths and add a single path
    pub fn set_search_path(&mut self, path: PathBuf) {
        self.search_paths = vec![path];
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse(content: &str, format: ConfigFormat) -> Result<Config> {
    match format {
        ConfigFormat::Toml => toml::from_str(content).map_err(|e| Error::ConfigParseFailed {
            format: format.name().to_string(),
            reason: e.to_string(),
        }),
        ConfigFormat::Json => serde_json::from_str(content).map_err(|e| Error::ConfigParseFailed {
            format: format.name().to_string(),
            reason: e.to_string(),
        }),
    }
}
