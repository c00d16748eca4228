//! Configuration management for folio.
//!
//! Parses `folio.toml` with serde and discovers the file in the current
//! directory or its parents. CLI flags are layered on top through
//! [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! URL fields support `${VAR}` (error if unset) and `${VAR:-default}`:
//!
//! - `content.endpoint`
//! - `diagrams.kroki_url`

mod expand;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Configuration filename to search for.
pub const CONFIG_FILENAME: &str = "folio.toml";

const DEFAULT_LANGUAGE: &str = "pt";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PRELOAD_DELAY_MS: u64 = 100;

/// CLI settings that override configuration file values.
///
/// Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override content endpoint.
    pub content_endpoint: Option<String>,
    /// Override content language.
    pub language: Option<String>,
    /// Override cache enabled flag.
    pub cache_enabled: Option<bool>,
    /// Override Kroki URL.
    pub kroki_url: Option<String>,
}

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    content: ContentConfigRaw,
    cache: CacheConfigRaw,
    /// Optional section. When present, `kroki_url` is required.
    diagrams: Option<DiagramsConfigRaw>,
    /// Batch preload configuration.
    pub preload: PreloadConfig,

    /// Resolved content configuration (set after loading).
    #[serde(skip)]
    pub content_resolved: ContentConfig,
    /// Resolved cache configuration (set after loading).
    #[serde(skip)]
    pub cache_resolved: CacheConfig,
    /// Resolved diagrams configuration (set after loading).
    #[serde(skip)]
    pub diagrams_resolved: DiagramsConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ContentConfigRaw {
    endpoint: Option<String>,
    assets_dir: Option<String>,
    language: Option<String>,
}

/// Where raw markdown comes from and which language it is rendered for.
#[derive(Debug, Clone)]
pub struct ContentConfig {
    /// HTTP endpoint serving `GET {endpoint}/{id}`.
    pub endpoint: Option<String>,
    /// Directory with `{id}.md` files, used when the endpoint fails.
    pub assets_dir: Option<PathBuf>,
    /// Active language, part of every cache key.
    pub language: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            assets_dir: None,
            language: DEFAULT_LANGUAGE.to_owned(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct CacheConfigRaw {
    enabled: Option<bool>,
}

/// Resolved cache configuration.
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    /// Whether the persistent tier is enabled.
    pub enabled: bool,
    /// Persistent cache directory (`.folio/cache` next to the config file).
    pub dir: PathBuf,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct DiagramsConfigRaw {
    kroki_url: Option<String>,
    timeout_secs: Option<u64>,
    on_error: Option<OnDiagramError>,
}

/// What a render does when a diagram fails to compile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnDiagramError {
    /// Fail the whole render.
    #[default]
    Abort,
    /// Render an inline error container and carry on.
    Placeholder,
}

/// Resolved diagram configuration.
#[derive(Debug, Clone)]
pub struct DiagramsConfig {
    /// Kroki server URL. Diagrams are left as code blocks when unset.
    pub kroki_url: Option<String>,
    /// HTTP timeout for Kroki requests.
    pub timeout: Duration,
    /// Compile failure policy.
    pub on_error: OnDiagramError,
}

impl Default for DiagramsConfig {
    fn default() -> Self {
        Self {
            kroki_url: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            on_error: OnDiagramError::default(),
        }
    }
}

/// Batch preload configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreloadConfig {
    /// Pause before each fetch of a batch preload, in milliseconds.
    pub delay_ms: u64,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_PRELOAD_DELAY_MS,
        }
    }
}

impl PreloadConfig {
    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g. "`content.endpoint`").
        field: String,
        /// Error message (e.g. "${`API_HOST`} not set").
        message: String,
    },
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// for `folio.toml` in the current directory and its parents, and falls
    /// back to defaults rooted at the current directory.
    ///
    /// CLI settings are applied last and are validated with the rest.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit `config_path` doesn't exist, parsing
    /// fails, or a value is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(endpoint) = &settings.content_endpoint {
            self.content_resolved.endpoint = Some(endpoint.clone());
        }
        if let Some(language) = &settings.language {
            self.content_resolved.language.clone_from(language);
        }
        if let Some(cache_enabled) = settings.cache_enabled {
            self.cache_resolved.enabled = cache_enabled;
        }
        if let Some(kroki_url) = &settings.kroki_url {
            self.diagrams_resolved.kroki_url = Some(kroki_url.clone());
        }
    }

    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    fn default_with_base(base: &Path) -> Self {
        Self {
            content: ContentConfigRaw::default(),
            cache: CacheConfigRaw::default(),
            diagrams: None,
            preload: PreloadConfig::default(),
            content_resolved: ContentConfig::default(),
            cache_resolved: CacheConfig {
                enabled: true,
                dir: base.join(".folio").join("cache"),
            },
            diagrams_resolved: DiagramsConfig::default(),
            config_path: None,
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve(config_dir)?;
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any check fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_content()?;
        self.validate_diagrams()?;
        Ok(())
    }

    fn validate_content(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.content_resolved.language, "content.language")?;
        if let Some(ref endpoint) = self.content_resolved.endpoint {
            require_non_empty(endpoint, "content.endpoint")?;
            require_http_url(endpoint, "content.endpoint")?;
        }
        Ok(())
    }

    fn validate_diagrams(&self) -> Result<(), ConfigError> {
        if let Some(ref kroki_url) = self.diagrams_resolved.kroki_url {
            require_non_empty(kroki_url, "diagrams.kroki_url")?;
            require_http_url(kroki_url, "diagrams.kroki_url")?;
        }
        if self.diagrams_resolved.timeout.is_zero() {
            return Err(ConfigError::Validation(
                "diagrams.timeout_secs must be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref endpoint) = self.content.endpoint {
            self.content.endpoint = Some(expand::expand_env(endpoint, "content.endpoint")?);
        }

        if let Some(ref mut diagrams) = self.diagrams
            && let Some(ref url) = diagrams.kroki_url
        {
            diagrams.kroki_url = Some(expand::expand_env(url, "diagrams.kroki_url")?);
        }

        Ok(())
    }

    /// Resolve raw sections against the config file's directory.
    ///
    /// Fails when a `[diagrams]` section has no `kroki_url`.
    fn resolve(&mut self, config_dir: &Path) -> Result<(), ConfigError> {
        self.content_resolved = ContentConfig {
            endpoint: self.content.endpoint.clone(),
            assets_dir: self.content.assets_dir.as_deref().map(|d| config_dir.join(d)),
            language: self
                .content
                .language
                .clone()
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_owned()),
        };

        self.cache_resolved = CacheConfig {
            enabled: self.cache.enabled.unwrap_or(true),
            dir: config_dir.join(".folio").join("cache"),
        };

        self.diagrams_resolved = match &self.diagrams {
            Some(diagrams) => {
                let kroki_url = diagrams.kroki_url.clone().ok_or_else(|| {
                    ConfigError::Validation(
                        "[diagrams] section requires kroki_url to be set".to_owned(),
                    )
                })?;
                DiagramsConfig {
                    kroki_url: Some(kroki_url),
                    timeout: Duration::from_secs(
                        diagrams.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
                    ),
                    on_error: diagrams.on_error.unwrap_or_default(),
                }
            }
            None => DiagramsConfig::default(),
        };

        Ok(())
    }
}
