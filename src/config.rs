use anyhow::{bail, Context, Result};
use jiff::tz::TimeZone;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub backdrop: BackdropConfig,
    pub greeting: GreetingConfig,
    pub quote: QuoteConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BackdropConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub category: String,
    pub width: u32,
    pub height: u32,
    /// Length of the fade-in once the picture has loaded.
    pub fade_ms: u64,
}

impl Default for BackdropConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://source.unsplash.com/category".to_string(),
            category: "nature".to_string(),
            width: 1920,
            height: 1080,
            fade_ms: 1200,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct GreetingConfig {
    pub names: Vec<String>,
    /// IANA zone name. Local time when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl Default for GreetingConfig {
    fn default() -> Self {
        Self {
            names: [
                "handsome",
                "smarty pants",
                "good looking",
                "classy",
                "junior dev",
                "Mr Roboto",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            timezone: None,
        }
    }
}

impl GreetingConfig {
    pub fn timezone(&self) -> Result<Option<TimeZone>> {
        match &self.timezone {
            None => Ok(None),
            Some(name) => TimeZone::get(name)
                .map(Some)
                .with_context(|| format!("unknown timezone {:?}", name)),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct QuoteConfig {
    pub enabled: bool,
    pub endpoint: String,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://quotesondesign.com/wp-json/posts".to_string(),
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("startpage").join("config.toml"))
    }

    /// Reads the config at `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.greeting.names.is_empty() {
            bail!("greeting.names must contain at least one name");
        }
        if self.backdrop.width == 0 || self.backdrop.height == 0 {
            bail!(
                "backdrop resolution must be non-zero, got {}x{}",
                self.backdrop.width,
                self.backdrop.height
            );
        }
        self.greeting.timezone()?;
        Ok(())
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write config file {}", path.display()))?;
        Ok(())
    }
}
