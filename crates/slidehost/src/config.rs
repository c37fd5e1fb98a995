use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::model::ViewerMode;

const FILENAME: &str = "config.yaml";
const APP_DIR: &str = "slidehost";

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000/";
pub const DEFAULT_NARROW_WIDTH: f32 = 768.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<IndexConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewer: Option<ViewerConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Local `{ slides: [...] }` file used before `slides-index.json` in static mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedded: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrow_width: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR).join(FILENAME))
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                anyhow::anyhow!("No config found. Run `slidehost config show` to see defaults.")
            } else {
                anyhow::anyhow!("Failed to read config: {e}")
            }
        })?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        let contents = format!("# slidehost configuration\n{yaml}");
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn server_url(&self) -> &str {
        self.server
            .as_ref()
            .and_then(|s| s.url.as_deref())
            .unwrap_or(DEFAULT_SERVER_URL)
    }

    pub fn embedded_index(&self) -> Option<&Path> {
        self.index.as_ref().and_then(|i| i.embedded.as_deref())
    }

    pub fn narrow_width(&self) -> f32 {
        self.viewer
            .as_ref()
            .and_then(|v| v.narrow_width)
            .unwrap_or(DEFAULT_NARROW_WIDTH)
    }

    pub fn viewer_mode(&self) -> Option<ViewerMode> {
        self.viewer
            .as_ref()
            .and_then(|v| v.mode.as_deref())
            .and_then(ViewerMode::from_name)
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "server.url" => {
                url::Url::parse(value)
                    .map_err(|e| anyhow::anyhow!("Invalid server URL: {value} ({e})"))?;
                self.server.get_or_insert_with(ServerConfig::default).url =
                    Some(value.to_string());
            }
            "index.embedded" => {
                self.index.get_or_insert_with(IndexConfig::default).embedded =
                    Some(PathBuf::from(value));
            }
            "viewer.narrow_width" => {
                let width: f32 = value
                    .parse()
                    .ok()
                    .filter(|w: &f32| *w > 0.0)
                    .ok_or_else(|| {
                        anyhow::anyhow!("Invalid narrow_width: {value}. Must be a positive number.")
                    })?;
                self.viewer
                    .get_or_insert_with(ViewerConfig::default)
                    .narrow_width = Some(width);
            }
            "viewer.mode" => {
                if ViewerMode::from_name(value).is_none() {
                    anyhow::bail!("Invalid viewer mode: {value}. Must be 'paged' or 'scroll'.");
                }
                self.viewer.get_or_insert_with(ViewerConfig::default).mode =
                    Some(value.to_string());
            }
            _ => anyhow::bail!(
                "Unknown config key: {key}. Valid keys: server.url, index.embedded, viewer.narrow_width, viewer.mode"
            ),
        }
        Ok(())
    }
}
