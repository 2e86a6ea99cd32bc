use std::path::PathBuf;

use log::{debug, info};
use serde::Deserialize;

use crate::settings::{Color, Settings};

// ---------------------------------------------------------------------------
// ConfigFile: deserialized from TOML (all fields optional)
// ---------------------------------------------------------------------------

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub max_width: Option<u32>,
    pub page_spacing: Option<u32>,
    pub background: Option<Color>,
    #[serde(default)]
    pub viewer: ViewerConfigFile,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct ViewerConfigFile {
    pub queue_depth: Option<usize>,
    pub scroll_step: Option<u32>,
    pub zoom_step: Option<f64>,
    pub placeholder_margin: Option<u32>,
}

// ---------------------------------------------------------------------------
// Config: resolved (all fields concrete)
// ---------------------------------------------------------------------------

pub struct Config {
    pub max_width: u32,
    pub page_spacing: u32,
    pub background: Color,
    pub viewer: ViewerConfig,
}

pub struct ViewerConfig {
    /// Capacity of the decode worker's request channel.
    pub queue_depth: usize,
    pub scroll_step: u32,
    pub zoom_step: f64,
    pub placeholder_margin: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        ViewerConfigFile::default().resolve()
    }
}

impl Config {
    pub fn settings(&self) -> Settings {
        Settings {
            max_width: self.max_width,
            spacing: self.page_spacing,
            background: self.background,
        }
    }
}

impl ViewerConfigFile {
    fn resolve(self) -> ViewerConfig {
        ViewerConfig {
            queue_depth: self.queue_depth.unwrap_or(16).max(1),
            scroll_step: self.scroll_step.unwrap_or(120),
            zoom_step: self.zoom_step.unwrap_or(0.1),
            placeholder_margin: self.placeholder_margin.unwrap_or(20),
        }
    }
}

impl ConfigFile {
    /// Merge CLI values (overwrites non-None fields).
    pub fn merge_cli(
        &mut self,
        max_width: Option<u32>,
        page_spacing: Option<u32>,
        background: Option<Color>,
    ) {
        if let Some(v) = max_width {
            debug!("config: CLI override max_width={v}");
            self.max_width = max_width;
        }
        if let Some(v) = page_spacing {
            debug!("config: CLI override page_spacing={v}");
            self.page_spacing = page_spacing;
        }
        if let Some(v) = background {
            debug!("config: CLI override background={v}");
            self.background = background;
        }
    }

    /// Resolve to a Config by applying defaults to missing fields.
    pub fn resolve(self) -> Config {
        let defaults = Settings::default();
        let config = Config {
            max_width: self.max_width.unwrap_or(defaults.max_width),
            page_spacing: self.page_spacing.unwrap_or(defaults.spacing),
            background: self.background.unwrap_or(defaults.background),
            viewer: self.viewer.resolve(),
        };
        info!(
            "config: resolved max_width={}, page_spacing={}, background={}, \
             queue_depth={}, scroll_step={}, zoom_step={}, placeholder_margin={}",
            config.max_width,
            config.page_spacing,
            config.background,
            config.viewer.queue_depth,
            config.viewer.scroll_step,
            config.viewer.zoom_step,
            config.viewer.placeholder_margin,
        );
        config
    }
}

/// Resolve the XDG config path for mangaview.
fn config_path() -> Option<PathBuf> {
    let config_dir = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
    Some(config_dir.join("mangaview").join("config.toml"))
}

/// Load config file. Returns `ConfigFile::default()` if no file exists.
/// Returns an error if the file exists but cannot be parsed.
pub fn load_config() -> anyhow::Result<ConfigFile> {
    let Some(path) = config_path() else {
        info!("config: no HOME or XDG_CONFIG_HOME set, using defaults");
        return Ok(ConfigFile::default());
    };
    debug!("config: looking for {}", path.display());
    match std::fs::read_to_string(&path) {
        Ok(text) => {
            info!("config: loaded from {}", path.display());
            let cfg: ConfigFile = toml::from_str(&text)
                .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("config: {} not found, using defaults", path.display());
            Ok(ConfigFile::default())
        }
        Err(e) => Err(anyhow::anyhow!("failed to read {}: {e}", path.display())),
    }
}
