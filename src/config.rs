//! Uploader configuration module.
//!
//! Handles loading, validating and merging `config.toml`. Stock defaults are
//! overridden by whatever keys the user's file sets; everything else keeps
//! its default.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [cover]
//! max_files = 1             # Single cover image
//! crop_aspect = [3, 4]      # width:height
//! free_crop = false         # true ignores crop_aspect
//! file_size_limit_kb = 150  # Intake ceiling per file
//!
//! [screenshots]
//! max_files = 5
//! crop_aspect = [16, 9]
//! file_size_limit_kb = 150
//!
//! [render]
//! device_pixel_ratio = 1.0  # Output density multiplier
//! timeout_secs = 30         # 0 disables the render deadline
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::DisplayMetrics;
use crate::uploader::UploaderProps;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Uploader configuration loaded from `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploaderConfig {
    /// Cover image slot.
    pub cover: SlotConfig,
    /// Screenshot gallery slot.
    pub screenshots: SlotConfig,
    /// Rasterizer settings.
    pub render: RenderConfig,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            cover: SlotConfig {
                max_files: 1,
                crop_aspect: [3, 4],
                free_crop: false,
                file_size_limit_kb: 150,
            },
            screenshots: SlotConfig {
                max_files: 5,
                crop_aspect: [16, 9],
                free_crop: false,
                file_size_limit_kb: 150,
            },
            render: RenderConfig::default(),
        }
    }
}

/// Which image slot of the submission form to configure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Slot {
    Cover,
    Screenshots,
}

impl UploaderConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, slot) in [("cover", &self.cover), ("screenshots", &self.screenshots)] {
            if slot.max_files == 0 {
                return Err(ConfigError::Validation(format!(
                    "{name}.max_files must be at least 1"
                )));
            }
            if slot.file_size_limit_kb == 0 {
                return Err(ConfigError::Validation(format!(
                    "{name}.file_size_limit_kb must be non-zero"
                )));
            }
            if slot.crop_aspect.contains(&0) {
                return Err(ConfigError::Validation(format!(
                    "{name}.crop_aspect values must be non-zero"
                )));
            }
        }
        let ratio = self.render.device_pixel_ratio;
        if !(ratio.is_finite() && ratio > 0.0) {
            return Err(ConfigError::Validation(
                "render.device_pixel_ratio must be a positive number".into(),
            ));
        }
        Ok(())
    }

    pub fn slot(&self, slot: Slot) -> &SlotConfig {
        match slot {
            Slot::Cover => &self.cover,
            Slot::Screenshots => &self.screenshots,
        }
    }

    /// Uploader inputs for one slot.
    pub fn uploader_props(&self, slot: Slot) -> UploaderProps {
        let slot = self.slot(slot);
        UploaderProps {
            max_files: slot.max_files,
            crop_aspect: slot.aspect(),
            file_size_limit_kb: slot.file_size_limit_kb,
            metrics: DisplayMetrics::natural().with_pixel_ratio(self.render.device_pixel_ratio),
            render_timeout: self.render.timeout(),
        }
    }
}

/// Settings for one image slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlotConfig {
    /// Selection capacity; older images are evicted beyond it.
    pub max_files: usize,
    /// Crop aspect as `[width, height]`.
    pub crop_aspect: [u32; 2],
    /// Free-form cropping; `crop_aspect` is ignored when set.
    #[serde(default)]
    pub free_crop: bool,
    /// Per-file intake ceiling in KB.
    pub file_size_limit_kb: u64,
}

impl SlotConfig {
    pub fn aspect(&self) -> Option<f64> {
        let [w, h] = self.crop_aspect;
        (!self.free_crop).then(|| w as f64 / h as f64)
    }
}

/// Rasterizer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Output density multiplier.
    pub device_pixel_ratio: f64,
    /// Render deadline in seconds; 0 disables it.
    pub timeout_secs: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            device_pixel_ratio: 1.0,
            timeout_secs: 30,
        }
    }
}

impl RenderConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(UploaderConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<UploaderConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: UploaderConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
pub fn load_config(dir: &Path) -> Result<UploaderConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(dir)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# cropstage configuration
# =======================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Cover image
# ---------------------------------------------------------------------------
[cover]
# How many images the slot keeps. Adding beyond this evicts the oldest.
max_files = 1

# Crop aspect as [width, height].
crop_aspect = [3, 4]

# Let the user crop any shape. crop_aspect is ignored when true.
free_crop = false

# Files larger than this are rejected before cropping.
file_size_limit_kb = 150

# ---------------------------------------------------------------------------
# Screenshot gallery
# ---------------------------------------------------------------------------
[screenshots]
max_files = 5
crop_aspect = [16, 9]
free_crop = false
file_size_limit_kb = 150

# ---------------------------------------------------------------------------
# Rendering
# ---------------------------------------------------------------------------
[render]
# Output pixels per crop pixel. 2.0 renders at double density.
device_pixel_ratio = 1.0

# Give up on a render after this many seconds. 0 waits forever.
timeout_secs = 30
"##
}
