//! World geometry and match configuration
//!
//! Persisted as JSON. Loading is the only fallible boundary of the crate:
//! everything past it assumes a validated `WorldConfig`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid world geometry: {0}")]
    Geometry(String),
    #[error("invalid match config: {0}")]
    Match(String),
}

/// Arena dimensions, cell size and border inset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
    pub cell_width: f32,
    pub cell_height: f32,
    /// Inset of the projectile bounce border (may be zero)
    pub border_thickness: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: WORLD_WIDTH,
            height: WORLD_HEIGHT,
            cell_width: CELL_WIDTH,
            cell_height: CELL_HEIGHT,
            border_thickness: BORDER_THICKNESS,
        }
    }
}

impl WorldConfig {
    /// Same cell layout, new outer dimensions (clamped to the minimum edge)
    pub fn resized(&self, width: f32, height: f32) -> Self {
        Self {
            width: width.max(MIN_WORLD_EDGE),
            height: height.max(MIN_WORLD_EDGE),
            ..*self
        }
    }

    /// Number of whole cell columns
    pub fn grid_columns(&self) -> i32 {
        ((self.width / self.cell_width).floor() as i32).max(1)
    }

    /// Number of whole cell rows
    pub fn grid_rows(&self) -> i32 {
        ((self.height / self.cell_height).floor() as i32).max(1)
    }

    /// Total number of grid cells
    pub fn cell_count(&self) -> usize {
        (self.grid_columns() as usize).saturating_mul(self.grid_rows() as usize)
    }

    /// Distance tanks must keep from every world edge (one full cell)
    pub fn tank_margin(&self) -> f32 {
        self.border_thickness
            .max(self.cell_width.max(self.cell_height))
    }

    pub fn check(&self) -> Result<(), ConfigError> {
        let dims = [
            ("width", self.width),
            ("height", self.height),
            ("cell_width", self.cell_width),
            ("cell_height", self.cell_height),
        ];
        for (name, value) in dims {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Geometry(format!("{name} must be positive, got {value}")));
            }
        }
        if self.width < self.cell_width || self.height < self.cell_height {
            return Err(ConfigError::Geometry(format!(
                "world {}x{} is smaller than one {}x{} cell",
                self.width, self.height, self.cell_width, self.cell_height
            )));
        }
        if !self.border_thickness.is_finite() || self.border_thickness < 0.0 {
            return Err(ConfigError::Geometry(format!(
                "border_thickness must be >= 0, got {}",
                self.border_thickness
            )));
        }
        if self.cell_count() > MAX_GRID_CELLS {
            return Err(ConfigError::Geometry(format!(
                "grid of {}x{} cells exceeds the {} cell limit",
                self.grid_columns(),
                self.grid_rows(),
                MAX_GRID_CELLS
            )));
        }
        Ok(())
    }
}

/// Match clock and seeding
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    pub duration_secs: f32,
    pub tick_rate: u32,
    /// Fixed seed for reproducible matches; random when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            duration_secs: MATCH_SECONDS,
            tick_rate: TICK_RATE,
            seed: None,
        }
    }
}

impl MatchConfig {
    /// Tick on which the match clock reaches the configured duration
    pub fn end_tick(&self) -> u64 {
        (self.duration_secs as f64 * self.tick_rate as f64).ceil() as u64
    }

    pub fn check(&self) -> Result<(), ConfigError> {
        if !self.duration_secs.is_finite() || self.duration_secs <= 0.0 {
            return Err(ConfigError::Match(format!(
                "duration_secs must be positive, got {}",
                self.duration_secs
            )));
        }
        if self.tick_rate == 0 {
            return Err(ConfigError::Match("tick_rate must be non-zero".to_string()));
        }
        Ok(())
    }
}

/// Complete simulation settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default, rename = "match")]
    pub match_config: MatchConfig,
}

impl Settings {
    /// Validate every section
    pub fn check(&self) -> Result<(), ConfigError> {
        self.world.check()?;
        self.match_config.check()
    }

    /// Parse and validate settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.check()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load settings, falling back to defaults on any failure
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Using default settings ({}: {})", path.display(), e);
                Self::default()
            }
        }
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
