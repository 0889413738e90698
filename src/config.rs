use crate::error::{ConfigError, StoreError};
use crate::MacGrid;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimConfig {
    /// Cells per side, border ring included.
    pub resolution: usize,
    /// Physical width of the interior, in metres.
    pub domain_length: f32,
    /// Multiplier on standard gravity; 0 disables it.
    pub gravity: f32,
    pub density: f32,
    pub dt: f32,
    pub pressure_iterations: usize,
    pub sor_weight: f32,
    pub cell_px: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            resolution: 98,
            domain_length: 10.0,
            gravity: 1.0,
            density: 1.0,
            dt: 1.0 / 60.0,
            pressure_iterations: 50,
            sor_weight: 1.6,
            cell_px: 8,
        }
    }
}

impl SimConfig {
    /// Reads a JSON config; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            log::warn!("config {} not found; using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolution < 3 {
            return Err(ConfigError::Resolution {
                resolution: self.resolution,
            });
        }
        if !(self.domain_length.is_finite() && self.domain_length > 0.0) {
            return Err(ConfigError::DomainLength {
                length: self.domain_length,
            });
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(ConfigError::Timestep { dt: self.dt });
        }
        if !(self.density.is_finite() && self.density > 0.0) {
            return Err(ConfigError::Density {
                density: self.density,
            });
        }
        if !(self.sor_weight > 0.0 && self.sor_weight < 2.0) {
            return Err(ConfigError::SorWeight {
                weight: self.sor_weight,
            });
        }
        if !self.gravity.is_finite() {
            return Err(ConfigError::Gravity {
                gravity: self.gravity,
            });
        }
        Ok(())
    }

    /// Edge length of one cell: the interior spans `domain_length`.
    pub fn cell_size(&self) -> f32 {
        self.domain_length / (self.resolution.saturating_sub(2).max(1)) as f32
    }

    pub fn grid(&self) -> Result<MacGrid, ConfigError> {
        self.validate()?;
        Ok(MacGrid::new(self.resolution, self.cell_size()))
    }
}
