//! Configuration system
//!
//! Serde-backed settings for the spatial indices and the solver, loadable
//! from TOML or RON files by format-sniffing on the extension.

pub use serde::{Deserialize, Serialize};

pub use crate::spatial::{GridConfig, TreeConfig};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported file format
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),
}

/// Solver settings for a simulation run
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Fixed timestep in seconds
    pub dt: f32,
    /// Velocity fraction bled off at contacts, in `[0, 1]`
    pub damping: f32,
    /// Epsilon added to penetration depths during resolution
    pub tolerance: f32,
    /// Gravitational acceleration (3D; lower-dimensional runs truncate)
    pub gravity: [f32; 3],
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            damping: 0.01,
            tolerance: 1e-3,
            gravity: [0.0, -9.81, 0.0],
        }
    }
}

impl Config for SolverConfig {}
impl Config for GridConfig {}
impl Config for TreeConfig {}
