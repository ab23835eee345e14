//! # Collider Configuration
//!
//! Tunables for enumeration workers, ray walks and oriented box containment.
//! Defaults reproduce the constants the shapes use when no configuration is
//! passed.

use serde::{Deserialize, Serialize};

use super::{Config, ConfigError};
use crate::shapes::OrientedBox;

/// # Enumeration Configuration
///
/// Sizing of the worker pool that runs narrow-phase filtering and of the
/// channel that hands results to a world's owner thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnumerationConfig {
    /// Worker threads; `None` uses one per core
    pub worker_threads: Option<usize>,
    /// Batches that may wait for the owner before producers block
    pub handoff_capacity: usize,
}

impl EnumerationConfig {
    /// Create the default enumeration configuration
    pub fn new() -> Self {
        Self {
            worker_threads: None,
            handoff_capacity: 64,
        }
    }

    /// Set a fixed worker count
    #[must_use]
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    /// Set the hand-off channel capacity
    #[must_use]
    pub fn with_handoff_capacity(mut self, capacity: usize) -> Self {
        self.handoff_capacity = capacity;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_threads == Some(0) {
            return Err(ConfigError::Invalid("Worker threads must be at least 1".to_string()));
        }
        if self.handoff_capacity == 0 {
            return Err(ConfigError::Invalid("Hand-off capacity must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl Default for EnumerationConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Ray Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RayConfig {
    /// Upper bound on the units a filtered cell walk covers
    pub max_walk_steps: u32,
    /// How far before a hit cell's center a resolved position lands
    pub surface_offset: f64,
}

impl RayConfig {
    /// Create the default ray configuration
    pub fn new() -> Self {
        Self {
            max_walk_steps: 100,
            surface_offset: 0.5,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_walk_steps == 0 {
            return Err(ConfigError::Invalid("Ray walks need at least one step".to_string()));
        }
        if !self.surface_offset.is_finite() || self.surface_offset < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "Surface offset must be a non-negative number, got {}",
                self.surface_offset
            )));
        }
        Ok(())
    }
}

impl Default for RayConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Oriented Box Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientedBoxConfig {
    /// Squared distance from the box still counted as inside
    pub contains_tolerance_sq: f64,
}

impl Default for OrientedBoxConfig {
    fn default() -> Self {
        Self {
            contains_tolerance_sq: OrientedBox::CONTAINS_TOLERANCE_SQ,
        }
    }
}

/// # Complete Collider Configuration
///
/// Top-level configuration; this is the type applications load.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CollidersConfig {
    /// Worker pool and hand-off
    pub enumeration: EnumerationConfig,
    /// Ray walks
    pub ray: RayConfig,
    /// Oriented box containment
    pub oriented_box: OrientedBoxConfig,
}

impl CollidersConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.enumeration.validate()?;
        self.ray.validate()?;
        let tolerance = self.oriented_box.contains_tolerance_sq;
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(ConfigError::Invalid(
                "Containment tolerance must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config for CollidersConfig {}
