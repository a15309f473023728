// src/config/mod.rs
//! Engine configuration
//!
//! Model coefficients that a lab deployment may tune (block depth, intensity
//! ceiling, depth scale), feature flags for the distortion stages, and engine
//! settings. Tissue and stimulation values are not configuration: they arrive
//! per call as immutable snapshots.

pub mod constants;
pub mod loader;

pub use constants::*;
pub use loader::{ConfigError, ConfigLoader};

use serde::{Deserialize, Serialize};

/// Complete engine configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub tissue: TissueModelConfig,
    #[serde(default)]
    pub stimulation: StimulationModelConfig,
    #[serde(default)]
    pub field: FieldConfig,
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub features: FeatureFlags,
}

/// Tissue block geometry
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TissueModelConfig {
    #[serde(default = "defaults::total_block_depth")]
    pub total_block_depth: f32,

    #[serde(default = "defaults::reference_fat_thickness")]
    pub reference_fat_thickness: f32,

    #[serde(default = "defaults::depth_scale")]
    pub depth_scale: f32,
}

/// Stimulator limits
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StimulationModelConfig {
    #[serde(default = "defaults::max_intensity_ma")]
    pub max_intensity_ma: f32,
}

/// Field-line generation settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FieldConfig {
    #[serde(default = "defaults::jitter_seed")]
    pub jitter_seed: u64,

    #[serde(default = "defaults::parallel_lines")]
    pub parallel_lines: bool,
}

/// Compute-pass settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EngineSettings {
    #[serde(default = "defaults::cache_capacity")]
    pub cache_capacity: usize,

    #[serde(default = "defaults::frame_budget_ms")]
    pub frame_budget_ms: u32,
}

/// Switches for the incremental model features
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FeatureFlags {
    #[serde(default = "defaults::enabled")]
    pub metal_implant: bool,

    #[serde(default = "defaults::enabled")]
    pub inclusions: bool,

    #[serde(default = "defaults::enabled")]
    pub risk_simulation: bool,
}

/// Default value providers using constants
mod defaults {
    use crate::config::constants::*;

    pub fn total_block_depth() -> f32 { tissue::TOTAL_BLOCK_DEPTH }
    pub fn reference_fat_thickness() -> f32 { tissue::REFERENCE_FAT_THICKNESS }
    pub fn depth_scale() -> f32 { tissue::DEPTH_SCALE }

    pub fn max_intensity_ma() -> f32 { stimulation::MAX_INTENSITY_MA }

    pub fn jitter_seed() -> u64 { field::DEFAULT_JITTER_SEED }
    pub fn parallel_lines() -> bool { cfg!(feature = "parallel") }

    pub fn cache_capacity() -> usize { engine::DEFAULT_CACHE_CAPACITY }
    pub fn frame_budget_ms() -> u32 { engine::DEFAULT_FRAME_BUDGET_MS }

    pub fn enabled() -> bool { true }
}

impl Default for TissueModelConfig {
    fn default() -> Self {
        Self {
            total_block_depth: defaults::total_block_depth(),
            reference_fat_thickness: defaults::reference_fat_thickness(),
            depth_scale: defaults::depth_scale(),
        }
    }
}

impl Default for StimulationModelConfig {
    fn default() -> Self {
        Self {
            max_intensity_ma: defaults::max_intensity_ma(),
        }
    }
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            jitter_seed: defaults::jitter_seed(),
            parallel_lines: defaults::parallel_lines(),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            cache_capacity: defaults::cache_capacity(),
            frame_budget_ms: defaults::frame_budget_ms(),
        }
    }
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            metal_implant: defaults::enabled(),
            inclusions: defaults::enabled(),
            risk_simulation: defaults::enabled(),
        }
    }
}

impl EngineConfig {
    /// Validate configuration consistency
    pub fn validate_consistency(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let positive = [
            ("tissue.total_block_depth", self.tissue.total_block_depth),
            ("tissue.reference_fat_thickness", self.tissue.reference_fat_thickness),
            ("tissue.depth_scale", self.tissue.depth_scale),
            ("stimulation.max_intensity_ma", self.stimulation.max_intensity_ma),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                errors.push(format!("{} must be a positive finite number, got {}", name, value));
            }
        }

        if self.engine.cache_capacity > engine::MAX_CACHE_CAPACITY {
            errors.push(format!(
                "engine.cache_capacity ({}) exceeds the maximum of {}",
                self.engine.cache_capacity,
                engine::MAX_CACHE_CAPACITY
            ));
        }

        if self.engine.frame_budget_ms == 0 {
            errors.push("engine.frame_budget_ms must be at least 1".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Whether repeated inputs are served from the memo cache
    pub fn is_memoized(&self) -> bool {
        self.engine.cache_capacity > 0
    }

    pub fn get_summary(&self) -> ConfigSummary {
        ConfigSummary {
            model_version: MODEL_VERSION,
            total_block_depth: self.tissue.total_block_depth,
            max_intensity_ma: self.stimulation.max_intensity_ma,
            cache_capacity: self.engine.cache_capacity,
            features: self.features.clone(),
        }
    }
}

/// Configuration summary for display/logging
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub model_version: u32,
    pub total_block_depth: f32,
    pub max_intensity_ma: f32,
    pub cache_capacity: usize,
    pub features: FeatureFlags,
}
