//! TENS-Field-Core: tissue-field simulation and lesion risk scoring
//!
//! Closed-form model behind the electrotherapy lab. Given a layered tissue
//! description (skin, fat, muscle, bone, inclusions, optional metal implant)
//! and stimulator settings, it produces:
//!
//! - the cumulative tissue stack and effective penetration depth
//! - distorted field-line geometry between the electrodes
//! - a per-line opacity envelope for the stimulation mode
//! - a bounded lesion index with its contributing terms
//!
//! This is a fast approximation for teaching, not an electromagnetic solver.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tens_field_core::engine::SimulationEngine;
//! use tens_field_core::model::{ElectrodePair, RiskResult, StimulationParams, TissueConfig};
//!
//! let engine = SimulationEngine::with_defaults();
//! let frame = engine.compute(
//!     &TissueConfig::default().with_metal_implant(0.4, 0.5),
//!     &StimulationParams::default(),
//!     &ElectrodePair::default(),
//!     &RiskResult::default(),
//! );
//!
//! for (i, line) in frame.geometry.lines.iter().enumerate() {
//!     println!("line {} opacity {:.2} ({} points)", i, frame.opacity(i, 0.5), line.len());
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod simulation;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::{ConfigLoader, EngineConfig};
pub use engine::{SimulationEngine, SimulationFrame};
pub use error::{FieldError, FieldResult};
pub use model::{
    ElectrodePair, FieldLine, Inclusion, InclusionKind, LesionIndex, Point3, RiskLevel, RiskResult,
    StimulationMode, StimulationParams, TissueConfig,
};
pub use utils::validation::{SimulationWarning, ValidationError, ValidationResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        model_version: config::MODEL_VERSION,
        description: "Tissue-field simulation and lesion risk scoring for TENS".to_string(),
        features: vec![
            "Layered tissue stack with inclusions".to_string(),
            "Implant and inclusion field distortion".to_string(),
            "Mode-dependent waveform envelopes".to_string(),
            "Bounded lesion index".to_string(),
        ],
    }
}

/// Library version information
#[derive(Debug, Clone)]
pub struct VersionInfo {
    /// Library name
    pub name: String,
    /// Version string
    pub version: String,
    /// Revision of the numeric model
    pub model_version: u32,
    /// Description
    pub description: String,
    /// List of features
    pub features: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info() {
        let info = version_info();
        assert_eq!(info.name, NAME);
        assert_eq!(info.version, VERSION);
        assert_eq!(info.model_version, config::MODEL_VERSION);
        assert!(!info.features.is_empty());
    }

    #[test]
    fn test_constants() {
        assert!(!VERSION.is_empty());
        assert!(!NAME.is_empty());
    }
}
