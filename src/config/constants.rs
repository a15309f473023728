// src/config/constants.rs
//! Model-wide constants
//!
//! Every coefficient of the closed-form field and risk model lives here so the
//! simulation modules carry no magic numbers.

/// Model revision, bumped whenever a coefficient below changes
pub const MODEL_VERSION: u32 = 3;

/// Tissue block and stack constants
pub mod tissue {
    /// Fixed depth of the simulated tissue block, in normalized units
    pub const TOTAL_BLOCK_DEPTH: f32 = 3.0;
    /// Fat thickness at which fat resistance reaches 1.0
    pub const REFERENCE_FAT_THICKNESS: f32 = 2.0;
    /// Scene units per normalized depth unit
    pub const DEPTH_SCALE: f32 = 1.0;

    pub const DEFAULT_SKIN_THICKNESS: f32 = 0.3;
    pub const DEFAULT_FAT_THICKNESS: f32 = 0.5;
    pub const DEFAULT_MUSCLE_THICKNESS: f32 = 1.2;
    pub const DEFAULT_BONE_DEPTH: f32 = 2.0;

    // Normalized inclusion/implant fields
    pub const UNIT_MIN: f32 = 0.0;
    pub const UNIT_MAX: f32 = 1.0;
}

/// Stimulation parameter constants
pub mod stimulation {
    /// Intensity mapped to intensityNorm = 1.0
    pub const MAX_INTENSITY_MA: f32 = 80.0;

    pub const DEFAULT_FREQUENCY_HZ: f32 = 100.0;
    pub const DEFAULT_PULSE_WIDTH_US: f32 = 200.0;
    pub const DEFAULT_INTENSITY_MA: f32 = 20.0;

    // Pulse width normalization window
    pub const PULSE_WIDTH_FLOOR_US: f32 = 50.0;
    pub const PULSE_WIDTH_CEILING_US: f32 = 400.0;
}

/// Penetration model coefficients
pub mod penetration {
    pub const BASE_PENETRATION_FACTOR: f32 = 0.8;
    pub const FAT_RESISTANCE_WEIGHT: f32 = 0.3;

    pub const BASE_DEPTH_MIN: f32 = 0.3;
    pub const BASE_DEPTH_MAX: f32 = 1.5;
    pub const FINAL_DEPTH_MIN: f32 = 0.2;
    pub const FINAL_DEPTH_MAX: f32 = 2.0;

    pub const BONE_INCLUSION_DAMPING: f32 = 0.3;
    pub const FAT_INCLUSION_DAMPING: f32 = 0.2;
    pub const MUSCLE_INCLUSION_BOOST: f32 = 0.15;
}

/// Field line geometry constants
pub mod field {
    pub const BASE_LINE_COUNT: f32 = 8.0;
    pub const LINE_COUNT_PER_INTENSITY: f32 = 12.0;
    pub const MAX_LINE_COUNT: usize = 20;

    /// Curve sampling step; 21 samples over t in [0, 1]
    pub const SAMPLE_STEP: f32 = 0.05;
    pub const SAMPLES_PER_LINE: usize = 21;

    pub const ARC_HEIGHT_BASE: f32 = 0.8;
    pub const ARC_JITTER_RANGE: f32 = 0.4;
    pub const LATERAL_OFFSET_MIN: f32 = -2.0;
    pub const LATERAL_OFFSET_MAX: f32 = 2.0;

    pub const IMPLANT_RADIUS_FACTOR: f32 = 2.0;
    pub const IMPLANT_ATTRACTION: f32 = 0.4;

    pub const INCLUSION_RADIUS_FACTOR: f32 = 1.5;
    pub const BONE_DEFLECTION: f32 = 0.3;
    pub const MUSCLE_ATTRACTION: f32 = 0.2;
    pub const FAT_DEFLECTION: f32 = 0.15;

    pub const DEFAULT_JITTER_SEED: u64 = 0x7E45_F1E1D;
}

/// Waveform envelope constants
pub mod waveform {
    /// Frequency mapped to an animation speed of 1.0
    pub const SPEED_REFERENCE_HZ: f32 = 50.0;

    pub const CONVENCIONAL_BASE: f32 = 0.3;
    pub const CONVENCIONAL_SWING: f32 = 0.3;
    pub const CONVENCIONAL_LINE_PHASE: f32 = 0.1;

    pub const ACUPUNTURA_RATE: f32 = 2.0;
    pub const ACUPUNTURA_PULSE_WIDTH: f32 = 0.1;
    pub const ACUPUNTURA_ON: f32 = 0.8;
    pub const ACUPUNTURA_OFF: f32 = 0.1;

    pub const BURST_DUTY: f32 = 0.3;
    pub const BURST_PULSE_RATE: f32 = 5.0;
    pub const BURST_BASE: f32 = 0.3;
    pub const BURST_SWING: f32 = 0.4;
    pub const BURST_REST: f32 = 0.1;

    pub const MODULADO_ENVELOPE_RATE: f32 = 0.5;
    pub const MODULADO_CARRIER_RATE: f32 = 3.0;
    pub const MODULADO_LINE_PHASE: f32 = 0.2;
    pub const MODULADO_FLOOR: f32 = 0.2;
    pub const MODULADO_DEPTH: f32 = 0.6;

    pub const OPACITY_MIN: f32 = 0.0;
    pub const OPACITY_MAX: f32 = 1.0;
}

/// Lesion index weights and thresholds
pub mod lesion {
    pub const RISK_ALTO_WEIGHT: f32 = 0.7;
    pub const RISK_MODERADO_WEIGHT: f32 = 0.4;
    pub const RISK_BAIXO_WEIGHT: f32 = 0.0;

    pub const INTENSITY_WEIGHT: f32 = 0.3;
    pub const PULSE_WEIGHT: f32 = 0.3;

    pub const IMPLANT_WEIGHT: f32 = 0.4;
    pub const IMPLANT_INTENSITY_THRESHOLD: f32 = 0.5;

    pub const SUPERFICIAL_BONE_WEIGHT: f32 = 0.3;
    pub const SUPERFICIAL_BONE_DEPTH: f32 = 0.4;
    pub const SUPERFICIAL_BONE_INTENSITY_THRESHOLD: f32 = 0.6;

    pub const THIN_SKIN_WEIGHT: f32 = 0.25;
    pub const THIN_SKIN_THICKNESS: f32 = 0.2;
    pub const THIN_SKIN_INTENSITY_THRESHOLD: f32 = 0.5;

    // Severity band edges
    pub const SEVERITY_LOW: f32 = 0.25;
    pub const SEVERITY_ELEVATED: f32 = 0.5;
    pub const SEVERITY_SEVERE: f32 = 0.75;

    pub const RISK_SCORE_MAX: f32 = 100.0;
}

/// Engine constants
pub mod engine {
    pub const DEFAULT_CACHE_CAPACITY: usize = 16;
    pub const MAX_CACHE_CAPACITY: usize = 1024;
    /// One interactive frame at 60 Hz
    pub const DEFAULT_FRAME_BUDGET_MS: u32 = 16;
}

/// Configuration file locations
pub mod paths {
    pub const SYSTEM_CONFIG_PATH: &str = "/etc/tens-lab/field.toml";
    pub const USER_CONFIG_DIR: &str = ".tens-lab";
    pub const DEFAULT_CONFIG_FILE: &str = "tens-field.toml";
    pub const LOCAL_CONFIG_FILE: &str = "tens-field.local.toml";
    pub const ENV_PREFIX: &str = "TENS_";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_grid_is_consistent() {
        let last = (field::SAMPLES_PER_LINE - 1) as f32 * field::SAMPLE_STEP;
        assert!((last - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_line_count_bounds() {
        let max = (field::BASE_LINE_COUNT + field::LINE_COUNT_PER_INTENSITY) as usize;
        assert_eq!(max, field::MAX_LINE_COUNT);
    }

    #[test]
    fn test_depth_clamps_are_ordered() {
        assert!(penetration::FINAL_DEPTH_MIN < penetration::BASE_DEPTH_MIN);
        assert!(penetration::BASE_DEPTH_MAX < penetration::FINAL_DEPTH_MAX);
    }

    #[test]
    fn test_severity_bands_ordered() {
        assert!(lesion::SEVERITY_LOW < lesion::SEVERITY_ELEVATED);
        assert!(lesion::SEVERITY_ELEVATED < lesion::SEVERITY_SEVERE);
    }
}
