//! Effective field penetration depth from intensity and tissue composition
//! Location: src/simulation/penetration.rs

use crate::config::constants::{penetration, stimulation, tissue};
use crate::model::{Inclusion, InclusionKind, TissueConfig};
use crate::utils::bounds::{clamp_finite, clamp_unit};

/// Closed-form penetration model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenetrationModel {
    max_intensity_ma: f32,
    reference_fat_thickness: f32,
}

impl Default for PenetrationModel {
    fn default() -> Self {
        Self::new(stimulation::MAX_INTENSITY_MA, tissue::REFERENCE_FAT_THICKNESS)
    }
}

impl PenetrationModel {
    pub fn new(max_intensity_ma: f32, reference_fat_thickness: f32) -> Self {
        Self {
            max_intensity_ma,
            reference_fat_thickness,
        }
    }

    /// Intensity as a fraction of the device maximum, in [0, 1]
    pub fn intensity_norm(&self, intensity_ma: f32) -> f32 {
        clamp_unit(intensity_ma / self.max_intensity_ma)
    }

    /// Penetration depth for a tissue snapshot, always in [0.2, 2.0]
    pub fn depth(&self, intensity_ma: f32, tissue: &TissueConfig) -> f32 {
        self.depth_for_norm(
            self.intensity_norm(intensity_ma),
            tissue.fat_thickness,
            &tissue.inclusions,
        )
    }

    pub fn depth_for_norm(&self, intensity_norm: f32, fat_thickness: f32, inclusions: &[Inclusion]) -> f32 {
        let base = clamp_unit(intensity_norm) * penetration::BASE_PENETRATION_FACTOR;
        let fat_resistance = fat_thickness / self.reference_fat_thickness;

        let mut depth = clamp_finite(
            base * (1.0 - fat_resistance * penetration::FAT_RESISTANCE_WEIGHT),
            penetration::BASE_DEPTH_MIN,
            penetration::BASE_DEPTH_MAX,
        );

        for inclusion in inclusions {
            depth *= inclusion_factor(inclusion);
        }

        clamp_finite(depth, penetration::FINAL_DEPTH_MIN, penetration::FINAL_DEPTH_MAX)
    }
}

/// Multiplicative depth adjustment contributed by one inclusion
fn inclusion_factor(inclusion: &Inclusion) -> f32 {
    let span = clamp_unit(inclusion.span);
    match inclusion.kind {
        InclusionKind::Bone => 1.0 - span * penetration::BONE_INCLUSION_DAMPING,
        InclusionKind::Fat => 1.0 - span * penetration::FAT_INCLUSION_DAMPING,
        InclusionKind::Muscle => 1.0 + span * penetration::MUSCLE_INCLUSION_BOOST,
        InclusionKind::MetalImplant => 1.0,
    }
}
