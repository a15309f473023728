//! Lesion index: external risk class plus stimulation and tissue risk factors
//! Location: src/simulation/lesion.rs

use crate::config::constants::{lesion, stimulation};
use crate::model::{LesionIndex, RiskLevel, RiskResult, TissueConfig};
use crate::utils::bounds::clamp_unit;
use serde::{Deserialize, Serialize};

/// Qualitative band of a lesion index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LesionSeverity {
    Minimal,
    Low,
    Elevated,
    Severe,
}

impl LesionSeverity {
    pub fn from_index(index: LesionIndex) -> Self {
        let value = index.value();
        if value >= lesion::SEVERITY_SEVERE {
            LesionSeverity::Severe
        } else if value >= lesion::SEVERITY_ELEVATED {
            LesionSeverity::Elevated
        } else if value >= lesion::SEVERITY_LOW {
            LesionSeverity::Low
        } else {
            LesionSeverity::Minimal
        }
    }
}

/// Every term of the lesion sum, for display next to the score
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LesionBreakdown {
    pub risk_level: f32,
    pub intensity: f32,
    pub pulse_width: f32,
    pub metal_implant: f32,
    pub superficial_bone: f32,
    pub thin_skin: f32,
    /// Sum before clamping; may exceed 1
    pub raw_sum: f32,
    pub index: LesionIndex,
}

impl LesionBreakdown {
    pub fn severity(&self) -> LesionSeverity {
        LesionSeverity::from_index(self.index)
    }
}

/// Lesion index calculator
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LesionIndexCalculator;

impl LesionIndexCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Normalized pulse width over the 50..400 us window
    pub fn pulse_norm(pulse_width_us: f32) -> f32 {
        clamp_unit(
            (pulse_width_us - stimulation::PULSE_WIDTH_FLOOR_US)
                / (stimulation::PULSE_WIDTH_CEILING_US - stimulation::PULSE_WIDTH_FLOOR_US),
        )
    }

    pub fn risk_weight(level: RiskLevel) -> f32 {
        match level {
            RiskLevel::Alto => lesion::RISK_ALTO_WEIGHT,
            RiskLevel::Moderado => lesion::RISK_MODERADO_WEIGHT,
            RiskLevel::Baixo => lesion::RISK_BAIXO_WEIGHT,
        }
    }

    pub fn breakdown(
        &self,
        risk: &RiskResult,
        intensity_norm: f32,
        pulse_width_us: f32,
        tissue: &TissueConfig,
    ) -> LesionBreakdown {
        let intensity_norm = clamp_unit(intensity_norm);

        let risk_level = Self::risk_weight(risk.risk_level);
        let intensity = intensity_norm * lesion::INTENSITY_WEIGHT;
        let pulse_width = Self::pulse_norm(pulse_width_us) * lesion::PULSE_WEIGHT;

        let metal_implant = if tissue.has_metal_implant() && intensity_norm > lesion::IMPLANT_INTENSITY_THRESHOLD {
            lesion::IMPLANT_WEIGHT
        } else {
            0.0
        };

        let superficial_bone = if tissue.bone_depth < lesion::SUPERFICIAL_BONE_DEPTH
            && intensity_norm > lesion::SUPERFICIAL_BONE_INTENSITY_THRESHOLD
        {
            lesion::SUPERFICIAL_BONE_WEIGHT
        } else {
            0.0
        };

        let thin_skin = if tissue.skin_thickness < lesion::THIN_SKIN_THICKNESS
            && intensity_norm > lesion::THIN_SKIN_INTENSITY_THRESHOLD
        {
            lesion::THIN_SKIN_WEIGHT
        } else {
            0.0
        };

        let raw_sum = risk_level + intensity + pulse_width + metal_implant + superficial_bone + thin_skin;

        LesionBreakdown {
            risk_level,
            intensity,
            pulse_width,
            metal_implant,
            superficial_bone,
            thin_skin,
            raw_sum,
            index: LesionIndex::from_raw(raw_sum),
        }
    }

    pub fn index(&self, risk: &RiskResult, intensity_norm: f32, pulse_width_us: f32, tissue: &TissueConfig) -> LesionIndex {
        self.breakdown(risk, intensity_norm, pulse_width_us, tissue).index
    }
}
