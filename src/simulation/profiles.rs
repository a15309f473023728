//! Predefined anatomical regions for lab exercises
//! Location: src/simulation/profiles.rs

use crate::model::{ElectrodePair, Inclusion, InclusionKind, MetalImplant, Point3, StimulationMode, StimulationParams, TissueConfig};
use serde::{Deserialize, Serialize};

/// Body region a profile models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyRegion {
    Forearm,   // Thin fat, thick muscle
    Lumbar,    // Thick fat and muscle
    Knee,      // Superficial bone, post-surgical implant
    Hand,      // Thin skin, bone close to the surface
}

/// Ready-to-run tissue and electrode setup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnatomicalProfile {
    pub name: String,
    pub description: String,
    pub region: BodyRegion,
    pub tissue: TissueConfig,
    pub electrodes: ElectrodePair,
    pub suggested_params: StimulationParams,
}

impl AnatomicalProfile {
    pub fn forearm() -> Self {
        Self {
            name: "forearm".to_string(),
            description: "Flexor compartment with a muscle belly between the contacts".to_string(),
            region: BodyRegion::Forearm,
            tissue: TissueConfig {
                skin_thickness: 0.25,
                fat_thickness: 0.3,
                muscle_thickness: 1.6,
                bone_depth: 2.15,
                metal_implant: None,
                inclusions: vec![Inclusion::new("flexor-belly", InclusionKind::Muscle, 0.45, 0.35, 0.5)],
                enable_risk_simulation: true,
            },
            electrodes: ElectrodePair::new(Point3::new(-2.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)),
            suggested_params: StimulationParams {
                frequency_hz: 100.0,
                pulse_width_us: 150.0,
                intensity_ma: 20.0,
                mode: StimulationMode::Convencional,
            },
        }
    }

    pub fn lumbar() -> Self {
        Self {
            name: "lumbar".to_string(),
            description: "Paravertebral region with a subcutaneous fat pocket".to_string(),
            region: BodyRegion::Lumbar,
            tissue: TissueConfig {
                skin_thickness: 0.35,
                fat_thickness: 1.0,
                muscle_thickness: 1.3,
                bone_depth: 2.65,
                metal_implant: None,
                inclusions: vec![Inclusion::new("fat-pocket", InclusionKind::Fat, 0.3, 0.25, 0.6)],
                enable_risk_simulation: true,
            },
            electrodes: ElectrodePair::new(Point3::new(-2.5, 0.0, 0.0), Point3::new(2.5, 0.0, 0.0)),
            suggested_params: StimulationParams {
                frequency_hz: 4.0,
                pulse_width_us: 250.0,
                intensity_ma: 35.0,
                mode: StimulationMode::Acupuntura,
            },
        }
    }

    pub fn knee_with_implant() -> Self {
        Self {
            name: "knee_with_implant".to_string(),
            description: "Patellar region after arthroplasty; metal under the electrode axis".to_string(),
            region: BodyRegion::Knee,
            tissue: TissueConfig {
                skin_thickness: 0.2,
                fat_thickness: 0.25,
                muscle_thickness: 0.5,
                bone_depth: 0.95,
                metal_implant: Some(MetalImplant { depth: 0.45, span: 0.6 }),
                inclusions: vec![Inclusion::new("patella", InclusionKind::Bone, 0.5, 0.15, 0.4)],
                enable_risk_simulation: true,
            },
            electrodes: ElectrodePair::new(Point3::new(-1.5, 0.0, 0.0), Point3::new(1.5, 0.0, 0.0)),
            suggested_params: StimulationParams {
                frequency_hz: 80.0,
                pulse_width_us: 100.0,
                intensity_ma: 15.0,
                mode: StimulationMode::Burst,
            },
        }
    }

    pub fn hand() -> Self {
        Self {
            name: "hand".to_string(),
            description: "Dorsum of the hand; thin skin over metacarpals".to_string(),
            region: BodyRegion::Hand,
            tissue: TissueConfig {
                skin_thickness: 0.15,
                fat_thickness: 0.1,
                muscle_thickness: 0.1,
                bone_depth: 0.35,
                metal_implant: None,
                inclusions: vec![Inclusion::new("metacarpal", InclusionKind::Bone, 0.5, 0.12, 0.3)],
                enable_risk_simulation: true,
            },
            electrodes: ElectrodePair::new(Point3::new(-1.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)),
            suggested_params: StimulationParams {
                frequency_hz: 60.0,
                pulse_width_us: 80.0,
                intensity_ma: 10.0,
                mode: StimulationMode::Modulado,
            },
        }
    }

    pub fn for_region(region: BodyRegion) -> Self {
        match region {
            BodyRegion::Forearm => Self::forearm(),
            BodyRegion::Lumbar => Self::lumbar(),
            BodyRegion::Knee => Self::knee_with_implant(),
            BodyRegion::Hand => Self::hand(),
        }
    }

    pub fn all() -> Vec<Self> {
        vec![Self::forearm(), Self::lumbar(), Self::knee_with_implant(), Self::hand()]
    }

    /// Look a profile up by its name
    pub fn by_name(name: &str) -> Option<Self> {
        Self::all().into_iter().find(|p| p.name == name)
    }
}
