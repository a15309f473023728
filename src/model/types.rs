// src/model/types.rs
//! Input snapshots and output values of the tissue-field model

use crate::config::constants::{lesion, stimulation, tissue};
use crate::utils::bounds::{BoundsChecker, FieldAdjustment};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// Point in scene space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub const ORIGIN: Point3 = Point3 { x: 0.0, y: 0.0, z: 0.0 };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Linear interpolation towards `other`
    #[inline]
    pub fn lerp(self, other: Point3, t: f32) -> Point3 {
        self + (other - self) * t
    }

    #[inline]
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    #[inline]
    pub fn distance(self, other: Point3) -> f32 {
        (self - other).length()
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

impl Add for Point3 {
    type Output = Point3;

    fn add(self, rhs: Point3) -> Point3 {
        Point3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point3 {
    type Output = Point3;

    fn sub(self, rhs: Point3) -> Point3 {
        Point3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Point3 {
    type Output = Point3;

    fn mul(self, rhs: f32) -> Point3 {
        Point3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Anatomical feature kind of an inclusion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InclusionKind {
    Bone,
    Muscle,
    Fat,
    MetalImplant,
}

/// Localized feature embedded in the tissue stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inclusion {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: InclusionKind,
    /// Lateral position, 0 = proximal electrode side
    pub position: f32,
    /// Normalized depth into the stack
    pub depth: f32,
    /// Relative size and influence radius factor
    pub span: f32,
}

impl Inclusion {
    pub fn new(id: impl Into<String>, kind: InclusionKind, position: f32, depth: f32, span: f32) -> Self {
        Self {
            id: id.into(),
            kind,
            position,
            depth,
            span,
        }
    }
}

/// Metal implant placement, normalized
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetalImplant {
    pub depth: f32,
    pub span: f32,
}

/// Layered tissue description edited by the admin layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TissueConfig {
    pub skin_thickness: f32,
    pub fat_thickness: f32,
    pub muscle_thickness: f32,
    pub bone_depth: f32,
    /// Present iff the tissue carries a metal implant
    #[serde(default)]
    pub metal_implant: Option<MetalImplant>,
    #[serde(default)]
    pub inclusions: Vec<Inclusion>,
    #[serde(default)]
    pub enable_risk_simulation: bool,
}

impl Default for TissueConfig {
    fn default() -> Self {
        Self {
            skin_thickness: tissue::DEFAULT_SKIN_THICKNESS,
            fat_thickness: tissue::DEFAULT_FAT_THICKNESS,
            muscle_thickness: tissue::DEFAULT_MUSCLE_THICKNESS,
            bone_depth: tissue::DEFAULT_BONE_DEPTH,
            metal_implant: None,
            inclusions: Vec::new(),
            enable_risk_simulation: true,
        }
    }
}

impl TissueConfig {
    pub fn has_metal_implant(&self) -> bool {
        self.metal_implant.is_some()
    }

    pub fn with_metal_implant(mut self, depth: f32, span: f32) -> Self {
        self.metal_implant = Some(MetalImplant { depth, span });
        self
    }

    pub fn with_inclusion(mut self, inclusion: Inclusion) -> Self {
        self.inclusions.push(inclusion);
        self
    }

    /// Copy with every field clamped into its declared range
    pub fn sanitized(&self) -> (TissueConfig, Vec<FieldAdjustment>) {
        let mut checker = BoundsChecker::new("tissue");

        let metal_implant = self.metal_implant.map(|implant| MetalImplant {
            depth: checker.clamp_unit("metal_implant.depth", implant.depth),
            span: checker.clamp_unit("metal_implant.span", implant.span),
        });

        let inclusions = self
            .inclusions
            .iter()
            .map(|inc| Inclusion {
                id: inc.id.clone(),
                kind: inc.kind,
                position: checker.clamp_unit(&format!("inclusions[{}].position", inc.id), inc.position),
                depth: checker.clamp_unit(&format!("inclusions[{}].depth", inc.id), inc.depth),
                span: checker.clamp_unit(&format!("inclusions[{}].span", inc.id), inc.span),
            })
            .collect();

        let sanitized = TissueConfig {
            skin_thickness: checker.clamp_non_negative("skin_thickness", self.skin_thickness),
            fat_thickness: checker.clamp_non_negative("fat_thickness", self.fat_thickness),
            muscle_thickness: checker.clamp_non_negative("muscle_thickness", self.muscle_thickness),
            bone_depth: checker.clamp_non_negative("bone_depth", self.bone_depth),
            metal_implant,
            inclusions,
            enable_risk_simulation: self.enable_risk_simulation,
        };

        (sanitized, checker.into_adjustments())
    }
}

/// Electrode contacts defining the stimulation axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElectrodePair {
    pub proximal: Point3,
    pub distal: Point3,
}

impl ElectrodePair {
    pub fn new(proximal: Point3, distal: Point3) -> Self {
        Self { proximal, distal }
    }

    pub fn midpoint(&self) -> Point3 {
        self.proximal.lerp(self.distal, 0.5)
    }

    /// Point at lateral fraction `t` along the axis
    pub fn along(&self, t: f32) -> Point3 {
        self.proximal.lerp(self.distal, t)
    }

    pub fn separation(&self) -> f32 {
        self.proximal.distance(self.distal)
    }
}

impl Default for ElectrodePair {
    fn default() -> Self {
        Self {
            proximal: Point3::new(-2.0, 0.0, 0.0),
            distal: Point3::new(2.0, 0.0, 0.0),
        }
    }
}

/// TENS stimulation program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StimulationMode {
    Convencional,
    Acupuntura,
    Burst,
    Modulado,
}

impl StimulationMode {
    pub const ALL: [StimulationMode; 4] = [
        StimulationMode::Convencional,
        StimulationMode::Acupuntura,
        StimulationMode::Burst,
        StimulationMode::Modulado,
    ];

    /// Slot in per-mode lookup tables
    pub const fn index(self) -> usize {
        match self {
            StimulationMode::Convencional => 0,
            StimulationMode::Acupuntura => 1,
            StimulationMode::Burst => 2,
            StimulationMode::Modulado => 3,
        }
    }
}

/// Stimulation parameters set on the virtual device
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StimulationParams {
    pub frequency_hz: f32,
    pub pulse_width_us: f32,
    pub intensity_ma: f32,
    pub mode: StimulationMode,
}

impl Default for StimulationParams {
    fn default() -> Self {
        Self {
            frequency_hz: stimulation::DEFAULT_FREQUENCY_HZ,
            pulse_width_us: stimulation::DEFAULT_PULSE_WIDTH_US,
            intensity_ma: stimulation::DEFAULT_INTENSITY_MA,
            mode: StimulationMode::Convencional,
        }
    }
}

impl StimulationParams {
    /// Copy with non-finite or negative values clamped to zero
    pub fn sanitized(&self) -> (StimulationParams, Vec<FieldAdjustment>) {
        let mut checker = BoundsChecker::new("stimulation");
        let sanitized = StimulationParams {
            frequency_hz: checker.clamp_non_negative("frequency_hz", self.frequency_hz),
            pulse_width_us: checker.clamp_non_negative("pulse_width_us", self.pulse_width_us),
            intensity_ma: checker.clamp_non_negative("intensity_ma", self.intensity_ma),
            mode: self.mode,
        };
        (sanitized, checker.into_adjustments())
    }
}

/// Risk class assigned by the external classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Baixo,
    Moderado,
    Alto,
}

/// Output of the external risk classifier, consumed read-only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskResult {
    pub risk_level: RiskLevel,
    pub risk_score: f32,
    #[serde(default)]
    pub messages: Vec<String>,
}

impl RiskResult {
    pub fn new(risk_level: RiskLevel, risk_score: f32) -> Self {
        Self {
            risk_level,
            risk_score,
            messages: Vec::new(),
        }
    }

    pub fn clamped_score(&self) -> f32 {
        crate::utils::bounds::clamp_finite(self.risk_score, 0.0, lesion::RISK_SCORE_MAX)
    }
}

impl Default for RiskResult {
    fn default() -> Self {
        Self::new(RiskLevel::Baixo, 0.0)
    }
}

/// Sampled field-line curve
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldLine {
    pub points: Vec<Point3>,
}

impl FieldLine {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<Point3> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<Point3> {
        self.points.last().copied()
    }

    /// Deepest (most negative) y reached by the curve
    pub fn deepest_y(&self) -> f32 {
        self.points.iter().map(|p| p.y).fold(0.0, f32::min)
    }
}

/// Lesion severity scalar in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LesionIndex(f32);

impl LesionIndex {
    pub const ZERO: LesionIndex = LesionIndex(0.0);

    /// Build from a raw score, clamping into [0, 1]
    pub fn from_raw(raw: f32) -> Self {
        LesionIndex(crate::utils::bounds::clamp_unit(raw))
    }

    pub fn value(self) -> f32 {
        self.0
    }
}

impl From<LesionIndex> for f32 {
    fn from(index: LesionIndex) -> f32 {
        index.0
    }
}
