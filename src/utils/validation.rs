//! Validation of authored simulation inputs
//!
//! Two levels:
//! - [`TissueValidator`] is strict and reports every problem it finds, for
//!   configuration screens that must reject bad data before saving it.
//! - [`structural_warnings`] is lenient. The engine always produces a frame and
//!   attaches these as [`SimulationWarning`]s instead of failing.

use crate::config::constants::{stimulation, tissue};
use crate::config::EngineConfig;
use crate::model::{ElectrodePair, InclusionKind, StimulationParams, TissueConfig};
use crate::simulation::TissueStack;
use crate::utils::bounds::{non_finite_as_null, BoundsChecker, BoundsError, FieldAdjustment};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Validation result type
pub type ValidationResult<T> = Result<T, ValidationError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Value out of valid range
    OutOfRange {
        field: String,
        value: f32,
        min: f32,
        max: f32,
    },
    /// NaN or infinite value
    NonFinite(String),
    /// Required field missing
    RequiredFieldMissing(String),
    /// Two inclusions share an id
    DuplicateId(String),
    /// Cross-field validation failure
    ConstraintViolation {
        fields: Vec<String>,
        message: String,
    },
    /// More than one problem
    Multiple(Vec<ValidationError>),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::OutOfRange { field, value, min, max } => {
                write!(f, "Field '{}' value {} is out of range [{}, {}]", field, value, min, max)
            }
            ValidationError::NonFinite(field) => write!(f, "Field '{}' is not a finite number", field),
            ValidationError::RequiredFieldMissing(field) => {
                write!(f, "Required field '{}' is missing", field)
            }
            ValidationError::DuplicateId(id) => write!(f, "Inclusion id '{}' is used more than once", id),
            ValidationError::ConstraintViolation { fields, message } => {
                write!(f, "Constraint violation for fields [{}]: {}", fields.join(", "), message)
            }
            ValidationError::Multiple(errors) => {
                write!(f, "{} validation errors: ", errors.len())?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    /// Flatten into individual problems
    pub fn into_vec(self) -> Vec<ValidationError> {
        match self {
            ValidationError::Multiple(errors) => errors,
            single => vec![single],
        }
    }

    fn from_vec(mut errors: Vec<ValidationError>) -> ValidationResult<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ValidationError::Multiple(errors)),
        }
    }
}

impl From<BoundsError> for ValidationError {
    fn from(err: BoundsError) -> Self {
        match err {
            BoundsError::NumericOutOfBounds { field, value, min, max, .. } => {
                ValidationError::OutOfRange { field, value, min, max }
            }
            BoundsError::NonFinite { field, .. } => ValidationError::NonFinite(field),
        }
    }
}

/// Generic trait for validating objects
pub trait Validator<T> {
    fn validate(&self, value: &T) -> ValidationResult<()>;
}

/// Strict validator for authored tissue, stimulation and electrode data
#[derive(Debug, Clone, PartialEq)]
pub struct TissueValidator {
    total_block_depth: f32,
    max_intensity_ma: f32,
}

impl Default for TissueValidator {
    fn default() -> Self {
        Self::new(tissue::TOTAL_BLOCK_DEPTH, stimulation::MAX_INTENSITY_MA)
    }
}

impl TissueValidator {
    pub fn new(total_block_depth: f32, max_intensity_ma: f32) -> Self {
        Self {
            total_block_depth,
            max_intensity_ma,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.tissue.total_block_depth, config.stimulation.max_intensity_ma)
    }

    fn check_range(bounds: &BoundsChecker, errors: &mut Vec<ValidationError>, field: &str, value: f32, min: f32, max: f32) {
        if let Err(err) = bounds.check_numeric_range(field, value, min, max) {
            errors.push(err.into());
        }
    }

    fn check_unit(bounds: &BoundsChecker, errors: &mut Vec<ValidationError>, field: &str, value: f32) {
        Self::check_range(bounds, errors, field, value, tissue::UNIT_MIN, tissue::UNIT_MAX);
    }

    fn tissue_errors(&self, config: &TissueConfig) -> Vec<ValidationError> {
        let bounds = BoundsChecker::new("tissue");
        let mut errors = Vec::new();

        let layers = [
            ("skin_thickness", config.skin_thickness),
            ("fat_thickness", config.fat_thickness),
            ("muscle_thickness", config.muscle_thickness),
            ("bone_depth", config.bone_depth),
        ];
        for (field, value) in layers {
            Self::check_range(&bounds, &mut errors, field, value, 0.0, self.total_block_depth);
        }

        let soft = config.skin_thickness + config.fat_thickness + config.muscle_thickness;
        if soft.is_finite() && soft > self.total_block_depth {
            errors.push(ValidationError::ConstraintViolation {
                fields: vec![
                    "skin_thickness".to_string(),
                    "fat_thickness".to_string(),
                    "muscle_thickness".to_string(),
                ],
                message: format!(
                    "soft tissue depth {} exceeds the block depth {}",
                    soft, self.total_block_depth
                ),
            });
        }

        if let Some(implant) = config.metal_implant {
            Self::check_unit(&bounds, &mut errors, "metal_implant.depth", implant.depth);
            Self::check_unit(&bounds, &mut errors, "metal_implant.span", implant.span);
        }

        let mut seen = HashSet::new();
        for (i, inclusion) in config.inclusions.iter().enumerate() {
            if inclusion.id.trim().is_empty() {
                errors.push(ValidationError::RequiredFieldMissing(format!("inclusions[{}].id", i)));
            } else if !seen.insert(inclusion.id.as_str()) {
                errors.push(ValidationError::DuplicateId(inclusion.id.clone()));
            }

            let prefix = format!("inclusions[{}]", i);
            Self::check_unit(&bounds, &mut errors, &format!("{}.position", prefix), inclusion.position);
            Self::check_unit(&bounds, &mut errors, &format!("{}.depth", prefix), inclusion.depth);
            Self::check_unit(&bounds, &mut errors, &format!("{}.span", prefix), inclusion.span);
        }

        errors
    }

    fn stimulation_errors(&self, params: &StimulationParams) -> Vec<ValidationError> {
        let bounds = BoundsChecker::new("stimulation");
        let mut errors = Vec::new();

        for (field, value) in [("frequency_hz", params.frequency_hz), ("pulse_width_us", params.pulse_width_us)] {
            if !value.is_finite() {
                errors.push(ValidationError::NonFinite(field.to_string()));
            } else if value <= 0.0 {
                errors.push(ValidationError::ConstraintViolation {
                    fields: vec![field.to_string()],
                    message: "must be greater than zero".to_string(),
                });
            }
        }

        Self::check_range(&bounds, &mut errors, "intensity_ma", params.intensity_ma, 0.0, self.max_intensity_ma);
        errors
    }

    fn electrode_errors(electrodes: &ElectrodePair) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for (name, point) in [("proximal", electrodes.proximal), ("distal", electrodes.distal)] {
            if !point.to_array().iter().all(|c| c.is_finite()) {
                errors.push(ValidationError::NonFinite(format!("electrodes.{}", name)));
            }
        }

        if errors.is_empty() && electrodes.separation() <= f32::EPSILON {
            errors.push(ValidationError::ConstraintViolation {
                fields: vec!["electrodes.proximal".to_string(), "electrodes.distal".to_string()],
                message: "electrodes must not coincide".to_string(),
            });
        }

        errors
    }

    /// Validate a full input set, reporting every problem at once
    pub fn validate_all(
        &self,
        tissue: &TissueConfig,
        params: &StimulationParams,
        electrodes: &ElectrodePair,
    ) -> ValidationResult<()> {
        let mut errors = self.tissue_errors(tissue);
        errors.extend(self.stimulation_errors(params));
        errors.extend(Self::electrode_errors(electrodes));
        ValidationError::from_vec(errors)
    }
}

impl Validator<TissueConfig> for TissueValidator {
    fn validate(&self, value: &TissueConfig) -> ValidationResult<()> {
        ValidationError::from_vec(self.tissue_errors(value))
    }
}

impl Validator<StimulationParams> for TissueValidator {
    fn validate(&self, value: &StimulationParams) -> ValidationResult<()> {
        ValidationError::from_vec(self.stimulation_errors(value))
    }
}

impl Validator<ElectrodePair> for TissueValidator {
    fn validate(&self, value: &ElectrodePair) -> ValidationResult<()> {
        ValidationError::from_vec(Self::electrode_errors(value))
    }
}

/// Non-fatal anomaly attached to a simulation frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SimulationWarning {
    /// Soft tissue is deeper than the block; bone thickness was floored at zero
    StackOverflow {
        #[serde(with = "non_finite_as_null")]
        soft_tissue_depth: f32,
        block_depth: f32,
    },
    /// An input value was clamped into range
    FieldClamped(FieldAdjustment),
    DuplicateInclusionId { id: String },
    /// A metal inclusion on tissue that declares no implant
    ImplantInclusionWithoutFlag { id: String },
    /// Electrodes coincide so the field has no axis
    DegenerateElectrodes,
    /// A feature flag switched off a stage the input relies on
    FeatureDisabled { feature: String },
}

impl fmt::Display for SimulationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationWarning::StackOverflow { soft_tissue_depth, block_depth } => write!(
                f,
                "soft tissue depth {} exceeds block depth {}",
                soft_tissue_depth, block_depth
            ),
            SimulationWarning::FieldClamped(adjustment) => write!(f, "{}", adjustment),
            SimulationWarning::DuplicateInclusionId { id } => write!(f, "duplicate inclusion id '{}'", id),
            SimulationWarning::ImplantInclusionWithoutFlag { id } => {
                write!(f, "inclusion '{}' is metal but the tissue declares no implant", id)
            }
            SimulationWarning::DegenerateElectrodes => write!(f, "electrodes coincide"),
            SimulationWarning::FeatureDisabled { feature } => write!(f, "{} disabled by configuration", feature),
        }
    }
}

/// Anomalies in the shape of the input that do not stop simulation
pub fn structural_warnings(
    config: &TissueConfig,
    electrodes: &ElectrodePair,
    stack: &TissueStack,
) -> Vec<SimulationWarning> {
    let mut warnings = Vec::new();

    if stack.stack_overflow {
        warnings.push(SimulationWarning::StackOverflow {
            soft_tissue_depth: stack.bone_start,
            block_depth: stack.total_block_depth,
        });
    }

    let mut seen = HashSet::new();
    for inclusion in &config.inclusions {
        if !seen.insert(inclusion.id.as_str()) {
            warnings.push(SimulationWarning::DuplicateInclusionId { id: inclusion.id.clone() });
        }
        if inclusion.kind == InclusionKind::MetalImplant && !config.has_metal_implant() {
            warnings.push(SimulationWarning::ImplantInclusionWithoutFlag { id: inclusion.id.clone() });
        }
    }

    if electrodes.separation() <= f32::EPSILON {
        warnings.push(SimulationWarning::DegenerateElectrodes);
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Inclusion, Point3};

    #[test]
    fn test_default_inputs_pass() {
        let validator = TissueValidator::default();
        assert!(validator
            .validate_all(&TissueConfig::default(), &StimulationParams::default(), &ElectrodePair::default())
            .is_ok());
    }

    #[test]
    fn test_reports_every_problem() {
        let validator = TissueValidator::default();
        let tissue = TissueConfig {
            skin_thickness: -0.1,
            fat_thickness: f32::NAN,
            ..TissueConfig::default()
        }
        .with_metal_implant(1.5, 0.5)
        .with_inclusion(Inclusion::new("a", InclusionKind::Bone, 0.5, 0.5, 0.5))
        .with_inclusion(Inclusion::new("a", InclusionKind::Fat, 0.5, 0.5, 0.5));

        let errors = validator.validate(&tissue).unwrap_err().into_vec();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::NonFinite("fat_thickness".to_string())));
        assert!(errors.contains(&ValidationError::DuplicateId("a".to_string())));
    }

    #[test]
    fn test_soft_tissue_constraint() {
        let validator = TissueValidator::new(3.0, 80.0);
        let tissue = TissueConfig {
            skin_thickness: 1.0,
            fat_thickness: 1.5,
            muscle_thickness: 1.0,
            ..TissueConfig::default()
        };
        assert!(matches!(
            validator.validate(&tissue),
            Err(ValidationError::ConstraintViolation { .. })
        ));
    }

    #[test]
    fn test_stimulation_limits() {
        let validator = TissueValidator::default();
        let params = StimulationParams {
            frequency_hz: 0.0,
            intensity_ma: 120.0,
            ..StimulationParams::default()
        };
        let errors = validator.validate(&params).unwrap_err().into_vec();
        assert_eq!(errors.len(), 2);
        assert!(errors.contains(&ValidationError::OutOfRange {
            field: "intensity_ma".to_string(),
            value: 120.0,
            min: 0.0,
            max: 80.0,
        }));
    }

    #[test]
    fn test_bounds_errors_convert() {
        let bounds = BoundsChecker::new("tissue");
        let err: ValidationError = bounds.check_numeric_range("skin_thickness", 4.0, 0.0, 3.0).unwrap_err().into();
        assert_eq!(
            err,
            ValidationError::OutOfRange {
                field: "skin_thickness".to_string(),
                value: 4.0,
                min: 0.0,
                max: 3.0,
            }
        );

        let err: ValidationError = bounds.check_numeric_range("bone_depth", f32::INFINITY, 0.0, 3.0).unwrap_err().into();
        assert_eq!(err, ValidationError::NonFinite("bone_depth".to_string()));
    }

    #[test]
    fn test_coincident_electrodes_rejected() {
        let validator = TissueValidator::default();
        let electrodes = ElectrodePair::new(Point3::ORIGIN, Point3::ORIGIN);
        assert!(validator.validate(&electrodes).is_err());
    }

    #[test]
    fn test_structural_warnings() {
        let tissue = TissueConfig {
            skin_thickness: 1.5,
            fat_thickness: 1.0,
            muscle_thickness: 1.0,
            ..TissueConfig::default()
        }
        .with_inclusion(Inclusion::new("plate", InclusionKind::MetalImplant, 0.5, 0.4, 0.3))
        .with_inclusion(Inclusion::new("plate", InclusionKind::Bone, 0.5, 0.4, 0.3));
        let stack = TissueStack::from_config(&tissue, 3.0);
        let electrodes = ElectrodePair::new(Point3::ORIGIN, Point3::ORIGIN);

        let warnings = structural_warnings(&tissue, &electrodes, &stack);
        assert!(matches!(warnings[0], SimulationWarning::StackOverflow { .. }));
        assert!(warnings.contains(&SimulationWarning::ImplantInclusionWithoutFlag { id: "plate".into() }));
        assert!(warnings.contains(&SimulationWarning::DuplicateInclusionId { id: "plate".into() }));
        assert!(warnings.contains(&SimulationWarning::DegenerateElectrodes));
    }

    #[test]
    fn test_warning_json_shape() {
        let json = serde_json::to_string(&SimulationWarning::DegenerateElectrodes).unwrap();
        assert_eq!(json, r#"{"kind":"degenerate_electrodes"}"#);
    }
}
