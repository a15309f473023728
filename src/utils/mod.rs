//! Shared input utilities
//!
//! - Clamping with a record of what was adjusted
//! - Strict validation and lenient structural warnings

pub mod bounds;
pub mod validation;

pub use bounds::{clamp_finite, clamp_unit, BoundsChecker, BoundsError, BoundsResult, FieldAdjustment};

pub use validation::{
    structural_warnings, SimulationWarning, TissueValidator, ValidationError, ValidationResult, Validator,
};
