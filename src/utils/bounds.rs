//! Bounds handling for simulation inputs
//!
//! Interactive sessions must never crash mid-adjustment, so the simulation path
//! clamps instead of failing. [`BoundsChecker`] clamps a value and records every
//! adjustment it made. [`BoundsChecker::check_numeric_range`] reports the
//! violation instead; `TissueValidator` builds its range errors from it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bounds checking error types
#[derive(Debug, Clone, PartialEq)]
pub enum BoundsError {
    /// Numeric value outside its declared range
    NumericOutOfBounds {
        field: String,
        value: f32,
        min: f32,
        max: f32,
        context: String,
    },
    /// Value is NaN or infinite
    NonFinite {
        field: String,
        context: String,
    },
}

impl fmt::Display for BoundsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundsError::NumericOutOfBounds { value, min, max, context, .. } => {
                write!(f, "Numeric value {} out of bounds [{}, {}] in {}", value, min, max, context)
            }
            BoundsError::NonFinite { field, context } => {
                write!(f, "Field '{}' is not a finite number in {}", field, context)
            }
        }
    }
}

impl std::error::Error for BoundsError {}

/// Result type for bounds checking operations
pub type BoundsResult<T> = Result<T, BoundsError>;

/// Serde adapter for `f32` fields that may hold NaN or infinity
///
/// JSON cannot encode them, so they are written as `null` and read back as NaN.
pub mod non_finite_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f32(*value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
        Ok(Option::<f32>::deserialize(deserializer)?.unwrap_or(f32::NAN))
    }
}

/// One clamping adjustment applied to an input field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldAdjustment {
    pub field: String,
    /// Raw input, possibly NaN or infinite
    #[serde(with = "non_finite_as_null")]
    pub original: f32,
    pub clamped: f32,
}

impl fmt::Display for FieldAdjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} clamped from {} to {}", self.field, self.original, self.clamped)
    }
}

/// Clamping bounds checker that remembers what it changed
#[derive(Debug, Clone)]
pub struct BoundsChecker {
    context: String,
    adjustments: Vec<FieldAdjustment>,
}

impl BoundsChecker {
    /// Create new bounds checker
    pub fn new(context: &str) -> Self {
        Self {
            context: context.to_string(),
            adjustments: Vec::new(),
        }
    }

    /// Clamp `value` into `[min, max]`, recording the adjustment if any
    pub fn clamp(&mut self, field: &str, value: f32, min: f32, max: f32) -> f32 {
        let clamped = clamp_finite(value, min, max);
        // NaN != NaN, so non-finite inputs are always recorded
        if clamped != value {
            self.adjustments.push(FieldAdjustment {
                field: field.to_string(),
                original: value,
                clamped,
            });
        }
        clamped
    }

    /// Clamp into the unit interval
    pub fn clamp_unit(&mut self, field: &str, value: f32) -> f32 {
        self.clamp(field, value, 0.0, 1.0)
    }

    /// Clamp to zero or above
    pub fn clamp_non_negative(&mut self, field: &str, value: f32) -> f32 {
        self.clamp(field, value, 0.0, f32::MAX)
    }

    /// Check numeric range without clamping
    pub fn check_numeric_range(&self, field: &str, value: f32, min: f32, max: f32) -> BoundsResult<()> {
        if !value.is_finite() {
            return Err(BoundsError::NonFinite {
                field: field.to_string(),
                context: self.context.clone(),
            });
        }
        if value < min || value > max {
            return Err(BoundsError::NumericOutOfBounds {
                field: field.to_string(),
                value,
                min,
                max,
                context: format!("{}.{}", self.context, field),
            });
        }
        Ok(())
    }

    /// Adjustments recorded so far
    pub fn adjustments(&self) -> &[FieldAdjustment] {
        &self.adjustments
    }

    /// Consume the checker and return its adjustments
    pub fn into_adjustments(self) -> Vec<FieldAdjustment> {
        self.adjustments
    }
}

/// Clamp that maps NaN to `min` instead of propagating it
#[inline]
pub fn clamp_finite(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

/// Clamp into `[0, 1]`
#[inline]
pub fn clamp_unit(value: f32) -> f32 {
    clamp_finite(value, 0.0, 1.0)
}
