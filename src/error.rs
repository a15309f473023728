// src/error.rs
//! Unified error handling for the field engine
//!
//! Simulation itself never fails: inputs are clamped and anomalies become
//! warnings on the frame. What can fail is everything around it: loading
//! configuration, strict validation of authored tissue, and frame export.
//! Those errors are collected here under [`FieldError`] with an
//! [`ErrorContext`] recording where they happened.

use crate::config::ConfigError;
use crate::utils::validation::ValidationError;
use serde::Serialize;
use std::collections::HashMap;
use std::time::SystemTime;
use thiserror::Error;

/// Unified error type for the crate
#[derive(Debug, Error)]
pub enum FieldError {
    /// Configuration loading or consistency failure
    #[error("[CONFIG] {0}")]
    Config(#[from] ConfigError),

    /// Authored tissue rejected by the strict validator
    #[error("[VALIDATION] {source} ({})", .context.operation)]
    Validation {
        source: ValidationError,
        context: ErrorContext,
    },

    /// Frame could not be serialized
    #[error("[EXPORT] {source} ({})", .context.operation)]
    Export {
        source: serde_json::Error,
        context: ErrorContext,
    },
}

/// Where an error was raised
#[derive(Debug, Clone, Serialize)]
pub struct ErrorContext {
    pub timestamp: SystemTime,
    pub thread_id: Option<String>,
    pub component: String,
    pub operation: String,
    pub file: Option<&'static str>,
    pub line: Option<u32>,
    pub additional_info: HashMap<String, String>,
}

impl ErrorContext {
    pub fn new(component: &str, operation: &str) -> Self {
        Self {
            timestamp: SystemTime::now(),
            thread_id: std::thread::current().name().map(|s| s.to_string()),
            component: component.to_string(),
            operation: operation.to_string(),
            file: None,
            line: None,
            additional_info: HashMap::new(),
        }
    }

    /// Create error context with file and line information
    pub fn with_location(component: &str, operation: &str, file: &'static str, line: u32) -> Self {
        let mut context = Self::new(component, operation);
        context.file = Some(file);
        context.line = Some(line);
        context
    }

    pub fn add_info<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.additional_info.insert(key.into(), value.into());
        self
    }
}

/// Macro for creating error context with file and line info
#[macro_export]
macro_rules! error_context {
    ($component:expr, $operation:expr) => {
        $crate::error::ErrorContext::with_location($component, $operation, file!(), line!())
    };
}

/// Result type alias for fallible field operations
pub type FieldResult<T> = Result<T, FieldError>;

impl FieldError {
    /// Context of the error, when the variant carries one
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            FieldError::Validation { context, .. } | FieldError::Export { context, .. } => Some(context),
            FieldError::Config(_) => None,
        }
    }
}
