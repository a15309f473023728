//! Closed-form tissue-field model
//! Location: src/simulation/mod.rs

pub mod tissue_stack;
pub mod penetration;
pub mod field_geometry;
pub mod waveform;
pub mod lesion;
pub mod jitter;
pub mod profiles;

pub use tissue_stack::{TissueLayer, TissueStack};
pub use penetration::PenetrationModel;
pub use field_geometry::{FieldGeometry, FieldGeometryGenerator, FieldInputs};
pub use waveform::WaveformEnvelope;
pub use lesion::{LesionBreakdown, LesionIndexCalculator, LesionSeverity};
pub use jitter::{FixedJitter, JitterSource, SeededJitter};
pub use profiles::{AnatomicalProfile, BodyRegion};
