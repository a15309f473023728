//! Stack model: cumulative tissue layer boundaries
//! Location: src/simulation/tissue_stack.rs
//!
//! Each layer starts where the previous one ends and bone always begins where
//! muscle ends. Bone fills the rest of the fixed-depth block.

use crate::model::TissueConfig;
use crate::utils::bounds::non_finite_as_null;
use serde::{Deserialize, Serialize};

/// Tissue layer at a given depth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TissueLayer {
    Skin,
    Fat,
    Muscle,
    Bone,
    /// Below the modelled block
    Outside,
}

/// Cumulative depth boundaries of the tissue block
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TissueStack {
    pub skin_end: f32,
    /// Boundaries past the skin may sum past `f32::MAX`
    #[serde(with = "non_finite_as_null")]
    pub fat_end: f32,
    #[serde(with = "non_finite_as_null")]
    pub muscle_end: f32,
    #[serde(with = "non_finite_as_null")]
    pub bone_start: f32,
    pub bone_thickness: f32,
    pub total_block_depth: f32,
    /// Soft tissue alone is deeper than the block
    pub stack_overflow: bool,
}

impl TissueStack {
    /// Build the stack from already-sanitized thicknesses
    pub fn new(skin: f32, fat: f32, muscle: f32, total_block_depth: f32) -> Self {
        let skin_end = skin;
        let fat_end = skin_end + fat;
        let muscle_end = fat_end + muscle;
        let bone_start = muscle_end;

        Self {
            skin_end,
            fat_end,
            muscle_end,
            bone_start,
            bone_thickness: (total_block_depth - bone_start).max(0.0),
            total_block_depth,
            stack_overflow: bone_start > total_block_depth,
        }
    }

    pub fn from_config(tissue: &TissueConfig, total_block_depth: f32) -> Self {
        Self::new(
            tissue.skin_thickness,
            tissue.fat_thickness,
            tissue.muscle_thickness,
            total_block_depth,
        )
    }

    /// Depth of the deepest boundary; equals the block depth unless overflowing
    pub fn total_depth(&self) -> f32 {
        self.bone_start + self.bone_thickness
    }

    pub fn layer_at(&self, depth: f32) -> TissueLayer {
        if depth < 0.0 || depth.is_nan() {
            TissueLayer::Outside
        } else if depth < self.skin_end {
            TissueLayer::Skin
        } else if depth < self.fat_end {
            TissueLayer::Fat
        } else if depth < self.muscle_end {
            TissueLayer::Muscle
        } else if depth < self.total_depth() {
            TissueLayer::Bone
        } else {
            TissueLayer::Outside
        }
    }

    /// Thickness of a single layer
    pub fn thickness_of(&self, layer: TissueLayer) -> f32 {
        match layer {
            TissueLayer::Skin => self.skin_end,
            TissueLayer::Fat => self.fat_end - self.skin_end,
            TissueLayer::Muscle => self.muscle_end - self.fat_end,
            TissueLayer::Bone => self.bone_thickness,
            TissueLayer::Outside => 0.0,
        }
    }
}
