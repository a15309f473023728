//! Parametric field lines between the electrode contacts
//! Location: src/simulation/field_geometry.rs
//!
//! Each line is an arc from the proximal to the distal electrode whose sag
//! follows the penetration depth. Per-line jitter is drawn up front from an
//! injected [`JitterSource`], after which every line is a pure function of its
//! seed, so lines can be built in parallel without changing the output.
//!
//! Conductive features then bend the sampled points:
//!
//! ```text
//! metal implant / metal inclusion   pulls points toward its centre
//! bone inclusion                     pushes points away
//! muscle inclusion                   pulls points in
//! fat inclusion                      pushes points away (weaker than bone)
//! ```

use super::jitter::JitterSource;
use super::tissue_stack::TissueStack;
use crate::config::constants::{field, tissue};
use crate::model::{ElectrodePair, FieldLine, InclusionKind, Point3, TissueConfig};
use crate::utils::bounds::clamp_unit;
use ndarray::Array3;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Everything one geometry pass reads
#[derive(Debug, Clone, Copy)]
pub struct FieldInputs<'a> {
    pub tissue: &'a TissueConfig,
    pub stack: &'a TissueStack,
    pub electrodes: &'a ElectrodePair,
    pub penetration_depth: f32,
    pub intensity_norm: f32,
}

/// Generated field lines, `SAMPLES_PER_LINE` points each
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldGeometry {
    pub lines: Vec<FieldLine>,
}

impl FieldGeometry {
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn point_count(&self) -> usize {
        self.lines.iter().map(FieldLine::len).sum()
    }

    /// Dense `(lines, samples, xyz)` buffer for renderer upload
    pub fn to_array(&self) -> Array3<f32> {
        let mut buffer = Array3::<f32>::zeros((self.lines.len(), field::SAMPLES_PER_LINE, 3));
        for (i, line) in self.lines.iter().enumerate() {
            for (j, point) in line.points.iter().take(field::SAMPLES_PER_LINE).enumerate() {
                buffer[[i, j, 0]] = point.x;
                buffer[[i, j, 1]] = point.y;
                buffer[[i, j, 2]] = point.z;
            }
        }
        buffer
    }
}

/// Per-line random draws
#[derive(Debug, Clone, Copy, PartialEq)]
struct LineSeed {
    arc_jitter: f32,
    offset_z: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Effect {
    /// Move by a fraction of the vector to the centre
    Attract(f32),
    /// Move along the unit normal away from the centre (negative pulls in)
    Push(f32),
}

/// One localized distortion source
#[derive(Debug, Clone, Copy, PartialEq)]
struct Distorter {
    centre: Point3,
    radius: f32,
    effect: Effect,
}

impl Distorter {
    fn apply(&self, point: Point3) -> Point3 {
        if self.radius <= 0.0 {
            return point;
        }
        let offset = point - self.centre;
        let dist = offset.length();
        // Coincident points have no direction; a non-finite centre has no reach
        if !dist.is_finite() || dist == 0.0 || dist >= self.radius {
            return point;
        }
        let falloff = 1.0 - dist / self.radius;
        match self.effect {
            Effect::Attract(strength) => point + (self.centre - point) * (falloff * strength),
            Effect::Push(strength) => point + offset * (falloff * strength / dist),
        }
    }
}

/// Field-line geometry generator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldGeometryGenerator {
    depth_scale: f32,
    implant_distortion: bool,
    inclusion_distortion: bool,
    parallel: bool,
}

impl Default for FieldGeometryGenerator {
    fn default() -> Self {
        Self::new(tissue::DEPTH_SCALE)
    }
}

impl FieldGeometryGenerator {
    pub fn new(depth_scale: f32) -> Self {
        Self {
            depth_scale,
            implant_distortion: true,
            inclusion_distortion: true,
            parallel: cfg!(feature = "parallel"),
        }
    }

    /// Toggle the implant and inclusion distortion stages
    pub fn with_distortions(mut self, implant: bool, inclusions: bool) -> Self {
        self.implant_distortion = implant;
        self.inclusion_distortion = inclusions;
        self
    }

    /// Build lines on the rayon pool when the `parallel` feature is enabled
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// floor(8 + intensityNorm * 12)
    pub fn line_count(intensity_norm: f32) -> usize {
        (field::BASE_LINE_COUNT + clamp_unit(intensity_norm) * field::LINE_COUNT_PER_INTENSITY).floor() as usize
    }

    pub fn generate<J: JitterSource + ?Sized>(&self, inputs: &FieldInputs<'_>, jitter: &mut J) -> FieldGeometry {
        let count = Self::line_count(inputs.intensity_norm);

        // Draw order is part of the reproducibility contract: arc, then lateral
        let seeds: Vec<LineSeed> = (0..count)
            .map(|_| LineSeed {
                arc_jitter: jitter.next_unit() * field::ARC_JITTER_RANGE,
                offset_z: jitter.next_in(field::LATERAL_OFFSET_MIN, field::LATERAL_OFFSET_MAX),
            })
            .collect();

        let distorters = self.distorters(inputs);

        FieldGeometry {
            lines: self.build_lines(&seeds, inputs, &distorters),
        }
    }

    #[cfg(feature = "parallel")]
    fn build_lines(&self, seeds: &[LineSeed], inputs: &FieldInputs<'_>, distorters: &[Distorter]) -> Vec<FieldLine> {
        if self.parallel {
            seeds
                .par_iter()
                .map(|seed| build_line(seed, inputs, distorters))
                .collect()
        } else {
            seeds.iter().map(|seed| build_line(seed, inputs, distorters)).collect()
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn build_lines(&self, seeds: &[LineSeed], inputs: &FieldInputs<'_>, distorters: &[Distorter]) -> Vec<FieldLine> {
        seeds.iter().map(|seed| build_line(seed, inputs, distorters)).collect()
    }

    fn distorters(&self, inputs: &FieldInputs<'_>) -> Vec<Distorter> {
        // Soft tissue summed past f32::MAX leaves only the block to scale by
        let total_depth = match inputs.stack.total_depth() {
            depth if depth.is_finite() => depth,
            _ => inputs.stack.total_block_depth,
        };
        let electrodes = inputs.electrodes;
        let mut distorters = Vec::with_capacity(inputs.tissue.inclusions.len() + 1);

        if self.implant_distortion {
            if let Some(implant) = inputs.tissue.metal_implant {
                let mid = electrodes.midpoint();
                distorters.push(Distorter {
                    centre: Point3::new(mid.x, -clamp_unit(implant.depth) * total_depth * self.depth_scale, mid.z),
                    radius: clamp_unit(implant.span) * field::IMPLANT_RADIUS_FACTOR,
                    effect: Effect::Attract(field::IMPLANT_ATTRACTION),
                });
            }
        }

        if self.inclusion_distortion {
            for inclusion in &inputs.tissue.inclusions {
                let anchor = electrodes.along(clamp_unit(inclusion.position));
                let effect = match inclusion.kind {
                    InclusionKind::Bone => Effect::Push(field::BONE_DEFLECTION),
                    InclusionKind::Muscle => Effect::Push(-field::MUSCLE_ATTRACTION),
                    InclusionKind::Fat => Effect::Push(field::FAT_DEFLECTION),
                    InclusionKind::MetalImplant => Effect::Attract(field::IMPLANT_ATTRACTION),
                };
                distorters.push(Distorter {
                    centre: Point3::new(
                        anchor.x,
                        -clamp_unit(inclusion.depth) * total_depth * self.depth_scale,
                        anchor.z,
                    ),
                    radius: clamp_unit(inclusion.span) * field::INCLUSION_RADIUS_FACTOR,
                    effect,
                });
            }
        }

        distorters
    }
}

fn build_line(seed: &LineSeed, inputs: &FieldInputs<'_>, distorters: &[Distorter]) -> FieldLine {
    let arc_height = -inputs.penetration_depth * (field::ARC_HEIGHT_BASE + seed.arc_jitter);
    let electrodes = inputs.electrodes;

    let points = (0..field::SAMPLES_PER_LINE)
        .map(|i| {
            let t = i as f32 * field::SAMPLE_STEP;
            let bulge = (t * PI).sin();

            let mut point = electrodes.along(t);
            point.y += arc_height * bulge;
            point.z += seed.offset_z * bulge;

            distorters.iter().fold(point, |p, d| d.apply(p))
        })
        .collect();

    FieldLine { points }
}
