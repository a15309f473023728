// src/engine.rs
//! One compute pass over an immutable input snapshot
//!
//! Stages run in a fixed order: sanitize, stack, penetration, geometry,
//! envelope, lesion. Each frame is memoized on the full input tuple so a
//! renderer can call [`SimulationEngine::compute`] every frame and only pay for
//! changed inputs.

use crate::config::{ConfigError, EngineConfig};
use crate::error::{FieldError, FieldResult};
use crate::model::{ElectrodePair, LesionIndex, RiskResult, StimulationParams, TissueConfig};
use crate::simulation::{
    AnatomicalProfile, FieldGeometry, FieldGeometryGenerator, FieldInputs, LesionBreakdown, LesionIndexCalculator,
    PenetrationModel, SeededJitter, TissueStack, WaveformEnvelope,
};
use crate::utils::bounds::FieldAdjustment;
use crate::utils::validation::{structural_warnings, SimulationWarning, TissueValidator};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

/// Everything the renderer needs for one input snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationFrame {
    pub stack: TissueStack,
    pub penetration_depth: f32,
    pub intensity_norm: f32,
    pub geometry: FieldGeometry,
    pub envelope: WaveformEnvelope,
    /// `None` when risk simulation is switched off
    pub lesion: Option<LesionBreakdown>,
    pub warnings: Vec<SimulationWarning>,
}

impl SimulationFrame {
    pub fn lesion_index(&self) -> Option<LesionIndex> {
        self.lesion.map(|breakdown| breakdown.index)
    }

    /// Opacity of one line at time `t` in seconds
    pub fn opacity(&self, line_index: usize, time: f32) -> f32 {
        self.envelope.opacity(line_index, time)
    }

    pub fn to_json(&self) -> FieldResult<String> {
        serde_json::to_string(self).map_err(|source| FieldError::Export {
            source,
            context: crate::error_context!("frame", "to_json"),
        })
    }

    pub fn to_json_pretty(&self) -> FieldResult<String> {
        serde_json::to_string_pretty(self).map_err(|source| FieldError::Export {
            source,
            context: crate::error_context!("frame", "to_json_pretty"),
        })
    }
}

/// Sanitized input tuple; two computes with equal keys yield equal frames
///
/// The clamped snapshot keeps NaN out of the compared fields. Raw values that
/// only survive in `adjustments` and `electrodes` are compared bitwise.
#[derive(Debug, Clone, Serialize)]
struct FrameKey {
    tissue: TissueConfig,
    params: StimulationParams,
    adjustments: Vec<FieldAdjustment>,
    electrodes: ElectrodePair,
    risk: RiskResult,
}

impl FrameKey {
    fn new(tissue: &TissueConfig, params: &StimulationParams, electrodes: &ElectrodePair, risk: &RiskResult) -> Self {
        let (tissue, tissue_adjustments) = tissue.sanitized();
        let (params, param_adjustments) = params.sanitized();

        Self {
            tissue,
            params,
            adjustments: tissue_adjustments.into_iter().chain(param_adjustments).collect(),
            electrodes: *electrodes,
            risk: RiskResult {
                risk_score: risk.clamped_score(),
                ..risk.clone()
            },
        }
    }

    fn fingerprint(&self) -> u32 {
        // Collisions only cost a key comparison
        serde_json::to_vec(self)
            .map(|bytes| crc32fast::hash(&bytes))
            .unwrap_or_default()
    }
}

fn electrode_bits(electrodes: &ElectrodePair) -> [u32; 6] {
    let [px, py, pz] = electrodes.proximal.to_array();
    let [dx, dy, dz] = electrodes.distal.to_array();
    [px, py, pz, dx, dy, dz].map(f32::to_bits)
}

impl PartialEq for FrameKey {
    fn eq(&self, other: &Self) -> bool {
        self.tissue == other.tissue
            && self.params == other.params
            && self.risk == other.risk
            && electrode_bits(&self.electrodes) == electrode_bits(&other.electrodes)
            && self.adjustments.len() == other.adjustments.len()
            && self.adjustments.iter().zip(&other.adjustments).all(|(a, b)| {
                a.field == b.field && a.original.to_bits() == b.original.to_bits() && a.clamped == b.clamped
            })
    }
}

struct CacheEntry {
    fingerprint: u32,
    key: FrameKey,
    frame: Arc<SimulationFrame>,
}

/// Bounded FIFO memo of recent frames
struct FrameCache {
    entries: VecDeque<CacheEntry>,
    capacity: usize,
}

impl FrameCache {
    fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn get(&self, fingerprint: u32, key: &FrameKey) -> Option<Arc<SimulationFrame>> {
        self.entries
            .iter()
            .find(|entry| entry.fingerprint == fingerprint && &entry.key == key)
            .map(|entry| Arc::clone(&entry.frame))
    }

    fn insert(&mut self, fingerprint: u32, key: FrameKey, frame: Arc<SimulationFrame>) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(CacheEntry { fingerprint, key, frame });
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EngineMetrics {
    pub total_computes: u64,
    pub cache_hits: u64,
    pub average_compute_time_us: f32,
    pub max_compute_time_us: f32,
    pub budget_violations: u64,
}

impl EngineMetrics {
    fn record_compute(&mut self, compute_time_us: f32, budget_us: f32) {
        self.total_computes += 1;

        let n = self.total_computes as f32;
        self.average_compute_time_us = (self.average_compute_time_us * (n - 1.0) + compute_time_us) / n;

        if compute_time_us > self.max_compute_time_us {
            self.max_compute_time_us = compute_time_us;
        }
        if compute_time_us > budget_us {
            self.budget_violations += 1;
        }
    }
}

/// Tissue-field simulation engine
pub struct SimulationEngine {
    config: EngineConfig,
    penetration: PenetrationModel,
    geometry: FieldGeometryGenerator,
    lesion: LesionIndexCalculator,
    cache: Mutex<FrameCache>,
    metrics: Mutex<EngineMetrics>,
}

impl SimulationEngine {
    pub fn new(config: EngineConfig) -> FieldResult<Self> {
        config
            .validate_consistency()
            .map_err(|errors| FieldError::Config(ConfigError::ValidationError(errors)))?;

        tracing::debug!(summary = ?config.get_summary(), "simulation engine configured");

        Ok(Self {
            penetration: PenetrationModel::new(
                config.stimulation.max_intensity_ma,
                config.tissue.reference_fat_thickness,
            ),
            geometry: FieldGeometryGenerator::new(config.tissue.depth_scale)
                .with_distortions(config.features.metal_implant, config.features.inclusions)
                .with_parallel(config.field.parallel_lines),
            lesion: LesionIndexCalculator::new(),
            cache: Mutex::new(FrameCache::new(config.engine.cache_capacity)),
            metrics: Mutex::new(EngineMetrics::default()),
            config,
        })
    }

    /// Engine with the built-in defaults
    pub fn with_defaults() -> Self {
        let config = EngineConfig::default();
        Self {
            penetration: PenetrationModel::default(),
            geometry: FieldGeometryGenerator::default()
                .with_distortions(config.features.metal_implant, config.features.inclusions)
                .with_parallel(config.field.parallel_lines),
            lesion: LesionIndexCalculator::new(),
            cache: Mutex::new(FrameCache::new(config.engine.cache_capacity)),
            metrics: Mutex::new(EngineMetrics::default()),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Swap in a new configuration, e.g. from a hot reload; drops cached frames
    pub fn reconfigure(&mut self, config: EngineConfig) -> FieldResult<()> {
        let rebuilt = Self::new(config)?;
        self.config = rebuilt.config;
        self.penetration = rebuilt.penetration;
        self.geometry = rebuilt.geometry;
        *self.cache.lock() = rebuilt.cache.into_inner();
        tracing::info!("simulation engine reconfigured");
        Ok(())
    }

    /// Compute (or fetch) the frame for one input snapshot
    pub fn compute(
        &self,
        tissue: &TissueConfig,
        params: &StimulationParams,
        electrodes: &ElectrodePair,
        risk: &RiskResult,
    ) -> Arc<SimulationFrame> {
        let key = FrameKey::new(tissue, params, electrodes, risk);
        let fingerprint = key.fingerprint();

        if self.config.is_memoized() {
            if let Some(frame) = self.cache.lock().get(fingerprint, &key) {
                tracing::trace!(fingerprint, "frame cache hit");
                self.metrics.lock().cache_hits += 1;
                return frame;
            }
        }

        let start = Instant::now();
        let frame = Arc::new(self.simulate(&key, fingerprint));
        let elapsed_us = start.elapsed().as_secs_f32() * 1_000_000.0;

        let budget_us = self.config.engine.frame_budget_ms as f32 * 1000.0;
        self.metrics.lock().record_compute(elapsed_us, budget_us);

        #[cfg(feature = "performance_monitoring")]
        if elapsed_us > budget_us {
            tracing::warn!(elapsed_us, budget_us, "compute pass exceeded frame budget");
        }

        self.cache.lock().insert(fingerprint, key, Arc::clone(&frame));
        frame
    }

    /// Reject invalid input with every problem listed, then compute
    pub fn compute_checked(
        &self,
        tissue: &TissueConfig,
        params: &StimulationParams,
        electrodes: &ElectrodePair,
        risk: &RiskResult,
    ) -> FieldResult<Arc<SimulationFrame>> {
        TissueValidator::from_config(&self.config)
            .validate_all(tissue, params, electrodes)
            .map_err(|source| FieldError::Validation {
                source,
                context: crate::error_context!("engine", "compute_checked"),
            })?;
        Ok(self.compute(tissue, params, electrodes, risk))
    }

    /// Compute a preset with its suggested stimulation
    pub fn compute_profile(&self, profile: &AnatomicalProfile, risk: &RiskResult) -> Arc<SimulationFrame> {
        self.compute(&profile.tissue, &profile.suggested_params, &profile.electrodes, risk)
    }

    fn simulate(&self, key: &FrameKey, fingerprint: u32) -> SimulationFrame {
        let _span = tracing::debug_span!("compute", fingerprint).entered();
        let features = &self.config.features;

        let mut tissue = key.tissue.clone();
        let params = key.params;

        let mut warnings: Vec<SimulationWarning> =
            key.adjustments.iter().cloned().map(SimulationWarning::FieldClamped).collect();

        if !features.metal_implant && tissue.metal_implant.take().is_some() {
            warnings.push(SimulationWarning::FeatureDisabled {
                feature: "metal_implant".to_string(),
            });
        }
        if !features.inclusions && !tissue.inclusions.is_empty() {
            tissue.inclusions.clear();
            warnings.push(SimulationWarning::FeatureDisabled {
                feature: "inclusions".to_string(),
            });
        }

        let stack = TissueStack::from_config(&tissue, self.config.tissue.total_block_depth);
        warnings.extend(structural_warnings(&tissue, &key.electrodes, &stack));

        let intensity_norm = self.penetration.intensity_norm(params.intensity_ma);
        let penetration_depth = self.penetration.depth(params.intensity_ma, &tissue);

        let mut jitter = SeededJitter::new(self.config.field.jitter_seed);
        let geometry = self.geometry.generate(
            &FieldInputs {
                tissue: &tissue,
                stack: &stack,
                electrodes: &key.electrodes,
                penetration_depth,
                intensity_norm,
            },
            &mut jitter,
        );

        let envelope = WaveformEnvelope::from_params(&params, intensity_norm);

        let lesion = if features.risk_simulation && tissue.enable_risk_simulation {
            Some(self.lesion.breakdown(&key.risk, intensity_norm, params.pulse_width_us, &tissue))
        } else {
            None
        };

        for warning in &warnings {
            tracing::warn!(%warning, "simulation input anomaly");
        }

        tracing::debug!(
            penetration_depth,
            lines = geometry.line_count(),
            lesion = lesion.map(|l| l.index.value()),
            "frame computed"
        );

        SimulationFrame {
            stack,
            penetration_depth,
            intensity_norm,
            geometry,
            envelope,
            lesion,
            warnings,
        }
    }

    pub fn metrics(&self) -> EngineMetrics {
        self.metrics.lock().clone()
    }

    pub fn reset_metrics(&self) {
        *self.metrics.lock() = EngineMetrics::default();
    }

    pub fn cached_frames(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::constants::field;
    use crate::model::{Inclusion, InclusionKind, RiskLevel};
    use crate::simulation::LesionSeverity;
    use crate::utils::validation::ValidationError;

    fn inputs() -> (TissueConfig, StimulationParams, ElectrodePair, RiskResult) {
        (
            TissueConfig::default(),
            StimulationParams::default(),
            ElectrodePair::default(),
            RiskResult::default(),
        )
    }

    #[test]
    fn test_compute_default_frame() {
        let engine = SimulationEngine::with_defaults();
        let (tissue, params, electrodes, risk) = inputs();
        let frame = engine.compute(&tissue, &params, &electrodes, &risk);

        // 20 mA of 80 -> 0.25 -> floor(8 + 3) lines
        assert_eq!(frame.intensity_norm, 0.25);
        assert_eq!(frame.geometry.line_count(), 11);
        assert!(frame.geometry.lines.iter().all(|l| l.len() == field::SAMPLES_PER_LINE));
        assert!((0.2..=2.0).contains(&frame.penetration_depth));
        assert!(frame.lesion.is_some());
        assert!(frame.warnings.is_empty());
    }

    #[test]
    fn test_repeat_compute_hits_cache() {
        let engine = SimulationEngine::with_defaults();
        let (tissue, params, electrodes, risk) = inputs();

        let first = engine.compute(&tissue, &params, &electrodes, &risk);
        let second = engine.compute(&tissue, &params, &electrodes, &risk);

        assert!(Arc::ptr_eq(&first, &second));
        let metrics = engine.metrics();
        assert_eq!(metrics.total_computes, 1);
        assert_eq!(metrics.cache_hits, 1);
    }

    #[test]
    fn test_uncached_engine_is_deterministic() {
        let mut config = EngineConfig::default();
        config.engine.cache_capacity = 0;
        let engine = SimulationEngine::new(config).unwrap();
        let (tissue, params, electrodes, risk) = inputs();

        let first = engine.compute(&tissue, &params, &electrodes, &risk);
        let second = engine.compute(&tissue, &params, &electrodes, &risk);

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first, second);
        assert_eq!(engine.cached_frames(), 0);
    }

    #[test]
    fn test_cache_is_bounded() {
        let mut config = EngineConfig::default();
        config.engine.cache_capacity = 2;
        let engine = SimulationEngine::new(config).unwrap();
        let (tissue, mut params, electrodes, risk) = inputs();

        for ma in [10.0, 20.0, 30.0] {
            params.intensity_ma = ma;
            engine.compute(&tissue, &params, &electrodes, &risk);
        }
        assert_eq!(engine.cached_frames(), 2);

        engine.clear_cache();
        assert_eq!(engine.cached_frames(), 0);
    }

    #[test]
    fn test_risk_simulation_disabled_by_tissue() {
        let engine = SimulationEngine::with_defaults();
        let (mut tissue, params, electrodes, risk) = inputs();
        tissue.enable_risk_simulation = false;

        let frame = engine.compute(&tissue, &params, &electrodes, &risk);
        assert!(frame.lesion.is_none());
        assert!(frame.lesion_index().is_none());
    }

    #[test]
    fn test_feature_flags_strip_stages() {
        let mut config = EngineConfig::default();
        config.features.metal_implant = false;
        config.features.risk_simulation = false;
        let engine = SimulationEngine::new(config).unwrap();

        let (tissue, params, electrodes, risk) = inputs();
        let tissue = tissue.with_metal_implant(0.3, 0.5);
        let frame = engine.compute(&tissue, &params, &electrodes, &risk);

        assert!(frame.lesion.is_none());
        assert!(frame.warnings.contains(&SimulationWarning::FeatureDisabled {
            feature: "metal_implant".to_string()
        }));
    }

    #[test]
    fn test_clamped_inputs_become_warnings() {
        let engine = SimulationEngine::with_defaults();
        let (tissue, params, electrodes, risk) = inputs();
        let tissue = tissue.with_inclusion(Inclusion::new("b", InclusionKind::Bone, 1.4, 0.5, 0.5));

        let frame = engine.compute(&tissue, &params, &electrodes, &risk);
        assert!(frame
            .warnings
            .iter()
            .any(|w| matches!(w, SimulationWarning::FieldClamped(adj) if adj.field.contains("position"))));
    }

    #[test]
    fn test_lesion_flows_through_engine() {
        let engine = SimulationEngine::with_defaults();
        let (tissue, mut params, electrodes, _) = inputs();
        params.intensity_ma = 48.0;
        params.pulse_width_us = 225.0;
        let tissue = tissue.with_metal_implant(0.5, 0.5);
        let risk = RiskResult::new(RiskLevel::Alto, 90.0);

        let frame = engine.compute(&tissue, &params, &electrodes, &risk);
        let lesion = frame.lesion.unwrap();
        assert_eq!(lesion.index.value(), 1.0);
        assert_eq!(lesion.severity(), LesionSeverity::Severe);
    }

    #[test]
    fn test_compute_checked_rejects_bad_input() {
        let engine = SimulationEngine::with_defaults();
        let (mut tissue, params, electrodes, risk) = inputs();
        tissue.fat_thickness = -1.0;

        let err = engine.compute_checked(&tissue, &params, &electrodes, &risk).unwrap_err();
        match err {
            FieldError::Validation { source, context } => {
                assert!(matches!(source, ValidationError::OutOfRange { .. }));
                assert_eq!(context.component, "engine");
                assert_eq!(context.operation, "compute_checked");
                assert_eq!(context.file, Some(file!()));
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = EngineConfig::default();
        config.stimulation.max_intensity_ma = 0.0;
        assert!(matches!(SimulationEngine::new(config), Err(FieldError::Config(_))));
    }

    #[test]
    fn test_reconfigure_drops_cache() {
        let mut engine = SimulationEngine::with_defaults();
        let (tissue, params, electrodes, risk) = inputs();
        engine.compute(&tissue, &params, &electrodes, &risk);
        assert_eq!(engine.cached_frames(), 1);

        let mut config = EngineConfig::default();
        config.field.jitter_seed = 99;
        engine.reconfigure(config).unwrap();
        assert_eq!(engine.cached_frames(), 0);
        assert_eq!(engine.config().field.jitter_seed, 99);
    }

    #[test]
    fn test_non_finite_input_reuses_cached_frame() {
        let engine = SimulationEngine::with_defaults();
        let (mut tissue, params, electrodes, risk) = inputs();
        tissue.fat_thickness = f32::NAN;

        let first = engine.compute(&tissue, &params, &electrodes, &risk);
        for _ in 0..4 {
            let again = engine.compute(&tissue, &params, &electrodes, &risk);
            assert!(Arc::ptr_eq(&first, &again));
        }

        let metrics = engine.metrics();
        assert_eq!(metrics.total_computes, 1);
        assert_eq!(metrics.cache_hits, 4);
        assert_eq!(engine.cached_frames(), 1);
    }

    #[test]
    fn test_inputs_clamping_alike_keep_their_own_warnings() {
        let engine = SimulationEngine::with_defaults();
        let (mut tissue, params, electrodes, risk) = inputs();

        tissue.fat_thickness = f32::NAN;
        let from_nan = engine.compute(&tissue, &params, &electrodes, &risk);
        tissue.fat_thickness = -1.0;
        let from_negative = engine.compute(&tissue, &params, &electrodes, &risk);

        assert!(!Arc::ptr_eq(&from_nan, &from_negative));
        assert_eq!(from_nan.geometry, from_negative.geometry);
        match (&from_nan.warnings[0], &from_negative.warnings[0]) {
            (SimulationWarning::FieldClamped(nan), SimulationWarning::FieldClamped(negative)) => {
                assert!(nan.original.is_nan());
                assert_eq!(negative.original, -1.0);
            }
            other => panic!("Expected clamp warnings, got {:?}", other),
        }
    }

    #[test]
    fn test_risk_score_out_of_range_shares_frame() {
        let engine = SimulationEngine::with_defaults();
        let (tissue, params, electrodes, _) = inputs();

        let first = engine.compute(&tissue, &params, &electrodes, &RiskResult::new(RiskLevel::Moderado, f32::NAN));
        let second = engine.compute(&tissue, &params, &electrodes, &RiskResult::new(RiskLevel::Moderado, f32::NAN));
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_overflowing_soft_tissue_keeps_points_finite() {
        let engine = SimulationEngine::with_defaults();
        let (_, params, electrodes, risk) = inputs();
        let tissue = TissueConfig {
            skin_thickness: 3e38,
            fat_thickness: 3e38,
            ..TissueConfig::default()
        }
        .with_inclusion(Inclusion::new("b", InclusionKind::Bone, 0.5, 0.0, 0.5));

        let frame = engine.compute(&tissue, &params, &electrodes, &risk);
        assert!(frame.stack.stack_overflow);
        for line in &frame.geometry.lines {
            assert!(line.points.iter().all(|p| p.to_array().iter().all(|c| c.is_finite())));
        }

        let parsed: SimulationFrame = serde_json::from_str(&frame.to_json().unwrap()).unwrap();
        assert!(parsed.stack.bone_start.is_nan());
        assert!(matches!(parsed.warnings[0], SimulationWarning::StackOverflow { .. }));
    }

    #[test]
    fn test_frame_json_keeps_non_finite_originals() {
        let engine = SimulationEngine::with_defaults();
        let (mut tissue, params, electrodes, risk) = inputs();
        tissue.fat_thickness = f32::NAN;

        let frame = engine.compute(&tissue, &params, &electrodes, &risk);
        let json = frame.to_json().unwrap();
        assert!(json.contains("\"original\":null"));

        let parsed: SimulationFrame = serde_json::from_str(&json).unwrap();
        match &parsed.warnings[0] {
            SimulationWarning::FieldClamped(adjustment) => {
                assert_eq!(adjustment.field, "fat_thickness");
                assert!(adjustment.original.is_nan());
                assert_eq!(adjustment.clamped, 0.0);
            }
            other => panic!("Expected clamp warning, got {:?}", other),
        }
    }

    #[test]
    fn test_frame_json_export() {
        let engine = SimulationEngine::with_defaults();
        let frame = engine.compute_profile(&AnatomicalProfile::forearm(), &RiskResult::default());

        let json = frame.to_json().unwrap();
        let parsed: SimulationFrame = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.geometry.line_count(), frame.geometry.line_count());
        assert!(json.contains("\"penetration_depth\""));
    }
}
