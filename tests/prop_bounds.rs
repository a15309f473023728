// tests/prop_bounds.rs
//! Property tests: every model output stays inside its declared range for any
//! input, including negative, oversized and non-finite values.

use proptest::prelude::*;
use tens_field_core::config::constants::field;
use tens_field_core::model::{
    ElectrodePair, Inclusion, InclusionKind, RiskLevel, RiskResult, StimulationMode, StimulationParams, TissueConfig,
};
use tens_field_core::simulation::{
    FieldGeometryGenerator, FieldInputs, LesionIndexCalculator, PenetrationModel, SeededJitter, TissueStack,
    WaveformEnvelope,
};

fn any_f32() -> impl Strategy<Value = f32> {
    prop_oneof![
        8 => -5.0f32..5.0,
        1 => Just(f32::NAN),
        1 => Just(f32::INFINITY),
    ]
}

fn inclusion_kind() -> impl Strategy<Value = InclusionKind> {
    prop_oneof![
        Just(InclusionKind::Bone),
        Just(InclusionKind::Muscle),
        Just(InclusionKind::Fat),
        Just(InclusionKind::MetalImplant),
    ]
}

fn mode() -> impl Strategy<Value = StimulationMode> {
    prop_oneof![
        Just(StimulationMode::Convencional),
        Just(StimulationMode::Acupuntura),
        Just(StimulationMode::Burst),
        Just(StimulationMode::Modulado),
    ]
}

fn risk_level() -> impl Strategy<Value = RiskLevel> {
    prop_oneof![Just(RiskLevel::Baixo), Just(RiskLevel::Moderado), Just(RiskLevel::Alto)]
}

prop_compose! {
    fn inclusion()(kind in inclusion_kind(), position in any_f32(), depth in any_f32(), span in any_f32(), n in 0u32..1000)
        -> Inclusion {
        Inclusion::new(format!("inc-{}", n), kind, position, depth, span)
    }
}

prop_compose! {
    fn tissue()(
        skin in 0.0f32..1.5,
        fat in 0.0f32..1.5,
        muscle in 0.0f32..2.0,
        bone_depth in 0.0f32..3.0,
        implant in proptest::option::of((0.0f32..1.0, 0.0f32..1.0)),
        inclusions in proptest::collection::vec(inclusion(), 0..4),
    ) -> TissueConfig {
        let mut config = TissueConfig {
            skin_thickness: skin,
            fat_thickness: fat,
            muscle_thickness: muscle,
            bone_depth,
            inclusions,
            ..TissueConfig::default()
        };
        if let Some((depth, span)) = implant {
            config = config.with_metal_implant(depth, span);
        }
        config
    }
}

proptest! {
    #[test]
    fn bone_thickness_follows_block_depth(skin in 0.0f32..2.0, fat in 0.0f32..2.0, muscle in 0.0f32..2.0) {
        let stack = TissueStack::new(skin, fat, muscle, 3.0);
        let expected = (3.0 - (skin + fat + muscle)).max(0.0);
        prop_assert!((stack.bone_thickness - expected).abs() < 1e-5);
        prop_assert!(stack.bone_thickness >= 0.0);
        prop_assert_eq!(stack.stack_overflow, skin + fat + muscle > 3.0);
    }

    #[test]
    fn penetration_depth_is_bounded(intensity in any_f32(), tissue in tissue()) {
        let model = PenetrationModel::default();
        let (tissue, _) = tissue.sanitized();
        let depth = model.depth(intensity * 40.0, &tissue);
        prop_assert!((0.2..=2.0).contains(&depth), "depth {}", depth);
    }

    #[test]
    fn lesion_index_is_bounded(
        level in risk_level(),
        intensity_norm in any_f32(),
        pulse_width in -100.0f32..1000.0,
        tissue in tissue(),
    ) {
        let risk = RiskResult::new(level, 50.0);
        let index = LesionIndexCalculator::new().index(&risk, intensity_norm, pulse_width, &tissue);
        prop_assert!((0.0..=1.0).contains(&index.value()));
    }

    #[test]
    fn geometry_shape_matches_intensity(intensity_norm in 0.0f32..=1.0, seed in any::<u64>(), tissue in tissue()) {
        let (tissue, _) = tissue.sanitized();
        let stack = TissueStack::from_config(&tissue, 3.0);
        let electrodes = ElectrodePair::default();
        let inputs = FieldInputs {
            tissue: &tissue,
            stack: &stack,
            electrodes: &electrodes,
            penetration_depth: 1.0,
            intensity_norm,
        };

        let geometry = FieldGeometryGenerator::default().generate(&inputs, &mut SeededJitter::new(seed));
        let expected = (8.0 + intensity_norm * 12.0).floor() as usize;
        prop_assert_eq!(geometry.line_count(), expected);
        for line in &geometry.lines {
            prop_assert_eq!(line.len(), field::SAMPLES_PER_LINE);
            prop_assert!(line.points.iter().all(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite()));
        }
    }

    #[test]
    fn opacity_is_bounded(
        mode in mode(),
        frequency in any_f32(),
        intensity_norm in any_f32(),
        line in 0usize..20,
        time in -100.0f32..100.0,
    ) {
        let params = StimulationParams { frequency_hz: frequency, mode, ..StimulationParams::default() };
        let envelope = WaveformEnvelope::from_params(&params, intensity_norm);
        let opacity = envelope.opacity(line, time);
        prop_assert!((0.0..=1.0).contains(&opacity), "opacity {}", opacity);
    }
}
