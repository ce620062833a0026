use bernoulli_tides::{
    dsp::UniformSource,
    modules::{
        bernoulli::{BernoulliInputs, ChannelInputs},
        envelope::EnvelopeInputs,
    },
    BernoulliGate, BufferedEnvelopeGenerator, GeneratorMode, GeneratorRange, Input, Module,
    OutMode, ProcessCtx, TossMode, BLOCK_SIZE, NUM_BLOCKS,
};

/// Always draws the same value.
struct Fixed(f32);

impl UniformSource for Fixed {
    fn uniform(&mut self) -> f32 {
        self.0
    }
}

fn step_inputs(voltage: f32) -> BernoulliInputs {
    let channel = ChannelInputs {
        input: Input::patched(voltage),
        threshold: 0.5,
        ..ChannelInputs::default()
    };
    BernoulliInputs {
        channels: [channel; 2],
    }
}

#[test]
fn step_routes_by_draw() {
    let ctx = ProcessCtx::new(48_000.0);
    for (draw, expected_a, expected_b) in [(0.75, 10.0, 0.0), (0.25, 0.0, 10.0)] {
        let mut gate = BernoulliGate::with_source(Fixed(draw));
        gate.process(&step_inputs(0.0), &ctx);
        let out = gate.process(&step_inputs(10.0), &ctx);
        for channel in out.channels {
            assert_eq!((channel.a, channel.b), (expected_a, expected_b), "draw {draw}");
        }
    }
}

#[test]
fn gate_feeds_the_generator() {
    let ctx = ProcessCtx::new(48_000.0);
    let mut gate = BernoulliGate::with_source(Fixed(0.9));
    let mut generator = BufferedEnvelopeGenerator::new(48_000.0);
    generator.set_mode(GeneratorMode::Ad);

    let mut peak: f32 = 0.0;
    // Four triggers, one every 100 ms.
    for n in 0..19_200 {
        let clock = if n % 4_800 < 240 { 10.0 } else { 0.0 };
        let routed = gate.process(&step_inputs(clock), &ctx);
        let inputs = EnvelopeInputs {
            frequency: 36.0,
            trigger: Input::patched(routed.channels[0].a),
            ..EnvelopeInputs::default()
        };
        let out = generator.process(&inputs, &ctx);
        peak = peak.max(out.unipolar);
    }
    assert!(peak > 6.0, "envelope never opened: peak {peak}");
}

#[test]
fn constant_inputs_give_a_continuous_oscillator() {
    let ctx = ProcessCtx::new(48_000.0);
    let mut generator = BufferedEnvelopeGenerator::new(48_000.0);
    generator.set_range(GeneratorRange::High);
    let inputs = EnvelopeInputs::default();

    let out: Vec<f32> = (0..BLOCK_SIZE * 200)
        .map(|_| generator.process(&inputs, &ctx).unipolar)
        .collect();

    // Middle C triangle: 0..8 V twice per 183 samples, about 0.087 V per sample.
    let settled = &out[BLOCK_SIZE * NUM_BLOCKS * 2..];
    for pair in settled.windows(2) {
        assert!((pair[1] - pair[0]).abs() < 0.2, "jump {} -> {}", pair[0], pair[1]);
    }
    assert!(settled.iter().any(|&v| v > 7.5));
    assert!(settled.iter().any(|&v| v < 0.5));
}

#[test]
fn every_strategy_stays_in_range() {
    let ctx = ProcessCtx::new(44_100.0);
    for range in GeneratorRange::ALL.iter().copied() {
        for wavetable in [false, true] {
            for smoothness in [-1.0, 0.0, 1.0] {
                let mut generator =
                    BufferedEnvelopeGenerator::new(44_100.0).with_wavetable(wavetable);
                generator.set_range(range);
                let inputs = EnvelopeInputs {
                    smoothness,
                    slope: 0.6,
                    shape: -0.4,
                    frequency: 24.0,
                    ..EnvelopeInputs::default()
                };
                for _ in 0..BLOCK_SIZE * 64 {
                    let out = generator.process(&inputs, &ctx);
                    assert!(out.unipolar.is_finite() && out.bipolar.is_finite());
                    assert!((0.0..=8.0).contains(&out.unipolar));
                    assert!((-5.0..=5.0).contains(&out.bipolar));
                }
            }
        }
    }
}

#[test]
fn reset_both_modules() {
    let mut gate = BernoulliGate::with_source(Fixed(0.1));
    gate.set_toss_mode(1, TossMode::Toggle);
    gate.set_out_mode(0, OutMode::Latch);
    gate.reset();
    assert_eq!(gate.toss_mode(1), Some(TossMode::Direct));
    assert_eq!(gate.out_mode(0), Some(OutMode::Gate));

    let mut generator = BufferedEnvelopeGenerator::new(48_000.0);
    generator.set_mode(GeneratorMode::Ar);
    generator.reset();
    assert_eq!(generator.mode(), GeneratorMode::Looping);
    assert_eq!(generator.range(), GeneratorRange::Medium);
}

#[cfg(feature = "serde")]
mod persistence {
    use super::*;
    use bernoulli_tides::patch::{Persist, RackPatch};

    #[test]
    fn legacy_gate_patch_loads() {
        let mut gate = BernoulliGate::with_source(Fixed(0.5));
        gate.load_json_str(r#"{"modes": [true, false]}"#).unwrap();
        assert_eq!(gate.toss_mode(0), Some(TossMode::Toggle));
        assert_eq!(gate.toss_mode(1), Some(TossMode::Direct));
        assert_eq!(gate.out_mode(0), Some(OutMode::Through));
        assert_eq!(gate.out_mode(1), Some(OutMode::Through));
    }

    #[test]
    fn rack_patch_text_round_trip() {
        let mut gate = BernoulliGate::with_source(Fixed(0.5));
        gate.set_out_mode(1, OutMode::Latch);
        let mut generator = BufferedEnvelopeGenerator::new(48_000.0);
        generator.set_range(GeneratorRange::Low);

        let text = RackPatch::capture(&gate, &generator).to_json_string().unwrap();
        let patch = RackPatch::from_json_str(&text).unwrap();

        let mut gate2 = BernoulliGate::with_source(Fixed(0.5));
        let mut generator2 = BufferedEnvelopeGenerator::new(48_000.0);
        patch.apply(&mut gate2, &mut generator2).unwrap();
        assert_eq!(gate2.out_mode(1), Some(OutMode::Latch));
        assert_eq!(generator2.range(), GeneratorRange::Low);
    }
}
