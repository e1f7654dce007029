//! Ambience behaviour seen from outside: impulse response and mono use.

mod common;

use common::{energy, impulse, noise, peak, run_mono, run_stereo};
use loveless_fx::{Ambience, Effect};

const SAMPLE_RATE: f32 = 48000.0;

/// size 7, hf 70 %, mix 70 %, output 0 dB: silence until the first tap,
/// then decaying diffuse energy.
#[test]
fn test_impulse_response() {
    // One block: the guard flushes the lines at the first block boundary
    // after the damping filter has gone quiet.
    let mut effect = Ambience::default();
    effect.prepare(SAMPLE_RATE, 10_000).unwrap();
    for (id, value) in [("size", 7.0), ("hf", 70.0), ("mix", 70.0), ("output", 0.0)] {
        effect.set_parameter(id, value).unwrap();
    }

    let input = impulse(10_000);
    let (left, right) = run_stereo(&mut effect, &input, &input, 10_000);

    let taps = effect.coefficients().tap_delays();
    assert_eq!(taps, [202, 268, 523, 716]);
    assert!(taps.windows(2).all(|pair| pair[0] < pair[1]), "{taps:?}");

    // Sample 0 is the dry path only; the undiffused wet path cancels.
    assert!((left[0] - 0.51).abs() < 1e-5, "{}", left[0]);
    assert!((right[0] - 0.51).abs() < 1e-5, "{}", right[0]);

    let first_tap = taps[0];
    for channel in [&left, &right] {
        assert!(
            channel[1..first_tap].iter().all(|s| s.abs() < 1e-6),
            "output before the first tap"
        );
        assert!(channel[first_tap].abs() > 1e-3, "nothing at the first tap");
    }

    for channel in [&left, &right] {
        let early = energy(&channel[first_tap..first_tap + 1000]);
        let late = energy(&channel[8000..9000]);
        assert!(late < early * 0.5, "tail does not decay: {early} -> {late}");
    }
}

/// The same response arrives regardless of how the host slices blocks.
#[test]
fn test_block_size_independent() {
    let input = noise(5, 3000);

    let mut whole = Ambience::default();
    whole.prepare(SAMPLE_RATE, 3000).unwrap();
    let (left_a, right_a) = run_stereo(&mut whole, &input, &input, 3000);

    let mut sliced = Ambience::default();
    sliced.prepare(SAMPLE_RATE, 3000).unwrap();
    let (left_b, right_b) = run_stereo(&mut sliced, &input, &input, 37);

    for (a, b) in left_a.iter().zip(&left_b).chain(right_a.iter().zip(&right_b)) {
        assert!((a - b).abs() < 1e-6, "{a} != {b}");
    }
}

/// After the input stops the lines drain and the guard brings the output
/// back to exact silence.
#[test]
fn test_tail_settles_to_silence() {
    let mut effect = Ambience::default();
    effect.prepare(SAMPLE_RATE, 512).unwrap();

    let mut input = noise(9, 2048);
    input.extend(std::iter::repeat(0.0).take(48000));
    let (left, right) = run_stereo(&mut effect, &input, &input, 512);

    let tail = input.len() - 4096..input.len();
    assert_eq!(peak(&left[tail.clone()]), 0.0);
    assert_eq!(peak(&right[tail]), 0.0);
}

#[test]
fn test_mono_bus_gets_reverb() {
    let mut effect = Ambience::default();
    effect.prepare(SAMPLE_RATE, 2048).unwrap();
    effect.set_parameter("mix", 100.0).unwrap();

    let output = run_mono(&mut effect, &impulse(2048), 2048);

    assert_eq!(output[0], 0.0);
    assert!(energy(&output[200..2048]) > 0.0);
}

#[test]
fn test_size_change_does_not_click() {
    let mut effect = Ambience::default();
    effect.prepare(SAMPLE_RATE, 256).unwrap();
    effect.set_parameter("mix", 100.0).unwrap();

    let input = noise(1, 4096);
    run_stereo(&mut effect, &input, &input, 256);

    // The old audio is flushed, so silence after the change stays silent.
    effect.set_parameter("size", 2.0).unwrap();
    let silence = vec![0.0; 2048];
    let (left, right) = run_stereo(&mut effect, &silence, &silence, 256);
    assert_eq!(peak(&left), 0.0);
    assert_eq!(peak(&right), 0.0);
}
