mod common;

use stereo_intersect::prelude::*;

#[test]
fn test_identical_channels_are_all_center() {
    for (frame, overlap) in [(64, 1), (256, 2), (512, 4), (1024, 8)] {
        let mut engine = EngineF32::new(EngineConfig::new(frame, overlap)).unwrap();
        let signal = common::noise(11, 6000);
        let [left, right, center] = common::upmix(&mut engine, &signal, &signal, 300);

        let expected = common::delayed(&signal, engine.latency());
        let snr = common::calculate_snr(&expected, &center);
        assert!(snr > 80.0, "frame {} overlap {}: SNR {:.1} dB", frame, overlap, snr);
        assert!(left.iter().chain(&right).all(|x| x.abs() < 1e-4));
    }
}

#[test]
fn test_identity_in_f64() {
    let mut engine = EngineF64::new(EngineConfig::new(128, 4)).unwrap();
    let signal: Vec<f64> = (0..2000).map(|i| (i as f64 * 0.013).sin() * 0.8).collect();
    let mut center = vec![0.0; signal.len()];
    engine.process(
        [&signal[..], &signal[..]],
        Output::Intersect {
            center: &mut center,
        },
    );

    for t in 128..signal.len() {
        assert!((center[t] - signal[t - 128]).abs() < 1e-10, "sample {}", t);
    }
}

#[test]
fn test_residual_plus_center_is_delayed_input() {
    let len = 5000;
    let left = common::add(&common::bin_tone(5, 256, 0.3, len), &common::noise(3, len));
    let right = common::add(&common::bin_tone(9, 256, 0.3, len), &common::noise(4, len));

    let mut engine = EngineF32::new(EngineConfig::new(256, 4)).unwrap();
    let latency = engine.latency();
    let [out_left, out_right, center] = common::upmix(&mut engine, &left, &right, 97);

    let rebuilt_left = common::add(&out_left, &center);
    let rebuilt_right = common::add(&out_right, &center);
    assert!(common::max_abs_error(&common::delayed(&left, latency), &rebuilt_left) < 1e-6);
    assert!(common::max_abs_error(&common::delayed(&right, latency), &rebuilt_right) < 1e-6);
}

#[test]
fn test_silence_stays_silent() {
    let mut engine = EngineF32::new(EngineConfig::new(512, 4)).unwrap();
    let silence = vec![0.0; 3000];
    let outputs = common::upmix(&mut engine, &silence, &silence, 128);
    for bus in &outputs {
        assert!(bus.iter().all(|&x| x == 0.0));
    }
}

#[test]
fn test_panned_tones_leave_the_center() {
    let frame = 1024;
    let len = 8 * frame;
    let common_tone = common::bin_tone(20, frame, 0.5, len);
    let left_only = common::bin_tone(50, frame, 0.3, len);
    let right_only = common::bin_tone(80, frame, 0.3, len);
    let left = common::add(&common_tone, &left_only);
    let right = common::add(&common_tone, &right_only);

    let mut engine = EngineF32::new(EngineConfig::new(frame, 4)).unwrap();
    let latency = engine.latency();
    let [out_left, out_right, center] = common::upmix(&mut engine, &left, &right, 512);

    // frames that overlap the zero-filled start are not pure tones
    let settled = 2 * frame;
    let check = |name: &str, got: &[f32], source: &[f32]| {
        let expected = common::delayed(source, latency);
        let error = common::max_abs_error(&expected[settled..], &got[settled..]);
        assert!(error < 1e-3, "{}: max error {}", name, error);
    };
    check("center", &center, &common_tone);
    check("left", &out_left, &left_only);
    check("right", &out_right, &right_only);
}

#[test]
fn test_anti_phase_ties_keep_right_channel() {
    // R = -L gives equal energy in every bin
    let len = 1000;
    let left: Vec<f32> = (0..len).map(|i| 0.5 * (i as f32 * 0.37).sin()).collect();
    let right: Vec<f32> = left.iter().map(|x| -x).collect();

    let mut engine = EngineF32::new(EngineConfig::new(64, 4)).unwrap();
    let latency = engine.latency();
    let [out_left, out_right, center] = common::upmix(&mut engine, &left, &right, 100);

    let delayed_left = common::delayed(&left, latency);
    let delayed_right = common::delayed(&right, latency);
    let doubled: Vec<f32> = delayed_left.iter().map(|x| 2.0 * x).collect();

    assert!(common::max_abs_error(&delayed_right, &center) < 1e-5);
    assert!(common::max_abs_error(&doubled, &out_left) < 1e-5);
    assert!(out_right.iter().all(|x| x.abs() < 1e-5));
    assert!(center[latency..].iter().any(|&x| x.abs() > 0.1));
}

#[test]
fn test_swapping_channels_swaps_residuals() {
    let len = 3000;
    let shared = common::bin_tone(7, 128, 0.4, len);
    let left = common::add(&shared, &common::noise(21, len));
    let right = common::add(&shared, &common::noise(22, len));
    let config = EngineConfig::new(128, 4);

    let mut straight = EngineF32::new(config).unwrap();
    let [l1, r1, c1] = common::upmix(&mut straight, &left, &right, 200);
    let mut swapped = EngineF32::new(config).unwrap();
    let [l2, r2, c2] = common::upmix(&mut swapped, &right, &left, 200);

    assert!(common::max_abs_error(&c1, &c2) < 1e-6);
    assert!(common::max_abs_error(&l1, &r2) < 1e-6);
    assert!(common::max_abs_error(&r1, &l2) < 1e-6);
}

#[test]
fn test_symmetric_difference_matches_upmix_residuals() {
    let len = 2500;
    let left = common::noise(31, len);
    let right = common::add(&common::noise(32, len), &left);
    let config = EngineConfig::new(256, 2);

    let mut upmix_engine = EngineF32::new(config).unwrap();
    let [up_left, up_right, _] = common::upmix(&mut upmix_engine, &left, &right, 64);

    let mut engine = EngineF32::new(config).unwrap();
    let (mut diff_left, mut diff_right) = (vec![0.0; len], vec![0.0; len]);
    for start in (0..len).step_by(64) {
        let end = (start + 64).min(len);
        engine.process(
            [&left[start..end], &right[start..end]],
            Output::SymmetricDifference {
                left: &mut diff_left[start..end],
                right: &mut diff_right[start..end],
            },
        );
    }

    assert_eq!(diff_left, up_left);
    assert_eq!(diff_right, up_right);
}
