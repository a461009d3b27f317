/// Common test utilities
use stereo_intersect::prelude::*;

#[allow(dead_code)]
pub fn calculate_snr(original: &[f32], reconstructed: &[f32]) -> f32 {
    assert_eq!(original.len(), reconstructed.len());

    let signal_power: f32 = original.iter().map(|x| x.powi(2)).sum();
    let noise_power: f32 = original
        .iter()
        .zip(reconstructed.iter())
        .map(|(o, r)| (o - r).powi(2))
        .sum();

    if noise_power == 0.0 {
        f32::INFINITY
    } else {
        10.0 * (signal_power / noise_power).log10()
    }
}

#[allow(dead_code)]
pub fn max_abs_error(original: &[f32], reconstructed: &[f32]) -> f32 {
    original
        .iter()
        .zip(reconstructed.iter())
        .map(|(o, r)| (o - r).abs())
        .max_by(|a, b| a.partial_cmp(b).unwrap())
        .unwrap_or(0.0)
}

/// Sine with exactly `cycles` periods per `period` samples, so every frame of that length
/// holds it in a single bin.
#[allow(dead_code)]
pub fn bin_tone(cycles: usize, period: usize, amplitude: f32, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| {
            let phase = 2.0 * std::f64::consts::PI * (cycles * i) as f64 / period as f64;
            amplitude * phase.sin() as f32
        })
        .collect()
}

/// Deterministic pseudo-noise in [-0.5, 0.5).
#[allow(dead_code)]
pub fn noise(seed: u32, len: usize) -> Vec<f32> {
    let mut state = seed.wrapping_mul(2654435761).wrapping_add(1);
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as f32 / u32::MAX as f32 - 0.5
        })
        .collect()
}

#[allow(dead_code)]
pub fn add(a: &[f32], b: &[f32]) -> Vec<f32> {
    a.iter().zip(b).map(|(x, y)| x + y).collect()
}

/// `signal` shifted right by `delay` samples, zero-filled, same length.
#[allow(dead_code)]
pub fn delayed(signal: &[f32], delay: usize) -> Vec<f32> {
    let mut out = vec![0.0; signal.len()];
    if delay < signal.len() {
        out[delay..].copy_from_slice(&signal[..signal.len() - delay]);
    }
    out
}

/// Run a whole signal through an Upmix engine in `block`-sized calls.
#[allow(dead_code)]
pub fn upmix(
    engine: &mut EngineF32,
    left: &[f32],
    right: &[f32],
    block: usize,
) -> [Vec<f32>; 3] {
    let len = left.len();
    let mut out = [vec![0.0; len], vec![0.0; len], vec![0.0; len]];
    let [out_left, out_right, out_center] = &mut out;

    let mut start = 0;
    while start < len {
        let end = (start + block).min(len);
        engine.process(
            [&left[start..end], &right[start..end]],
            Output::Upmix {
                left: &mut out_left[start..end],
                right: &mut out_right[start..end],
                center: &mut out_center[start..end],
            },
        );
        start = end;
    }
    out
}
