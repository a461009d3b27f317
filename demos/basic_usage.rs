use stereo_intersect::prelude::*;

fn rms(samples: &[f32]) -> f32 {
    (samples.iter().map(|x| x * x).sum::<f32>() / samples.len() as f32).sqrt()
}

fn main() {
    env_logger::init();

    let config = EngineConfig::from_hints(2048.0, 4.0);
    println!("Engine configuration:");
    println!("  Frame size: {}", config.frame_size);
    println!("  Overlap factor: {}", config.overlap_factor);
    println!("  Hop size: {}", config.hop_size);
    println!("  Latency: {} samples", config.latency());
    println!();

    let sample_rate = 44100;
    let num_samples = sample_rate * 2;
    let tone = |freq: f32, i: usize| {
        (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin()
    };

    // a 440 Hz voice in the middle, one instrument hard left, one hard right
    let left: Vec<f32> = (0..num_samples)
        .map(|i| 0.4 * tone(440.0, i) + 0.3 * tone(1250.0, i))
        .collect();
    let right: Vec<f32> = (0..num_samples)
        .map(|i| 0.4 * tone(440.0, i) + 0.3 * tone(3100.0, i))
        .collect();

    let mut engine = EngineF32::new(config).expect("rustfft plans every even frame size");
    let mut out_left = vec![0.0; num_samples];
    let mut out_right = vec![0.0; num_samples];
    let mut out_center = vec![0.0; num_samples];

    // host-sized blocks
    let block = 512;
    for start in (0..num_samples).step_by(block) {
        let end = (start + block).min(num_samples);
        engine.process(
            [&left[start..end], &right[start..end]],
            Output::Upmix {
                left: &mut out_left[start..end],
                right: &mut out_right[start..end],
                center: &mut out_center[start..end],
            },
        );
    }

    println!(
        "Processed {} samples in {} cycles",
        num_samples,
        engine.cycles_completed()
    );

    let settled = 2 * config.frame_size;
    println!("\nRMS after warm-up:");
    println!("  input left:   {:.4}", rms(&left[settled..]));
    println!("  input right:  {:.4}", rms(&right[settled..]));
    println!("  center:       {:.4}", rms(&out_center[settled..]));
    println!("  left only:    {:.4}", rms(&out_left[settled..]));
    println!("  right only:   {:.4}", rms(&out_right[settled..]));

    let interleaved = interleave(&[&out_left[..], &out_right[..], &out_center[..]]);
    println!("\nInterleaved 3-channel output: {} samples", interleaved.len());
}
