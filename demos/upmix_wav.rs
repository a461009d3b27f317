//! Split a stereo WAV file into left, right and center channels.
//!
//! Usage: cargo run --example upmix_wav -- input.wav output.wav [frame_size] [overlap_factor]
//!
//! The output is a 3-channel float WAV (left residual, right residual, center), shifted back
//! by the engine latency so it lines up with the input.

use stereo_intersect::host::{self, Instance, Port};
use stereo_intersect::prelude::*;

const BLOCK: usize = 1024;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!(
            "Usage: {} <input.wav> <output.wav> [frame_size] [overlap_factor]",
            args[0]
        );
        std::process::exit(1);
    }
    let input_path = &args[1];
    let output_path = &args[2];
    let frame_size_hint: f32 = args.get(3).map(|s| s.parse()).transpose()?.unwrap_or(4096.0);
    let overlap_hint: f32 = args.get(4).map(|s| s.parse()).transpose()?.unwrap_or(4.0);

    let mut reader = hound::WavReader::open(input_path)?;
    let spec = reader.spec();
    println!(
        "Input: {} Hz, {} channels, {:?}",
        spec.sample_rate, spec.channels, spec.sample_format
    );
    if spec.channels != 2 {
        eprintln!("Expected a stereo file, got {} channels", spec.channels);
        std::process::exit(1);
    }

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 * scale))
                .collect::<Result<_, _>>()?
        }
    };

    let mut channels = deinterleave(&samples, 2);
    let num_frames = channels[0].len();

    let descriptor = host::descriptor_by_uri(&format!("{}#Upmix", host::PLUGIN_URI))
        .ok_or("Upmix descriptor missing")?;
    let mut plugin = Instance::new(descriptor);
    plugin.set_control(Port::FrameSize, frame_size_hint);
    plugin.set_control(Port::OverlapFactor, overlap_hint);
    plugin.activate()?;
    let latency = plugin.latency().unwrap_or(0);

    // flush the engine with silence so the tail comes out
    for channel in channels.iter_mut() {
        channel.resize(num_frames + latency, 0.0);
    }
    let total = num_frames + latency;

    let mut outputs = [vec![0.0; total], vec![0.0; total], vec![0.0; total]];
    let start_time = std::time::Instant::now();
    for start in (0..total).step_by(BLOCK) {
        let end = (start + BLOCK).min(total);
        let [left, right, center] = &mut outputs;
        let mut buses = [
            &mut left[start..end],
            &mut right[start..end],
            &mut center[start..end],
        ];
        plugin.run(
            [&channels[0][start..end], &channels[1][start..end]],
            &mut buses,
            None,
        )?;
    }
    let elapsed = start_time.elapsed();
    let seconds = num_frames as f32 / spec.sample_rate as f32;
    println!(
        "Processed {:.2}s in {:.3}s ({:.1}x realtime)",
        seconds,
        elapsed.as_secs_f32(),
        seconds / elapsed.as_secs_f32().max(f32::EPSILON)
    );

    let [left, right, center] = &outputs;
    let interleaved = interleave(&[
        &left[latency..],
        &right[latency..],
        &center[latency..],
    ]);

    let out_spec = hound::WavSpec {
        channels: 3,
        sample_rate: spec.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(output_path, out_spec)?;
    for sample in interleaved {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    println!("Saved to {}", output_path);
    Ok(())
}
