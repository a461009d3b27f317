/// Conversions between interleaved frames (`[L, R, L, R, ...]`, as stored in audio files)
/// and the per-channel slices the engine works on.
use alloc::vec::Vec;

use num_traits::Float;

/// Split interleaved audio into `num_channels` separate channels.
///
/// # Panics
///
/// Panics if `num_channels` is 0 or if `data.len()` is not a multiple of it.
///
/// # Example
///
/// ```
/// use stereo_intersect::deinterleave;
///
/// let channels = deinterleave(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2);
/// assert_eq!(channels[0], vec![1.0, 3.0, 5.0]);
/// assert_eq!(channels[1], vec![2.0, 4.0, 6.0]);
/// ```
pub fn deinterleave<T: Float>(data: &[T], num_channels: usize) -> Vec<Vec<T>> {
    let mut channels = alloc::vec![Vec::new(); num_channels];
    deinterleave_into(data, &mut channels);
    channels
}

/// Split interleaved audio into pre-allocated channel buffers, one per channel.
///
/// Every buffer is cleared first; capacity is reused.
///
/// # Panics
///
/// Panics if `output` is empty or if `data.len()` is not a multiple of `output.len()`.
pub fn deinterleave_into<T: Float>(data: &[T], output: &mut [Vec<T>]) {
    let num_channels = output.len();
    assert!(num_channels > 0, "num_channels must be greater than 0");
    assert_eq!(
        data.len() % num_channels,
        0,
        "data length ({}) must be divisible by num_channels ({})",
        data.len(),
        num_channels
    );

    let frames = data.len() / num_channels;
    for channel in output.iter_mut() {
        channel.clear();
        channel.reserve(frames);
    }

    for frame in data.chunks_exact(num_channels) {
        for (channel, &sample) in output.iter_mut().zip(frame) {
            channel.push(sample);
        }
    }
}

/// Interleave equally long channels into one buffer.
///
/// # Panics
///
/// Panics if `channels` is empty or the channels differ in length.
///
/// # Example
///
/// ```
/// use stereo_intersect::interleave;
///
/// let left = [1.0, 3.0, 5.0];
/// let right = [2.0, 4.0, 6.0];
/// assert_eq!(interleave(&[&left[..], &right[..]]), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
/// ```
pub fn interleave<T: Float>(channels: &[&[T]]) -> Vec<T> {
    let mut output = Vec::new();
    interleave_into(channels, &mut output);
    output
}

/// Interleave into a reusable buffer, which is cleared first.
///
/// # Panics
///
/// Panics if `channels` is empty or the channels differ in length.
pub fn interleave_into<T: Float>(channels: &[&[T]], output: &mut Vec<T>) {
    assert!(!channels.is_empty(), "channels must not be empty");

    let frames = channels[0].len();
    for (i, channel) in channels.iter().enumerate() {
        assert_eq!(
            channel.len(),
            frames,
            "Channel {} has length {}, expected {}",
            i,
            channel.len(),
            frames
        );
    }

    output.clear();
    output.reserve(frames * channels.len());
    for frame in 0..frames {
        output.extend(channels.iter().map(|channel| channel[frame]));
    }
}
