/*MIT License

Copyright (c) 2025 David Maseda Neira

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

//! The streaming separation engine.

use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::fft_backend::{
    Complex, ComplexToReal, FftNum, FftPlanner, FftPlannerTrait, RealToComplex,
};
use crate::{simd, Effect, EngineConfig, IntersectError, Result};

const LEFT: usize = 0;
const RIGHT: usize = 1;

/// Output buses for one [`Engine::process`] call. The variant selects the effect.
///
/// Every bus must hold at least as many samples as the input block.
pub enum Output<'a, T> {
    Intersect {
        center: &'a mut [T],
    },
    SymmetricDifference {
        left: &'a mut [T],
        right: &'a mut [T],
    },
    Upmix {
        left: &'a mut [T],
        right: &'a mut [T],
        center: &'a mut [T],
    },
}

impl<T> Output<'_, T> {
    pub fn effect(&self) -> Effect {
        match self {
            Output::Intersect { .. } => Effect::Intersect,
            Output::SymmetricDifference { .. } => Effect::SymmetricDifference,
            Output::Upmix { .. } => Effect::Upmix,
        }
    }
}

/// Streaming center extractor for one stereo stream.
///
/// All buffers and both transform plans are created by the constructor; [`process`]
/// never allocates. Output lags the input by [`latency`] samples.
///
/// [`process`]: Engine::process
/// [`latency`]: Engine::latency
pub struct Engine<T: FftNum> {
    config: EngineConfig,
    normalization: T,
    forward: Arc<dyn RealToComplex<T>>,
    inverse: Arc<dyn ComplexToReal<T>>,

    /// Samples of the current hop already ingested, in `[0, hop_size)`.
    deviation: usize,
    cycles_completed: u64,

    /// Most recent `frame_size` raw samples per channel, oldest first.
    input_window: [Vec<T>; 2],
    /// Overlap-add accumulator of the unnormalized center signal.
    center_accum: Vec<T>,
    /// Raw hop paired with the hop of `center_accum` currently being drained.
    residual_hop: [Vec<T>; 2],

    spectrum: [Vec<Complex<T>>; 2],
    selected: Vec<Complex<T>>,
    inverse_result: Vec<T>,
    center_block: Vec<T>,
    fft_scratch: Vec<Complex<T>>,
}

impl<T: FftNum> Engine<T> {
    /// Configure with the default backend of the enabled feature set.
    pub fn new(config: EngineConfig) -> Result<Self>
    where
        FftPlanner<T>: FftPlannerTrait<T>,
    {
        let mut planner = FftPlanner::<T>::new();
        Self::with_planner(config, &mut planner)
    }

    /// Shorthand for `Engine::new(EngineConfig::from_hints(..))`.
    pub fn from_hints(frame_size_hint: f32, overlap_factor_hint: f32) -> Result<Self>
    where
        FftPlanner<T>: FftPlannerTrait<T>,
    {
        Self::new(EngineConfig::from_hints(
            frame_size_hint,
            overlap_factor_hint,
        ))
    }

    /// Configure with plans from `planner`.
    ///
    /// Fails when the buffers for `config.frame_size` cannot be allocated or the backend
    /// cannot plan a transform of that size.
    pub fn with_planner<P: FftPlannerTrait<T>>(config: EngineConfig, planner: &mut P) -> Result<Self> {
        let frame = config.frame_size;
        let hop = config.hop_size;
        debug_assert!(frame >= 2 && frame % 2 == 0);
        debug_assert!(hop >= 1 && hop <= frame);

        let zero = Complex::new(T::zero(), T::zero());
        let bins = config.freq_bins();
        let buffer = |len: usize| zeroed(len, T::zero(), frame);
        let bin_buffer = |len: usize| zeroed(len, zero, frame);

        // Buffers first, so an oversized frame fails before the backend plans it.
        let input_window = [buffer(frame)?, buffer(frame)?];
        let center_accum = buffer(frame)?;
        let residual_hop = [buffer(hop)?, buffer(hop)?];
        let spectrum = [bin_buffer(bins)?, bin_buffer(bins)?];
        let selected = bin_buffer(bins)?;
        let inverse_result = buffer(frame)?;
        let center_block = buffer(hop)?;

        let forward = planner.plan_forward(frame)?;
        let inverse = planner.plan_inverse(frame)?;
        let fft_scratch = bin_buffer(forward.scratch_len().max(inverse.scratch_len()))?;

        log::debug!(
            "configured {} engine: frame_size={} overlap_factor={} hop_size={}",
            planner.name(),
            frame,
            config.overlap_factor,
            hop
        );

        Ok(Self {
            config,
            // 1 / (frame * overlap) lies in (0, 0.5], which f32 and f64 both represent; a
            // custom FftNum that cannot would mute every bus
            normalization: T::from_f64(config.normalization_factor).unwrap_or_else(T::zero),
            forward,
            inverse,
            deviation: 0,
            cycles_completed: 0,
            input_window,
            center_accum,
            residual_hop,
            spectrum,
            selected,
            inverse_result,
            center_block,
            fft_scratch,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Algorithmic delay in samples, always `frame_size`.
    pub fn latency(&self) -> usize {
        self.config.frame_size
    }

    /// Number of analysis/resynthesis cycles run since configuration or the last reset.
    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }

    /// Input samples buffered toward the next hop boundary.
    pub fn pending_samples(&self) -> usize {
        self.deviation
    }

    /// Return to the freshly configured state, keeping buffers and plans.
    pub fn reset(&mut self) {
        let zero = Complex::new(T::zero(), T::zero());
        for channel in [LEFT, RIGHT] {
            self.input_window[channel].fill(T::zero());
            self.residual_hop[channel].fill(T::zero());
            self.spectrum[channel].fill(zero);
        }
        self.center_accum.fill(T::zero());
        self.selected.fill(zero);
        self.inverse_result.fill(T::zero());
        self.center_block.fill(T::zero());
        self.deviation = 0;
        self.cycles_completed = 0;
    }

    /// Consume `input[0].len()` samples per channel and write as many samples to every bus
    /// of `output`.
    ///
    /// The block length is arbitrary; splitting a stream into blocks differently gives
    /// bit-identical output. An empty block does nothing.
    pub fn process(&mut self, input: [&[T]; 2], mut output: Output<'_, T>) {
        let sample_count = input[LEFT].len();
        debug_assert_eq!(
            input[RIGHT].len(),
            sample_count,
            "left and right blocks differ in length"
        );

        let frame = self.config.frame_size;
        let hop = self.config.hop_size;
        let mut offset = 0;

        while offset < sample_count {
            let block = (sample_count - offset).min(hop - self.deviation);
            let bus = offset..offset + block;
            let pending = self.deviation..self.deviation + block;

            let center = &mut self.center_block[..block];
            simd::scale_into(&self.center_accum[pending.clone()], self.normalization, center);

            match &mut output {
                Output::Intersect { center: center_bus } => {
                    center_bus[bus.clone()].copy_from_slice(center);
                }
                Output::SymmetricDifference { left, right } => {
                    simd::subtract_into(
                        &self.residual_hop[LEFT][pending.clone()],
                        center,
                        &mut left[bus.clone()],
                    );
                    simd::subtract_into(
                        &self.residual_hop[RIGHT][pending.clone()],
                        center,
                        &mut right[bus.clone()],
                    );
                }
                Output::Upmix {
                    left,
                    right,
                    center: center_bus,
                } => {
                    simd::subtract_into(
                        &self.residual_hop[LEFT][pending.clone()],
                        center,
                        &mut left[bus.clone()],
                    );
                    simd::subtract_into(
                        &self.residual_hop[RIGHT][pending.clone()],
                        center,
                        &mut right[bus.clone()],
                    );
                    center_bus[bus.clone()].copy_from_slice(center);
                }
            }

            let tail = frame - hop + self.deviation;
            for channel in [LEFT, RIGHT] {
                self.input_window[channel][tail..tail + block]
                    .copy_from_slice(&input[channel][bus.clone()]);
            }

            self.deviation += block;
            if self.deviation == hop {
                self.analyze_and_resynthesize();
                self.deviation = 0;
            }

            offset += block;
        }
    }

    /// One hop-boundary cycle. Depends only on `input_window` (plus the accumulator it adds
    /// into).
    fn analyze_and_resynthesize(&mut self) {
        let frame = self.config.frame_size;
        let hop = self.config.hop_size;

        // The oldest hop has left the analysis window.
        self.center_accum.copy_within(hop.., 0);
        self.center_accum[frame - hop..].fill(T::zero());

        for channel in [LEFT, RIGHT] {
            self.forward.process(
                &self.input_window[channel],
                &mut self.spectrum[channel],
                &mut self.fft_scratch,
            );
        }

        select_quieter_bins(
            &self.spectrum[LEFT],
            &self.spectrum[RIGHT],
            &mut self.selected,
        );

        self.inverse.process(
            &self.selected,
            &mut self.inverse_result,
            &mut self.fft_scratch,
        );
        simd::accumulate(&self.inverse_result, &mut self.center_accum);

        for channel in [LEFT, RIGHT] {
            self.residual_hop[channel].copy_from_slice(&self.input_window[channel][..hop]);
            self.input_window[channel].copy_within(hop.., 0);
        }

        self.cycles_completed += 1;
    }
}

/// A zero-filled buffer of `len` elements, or `AllocationFailed` for `frame_size`.
fn zeroed<V: Clone>(len: usize, value: V, frame_size: usize) -> Result<Vec<V>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| IntersectError::AllocationFailed { frame_size })?;
    buffer.resize(len, value);
    Ok(buffer)
}

/// Keep, per bin, whichever channel has less energy. Ties keep the right bin.
fn select_quieter_bins<T: FftNum>(
    left: &[Complex<T>],
    right: &[Complex<T>],
    selected: &mut [Complex<T>],
) {
    debug_assert_eq!(left.len(), right.len());
    debug_assert_eq!(left.len(), selected.len());

    for ((out, l), r) in selected.iter_mut().zip(left).zip(right) {
        *out = if l.norm_sqr() < r.norm_sqr() { *l } else { *r };
    }
}

#[cfg(all(test, feature = "rustfft-backend"))]
mod tests {
    use super::*;

    fn engine(frame: usize, overlap: usize) -> Engine<f64> {
        Engine::new(EngineConfig::new(frame, overlap)).unwrap()
    }

    #[test]
    fn test_select_quieter_bins() {
        let left = [
            Complex::new(1.0, 0.0),
            Complex::new(0.0, 0.1),
            Complex::new(3.0, 4.0),
        ];
        let right = [
            Complex::new(0.0, -2.0),
            Complex::new(0.5, 0.0),
            Complex::new(-4.0, 3.0),
        ];
        let mut selected = [Complex::new(0.0, 0.0); 3];
        select_quieter_bins(&left, &right, &mut selected);

        assert_eq!(selected[0], left[0]);
        assert_eq!(selected[1], left[1]);
        // equal energy keeps right
        assert_eq!(selected[2], right[2]);

        select_quieter_bins(&right, &left, &mut selected);
        assert_eq!(selected[0], left[0]);
        assert_eq!(selected[1], left[1]);
        assert_eq!(selected[2], left[2]);
    }

    #[test]
    fn test_normalization_converted_for_both_sample_types() {
        let narrow = Engine::<f32>::new(EngineConfig::new(1024, 4)).unwrap();
        assert_eq!(narrow.normalization, 1.0 / 4096.0);
        let wide = engine(6, 3);
        assert_eq!(wide.normalization, 1.0 / 18.0);
    }

    #[test]
    fn test_window_holds_latest_frame_at_boundary() {
        let mut engine = engine(8, 2);
        let input: Vec<f64> = (1..=12).map(|i| i as f64).collect();
        let mut center = vec![0.0; 12];
        engine.process(
            [&input[..], &input[..]],
            Output::Intersect {
                center: &mut center,
            },
        );

        assert_eq!(engine.cycles_completed(), 3);
        assert_eq!(engine.pending_samples(), 0);
        // oldest hop of the last analysed frame (values 5..=12)
        assert_eq!(engine.residual_hop[LEFT], vec![5.0, 6.0, 7.0, 8.0]);
        // slid window keeps samples 9..=12 at its head
        assert_eq!(&engine.input_window[RIGHT][..4], &[9.0, 10.0, 11.0, 12.0]);
    }

    #[test]
    fn test_partial_hop_only_buffers() {
        let mut engine = engine(16, 4);
        let input = vec![0.25; 3];
        let mut center = vec![1.0; 3];
        engine.process(
            [&input[..], &input[..]],
            Output::Intersect {
                center: &mut center,
            },
        );
        assert_eq!(engine.pending_samples(), 3);
        assert_eq!(engine.cycles_completed(), 0);
        assert_eq!(center, vec![0.0; 3]);
        assert_eq!(&engine.input_window[LEFT][12..15], &[0.25, 0.25, 0.25]);
    }

    #[test]
    fn test_empty_block_is_noop() {
        let mut engine = engine(16, 4);
        let empty: [f64; 0] = [];
        let (mut left, mut right) = ([0.0f64; 0], [0.0f64; 0]);
        engine.process(
            [&empty[..], &empty[..]],
            Output::SymmetricDifference {
                left: &mut left[..],
                right: &mut right[..],
            },
        );
        assert_eq!(engine.pending_samples(), 0);
        assert_eq!(engine.cycles_completed(), 0);
    }

    #[test]
    fn test_effects_share_one_separation() {
        let left: Vec<f64> = (0..50).map(|i| (i as f64 * 0.3).sin()).collect();
        let right: Vec<f64> = (0..50).map(|i| (i as f64 * 0.7).cos()).collect();

        let mut intersect = engine(8, 4);
        let mut center_only = vec![0.0; 50];
        intersect.process(
            [&left[..], &right[..]],
            Output::Intersect {
                center: &mut center_only,
            },
        );

        let mut difference = engine(8, 4);
        let (mut diff_left, mut diff_right) = (vec![0.0; 50], vec![0.0; 50]);
        difference.process(
            [&left[..], &right[..]],
            Output::SymmetricDifference {
                left: &mut diff_left,
                right: &mut diff_right,
            },
        );

        let mut upmix = engine(8, 4);
        let (mut up_left, mut up_right, mut up_center) =
            (vec![0.0; 50], vec![0.0; 50], vec![0.0; 50]);
        upmix.process(
            [&left[..], &right[..]],
            Output::Upmix {
                left: &mut up_left,
                right: &mut up_right,
                center: &mut up_center,
            },
        );

        assert!(center_only.iter().any(|&x| x != 0.0));
        assert_eq!(up_center, center_only);
        assert_eq!(up_left, diff_left);
        assert_eq!(up_right, diff_right);
    }

    #[test]
    fn test_output_effect() {
        let mut a = [0.0f32; 1];
        let mut b = [0.0f32; 1];
        let mut c = [0.0f32; 1];
        assert_eq!(
            Output::Intersect { center: &mut a[..] }.effect(),
            Effect::Intersect
        );
        assert_eq!(
            Output::SymmetricDifference {
                left: &mut a[..],
                right: &mut b[..]
            }
            .effect(),
            Effect::SymmetricDifference
        );
        assert_eq!(
            Output::Upmix {
                left: &mut a[..],
                right: &mut b[..],
                center: &mut c[..]
            }
            .effect(),
            Effect::Upmix
        );
    }
}
