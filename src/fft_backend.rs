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

//! Real-input FFT backend abstraction
//!
//! The engine only needs two operations: a forward transform of `n` real samples into
//! `n / 2 + 1` complex bins, and the matching inverse. Both are unnormalized. Backends:
//! - `rustfft`: any even size, std only (default)
//! - `microfft`: power-of-two sizes up to 4096, `f32` only, no_std compatible
//!
//! Exactly one backend is selected through feature flags. Custom backends (for example a
//! counting wrapper in tests) can be injected with [`crate::Engine::with_planner`].

use alloc::sync::Arc;
use core::fmt::Debug;

use num_traits::{Float, FromPrimitive};

use crate::IntersectError;

pub use num_complex::Complex;

/// Sample type accepted by the engine and the backends.
#[cfg(feature = "rustfft-backend")]
pub trait FftNum: Float + FromPrimitive + rustfft::FftNum + Debug + Send + Sync + 'static {}

#[cfg(not(feature = "rustfft-backend"))]
pub trait FftNum: Float + FromPrimitive + Debug + Send + Sync + 'static {}

impl FftNum for f32 {}
impl FftNum for f64 {}

/// Forward transform: `len()` real samples in, `len() / 2 + 1` complex bins out.
pub trait RealToComplex<T: FftNum>: Send + Sync {
    /// `scratch` must hold at least [`scratch_len`](Self::scratch_len) elements.
    fn process(&self, input: &[T], output: &mut [Complex<T>], scratch: &mut [Complex<T>]);

    fn len(&self) -> usize;

    fn scratch_len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Inverse transform: `len() / 2 + 1` complex bins in, `len()` real samples out.
///
/// The imaginary parts of the DC and Nyquist bins are ignored.
pub trait ComplexToReal<T: FftNum>: Send + Sync {
    fn process(&self, input: &[Complex<T>], output: &mut [T], scratch: &mut [Complex<T>]);

    fn len(&self) -> usize;

    fn scratch_len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Creates forward and inverse plans of a given size.
pub trait FftPlannerTrait<T: FftNum> {
    fn new() -> Self
    where
        Self: Sized;

    /// Short backend name, used in logs and errors.
    fn name(&self) -> &'static str;

    fn plan_forward(&mut self, size: usize) -> Result<Arc<dyn RealToComplex<T>>, IntersectError>;

    fn plan_inverse(&mut self, size: usize) -> Result<Arc<dyn ComplexToReal<T>>, IntersectError>;
}

/// Expand the `n / 2 + 1` bins of `half` into the full Hermitian spectrum of length
/// `n = buffer.len()`. The imaginary parts of DC and Nyquist are dropped.
fn mirror_half_spectrum<T: FftNum>(half: &[Complex<T>], buffer: &mut [Complex<T>]) {
    let n = buffer.len();
    let bins = n / 2 + 1;
    debug_assert_eq!(half.len(), bins);

    buffer[..bins].copy_from_slice(half);
    buffer[0].im = T::zero();
    buffer[n / 2].im = T::zero();
    for bin in 1..n / 2 {
        buffer[n - bin] = half[bin].conj();
    }
}

// ============================================================================
// RustFFT Backend Implementation (for std environments)
// ============================================================================

#[cfg(feature = "rustfft-backend")]
mod rustfft_impl {
    use super::*;
    use rustfft::{Fft, FftPlanner as RustFftPlanner};

    /// Real forward transform on top of a full-size complex plan.
    struct RustFftForward<T: FftNum> {
        fft: Arc<dyn Fft<T>>,
        inplace_scratch: usize,
    }

    impl<T: FftNum> RealToComplex<T> for RustFftForward<T> {
        fn process(&self, input: &[T], output: &mut [Complex<T>], scratch: &mut [Complex<T>]) {
            let n = self.fft.len();
            debug_assert_eq!(input.len(), n);
            debug_assert_eq!(output.len(), n / 2 + 1);

            let (buffer, rest) = scratch.split_at_mut(n);
            for (slot, &sample) in buffer.iter_mut().zip(input) {
                *slot = Complex::new(sample, T::zero());
            }

            self.fft
                .process_with_scratch(buffer, &mut rest[..self.inplace_scratch]);
            output.copy_from_slice(&buffer[..n / 2 + 1]);
        }

        fn len(&self) -> usize {
            self.fft.len()
        }

        fn scratch_len(&self) -> usize {
            self.fft.len() + self.inplace_scratch
        }
    }

    /// Real inverse transform: rebuilds the Hermitian spectrum, runs the complex plan and
    /// keeps the real part.
    struct RustFftInverse<T: FftNum> {
        fft: Arc<dyn Fft<T>>,
        inplace_scratch: usize,
    }

    impl<T: FftNum> ComplexToReal<T> for RustFftInverse<T> {
        fn process(&self, input: &[Complex<T>], output: &mut [T], scratch: &mut [Complex<T>]) {
            let n = self.fft.len();
            debug_assert_eq!(output.len(), n);

            let (buffer, rest) = scratch.split_at_mut(n);
            mirror_half_spectrum(input, buffer);

            self.fft
                .process_with_scratch(buffer, &mut rest[..self.inplace_scratch]);
            for (sample, value) in output.iter_mut().zip(buffer.iter()) {
                *sample = value.re;
            }
        }

        fn len(&self) -> usize {
            self.fft.len()
        }

        fn scratch_len(&self) -> usize {
            self.fft.len() + self.inplace_scratch
        }
    }

    /// FFT planner using rustfft
    pub struct FftPlanner<T: FftNum> {
        planner: RustFftPlanner<T>,
    }

    impl<T: FftNum> FftPlanner<T> {
        fn check_size(&self, size: usize) -> Result<(), IntersectError> {
            if size < 2 || size % 2 != 0 {
                return Err(IntersectError::UnsupportedFrameSize {
                    backend: "rustfft",
                    frame_size: size,
                });
            }
            Ok(())
        }
    }

    impl<T: FftNum> FftPlannerTrait<T> for FftPlanner<T> {
        fn new() -> Self {
            Self {
                planner: RustFftPlanner::new(),
            }
        }

        fn name(&self) -> &'static str {
            "rustfft"
        }

        fn plan_forward(
            &mut self,
            size: usize,
        ) -> Result<Arc<dyn RealToComplex<T>>, IntersectError> {
            self.check_size(size)?;
            let fft = self.planner.plan_fft_forward(size);
            let inplace_scratch = fft.get_inplace_scratch_len();
            Ok(Arc::new(RustFftForward {
                fft,
                inplace_scratch,
            }))
        }

        fn plan_inverse(
            &mut self,
            size: usize,
        ) -> Result<Arc<dyn ComplexToReal<T>>, IntersectError> {
            self.check_size(size)?;
            let fft = self.planner.plan_fft_inverse(size);
            let inplace_scratch = fft.get_inplace_scratch_len();
            Ok(Arc::new(RustFftInverse {
                fft,
                inplace_scratch,
            }))
        }
    }
}

#[cfg(feature = "rustfft-backend")]
pub use rustfft_impl::FftPlanner;

// ============================================================================
// MicroFFT Backend Implementation (for no_std environments)
// ============================================================================

#[cfg(feature = "microfft-backend")]
mod microfft_impl {
    use super::*;

    const MAX_SIZE: usize = 4096;

    /// Runs the in-place complex FFT matching the buffer length.
    macro_rules! cfft_dispatch {
        ($buffer:expr, $($size:literal => $func:ident),+ $(,)?) => {
            match $buffer.len() {
                $(
                    $size => {
                        if let Ok(array) = <&mut [Complex<f32>; $size]>::try_from(&mut $buffer[..]) {
                            let _ = microfft::complex::$func(array);
                        }
                    }
                )+
                other => unreachable!("microfft plan created for unsupported size {}", other),
            }
        };
    }

    fn cfft_in_place(buffer: &mut [Complex<f32>]) {
        cfft_dispatch!(
            buffer,
            2 => cfft_2,
            4 => cfft_4,
            8 => cfft_8,
            16 => cfft_16,
            32 => cfft_32,
            64 => cfft_64,
            128 => cfft_128,
            256 => cfft_256,
            512 => cfft_512,
            1024 => cfft_1024,
            2048 => cfft_2048,
            4096 => cfft_4096,
        );
    }

    struct MicroFftForward {
        size: usize,
    }

    impl RealToComplex<f32> for MicroFftForward {
        fn process(&self, input: &[f32], output: &mut [Complex<f32>], scratch: &mut [Complex<f32>]) {
            let buffer = &mut scratch[..self.size];
            for (slot, &sample) in buffer.iter_mut().zip(input) {
                *slot = Complex::new(sample, 0.0);
            }
            cfft_in_place(buffer);
            output.copy_from_slice(&buffer[..self.size / 2 + 1]);
        }

        fn len(&self) -> usize {
            self.size
        }

        fn scratch_len(&self) -> usize {
            self.size
        }
    }

    /// microfft has no inverse: IFFT(x) = conj(FFT(conj(x))), left unscaled.
    struct MicroFftInverse {
        size: usize,
    }

    impl ComplexToReal<f32> for MicroFftInverse {
        fn process(&self, input: &[Complex<f32>], output: &mut [f32], scratch: &mut [Complex<f32>]) {
            let buffer = &mut scratch[..self.size];
            mirror_half_spectrum(input, buffer);
            for value in buffer.iter_mut() {
                value.im = -value.im;
            }
            cfft_in_place(buffer);
            // conj only flips the imaginary part, which is discarded here
            for (sample, value) in output.iter_mut().zip(buffer.iter()) {
                *sample = value.re;
            }
        }

        fn len(&self) -> usize {
            self.size
        }

        fn scratch_len(&self) -> usize {
            self.size
        }
    }

    /// FFT planner for microfft (no actual planning needed, just validates the size)
    pub struct FftPlanner<T: FftNum> {
        _phantom: core::marker::PhantomData<T>,
    }

    fn check_size(size: usize) -> Result<(), IntersectError> {
        if !size.is_power_of_two() || !(2..=MAX_SIZE).contains(&size) {
            return Err(IntersectError::UnsupportedFrameSize {
                backend: "microfft",
                frame_size: size,
            });
        }
        Ok(())
    }

    impl FftPlannerTrait<f32> for FftPlanner<f32> {
        fn new() -> Self {
            Self {
                _phantom: core::marker::PhantomData,
            }
        }

        fn name(&self) -> &'static str {
            "microfft"
        }

        fn plan_forward(
            &mut self,
            size: usize,
        ) -> Result<Arc<dyn RealToComplex<f32>>, IntersectError> {
            check_size(size)?;
            Ok(Arc::new(MicroFftForward { size }))
        }

        fn plan_inverse(
            &mut self,
            size: usize,
        ) -> Result<Arc<dyn ComplexToReal<f32>>, IntersectError> {
            check_size(size)?;
            Ok(Arc::new(MicroFftInverse { size }))
        }
    }
}

#[cfg(feature = "microfft-backend")]
pub use microfft_impl::FftPlanner;

// Ensure at least one backend is enabled
#[cfg(not(any(feature = "rustfft-backend", feature = "microfft-backend")))]
compile_error!("At least one FFT backend must be enabled: 'rustfft-backend' or 'microfft-backend'");

// Ensure both backends are not enabled at the same time
#[cfg(all(feature = "rustfft-backend", feature = "microfft-backend"))]
compile_error!("Cannot enable both 'rustfft-backend' and 'microfft-backend' at the same time. Choose one.");
