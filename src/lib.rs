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

//! Streaming stereo center extraction.
//!
//! Left and right are analysed with an STFT (rectangular window, fixed hop). For every
//! frequency bin the quieter of the two channels is kept, which approximates the content
//! present in both channels. Overlap-add resynthesis of the selected bins gives the center
//! signal; subtracting it from each raw channel gives the residuals.
//!
//! ```
//! use stereo_intersect::prelude::*;
//!
//! let config = EngineConfig::from_hints(1024.0, 4.0);
//! let mut engine = EngineF32::new(config).unwrap();
//!
//! let left = vec![0.0f32; 300];
//! let right = vec![0.0f32; 300];
//! let mut center = vec![0.0f32; 300];
//! engine.process([&left[..], &right[..]], Output::Intersect { center: &mut center });
//!
//! assert_eq!(engine.latency(), 1024);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

use thiserror::Error;

pub mod engine;
pub mod fft_backend;
pub mod host;
pub mod simd;
pub mod utils;

pub use engine::{Engine, Output};
pub use fft_backend::{
    Complex, ComplexToReal, FftNum, FftPlanner, FftPlannerTrait, RealToComplex,
};
pub use utils::{deinterleave, deinterleave_into, interleave, interleave_into};

pub mod prelude {
    pub use crate::{
        Effect, Engine, EngineConfig, EngineF32, EngineF64, HintRounding, IntersectError, Output,
        deinterleave, deinterleave_into, interleave, interleave_into,
    };
}

pub type EngineF32 = Engine<f32>;
pub type EngineF64 = Engine<f64>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntersectError {
    #[error("{backend} backend cannot plan a transform of {frame_size} samples")]
    UnsupportedFrameSize {
        backend: &'static str,
        frame_size: usize,
    },

    #[error("cannot allocate buffers for a frame of {frame_size} samples")]
    AllocationFailed { frame_size: usize },

    #[error("instance is not activated")]
    NotActivated,

    #[error("{effect:?} writes {expected} output buses, got {actual}")]
    OutputBusCount {
        effect: Effect,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = core::result::Result<T, IntersectError>;

/// What the engine writes to its output buses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    /// The extracted center alone.
    Intersect,

    /// Left and right with the center removed.
    SymmetricDifference,

    /// Both residuals plus the center.
    Upmix,
}

impl Effect {
    pub const ALL: [Effect; 3] = [
        Effect::Intersect,
        Effect::SymmetricDifference,
        Effect::Upmix,
    ];

    pub fn output_count(self) -> usize {
        match self {
            Effect::Intersect => 1,
            Effect::SymmetricDifference => 2,
            Effect::Upmix => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Effect::Intersect => "Intersect",
            Effect::SymmetricDifference => "SymmetricDifference",
            Effect::Upmix => "Upmix",
        }
    }
}

/// How fractional hints are turned into integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HintRounding {
    /// `hint + 0.5`, truncated.
    #[default]
    Nearest,

    /// Plain truncation.
    Floor,
}

impl HintRounding {
    /// Resolve a hint to an integer `>= 1`. NaN and anything below one resolve to one.
    fn resolve(self, hint: f32) -> usize {
        let value = match self {
            HintRounding::Nearest => hint + 0.5,
            HintRounding::Floor => hint,
        };
        if value >= 1.0 {
            // saturating cast
            value as usize
        } else {
            1
        }
    }
}

/// Fixed engine parameters, derived once per activation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Even, at least 2. Also the reported latency.
    pub frame_size: usize,
    /// In `[1, frame_size]`.
    pub overlap_factor: usize,
    /// `frame_size / overlap_factor`.
    pub hop_size: usize,
    /// `1 / (frame_size * overlap_factor)`: undoes the unnormalized transform pair and the
    /// `overlap_factor` frames summed into every output sample.
    pub normalization_factor: f64,
}

impl EngineConfig {
    /// Derive parameters from raw host hints, rounding to nearest.
    pub fn from_hints(frame_size_hint: f32, overlap_factor_hint: f32) -> Self {
        Self::from_hints_with(frame_size_hint, overlap_factor_hint, HintRounding::Nearest)
    }

    pub fn from_hints_with(
        frame_size_hint: f32,
        overlap_factor_hint: f32,
        rounding: HintRounding,
    ) -> Self {
        let config = Self::new(
            rounding.resolve(frame_size_hint),
            rounding.resolve(overlap_factor_hint),
        );
        log::debug!(
            "hints (frame {}, overlap {}) resolved to frame_size={} overlap_factor={} hop_size={}",
            frame_size_hint,
            overlap_factor_hint,
            config.frame_size,
            config.overlap_factor,
            config.hop_size
        );
        config
    }

    /// Build from integer parameters. Out-of-range values are clamped, never rejected.
    ///
    /// There is no upper bound on the frame size; an engine that cannot allocate it fails
    /// to configure instead.
    pub fn new(frame_size: usize, overlap_factor: usize) -> Self {
        let mut frame = frame_size.max(1);
        if frame % 2 != 0 {
            // usize::MAX has no even successor
            frame = frame.checked_add(1).unwrap_or(frame - 1);
        }
        let overlap = overlap_factor.clamp(1, frame);
        if frame != frame_size || overlap != overlap_factor {
            log::debug!(
                "clamped frame_size {} -> {}, overlap_factor {} -> {}",
                frame_size,
                frame,
                overlap_factor,
                overlap
            );
        }

        Self {
            frame_size: frame,
            overlap_factor: overlap,
            hop_size: frame / overlap,
            normalization_factor: 1.0 / (frame as f64 * overlap as f64),
        }
    }

    /// Default: 4096 frame, overlap 4 (1024 hop)
    pub fn default_4096() -> Self {
        Self::new(4096, 4)
    }

    pub fn freq_bins(&self) -> usize {
        self.frame_size / 2 + 1
    }

    /// Algorithmic delay in samples.
    pub fn latency(&self) -> usize {
        self.frame_size
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::default_4096()
    }
}
