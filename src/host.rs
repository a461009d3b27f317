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

//! Plugin-style wiring around [`Engine`].
//!
//! Three descriptors (one per [`Effect`]) share one engine implementation. An [`Instance`]
//! owns the two control hints, builds a fresh engine on every activation and reports the
//! latency after every run, the way a plugin host expects.

use crate::fft_backend::{FftPlanner, FftPlannerTrait};
use crate::{Effect, Engine, EngineConfig, IntersectError, Output, Result};

pub const PLUGIN_URI: &str = "https://sami.boukortt.com/plugins/intersect";

pub const DEFAULT_FRAME_SIZE_HINT: f32 = 4096.0;
pub const DEFAULT_OVERLAP_FACTOR_HINT: f32 = 4.0;

/// Port indices shared by all descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Port {
    FrameSize = 0,
    OverlapFactor = 1,
    InputLeft = 2,
    InputRight = 3,
    Latency = 4,
    OutputLeft = 5,
    OutputRight = 6,
    OutputCenter = 7,
}

impl Port {
    pub const ALL: [Port; 8] = [
        Port::FrameSize,
        Port::OverlapFactor,
        Port::InputLeft,
        Port::InputRight,
        Port::Latency,
        Port::OutputLeft,
        Port::OutputRight,
        Port::OutputCenter,
    ];

    pub fn from_index(index: u32) -> Option<Port> {
        Port::ALL.get(index as usize).copied()
    }

    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn is_control(self) -> bool {
        matches!(self, Port::FrameSize | Port::OverlapFactor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    pub uri: &'static str,
    pub effect: Effect,
}

pub static DESCRIPTORS: [Descriptor; 3] = [
    Descriptor {
        uri: "https://sami.boukortt.com/plugins/intersect#Intersect",
        effect: Effect::Intersect,
    },
    Descriptor {
        uri: "https://sami.boukortt.com/plugins/intersect#SymmetricDifference",
        effect: Effect::SymmetricDifference,
    },
    Descriptor {
        uri: "https://sami.boukortt.com/plugins/intersect#Upmix",
        effect: Effect::Upmix,
    },
];

/// Descriptor lookup by index; `None` past the end of the table.
pub fn descriptor(index: usize) -> Option<&'static Descriptor> {
    DESCRIPTORS.get(index)
}

pub fn descriptor_by_uri(uri: &str) -> Option<&'static Descriptor> {
    DESCRIPTORS.iter().find(|descriptor| descriptor.uri == uri)
}

/// One plugin instance.
pub struct Instance<P: FftPlannerTrait<f32> = FftPlanner<f32>> {
    descriptor: &'static Descriptor,
    planner: P,
    frame_size_hint: f32,
    overlap_factor_hint: f32,
    engine: Option<Engine<f32>>,
}

impl Instance {
    pub fn new(descriptor: &'static Descriptor) -> Self {
        Self::with_planner(descriptor, FftPlanner::new())
    }
}

impl<P: FftPlannerTrait<f32>> Instance<P> {
    pub fn with_planner(descriptor: &'static Descriptor, planner: P) -> Self {
        Self {
            descriptor,
            planner,
            frame_size_hint: DEFAULT_FRAME_SIZE_HINT,
            overlap_factor_hint: DEFAULT_OVERLAP_FACTOR_HINT,
            engine: None,
        }
    }

    pub fn descriptor(&self) -> &'static Descriptor {
        self.descriptor
    }

    pub fn effect(&self) -> Effect {
        self.descriptor.effect
    }

    /// Store a control value. Takes effect on the next [`activate`](Self::activate).
    ///
    /// Returns `false` for ports that are not control inputs.
    pub fn set_control(&mut self, port: Port, value: f32) -> bool {
        match port {
            Port::FrameSize => self.frame_size_hint = value,
            Port::OverlapFactor => self.overlap_factor_hint = value,
            _ => return false,
        }
        true
    }

    /// Build a new engine from the current hints, discarding any previous one.
    ///
    /// On failure the instance is left inactive.
    pub fn activate(&mut self) -> Result<()> {
        self.engine = None;
        let config = EngineConfig::from_hints(self.frame_size_hint, self.overlap_factor_hint);
        match Engine::with_planner(config, &mut self.planner) {
            Ok(engine) => {
                log::info!(
                    "activated {} (frame_size={}, hop_size={})",
                    self.descriptor.uri,
                    config.frame_size,
                    config.hop_size
                );
                self.engine = Some(engine);
                Ok(())
            }
            Err(err) => {
                log::warn!("activation of {} failed: {}", self.descriptor.uri, err);
                Err(err)
            }
        }
    }

    pub fn deactivate(&mut self) {
        if self.engine.take().is_some() {
            log::debug!("deactivated {}", self.descriptor.uri);
        }
    }

    pub fn is_active(&self) -> bool {
        self.engine.is_some()
    }

    pub fn engine(&self) -> Option<&Engine<f32>> {
        self.engine.as_ref()
    }

    /// Latency of the active engine in samples.
    pub fn latency(&self) -> Option<usize> {
        self.engine.as_ref().map(Engine::latency)
    }

    /// Process one block.
    ///
    /// `outputs` holds exactly [`Effect::output_count`] buses: `[center]`, `[left, right]`
    /// or `[left, right, center]`. When `latency` is bound it receives the frame size.
    pub fn run(
        &mut self,
        input: [&[f32]; 2],
        outputs: &mut [&mut [f32]],
        latency: Option<&mut f32>,
    ) -> Result<()> {
        let effect = self.descriptor.effect;
        let engine = self.engine.as_mut().ok_or(IntersectError::NotActivated)?;

        let output = match (effect, outputs) {
            (Effect::Intersect, [center]) => Output::Intersect { center },
            (Effect::SymmetricDifference, [left, right]) => {
                Output::SymmetricDifference { left, right }
            }
            (Effect::Upmix, [left, right, center]) => Output::Upmix {
                left,
                right,
                center,
            },
            (_, buses) => {
                return Err(IntersectError::OutputBusCount {
                    effect,
                    expected: effect.output_count(),
                    actual: buses.len(),
                });
            }
        };

        engine.process(input, output);

        if let Some(latency) = latency {
            *latency = engine.latency() as f32;
        }
        Ok(())
    }
}
