use serde::{Deserialize, Serialize};

use crate::{AudioBuffer, BufferConfig, ChannelLayout};

/// Metadata describing an effect type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectInfo {
    pub id: String,
    pub name: String,
    pub vendor: String,
    pub version: Option<String>,
    pub description: Option<String>,
}

impl EffectInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, vendor: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            vendor: vendor.into(),
            version: None,
            description: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Fixed call contract between an effect adapter and its DSP kernel.
///
/// Kernels are opaque to the framework: they receive a dense parameter
/// vector in algorithm-natural units and a buffer to rewrite in place.
/// Implementations must be deterministic and real-time safe — `render` and
/// `set_parameters` never allocate, block, or panic.
pub trait AlgorithmCore: Send {
    /// Sizes internal state for the given stream. Called outside the render
    /// path; allocation is allowed here and only here.
    fn prepare(&mut self, config: &BufferConfig);

    /// Installs the current parameter vector. The slice always has the
    /// length of the owning effect's descriptor table.
    fn set_parameters(&mut self, values: &[f32]);

    /// Processes one block in place.
    fn render(&mut self, buffer: &mut AudioBuffer);

    /// Clears time-domain state (delay lines, filter history) without
    /// touching parameters.
    fn reset(&mut self) {}
}

/// Host-side processing contract for a fully assembled effect.
pub trait AudioEffect: Send {
    fn info(&self) -> EffectInfo;

    fn prepare(&mut self, config: &BufferConfig) -> anyhow::Result<()>;

    /// Renders one block in place. Runs on the real-time thread: no
    /// allocation, no locks, errors degrade to pass-through instead of
    /// propagating.
    fn process(&mut self, buffer: &mut AudioBuffer) -> anyhow::Result<()>;

    fn supports_layout(&self, layout: ChannelLayout) -> bool {
        matches!(layout, ChannelLayout::Mono | ChannelLayout::Stereo)
    }

    /// Look-ahead latency in samples; effects without look-ahead keep the
    /// default.
    fn latency_samples(&self) -> usize {
        0
    }
}
