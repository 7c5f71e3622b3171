//! Driftline FX SDK
//! ================
//!
//! Building blocks for exposing a DSP kernel as a hosted effect: typed
//! parameter descriptor tables, group/layout metadata for the presentation
//! shell, the registry traits effect crates implement, and the generic
//! [`EffectAdapter`] that binds one kernel to one descriptor table while
//! keeping the render path allocation-free.

mod adapter;
mod groups;
mod params;
mod registry;
mod surface;

pub use adapter::{EffectAdapter, HostPort};
pub use groups::{GroupDef, GroupId, GroupTable, FALLBACK_GROUP_LABEL};
pub use params::{
    DescriptorTable, DescriptorTableBuilder, ParamCurve, ParamDescriptor, ParamError, ParamId,
    ParamKind,
};
pub use registry::{EffectFactory, NativeEffect};
pub use surface::{MemorySettings, PanelSurface, SettingsStore};

/// Common imports for effect authors.
pub mod prelude {
    pub use crate::{
        DescriptorTable, DescriptorTableBuilder, EffectAdapter, EffectFactory, GroupDef, GroupId,
        GroupTable, HostPort, NativeEffect, ParamCurve, ParamDescriptor, ParamError, ParamId,
        ParamKind,
    };
    pub use driftline_engine::{
        AlgorithmCore, AudioBuffer, AudioEffect, BufferConfig, ChannelLayout, EffectInfo,
        SharedParams,
    };
}
