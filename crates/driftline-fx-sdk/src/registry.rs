use std::sync::Arc;

use driftline_engine::{AudioEffect, EffectInfo, SharedParams};

use crate::{DescriptorTable, GroupId, GroupTable, ParamError, ParamId};

/// A fully assembled Driftline effect: audio processing plus the parameter
/// surface the host and presentation shell talk to.
///
/// Implementations are thin wrappers over [`EffectAdapter`](crate::EffectAdapter)
/// and delegate every method to it.
pub trait NativeEffect: AudioEffect {
    fn descriptor_table(&self) -> Arc<DescriptorTable>;

    fn group_table(&self) -> Arc<GroupTable>;

    fn shared_params(&self) -> SharedParams;

    /// Non-real-time single-control write in natural units. Values are
    /// clamped into the descriptor range, never rejected for being out of
    /// range.
    fn set_parameter(&mut self, id: ParamId, value: f32) -> Result<(), ParamError>;

    fn parameter_value(&self, id: ParamId) -> Result<f32, ParamError>;

    /// Writes the canonical defaults into the instance, as on fresh
    /// instantiation or an explicit reset request.
    fn reset_to_defaults(&mut self);

    /// Atomically installs a complete value vector in table order; the
    /// install step of patch loading.
    fn install_values(&mut self, values: Vec<f32>) -> Result<(), ParamError>;

    fn group_label(&self, id: GroupId) -> String {
        self.group_table().label_for(id).to_string()
    }

    fn group_label_slot(&self, id: GroupId) -> i32 {
        self.group_table().layout_slot_for(id)
    }
}

/// Registration-time description of one effect type.
///
/// The descriptor and group tables are built once per effect type and shared;
/// factories return the same `Arc` for every call.
pub trait EffectFactory: Send + Sync {
    fn info(&self) -> EffectInfo;

    fn descriptor_table(&self) -> Arc<DescriptorTable>;

    fn group_table(&self) -> Arc<GroupTable>;

    fn create(&self) -> Box<dyn NativeEffect>;
}
