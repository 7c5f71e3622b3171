use std::sync::Arc;

use driftline_engine::rt::{param_write_channel, ParamWriteQueue, ParamWriter};
use driftline_engine::{AlgorithmCore, AudioBuffer, BufferConfig, EffectInfo, SharedParams};

use crate::{DescriptorTable, GroupId, GroupTable, ParamError, ParamId};

const HOST_QUEUE_CAPACITY: usize = 256;

/// Non-real-time endpoint of the host parameter protocol.
///
/// Hosts deliver `(id, normalized float)` writes; the port converts through
/// the descriptor curve, clamps, and queues the natural-unit value for the
/// render side. Every value that reaches a parameter slot has therefore
/// already passed the range check.
pub struct HostPort {
    writer: ParamWriter,
    params: SharedParams,
    table: Arc<DescriptorTable>,
}

impl HostPort {
    pub fn write_normalized(&mut self, id: ParamId, normalized: f32) -> Result<(), ParamError> {
        let natural = self.table.denormalize(id, normalized)?;
        self.write_natural(id, natural)
    }

    pub fn write_natural(&mut self, id: ParamId, value: f32) -> Result<(), ParamError> {
        let index = self
            .table
            .index_of(id)
            .ok_or(ParamError::UnknownParameter(id))?;
        self.writer.write(index, self.table.clamp(id, value));
        Ok(())
    }

    /// Current value reported back to the host in its normalized range.
    pub fn read_normalized(&self, id: ParamId) -> Result<f32, ParamError> {
        let index = self
            .table
            .index_of(id)
            .ok_or(ParamError::UnknownParameter(id))?;
        self.table.normalize(id, self.params.load().get(index))
    }
}

/// Binds one DSP kernel to one descriptor table and owns the per-instance
/// value state.
///
/// The adapter is the only translation point between the host's generic
/// "effect with N automatable parameters" view and the concrete kernel: it
/// resolves stable ids to dense slots, pulls the current snapshot each block,
/// and forwards it to the kernel in table order.
pub struct EffectAdapter<K: AlgorithmCore> {
    info: EffectInfo,
    table: Arc<DescriptorTable>,
    groups: Arc<GroupTable>,
    kernel: K,
    params: SharedParams,
    queue: ParamWriteQueue,
    host_port: Option<HostPort>,
    scratch: Vec<f32>,
    prepared: bool,
}

impl<K: AlgorithmCore> EffectAdapter<K> {
    pub fn new(
        info: EffectInfo,
        table: Arc<DescriptorTable>,
        groups: Arc<GroupTable>,
        kernel: K,
    ) -> Self {
        let params = SharedParams::new(table.defaults());
        let (writer, queue) = param_write_channel(HOST_QUEUE_CAPACITY, params.clone());
        let host_port = HostPort {
            writer,
            params: params.clone(),
            table: Arc::clone(&table),
        };
        let scratch = vec![0.0; table.len()];
        Self {
            info,
            table,
            groups,
            kernel,
            params,
            queue,
            host_port: Some(host_port),
            scratch,
            prepared: false,
        }
    }

    pub fn info(&self) -> EffectInfo {
        self.info.clone()
    }

    pub fn descriptor_table(&self) -> Arc<DescriptorTable> {
        Arc::clone(&self.table)
    }

    pub fn group_table(&self) -> Arc<GroupTable> {
        Arc::clone(&self.groups)
    }

    pub fn shared_params(&self) -> SharedParams {
        self.params.clone()
    }

    /// Hands out the host write endpoint. There is exactly one per instance;
    /// subsequent calls return `None`.
    pub fn take_host_port(&mut self) -> Option<HostPort> {
        self.host_port.take()
    }

    pub fn prepare(&mut self, config: &BufferConfig) -> anyhow::Result<()> {
        self.kernel.prepare(config);
        self.params.load().read_into(&mut self.scratch);
        self.kernel.set_parameters(&self.scratch);
        self.prepared = true;
        Ok(())
    }

    /// Renders one block. Real-time safe: one snapshot load, queued host
    /// writes drained at the block boundary, no allocation. An unprepared
    /// adapter passes audio through untouched instead of failing.
    pub fn process(&mut self, buffer: &mut AudioBuffer) -> anyhow::Result<()> {
        if !self.prepared {
            return Ok(());
        }
        let bank = self.queue.drain_and_load();
        bank.read_into(&mut self.scratch);
        self.kernel.set_parameters(&self.scratch);
        self.kernel.render(buffer);
        Ok(())
    }

    /// Writes the canonical default vector into the instance as one bulk
    /// install.
    pub fn reset_to_defaults(&mut self) {
        self.params.install(self.table.defaults());
        self.kernel.reset();
    }

    /// Atomically installs a complete migrated value vector. The vector must
    /// be in table order and is expected to be pre-clamped by the migration
    /// engine.
    pub fn install_values(&self, values: Vec<f32>) -> Result<(), ParamError> {
        if values.len() != self.table.len() {
            return Err(ParamError::WrongLength {
                expected: self.table.len(),
                actual: values.len(),
            });
        }
        self.params.install(values);
        Ok(())
    }

    /// Single-control write from a non-real-time caller, in natural units.
    pub fn set_parameter(&self, id: ParamId, value: f32) -> Result<(), ParamError> {
        let index = self
            .table
            .index_of(id)
            .ok_or(ParamError::UnknownParameter(id))?;
        self.params.write(index, self.table.clamp(id, value));
        Ok(())
    }

    pub fn parameter_value(&self, id: ParamId) -> Result<f32, ParamError> {
        let index = self
            .table
            .index_of(id)
            .ok_or(ParamError::UnknownParameter(id))?;
        Ok(self.params.load().get(index))
    }

    pub fn group_label(&self, id: GroupId) -> String {
        self.groups.label_for(id).to_string()
    }

    pub fn group_label_slot(&self, id: GroupId) -> i32 {
        self.groups.layout_slot_for(id)
    }

    /// Clears kernel time-domain state without touching parameter values.
    pub fn reset(&mut self) {
        self.kernel.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DescriptorTableBuilder, GroupDef, ParamDescriptor, ParamKind};
    use driftline_engine::ChannelLayout;

    /// Kernel that records the last parameter vector it was handed.
    struct ProbeKernel {
        seen: Vec<f32>,
        gain: f32,
    }

    impl AlgorithmCore for ProbeKernel {
        fn prepare(&mut self, _config: &BufferConfig) {}

        fn set_parameters(&mut self, values: &[f32]) {
            self.seen = values.to_vec();
            self.gain = values.first().copied().unwrap_or(1.0);
        }

        fn render(&mut self, buffer: &mut AudioBuffer) {
            for channel in buffer.channels_mut() {
                for sample in channel.iter_mut() {
                    *sample *= self.gain;
                }
            }
        }
    }

    fn adapter() -> EffectAdapter<ProbeKernel> {
        let table = Arc::new(
            DescriptorTableBuilder::new()
                .push(ParamDescriptor::new(
                    ParamId::new(0),
                    "Gain",
                    ParamKind::float(0.0..=2.0, 1.0),
                ))
                .push(ParamDescriptor::new(
                    ParamId::new(1),
                    "Tone",
                    ParamKind::float(0.0..=1.0, 0.5),
                ))
                .finish(),
        );
        let groups = Arc::new(GroupTable::new(vec![GroupDef::new(
            GroupId::new(0),
            "Main",
            0,
        )]));
        EffectAdapter::new(
            EffectInfo::new("test.probe", "Probe", "Driftline"),
            table,
            groups,
            ProbeKernel {
                seen: Vec::new(),
                gain: 1.0,
            },
        )
    }

    fn config() -> BufferConfig {
        BufferConfig::new(48_000.0, 64, ChannelLayout::Stereo)
    }

    #[test]
    fn unprepared_adapter_passes_audio_through() {
        let mut adapter = adapter();
        let mut buffer = AudioBuffer::new(2, 8);
        buffer.channel_mut(0).fill(0.5);
        adapter.process(&mut buffer).unwrap();
        assert!(buffer.channel(0).iter().all(|s| *s == 0.5));
    }

    #[test]
    fn kernel_sees_defaults_after_prepare() {
        let mut adapter = adapter();
        adapter.prepare(&config()).unwrap();
        let mut buffer = AudioBuffer::new(2, 8);
        adapter.process(&mut buffer).unwrap();
        assert_eq!(adapter.kernel.seen, vec![1.0, 0.5]);
    }

    #[test]
    fn host_writes_reach_the_kernel_clamped() {
        let mut adapter = adapter();
        adapter.prepare(&config()).unwrap();
        let mut port = adapter.take_host_port().unwrap();
        port.write_natural(ParamId::new(0), 9.0).unwrap();
        let mut buffer = AudioBuffer::new(2, 8);
        adapter.process(&mut buffer).unwrap();
        assert_eq!(adapter.kernel.seen[0], 2.0);
    }

    #[test]
    fn install_rejects_wrong_length() {
        let adapter = adapter();
        assert!(matches!(
            adapter.install_values(vec![1.0]),
            Err(ParamError::WrongLength {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn host_port_is_single_use() {
        let mut adapter = adapter();
        assert!(adapter.take_host_port().is_some());
        assert!(adapter.take_host_port().is_none());
    }

    #[test]
    fn normalized_round_trip_through_port() {
        let mut adapter = adapter();
        let mut port = adapter.take_host_port().unwrap();
        port.write_normalized(ParamId::new(1), 0.25).unwrap();
        // Queued write is not visible until the render side drains it.
        adapter.process(&mut AudioBuffer::new(2, 4)).unwrap();
        adapter.prepare(&config()).unwrap();
        adapter.process(&mut AudioBuffer::new(2, 4)).unwrap();
        let read = port.read_normalized(ParamId::new(1)).unwrap();
        assert!((read - 0.25).abs() < 1e-5);
    }
}
