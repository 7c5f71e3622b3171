//! Lock-free parameter sharing between non-real-time writers and the render
//! thread.
//!
//! Two disciplines cover every mutation of an effect instance's value array:
//! individual host/UI writes go through per-slot atomic stores, while bulk
//! updates (patch load, reset to defaults) build a fresh bank and publish it
//! with a single pointer swap. The render thread loads one snapshot at block
//! start and reads only that snapshot for the whole block, so it can never
//! observe a half-installed array.

use core::sync::atomic::Ordering;
use std::sync::Arc;

use arc_swap::ArcSwap;
use atomic_float::AtomicF32;
use ringbuf::{HeapConsumer, HeapProducer, HeapRb};

/// Dense bank of parameter slots. Each slot is updated as a single atomic
/// unit; there is no multi-field state to tear.
#[derive(Debug)]
pub struct ParamValues {
    slots: Box<[AtomicF32]>,
}

impl ParamValues {
    pub fn from_vec(values: Vec<f32>) -> Self {
        let slots = values
            .into_iter()
            .map(AtomicF32::new)
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> f32 {
        debug_assert!(index < self.slots.len(), "parameter index out of bounds");
        match self.slots.get(index) {
            Some(slot) => slot.load(Ordering::Relaxed),
            None => 0.0,
        }
    }

    #[inline]
    pub fn set(&self, index: usize, value: f32) {
        debug_assert!(index < self.slots.len(), "parameter index out of bounds");
        if let Some(slot) = self.slots.get(index) {
            slot.store(value, Ordering::Relaxed);
        }
    }

    /// Copies every slot into `out`, truncating to the shorter length. The
    /// render path uses this to fill a preallocated scratch vector.
    #[inline]
    pub fn read_into(&self, out: &mut [f32]) {
        for (slot, value) in self.slots.iter().zip(out.iter_mut()) {
            *value = slot.load(Ordering::Relaxed);
        }
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.slots
            .iter()
            .map(|slot| slot.load(Ordering::Relaxed))
            .collect()
    }
}

/// Cloneable handle to one effect instance's parameter bank.
///
/// `write` mutates the current bank slot-atomically; `install` replaces the
/// whole bank at once. Readers that loaded the previous bank keep a
/// consistent view until their next `load`.
#[derive(Clone)]
pub struct SharedParams {
    bank: Arc<ArcSwap<ParamValues>>,
}

impl SharedParams {
    pub fn new(initial: Vec<f32>) -> Self {
        Self {
            bank: Arc::new(ArcSwap::from_pointee(ParamValues::from_vec(initial))),
        }
    }

    pub fn len(&self) -> usize {
        self.bank.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot for one render block.
    #[inline]
    pub fn load(&self) -> Arc<ParamValues> {
        self.bank.load_full()
    }

    /// Single-slot write from a non-real-time thread. Visible to the render
    /// thread no later than its next block-start `load`.
    #[inline]
    pub fn write(&self, index: usize, value: f32) {
        self.bank.load().set(index, value);
    }

    #[inline]
    pub fn read(&self, index: usize) -> f32 {
        self.bank.load().get(index)
    }

    /// Publishes a complete replacement bank as one atomic swap. This is the
    /// install step of patch migration; a load aborted before this call
    /// leaves the instance untouched.
    pub fn install(&self, values: Vec<f32>) {
        self.bank.store(Arc::new(ParamValues::from_vec(values)));
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.bank.load().to_vec()
    }
}

/// One host automation write.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamWrite {
    pub index: usize,
    pub value: f32,
}

/// Producer half of the host write queue.
///
/// Writes are queued so the render side applies them at a block boundary. A
/// full ring falls back to a direct slot store, which is still a single
/// atomic write, so automation is never dropped.
pub struct ParamWriter {
    producer: HeapProducer<ParamWrite>,
    params: SharedParams,
}

impl ParamWriter {
    #[inline]
    pub fn write(&mut self, index: usize, value: f32) {
        let write = ParamWrite { index, value };
        if self.producer.push(write).is_err() {
            self.params.write(index, value);
        }
    }
}

/// Consumer half, drained by the render thread at block start.
pub struct ParamWriteQueue {
    consumer: HeapConsumer<ParamWrite>,
    params: SharedParams,
}

impl ParamWriteQueue {
    /// Applies queued writes in arrival order to the current bank and
    /// returns the block snapshot.
    #[inline]
    pub fn drain_and_load(&mut self) -> Arc<ParamValues> {
        let bank = self.params.load();
        while let Some(write) = self.consumer.pop() {
            bank.set(write.index, write.value);
        }
        bank
    }
}

/// Builds the SPSC write channel for one effect instance.
pub fn param_write_channel(capacity: usize, params: SharedParams) -> (ParamWriter, ParamWriteQueue) {
    let ring = HeapRb::new(capacity.max(1));
    let (producer, consumer) = ring.split();
    (
        ParamWriter {
            producer,
            params: params.clone(),
        },
        ParamWriteQueue { consumer, params },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_writes_are_visible_to_cloned_handles() {
        let params = SharedParams::new(vec![0.0; 4]);
        let reader = params.clone();
        params.write(2, 0.75);
        assert_eq!(reader.read(2), 0.75);
    }

    #[test]
    fn install_swaps_the_whole_bank() {
        let params = SharedParams::new(vec![0.0; 3]);
        let render_side = params.clone();
        let held = render_side.load();
        params.install(vec![1.0, 2.0, 3.0]);
        // The held snapshot is unchanged; the next load sees the new bank.
        assert_eq!(held.get(0), 0.0);
        let next = render_side.load();
        assert_eq!(next.get(0), 1.0);
        assert_eq!(next.get(2), 3.0);
    }

    #[test]
    fn out_of_bounds_writes_are_ignored_in_release() {
        let params = SharedParams::new(vec![0.0; 2]);
        if cfg!(debug_assertions) {
            return;
        }
        params.write(9, 1.0);
        assert_eq!(params.read(0), 0.0);
    }

    #[test]
    fn queue_applies_writes_in_order() {
        let params = SharedParams::new(vec![0.0; 2]);
        let (mut writer, mut queue) = param_write_channel(8, params.clone());
        writer.write(0, 0.25);
        writer.write(0, 0.5);
        writer.write(1, 1.0);
        let bank = queue.drain_and_load();
        assert_eq!(bank.get(0), 0.5);
        assert_eq!(bank.get(1), 1.0);
    }

    #[test]
    fn full_queue_falls_back_to_direct_store() {
        let params = SharedParams::new(vec![0.0; 1]);
        let (mut writer, mut queue) = param_write_channel(1, params.clone());
        writer.write(0, 0.1);
        writer.write(0, 0.9); // ring is full, lands directly in the bank
        assert_eq!(params.read(0), 0.9);
        let bank = queue.drain_and_load();
        // The queued write is applied afterwards; last queued value wins.
        assert_eq!(bank.get(0), 0.1);
    }
}
