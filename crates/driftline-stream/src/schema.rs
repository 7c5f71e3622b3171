use serde::{Deserialize, Serialize};

use driftline_fx_sdk::{DescriptorTable, ParamId};

/// Generation tag identifying which descriptor-table/algorithm generation
/// produced a persisted patch. Monotonically increasing, never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct StreamRevision(pub u32);

impl StreamRevision {
    /// The oldest known generation. Records carrying no tag are assumed to
    /// come from here.
    pub const ORIGIN: StreamRevision = StreamRevision(1);

    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    fn origin() -> Self {
        Self::ORIGIN
    }
}

/// The generation the current effect tables belong to. Bumped whenever any
/// shipped effect changes its parameter layout or value semantics.
pub const CURRENT_STREAM_REVISION: StreamRevision = StreamRevision(3);

/// One persisted control value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatchEntry {
    pub id: ParamId,
    pub value: f32,
}

/// Persisted parameter state of one effect instance.
///
/// Entries are ordered; if an id occurs more than once the last occurrence
/// wins. A missing `revision` field deserializes to
/// [`StreamRevision::ORIGIN`], which is how records predating the tag are
/// read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchRecord {
    pub effect_id: String,
    #[serde(default = "StreamRevision::origin")]
    pub revision: StreamRevision,
    pub entries: Vec<PatchEntry>,
}

impl PatchRecord {
    /// Captures the current state of an effect instance at save time. The
    /// record is tagged with [`CURRENT_STREAM_REVISION`] and lists entries in
    /// table order.
    pub fn capture(effect_id: impl Into<String>, table: &DescriptorTable, values: &[f32]) -> Self {
        let entries = table
            .iter()
            .zip(values.iter())
            .map(|(descriptor, value)| PatchEntry {
                id: descriptor.id,
                value: *value,
            })
            .collect();
        Self {
            effect_id: effect_id.into(),
            revision: CURRENT_STREAM_REVISION,
            entries,
        }
    }

    pub fn value_of(&self, id: ParamId) -> Option<f32> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.id == id)
            .map(|entry| entry.value)
    }
}
