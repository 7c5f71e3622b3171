use driftline_fx_sdk::ParamId;

use crate::StreamRevision;

/// One deterministic rewrite applied while bringing an old record forward.
///
/// Rules are plain data plus `fn` pointers so a rule set is `'static`,
/// copyable, and cannot capture ambient state — migration stays a pure
/// function of the record and the tables.
#[derive(Debug, Clone, Copy)]
pub enum Rule {
    /// Reinterprets a stored value whose encoding changed, e.g. a control
    /// re-curved or re-scaled between revisions. Absent ids are skipped.
    Rescale { id: ParamId, apply: fn(f32) -> f32 },
    /// Moves a value to the id that replaced it (a renamed or consolidated
    /// control). Absent ids are skipped.
    Remap { from: ParamId, to: ParamId },
    /// Computes a newly introduced control from older values. Sources that
    /// are missing from the record arrive as `None`; the combine function
    /// supplies its own fallback and must never fail.
    Synthesize {
        id: ParamId,
        sources: &'static [ParamId],
        combine: fn(&[Option<f32>]) -> f32,
    },
    /// Discards the value of a control that no longer exists.
    Retire { id: ParamId },
}

/// All rewrites introduced by one revision bump.
///
/// A step applies to every record whose tag is older than `revision`; a
/// record written at or after it passes through unchanged.
#[derive(Debug, Clone, Copy)]
pub struct RevisionStep {
    pub revision: StreamRevision,
    pub rules: &'static [Rule],
}

/// An effect type's full migration history, ordered oldest step first.
///
/// Steps are applied in order and never skipped: a record from revision 1
/// passes through the revision-2 rewrites before the revision-3 rewrites see
/// it.
#[derive(Debug, Clone, Copy)]
pub struct RevisionHistory {
    steps: &'static [RevisionStep],
}

impl RevisionHistory {
    /// History of an effect whose encoding never changed.
    pub const EMPTY: RevisionHistory = RevisionHistory { steps: &[] };

    pub const fn new(steps: &'static [RevisionStep]) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &'static [RevisionStep] {
        self.steps
    }

    /// True when steps are ordered strictly oldest-first; checked by debug
    /// assertions before rules run.
    pub fn is_ordered(&self) -> bool {
        self.steps
            .windows(2)
            .all(|pair| pair[0].revision < pair[1].revision)
    }
}
