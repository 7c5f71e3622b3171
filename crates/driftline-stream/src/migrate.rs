use std::collections::BTreeMap;

use driftline_fx_sdk::{DescriptorTable, ParamId};

use crate::{PatchRecord, RevisionHistory, Rule, StreamRevision, CURRENT_STREAM_REVISION};

/// What the migration engine did to one record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationReport {
    /// Revisions whose rule sets were applied, oldest first.
    pub applied_steps: Vec<StreamRevision>,
    /// Ids discarded because their control no longer exists.
    pub dropped: Vec<ParamId>,
    /// Current ids that received their canonical default because the record
    /// carried no value for them.
    pub defaulted: Vec<ParamId>,
    /// The record was written by a newer generation than this build knows;
    /// its values were loaded as-is.
    pub from_future: bool,
}

/// Rewrites an old patch record against the current descriptor table.
///
/// Pure function of the record and the static tables: no clock, no
/// randomness, no external state. Running it twice on the same input yields
/// identical output, and a record already at the current revision passes
/// through value-for-value.
///
/// The returned vector is in table order, complete (every current control
/// has a value) and clamped into each descriptor's declared range.
/// Intermediate rule output may leave the range; only the final clamp
/// restores the instance invariant.
pub fn migrate(
    record: &PatchRecord,
    history: &RevisionHistory,
    table: &DescriptorTable,
) -> (Vec<f32>, MigrationReport) {
    debug_assert!(history.is_ordered(), "revision history out of order");

    let mut report = MigrationReport::default();

    // Parse: ordered entries collapse into an id-keyed working set; the last
    // occurrence of a duplicated id wins.
    let mut working: BTreeMap<ParamId, f32> = BTreeMap::new();
    for entry in &record.entries {
        working.insert(entry.id, entry.value);
    }

    if record.revision > CURRENT_STREAM_REVISION {
        log::warn!(
            "patch for {} was written by revision {:?}, newer than {:?}; loading values untouched",
            record.effect_id,
            record.revision,
            CURRENT_STREAM_REVISION
        );
        report.from_future = true;
    } else {
        // Classify and rewrite: every step newer than the record applies, in
        // revision order, each seeing the previous step's output.
        for step in history.steps() {
            if record.revision >= step.revision {
                continue;
            }
            for rule in step.rules {
                apply_rule(rule, &mut working, &mut report);
            }
            report.applied_steps.push(step.revision);
        }
    }

    // Fill defaults, then clamp: the record may predate controls that exist
    // today, and rules may have produced transiently out-of-range values.
    let mut values = table.defaults();
    for (index, descriptor) in table.iter().enumerate() {
        match working.remove(&descriptor.id) {
            Some(value) => values[index] = descriptor.kind.clamp(value),
            None => report.defaulted.push(descriptor.id),
        }
    }

    // Whatever is left in the working set has no current control.
    for (id, _) in working {
        if !report.dropped.contains(&id) {
            report.dropped.push(id);
        }
    }

    if !report.dropped.is_empty() {
        log::debug!(
            "patch for {} carried {} value(s) with no current control",
            record.effect_id,
            report.dropped.len()
        );
    }

    (values, report)
}

fn apply_rule(rule: &Rule, working: &mut BTreeMap<ParamId, f32>, report: &mut MigrationReport) {
    match rule {
        Rule::Rescale { id, apply } => {
            if let Some(value) = working.get_mut(id) {
                *value = apply(*value);
            }
        }
        Rule::Remap { from, to } => {
            if let Some(value) = working.remove(from) {
                working.insert(*to, value);
            }
        }
        Rule::Synthesize {
            id,
            sources,
            combine,
        } => {
            let mut inputs = [None; 8];
            let count = sources.len().min(inputs.len());
            for (slot, source) in inputs.iter_mut().zip(sources.iter()) {
                *slot = working.get(source).copied();
            }
            working.insert(*id, combine(&inputs[..count]));
        }
        Rule::Retire { id } => {
            if working.remove(id).is_some() {
                report.dropped.push(*id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PatchEntry, RevisionStep};
    use driftline_fx_sdk::{
        DescriptorTableBuilder, ParamCurve, ParamDescriptor, ParamKind,
    };

    // A synthetic effect history: revision 2 rescaled id 0 from percent to a
    // fraction and retired id 1; revision 3 split id 2 into ids 3 and 4.
    const HISTORY: RevisionHistory = RevisionHistory::new(&[
        RevisionStep {
            revision: StreamRevision(2),
            rules: &[
                Rule::Rescale {
                    id: ParamId(0),
                    apply: |v| v * 0.01,
                },
                Rule::Retire { id: ParamId(1) },
            ],
        },
        RevisionStep {
            revision: StreamRevision(3),
            rules: &[
                Rule::Synthesize {
                    id: ParamId(3),
                    sources: &[ParamId(2)],
                    combine: |inputs| inputs[0].unwrap_or(0.5),
                },
                Rule::Synthesize {
                    id: ParamId(4),
                    sources: &[ParamId(2)],
                    combine: |inputs| 1.0 - inputs[0].unwrap_or(0.5),
                },
                Rule::Retire { id: ParamId(2) },
            ],
        },
    ]);

    fn table() -> DescriptorTable {
        DescriptorTableBuilder::new()
            .push(ParamDescriptor::new(
                ParamId(0),
                "Amount",
                ParamKind::float(0.0..=1.0, 0.4),
            ))
            .push(ParamDescriptor::new(
                ParamId(3),
                "Wet",
                ParamKind::float(0.0..=1.0, 0.3),
            ))
            .push(ParamDescriptor::new(
                ParamId(4),
                "Dry",
                ParamKind::float_curved(0.0..=1.0, 0.7, ParamCurve::Linear),
            ))
            .finish()
    }

    fn record(revision: u32, entries: Vec<PatchEntry>) -> PatchRecord {
        PatchRecord {
            effect_id: "test.fx".into(),
            revision: StreamRevision(revision),
            entries,
        }
    }

    #[test]
    fn origin_record_passes_through_every_step() {
        let rec = record(
            1,
            vec![
                PatchEntry {
                    id: ParamId(0),
                    value: 80.0,
                },
                PatchEntry {
                    id: ParamId(1),
                    value: 0.5,
                },
                PatchEntry {
                    id: ParamId(2),
                    value: 0.7,
                },
            ],
        );
        let (values, report) = migrate(&rec, &HISTORY, &table());
        assert_eq!(values, vec![0.8, 0.7, 0.3]);
        assert_eq!(
            report.applied_steps,
            vec![StreamRevision(2), StreamRevision(3)]
        );
        assert!(report.dropped.contains(&ParamId(1)));
        assert!(report.dropped.contains(&ParamId(2)));
        assert!(report.defaulted.is_empty());
    }

    #[test]
    fn mid_history_record_skips_already_applied_steps() {
        // Written at revision 2: id 0 already a fraction, id 2 still exists.
        let rec = record(
            2,
            vec![
                PatchEntry {
                    id: ParamId(0),
                    value: 0.9,
                },
                PatchEntry {
                    id: ParamId(2),
                    value: 0.25,
                },
            ],
        );
        let (values, report) = migrate(&rec, &HISTORY, &table());
        assert_eq!(values, vec![0.9, 0.25, 0.75]);
        assert_eq!(report.applied_steps, vec![StreamRevision(3)]);
    }

    #[test]
    fn current_record_is_untouched() {
        let rec = record(
            3,
            vec![
                PatchEntry {
                    id: ParamId(0),
                    value: 0.6,
                },
                PatchEntry {
                    id: ParamId(3),
                    value: 0.2,
                },
                PatchEntry {
                    id: ParamId(4),
                    value: 0.8,
                },
            ],
        );
        let (values, report) = migrate(&rec, &HISTORY, &table());
        assert_eq!(values, vec![0.6, 0.2, 0.8]);
        assert!(report.applied_steps.is_empty());
        assert!(!report.from_future);
    }

    #[test]
    fn synthesize_survives_absent_sources() {
        // Origin record with no mix value at all: the split rules fall back
        // to their own defaults instead of failing.
        let rec = record(1, vec![]);
        let (values, report) = migrate(&rec, &HISTORY, &table());
        assert_eq!(values, vec![0.4, 0.5, 0.5]);
        assert!(report.defaulted.contains(&ParamId(0)));
    }

    #[test]
    fn future_record_loads_without_rules() {
        let rec = record(
            9,
            vec![PatchEntry {
                id: ParamId(0),
                value: 2.5,
            }],
        );
        let (values, report) = migrate(&rec, &HISTORY, &table());
        assert!(report.from_future);
        assert!(report.applied_steps.is_empty());
        // Still clamped into the current declared range.
        assert_eq!(values[0], 1.0);
    }

    #[test]
    fn out_of_range_intermediates_are_clamped_only_at_the_end() {
        let rec = record(
            1,
            vec![PatchEntry {
                id: ParamId(0),
                value: 400.0, // 400% — becomes 4.0 after rescale, clamps to 1.0
            }],
        );
        let (values, _) = migrate(&rec, &HISTORY, &table());
        assert_eq!(values[0], 1.0);
    }
}
