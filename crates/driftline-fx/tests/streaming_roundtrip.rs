//! Host-level patch flows: capture, persist, reload, migrate, install.

use driftline_fx::{catalog, drift_delay, DriftDelay};
use driftline_fx_sdk::NativeEffect;
use driftline_stream::{
    load_patch, save_patch, PatchEntry, PatchRecord, StreamRevision, CURRENT_STREAM_REVISION,
};

use driftline_fx::drift_delay::{
    PARAM_DRY, PARAM_FEEDBACK, PARAM_TIME, PARAM_WET,
};

#[test]
fn capture_save_load_reinstall_is_lossless() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("patch.json");

    let mut source = DriftDelay::new();
    source.set_parameter(PARAM_TIME, 333.0).unwrap();
    source.set_parameter(PARAM_FEEDBACK, 0.5).unwrap();
    source.set_parameter(PARAM_WET, 0.9).unwrap();

    let table = source.descriptor_table();
    let record = PatchRecord::capture(
        drift_delay::EFFECT_ID,
        &table,
        &source.shared_params().to_vec(),
    );
    assert_eq!(record.revision, CURRENT_STREAM_REVISION);
    save_patch(&path, &record).unwrap();

    let loaded = load_patch(&path).unwrap();
    let (effect, report) = catalog().load_record(&loaded).unwrap();
    assert!(report.applied_steps.is_empty());
    assert_eq!(effect.parameter_value(PARAM_TIME).unwrap(), 333.0);
    assert_eq!(effect.parameter_value(PARAM_FEEDBACK).unwrap(), 0.5);
    assert_eq!(effect.parameter_value(PARAM_WET).unwrap(), 0.9);
}

#[test]
fn legacy_revision_one_patch_loads_with_original_sound() {
    // A record as written by the first release: feedback in percent, a
    // single mix control, a stereo spread control that no longer exists, and
    // no entries for controls that did not exist yet.
    let legacy = PatchRecord {
        effect_id: drift_delay::EFFECT_ID.into(),
        revision: StreamRevision(1),
        entries: vec![
            PatchEntry {
                id: PARAM_TIME,
                value: 250.0,
            },
            PatchEntry {
                id: PARAM_FEEDBACK,
                value: 45.0,
            },
            PatchEntry {
                id: driftline_fx_sdk::ParamId::new(3), // mix
                value: 0.7,
            },
            PatchEntry {
                id: driftline_fx_sdk::ParamId::new(6), // spread
                value: 0.9,
            },
        ],
    };

    let (effect, report) = catalog().load_record(&legacy).unwrap();
    assert_eq!(
        report.applied_steps,
        vec![StreamRevision(2), StreamRevision(3)]
    );
    assert_eq!(effect.parameter_value(PARAM_TIME).unwrap(), 250.0);
    assert!((effect.parameter_value(PARAM_FEEDBACK).unwrap() - 0.45).abs() < 1e-6);
    assert!((effect.parameter_value(PARAM_WET).unwrap() - 0.7).abs() < 1e-6);
    assert!((effect.parameter_value(PARAM_DRY).unwrap() - 0.3).abs() < 1e-6);
    // The retired ids are gone and everything else is at its default.
    assert!(report.dropped.contains(&driftline_fx_sdk::ParamId::new(3)));
    assert!(report.dropped.contains(&driftline_fx_sdk::ParamId::new(6)));
    let cutoff = effect
        .parameter_value(drift_delay::PARAM_CUTOFF)
        .unwrap();
    assert_eq!(cutoff, 6_500.0);
}

#[test]
fn missing_revision_tag_is_treated_as_oldest() {
    let json = format!(
        r#"{{"effect_id":"{}","entries":[{{"id":2,"value":45.0}}]}}"#,
        drift_delay::EFFECT_ID
    );
    let record: PatchRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(record.revision, StreamRevision(1));
    let (effect, _) = catalog().load_record(&record).unwrap();
    // Percent feedback was rescaled, so the tagless record went through the
    // full rule chain.
    assert!((effect.parameter_value(PARAM_FEEDBACK).unwrap() - 0.45).abs() < 1e-6);
}

#[test]
fn future_patch_loads_without_rules_and_without_error() {
    let future = PatchRecord {
        effect_id: drift_delay::EFFECT_ID.into(),
        revision: StreamRevision(99),
        entries: vec![
            PatchEntry {
                id: PARAM_TIME,
                value: 100.0,
            },
            PatchEntry {
                id: PARAM_FEEDBACK,
                value: 0.8,
            },
        ],
    };
    let (effect, report) = catalog().load_record(&future).unwrap();
    assert!(report.from_future);
    assert!(report.applied_steps.is_empty());
    assert_eq!(effect.parameter_value(PARAM_TIME).unwrap(), 100.0);
    assert_eq!(effect.parameter_value(PARAM_FEEDBACK).unwrap(), 0.8);
}

#[test]
fn unknown_effect_id_is_a_load_error() {
    let record = PatchRecord {
        effect_id: "driftline.fx.does_not_exist".into(),
        revision: CURRENT_STREAM_REVISION,
        entries: vec![],
    };
    assert!(catalog().load_record(&record).is_err());
}

#[test]
fn loading_into_a_running_instance_replaces_its_state() {
    let mut effect = DriftDelay::new();
    effect.set_parameter(PARAM_TIME, 1_500.0).unwrap();

    let record = PatchRecord {
        effect_id: drift_delay::EFFECT_ID.into(),
        revision: CURRENT_STREAM_REVISION,
        entries: vec![PatchEntry {
            id: PARAM_TIME,
            value: 200.0,
        }],
    };
    let report = catalog().load_into(&record, &mut effect).unwrap();
    assert!(report.applied_steps.is_empty());
    assert_eq!(effect.parameter_value(PARAM_TIME).unwrap(), 200.0);
    // Controls the record did not carry returned to their defaults.
    assert_eq!(effect.parameter_value(PARAM_WET).unwrap(), 0.35);
}

#[test]
fn migrating_twice_yields_identical_installs() {
    let legacy = PatchRecord {
        effect_id: drift_delay::EFFECT_ID.into(),
        revision: StreamRevision(1),
        entries: vec![
            PatchEntry {
                id: PARAM_FEEDBACK,
                value: 72.5,
            },
            PatchEntry {
                id: driftline_fx_sdk::ParamId::new(3),
                value: 0.61,
            },
        ],
    };
    let (first, _) = catalog().load_record(&legacy).unwrap();
    let (second, _) = catalog().load_record(&legacy).unwrap();
    let a = first.shared_params().to_vec();
    let b = second.shared_params().to_vec();
    let a_bits: Vec<u32> = a.iter().map(|v| v.to_bits()).collect();
    let b_bits: Vec<u32> = b.iter().map(|v| v.to_bits()).collect();
    assert_eq!(a_bits, b_bits);
}
