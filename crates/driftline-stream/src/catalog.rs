use std::sync::Arc;

use driftline_fx_sdk::{EffectFactory, NativeEffect};

use crate::{migrate, MigrationReport, PatchLoadError, PatchRecord, RevisionHistory};

/// An [`EffectFactory`] that also knows its effect type's streaming history.
///
/// Every shipped effect implements this; an effect whose encoding never
/// changed returns [`RevisionHistory::EMPTY`].
pub trait StreamedEffectFactory: EffectFactory {
    fn revision_history(&self) -> &'static RevisionHistory;
}

/// Registry of every effect type a host can instantiate and load patches
/// for. Built once at startup, immutable afterwards.
#[derive(Default)]
pub struct EffectCatalog {
    factories: Vec<Arc<dyn StreamedEffectFactory>>,
}

impl EffectCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, factory: impl StreamedEffectFactory + 'static) -> &mut Self {
        self.factories.push(Arc::new(factory));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn StreamedEffectFactory>> {
        self.factories.iter()
    }

    pub fn find(&self, effect_id: &str) -> Option<&Arc<dyn StreamedEffectFactory>> {
        self.factories
            .iter()
            .find(|factory| factory.info().id == effect_id)
    }

    /// The host load path end to end: instantiate the effect type named by
    /// the record, migrate the recorded values against the current
    /// descriptor table, and install the result atomically. The instance is
    /// untouched until the final install, so a failed load has no observable
    /// effect.
    pub fn load_record(
        &self,
        record: &PatchRecord,
    ) -> Result<(Box<dyn NativeEffect>, MigrationReport), PatchLoadError> {
        let factory = self
            .find(&record.effect_id)
            .ok_or_else(|| PatchLoadError::UnknownEffect(record.effect_id.clone()))?;
        let mut effect = factory.create();
        let (values, report) = migrate(
            record,
            factory.revision_history(),
            &factory.descriptor_table(),
        );
        effect.install_values(values)?;
        Ok((effect, report))
    }

    /// Migrates a record into an already-running instance, as when the host
    /// applies a preset to an existing effect slot.
    pub fn load_into(
        &self,
        record: &PatchRecord,
        effect: &mut dyn NativeEffect,
    ) -> Result<MigrationReport, PatchLoadError> {
        let factory = self
            .find(&record.effect_id)
            .ok_or_else(|| PatchLoadError::UnknownEffect(record.effect_id.clone()))?;
        let (values, report) = migrate(
            record,
            factory.revision_history(),
            &factory.descriptor_table(),
        );
        effect.install_values(values)?;
        Ok(report)
    }
}
