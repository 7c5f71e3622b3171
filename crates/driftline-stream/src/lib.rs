//! Driftline Stream
//! ================
//!
//! Versioned parameter persistence for Driftline effects: the patch record
//! schema, the streaming revision tags written into every patch, and the
//! migration engine that rewrites records produced by older descriptor
//! layouts so they reproduce their original audible result under current
//! code.

mod catalog;
mod migrate;
mod persist;
mod rules;
mod schema;

pub use catalog::{EffectCatalog, StreamedEffectFactory};
pub use migrate::{migrate, MigrationReport};
pub use persist::{load_patch, save_patch, PatchLoadError, PatchSaveError};
pub use rules::{RevisionHistory, RevisionStep, Rule};
pub use schema::{PatchEntry, PatchRecord, StreamRevision, CURRENT_STREAM_REVISION};
