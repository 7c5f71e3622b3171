use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

use thiserror::Error;

use driftline_fx_sdk::ParamError;

use crate::PatchRecord;

#[derive(Debug, Error)]
pub enum PatchSaveError {
    #[error("io error while saving patch: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode patch: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum PatchLoadError {
    #[error("io error while loading patch: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse patch file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("no registered effect type `{0}`")]
    UnknownEffect(String),
    #[error("patch rejected by effect instance: {0}")]
    Install(#[from] ParamError),
}

/// Writes a patch record as JSON. Records always carry their revision tag;
/// the encoding tolerates unknown fields on the way back in, so newer
/// builds may extend it without breaking older readers.
pub fn save_patch(path: &Path, record: &PatchRecord) -> Result<(), PatchSaveError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, record)?;
    Ok(())
}

/// Reads a patch record from JSON. The result still has to pass through
/// [`migrate`](crate::migrate) before it may be installed into an instance.
pub fn load_patch(path: &Path) -> Result<PatchRecord, PatchLoadError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let record = serde_json::from_reader(reader)?;
    Ok(record)
}
