use std::{
    fs,
    io::{BufWriter, Write},
    path::Path,
};

use serde::Serialize;

use crate::interview::error::{InterviewError, persistence_error};

/// Writes `value` as pretty JSON, replacing `path` atomically.
///
/// The document lands in a sibling temp file first, is synced, and only then
/// renamed over the target, so readers see either the old or the new file.
pub fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), InterviewError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| {
            persistence_error(path, format!("failed to create '{}': {err}", parent.display()))
        })?;
    }

    let tmp_path = path.with_extension("json.tmp");
    let file = fs::File::create(&tmp_path).map_err(|err| {
        persistence_error(
            path,
            format!("failed to create temp file '{}': {err}", tmp_path.display()),
        )
    })?;
    {
        let mut writer = BufWriter::new(&file);
        serde_json::to_writer_pretty(&mut writer, value)
            .map_err(|err| persistence_error(path, format!("failed to serialize: {err}")))?;
        writer
            .write_all(b"\n")
            .and_then(|_| writer.flush())
            .map_err(|err| persistence_error(path, format!("failed to write: {err}")))?;
    }
    file.sync_all()
        .map_err(|err| persistence_error(path, format!("failed to sync temp file: {err}")))?;

    fs::rename(&tmp_path, path).map_err(|err| {
        persistence_error(
            path,
            format!("failed to move '{}' into place: {err}", tmp_path.display()),
        )
    })?;

    tracing::debug!(target: "interview", path = %path.display(), "json_persisted");
    Ok(())
}
