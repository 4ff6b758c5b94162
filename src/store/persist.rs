//! JSON-lines snapshot format
//!
//! One record per line, tagged by `record`: `{"record":"user",...}` or
//! `{"record":"entry",...}`. Lines that fail to parse are skipped.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{StoreData, StoreError, StoreResult};
use crate::types::{Entry, User};
use crate::utils::{atomic_write_lines, remove_stale_temp};

#[derive(Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "snake_case")]
enum Record {
    User(User),
    Entry(Entry),
}

pub(super) fn load(path: &Path) -> StoreResult<StoreData> {
    if remove_stale_temp(path)? {
        tracing::warn!(path = %path.display(), "Removed leftover temp file from an interrupted write");
    }

    if !path.exists() {
        return Ok(StoreData::default());
    }

    let content = fs::read_to_string(path).map_err(|source| StoreError::Load {
        path: path.to_path_buf(),
        source,
    })?;

    let mut data = StoreData::default();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<Record>(line) {
            Ok(Record::User(user)) => data.users.push(user),
            Ok(Record::Entry(entry)) => data.entries.push(entry),
            Err(e) => tracing::warn!(line = index + 1, error = %e, "Skipping unreadable record"),
        }
    }

    Ok(data)
}

pub(super) fn save(path: &Path, data: &StoreData) -> StoreResult<()> {
    let mut lines = Vec::with_capacity(data.users.len() + data.entries.len());
    for user in &data.users {
        lines.push(serde_json::to_string(&Record::User(user.clone()))?);
    }
    for entry in &data.entries {
        lines.push(serde_json::to_string(&Record::Entry(entry.clone()))?);
    }

    atomic_write_lines(path, lines)?;
    Ok(())
}
