//! Atomic snapshot writes for the data file
//!
//! The snapshot is written to `<file>.tmp`, synced, then renamed over the
//! real file, so readers only ever see the old or the new snapshot.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type for atomic operations
pub type AtomicResult<T> = Result<T, AtomicError>;

/// Errors that can occur while writing a snapshot
#[derive(Debug, Error)]
pub enum AtomicError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> AtomicError + '_ {
    move |source| AtomicError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn temp_path(path: &Path) -> PathBuf {
    path.with_extension("tmp")
}

/// Atomically replace `path` with one line per item
pub fn atomic_write_lines<P, I>(path: P, lines: I) -> AtomicResult<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = String>,
{
    let path = path.as_ref();
    let temp = temp_path(path);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
    }

    let file = File::create(&temp).map_err(io_err(&temp))?;
    let mut writer = BufWriter::new(file);
    for line in lines {
        writer
            .write_all(line.as_bytes())
            .and_then(|_| writer.write_all(b"\n"))
            .map_err(io_err(&temp))?;
    }
    let file = writer
        .into_inner()
        .map_err(|e| io_err(&temp)(e.into_error()))?;
    file.sync_all().map_err(io_err(&temp))?;

    fs::rename(&temp, path).map_err(io_err(path))?;
    Ok(())
}

/// Remove a temp file left behind by an interrupted write.
/// Returns true if one was found.
pub fn remove_stale_temp<P: AsRef<Path>>(path: P) -> AtomicResult<bool> {
    let temp = temp_path(path.as_ref());
    if !temp.exists() {
        return Ok(false);
    }
    fs::remove_file(&temp).map_err(io_err(&temp))?;
    Ok(true)
}
