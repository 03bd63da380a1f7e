//! `.ifd` snapshots: a bincode-encoded list of file records.
//!
//! The format is private to this tool and carries no version field. The
//! scanned root is not stored, so snapshot files only resolve to absolute
//! paths when a substitute root is supplied.

use crate::error::{Error, Result};
use crate::file::ScannedFile;
use crate::tree::ScannedTree;
use bincode::Options;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotRecord {
    /// Raw OS bytes of the path, so names that are not UTF-8 survive.
    relative_path: Vec<u8>,
    normalized_path: String,
    size: Option<u64>,
    checksum: Option<u32>,
}

#[cfg(unix)]
fn path_to_bytes(path: &Path) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    path.as_os_str().as_bytes().to_vec()
}

#[cfg(unix)]
fn path_from_bytes(bytes: Vec<u8>) -> PathBuf {
    use std::ffi::OsString;
    use std::os::unix::ffi::OsStringExt;
    PathBuf::from(OsString::from_vec(bytes))
}

// Paths outside unix are stored as UTF-8; unpaired surrogates are replaced.
#[cfg(not(unix))]
fn path_to_bytes(path: &Path) -> Vec<u8> {
    path.to_string_lossy().into_owned().into_bytes()
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: Vec<u8>) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(&bytes).into_owned())
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

/// Fully scans `tree` and writes every file to `destination`, replacing
/// whatever was there. Returns the number of records written.
///
/// The write is not atomic: a failure part way can leave a truncated file.
pub fn save(tree: &ScannedTree, destination: &Path) -> Result<usize> {
    let start = Instant::now();
    tree.scan(true)?;
    tree.populate()?;

    let records: Vec<SnapshotRecord> = tree
        .files()?
        .iter()
        .map(|file| SnapshotRecord {
            relative_path: path_to_bytes(file.relative_path()),
            normalized_path: file.normalized_path().to_string(),
            size: file.cached_size(),
            checksum: file.cached_checksum(),
        })
        .collect();

    let bytes = codec()
        .serialize(&records)
        .map_err(|source| Error::SnapshotEncode {
            path: destination.to_path_buf(),
            source,
        })?;
    fs::write(destination, bytes).map_err(|e| Error::io("writing", destination, e))?;

    let duration = start.elapsed();
    info!(
        "Saved {} files from '{}' to '{}'",
        records.len(),
        tree.root().display(),
        destination.display()
    );
    tree.reporter()
        .on_snapshot_written(records.len(), duration.as_secs_f64());
    Ok(records.len())
}

/// Reads the records stored in `source`. Files are resolved against `root`
/// when one is given.
pub fn load(source: &Path, root: Option<Arc<Path>>) -> Result<Vec<ScannedFile>> {
    let bytes = fs::read(source).map_err(|e| Error::io("reading", source, e))?;
    let records: Vec<SnapshotRecord> =
        codec()
            .deserialize(&bytes)
            .map_err(|e| Error::CorruptSnapshot {
                path: source.to_path_buf(),
                reason: e.to_string(),
            })?;
    debug!("Loaded {} records from '{}'", records.len(), source.display());

    records
        .into_iter()
        .map(|record| {
            let relative_path = path_from_bytes(record.relative_path);
            if !relative_path.is_relative() {
                return Err(Error::CorruptSnapshot {
                    path: source.to_path_buf(),
                    reason: format!("record path '{}' is absolute", relative_path.display()),
                });
            }
            Ok(ScannedFile::restore(
                root.clone(),
                relative_path,
                record.normalized_path,
                record.size,
                record.checksum,
            ))
        })
        .collect()
}
