use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::file::ScannedFile;
use crate::progress::ProgressReporter;
use crate::tree::ScannedTree;
use ahash::AHashSet;
use rayon::prelude::*;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default)]
pub struct MatchOptions {
    /// Require equal CRCs on top of equal sizes for same-path matches.
    pub use_checksum: bool,
    /// Also require equal CRCs in the rename/move search. Off by default, in
    /// which case that search compares sizes only whatever `use_checksum` says.
    pub strict_renames: bool,
}

impl MatchOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            use_checksum: config.checksum,
            strict_renames: config.strict_renames,
        }
    }

    fn rename_checksum(&self) -> bool {
        self.use_checksum && self.strict_renames
    }
}

/// A source file that was only found under a different path.
#[derive(Debug, Clone, Copy)]
pub struct RenamedFile<'a> {
    pub source: &'a ScannedFile,
    pub destination: &'a ScannedFile,
}

#[derive(Debug)]
pub struct MatchResult<'a> {
    /// Source files with no counterpart in the destination, in source
    /// discovery order.
    pub missing: Vec<&'a ScannedFile>,
    /// Source files recovered by the rename/move search.
    pub renamed: Vec<RenamedFile<'a>>,
    pub total_scanned: usize,
    pub duration: Duration,
}

impl MatchResult<'_> {
    pub fn all_found(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Finds the files of `source` that have no equivalent in `dest`.
///
/// Pass 1 only looks at destination files with the same normalized path.
/// Whatever is left goes through pass 2, which tries every destination file
/// in discovery order and takes the first equivalent one as a rename/move.
/// Any error aborts the whole comparison. Every file of a pass is checked
/// before its results are gathered in source order, so the error returned is
/// the one of the earliest failing source file.
pub fn compute_missing<'a>(
    source: &'a ScannedTree,
    dest: &'a ScannedTree,
    options: MatchOptions,
    reporter: &dyn ProgressReporter,
) -> Result<MatchResult<'a>> {
    let start = Instant::now();
    let dest_paths = dest.normalized_paths()?;
    let source_files = source.files()?;
    reporter.on_match_start(source_files.len());

    let not_found: Vec<&ScannedFile> = source_files
        .par_iter()
        .map(|file| {
            let found = find_at_same_path(file, dest, &dest_paths, options.use_checksum)?;
            Ok::<_, Error>((!found).then_some(file))
        })
        .collect::<Vec<_>>()
        .into_iter()
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .flatten()
        .collect();

    reporter.on_rename_search_start(not_found.len());
    let dest_files = dest.files()?;
    let rename_checksum = options.rename_checksum();
    let outcomes: Vec<(&ScannedFile, Option<&ScannedFile>)> = not_found
        .par_iter()
        .map(|&file| {
            info!(
                "Trying to find renamed/moved file {}",
                file.display_path().display()
            );
            find_renamed(file, dest_files, rename_checksum).map(|found| (file, found))
        })
        .collect::<Vec<_>>()
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

    let mut missing = Vec::new();
    let mut renamed = Vec::new();
    for (file, found) in outcomes {
        match found {
            Some(destination) => {
                info!(
                    "{} renamed/moved to {}",
                    file.display_path().display(),
                    destination.display_path().display()
                );
                renamed.push(RenamedFile {
                    source: file,
                    destination,
                });
            }
            None => missing.push(file),
        }
    }

    let duration = start.elapsed();
    reporter.on_match_complete(missing.len(), duration.as_secs_f64());
    Ok(MatchResult {
        missing,
        renamed,
        total_scanned: source_files.len(),
        duration,
    })
}

fn find_at_same_path(
    file: &ScannedFile,
    dest: &ScannedTree,
    dest_paths: &AHashSet<&str>,
    use_checksum: bool,
) -> Result<bool> {
    let normalized = file.normalized_path();
    if !dest_paths.contains(normalized) {
        debug!("{} not in dest", file);
        return Ok(false);
    }

    for candidate in dest.files_at_normalized_path(normalized)? {
        if file.equivalent_to(candidate, use_checksum)? {
            debug!("{} found in dest", file);
            return Ok(true);
        }
    }

    debug!("{} not in dest (file(s) with same name found though)", file);
    Ok(false)
}

fn find_renamed<'a>(
    file: &ScannedFile,
    dest_files: &'a [ScannedFile],
    use_checksum: bool,
) -> Result<Option<&'a ScannedFile>> {
    for candidate in dest_files {
        if file.equivalent_to(candidate, use_checksum)? {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}
