use std::path::Path;

/// Trait for reporting scan and match progress.
///
/// The CLI implements it with indicatif. All methods have default no-op
/// implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self, _root: &Path) {}
    fn on_scan_progress(&self, _files_found: usize, _current_path: &Path) {}
    fn on_scan_complete(&self, _total_files: usize, _duration_secs: f64) {}
    fn on_populate_start(&self, _total_files: usize) {}
    fn on_populate_progress(&self, _files_done: usize, _total_files: usize) {}
    fn on_match_start(&self, _source_files: usize) {}
    fn on_rename_search_start(&self, _candidates: usize) {}
    fn on_match_complete(&self, _missing: usize, _duration_secs: f64) {}
    fn on_snapshot_written(&self, _records: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
