use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::file::ScannedFile;
use crate::progress::{ProgressReporter, SilentReporter};
use crate::snapshot;
use ahash::{AHashMap, AHashSet};
use once_cell::sync::OnceCell;
use rayon::prelude::*;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Extension (without the dot) that marks a root as a snapshot file.
pub const SNAPSHOT_EXTENSION: &str = "ifd";

/// What a tree reads its files from. Decided once, in [`ScannedTree::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeKind {
    Directory,
    Snapshot,
}

/// The files below one root, discovered at most once.
///
/// The first accessor to need the file list triggers the scan: a recursive
/// walk for a directory, a snapshot load otherwise. Concurrent first callers
/// wait for a single scan.
pub struct ScannedTree {
    root: PathBuf,
    kind: TreeKind,
    file_root: Option<Arc<Path>>,
    follow_links: bool,
    progress_interval: usize,
    reporter: Arc<dyn ProgressReporter>,
    index: OnceCell<TreeIndex>,
}

#[derive(Default)]
struct TreeIndex {
    files: Vec<ScannedFile>,
    by_path: AHashMap<PathBuf, Vec<usize>>,
    by_normalized: AHashMap<String, Vec<usize>>,
}

impl ScannedTree {
    /// Accepts an existing directory or any path with the `.ifd` extension.
    /// The snapshot itself does not have to exist yet (it may be a `savedb`
    /// target).
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        debug!("ScannedTree: '{}'", root.display());

        let (kind, file_root) = if root.is_dir() {
            let file_root: Arc<Path> = Arc::from(root.as_path());
            (TreeKind::Directory, Some(file_root))
        } else if root.extension().is_some_and(|ext| ext == SNAPSHOT_EXTENSION) {
            (TreeKind::Snapshot, None)
        } else {
            return Err(Error::InvalidRoot(root));
        };

        let defaults = AppConfig::default();
        Ok(Self {
            root,
            kind,
            file_root,
            follow_links: defaults.follow_links,
            progress_interval: defaults.progress_interval,
            reporter: Arc::new(SilentReporter),
            index: OnceCell::new(),
        })
    }

    pub fn with_config(mut self, config: &AppConfig) -> Self {
        self.follow_links = config.follow_links;
        self.progress_interval = config.progress_interval;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Folder that a snapshot's relative paths are resolved against.
    /// Directory trees always use their own root and ignore this.
    pub fn with_substitute_root(mut self, root: impl Into<PathBuf>) -> Self {
        if self.kind == TreeKind::Snapshot {
            let root: PathBuf = root.into();
            self.file_root = Some(Arc::from(root.as_path()));
        } else {
            warn!(
                "Ignoring substitute root for folder '{}'",
                self.root.display()
            );
        }
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn kind(&self) -> TreeKind {
        self.kind
    }

    pub fn is_snapshot_backed(&self) -> bool {
        self.kind == TreeKind::Snapshot
    }

    pub fn is_scanned(&self) -> bool {
        self.index.get().is_some()
    }

    pub(crate) fn reporter(&self) -> &dyn ProgressReporter {
        self.reporter.as_ref()
    }

    /// Scans the tree if that has not happened yet. With `full` the files
    /// are populated right after discovery; asking for a full scan of an
    /// already scanned tree only logs a warning.
    pub fn scan(&self, full: bool) -> Result<()> {
        self.ensure_index(full).map(|_| ())
    }

    /// Populates every file in parallel. Already populated files cost nothing.
    pub fn populate(&self) -> Result<()> {
        let files = self.files()?;
        let total = files.len();
        let done = AtomicUsize::new(0);

        self.reporter.on_populate_start(total);
        files.par_iter().try_for_each(|file| {
            file.populate()?;
            let done = done.fetch_add(1, Ordering::Relaxed) + 1;
            self.reporter.on_populate_progress(done, total);
            Ok::<_, Error>(())
        })
    }

    /// Files in discovery order.
    pub fn files(&self) -> Result<&[ScannedFile]> {
        Ok(&self.index()?.files)
    }

    /// Distinct normalized paths present in the tree.
    pub fn normalized_paths(&self) -> Result<AHashSet<&str>> {
        Ok(self
            .index()?
            .by_normalized
            .keys()
            .map(String::as_str)
            .collect())
    }

    pub fn contains_normalized_path(&self, normalized_path: &str) -> Result<bool> {
        Ok(self.index()?.by_normalized.contains_key(normalized_path))
    }

    /// Every file whose normalized path is `normalized_path`, in discovery
    /// order. Case folding can put more than one file in the same bucket.
    pub fn files_at_normalized_path(&self, normalized_path: &str) -> Result<Vec<&ScannedFile>> {
        let index = self.index()?;
        Ok(index.lookup(index.by_normalized.get(normalized_path)))
    }

    /// Files stored under exactly this relative path.
    pub fn files_at_path(&self, relative_path: &Path) -> Result<Vec<&ScannedFile>> {
        let index = self.index()?;
        Ok(index.lookup(index.by_path.get(relative_path)))
    }

    fn index(&self) -> Result<&TreeIndex> {
        self.ensure_index(false)
    }

    fn ensure_index(&self, full: bool) -> Result<&TreeIndex> {
        if let Some(index) = self.index.get() {
            if full {
                warn!(
                    "Full scan of '{}' requested after a scan has been performed",
                    self.root.display()
                );
            }
            return Ok(index);
        }

        let mut scanned_now = false;
        let index = self.index.get_or_try_init(|| {
            scanned_now = true;
            self.build_index()
        })?;

        if full && scanned_now {
            self.populate()?;
        }
        Ok(index)
    }

    fn build_index(&self) -> Result<TreeIndex> {
        let start = Instant::now();
        self.reporter.on_scan_start(&self.root);

        let mut index = TreeIndex::default();
        match self.kind {
            TreeKind::Directory => self.walk(&mut index)?,
            TreeKind::Snapshot => {
                for file in snapshot::load(&self.root, self.file_root.clone())? {
                    self.add(&mut index, file);
                }
            }
        }

        let duration = start.elapsed();
        debug!(
            "Scan of '{}' completed in {:.2}s, {} files",
            self.root.display(),
            duration.as_secs_f64(),
            index.files.len()
        );
        self.reporter
            .on_scan_complete(index.files.len(), duration.as_secs_f64());
        Ok(index)
    }

    fn walk(&self, index: &mut TreeIndex) -> Result<()> {
        let walker = WalkDir::new(&self.root)
            .follow_links(self.follow_links)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(|e| walk_error(&self.root, e))?;
            if !is_file_entry(&entry) {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let file = ScannedFile::new(self.file_root.clone(), relative.to_path_buf());
            self.add(index, file);
        }
        Ok(())
    }

    fn add(&self, index: &mut TreeIndex, file: ScannedFile) {
        let position = index.files.len();
        index
            .by_path
            .entry(file.relative_path().to_path_buf())
            .or_default()
            .push(position);
        index
            .by_normalized
            .entry(file.normalized_path().to_string())
            .or_default()
            .push(position);

        let found = position + 1;
        if found % self.progress_interval.max(1) == 0 {
            info!("Scanned {} files", found);
            self.reporter.on_scan_progress(found, file.relative_path());
        }
        index.files.push(file);
    }
}

impl TreeIndex {
    fn lookup(&self, positions: Option<&Vec<usize>>) -> Vec<&ScannedFile> {
        positions
            .map(|positions| positions.iter().map(|&i| &self.files[i]).collect())
            .unwrap_or_default()
    }
}

impl fmt::Debug for ScannedTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScannedTree")
            .field("root", &self.root)
            .field("kind", &self.kind)
            .field("file_root", &self.file_root)
            .field("scanned", &self.is_scanned())
            .finish()
    }
}

/// Regular files, plus symlinks that do not point at a directory. Without
/// `follow_links` the walker reports links as links; they are kept so that a
/// dangling one fails later when its size is read.
fn is_file_entry(entry: &walkdir::DirEntry) -> bool {
    let file_type = entry.file_type();
    if file_type.is_symlink() {
        return !fs::metadata(entry.path()).is_ok_and(|meta| meta.is_dir());
    }
    file_type.is_file()
}

fn walk_error(root: &Path, err: walkdir::Error) -> Error {
    let path = err.path().unwrap_or(root).to_path_buf();
    Error::io("walking", path, io::Error::from(err))
}
