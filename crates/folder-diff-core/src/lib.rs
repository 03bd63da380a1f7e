pub mod checksum;
pub mod config;
pub mod error;
pub mod file;
pub mod matcher;
pub mod path;
pub mod progress;
pub mod snapshot;
pub mod tree;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use file::ScannedFile;
pub use matcher::{compute_missing, MatchOptions, MatchResult, RenamedFile};
pub use progress::{ProgressReporter, SilentReporter};
pub use tree::{ScannedTree, TreeKind, SNAPSHOT_EXTENSION};
