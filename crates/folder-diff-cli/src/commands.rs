use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "folder-diff")]
#[command(about = "Shows difference between two folders containing image files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// CRC check as well as size check
    #[arg(short, long, global = true)]
    pub crc: bool,

    /// Apply the CRC check to renamed/moved files too
    #[arg(long, global = true)]
    pub strict_renames: bool,

    /// Follow symbolic links while scanning folders
    #[arg(long, global = true)]
    pub follow_links: bool,

    /// More output (-v for info, -vv for debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List files in source that are missing or different in dest
    Missing(TreeArgs),
    /// Save a full scan of source to the dest .ifd file
    Savedb(TreeArgs),
}

impl Commands {
    pub fn trees(&self) -> &TreeArgs {
        match self {
            Commands::Missing(trees) | Commands::Savedb(trees) => trees,
        }
    }
}

#[derive(Debug, Args)]
pub struct TreeArgs {
    /// Source folder (or source.ifd)
    pub source: PathBuf,

    /// Destination folder (or dest.ifd)
    pub dest: PathBuf,

    /// Folder that a source .ifd's paths are relative to
    #[arg(long)]
    pub source_root: Option<PathBuf>,

    /// Folder that a dest .ifd's paths are relative to
    #[arg(long)]
    pub dest_root: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_missing_with_flags() {
        let cli = Cli::parse_from(["folder-diff", "missing", "src", "dst.ifd", "-c", "-vv"]);
        assert!(cli.crc);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Missing(_)));
        assert_eq!(cli.command.trees().dest, PathBuf::from("dst.ifd"));
    }

    #[test]
    fn test_parse_savedb() {
        let cli = Cli::parse_from(["folder-diff", "savedb", "photos", "photos.ifd"]);
        assert!(!cli.crc);
        assert!(matches!(cli.command, Commands::Savedb(_)));
    }
}
