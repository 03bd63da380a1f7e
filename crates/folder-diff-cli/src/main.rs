mod commands;
mod logging;
mod progress;

use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use folder_diff_core::{
    compute_missing, snapshot, AppConfig, MatchOptions, ProgressReporter, ScannedTree,
    SilentReporter, SNAPSHOT_EXTENSION,
};
use progress::CliReporter;
use tracing::{debug, info, warn};

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let args = Cli::parse();
    let _guard = logging::init_logger(args.verbose);
    colored::control::set_override(io::stdout().is_terminal());

    debug!("Starting");
    let mut config =
        folder_diff_core::config::load_configuration().context("loading configuration")?;
    config.checksum |= args.crc;
    config.strict_renames |= args.strict_renames;
    config.follow_links |= args.follow_links;

    let trees = args.command.trees();
    info!("Action: {:?}", args.command);
    info!("Source: {}", trees.source.display());
    info!("Dest:   {}", trees.dest.display());

    let reporter: Arc<dyn ProgressReporter> = if io::stderr().is_terminal() {
        Arc::new(CliReporter::new())
    } else {
        Arc::new(SilentReporter)
    };

    let source = open_tree(&trees.source, trees.source_root.clone(), &config, &reporter);
    let dest = open_tree(&trees.dest, trees.dest_root.clone(), &config, &reporter);

    match args.command {
        Commands::Missing(_) => {
            run_missing(&source, &dest, MatchOptions::from_config(&config), reporter.as_ref())?
        }
        Commands::Savedb(_) => run_savedb(&source, &dest)?,
    }

    debug!("Done");
    Ok(())
}

/// An unusable root ends the process before anything is scanned.
fn open_tree(
    path: &Path,
    substitute_root: Option<PathBuf>,
    config: &AppConfig,
    reporter: &Arc<dyn ProgressReporter>,
) -> ScannedTree {
    let tree = match ScannedTree::open(path) {
        Ok(tree) => tree,
        Err(err) => {
            warn!("{}", err);
            process::exit(1);
        }
    };

    let tree = tree.with_config(config).with_reporter(reporter.clone());
    match substitute_root {
        Some(root) => tree.with_substitute_root(root),
        None => tree,
    }
}

fn run_missing(
    source: &ScannedTree,
    dest: &ScannedTree,
    options: MatchOptions,
    reporter: &dyn ProgressReporter,
) -> anyhow::Result<()> {
    let result = compute_missing(source, dest, options, reporter)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if result.all_found() {
        writeln!(out, "All files in Source are in Dest folder")?;
    } else {
        writeln!(
            out,
            "Listing {} file(s) in Source that are missing/different in Dest folder ({} scanned):",
            result.missing.len().to_string().red(),
            result.total_scanned
        )?;
        for file in &result.missing {
            writeln!(out, "{}", file.display_path().display())?;
        }
    }

    info!(
        "{} renamed/moved, {} missing, compared in {}",
        result.renamed.len().to_string().cyan(),
        result.missing.len().to_string().red(),
        format!("{:.2}s", result.duration.as_secs_f64()).green(),
    );
    Ok(())
}

fn run_savedb(source: &ScannedTree, dest: &ScannedTree) -> anyhow::Result<()> {
    if !dest.is_snapshot_backed() {
        bail!(
            "'{}' must be a file with .{} ending",
            dest.root().display(),
            SNAPSHOT_EXTENSION
        );
    }

    snapshot::save(source, dest.root())
        .with_context(|| format!("saving '{}'", source.root().display()))?;
    Ok(())
}
