use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "dicomseg",
    version,
    about = "Segmentation commands for DICOM viewers: SEG, RTSS and PDF export"
)]
pub(super) struct Cli {
    /// Viewer configuration (YAML or JSON); overrides the session's `config`.
    #[arg(long, global = true)]
    pub(super) config: Option<PathBuf>,
    #[command(subcommand)]
    pub(super) command: Commands,
}

#[derive(Debug, Subcommand)]
pub(super) enum Commands {
    /// Inspect the command registry.
    #[command(name = "commands")]
    Catalog {
        #[command(subcommand)]
        command: CatalogCommand,
    },
    /// Rebuild a session and run its steps.
    Run {
        #[arg(long)]
        session: PathBuf,
        #[arg(long)]
        report: Option<PathBuf>,
        /// Directory downloads are written to.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Ask for report names on the terminal instead of the scripted answer.
        #[arg(long)]
        interactive: bool,
    },
    /// Print the label-map summary of every segmentation in a session.
    Inspect {
        #[arg(long)]
        session: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
pub(super) enum CatalogCommand {
    List,
}
