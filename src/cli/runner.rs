use std::path::Path;
use std::sync::Arc;

use clap::Parser;

use crate::commands::list_commands;
use crate::config::{ViewerConfig, load_config};
use crate::runtime::StdinPrompt;
use crate::workflow::{
    SessionSpec, build_context, load_session, run_session, save_report, summarize_segmentations,
};

use super::types::{CatalogCommand, Cli, Commands};

fn resolve_config(path: Option<&Path>, spec: &SessionSpec) -> Result<ViewerConfig, String> {
    match path {
        Some(path) => load_config(path).map_err(|error| error.to_string()),
        None => Ok(spec.config.clone().unwrap_or_default()),
    }
}

pub fn run_cli() -> Result<(), String> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Catalog { command } => match command {
            CatalogCommand::List => {
                let schemas = list_commands();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&schemas).map_err(|error| error.to_string())?
                );
            }
        },
        Commands::Run {
            session,
            report,
            output,
            interactive,
        } => {
            let spec = load_session(&session).map_err(|error| error.to_string())?;
            let mut config = resolve_config(cli.config.as_deref(), &spec)?;
            if let Some(output) = output {
                config.output_dir = output;
            }
            let mut context = build_context(&spec, config).map_err(|error| error.to_string())?;
            if interactive {
                context = context.with_report_prompt(Arc::new(StdinPrompt));
            }
            let run_report = run_session(&spec, &context).map_err(|error| error.to_string())?;
            if let Some(report_path) = report {
                save_report(report_path, &run_report).map_err(|error| error.to_string())?;
            }
            println!(
                "{}",
                serde_json::to_string_pretty(&run_report).map_err(|error| error.to_string())?
            );
        }
        Commands::Inspect { session } => {
            let spec = load_session(&session).map_err(|error| error.to_string())?;
            let config = resolve_config(cli.config.as_deref(), &spec)?;
            let context = build_context(&spec, config).map_err(|error| error.to_string())?;
            let summaries = summarize_segmentations(&context);
            println!(
                "{}",
                serde_json::to_string_pretty(&summaries).map_err(|error| error.to_string())?
            );
        }
    }

    Ok(())
}
