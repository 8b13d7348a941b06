mod cli;

use abmerge::pipeline::{self, MergeMode, MergeReport};
use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use cli::output::{OutputConfig, format_timestamp};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let output = OutputConfig::from_global(cli.json, cli.verbose, cli.quiet, cli.no_color);

    let job = cli.to_job().context("resolving input paths")?;
    tracing::debug!(?job, "starting");

    let mut progress = output.progress();
    let report = pipeline::run(&job, &mut progress)
        .with_context(|| format!("merging into {}", job.output.display()))?;

    print_report(&report, &output)
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "abmerge=debug" } else { "abmerge=warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_report(report: &MergeReport, output: &OutputConfig) -> Result<()> {
    if output.json {
        return output.print_json(report);
    }

    match report.mode {
        MergeMode::DryRun => {
            let rows: Vec<Vec<String>> = report
                .chapters
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    vec![
                        i.to_string(),
                        format_timestamp(c.start_ms),
                        format_timestamp(c.end_ms),
                        c.files.len().to_string(),
                        c.title.clone(),
                    ]
                })
                .collect();
            output.print_table(&["#", "START", "END", "FILES", "TITLE"], &rows);
        }
        MergeMode::Encoded => output.status(&format!(
            "Wrote {} ({} chapters, {} files)",
            report.output.display(),
            report.chapters.len(),
            report.files
        )),
        MergeMode::Reattached => output.status(&format!(
            "Updated metadata of {} ({} chapters)",
            report.output.display(),
            report.chapters.len()
        )),
    }

    if output.verbose {
        for (key, value) in report.tags.iter() {
            output.detail(&format!("  {key} = {value}"));
        }
    }
    Ok(())
}
