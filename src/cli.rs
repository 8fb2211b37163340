use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{self, CommandReport};

#[derive(Parser)]
#[command(name = "rollup")]
#[command(about = "Roll daily captures into monthly releases and yearly cold-storage bundles")]
#[command(version)]
struct Cli {
    /// Render the report as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Publish, consolidate and archive whatever the manifest makes due.
    Run,
    /// Show manifest counts, thresholds and the transitions a run would take.
    Status,
    /// Check tools, config, manifest and environment without side effects.
    Verify {
        /// Treat unknown ROLLUP_ environment variables as failures
        #[arg(long)]
        strict: bool,
    },
}

fn render(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!(
        "{}: {}",
        report.command,
        if report.ok { "ok" } else { "failed" }
    );
    for line in &report.details {
        println!("  {line}");
    }
    for issue in &report.issues {
        println!("  issue: {issue}");
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let report = match cli.command.unwrap_or(Command::Run) {
        Command::Run => commands::run::run()?,
        Command::Status => commands::status::run()?,
        Command::Verify { strict } => {
            commands::verify::run(&commands::verify::VerifyOptions { strict })?
        }
    };

    render(&report, cli.json)?;
    if !report.ok {
        std::process::exit(1);
    }
    Ok(())
}
