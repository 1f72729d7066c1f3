pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "rankscope",
    about = "Rankscope operator CLI",
    long_about = "Operate Rankscope migrations, demo fixtures, config inspection, readiness checks, and offline region reports.",
    after_help = "Examples:\n  rankscope doctor --json\n  rankscope config\n  rankscope report --user user-demo --domain dom-acme"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo fixtures and verify the seed contract")]
    Seed,
    #[command(about = "Inspect effective configuration values with secrets redacted")]
    Config,
    #[command(about = "Validate config, database connectivity, and provider credential readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Build the canonical region report for one domain and print it as JSON")]
    Report {
        #[arg(long, help = "User id owning the domain")]
        user: String,
        #[arg(long, help = "Domain id to report on")]
        domain: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Report { user, domain } => commands::report::run(&user, &domain),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
