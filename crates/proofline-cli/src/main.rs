//! Proofline CLI - Proofread documents from the command line.

use clap::Parser;
use proofline_cli::commands;
use proofline_cli::{AppConfig, Cli, Command, Formatter};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> proofline_cli::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load config, then let flags and environment override it
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_overrides(&cli);
    config.validate()?;

    proofline_cli::init_logging(&config.log_level);

    // Determine output format
    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    let formatter = Formatter::new(format, color_enabled);
    let rules = config.rule_set()?;

    match cli.command {
        Command::Rules(args) => {
            commands::execute_rules(args, &rules, &formatter)?;
        }
        cmd => {
            // Commands that need the task database
            let service = proofline_cli::open_service(&config, rules)?;

            match cmd {
                Command::Correct(args) => {
                    commands::execute_correct(args, &service, &formatter).await?;
                }
                Command::Status(args) => {
                    commands::execute_status(args, &service, &formatter)?;
                }
                Command::List(args) => {
                    commands::execute_list(args, &service, &formatter)?;
                }
                Command::Recover => {
                    commands::execute_recover(&service, &formatter)?;
                }
                Command::Rules(_) => unreachable!(),
            }
        }
    }

    Ok(())
}
