use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use log::{debug, info};
use std::process::ExitCode;

use am_crest::api::{CrestError, OperationKind};
use am_crest::cli::{Cli, Commands};
use am_crest::commands::{config, resource, token};
use am_crest::config::Config;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
    info!("Starting am-crest");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let Cli {
        server,
        realm,
        command,
        ..
    } = cli;

    match command {
        Commands::Config(command) => config::config_command(command),
        Commands::Create(args) => {
            let input = resource::create_input(args, realm)?;
            resource::run_command(&load_config(server)?, OperationKind::Create, input).await
        }
        Commands::Read(args) => {
            let input = resource::target_input(args, realm);
            resource::run_command(&load_config(server)?, OperationKind::Read, input).await
        }
        Commands::Update(args) => {
            let input = resource::payload_input(args, realm)?;
            resource::run_command(&load_config(server)?, OperationKind::Update, input).await
        }
        Commands::Delete(args) => {
            let input = resource::target_input(args, realm);
            resource::run_command(&load_config(server)?, OperationKind::Delete, input).await
        }
        Commands::Patch(args) => {
            let input = resource::payload_input(args, realm)?;
            resource::run_command(&load_config(server)?, OperationKind::Patch, input).await
        }
        Commands::Action(args) => {
            let input = resource::action_input(args, realm)?;
            resource::run_command(&load_config(server)?, OperationKind::Action, input).await
        }
        Commands::Query(args) => {
            let input = resource::payload_input(args, realm)?;
            resource::run_command(&load_config(server)?, OperationKind::Query, input).await
        }
        Commands::Token(command) => token::token_command(&load_config(server)?, command, realm).await,
        Commands::Discovery => token::discovery_command(&load_config(server)?, realm).await,
    }
}

/// Load the config with the command-line server override applied
fn load_config(server: Option<String>) -> Result<Config> {
    let mut config = Config::load()?;
    if let Some(server) = server {
        debug!("Server overridden on the command line: {}", server);
        config.server.url = server;
    }
    Ok(config)
}

fn report_error(error: &anyhow::Error) {
    match error.downcast_ref::<CrestError>() {
        Some(crest_error) => {
            eprintln!("{} [{}] {}", "Error".red().bold(), crest_error.kind(), crest_error);
            if let Some(status) = crest_error.status_code() {
                eprintln!("  {} {}", "Status:".bold(), status);
            }
            if let Some(body) = crest_error.body() {
                let body = serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string());
                eprintln!("  {} {}", "Body:".bold(), body);
            }
        }
        None => eprintln!("{} {:#}", "Error".red().bold(), error),
    }
}
