mod app;
mod cli;
mod config;
mod effects;
mod logging;
mod render;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use engine_logging::{engine_error, engine_info};
use receipt_core::{build_receipt_url, QrVariant};
use receipt_engine::{provision_terminal_key, EngineHandle};

use crate::app::Session;
use crate::cli::{Cli, Command};
use crate::config::{AppConfig, DEFAULT_CONFIG_FILE};
use crate::effects::EffectRunner;
use crate::logging::LogDestination;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            engine_error!("{:#}", err);
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<bool> {
    let explicit = cli.config.is_some();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    if let Command::InitConfig { path } = &cli.command {
        logging::initialize(LogDestination::Terminal, logging::level_for_verbosity(cli.verbose));
        let target = path.clone().unwrap_or(config_path);
        AppConfig::write_default(&target)?;
        println!("Wrote {}", target.display());
        return Ok(true);
    }

    let config = AppConfig::load(&config_path, explicit)?.apply(cli.overrides());
    let destination = if config.log_to_file {
        LogDestination::Both
    } else {
        LogDestination::Terminal
    };
    logging::initialize(destination, logging::level_for_verbosity(cli.verbose));
    config.validate()?;

    match cli.command {
        Command::Link { token } => {
            println!("{}", build_receipt_url(&config.receipt_domain, &token));
            Ok(true)
        }
        Command::ProvisionKey { pepper } => {
            let key = provision_terminal_key(&pepper)?;
            println!("api_key:    {}", key.api_key);
            println!("key_prefix: {}", key.key_prefix);
            println!("key_hash:   {}", key.key_hash);
            Ok(true)
        }
        Command::Qr {
            token,
            branded,
            out,
            ..
        } => {
            let variant = if branded {
                QrVariant::Branded
            } else {
                QrVariant::Plain
            };
            let mut session = start_session(&config)?;
            session.show_qr(&config.receipt_domain, &token, variant, out.as_deref())
        }
        Command::Preview { token_id } => start_session(&config)?.show_preview(&token_id),
        Command::Scan { text } => {
            let stdin = io::stdin();
            start_session(&config)?.scan(text, stdin.lock())
        }
        Command::InitConfig { .. } => Ok(true),
    }
}

fn start_session(config: &AppConfig) -> anyhow::Result<Session<io::Stdout>> {
    let engine = EngineHandle::new(config.engine_config()).context("starting engine")?;
    engine_info!("Engine started against {}", config.functions_base_url);
    Ok(Session::new(EffectRunner::new(engine), io::stdout()))
}
