//! Resource request desk CLI.

use clap::{ColorChoice, Parser};
use rreq_cli::logging::{LogConfig, LogFormat, init_logging};
use rreq_engine::RequestService;
use std::io::{self, IsTerminal};

mod cli;
mod commands;

use crate::cli::{Cli, Command, FulfillCommand, ItemCommand, LogFormatArg};
use crate::commands::{
    run_approve, run_create, run_fulfill_assign, run_fulfill_update, run_item_add,
    run_item_replace, run_list, run_show, run_status, run_update,
};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }

    let mut service = match RequestService::open(&cli.data_dir, &cli.incident) {
        Ok(service) => service,
        Err(error) => {
            eprintln!("error: failed to open incident store: {error}");
            std::process::exit(1);
        }
    };

    let result = match &cli.command {
        Command::Create(args) => run_create(&mut service, args),
        Command::List(args) => run_list(&service, args),
        Command::Show(args) => run_show(&service, args),
        Command::Update(args) => run_update(&mut service, args),
        Command::Item(ItemCommand::Add(args)) => run_item_add(&mut service, args),
        Command::Item(ItemCommand::Replace(args)) => run_item_replace(&mut service, args),
        Command::Status(args) => run_status(&mut service, args),
        Command::Approve(args) => run_approve(&mut service, args),
        Command::Fulfill(FulfillCommand::Assign(args)) => run_fulfill_assign(&mut service, args),
        Command::Fulfill(FulfillCommand::Update(args)) => run_fulfill_update(&mut service, args),
    };

    if let Err(error) = result {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !cli.verbosity.is_present();
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
