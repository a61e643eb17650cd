mod export;
mod gallery;
mod image;
mod memory;
mod serve;

mod util;

use clap::parser::ValueSource;
use clap::{Arg, Command};
use embrace::{config, Config};
use tokio_util::sync::CancellationToken;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    // Config file in the current directory is optional, defaults apply
    // otherwise. A different file can be provided with `--config`.
    let mut config: Config = config::load().unwrap_or_default();

    let matches = cmd().get_matches();

    if let Some(config_path) = matches.get_one::<String>("config") {
        config = config::load_from(config_path)?;
    }

    // Only override the configured level if explicitly asked to.
    if matches.value_source("verbosity") == Some(ValueSource::CommandLine) {
        if let Some(level) = matches.get_one::<String>("verbosity") {
            config.tracing.level = level.parse()?;
        }
    }

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                println!("Initiating graceful shutdown...");
            }
            cancel.cancel();
        });
    }

    match matches.subcommand() {
        Some(("serve", _)) => serve::run(config, cancel.clone()).await?,
        Some(("gallery", m)) => gallery::run(m, config).await?,
        Some(("image", m)) => image::run(m, config).await?,
        Some(("memory", m)) => memory::run(m, config).await?,
        Some(("export", m)) => export::run(m, config).await?,
        _ => unreachable!("subcommand is required"),
    }

    Ok(())
}

pub fn cmd() -> Command {
    Command::new("embrace")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .infer_subcommands(true)
        .version(VERSION)
        .author(AUTHORS)
        .about("Serve and manage the gallery and memory images.")
        .subcommand(serve::cmd())
        .subcommand(gallery::cmd())
        .subcommand(image::cmd())
        .subcommand(memory::cmd())
        .subcommand(export::cmd())
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("PATH")
                .global(true)
                .help("Path to the config file"),
        )
        .arg(
            Arg::new("verbosity")
                .long("verbosity")
                .short('v')
                .display_order(100)
                .value_name("level")
                .default_value("info")
                .value_parser(["trace", "debug", "info", "warn", "error", "none"])
                .global(true)
                .help("Set the verbosity of the log output"),
        )
}
