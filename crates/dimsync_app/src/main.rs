mod commands;
mod config;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use dimsync_engine::Resource;
use dimsync_logging::{dimsync_error, LogDestination};
use log::LevelFilter;

use crate::commands::LookupTarget;
use crate::config::AppConfig;

#[derive(Debug, Parser)]
#[command(name = "dimsync", about = "Publish Shoper product dimensions to a spreadsheet")]
struct Cli {
    /// RON configuration file.
    #[arg(long, default_value = "dimsync.ron")]
    config: PathBuf,

    /// Also write the log to ./dimsync.log.
    #[arg(long)]
    log_file: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Download a catalog resource and refresh its snapshot.
    Fetch {
        #[arg(long, default_value = "products", value_parser = parse_resource)]
        resource: Resource,
        /// Fetch every known resource.
        #[arg(long, conflicts_with = "resource")]
        all: bool,
    },
    /// Classify products and publish the dimension sheet.
    Export {
        /// Read products from the last snapshot instead of the shop.
        #[arg(long)]
        offline: bool,
        /// Write the sheet to a CSV file instead of Google Sheets.
        #[arg(long, value_name = "PATH")]
        csv: Option<PathBuf>,
    },
    /// Show one product and its resolved dimensions.
    Lookup {
        #[arg(long, conflicts_with = "id", required_unless_present = "id")]
        code: Option<String>,
        #[arg(long)]
        id: Option<i64>,
    },
}

fn parse_resource(value: &str) -> Result<Resource, String> {
    Resource::from_path(value).ok_or_else(|| {
        let known: Vec<_> = Resource::ALL.iter().map(|r| r.path()).collect();
        format!("unknown resource '{value}', expected one of: {}", known.join(", "))
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let destination = if cli.log_file {
        LogDestination::Both
    } else {
        LogDestination::Terminal
    };
    dimsync_logging::initialize(destination, LevelFilter::Info, Path::new("./dimsync.log"));

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            dimsync_error!("{err:#}");
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = AppConfig::load(&cli.config)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        match cli.command {
            Command::Fetch { resource, all } => {
                let resources: Vec<Resource> = if all {
                    Resource::ALL.to_vec()
                } else {
                    vec![resource]
                };
                commands::fetch(&config, &resources).await?;
                Ok(true)
            }
            Command::Export { offline, csv } => commands::export(&config, offline, csv).await,
            Command::Lookup { code, id } => {
                let target = match (code, id) {
                    (Some(code), _) => LookupTarget::Code(code),
                    (None, Some(id)) => LookupTarget::Id(id),
                    (None, None) => anyhow::bail!("pass --code or --id"),
                };
                commands::lookup(&config, target).await?;
                Ok(true)
            }
        }
    })
}
