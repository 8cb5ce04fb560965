use std::path::PathBuf;

use accord_cli::config::load_config;
use accord_cli::runtime::{init_logging, load_job, load_natives, load_page, registry_with, run_fixture_job};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use element_catalog::normalize;
use page_port::fixture::FixturePage;
use tracing::{error, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (overrides the configured one)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a job against a fixture page and print the report
    Run(RunArgs),

    /// Print the element catalog of a fixture page
    Catalog(PageArgs),

    /// Print normalized forms of XPaths
    Normalize {
        #[arg(required = true)]
        xpaths: Vec<String>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Job file (YAML or JSON)
    #[arg(long, value_name = "FILE")]
    job: PathBuf,

    /// Fixture page (YAML or JSON)
    #[arg(long, value_name = "FILE")]
    page: PathBuf,

    /// Replay a captured native result, as which=file.json
    #[arg(long = "native", value_name = "WHICH=FILE")]
    natives: Vec<String>,
}

#[derive(Args)]
struct PageArgs {
    /// Fixture page (YAML or JSON)
    #[arg(long, value_name = "FILE")]
    page: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = load_config(cli.config.as_deref()).await?;
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| loaded.config.log_level.clone());
    init_logging(&level, cli.debug)?;
    loaded.log_source();

    let result = match cli.command {
        Commands::Run(args) => cmd_run(args, &loaded.config).await,
        Commands::Catalog(args) => cmd_catalog(args).await,
        Commands::Normalize { xpaths } => {
            for xpath in xpaths {
                println!("{}", normalize(&xpath));
            }
            Ok(())
        }
    };

    if let Err(err) = &result {
        error!("Command failed: {err:#}");
    }
    result
}

async fn cmd_run(args: RunArgs, config: &accord_cli::AccordConfig) -> Result<()> {
    let job = load_job(&args.job).await?;
    let document = load_page(&args.page).await?;
    let natives = load_natives(&args.natives).await?;
    info!(url = %job.target.url, acts = job.acts.len(), "running job");
    let report = run_fixture_job(config, job, document, registry_with(natives)).await;
    let json = serde_json::to_string_pretty(&report).context("serializing report")?;
    println!("{json}");
    Ok(())
}

async fn cmd_catalog(args: PageArgs) -> Result<()> {
    let document = load_page(&args.page).await?;
    let page = FixturePage::new(document);
    let catalog = element_catalog::build(&page)
        .await
        .context("building catalog")?;
    println!("{}", serde_json::to_string_pretty(&catalog)?);
    Ok(())
}
