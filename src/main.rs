use std::future::pending;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use crm_export::errors::EXIT_FAILURE;
use crm_export::{with_session, ChromiumLauncher, ReportRunner, RunConfig, RunError};
use crm_recipes::{catalog_with_file, Catalog};
use l6_observe::{init_tracing, ScreenshotSink, TracingOptions};
use tracing::{error, info};

/// crm-export - resilient CRM report exports
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ", built ", env!("BUILD_DATE"), ")"))]
#[command(propagate_version = true)]
struct Cli {
    /// Log level, overridden by RUST_LOG
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Extra recipes merged into the built-in catalog
    #[arg(long, global = true, value_name = "FILE")]
    recipes_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in, filter a report and request its export
    Run(RunArgs),

    /// List the available report recipes
    List,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Recipe id, see `crm-export list`
    recipe: String,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    #[arg(long, value_name = "DIR")]
    screenshots_dir: Option<PathBuf>,

    /// Per-operation timeout, e.g. `90s`
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    #[arg(long)]
    max_retries: Option<u32>,

    /// Quarter for date-range filters relative to today (-1 is the previous one)
    #[arg(
        long,
        allow_hyphen_values = true,
        value_parser = clap::value_parser!(i32).range(-400..=400)
    )]
    quarter_offset: Option<i32>,

    #[arg(long, value_name = "PATH")]
    chrome_path: Option<PathBuf>,
}

impl RunArgs {
    fn apply(&self, config: &mut RunConfig) {
        if self.headed {
            config.headless = false;
        }
        if let Some(dir) = &self.screenshots_dir {
            config.screenshots_dir = dir.clone();
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(max_retries) = self.max_retries {
            config.max_retries = max_retries;
        }
        if let Some(path) = &self.chrome_path {
            config.chrome_path = Some(path.clone());
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(&TracingOptions {
        default_level: cli.log_level.clone(),
        json: cli.json_logs,
        ansi: !cli.json_logs,
    });
    info!("Starting crm-export v{}", env!("CARGO_PKG_VERSION"));

    let result = match cli.command {
        Commands::Run(args) => cmd_run(args, cli.recipes_file.as_deref()).await,
        Commands::List => cmd_list(cli.recipes_file.as_deref()),
    };

    match result {
        Ok(()) => {
            info!("Command completed successfully");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("Command failed: {:#}", err);
            let code = err
                .downcast_ref::<RunError>()
                .map(RunError::exit_code)
                .unwrap_or(EXIT_FAILURE);
            ExitCode::from(code as u8)
        }
    }
}

fn load_catalog(recipes_file: Option<&Path>) -> Result<Catalog> {
    match recipes_file {
        Some(path) => catalog_with_file(path)
            .with_context(|| format!("loading recipes from {}", path.display())),
        None => Ok(Catalog::with_builtins()),
    }
}

async fn cmd_run(args: RunArgs, recipes_file: Option<&Path>) -> Result<()> {
    let catalog = load_catalog(recipes_file)?;
    let recipe = catalog.get(&args.recipe).map_err(RunError::from)?;

    let mut config = RunConfig::from_env().map_err(RunError::from)?;
    args.apply(&mut config);

    let sink = ScreenshotSink::new(&config.screenshots_dir);
    sink.prepare().await.map_err(RunError::from)?;

    println!("{} ({})", recipe.title, recipe.path());
    let runner = ReportRunner::new(recipe, &config, &sink).with_quarter_offset(args.quarter_offset);
    let launcher = ChromiumLauncher::new(config.cdp_config());
    let outcome = with_session(&launcher, shutdown_signal(), |page| async move {
        runner.run(&*page).await
    })
    .await;

    match outcome {
        Ok(summary) => {
            println!("\n{}", summary);
            println!("Screenshots: {}", sink.dir().display());
            Ok(())
        }
        Err(err) => {
            eprintln!("\nRun failed during {}: {}", err.stage(), err);
            eprintln!("Screenshots: {}", sink.dir().display());
            if !matches!(err, RunError::Interrupted) {
                eprintln!("Check the credentials, the menu path and that the report columns are visible.");
            }
            Err(err.into())
        }
    }
}

fn cmd_list(recipes_file: Option<&Path>) -> Result<()> {
    let catalog = load_catalog(recipes_file)?;
    for recipe in catalog.iter() {
        println!("{:<28} {}", recipe.id, recipe.title);
        println!("{:<28} {}", "", recipe.path());
        if !recipe.description.is_empty() {
            println!("{:<28} {}", "", recipe.description);
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        pending::<()>().await;
    }
}
