use std::path::Path;
use std::time::Instant;

use anyhow::{Context, bail};
use clap::Parser;
use log::{error, info};
use survey_traits::RunConfig;
use survey_traits::cli::{Cli, Command};
use survey_traits::pipeline;
use survey_traits::utils::logging::console::{print_manifest_summary, print_trait_summary};

#[global_allocator]
static ALLOC: snmalloc_rs::SnMalloc = snmalloc_rs::SnMalloc;

fn load_config(path: &Path) -> anyhow::Result<RunConfig> {
    RunConfig::load(path).with_context(|| format!("Failed to load run config {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Some(command) = Cli::parse().into_command() else {
        bail!("no run configuration given; see --help");
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let start = Instant::now();
    match command {
        Command::Run { config } => {
            let config = load_config(&config)?;
            info!(
                "Running {} survey(s) with {} worker thread(s)",
                config.surveys.len(),
                config.threads
            );
            let (report, manifest) = match pipeline::run(&config).await {
                Ok(done) => done,
                Err(e) => {
                    error!("Run failed: {e}");
                    return Err(e).context("trait modeling run failed");
                }
            };
            println!("Trait probabilities:");
            for (key, output) in &report.outputs {
                print_trait_summary(key, output);
            }
            print_manifest_summary(&manifest);
        }
        Command::Validate { config } => {
            let config = load_config(&config)?;
            let (outputs, manifest) = pipeline::validate_artifacts(&config)
                .context("trait artifact validation failed")?;
            println!("Trait probabilities:");
            for (key, output) in &outputs {
                print_trait_summary(key, output);
            }
            print_manifest_summary(&manifest);
        }
    }
    info!("Finished in {:?}", start.elapsed());
    Ok(())
}
