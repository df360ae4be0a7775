//! cdnizer CLI: upload static assets to object storage and print their CDN URLs.
//!
//! Configuration comes from CDNIZER_* environment variables (and `.env.local` / `.env`).

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use cdnizer_cli::{
    absolute_from, init_tracing, load_config, load_config_unchecked, print_json, Summary,
};
use cdnizer_core::normalize_path;
use cdnizer_pipeline::{AssetHook, CacheStore, ConsoleReport, ReportSink, UploadCoordinator};
use clap::{Parser, Subcommand};
use futures::future::join_all;

#[derive(Parser)]
#[command(name = "cdnizer", about = "Static asset CDN uploader")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload files concurrently, skipping ones already in the cache
    Upload {
        /// Paths of the files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Print results as JSON instead of the colored report
        #[arg(long)]
        json: bool,
    },
    /// Run the build hook on one file and print the replacement module, if any
    Transform {
        /// Path of the asset
        file: PathBuf,
    },
    /// Upload cache operations
    Cache {
        #[command(subcommand)]
        sub: CacheCommands,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// List recorded keys and the source paths they were uploaded from
    List {
        #[arg(long)]
        json: bool,
    },
    /// Print the location of the cache file
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let cwd = std::env::current_dir().context("Failed to read current directory")?;

    match cli.command {
        Commands::Upload { files, json } => {
            let config = load_config()?;
            let coordinator = UploadCoordinator::from_config(&config).await?;
            let files: Vec<PathBuf> = files.iter().map(|f| absolute_from(&cwd, f)).collect();

            let report = ConsoleReport;
            if !json {
                report.banner();
            }

            let outcomes = join_all(files.iter().map(|file| coordinator.upload(file))).await;

            let mut results = Vec::with_capacity(outcomes.len());
            for (file, outcome) in files.iter().zip(outcomes) {
                let result =
                    outcome.with_context(|| format!("Failed to upload {}", file.display()))?;
                if !json {
                    report.asset(&normalize_path(file), &result);
                }
                results.push(result);
            }

            if json {
                print_json(&results)?;
            } else {
                println!("{}", Summary::from_results(&results));
            }
        }
        Commands::Transform { file } => {
            let config = load_config()?;
            let hook = AssetHook::from_config(&config).await?;
            let file = absolute_from(&cwd, &file);

            if let Some(module) = hook
                .transform(&file)
                .await
                .with_context(|| format!("Failed to transform {}", file.display()))?
            {
                println!("{}", module);
            }
        }
        Commands::Cache { sub } => {
            let config = load_config_unchecked()?;
            let cache_path = config.cache_path();

            match sub {
                CacheCommands::List { json } => {
                    let cache = CacheStore::load(&cache_path, true)
                        .await
                        .with_context(|| {
                            format!("Failed to load cache {}", cache_path.display())
                        })?;
                    let entries = cache.entries().await;

                    if json {
                        let map: BTreeMap<_, _> = entries.into_iter().collect();
                        print_json(&map)?;
                    } else {
                        for (key, source) in entries {
                            println!("{} <- {}", key, source);
                        }
                    }
                }
                CacheCommands::Path => {
                    println!("{}", cache_path.display());
                }
            }
        }
    }

    Ok(())
}
