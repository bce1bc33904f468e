use anyhow::Context;
use clap::{Parser, Subcommand};
use roomcat::{import_from_paths, CatalogDb, FeedPaths, ImportConfig};
use std::path::PathBuf;
use tracing::{error, info};

/// Campus room catalog importer
#[derive(Parser, Debug)]
#[command(name = "roomcat")]
#[command(version, about = "Campus room catalog importer")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import the JSON feeds in a data directory into the catalog
    Import {
        /// Catalog database file (created if missing)
        #[arg(long, default_value = "app.db")]
        db: PathBuf,

        /// Directory holding room_types.json, features.json, rooms.json and classes.json
        #[arg(long, default_value = "data")]
        data: PathBuf,

        /// Optional JSON import config (default room type, placeholder ids)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the import report as JSON on stdout
        #[arg(long)]
        report_json: bool,
    },

    /// Print row counts of an existing catalog
    Stats {
        /// Catalog database file
        #[arg(long, default_value = "app.db")]
        db: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("roomcat=info".parse().expect("static directive")),
        )
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    match args.command {
        Command::Import {
            db,
            data,
            config,
            report_json,
        } => {
            let config = match config {
                Some(path) => ImportConfig::load_from_file(&path)?,
                None => ImportConfig::default(),
            };

            let catalog = CatalogDb::open(&db)
                .with_context(|| format!("Failed to open catalog {}", db.display()))?;

            info!("Importing feeds from {} into {}", data.display(), db.display());
            let report = match import_from_paths(&FeedPaths::from_dir(&data), &catalog, &config) {
                Ok(report) => report,
                Err(e) if e.is_feed_error() => {
                    return Err(e).context("Import aborted before any changes were written");
                }
                Err(e) => {
                    return Err(e).context("Import aborted; earlier stages remain committed");
                }
            };

            if report_json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            Ok(())
        }
        Command::Stats { db } => {
            let catalog = CatalogDb::open(&db)
                .with_context(|| format!("Failed to open catalog {}", db.display()))?;
            let counts = catalog.catalog_counts()?;
            println!("{}", serde_json::to_string_pretty(&counts)?);
            Ok(())
        }
    }
}
