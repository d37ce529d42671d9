#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for building and checking the popbuilder stores.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use popbuilder_database::DbError;
use popbuilder_database::db::{PopulationStores, count_zones};
use popbuilder_database::load::build_stores_from_csv;
use popbuilder_database::paths::{DEFAULT_DB_DIR, detail_db_path, summary_db_path};

#[derive(Parser)]
#[command(name = "popbuilder_ingest", about = "Population store builder")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build both population stores from a CSV extract of 5-year bands
    Build {
        /// CSV file with a `code` column and one column per detail band
        /// (`p_0_4` .. `f_90`)
        #[arg(long)]
        input: PathBuf,
        /// Directory the stores are written to. Existing stores are replaced.
        #[arg(long, default_value = DEFAULT_DB_DIR)]
        data_dir: PathBuf,
    },
    /// Open both stores and report how many zones each holds
    Check {
        /// Directory holding the stores
        #[arg(long, default_value = DEFAULT_DB_DIR)]
        data_dir: PathBuf,
    },
}

/// Zone counts of the two stores in one data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StoreCounts {
    summary: u64,
    detail: u64,
}

impl StoreCounts {
    /// Both stores are built from the same extract, so their counts match.
    const fn agree(self) -> bool {
        self.summary == self.detail
    }
}

/// Opens both stores the way the server does and counts their zones.
async fn check_stores(data_dir: &Path) -> Result<StoreCounts, DbError> {
    let stores = PopulationStores::open(data_dir).await?;
    let counts = StoreCounts {
        summary: count_zones(stores.summary.as_ref()).await?,
        detail: count_zones(stores.detail.as_ref()).await?,
    };
    stores.close();
    Ok(counts)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, data_dir } => {
            let start = Instant::now();
            let report = build_stores_from_csv(&input, &data_dir).await?;
            log::info!(
                "Built stores for {} zones (population {}) in {:.1}s",
                report.zones,
                report.population,
                start.elapsed().as_secs_f64()
            );
        }
        Commands::Check { data_dir } => {
            let counts = check_stores(&data_dir).await?;

            println!("{:<40} ZONES", "STORE");
            println!("{}", "-".repeat(50));
            println!("{:<40} {}", summary_db_path(&data_dir).display(), counts.summary);
            println!("{:<40} {}", detail_db_path(&data_dir).display(), counts.detail);

            if !counts.agree() {
                log::warn!(
                    "Stores disagree: {} summary zones, {} detail zones",
                    counts.summary,
                    counts.detail
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use popbuilder_database::fixtures::{self, FixtureStores};
    use popbuilder_database::load;

    use super::*;

    #[test]
    fn parses_build() {
        let cli =
            Cli::try_parse_from(["popbuilder_ingest", "build", "--input", "lsoa.csv"]).unwrap();
        match cli.command {
            Commands::Build { input, data_dir } => {
                assert_eq!(input, PathBuf::from("lsoa.csv"));
                assert_eq!(data_dir, PathBuf::from(DEFAULT_DB_DIR));
            }
            Commands::Check { .. } => panic!("expected build"),
        }
    }

    #[test]
    fn parses_check_with_data_dir() {
        let cli = Cli::try_parse_from(["popbuilder_ingest", "check", "--data-dir", "/srv/db"])
            .unwrap();
        match cli.command {
            Commands::Check { data_dir } => assert_eq!(data_dir, PathBuf::from("/srv/db")),
            Commands::Build { .. } => panic!("expected check"),
        }
    }

    #[test]
    fn build_requires_input() {
        assert!(Cli::try_parse_from(["popbuilder_ingest", "build"]).is_err());
        assert!(Cli::try_parse_from(["popbuilder_ingest"]).is_err());
    }

    #[tokio::test]
    async fn check_counts_matching_stores() {
        let fixture = FixtureStores::build().await.unwrap();
        let counts = check_stores(fixture.dir()).await.unwrap();

        assert_eq!(counts.summary, fixtures::ZONES.len() as u64);
        assert!(counts.agree());
    }

    #[tokio::test]
    async fn check_spots_stores_that_disagree() {
        let fixture = FixtureStores::build().await.unwrap();

        let zones = fixtures::zone_details();
        let summary = load::create_store(&summary_db_path(fixture.dir())).unwrap();
        load::write_summary_store(summary.as_ref(), &zones[..3])
            .await
            .unwrap();
        drop(summary);

        let counts = check_stores(fixture.dir()).await.unwrap();
        assert_eq!(counts, StoreCounts { summary: 3, detail: 10 });
        assert!(!counts.agree());
    }

    #[tokio::test]
    async fn check_fails_without_stores() {
        let fixture = FixtureStores::build().await.unwrap();
        let missing = fixture.dir().join("nothing-here");
        assert!(check_stores(&missing).await.is_err());
    }
}
