use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;

use drill_app::{conclude, init_logging, read_database, run_interactive};
use drill_core::Clock;
use drill_core::parser::parse_band_database;
use drill_services::{SessionPolicy, TrainingSession};
use drill_storage::repository::InMemoryProgressRepository;

#[derive(Parser)]
#[command(name = "hamtrain")]
#[command(version, about = "Learn amateur radio band ranges, power and bandwidth limits")]
struct Cli {
    /// Band plan database
    #[arg(long, env = "HAMTRAIN_DB", default_value = "db")]
    database: PathBuf,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_logging();
    let cli = Cli::parse();

    let text = read_database(&cli.database)?;
    let store = parse_band_database(&text)
        .with_context(|| format!("invalid band database {}", cli.database.display()))?;

    // Nothing is kept between runs.
    let session = TrainingSession::start(
        store,
        Box::new(InMemoryProgressRepository::new()),
        StdRng::from_os_rng(),
        Clock::System,
        SessionPolicy::band_trainer(),
    )?;
    let outcome = run_interactive(session).await?;
    Ok(conclude(&outcome))
}
