use std::borrow::Cow;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;

use drill_app::{BUNDLED_ITU_DATABASE, conclude, init_logging, read_database, run_interactive};
use drill_core::Clock;
use drill_core::model::{FactDetail, FactStore};
use drill_core::parser::{ParseError, parse_prefix_database, parse_prefix_database_both_ways};
use drill_services::{ProgressStats, SessionPolicy, TrainingSession};
use drill_storage::repository::ProgressRepository;
use drill_storage::trainfile::TrainfileRepository;

const EXIT_NO_ACTION: u8 = 2;

#[derive(Parser)]
#[command(name = "itutrain")]
#[command(version, about = "Learn which country an amateur radio call-sign prefix belongs to")]
struct Cli {
    /// Prefix database file (defaults to the bundled database)
    #[arg(
        short = 'd',
        long = "database",
        visible_alias = "db",
        env = "ITUTRAIN_DB",
        global = true
    )]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask questions in both directions until end of input, tracking
    /// progress in TRAINFILE
    Train {
        /// Progress file; created on first save
        trainfile: PathBuf,
    },

    /// Print the parsed database
    Dumpdb {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show accuracy and mastery recorded in TRAINFILE
    Stats { trainfile: PathBuf },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_logging();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        println!("no action selected");
        return Ok(ExitCode::from(EXIT_NO_ACTION));
    };

    match command {
        Commands::Train { trainfile } => {
            let store = load_store(cli.database, parse_prefix_database_both_ways)?;
            train(store, trainfile).await
        }
        Commands::Dumpdb { json } => {
            dump_database(&load_store(cli.database, parse_prefix_database)?, json)
        }
        Commands::Stats { trainfile } => {
            let store = load_store(cli.database, parse_prefix_database_both_ways)?;
            show_stats(&store, trainfile)
        }
    }
}

fn load_store(
    database: Option<PathBuf>,
    parse: fn(&str) -> Result<FactStore, ParseError>,
) -> Result<FactStore> {
    let (text, origin) = match &database {
        Some(path) => (Cow::Owned(read_database(path)?), path.display().to_string()),
        None => (Cow::Borrowed(BUNDLED_ITU_DATABASE), "bundled database".to_owned()),
    };
    parse(&text).with_context(|| format!("invalid prefix database {origin}"))
}

async fn train(store: FactStore, trainfile: PathBuf) -> Result<ExitCode> {
    let repository = TrainfileRepository::new(trainfile);
    let session = TrainingSession::start(
        store,
        Box::new(repository),
        StdRng::from_os_rng(),
        Clock::System,
        SessionPolicy::prefix_trainer(),
    )?;
    let outcome = run_interactive(session).await?;
    Ok(conclude(&outcome))
}

fn dump_database(store: &FactStore, json: bool) -> Result<ExitCode> {
    if json {
        println!("{}", serde_json::to_string_pretty(store.facts())?);
        return Ok(ExitCode::SUCCESS);
    }

    for fact in store.facts() {
        let prefixes = match fact.detail() {
            FactDetail::Prefix { prefixes } | FactDetail::CountryPrefixes { prefixes, .. } => {
                prefixes.join(" ")
            }
            FactDetail::Band(_) => String::new(),
        };
        println!(
            "{:<6} prio {:<3} {:<32} {}",
            fact.id().as_str(),
            fact.priority().value(),
            fact.answer(),
            prefixes
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn show_stats(store: &FactStore, trainfile: PathBuf) -> Result<ExitCode> {
    let progress = TrainfileRepository::new(trainfile).load_progress()?;
    print!("{}", ProgressStats::collect(store, &progress));
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn database_flag_accepts_all_spellings() {
        for flag in ["-d", "--db", "--database"] {
            let cli = Cli::try_parse_from(["itutrain", flag, "other.db", "dumpdb"]).unwrap();
            assert_eq!(cli.database, Some(PathBuf::from("other.db")));
        }
    }

    #[test]
    fn database_flag_is_global() {
        let cli = Cli::try_parse_from(["itutrain", "train", "me.train", "-d", "x"]).unwrap();
        assert_eq!(cli.database, Some(PathBuf::from("x")));
        assert!(matches!(cli.command, Some(Commands::Train { .. })));
    }

    #[test]
    fn missing_subcommand_parses_to_none() {
        let cli = Cli::try_parse_from(["itutrain"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn bundled_store_loads_without_flag() {
        let store = load_store(None, parse_prefix_database).unwrap();
        assert!(!store.is_empty());
    }

    #[test]
    fn training_store_holds_both_directions() {
        let one_way = load_store(None, parse_prefix_database).unwrap();
        let both = load_store(None, parse_prefix_database_both_ways).unwrap();
        assert_eq!(both.len(), 2 * one_way.len());
        assert_eq!(both.get("country:DL").unwrap().answer(), "DL DA-DR Y2-Y9");
    }
}
