use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use duel_tracker::api::state::AppState;
use duel_tracker::api::{build_router, cors_layer};
use duel_tracker::calculate::{
    compute_by_period_in, compute_statistics, deck_breakdown, filter_records, opponent_breakdown,
};
use duel_tracker::config::AppConfig;
use duel_tracker::migration::{migrate_all, migrate_legacy_duels, migration_status};
use duel_tracker::models::{DeckId, EventId, Granularity, OwnerId, Statistics};
use duel_tracker::storage::{JsonlStore, RecordStore, StorageConfig};

#[derive(Parser)]
#[command(name = "duel-tracker")]
#[command(about = "Duel log and win-rate statistics for card game players")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print statistics for one owner
    Stats {
        /// Owner id
        #[arg(long)]
        owner: String,

        /// Only duels played with this deck id
        #[arg(long)]
        deck: Option<String>,

        /// Only duels filed under this event id
        #[arg(long)]
        event: Option<String>,

        /// Bucket by day, week or month
        #[arg(long)]
        period: Option<Granularity>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Assign legacy duels to the default event
    Migrate {
        /// Owner id
        #[arg(long, conflicts_with = "all")]
        owner: Option<String>,

        /// Migrate every owner
        #[arg(long)]
        all: bool,

        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// List an owner's events
    Events {
        /// Owner id
        #[arg(long)]
        owner: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(cli.json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!cli.json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    tracing::info!("Starting duel-tracker v{}", env!("CARGO_PKG_VERSION"));

    let store = Arc::new(JsonlStore::new(StorageConfig::new(config.data_dir.clone())));

    match cli.command {
        Commands::Serve { host, port } => {
            if config.storage.migrate_on_startup {
                let (reports, failures) = migrate_all(store.as_ref()).await?;
                let migrated: usize = reports.iter().map(|r| r.migrated).sum();
                if migrated > 0 {
                    tracing::info!("Startup migration filed {} legacy duel(s)", migrated);
                }
                for (owner, err) in failures {
                    tracing::error!("Startup migration failed for {}: {}", owner, err);
                }
            }

            let state = AppState {
                store,
                stats: Arc::new(config.stats.clone()),
            };
            let app = build_router(state).layer(cors_layer(&config.server.cors_origin));

            let addr = format!(
                "{}:{}",
                host.unwrap_or(config.server.host),
                port.unwrap_or(config.server.port)
            );
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Stats {
            owner,
            deck,
            event,
            period,
            json,
        } => {
            let owner = OwnerId::from(owner);
            let duels = store.list_duels(&owner).await?;
            let deck = deck.map(DeckId::from);
            let event = event.map(EventId::from);
            let scoped = filter_records(&duels, |d| {
                deck.as_ref().map_or(true, |id| &d.own_deck_id == id)
                    && event.as_ref().map_or(true, |id| &d.event_id == id)
            });

            if scoped.len() > config.stats.max_records {
                bail!(
                    "{} records exceed the limit of {}",
                    scoped.len(),
                    config.stats.max_records
                );
            }

            if let Some(granularity) = period {
                let tz = config.stats.time_zone()?;
                let periods = compute_by_period_in(scoped, granularity, &tz);
                if json {
                    println!("{}", serde_json::to_string_pretty(&periods)?);
                } else {
                    println!("\n=== Statistics by {} ===", granularity);
                    println!(
                        "{:<12} {:>6} {:>6} {:>6} {:>8}",
                        "Period", "Duels", "Wins", "Losses", "Win %"
                    );
                    for (key, stats) in &periods {
                        println!(
                            "{:<12} {:>6} {:>6} {:>6} {:>7.1}%",
                            key, stats.total_duels, stats.wins, stats.losses, stats.win_rate
                        );
                    }
                }
                return Ok(());
            }

            let stats = compute_statistics(scoped);
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                let decks = store.list_decks(&owner).await?;
                print_statistics(&stats, &decks);
            }
        }
        Commands::Migrate {
            owner,
            all,
            dry_run,
        } => {
            let owners = match (owner, all) {
                (Some(owner), _) => vec![OwnerId::from(owner)],
                (None, true) => store.list_owners().await?,
                (None, false) => bail!("pass --owner <id> or --all"),
            };

            if dry_run {
                for owner in &owners {
                    let status = migration_status(store.as_ref(), owner).await?;
                    println!("{:<24} {} legacy duel(s) pending", owner, status.pending);
                }
                return Ok(());
            }

            if all {
                let (reports, failures) = migrate_all(store.as_ref()).await?;
                for report in &reports {
                    println!("{:<24} migrated {}", report.owner_id, report.migrated);
                }
                for (owner, err) in &failures {
                    tracing::error!("Migration failed for {}: {}", owner, err);
                }
                if !failures.is_empty() {
                    bail!("migration failed for {} owner(s)", failures.len());
                }
            } else {
                for owner in &owners {
                    let report = migrate_legacy_duels(store.as_ref(), owner).await?;
                    println!("{:<24} migrated {}", report.owner_id, report.migrated);
                }
            }
        }
        Commands::Events { owner } => {
            let owner = OwnerId::from(owner);
            let events = store.list_events(&owner).await?;
            if events.is_empty() {
                println!("No events for {}", owner);
            }
            for event in &events {
                let marker = if event.is_active { "*" } else { " " };
                let ended = event
                    .end_date
                    .map(|d| format!(" (ended {})", d.format("%Y-%m-%d")))
                    .unwrap_or_default();
                println!(
                    "{} {:<20} {}  started {}{}",
                    marker,
                    event.id,
                    event.name,
                    event.start_date.format("%Y-%m-%d"),
                    ended
                );
            }
        }
    }

    Ok(())
}

fn print_statistics(stats: &Statistics, decks: &[duel_tracker::models::Deck]) {
    if stats.is_empty() {
        println!("No duels recorded.");
        return;
    }

    println!("\n=== Overall ===");
    println!("Duels:            {}", stats.total_duels);
    println!("Wins / losses:    {} / {}", stats.wins, stats.losses);
    println!("Win rate:         {:.1}%", stats.win_rate);
    println!(
        "Going first:      {} duels, {:.1}% won",
        stats.first_player_duels, stats.first_player_win_rate
    );
    println!(
        "Going second:     {} duels, {:.1}% won",
        stats.second_player_duels, stats.second_player_win_rate
    );

    println!("\n=== By deck ===");
    for row in deck_breakdown(stats, decks) {
        println!(
            "{:<28} {:>4}-{:<4} {:>6.1}%",
            row.deck_name, row.wins, row.losses, row.win_rate
        );
    }

    println!("\n=== By opponent ===");
    for row in opponent_breakdown(stats) {
        println!(
            "{:<28} {:>4}-{:<4} {:>6.1}%",
            row.opponent_deck_name, row.wins, row.losses, row.win_rate
        );
    }
}
