use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use chrono_tz::Tz;
use tracing::{info, warn};

use courtside_bot::PlaytomicClient;
use courtside_core::CourtsideConfig;
use courtside_scheduler::{ReservationService, Scheduler};
use courtside_store::{db::init_db, ReservationStore};
use courtside_timing::{resolve_timezone, LocalInstant, ZoneConverter, ZonedClock};

mod cli;

use cli::{Cli, Command, SettingAction};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "courtside=info".into()),
        )
        .init();

    let args = Cli::parse();

    // load config: explicit flag > COURTSIDE_CONFIG env > ~/.courtside/courtside.toml
    let config_path = args
        .config
        .clone()
        .or_else(|| std::env::var("COURTSIDE_CONFIG").ok());
    let config = CourtsideConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        CourtsideConfig::default()
    });

    let db_path = &config.database.path;
    ensure_parent_dir(db_path);
    info!(path = %db_path, "opening SQLite database");

    let db = rusqlite::Connection::open(db_path)?;
    db.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    init_db(&db)?;
    let store = Arc::new(ReservationStore::new(db));

    match args.command.unwrap_or(Command::Run) {
        Command::Run => run_daemon(&config, store).await,
        Command::AddClub { name, base_url } => {
            let id = store.add_club(&name, &base_url)?;
            println!("club {id} added: {name}");
            Ok(())
        }
        Command::AddCourt {
            club_id,
            name,
            booking_fragment_url,
        } => {
            let id = store.add_court(club_id, &name, &booking_fragment_url)?;
            println!("court {id} added: {name}");
            Ok(())
        }
        Command::AddAccount { email, password } => {
            let id = store.add_account(&email, &password)?;
            println!("account {id} added: {email}");
            Ok(())
        }
        Command::Clubs => {
            for club in store.list_clubs()? {
                println!("{:>4}  {:<24} {}", club.id, club.name, club.base_url);
            }
            Ok(())
        }
        Command::Courts => {
            for court in store.list_courts()? {
                println!(
                    "{:>4}  club={:<4} {:<24} {}",
                    court.id, court.club_id, court.name, court.booking_fragment_url
                );
            }
            Ok(())
        }
        Command::Accounts => {
            for account in store.list_accounts()? {
                let state = if account.active { "active" } else { "inactive" };
                println!("{:>4}  {:<24} {}", account.id, account.email, state);
            }
            Ok(())
        }
        Command::SetAccountActive { id, inactive } => {
            store.set_account_active(id, !inactive)?;
            println!(
                "account {id} {}",
                if inactive { "deactivated" } else { "activated" }
            );
            Ok(())
        }
        Command::Reserve {
            court_id,
            account_id,
            play,
        } => {
            let service = build_service(&config, store)?;
            let play = LocalInstant::parse(&play)?;
            let id = service.create_reservation(court_id, account_id, play)?;
            println!("reservation {id} scheduled");
            Ok(())
        }
        Command::List => {
            let service = build_service(&config, store)?;
            for row in service.list_reservations()? {
                println!(
                    "{:>4}  {:<9}  {:<16} {:<24} play={}  exec={}",
                    row.id,
                    row.status.to_string(),
                    row.court_name,
                    row.email,
                    row.play_datetime_local,
                    row.execution_datetime_local
                );
            }
            Ok(())
        }
        Command::Cancel { id } => {
            let service = build_service(&config, store)?;
            service.cancel_reservation(id)?;
            println!("reservation {id} cancelled");
            Ok(())
        }
        Command::Setting { action } => {
            match action {
                SettingAction::Get { key } => match store.get_setting(&key)? {
                    Some(value) => println!("{value}"),
                    None => println!("(unset)"),
                },
                SettingAction::Set { key, value } => {
                    store.set_setting(&key, &value)?;
                    println!("{key} = {value}");
                }
                SettingAction::List => {
                    for setting in store.list_settings()? {
                        println!("{} = {}", setting.key, setting.value);
                    }
                }
            }
            Ok(())
        }
    }
}

async fn run_daemon(config: &CourtsideConfig, store: Arc<ReservationStore>) -> anyhow::Result<()> {
    let service = build_service(config, store)?;
    let scheduler = Scheduler::new(
        service,
        Duration::from_secs(config.scheduler.poll_interval_secs.max(1)),
    );

    scheduler.start();
    info!("courtside running, press ctrl-c to stop");
    tokio::signal::ctrl_c().await?;

    info!("shutting down");
    scheduler.stop();
    Ok(())
}

fn build_service(
    config: &CourtsideConfig,
    store: Arc<ReservationStore>,
) -> anyhow::Result<Arc<ReservationService>> {
    let (local, target) = resolve_zones(config, &store);
    info!(%local, %target, "timezones resolved");

    let bot = PlaytomicClient::new(
        config.bot.login_url.clone(),
        Duration::from_secs(config.bot.timeout_secs),
        config.bot.max_retries,
    )?;

    Ok(Arc::new(ReservationService::new(
        store,
        ZoneConverter::new(local, target),
        ZonedClock::new(local),
        Arc::new(bot),
        config.scheduler.lead_days,
    )))
}

/// Resolve the zone pair: app_settings rows win over the config file.
/// Either name failing to resolve drops the pair to UTC with a warning,
/// so the daemon stays usable while the operator fixes the setting.
fn resolve_zones(config: &CourtsideConfig, store: &ReservationStore) -> (Tz, Tz) {
    let local_name = store
        .get_setting("local_tz")
        .ok()
        .flatten()
        .unwrap_or_else(|| config.timezone.local.clone());
    let target_name = store
        .get_setting("target_tz")
        .ok()
        .flatten()
        .unwrap_or_else(|| config.timezone.target.clone());

    match (resolve_timezone(&local_name), resolve_timezone(&target_name)) {
        (Ok(local), Ok(target)) => (local, target),
        (local, target) => {
            for err in [local.err(), target.err()].into_iter().flatten() {
                warn!("Invalid configured timezone: {}. Falling back to UTC.", err);
            }
            (Tz::UTC, Tz::UTC)
        }
    }
}

fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}
