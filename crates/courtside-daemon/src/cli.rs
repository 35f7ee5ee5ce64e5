use clap::{Parser, Subcommand};

/// Court reservation scheduling daemon.
#[derive(Debug, Parser)]
#[command(name = "courtside", version, about)]
pub struct Cli {
    /// Path to courtside.toml (defaults to ~/.courtside/courtside.toml).
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the scheduler until interrupted (the default).
    Run,
    /// Register a club.
    AddClub { name: String, base_url: String },
    /// Register a court under a club.
    AddCourt {
        club_id: i64,
        name: String,
        booking_fragment_url: String,
    },
    /// Register a booking account.
    AddAccount { email: String, password: String },
    /// List registered clubs.
    Clubs,
    /// List registered courts.
    Courts,
    /// List registered accounts.
    Accounts,
    /// Enable a booking account (pass --inactive to disable it).
    SetAccountActive {
        id: i64,
        /// Disable instead of enable.
        #[arg(long)]
        inactive: bool,
    },
    /// Schedule a reservation. PLAY is local wall clock,
    /// e.g. 2026-08-09T07:00.
    Reserve {
        court_id: i64,
        account_id: i64,
        play: String,
    },
    /// List reservations, next to fire first.
    List,
    /// Cancel a reservation.
    Cancel { id: i64 },
    /// Read or write an app setting (e.g. local_tz, target_tz).
    Setting {
        #[command(subcommand)]
        action: SettingAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum SettingAction {
    Get { key: String },
    Set { key: String, value: String },
    List,
}
