use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Top-level config (courtside.toml + COURTSIDE_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourtsideConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub timezone: TimezoneConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub bot: BotConfig,
}

impl Default for CourtsideConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            timezone: TimezoneConfig::default(),
            scheduler: SchedulerConfig::default(),
            bot: BotConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Operator zone pair. `local` is the wall clock reservations are entered
/// in; `target` is the zone the booking platform derives slot codes from.
///
/// Values stored in the `app_settings` table take precedence over these;
/// the config file only supplies fallbacks for a fresh database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimezoneConfig {
    #[serde(default = "default_local_tz")]
    pub local: String,
    #[serde(default = "default_target_tz")]
    pub target: String,
}

impl Default for TimezoneConfig {
    fn default() -> Self {
        Self {
            local: default_local_tz(),
            target: default_target_tz(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between poll-loop sweeps over pending reservations.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// How many days before the play instant the booking fires.
    #[serde(default = "default_lead_days")]
    pub lead_days: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            lead_days: default_lead_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_login_url")]
    pub login_url: String,
    /// Per-attempt HTTP timeout in seconds.
    #[serde(default = "default_bot_timeout_secs")]
    pub timeout_secs: u64,
    /// Bounded attempt count; the booking client never retries beyond this.
    #[serde(default = "default_bot_max_retries")]
    pub max_retries: u32,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            login_url: default_login_url(),
            timeout_secs: default_bot_timeout_secs(),
            max_retries: default_bot_max_retries(),
        }
    }
}

fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.courtside/courtside.db", home)
}
fn default_local_tz() -> String {
    "Europe/Madrid".to_string()
}
fn default_target_tz() -> String {
    "UTC".to_string()
}
fn default_poll_interval_secs() -> u64 {
    1
}
fn default_lead_days() -> i64 {
    2
}
fn default_login_url() -> String {
    "https://playtomic.io/api/v1/auth/login".to_string()
}
fn default_bot_timeout_secs() -> u64 {
    20
}
fn default_bot_max_retries() -> u32 {
    2
}

impl CourtsideConfig {
    /// Load config from a TOML file with COURTSIDE_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.courtside/courtside.toml
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: CourtsideConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("COURTSIDE_").split("_"))
            .extract()
            .map_err(|e| crate::error::CourtsideError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.courtside/courtside.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = CourtsideConfig::default();
        assert_eq!(config.timezone.local, "Europe/Madrid");
        assert_eq!(config.timezone.target, "UTC");
        assert_eq!(config.scheduler.poll_interval_secs, 1);
        assert_eq!(config.scheduler.lead_days, 2);
        assert_eq!(config.bot.max_retries, 2);
        assert!(config.database.path.ends_with("courtside.db"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        // Figment treats a missing TOML file as an empty provider, so a
        // bogus path still extracts a fully-defaulted config.
        let config = CourtsideConfig::load(Some("/nonexistent/courtside.toml"))
            .expect("load with missing file");
        assert_eq!(config.scheduler.lead_days, 2);
    }
}
