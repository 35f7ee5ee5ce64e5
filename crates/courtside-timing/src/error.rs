use thiserror::Error;

/// Errors that can occur while resolving zones or parsing stored instants.
#[derive(Debug, Error)]
pub enum TimingError {
    /// The zone name is not in the IANA database. Surfaced as a
    /// configuration error, never retried.
    #[error("unknown timezone '{name}': use an IANA name (e.g. Europe/Madrid, UTC)")]
    UnknownTimezone { name: String },

    /// A stored timestamp is neither RFC 3339 nor a bare local datetime.
    #[error("unparseable timestamp: {0}")]
    BadTimestamp(String),
}

pub type Result<T> = std::result::Result<T, TimingError>;
