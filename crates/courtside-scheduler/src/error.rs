use thiserror::Error;

/// Errors that can occur within the scheduling core.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Store read or write failed.
    #[error("store error: {0}")]
    Store(#[from] courtside_store::StoreError),

    /// A stored instant failed to parse or a zone was unresolvable.
    #[error("timing error: {0}")]
    Timing(#[from] courtside_timing::TimingError),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
