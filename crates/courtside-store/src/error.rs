use thiserror::Error;

use crate::types::ReservationStatus;

/// Errors that can occur within the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The (court, account, play instant) triple already has a reservation.
    #[error("duplicate reservation: court {court_id}, account {account_id} at {play_datetime_local}")]
    Duplicate {
        court_id: i64,
        account_id: i64,
        play_datetime_local: String,
    },

    /// No reservation with the given id exists.
    #[error("reservation not found: {id}")]
    NotFound { id: i64 },

    /// The requested status edge is not in the lifecycle table.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: ReservationStatus,
        to: ReservationStatus,
    },

    /// Underlying SQLite / rusqlite error.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
