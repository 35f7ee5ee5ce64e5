use thiserror::Error;

/// Errors the booking client can surface.
///
/// The execution engine converts any of these into a failed reservation;
/// they never propagate further.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("login rejected with status {status}")]
    LoginRejected { status: u16 },

    #[error("booking rejected with status {status}")]
    BookingRejected { status: u16 },
}
