use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::BotError;

/// Everything one booking attempt needs, assembled by the execution engine.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub email: String,
    pub password: String,
    /// Club root, e.g. `https://playtomic.io/club-x`.
    pub base_url: String,
    /// Club-relative path of the court's booking page.
    pub booking_fragment_url: String,
    /// Calendar date of the slot, local to the operator.
    pub play_date: NaiveDate,
    /// Derived slot code, e.g. `T07%3A00~60`.
    pub booking_code: String,
}

/// Result of one booking run. The message is for diagnostics only; the
/// store persists nothing but the status.
#[derive(Debug, Clone)]
pub struct BookingOutcome {
    pub ok: bool,
    pub message: String,
}

/// The opaque booking capability.
///
/// Implementations own their retry and timeout behaviour and must always
/// return rather than hang; the scheduler has no timeout of its own.
#[async_trait]
pub trait BookingAction: Send + Sync {
    async fn execute(&self, req: &BookingRequest) -> Result<BookingOutcome, BotError>;
}
