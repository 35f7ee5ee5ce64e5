use std::sync::Arc;

use chrono::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use courtside_bot::{BookingAction, BookingOutcome, BookingRequest};
use courtside_store::{
    Reservation, ReservationOverview, ReservationStatus, ReservationStore,
};
use courtside_timing::{LocalInstant, ZoneConverter, ZonedClock};

use crate::error::Result;

/// Domain service for the reservation lifecycle.
///
/// Creation derives the execution instant from the play instant and the
/// configured lead time; [`execute_reservation`](Self::execute_reservation)
/// runs one reservation through its state machine.
pub struct ReservationService {
    store: Arc<ReservationStore>,
    converter: ZoneConverter,
    clock: ZonedClock,
    bot: Arc<dyn BookingAction>,
    lead: Duration,
}

impl ReservationService {
    pub fn new(
        store: Arc<ReservationStore>,
        converter: ZoneConverter,
        clock: ZonedClock,
        bot: Arc<dyn BookingAction>,
        lead_days: i64,
    ) -> Self {
        Self {
            store,
            converter,
            clock,
            bot,
            lead: Duration::days(lead_days),
        }
    }

    /// Create a reservation for `play` (interpreted in the local zone when
    /// naive). The booking fires `lead` before the play instant.
    #[instrument(skip(self, play))]
    pub fn create_reservation(
        &self,
        court_id: i64,
        account_id: i64,
        play: LocalInstant,
    ) -> Result<i64> {
        let play_local = play.resolve(self.clock.zone());
        let execution = play_local - self.lead;
        let id = self.store.create_reservation(
            court_id,
            account_id,
            &play_local.to_rfc3339(),
            &execution.to_rfc3339(),
        )?;
        info!(
            reservation_id = id,
            play = %play_local,
            execution = %execution,
            "reservation scheduled"
        );
        Ok(id)
    }

    /// Joined listing ordered by execution instant ascending.
    pub fn list_reservations(&self) -> Result<Vec<ReservationOverview>> {
        Ok(self.store.list_overview()?)
    }

    /// The scheduler's poll query.
    pub fn pending_reservations(&self) -> Result<Vec<Reservation>> {
        Ok(self.store.list_by_status(ReservationStatus::Pending)?)
    }

    /// Persist `Cancelled` regardless of current state. A job that is
    /// still counting down also needs its token cancelled; the
    /// [`Scheduler`](crate::Scheduler) wrapper does both.
    pub fn cancel_reservation(&self, id: i64) -> Result<()> {
        self.store.set_status(id, ReservationStatus::Cancelled)?;
        info!(reservation_id = id, "reservation cancelled");
        Ok(())
    }

    /// Run one reservation to a terminal state.
    ///
    /// Walks `Pending → Waiting → Running → Success | Failed`, with
    /// `Cancelled` reachable until the booking action starts. Every
    /// transition is written to the store immediately so observers see
    /// intermediate states. Booking failures are absorbed into `Failed`;
    /// only store/timing errors propagate (and the pool contains those).
    #[instrument(skip(self, cancel))]
    pub async fn execute_reservation(&self, id: i64, cancel: &CancellationToken) -> Result<()> {
        let Some(detail) = self.store.get_detail(id)? else {
            // Already removed. Nothing to do, not an error.
            warn!("reservation vanished before execution");
            return Ok(());
        };
        if detail.status != ReservationStatus::Pending {
            // Cancelled (or otherwise handled) between pickup and load.
            debug!(status = %detail.status, "reservation no longer pending, skipping");
            return Ok(());
        }

        if !detail.account_active {
            error!(email = %detail.email, "account inactive, failing reservation");
            self.store.transition(
                id,
                ReservationStatus::Pending,
                ReservationStatus::Failed,
            )?;
            return Ok(());
        }

        let play = LocalInstant::parse(&detail.play_datetime_local)?;
        let execution = LocalInstant::parse(&detail.execution_datetime_local)?;

        info!(until = %detail.execution_datetime_local, "waiting until execution instant");
        self.store.transition(
            id,
            ReservationStatus::Pending,
            ReservationStatus::Waiting,
        )?;

        if !self.clock.wait_until(execution, cancel).await {
            info!("cancelled before execution");
            self.store.transition(
                id,
                ReservationStatus::Waiting,
                ReservationStatus::Cancelled,
            )?;
            return Ok(());
        }

        self.store.transition(
            id,
            ReservationStatus::Waiting,
            ReservationStatus::Running,
        )?;

        let play_local = play.resolve(self.clock.zone());
        let booking_code = self.converter.booking_code(play);
        info!(play = %play_local, %booking_code, "zone conversion");

        let request = BookingRequest {
            email: detail.email,
            password: detail.password,
            base_url: detail.base_url,
            booking_fragment_url: detail.booking_fragment_url,
            play_date: play_local.date_naive(),
            booking_code,
        };
        let outcome = match self.bot.execute(&request).await {
            Ok(outcome) => outcome,
            Err(err) => BookingOutcome {
                ok: false,
                message: format!("booking action error: {err}"),
            },
        };

        let terminal = if outcome.ok {
            ReservationStatus::Success
        } else {
            ReservationStatus::Failed
        };
        self.store
            .transition(id, ReservationStatus::Running, terminal)?;
        info!(status = %terminal, message = %outcome.message, "reservation finished");
        Ok(())
    }
}
