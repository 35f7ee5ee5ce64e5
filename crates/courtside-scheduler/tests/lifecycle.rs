//! End-to-end pool behaviour: pickup, single-job invariant, cancellation,
//! shutdown and observer notification against an in-memory store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use chrono_tz::UTC;
use rusqlite::Connection;

use courtside_bot::{BookingAction, BookingOutcome, BookingRequest, BotError};
use courtside_scheduler::{ReservationService, Scheduler};
use courtside_store::{db::init_db, ReservationStatus, ReservationStore};
use courtside_timing::{LocalInstant, ZoneConverter, ZonedClock};

const POLL: Duration = Duration::from_millis(20);
const LEAD_DAYS: i64 = 2;

/// Scripted booking action with an optional artificial duration.
struct ScriptedAction {
    ok: bool,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedAction {
    fn instant_ok() -> Arc<Self> {
        Arc::new(Self {
            ok: true,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    fn slow_ok(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            ok: true,
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BookingAction for ScriptedAction {
    async fn execute(&self, _req: &BookingRequest) -> Result<BookingOutcome, BotError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(BookingOutcome {
            ok: self.ok,
            message: "Reservation completed".to_string(),
        })
    }
}

struct Fixture {
    store: Arc<ReservationStore>,
    service: Arc<ReservationService>,
    scheduler: Scheduler,
    action: Arc<ScriptedAction>,
    court_id: i64,
    account_id: i64,
}

fn fixture(action: Arc<ScriptedAction>) -> Fixture {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    init_db(&conn).expect("init schema");
    let store = Arc::new(ReservationStore::new(conn));
    let club_id = store
        .add_club("Padel Central", "https://club.example.com")
        .unwrap();
    let court_id = store
        .add_court(club_id, "Court 1", "booking/court-1")
        .unwrap();
    let account_id = store.add_account("ana@example.com", "secret").unwrap();

    let service = Arc::new(ReservationService::new(
        Arc::clone(&store),
        ZoneConverter::new(UTC, UTC),
        ZonedClock::new(UTC),
        action.clone(),
        LEAD_DAYS,
    ));
    let scheduler = Scheduler::new(Arc::clone(&service), POLL);
    Fixture {
        store,
        service,
        scheduler,
        action,
        court_id,
        account_id,
    }
}

/// Create a reservation whose execution instant is `offset_secs` from now
/// (play = execution + lead).
fn reserve_executing_in(f: &Fixture, offset_secs: i64) -> i64 {
    let play = Utc::now() + chrono::Duration::days(LEAD_DAYS) + chrono::Duration::seconds(offset_secs);
    f.service
        .create_reservation(f.court_id, f.account_id, LocalInstant::from(play.fixed_offset()))
        .unwrap()
}

fn status_of(f: &Fixture, id: i64) -> ReservationStatus {
    f.store.get_detail(id).unwrap().unwrap().status
}

async fn wait_for_status(f: &Fixture, id: i64, want: ReservationStatus) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    loop {
        if status_of(f, id) == want {
            return;
        }
        if tokio::time::Instant::now() > deadline {
            panic!("reservation {id} stuck in {}, wanted {want}", status_of(f, id));
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn pending_reservation_is_picked_up_and_completes() {
    let f = fixture(ScriptedAction::instant_ok());
    let id = reserve_executing_in(&f, 0);
    f.scheduler.start();

    wait_for_status(&f, id, ReservationStatus::Success).await;
    assert_eq!(f.action.calls(), 1);
    f.scheduler.stop();
}

#[tokio::test]
async fn waiting_job_is_never_duplicated() {
    let f = fixture(ScriptedAction::instant_ok());
    let id = reserve_executing_in(&f, 60);
    f.scheduler.start();

    wait_for_status(&f, id, ReservationStatus::Waiting).await;
    // Many poll sweeps while the job counts down: still exactly one handle.
    tokio::time::sleep(POLL * 8).await;
    assert_eq!(f.scheduler.job_count(), 1);
    assert_eq!(f.action.calls(), 0);
    f.scheduler.stop();
}

#[tokio::test]
async fn cancel_unblocks_a_waiting_job() {
    let f = fixture(ScriptedAction::instant_ok());
    let id = reserve_executing_in(&f, 60);
    f.scheduler.start();

    wait_for_status(&f, id, ReservationStatus::Waiting).await;
    f.scheduler.cancel_reservation(id).unwrap();

    wait_for_status(&f, id, ReservationStatus::Cancelled).await;
    assert_eq!(f.action.calls(), 0);

    // The slot is reclaimed once the job observes the cancellation.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    while f.scheduler.job_count() != 0 {
        assert!(tokio::time::Instant::now() < deadline, "job slot not reclaimed");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    f.scheduler.stop();
}

#[tokio::test]
async fn stop_cancels_waiting_jobs() {
    let f = fixture(ScriptedAction::instant_ok());
    let id = reserve_executing_in(&f, 60);
    f.scheduler.start();

    wait_for_status(&f, id, ReservationStatus::Waiting).await;
    f.scheduler.stop();

    wait_for_status(&f, id, ReservationStatus::Cancelled).await;
    assert_eq!(f.action.calls(), 0);
}

#[tokio::test]
async fn running_job_is_unaffected_by_stop() {
    let f = fixture(ScriptedAction::slow_ok(Duration::from_millis(300)));
    let id = reserve_executing_in(&f, 0);
    f.scheduler.start();

    wait_for_status(&f, id, ReservationStatus::Running).await;
    f.scheduler.stop();

    // Past the Running transition cancellation is no longer observed.
    wait_for_status(&f, id, ReservationStatus::Success).await;
    assert_eq!(f.action.calls(), 1);
}

#[tokio::test]
async fn completed_reservation_is_not_picked_up_again() {
    let f = fixture(ScriptedAction::instant_ok());
    let id = reserve_executing_in(&f, 0);
    f.scheduler.start();

    wait_for_status(&f, id, ReservationStatus::Success).await;
    tokio::time::sleep(POLL * 8).await;
    assert_eq!(f.action.calls(), 1);
    assert_eq!(f.scheduler.job_count(), 0);
    f.scheduler.stop();
}

#[tokio::test]
async fn start_is_idempotent() {
    let f = fixture(ScriptedAction::instant_ok());
    let id = reserve_executing_in(&f, 0);
    f.scheduler.start();
    f.scheduler.start();

    wait_for_status(&f, id, ReservationStatus::Success).await;
    tokio::time::sleep(POLL * 4).await;
    assert_eq!(f.action.calls(), 1);
    f.scheduler.stop();
}

#[tokio::test]
async fn observers_are_notified_of_changes() {
    let f = fixture(ScriptedAction::instant_ok());
    let mut rx = f.scheduler.subscribe();
    let initial = *rx.borrow();

    reserve_executing_in(&f, 0);
    f.scheduler.start();

    tokio::time::timeout(Duration::from_secs(3), rx.changed())
        .await
        .expect("no observer notification")
        .expect("scheduler dropped");
    assert!(*rx.borrow() > initial);
    f.scheduler.stop();
}
