use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::error::Result;
use crate::service::ReservationService;

/// One tracked job: a reservation id currently owned by a running task.
///
/// Never persisted; exists only between pickup and completion.
struct JobHandle {
    cancel: CancellationToken,
}

/// The job pool.
///
/// One poll loop sweeps the store for pending reservations and spawns at
/// most one task per reservation id; the registry lock is held only for
/// membership checks, inserts and removals, never across a job. A `watch`
/// counter notifies observers after every sweep and every job completion
/// (bursts coalesce; receivers just refresh their view).
pub struct Scheduler {
    service: Arc<ReservationService>,
    poll_interval: Duration,
    jobs: Arc<Mutex<HashMap<i64, JobHandle>>>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
    shutdown_tx: watch::Sender<bool>,
    change_tx: watch::Sender<u64>,
}

impl Scheduler {
    pub fn new(service: Arc<ReservationService>, poll_interval: Duration) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        let (change_tx, _) = watch::channel(0);
        Self {
            service,
            poll_interval,
            jobs: Arc::new(Mutex::new(HashMap::new())),
            poll_task: Mutex::new(None),
            shutdown_tx,
            change_tx,
        }
    }

    /// Launch the poll loop. Idempotent: a live loop is left alone.
    pub fn start(&self) {
        let mut slot = self.poll_task.lock().unwrap();
        if slot.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }
        // Reset the flag in case this is a restart after stop().
        let _ = self.shutdown_tx.send(false);

        let service = Arc::clone(&self.service);
        let jobs = Arc::clone(&self.jobs);
        let change_tx = self.change_tx.clone();
        let shutdown_rx = self.shutdown_tx.subscribe();
        let poll_interval = self.poll_interval;
        *slot = Some(tokio::spawn(run_poll_loop(
            service,
            jobs,
            change_tx,
            shutdown_rx,
            poll_interval,
        )));
    }

    /// Request the poll loop to stop and cancel every tracked job.
    ///
    /// Cooperative and fire-and-forget: jobs still counting down unblock
    /// and mark themselves `Cancelled`; a job already past its `Running`
    /// transition ignores the token and still records its outcome.
    pub fn stop(&self) {
        info!("scheduler stop requested");
        let _ = self.shutdown_tx.send(true);
        let tokens: Vec<CancellationToken> = {
            let jobs = self.jobs.lock().unwrap();
            jobs.values().map(|handle| handle.cancel.clone()).collect()
        };
        for token in tokens {
            token.cancel();
        }
    }

    /// Persist `Cancelled` immediately and unblock the matching job, if
    /// one is counting down, without waiting for its next poll step.
    pub fn cancel_reservation(&self, id: i64) -> Result<()> {
        self.service.cancel_reservation(id)?;
        let token = {
            let jobs = self.jobs.lock().unwrap();
            jobs.get(&id).map(|handle| handle.cancel.clone())
        };
        if let Some(token) = token {
            token.cancel();
        }
        Ok(())
    }

    /// Observer registration: the receiver's value bumps after every poll
    /// sweep and every job completion.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.change_tx.subscribe()
    }

    /// Number of currently tracked jobs.
    pub fn job_count(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }
}

/// The poll loop: sweep pending reservations, admit unseen ids, notify,
/// sleep one interval racing the shutdown flag.
async fn run_poll_loop(
    service: Arc<ReservationService>,
    jobs: Arc<Mutex<HashMap<i64, JobHandle>>>,
    change_tx: watch::Sender<u64>,
    mut shutdown_rx: watch::Receiver<bool>,
    poll_interval: Duration,
) {
    info!("scheduler started");
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        match service.pending_reservations() {
            Ok(pending) => {
                for reservation in pending {
                    spawn_job(&service, &jobs, &change_tx, reservation.id);
                }
            }
            Err(err) => error!(error = %err, "pending sweep failed"),
        }

        notify(&change_tx);

        tokio::select! {
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
            _ = tokio::time::sleep(poll_interval) => {}
        }
    }
    info!("scheduler stopped");
}

/// Atomically admit `id` into the registry and launch its job task.
///
/// Skips ids that already own a job, preserving the at-most-one-task-per-reservation
/// invariant. The task removes its own handle on completion, whatever the
/// outcome, and bumps the observer counter.
fn spawn_job(
    service: &Arc<ReservationService>,
    jobs: &Arc<Mutex<HashMap<i64, JobHandle>>>,
    change_tx: &watch::Sender<u64>,
    id: i64,
) {
    let token = CancellationToken::new();
    {
        let mut registry = jobs.lock().unwrap();
        if registry.contains_key(&id) {
            return;
        }
        registry.insert(
            id,
            JobHandle {
                cancel: token.clone(),
            },
        );
    }

    let service = Arc::clone(service);
    let jobs = Arc::clone(jobs);
    let change_tx = change_tx.clone();
    tokio::spawn(async move {
        if let Err(err) = service.execute_reservation(id, &token).await {
            // Contained here: one reservation's failure never reaches the
            // poll loop or a sibling job.
            error!(reservation_id = id, error = %err, "reservation job failed");
        }
        jobs.lock().unwrap().remove(&id);
        notify(&change_tx);
    });
}

fn notify(change_tx: &watch::Sender<u64>) {
    change_tx.send_modify(|generation| *generation = generation.wrapping_add(1));
}
