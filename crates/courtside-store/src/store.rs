use std::sync::Mutex;

use rusqlite::Connection;
use tracing::{info, instrument};

use crate::error::{Result, StoreError};
use crate::types::{
    Account, Club, Court, Reservation, ReservationDetail, ReservationOverview, ReservationStatus,
    Setting,
};

/// Thread-safe store over a single SQLite connection.
///
/// Wraps the connection in a `Mutex`; every lock is held only for one
/// statement. The scheduler, its job tasks and the CLI all go through the
/// same handle, so SQLite's own serialization is never fought in-process.
pub struct ReservationStore {
    db: Mutex<Connection>,
}

impl ReservationStore {
    /// Wrap an already-open (and `init_db`-initialised) connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
        }
    }

    // --- reservations ------------------------------------------------------

    /// Insert a new reservation in `Pending` state and return its id.
    ///
    /// Rejects a second reservation for the same (court, account, play
    /// instant) triple with [`StoreError::Duplicate`]. The UNIQUE
    /// constraint backs this up against racing writers.
    #[instrument(skip(self))]
    pub fn create_reservation(
        &self,
        court_id: i64,
        account_id: i64,
        play_datetime_local: &str,
        execution_datetime_local: &str,
    ) -> Result<i64> {
        let db = self.db.lock().unwrap();
        let duplicate = match db.query_row(
            "SELECT id FROM reservations
             WHERE court_id = ?1 AND account_id = ?2 AND play_datetime_local = ?3",
            rusqlite::params![court_id, account_id, play_datetime_local],
            |row| row.get::<_, i64>(0),
        ) {
            Ok(_) => true,
            Err(rusqlite::Error::QueryReturnedNoRows) => false,
            Err(e) => return Err(StoreError::Database(e)),
        };
        if duplicate {
            return Err(StoreError::Duplicate {
                court_id,
                account_id,
                play_datetime_local: play_datetime_local.to_string(),
            });
        }

        db.execute(
            "INSERT INTO reservations
             (court_id, account_id, play_datetime_local, execution_datetime_local, status)
             VALUES (?1, ?2, ?3, ?4, 'Pending')",
            rusqlite::params![
                court_id,
                account_id,
                play_datetime_local,
                execution_datetime_local
            ],
        )?;
        let id = db.last_insert_rowid();
        info!(reservation_id = id, "reservation created");
        Ok(id)
    }

    /// Load one reservation joined with its account and booking URL parts.
    ///
    /// Returns `None` when the row no longer exists. The caller decides
    /// whether that is an error.
    pub fn get_detail(&self, id: i64) -> Result<Option<ReservationDetail>> {
        let db = self.db.lock().unwrap();
        match db.query_row(
            "SELECT r.id, r.play_datetime_local, r.execution_datetime_local, r.status,
                    a.email, a.password, a.active,
                    cl.base_url, c.booking_fragment_url
             FROM reservations r
             JOIN courts c   ON c.id = r.court_id
             JOIN clubs cl   ON cl.id = c.club_id
             JOIN accounts a ON a.id = r.account_id
             WHERE r.id = ?1",
            rusqlite::params![id],
            row_to_detail,
        ) {
            Ok(detail) => Ok(Some(detail)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Database(e)),
        }
    }

    /// All reservations joined for display, ordered by execution instant
    /// ascending, so the next one to fire comes first.
    pub fn list_overview(&self) -> Result<Vec<ReservationOverview>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT r.id, c.name, a.email, r.play_datetime_local,
                    r.execution_datetime_local, r.status, r.created_at
             FROM reservations r
             JOIN courts c   ON c.id = r.court_id
             JOIN accounts a ON a.id = r.account_id
             ORDER BY r.execution_datetime_local ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ReservationOverview {
                id: row.get(0)?,
                court_name: row.get(1)?,
                email: row.get(2)?,
                play_datetime_local: row.get(3)?,
                execution_datetime_local: row.get(4)?,
                status: parse_status(5, row.get(5)?)?,
                created_at: row.get(6)?,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::Database)
    }

    /// Plain reservation rows in one status (the scheduler's poll query).
    pub fn list_by_status(&self, status: ReservationStatus) -> Result<Vec<Reservation>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT id, court_id, account_id, play_datetime_local,
                    execution_datetime_local, status, created_at
             FROM reservations WHERE status = ?1
             ORDER BY execution_datetime_local ASC",
        )?;
        let rows = stmt.query_map(rusqlite::params![status.to_string()], row_to_reservation)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::Database)
    }

    /// Unconditional status write.
    ///
    /// This is the cancel-override path: `Cancelled` may be persisted
    /// regardless of the current state. Lifecycle writes from the
    /// execution engine go through [`transition`](Self::transition).
    #[instrument(skip(self))]
    pub fn set_status(&self, id: i64, status: ReservationStatus) -> Result<()> {
        let db = self.db.lock().unwrap();
        let rows_changed = db.execute(
            "UPDATE reservations SET status = ?1 WHERE id = ?2",
            rusqlite::params![status.to_string(), id],
        )?;
        if rows_changed == 0 {
            return Err(StoreError::NotFound { id });
        }
        Ok(())
    }

    /// Checked status write: validates `from → to` against the lifecycle
    /// table before persisting. A same-state write is a no-op.
    #[instrument(skip(self))]
    pub fn transition(
        &self,
        id: i64,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> Result<()> {
        if from == to {
            return Ok(());
        }
        if !from.can_transition_to(to) {
            return Err(StoreError::InvalidTransition { from, to });
        }
        self.set_status(id, to)
    }

    // --- settings ----------------------------------------------------------

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let db = self.db.lock().unwrap();
        match db.query_row(
            "SELECT value FROM app_settings WHERE key = ?1",
            rusqlite::params![key],
            |row| row.get::<_, String>(0),
        ) {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Database(e)),
        }
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO app_settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }

    pub fn list_settings(&self) -> Result<Vec<Setting>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare("SELECT key, value FROM app_settings ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok(Setting {
                key: row.get(0)?,
                value: row.get(1)?,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::Database)
    }

    // --- reference data ----------------------------------------------------

    pub fn add_club(&self, name: &str, base_url: &str) -> Result<i64> {
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO clubs (name, base_url) VALUES (?1, ?2)",
            rusqlite::params![name, base_url],
        )?;
        Ok(db.last_insert_rowid())
    }

    pub fn add_court(&self, club_id: i64, name: &str, booking_fragment_url: &str) -> Result<i64> {
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO courts (club_id, name, booking_fragment_url) VALUES (?1, ?2, ?3)",
            rusqlite::params![club_id, name, booking_fragment_url],
        )?;
        Ok(db.last_insert_rowid())
    }

    pub fn add_account(&self, email: &str, password: &str) -> Result<i64> {
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO accounts (email, password) VALUES (?1, ?2)",
            rusqlite::params![email, password],
        )?;
        Ok(db.last_insert_rowid())
    }

    pub fn set_account_active(&self, id: i64, active: bool) -> Result<()> {
        let db = self.db.lock().unwrap();
        db.execute(
            "UPDATE accounts SET active = ?1 WHERE id = ?2",
            rusqlite::params![active as i64, id],
        )?;
        Ok(())
    }

    pub fn list_clubs(&self) -> Result<Vec<Club>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare("SELECT id, name, base_url FROM clubs ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(Club {
                id: row.get(0)?,
                name: row.get(1)?,
                base_url: row.get(2)?,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::Database)
    }

    pub fn list_courts(&self) -> Result<Vec<Court>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT id, club_id, name, booking_fragment_url FROM courts ORDER BY club_id, name",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Court {
                id: row.get(0)?,
                club_id: row.get(1)?,
                name: row.get(2)?,
                booking_fragment_url: row.get(3)?,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::Database)
    }

    pub fn list_accounts(&self) -> Result<Vec<Account>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare("SELECT id, email, password, active FROM accounts ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Account {
                id: row.get(0)?,
                email: row.get(1)?,
                password: row.get(2)?,
                active: row.get::<_, i64>(3)? != 0,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::Database)
    }
}

/// Map a SELECT row (column order from `list_by_status`) to a Reservation.
fn row_to_reservation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Reservation> {
    Ok(Reservation {
        id: row.get(0)?,
        court_id: row.get(1)?,
        account_id: row.get(2)?,
        play_datetime_local: row.get(3)?,
        execution_datetime_local: row.get(4)?,
        status: parse_status(5, row.get(5)?)?,
        created_at: row.get(6)?,
    })
}

/// Map a joined SELECT row (column order from `get_detail`).
fn row_to_detail(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReservationDetail> {
    Ok(ReservationDetail {
        id: row.get(0)?,
        play_datetime_local: row.get(1)?,
        execution_datetime_local: row.get(2)?,
        status: parse_status(3, row.get(3)?)?,
        email: row.get(4)?,
        password: row.get(5)?,
        account_active: row.get::<_, i64>(6)? != 0,
        base_url: row.get(7)?,
        booking_fragment_url: row.get(8)?,
    })
}

/// A status column that fails to parse means the row was written by
/// something other than this store: surface it, don't default it.
fn parse_status(idx: usize, raw: String) -> rusqlite::Result<ReservationStatus> {
    raw.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("unknown reservation status: {raw}").into(),
        )
    })
}
