use rusqlite::Connection;

use crate::error::Result;

/// Initialise the full schema in `conn`.
///
/// Safe to call on every startup; `IF NOT EXISTS` throughout. The status
/// index keeps the scheduler's once-a-second pending sweep cheap.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS clubs (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            name      TEXT NOT NULL UNIQUE,
            base_url  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS courts (
            id                    INTEGER PRIMARY KEY AUTOINCREMENT,
            club_id               INTEGER NOT NULL REFERENCES clubs(id),
            name                  TEXT NOT NULL,
            booking_fragment_url  TEXT NOT NULL,
            UNIQUE (club_id, name)
        );

        CREATE TABLE IF NOT EXISTS accounts (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            email     TEXT NOT NULL UNIQUE,
            password  TEXT NOT NULL,
            active    INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS app_settings (
            key    TEXT PRIMARY KEY,
            value  TEXT NOT NULL
        );

        -- UNIQUE(court_id, account_id, play_datetime_local) is the
        -- duplicate-booking invariant; the store also pre-checks it so the
        -- caller gets a typed error instead of a constraint violation.
        CREATE TABLE IF NOT EXISTS reservations (
            id                         INTEGER PRIMARY KEY AUTOINCREMENT,
            court_id                   INTEGER NOT NULL REFERENCES courts(id),
            account_id                 INTEGER NOT NULL REFERENCES accounts(id),
            play_datetime_local        TEXT NOT NULL,
            execution_datetime_local   TEXT NOT NULL,
            status                     TEXT NOT NULL DEFAULT 'Pending',
            created_at                 TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (court_id, account_id, play_datetime_local)
        );

        -- Efficient polling: SELECT … WHERE status = 'Pending'
        CREATE INDEX IF NOT EXISTS idx_reservations_status
            ON reservations (status);
        ",
    )?;
    Ok(())
}
