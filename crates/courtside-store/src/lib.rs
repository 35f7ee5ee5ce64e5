//! `courtside-store` — SQLite persistence for reservations and their
//! reference data.
//!
//! One file holds clubs, courts, accounts, app settings and the
//! reservations themselves. The scheduler only ever writes reservation
//! status; everything else is reference data managed through the CLI.

pub mod db;
pub mod error;
pub mod store;
pub mod types;

pub use error::{Result, StoreError};
pub use store::ReservationStore;
pub use types::{
    Account, Club, Court, Reservation, ReservationDetail, ReservationOverview, ReservationStatus,
    Setting,
};
