//! `courtside-timing` — timezone resolution, booking-code derivation and the
//! precision waiter.
//!
//! # Overview
//!
//! Reservations are entered in the operator's local wall clock but the
//! booking platform derives slot codes from a target zone. This crate owns
//! the (local, target) conversion, the `T{HH}%3A00~60` slot-code format, and
//! [`ZonedClock::wait_until`], which parks a job until its execution instant
//! with adaptive polling granularity and cooperative cancellation.

pub mod convert;
pub mod error;
pub mod instant;
pub mod tz;
pub mod wait;

pub use convert::ZoneConverter;
pub use error::{Result, TimingError};
pub use instant::LocalInstant;
pub use tz::resolve_timezone;
pub use wait::{poll_interval, ZonedClock};
