use serde::{Deserialize, Serialize};

/// Lifecycle state of a reservation.
///
/// Stored as TEXT; `Display`/`FromStr` give the column round-trip. The
/// valid edges are:
///
/// ```text
/// Pending  → Waiting | Cancelled | Failed
/// Waiting  → Running | Cancelled
/// Running  → Success | Failed
/// ```
///
/// `Pending → Failed` covers precondition failures (inactive account);
/// the three right-hand states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationStatus {
    /// Created, not yet picked up by the scheduler.
    Pending,
    /// A job is counting down to the execution instant.
    Waiting,
    /// The booking action is in flight; no longer cancellable.
    Running,
    /// The booking action reported success.
    Success,
    /// Precondition or booking action failure.
    Failed,
    /// Cancelled before the booking action started.
    Cancelled,
}

impl ReservationStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Cancelled)
    }

    /// Whether `self → next` is a valid lifecycle edge.
    pub fn can_transition_to(self, next: Self) -> bool {
        use ReservationStatus::*;
        matches!(
            (self, next),
            (Pending, Waiting)
                | (Pending, Cancelled)
                | (Pending, Failed)
                | (Waiting, Running)
                | (Waiting, Cancelled)
                | (Running, Success)
                | (Running, Failed)
        )
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ReservationStatus::Pending => "Pending",
            ReservationStatus::Waiting => "Waiting",
            ReservationStatus::Running => "Running",
            ReservationStatus::Success => "Success",
            ReservationStatus::Failed => "Failed",
            ReservationStatus::Cancelled => "Cancelled",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(ReservationStatus::Pending),
            "Waiting" => Ok(ReservationStatus::Waiting),
            "Running" => Ok(ReservationStatus::Running),
            "Success" => Ok(ReservationStatus::Success),
            "Failed" => Ok(ReservationStatus::Failed),
            "Cancelled" => Ok(ReservationStatus::Cancelled),
            other => Err(format!("unknown reservation status: {other}")),
        }
    }
}

/// A booking venue. `base_url` is the root the booking URL is built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Club {
    pub id: i64,
    pub name: String,
    pub base_url: String,
}

/// A bookable court within a club. `booking_fragment_url` is the
/// club-relative path of the court's booking page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Court {
    pub id: i64,
    pub club_id: i64,
    pub name: String,
    pub booking_fragment_url: String,
}

/// Platform credentials. An inactive account fails its reservations
/// up front instead of attempting the booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub email: String,
    pub password: String,
    pub active: bool,
}

/// A persisted reservation row. Instants are RFC 3339 local wall-clock
/// strings; `execution_datetime_local` is the play instant minus the
/// configured lead time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: i64,
    pub court_id: i64,
    pub account_id: i64,
    pub play_datetime_local: String,
    pub execution_datetime_local: String,
    pub status: ReservationStatus,
    pub created_at: String,
}

/// Everything one execution run needs, joined in a single read:
/// the reservation plus its account credentials and booking URL parts.
#[derive(Debug, Clone)]
pub struct ReservationDetail {
    pub id: i64,
    pub play_datetime_local: String,
    pub execution_datetime_local: String,
    pub status: ReservationStatus,
    pub email: String,
    pub password: String,
    pub account_active: bool,
    pub base_url: String,
    pub booking_fragment_url: String,
}

/// Display row for listings: ids resolved to court name and account email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationOverview {
    pub id: i64,
    pub court_name: String,
    pub email: String,
    pub play_datetime_local: String,
    pub execution_datetime_local: String,
    pub status: ReservationStatus,
    pub created_at: String,
}

/// One `app_settings` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ReservationStatus::*;

    const ALL: [ReservationStatus; 6] = [Pending, Waiting, Running, Success, Failed, Cancelled];

    #[test]
    fn display_from_str_round_trip() {
        for status in ALL {
            assert_eq!(status.to_string().parse::<ReservationStatus>(), Ok(status));
        }
        assert!("pending".parse::<ReservationStatus>().is_err());
        assert!("Done".parse::<ReservationStatus>().is_err());
    }

    #[test]
    fn exactly_the_lifecycle_edges_are_valid() {
        let valid = [
            (Pending, Waiting),
            (Pending, Cancelled),
            (Pending, Failed),
            (Waiting, Running),
            (Waiting, Cancelled),
            (Running, Success),
            (Running, Failed),
        ];
        for from in ALL {
            for to in ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    valid.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn terminal_states_have_no_outgoing_edges() {
        for from in [Success, Failed, Cancelled] {
            assert!(from.is_terminal());
            for to in ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }
}
