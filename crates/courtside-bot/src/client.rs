use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::action::{BookingAction, BookingOutcome, BookingRequest};
use crate::error::BotError;

/// Production booking client for the Playtomic platform.
///
/// One attempt is: authenticate, open the court's booking page for the slot
/// date and code, confirm the booking. Attempts are bounded and each HTTP
/// call carries the client-wide timeout, so `execute` always returns.
pub struct PlaytomicClient {
    client: reqwest::Client,
    login_url: String,
    max_retries: u32,
}

#[derive(Serialize)]
struct LoginPayload<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
}

impl PlaytomicClient {
    pub fn new(login_url: String, timeout: Duration, max_retries: u32) -> Result<Self, BotError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            login_url,
            max_retries: max_retries.max(1),
        })
    }

    /// Build the booking page URL for one slot:
    /// `{base}/{fragment}?date=YYYY-MM-DD&time={code}`.
    fn target_url(req: &BookingRequest) -> String {
        format!(
            "{}/{}?date={}&time={}",
            req.base_url.trim_end_matches('/'),
            req.booking_fragment_url.trim_matches('/'),
            req.play_date.format("%Y-%m-%d"),
            req.booking_code
        )
    }

    async fn attempt(&self, req: &BookingRequest) -> Result<BookingOutcome, BotError> {
        let login = self
            .client
            .post(&self.login_url)
            .json(&LoginPayload {
                email: &req.email,
                password: &req.password,
            })
            .send()
            .await?;
        if !login.status().is_success() {
            return Err(BotError::LoginRejected {
                status: login.status().as_u16(),
            });
        }
        let token = login.json::<LoginResponse>().await?.access_token;

        let target = Self::target_url(req);
        info!(url = %target, "submitting booking");
        let booking = self
            .client
            .post(&target)
            .bearer_auth(token)
            .send()
            .await?;
        if !booking.status().is_success() {
            return Err(BotError::BookingRejected {
                status: booking.status().as_u16(),
            });
        }

        Ok(BookingOutcome {
            ok: true,
            message: "Reservation completed".to_string(),
        })
    }
}

#[async_trait]
impl BookingAction for PlaytomicClient {
    async fn execute(&self, req: &BookingRequest) -> Result<BookingOutcome, BotError> {
        for attempt in 1..=self.max_retries {
            info!(attempt, email = %req.email, "booking attempt");
            match self.attempt(req).await {
                Ok(outcome) => {
                    info!(email = %req.email, "booking succeeded");
                    return Ok(outcome);
                }
                Err(err) if attempt == self.max_retries => {
                    warn!(attempt, error = %err, "final booking attempt failed");
                    return Ok(BookingOutcome {
                        ok: false,
                        message: err.to_string(),
                    });
                }
                Err(err) => warn!(attempt, error = %err, "booking attempt failed, retrying"),
            }
        }
        // max_retries is clamped to at least 1, so the loop always returns.
        Ok(BookingOutcome {
            ok: false,
            message: "Unknown error".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn request(base_url: &str, fragment: &str) -> BookingRequest {
        BookingRequest {
            email: "ana@example.com".to_string(),
            password: "secret".to_string(),
            base_url: base_url.to_string(),
            booking_fragment_url: fragment.to_string(),
            play_date: NaiveDate::from_ymd_opt(2026, 8, 9).unwrap(),
            booking_code: "T07%3A00~60".to_string(),
        }
    }

    #[test]
    fn target_url_embeds_date_and_code() {
        let url = PlaytomicClient::target_url(&request(
            "https://club.example.com",
            "booking/court-1",
        ));
        assert_eq!(
            url,
            "https://club.example.com/booking/court-1?date=2026-08-09&time=T07%3A00~60"
        );
    }

    #[test]
    fn target_url_trims_stray_slashes() {
        let url = PlaytomicClient::target_url(&request(
            "https://club.example.com/",
            "/booking/court-1/",
        ));
        assert_eq!(
            url,
            "https://club.example.com/booking/court-1?date=2026-08-09&time=T07%3A00~60"
        );
    }
}
