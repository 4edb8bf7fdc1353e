//! Retrying fleet-service client
//!
//! All commands are single HTTP POSTs with an empty body; the credential,
//! output format, command name and date parameters ride in the URL query
//! string. Every attempt draws a fresh credential from the token pool.
//!
//! Retry contract:
//!
//! | Upstream response        | Action                     | Backoff              | Budget |
//! |--------------------------|----------------------------|----------------------|--------|
//! | 404                      | no-data sentinel           | —                    | 1      |
//! | 429                      | retry, fresh credential    | linear 10 s·(n+1)    | 5      |
//! | connect/read timeout     | retry                      | exponential 1 s·2^n  | 3      |
//! | other non-2xx            | fail                       | —                    | —      |
//! | transport error          | fail                       | —                    | —      |
//!
//! The 429 and timeout budgets are independent: a timeout retry does not
//! consume a 429 attempt and vice versa.

use std::sync::Arc;

use chrono::NaiveDate;
use reqwest::StatusCode;
use serde_json::Value;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::codec::DateTimeCodec;
use super::rate_limiter::VehicleRateLimiter;
use super::token_pool::TokenPool;
use super::wire::{ListEnvelope, MonitoringDto, RequestDto, RouteListDto};
use crate::types::{ShiftWindow, VehicleMonitoring};

/// Hard per-attempt deadline, independent of backoff waits.
const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);
/// 429 budget: linear backoff base and attempt cap.
const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(10);
const RATE_LIMIT_MAX_ATTEMPTS: u32 = 5;
/// Timeout budget: exponential backoff base and attempt cap.
const TIMEOUT_BACKOFF: Duration = Duration::from_secs(1);
const TIMEOUT_MAX_ATTEMPTS: u32 = 3;

/// Fleet client errors. `FleetNotFound` is not here: a 404 is the typed
/// no-data sentinel (`Ok(None)`), not an error.
#[derive(Debug, thiserror::Error)]
pub enum FleetError {
    #[error("rate-limit budget exhausted after {attempts} attempts")]
    RateLimitExhausted { attempts: u32 },
    #[error("timeout budget exhausted after {attempts} attempts")]
    TimeoutExhausted { attempts: u32 },
    #[error("fleet service returned status {0}")]
    Status(StatusCode),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed payload: {0}")]
    Decode(String),
    #[error("cancelled")]
    Cancelled,
}

/// Outcome of a single HTTP attempt, before retry bookkeeping.
enum Attempt {
    Success(Value),
    NoData,
    RateLimited,
    TimedOut,
    Fatal(FleetError),
}

/// Independent retry counters for the two retryable outcomes.
#[derive(Debug, Default)]
struct RetryState {
    rate_limited: u32,
    timed_out: u32,
}

impl RetryState {
    /// Next linear backoff for a 429, or the exhaustion error.
    fn on_rate_limited(&mut self) -> Result<Duration, FleetError> {
        self.rate_limited += 1;
        if self.rate_limited >= RATE_LIMIT_MAX_ATTEMPTS {
            return Err(FleetError::RateLimitExhausted {
                attempts: self.rate_limited,
            });
        }
        Ok(RATE_LIMIT_BACKOFF * self.rate_limited)
    }

    /// Next exponential backoff for a timeout, or the exhaustion error.
    fn on_timed_out(&mut self) -> Result<Duration, FleetError> {
        self.timed_out += 1;
        if self.timed_out >= TIMEOUT_MAX_ATTEMPTS {
            return Err(FleetError::TimeoutExhausted {
                attempts: self.timed_out,
            });
        }
        Ok(TIMEOUT_BACKOFF * 2u32.pow(self.timed_out - 1))
    }
}

/// Typed client over the three consumed fleet commands.
#[derive(Clone)]
pub struct FleetClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<TokenPool>,
    limiter: Arc<VehicleRateLimiter>,
    codec: DateTimeCodec,
}

impl FleetClient {
    pub fn new(
        base_url: &str,
        tokens: Arc<TokenPool>,
        limiter: Arc<VehicleRateLimiter>,
        codec: DateTimeCodec,
    ) -> Result<Self, FleetError> {
        let http = reqwest::Client::builder()
            .timeout(ATTEMPT_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
            limiter,
            codec,
        })
    }

    pub fn codec(&self) -> &DateTimeCodec {
        &self.codec
    }

    /// `getRouteListsByDateOut` over a date range (dates only).
    pub async fn list_route_lists(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<RouteListDto>>, FleetError> {
        let params = [
            ("fromDate".to_string(), self.codec.format_date(from)),
            ("toDate".to_string(), self.codec.format_date(to)),
        ];
        let Some(body) = self.call("getRouteListsByDateOut", &params, cancel).await? else {
            return Ok(None);
        };
        let envelope: ListEnvelope<RouteListDto> =
            serde_json::from_value(body).map_err(|e| FleetError::Decode(e.to_string()))?;
        Ok(Some(envelope.list))
    }

    /// `getRequests` over a date range (dates only).
    pub async fn list_requests(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<RequestDto>>, FleetError> {
        let params = [
            ("fromDate".to_string(), self.codec.format_date(from)),
            ("toDate".to_string(), self.codec.format_date(to)),
        ];
        let Some(body) = self.call("getRequests", &params, cancel).await? else {
            return Ok(None);
        };
        let list = body
            .get("list")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let total = list.len();
        let requests: Vec<RequestDto> =
            list.into_iter().filter_map(RequestDto::from_value).collect();
        if requests.len() < total {
            warn!(
                dropped = total - requests.len(),
                "requests without a numeric id were dropped"
            );
        }
        Ok(Some(requests))
    }

    /// `getMonitoringStats` for one vehicle over a shift window.
    ///
    /// Goes through the per-vehicle rate limiter before the request is
    /// issued.
    pub async fn fetch_monitoring(
        &self,
        vehicle_id: i64,
        window: &ShiftWindow,
        cancel: &CancellationToken,
    ) -> Result<Option<VehicleMonitoring>, FleetError> {
        tokio::select! {
            _ = cancel.cancelled() => return Err(FleetError::Cancelled),
            _ = self.limiter.acquire(vehicle_id) => {}
        }

        let params = [
            ("idMO".to_string(), vehicle_id.to_string()),
            ("fromDate".to_string(), self.codec.format_datetime(window.start)),
            ("toDate".to_string(), self.codec.format_datetime(window.end)),
        ];
        let Some(body) = self.call("getMonitoringStats", &params, cancel).await? else {
            return Ok(None);
        };
        let dto: MonitoringDto = serde_json::from_value(body.clone())
            .map_err(|e| FleetError::Decode(e.to_string()))?;
        Ok(Some(dto.into_domain(body, &self.codec)))
    }

    /// Drive one command through both retry loops to completion.
    async fn call(
        &self,
        command: &str,
        params: &[(String, String)],
        cancel: &CancellationToken,
    ) -> Result<Option<Value>, FleetError> {
        let mut retry = RetryState::default();
        loop {
            if cancel.is_cancelled() {
                return Err(FleetError::Cancelled);
            }
            match self.attempt(command, params, cancel).await {
                Attempt::Success(body) => return Ok(Some(body)),
                Attempt::NoData => {
                    debug!(command, "fleet service has no data for this query");
                    return Ok(None);
                }
                Attempt::RateLimited => {
                    let delay = retry.on_rate_limited()?;
                    warn!(
                        command,
                        attempt = retry.rate_limited,
                        delay_secs = delay.as_secs(),
                        "fleet service rate-limited, backing off"
                    );
                    sleep_or_cancel(delay, cancel).await?;
                }
                Attempt::TimedOut => {
                    let delay = retry.on_timed_out()?;
                    warn!(
                        command,
                        attempt = retry.timed_out,
                        delay_secs = delay.as_secs(),
                        "fleet request timed out, backing off"
                    );
                    sleep_or_cancel(delay, cancel).await?;
                }
                Attempt::Fatal(e) => return Err(e),
            }
        }
    }

    /// One POST with a fresh credential. Classifies the outcome only; the
    /// caller owns the retry bookkeeping.
    async fn attempt(
        &self,
        command: &str,
        params: &[(String, String)],
        cancel: &CancellationToken,
    ) -> Attempt {
        let credential = self.tokens.next();
        let mut query: Vec<(&str, &str)> = vec![
            ("credential", credential),
            ("format", "json"),
            ("command", command),
        ];
        query.extend(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let send = self.http.post(&self.base_url).query(&query).send();
        let response = tokio::select! {
            _ = cancel.cancelled() => return Attempt::Fatal(FleetError::Cancelled),
            r = send => r,
        };

        let response = match response {
            Ok(r) => r,
            Err(e) if e.is_timeout() || e.is_connect() => return Attempt::TimedOut,
            Err(e) => return Attempt::Fatal(FleetError::Transport(e)),
        };

        match response.status() {
            StatusCode::NOT_FOUND => Attempt::NoData,
            StatusCode::TOO_MANY_REQUESTS => Attempt::RateLimited,
            s if s.is_success() => match response.json::<Value>().await {
                Ok(body) => Attempt::Success(body),
                Err(e) if e.is_timeout() => Attempt::TimedOut,
                Err(e) => Attempt::Fatal(FleetError::Transport(e)),
            },
            s => Attempt::Fatal(FleetError::Status(s)),
        }
    }
}

async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> Result<(), FleetError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(FleetError::Cancelled),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_backoff_is_linear_then_exhausts() {
        let mut retry = RetryState::default();
        // Two 429s then success: waits 10 s, then 20 s.
        assert_eq!(retry.on_rate_limited().unwrap(), Duration::from_secs(10));
        assert_eq!(retry.on_rate_limited().unwrap(), Duration::from_secs(20));
        assert_eq!(retry.on_rate_limited().unwrap(), Duration::from_secs(30));
        assert_eq!(retry.on_rate_limited().unwrap(), Duration::from_secs(40));
        // Fifth 429 exhausts the budget.
        assert!(matches!(
            retry.on_rate_limited(),
            Err(FleetError::RateLimitExhausted { attempts: 5 })
        ));
    }

    #[test]
    fn timeout_backoff_is_exponential_then_exhausts() {
        let mut retry = RetryState::default();
        assert_eq!(retry.on_timed_out().unwrap(), Duration::from_secs(1));
        assert_eq!(retry.on_timed_out().unwrap(), Duration::from_secs(2));
        assert!(matches!(
            retry.on_timed_out(),
            Err(FleetError::TimeoutExhausted { attempts: 3 })
        ));
    }

    #[test]
    fn budgets_are_independent() {
        let mut retry = RetryState::default();
        for _ in 0..4 {
            retry.on_rate_limited().unwrap();
        }
        // The rate-limit budget is one short of exhausted; timeouts still
        // have their own full budget.
        assert_eq!(retry.on_timed_out().unwrap(), Duration::from_secs(1));
        assert_eq!(retry.on_timed_out().unwrap(), Duration::from_secs(2));
        assert!(retry.on_rate_limited().is_err());
    }
}
