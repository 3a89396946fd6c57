use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use crate::error::{ClientError, TimeoutKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutDefaults {
    /// Upper bound for any one HTTP request.
    pub request_timeout: Duration,
    /// Upper bound for a whole logical operation, across all its requests.
    pub general_method_timeout: Duration,
}

impl Default for TimeoutDefaults {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            general_method_timeout: Duration::from_secs(30),
        }
    }
}

/// Time budget shared by every request of one logical operation.
///
/// The deadline is fixed at construction; each dispatch asks
/// [`next_request_timeout`](TimeoutManager::next_request_timeout) how long
/// it may run, which is never more than what is left of the overall budget.
/// Once the budget is spent no further request may start.
#[derive(Debug)]
pub struct TimeoutManager {
    started: Instant,
    request_timeout: Duration,
    overall: Duration,
    overall_kind: TimeoutKind,
    issued: AtomicU32,
}

impl TimeoutManager {
    /// Budget for an operation that issues exactly one request.
    pub fn single(defaults: &TimeoutDefaults, timeout: Option<Duration>) -> Self {
        let overall = timeout.unwrap_or_else(|| {
            defaults
                .request_timeout
                .min(defaults.general_method_timeout)
        });
        Self::new(overall, overall, TimeoutKind::Request)
    }

    /// Budget for a paginated or fanned-out operation.
    pub fn multipart(defaults: &TimeoutDefaults, timeout: Option<Duration>) -> Self {
        let overall = timeout.unwrap_or(defaults.general_method_timeout);
        Self::new(
            defaults.request_timeout.min(overall),
            overall,
            TimeoutKind::GeneralMethod,
        )
    }

    fn new(request_timeout: Duration, overall: Duration, overall_kind: TimeoutKind) -> Self {
        Self {
            started: Instant::now(),
            request_timeout,
            overall,
            overall_kind,
            issued: AtomicU32::new(0),
        }
    }

    pub fn remaining(&self) -> Duration {
        self.overall.saturating_sub(self.started.elapsed())
    }

    /// Reserve the next request and return the timeout it must run under.
    pub fn next_request_timeout(&self) -> Result<Duration, ClientError> {
        let remaining = self.remaining();
        if remaining.is_zero() {
            return Err(ClientError::Timeout {
                kind: self.overall_kind,
                timeout_ms: self.overall.as_millis() as u64,
            });
        }
        self.issued.fetch_add(1, Ordering::Relaxed);
        Ok(self.request_timeout.min(remaining))
    }

    pub fn requests_issued(&self) -> u32 {
        self.issued.load(Ordering::Relaxed)
    }

    /// The error to report when a request dispatched with `granted` ran out.
    ///
    /// If the overall budget cut the request short, the overall budget is
    /// what was exceeded.
    pub fn timeout_error(&self, granted: Duration) -> ClientError {
        if granted < self.request_timeout {
            ClientError::Timeout {
                kind: self.overall_kind,
                timeout_ms: self.overall.as_millis() as u64,
            }
        } else {
            ClientError::Timeout {
                kind: TimeoutKind::Request,
                timeout_ms: self.request_timeout.as_millis() as u64,
            }
        }
    }
}
