// In-memory per-client rate limiter for the analysis endpoints.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Different rate limit types with their constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitType {
    /// Case descriptions submitted for a verdict.
    Verdicts,
    /// Replay files uploaded for analysis.
    ReplayUploads,
    /// Mock payment requests.
    Payments,
    /// Reward-table feedback and imports.
    Learning,
}

impl RateLimitType {
    /// Maximum number of events allowed in the window.
    pub fn max_count(&self) -> usize {
        match self {
            RateLimitType::Verdicts => 30,
            RateLimitType::ReplayUploads => 10,
            RateLimitType::Payments => 20,
            RateLimitType::Learning => 60,
        }
    }

    /// Time window for the rate limit.
    pub fn window(&self) -> Duration {
        match self {
            RateLimitType::Verdicts => Duration::from_secs(60),
            RateLimitType::ReplayUploads => Duration::from_secs(3600),
            RateLimitType::Payments => Duration::from_secs(3600),
            RateLimitType::Learning => Duration::from_secs(3600),
        }
    }
}

impl std::fmt::Display for RateLimitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateLimitType::Verdicts => write!(f, "verdicts per minute"),
            RateLimitType::ReplayUploads => write!(f, "replay uploads per hour"),
            RateLimitType::Payments => write!(f, "payments per hour"),
            RateLimitType::Learning => write!(f, "learning updates per hour"),
        }
    }
}

/// Error returned when a rate limit is exceeded.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Rate limit exceeded: max {max} {limit_type}")]
pub struct RateLimitError {
    pub limit_type: RateLimitType,
    pub max: usize,
}

/// Key for the rate limit map: (client, limit_type).
type LimitKey = (String, RateLimitType);

/// Thread-safe in-memory rate limiter.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<HashMap<LimitKey, Vec<Instant>>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record an event for `client` if it is within the limit.
    /// Always allowed in local mode.
    pub fn check_limit(&self, client: &str, limit_type: RateLimitType) -> Result<(), RateLimitError> {
        if crate::config::is_local_mode() {
            return Ok(());
        }
        self.check_at(client, limit_type, Instant::now())
    }

    fn check_at(&self, client: &str, limit_type: RateLimitType, now: Instant) -> Result<(), RateLimitError> {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        // Drop expired events, and clients with none left
        map.retain(|(_, kind), entries| {
            let window = kind.window();
            entries.retain(|t| now.duration_since(*t) < window);
            !entries.is_empty()
        });

        let max = limit_type.max_count();
        let entries = map.entry((client.to_string(), limit_type)).or_default();
        if entries.len() >= max {
            tracing::warn!(client, %limit_type, "rate limit hit");
            return Err(RateLimitError { limit_type, max });
        }

        entries.push(now);
        Ok(())
    }

    #[cfg(test)]
    fn current_count(&self, client: &str, limit_type: RateLimitType) -> usize {
        let map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.get(&(client.to_string(), limit_type)).map_or(0, Vec::len)
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
