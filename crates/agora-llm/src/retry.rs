//! Error classification and backoff schedule for LLM calls.

use std::time::Duration;

/// Failure class of one LLM call attempt. Drives whether and how to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// HTTP 429. Retried with exponential backoff.
    RateLimited,
    /// HTTP 5xx or a transport error. Retried with linear backoff.
    Server,
    /// The per-request timeout elapsed. Retried with linear backoff.
    Timeout,
    /// Any other failure (auth, bad request, malformed body). Never retried.
    Terminal,
}

impl LlmErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => LlmErrorKind::RateLimited,
            500..=599 => LlmErrorKind::Server,
            _ => LlmErrorKind::Terminal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        !matches!(self, LlmErrorKind::Terminal)
    }
}

/// Bounded retry schedule.
///
/// `max_attempts` counts every attempt including the first; `attempt` below
/// is 1-based and names the attempt that just failed.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Delay before the next attempt, or `None` when the error is terminal
    /// or the attempt budget is spent.
    ///
    /// Rate limiting backs off exponentially (base, 2x, 4x, ...); server
    /// errors and timeouts back off linearly (base, 2x, 3x, ...).
    pub fn next_delay(&self, kind: LlmErrorKind, attempt: u32) -> Option<Duration> {
        if !kind.is_retryable() || attempt >= self.max_attempts {
            return None;
        }
        let factor = match kind {
            LlmErrorKind::RateLimited => 2u32.saturating_pow(attempt.saturating_sub(1)),
            LlmErrorKind::Server | LlmErrorKind::Timeout => attempt,
            LlmErrorKind::Terminal => unreachable!("terminal errors never retry"),
        };
        Some(self.base_delay.saturating_mul(factor))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(1000))
    }

    // ---- Classification ----

    #[test]
    fn test_from_status() {
        assert_eq!(LlmErrorKind::from_status(429), LlmErrorKind::RateLimited);
        assert_eq!(LlmErrorKind::from_status(500), LlmErrorKind::Server);
        assert_eq!(LlmErrorKind::from_status(503), LlmErrorKind::Server);
        assert_eq!(LlmErrorKind::from_status(401), LlmErrorKind::Terminal);
        assert_eq!(LlmErrorKind::from_status(400), LlmErrorKind::Terminal);
        assert_eq!(LlmErrorKind::from_status(404), LlmErrorKind::Terminal);
    }

    #[test]
    fn test_retryability() {
        assert!(LlmErrorKind::RateLimited.is_retryable());
        assert!(LlmErrorKind::Server.is_retryable());
        assert!(LlmErrorKind::Timeout.is_retryable());
        assert!(!LlmErrorKind::Terminal.is_retryable());
    }

    // ---- Schedules ----

    #[test]
    fn test_linear_backoff_for_server_errors() {
        let p = policy();
        assert_eq!(
            p.next_delay(LlmErrorKind::Server, 1),
            Some(Duration::from_millis(1000))
        );
        assert_eq!(
            p.next_delay(LlmErrorKind::Server, 2),
            Some(Duration::from_millis(2000))
        );
        assert_eq!(p.next_delay(LlmErrorKind::Server, 3), None);
    }

    #[test]
    fn test_exponential_backoff_for_rate_limits() {
        let p = RetryPolicy::new(4, Duration::from_millis(1000));
        assert_eq!(
            p.next_delay(LlmErrorKind::RateLimited, 1),
            Some(Duration::from_millis(1000))
        );
        assert_eq!(
            p.next_delay(LlmErrorKind::RateLimited, 2),
            Some(Duration::from_millis(2000))
        );
        assert_eq!(
            p.next_delay(LlmErrorKind::RateLimited, 3),
            Some(Duration::from_millis(4000))
        );
        assert_eq!(p.next_delay(LlmErrorKind::RateLimited, 4), None);
    }

    #[test]
    fn test_timeout_uses_linear_backoff() {
        let p = policy();
        assert_eq!(
            p.next_delay(LlmErrorKind::Timeout, 2),
            Some(Duration::from_millis(2000))
        );
    }

    #[test]
    fn test_terminal_never_retries() {
        let p = policy();
        assert_eq!(p.next_delay(LlmErrorKind::Terminal, 1), None);
    }

    #[test]
    fn test_budget_exhaustion() {
        let p = policy();
        assert_eq!(p.next_delay(LlmErrorKind::RateLimited, 3), None);
        assert_eq!(p.next_delay(LlmErrorKind::Server, 99), None);
    }

    #[test]
    fn test_single_attempt_policy_never_retries() {
        let p = RetryPolicy::new(1, Duration::from_millis(100));
        assert_eq!(p.next_delay(LlmErrorKind::Server, 1), None);
    }
}
