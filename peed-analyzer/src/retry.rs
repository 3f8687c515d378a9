// Peed Analyzer - Notification retry policy
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! When to re-send a failed notification.
//!
//! Only failures that may succeed on a second try are retried: transport
//! errors and 5xx answers. A 4xx answer or a 2xx without `notif_id` is
//! final. With the default [`RetryStrategy::None`] every anomaly gets
//! exactly one POST.

use crate::dispatcher::DispatchFailure;
use std::time::Duration;

/// Upper bound on any backoff delay.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Retry policy applied to retryable dispatch failures
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RetryStrategy {
    /// Single attempt
    #[default]
    None,
    /// Up to `max_retries` re-sends, `delay` apart
    Fixed { max_retries: u32, delay: Duration },
    /// Up to `max_retries` re-sends, the delay growing by `multiplier`
    /// from `initial_delay` and capped at `max_delay`
    ExponentialBackoff {
        max_retries: u32,
        initial_delay: Duration,
        max_delay: Duration,
        multiplier: f64,
    },
}

impl RetryStrategy {
    /// Constant delay between re-sends.
    pub fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self::Fixed { max_retries, delay }
    }

    /// Doubling delay capped at 30s. Zero retries means [`RetryStrategy::None`].
    pub fn exponential(max_retries: u32, initial_delay: Duration) -> Self {
        if max_retries == 0 {
            return Self::None;
        }
        Self::ExponentialBackoff {
            max_retries,
            initial_delay,
            max_delay: MAX_BACKOFF,
            multiplier: 2.0,
        }
    }

    pub fn max_retries(&self) -> u32 {
        match self {
            Self::None => 0,
            Self::Fixed { max_retries, .. } | Self::ExponentialBackoff { max_retries, .. } => {
                *max_retries
            }
        }
    }

    /// Delay before re-sending after `failure`, given `retried` re-sends so
    /// far. `None` ends the dispatch with that failure.
    pub fn next_delay(&self, failure: &DispatchFailure, retried: u32) -> Option<Duration> {
        if !failure.is_retryable() || retried >= self.max_retries() {
            return None;
        }
        match self {
            Self::None => None,
            Self::Fixed { delay, .. } => Some(*delay),
            Self::ExponentialBackoff {
                initial_delay,
                max_delay,
                multiplier,
                ..
            } => {
                let millis = initial_delay.as_millis() as f64 * multiplier.powi(retried as i32);
                Some(Duration::from_millis(millis as u64).min(*max_delay))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unavailable() -> DispatchFailure {
        DispatchFailure::Status {
            status: 503,
            body: String::new(),
        }
    }

    #[test]
    fn test_default_is_single_attempt() {
        let strategy = RetryStrategy::default();
        assert_eq!(strategy, RetryStrategy::None);
        assert_eq!(strategy.max_retries(), 0);
        assert_eq!(strategy.next_delay(&unavailable(), 0), None);
    }

    #[test]
    fn test_fixed_strategy() {
        let strategy = RetryStrategy::fixed(2, Duration::from_millis(100));
        assert_eq!(strategy.next_delay(&unavailable(), 0), Some(Duration::from_millis(100)));
        assert_eq!(strategy.next_delay(&unavailable(), 1), Some(Duration::from_millis(100)));
        assert_eq!(strategy.next_delay(&unavailable(), 2), None);
    }

    #[test]
    fn test_exponential_backoff() {
        let strategy = RetryStrategy::exponential(4, Duration::from_millis(100));
        assert_eq!(strategy.next_delay(&unavailable(), 0), Some(Duration::from_millis(100)));
        assert_eq!(strategy.next_delay(&unavailable(), 1), Some(Duration::from_millis(200)));
        assert_eq!(strategy.next_delay(&unavailable(), 3), Some(Duration::from_millis(800)));
        assert_eq!(strategy.next_delay(&unavailable(), 4), None);
    }

    #[test]
    fn test_backoff_is_capped() {
        let strategy = RetryStrategy::ExponentialBackoff {
            max_retries: 10,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            multiplier: 10.0,
        };
        assert_eq!(strategy.next_delay(&unavailable(), 3), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_final_failures_are_not_retried() {
        let strategy = RetryStrategy::fixed(3, Duration::from_millis(10));
        let rejected = DispatchFailure::Status {
            status: 401,
            body: "{}".to_string(),
        };
        assert_eq!(strategy.next_delay(&rejected, 0), None);
        let missing = DispatchFailure::MissingId {
            body: "{}".to_string(),
        };
        assert_eq!(strategy.next_delay(&missing, 0), None);
        assert!(strategy
            .next_delay(&DispatchFailure::Transport("connection refused".to_string()), 0)
            .is_some());
    }

    #[test]
    fn test_exponential_with_zero_retries_is_none() {
        assert_eq!(
            RetryStrategy::exponential(0, Duration::from_millis(100)),
            RetryStrategy::None
        );
    }
}
