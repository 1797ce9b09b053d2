// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `retry.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use kube::core::response::StatusSummary;
    use kube::core::Status;

    fn api_error(code: u16) -> kube::Error {
        kube::Error::Api(Box::new(Status {
            status: Some(StatusSummary::Failure),
            message: "the object has been modified".to_string(),
            reason: if code == 409 { "Conflict" } else { "Invalid" }.to_string(),
            code,
            ..Status::default()
        }))
    }

    fn fast_backoff() -> ConflictBackoff {
        ConflictBackoff {
            jitter: 0.0,
            interval: Duration::from_millis(1),
            ..ConflictBackoff::default()
        }
    }

    #[test]
    fn test_default_backoff_configuration() {
        let backoff = ConflictBackoff::default();
        assert_eq!(backoff.steps, 5);
        assert_eq!(backoff.interval, Duration::from_millis(10));
        assert!((backoff.jitter - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let backoff = ConflictBackoff::default();
        for _ in 0..100 {
            let delay = backoff.next_delay();
            assert!(delay >= Duration::from_micros(8_999), "delay {delay:?} too short");
            assert!(delay <= Duration::from_micros(11_001), "delay {delay:?} too long");
        }
    }

    #[tokio::test]
    async fn test_conflicts_are_retried_until_success() {
        let calls = AtomicU32::new(0);

        let result = retry_on_conflict(&fast_backoff(), "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(api_error(409))
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let calls = AtomicU32::new(0);

        let result: Result<()> = retry_on_conflict(&fast_backoff(), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(api_error(409)) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_other_errors_fail_immediately() {
        let calls = AtomicU32::new(0);

        let result: Result<()> = retry_on_conflict(&fast_backoff(), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(api_error(422)) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
