//! Bounded dispatcher
//!
//! Executes a batch of per-item action futures with a concurrency ceiling.
//! Completion order is unspecified. The first hard error stops further
//! launches from the batch while already-running actions drain; item-level
//! classifications are `ActionOutcome` values recorded upstream and never
//! reach this layer as errors.

use crate::error::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;

/// Default number of concurrently outstanding item actions per job.
pub const DEFAULT_CONCURRENCY: usize = 20;

/// Run `actions` with at most `limit` outstanding at once.
///
/// Returns the first hard error observed, after in-flight actions have
/// drained. No required completion order; page ordering is enforced by the
/// caller, which only dispatches one page at a time.
pub async fn dispatch_all<I>(actions: I, limit: usize) -> Result<()>
where
    I: IntoIterator,
    I::Item: Future<Output = Result<()>>,
{
    let limit = limit.max(1);
    let mut pending = actions.into_iter();
    let mut in_flight = FuturesUnordered::new();
    let mut first_error = None;

    loop {
        while first_error.is_none() && in_flight.len() < limit {
            match pending.next() {
                Some(action) => in_flight.push(action),
                None => break,
            }
        }

        match in_flight.next().await {
            Some(Ok(())) => {}
            Some(Err(e)) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
            None => break,
        }
    }

    match first_error {
        None => Ok(()),
        Some(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreSweepError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_runs_every_action() {
        let completed = Arc::new(AtomicUsize::new(0));
        let actions = (0..100).map(|_| {
            let completed = Arc::clone(&completed);
            async move {
                completed.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        dispatch_all(actions, 8).await.unwrap();
        assert_eq!(completed.load(Ordering::SeqCst), 100);
    }

    #[tokio::test]
    async fn test_concurrency_ceiling_is_respected() {
        let outstanding = Arc::new(AtomicUsize::new(0));
        let high_water = Arc::new(AtomicUsize::new(0));

        let actions = (0..64).map(|_| {
            let outstanding = Arc::clone(&outstanding);
            let high_water = Arc::clone(&high_water);
            async move {
                let now = outstanding.fetch_add(1, Ordering::SeqCst) + 1;
                high_water.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                outstanding.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        });

        dispatch_all(actions, 4).await.unwrap();
        assert!(high_water.load(Ordering::SeqCst) <= 4);
    }

    #[tokio::test]
    async fn test_first_hard_error_stops_further_launches() {
        let launched = Arc::new(AtomicUsize::new(0));
        let limit = 4;

        let launched_ref = Arc::clone(&launched);
        let actions = (0..32).map(move |i| {
            let launched = Arc::clone(&launched_ref);
            async move {
                launched.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                if i == 0 {
                    Err(StoreSweepError::TaskJoin("boom".to_string()))
                } else {
                    Ok(())
                }
            }
        });

        let err = dispatch_all(actions, limit).await.unwrap_err();
        assert!(matches!(err, StoreSweepError::TaskJoin(_)));
        // The failing action plus at most the already-filled window launched;
        // nothing new started after the failure was observed.
        assert!(launched.load(Ordering::SeqCst) <= 2 * limit);
    }

    #[tokio::test]
    async fn test_in_flight_actions_drain_after_error() {
        let drained = Arc::new(AtomicUsize::new(0));

        let drained_ref = Arc::clone(&drained);
        let actions = (0..4).map(move |i| {
            let drained = Arc::clone(&drained_ref);
            async move {
                if i == 0 {
                    return Err(StoreSweepError::TaskJoin("boom".to_string()));
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
                drained.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        let err = dispatch_all(actions, 4).await.unwrap_err();
        assert!(matches!(err, StoreSweepError::TaskJoin(_)));
        // All four fit the window at once, so the three slow actions were
        // already running when the error surfaced and must have finished.
        assert_eq!(drained.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_empty_batch_completes() {
        let actions: Vec<std::future::Ready<Result<()>>> = Vec::new();
        dispatch_all(actions, 4).await.unwrap();
    }
}
