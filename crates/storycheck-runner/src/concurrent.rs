//! Bounded concurrent iteration.

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use std::future::Future;

/// Run `op` once per item with at most `limit` invocations in flight.
///
/// Items are started in list order as capacity frees up; the call
/// completes only once every started invocation has completed. On the
/// first error no further items are started, invocations already in
/// flight are driven to completion, and the first error is returned.
///
/// A `limit` of zero is treated as one.
pub async fn each_of_limit<T, E, F, Fut>(items: Vec<T>, limit: usize, mut op: F) -> Result<(), E>
where
    F: FnMut(usize, T) -> Fut,
    Fut: Future<Output = Result<(), E>>,
{
    let limit = limit.max(1);
    let mut in_flight = FuturesUnordered::new();
    let mut first_error = None;

    for (index, item) in items.into_iter().enumerate() {
        if first_error.is_some() {
            break;
        }
        in_flight.push(op(index, item));
        if in_flight.len() >= limit {
            if let Some(Err(err)) = in_flight.next().await {
                first_error = Some(err);
            }
        }
    }

    while let Some(result) = in_flight.next().await {
        if let Err(err) = result {
            first_error.get_or_insert(err);
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_runs_every_item_exactly_once() {
        let executed = Arc::new(Mutex::new(Vec::new()));
        let log = executed.clone();
        let result: Result<(), ()> = each_of_limit((0..10).collect(), 3, |index, item| {
            let log = log.clone();
            async move {
                assert_eq!(index, item);
                log.lock().unwrap().push(item);
                Ok(())
            }
        })
        .await;
        assert!(result.is_ok());
        let mut seen = executed.lock().unwrap().clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_never_exceeds_limit() {
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let result: Result<(), ()> = each_of_limit((0..10).collect::<Vec<i32>>(), 3, |_, _| {
            let current = current.clone();
            let peak = peak.clone();
            async move {
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                sleep(Duration::from_millis(10)).await;
                current.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await;
        assert!(result.is_ok());
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(current.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_limit_larger_than_input() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let result: Result<(), ()> = each_of_limit(vec![1, 2, 3], 100, |_, _| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await;
        assert!(result.is_ok());
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_empty_input_completes_immediately() {
        let result: Result<(), &str> =
            each_of_limit(Vec::<i32>::new(), 4, |_, _| async { Ok(()) }).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_error_stops_scheduling_later_items() {
        let executed = Arc::new(Mutex::new(Vec::new()));
        let log = executed.clone();
        let result = each_of_limit((0..5).collect(), 1, |_, item| {
            let log = log.clone();
            async move {
                log.lock().unwrap().push(item);
                if item == 1 {
                    Err("boom")
                } else {
                    Ok(())
                }
            }
        })
        .await;
        assert_eq!(result, Err("boom"));
        assert_eq!(*executed.lock().unwrap(), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_error_drains_items_already_in_flight() {
        let finished = Arc::new(AtomicUsize::new(0));
        let done = finished.clone();
        let result = each_of_limit(vec![0, 1], 2, |_, item| {
            let done = done.clone();
            async move {
                if item == 0 {
                    sleep(Duration::from_millis(5)).await;
                    Err("first")
                } else {
                    sleep(Duration::from_millis(25)).await;
                    done.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }
        })
        .await;
        assert_eq!(result, Err("first"));
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }
}
