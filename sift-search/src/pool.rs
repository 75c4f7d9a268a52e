//! Bounded-concurrency fan-out with input-order results.
//!
//! A fixed set of workers drains a shared cursor over the inputs; each
//! worker runs one item to completion before pulling the next. Results are
//! written back by input index, so `results[i]` always belongs to
//! `items[i]` whatever order the futures finish in.

use std::future::Future;
use std::sync::Mutex;

use futures::future::try_join_all;

/// Map `items` through `mapper` with at most `concurrency` in flight.
///
/// `concurrency` is clamped to `1..=items.len()`. The first error aborts
/// the whole run and drops the remaining in-flight work; a mapper that
/// wants partial-failure semantics should return a degraded `Ok` value.
///
/// # Errors
///
/// Returns the first error produced by `mapper`.
pub async fn run_bounded<T, R, E, F, Fut>(
    items: Vec<T>,
    concurrency: usize,
    mapper: F,
) -> Result<Vec<R>, E>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    let len = items.len();
    if len == 0 {
        return Ok(Vec::new());
    }
    let workers = concurrency.clamp(1, len);

    let cursor = Mutex::new(items.into_iter().enumerate());
    let next_item = || match cursor.lock() {
        Ok(mut guard) => guard.next(),
        Err(poisoned) => poisoned.into_inner().next(),
    };

    let runs = (0..workers).map(|_| async {
        let mut done = Vec::new();
        while let Some((index, item)) = next_item() {
            done.push((index, mapper(item).await?));
        }
        Ok::<_, E>(done)
    });

    let mut slots: Vec<Option<R>> = std::iter::repeat_with(|| None).take(len).collect();
    for (index, result) in try_join_all(runs).await?.into_iter().flatten() {
        slots[index] = Some(result);
    }
    Ok(slots.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn preserves_input_order_despite_completion_order() {
        let items: Vec<u64> = (0..8).collect();
        let results = run_bounded(items, 3, |n| async move {
            // Later items finish first.
            tokio::time::sleep(Duration::from_millis(40 - n * 5)).await;
            Ok::<_, String>(n * 10)
        })
        .await
        .expect("run");
        assert_eq!(results, vec![0, 10, 20, 30, 40, 50, 60, 70]);
    }

    #[tokio::test]
    async fn never_exceeds_concurrency_cap() {
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let items: Vec<usize> = (0..10).collect();

        run_bounded(items, 2, |n| {
            let in_flight = &in_flight;
            let peak = &peak;
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, String>(n)
            }
        })
        .await
        .expect("run");

        assert_eq!(peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn zero_concurrency_is_clamped_to_one() {
        let results = run_bounded(vec!["a", "b"], 0, |s| async move { Ok::<_, String>(s.len()) })
            .await
            .expect("run");
        assert_eq!(results, vec![1, 1]);
    }

    #[tokio::test]
    async fn empty_input_returns_empty_output() {
        let results = run_bounded(Vec::<u8>::new(), 4, |n| async move { Ok::<_, String>(n) })
            .await
            .expect("run");
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn first_error_aborts_the_run() {
        let result = run_bounded(vec![1, 2, 3], 2, |n| async move {
            if n == 2 {
                Err(format!("item {n} failed"))
            } else {
                Ok(n)
            }
        })
        .await;
        assert_eq!(result, Err("item 2 failed".to_owned()));
    }

    #[tokio::test]
    async fn degraded_results_keep_their_slot() {
        let results = run_bounded(vec![1, 2, 3], 2, |n| async move {
            let value = if n == 2 { None } else { Some(n) };
            Ok::<_, String>(value)
        })
        .await
        .expect("run");
        assert_eq!(results, vec![Some(1), None, Some(3)]);
    }
}
