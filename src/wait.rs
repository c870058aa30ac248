use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::trace;

use crate::error::WebDriverError;

/// Polls `check` until it yields `Ok(true)` or `timeout` elapses. The check
/// always runs at least once. Check errors count as "not yet".
pub async fn poll_until<F, Fut>(timeout: Duration, interval: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, WebDriverError>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        match check().await {
            Ok(true) => return true,
            Ok(false) => {}
            Err(err) => trace!(error = %err, "wait check failed"),
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        sleep(interval.min(deadline - now)).await;
    }
}

/// Like [`poll_until`] but hands back the first value the check produced.
pub async fn poll_for<T, F, Fut>(timeout: Duration, interval: Duration, mut check: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, WebDriverError>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        match check().await {
            Ok(Some(found)) => return Some(found),
            Ok(None) => {}
            Err(err) => trace!(error = %err, "wait check failed"),
        }
        let now = Instant::now();
        if now >= deadline {
            return None;
        }
        sleep(interval.min(deadline - now)).await;
    }
}

pub async fn settle(period: Duration) {
    if !period.is_zero() {
        sleep(period).await;
    }
}
