//! Bounded polling over remotely created resources.

use std::future::Future;
use std::time::Duration;

/// Poll `check` every `interval` until it reports done or the timeout
/// window closes, and return the last observed value either way.
///
/// The first check only happens after a full interval: the platform needs
/// settling time before a freshly created resource is queryable, so even
/// an immediately-satisfied condition waits one interval.
///
/// Timeout accounting is per-iteration (`checks × interval` against
/// `timeout`), not wall-clock, and a `None` timeout polls until the check
/// reports done. The returned value is the last observation whether or
/// not it signalled done; callers re-inspect it rather than assuming
/// success. A transport failure from `check` aborts the wait immediately.
pub async fn until<T, E, F, Fut>(
    mut check: F,
    interval: Duration,
    timeout: Option<Duration>,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(bool, T), E>>,
{
    let mut checks: u32 = 0;
    loop {
        tokio::time::sleep(interval).await;
        checks += 1;
        let (done, value) = check().await?;
        if done {
            return Ok(value);
        }
        if let Some(timeout) = timeout {
            if interval.saturating_mul(checks) >= timeout {
                return Ok(value);
            }
        }
    }
}
