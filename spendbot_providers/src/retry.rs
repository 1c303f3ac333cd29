use std::fmt::Display;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Retry an async operation, sleeping `delays_secs[i]` seconds after the
/// i-th failure. The operation runs `delays_secs.len() + 1` times at
/// most; the last error is returned when every attempt fails.
pub async fn retry_with_backoff<F, Fut, T, E>(
    mut operation: F,
    delays_secs: &[u64],
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut last_error = match operation().await {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    for (attempt, delay_secs) in delays_secs.iter().enumerate() {
        warn!(
            "request failed (attempt {}/{}): {last_error}; retrying in {delay_secs}s",
            attempt + 1,
            delays_secs.len() + 1,
        );
        sleep(Duration::from_secs(*delay_secs)).await;

        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => last_error = e,
        }
    }

    Err(last_error)
}
