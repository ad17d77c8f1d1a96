//! Bounded retry with exponential backoff.

use peg_config::RetryConfig;

/// Run `op` up to `policy.max_attempts` times.
///
/// `on_failure` sees every failed attempt (0-based attempt number). The
/// calling thread sleeps `policy.backoff(attempt)` between attempts; there is
/// no sleep after the last one. Returns the last error if every attempt
/// failed.
pub(crate) fn with_retry<T, E>(
  policy: &RetryConfig,
  mut op: impl FnMut(u32) -> Result<T, E>,
  mut on_failure: impl FnMut(u32, &E),
) -> Result<T, E> {
  let attempts = policy.max_attempts.max(1);
  let mut attempt = 0;
  loop {
    match op(attempt) {
      Ok(value) => return Ok(value),
      Err(e) => {
        on_failure(attempt, &e);
        if attempt + 1 >= attempts {
          return Err(e);
        }
        let delay = policy.backoff(attempt);
        if !delay.is_zero() {
          std::thread::sleep(delay);
        }
        attempt += 1;
      }
    }
  }
}
