// src/provision/convergence.rs
//
// The control plane creates resources asynchronously; a freshly created
// load balancer may 404 for a while before it accepts pools.
//
use crate::config::ConvergenceConfig;
use crate::control_plane::RemoteResult;
use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ConvergenceWait {
    config: ConvergenceConfig,
}

impl ConvergenceWait {
    pub fn new(config: ConvergenceConfig) -> Self {
        Self { config }
    }

    /// Poll `probe` until it stops returning 404. Other remote errors are
    /// returned as-is.
    pub async fn until_visible<F, Fut, T>(&self, id: &str, mut probe: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RemoteResult<T>>,
    {
        let started = Instant::now();
        let deadline = started + self.config.timeout();
        let mut attempt = 0;

        loop {
            attempt += 1;

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(Error::ConvergenceTimeout {
                    id: id.to_string(),
                    waited: started.elapsed(),
                });
            }
            sleep(self.calculate_backoff(attempt).min(remaining)).await;

            match probe().await {
                Ok(value) => {
                    debug!(id, attempt, waited = ?started.elapsed(), "Resource is visible");
                    return Ok(value);
                }
                Err(err) if err.is_not_found() => {
                    debug!(id, attempt, "Resource not visible yet");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Exponential backoff with up to 25% jitter, capped at the max delay.
    fn calculate_backoff(&self, attempt: u32) -> Duration {
        let base = self.config.initial_delay().as_millis() as u64;
        let max = self.config.max_delay().as_millis() as u64;

        let exponential = base.saturating_mul(2u64.saturating_pow(attempt - 1));
        let capped = exponential.min(max);
        let jitter = (capped as f64 * rand::random::<f64>() * 0.25) as u64;

        Duration::from_millis(capped + jitter).min(self.config.max_delay())
    }
}
