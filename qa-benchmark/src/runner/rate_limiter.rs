//! Sliding-window request rate limiter

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

const WINDOW: Duration = Duration::from_secs(60);

/// Limits requests per minute over a sliding one-minute window.
///
/// A limit of 0 disables limiting.
pub struct RateLimiter {
    requests_per_minute: u32,
    last_requests: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            requests_per_minute,
            last_requests: Mutex::new(VecDeque::new()),
        }
    }

    pub fn unlimited() -> Self {
        Self::new(0)
    }

    /// Wait until a request may be sent, then record it
    pub async fn acquire(&self) {
        if self.requests_per_minute == 0 {
            return;
        }

        loop {
            let wait = {
                let mut last = self.last_requests.lock().await;
                let now = Instant::now();
                prune(&mut last, now);

                if last.len() < self.requests_per_minute as usize {
                    last.push_back(now);
                    return;
                }

                // At the limit: wait for the oldest request to leave the window
                last.front()
                    .map(|&oldest| WINDOW.saturating_sub(now.duration_since(oldest)))
                    .unwrap_or_default()
                    + Duration::from_millis(10)
            };

            tracing::debug!("Rate limit reached, waiting {}ms", wait.as_millis());
            tokio::time::sleep(wait).await;
        }
    }
}

fn prune(last: &mut VecDeque<Instant>, now: Instant) {
    while let Some(&front) = last.front() {
        if now.duration_since(front) > WINDOW {
            last.pop_front();
        } else {
            break;
        }
    }
}
