//! Request rate limiting
//!
//! A token bucket shared by all workers in a crawl. Tokens refill
//! continuously at the configured requests-per-second rate; a worker must
//! take a token before every HTTP request, so the aggregate request rate
//! stays at or below the target regardless of concurrency.

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

/// Shared token bucket limiter
pub struct TokenBucket {
    rate: f64,
    capacity: f64,
    state: Mutex<BucketState>,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// Creates a bucket that refills at `rate` tokens per second
    ///
    /// Capacity equals one second of refill (at least one token), so a
    /// burst can never exceed the per-second budget.
    pub fn new(rate: f64) -> Self {
        let capacity = rate.ceil().max(1.0);
        Self {
            rate,
            capacity,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Takes one token, sleeping until one is available
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = match self.state.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                let now = Instant::now();
                let elapsed = now.duration_since(state.last_refill).as_secs_f64();
                state.tokens = (state.tokens + elapsed * self.rate).min(self.capacity);
                state.last_refill = now;

                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    None
                } else {
                    // Time until the next whole token exists
                    Some(Duration::from_secs_f64((1.0 - state.tokens) / self.rate))
                }
            };

            match wait {
                None => return,
                Some(duration) => tokio::time::sleep(duration).await,
            }
        }
    }
}
