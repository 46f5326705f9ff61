//! Token bucket shared by every outbound explorer call.

use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Async token bucket. Safe to share across workers behind an `Arc`.
#[derive(Debug)]
pub struct RateLimiter {
    /// Maximum tokens (bucket capacity).
    capacity: f64,
    /// Tokens added per second.
    refill_rate: f64,
    state: Mutex<BucketState>,
}

impl RateLimiter {
    /// `refill_rate` requests per second, with at most `burst` back-to-back.
    pub fn new(refill_rate: f64, burst: u32) -> Self {
        let capacity = f64::from(burst.max(1));
        RateLimiter {
            capacity,
            refill_rate,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Wait until a token is available and take it.
    pub async fn acquire(&self) {
        while let Err(wait) = self.try_take().await {
            tokio::time::sleep(wait).await;
        }
    }

    /// Take a token now, or report how long until one is available.
    async fn try_take(&self) -> Result<(), Duration> {
        let mut state = self.state.lock().await;
        self.refill(&mut state);
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            Ok(())
        } else {
            Err(Duration::from_secs_f64(
                (1.0 - state.tokens) / self.refill_rate,
            ))
        }
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_rate).min(self.capacity);
        state.last_refill = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_burst_then_empty() {
        let limiter = RateLimiter::new(1.0, 2);
        assert!(limiter.try_take().await.is_ok());
        assert!(limiter.try_take().await.is_ok());
        let wait = limiter.try_take().await.unwrap_err();
        assert!(wait <= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_acquire_spaces_calls() {
        let limiter = RateLimiter::new(50.0, 1);
        let start = Instant::now();
        for _ in 0..4 {
            limiter.acquire().await;
        }
        // First token is immediate, the next three wait ~20ms each.
        assert!(start.elapsed() >= Duration::from_millis(55));
    }

    #[tokio::test]
    async fn test_shared_across_tasks() {
        let limiter = Arc::new(RateLimiter::new(100.0, 1));
        let start = Instant::now();
        let mut handles = Vec::new();
        for _ in 0..5 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move { limiter.acquire().await }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert!(start.elapsed() >= Duration::from_millis(35));
    }
}
