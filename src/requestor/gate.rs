use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::{
    sync::{Mutex, OwnedSemaphorePermit, Semaphore},
    time::sleep,
};

use crate::requestor::error::{RequestError, internal_error};

/// Bounds in-flight requests and optionally smooths the dispatch rate.
#[derive(Clone)]
pub struct ConcurrencyGate {
    permits: Arc<Semaphore>,
    limit: usize,
    rate_per_second: Option<u32>,
    token_bucket: Arc<Mutex<Option<TokenBucket>>>,
}

#[derive(Debug)]
pub struct GateLease {
    _permit: OwnedSemaphorePermit,
}

#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl ConcurrencyGate {
    pub fn new(limit: usize, rate_per_second: Option<u32>) -> Self {
        let limit = limit.max(1);
        Self {
            permits: Arc::new(Semaphore::new(limit)),
            limit,
            rate_per_second: rate_per_second.filter(|rps| *rps > 0),
            token_bucket: Arc::new(Mutex::new(None)),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub async fn acquire(&self) -> Result<GateLease, RequestError> {
        self.acquire_rate_token().await;

        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| internal_error("failed to acquire request concurrency permit"))?;

        Ok(GateLease { _permit: permit })
    }

    async fn acquire_rate_token(&self) {
        let Some(rps) = self.rate_per_second else {
            return;
        };

        loop {
            let mut should_sleep = None;
            {
                let mut guard = self.token_bucket.lock().await;
                let bucket = guard.get_or_insert_with(|| TokenBucket {
                    tokens: rps as f64,
                    last_refill: Instant::now(),
                });

                let now = Instant::now();
                let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
                if elapsed > 0.0 {
                    bucket.tokens = (bucket.tokens + elapsed * rps as f64).min(rps as f64);
                    bucket.last_refill = now;
                }

                if bucket.tokens >= 1.0 {
                    bucket.tokens -= 1.0;
                } else {
                    let deficit = 1.0 - bucket.tokens;
                    let seconds = deficit / rps as f64;
                    should_sleep = Some(Duration::from_secs_f64(seconds.max(0.005)));
                }
            }

            if let Some(duration) = should_sleep {
                sleep(duration).await;
                continue;
            }

            break;
        }
    }
}
