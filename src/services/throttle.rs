use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::TmdbConfig;

/// Rate-limit weight of a metadata call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallWeight {
    /// Search or find-by-id.
    Search,
    /// Details or collection lookup.
    Detail,
}

/// The run was cancelled while waiting for a call slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Run cancelled")]
pub struct Cancelled;

/// Spaces metadata calls out: after a call of a given weight, the next call
/// may start no earlier than that weight's interval.
///
/// The wait itself is not interruptible. Cancellation is checked once the
/// slot is reached and before the call goes out.
#[derive(Debug)]
pub struct Throttle {
    search_interval: Duration,
    detail_interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Throttle {
    #[must_use]
    pub fn new(search_interval: Duration, detail_interval: Duration) -> Self {
        Self {
            search_interval,
            detail_interval,
            next_slot: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn from_config(config: &TmdbConfig) -> Self {
        Self::new(
            Duration::from_millis(config.search_delay_ms),
            Duration::from_millis(config.detail_delay_ms),
        )
    }

    #[must_use]
    pub const fn interval(&self, weight: CallWeight) -> Duration {
        match weight {
            CallWeight::Search => self.search_interval,
            CallWeight::Detail => self.detail_interval,
        }
    }

    /// Waits for the next call slot and reserves it for a call of `weight`.
    pub async fn acquire(
        &self,
        weight: CallWeight,
        cancel: &CancellationToken,
    ) -> Result<(), Cancelled> {
        if cancel.is_cancelled() {
            return Err(Cancelled);
        }

        let mut next_slot = self.next_slot.lock().await;
        if let Some(at) = *next_slot {
            tokio::time::sleep_until(at).await;
        }

        if cancel.is_cancelled() {
            return Err(Cancelled);
        }

        *next_slot = Some(Instant::now() + self.interval(weight));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[tokio::test(start_paused = true)]
    async fn first_call_is_immediate() {
        let throttle = Throttle::new(ms(700), ms(200));
        let token = CancellationToken::new();
        let start = Instant::now();

        throttle.acquire(CallWeight::Search, &token).await.unwrap();

        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn two_tier_spacing() {
        let throttle = Throttle::new(ms(700), ms(200));
        let token = CancellationToken::new();
        let start = Instant::now();

        throttle.acquire(CallWeight::Search, &token).await.unwrap();
        throttle.acquire(CallWeight::Detail, &token).await.unwrap();
        assert!(start.elapsed() >= ms(700));

        throttle.acquire(CallWeight::Detail, &token).await.unwrap();
        assert!(start.elapsed() >= ms(900));
        assert!(start.elapsed() < ms(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_is_seen_after_one_interval() {
        let throttle = Throttle::new(ms(700), ms(200));
        let token = CancellationToken::new();
        let start = Instant::now();

        throttle.acquire(CallWeight::Search, &token).await.unwrap();

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(ms(100)).await;
            canceller.cancel();
        });

        let result = throttle.acquire(CallWeight::Detail, &token).await;
        assert_eq!(result, Err(Cancelled));
        assert!(start.elapsed() <= ms(700));
    }

    #[tokio::test]
    async fn already_cancelled_returns_immediately() {
        let throttle = Throttle::new(ms(700), ms(200));
        let token = CancellationToken::new();
        token.cancel();

        assert_eq!(
            throttle.acquire(CallWeight::Search, &token).await,
            Err(Cancelled)
        );
    }
}
