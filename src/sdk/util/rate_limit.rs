use governor::clock::{Clock, DefaultClock};
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

pub type Limiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Requests per minute allowed on the hosted free tier.
pub const ORS_DIRECTIONS_PER_MINUTE: u32 = 40;

pub fn ors_limiter(per_minute: u32) -> Limiter {
    let per_minute = NonZeroU32::new(per_minute.max(1)).unwrap_or(NonZeroU32::MIN);
    Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)))
}

/// Blocks the calling thread until the limiter admits one request.
pub fn wait(limiter: &Limiter) {
    let clock = DefaultClock::default();
    while let Err(not_until) = limiter.check() {
        let pause = not_until.wait_time_from(clock.now());
        log::debug!("Rate limiter engaged, sleeping {:?}", pause);
        std::thread::sleep(pause);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_burst_within_quota_does_not_block() {
        let limiter = ors_limiter(40);
        let started = Instant::now();
        for _ in 0..5 {
            wait(&limiter);
        }
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_zero_quota_is_clamped_to_one() {
        let limiter = ors_limiter(0);
        assert!(limiter.check().is_ok());
    }
}
