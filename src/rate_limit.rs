/// Login rate limiting
///
/// Fixed attempt ceiling per client address per window, to blunt credential
/// guessing. Only the login endpoint consults this; token verification has no
/// I/O and needs no throttle.
use crate::{
    config::RateLimitSettings,
    error::{AdminError, AdminResult},
};
use governor::{
    clock::DefaultClock, state::keyed::DefaultKeyedStateStore, Quota, RateLimiter as GovernorLimiter,
};
use std::{num::NonZeroU32, time::Duration};

/// Per-address login attempt limiter
pub struct LoginRateLimiter {
    limiter: GovernorLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>,
    window: Duration,
}

impl LoginRateLimiter {
    pub fn new(settings: &RateLimitSettings) -> Self {
        let attempts =
            NonZeroU32::new(settings.login_attempts).unwrap_or(NonZeroU32::new(10).unwrap());
        // Spread the ceiling over the window; the burst allowance is the
        // ceiling itself, so N attempts are accepted back to back.
        let period = Duration::from_secs(
            (settings.login_window_secs / u64::from(attempts.get())).max(1),
        );
        let quota = Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_minute(attempts))
            .allow_burst(attempts);

        Self {
            limiter: GovernorLimiter::keyed(quota),
            window: Duration::from_secs(settings.login_window_secs),
        }
    }

    /// Check the attempt budget for one client address
    pub fn check(&self, addr: &str) -> AdminResult<()> {
        match self.limiter.check_key(&addr.to_string()) {
            Ok(_) => Ok(()),
            Err(_) => Err(AdminError::RateLimited {
                retry_after: self.window,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(attempts: u32) -> RateLimitSettings {
        RateLimitSettings {
            login_attempts: attempts,
            login_window_secs: 900,
        }
    }

    #[test]
    fn test_ceiling_enforced() {
        let limiter = LoginRateLimiter::new(&settings(5));

        for _ in 0..5 {
            assert!(limiter.check("203.0.113.9").is_ok());
        }
        assert!(matches!(
            limiter.check("203.0.113.9"),
            Err(AdminError::RateLimited { .. })
        ));
    }

    #[test]
    fn test_addresses_are_independent() {
        let limiter = LoginRateLimiter::new(&settings(3));

        for _ in 0..3 {
            assert!(limiter.check("198.51.100.1").is_ok());
        }
        assert!(limiter.check("198.51.100.1").is_err());

        // A different client still has a full budget
        assert!(limiter.check("198.51.100.2").is_ok());
    }
}
