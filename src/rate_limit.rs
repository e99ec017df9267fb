use std::time::{Duration, Instant};

use dashmap::DashMap;

const MAX_FAILURES: u32 = 5;
const WINDOW: Duration = Duration::from_secs(15 * 60);

/// Per-email login brute force limiter.
pub struct LoginRateLimiter {
    /// email -> (failed_count, window_start)
    entries: DashMap<String, (u32, Instant)>,
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Check if login attempt is allowed. 5 failures per 15 minutes.
    /// Does not count as an attempt. Call `record_failure()` on a bad password.
    pub fn check(&self, email: &str) -> Result<(), u64> {
        self.check_at(email, Instant::now())
    }

    fn check_at(&self, email: &str, now: Instant) -> Result<(), u64> {
        let Some(entry) = self.entries.get(&email.trim().to_lowercase()) else {
            return Ok(());
        };

        let (count, start) = entry.value();

        if now.duration_since(*start) > WINDOW {
            return Ok(());
        }

        if *count >= MAX_FAILURES {
            let elapsed = now.duration_since(*start).as_secs();
            return Err(WINDOW.as_secs().saturating_sub(elapsed));
        }

        Ok(())
    }

    /// Record a failed login attempt. Increments the counter for the given email.
    pub fn record_failure(&self, email: &str) {
        self.record_failure_at(email, Instant::now());
    }

    fn record_failure_at(&self, email: &str, now: Instant) {
        let mut entry = self
            .entries
            .entry(email.trim().to_lowercase())
            .or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > WINDOW {
            *count = 1;
            *start = now;
        } else {
            *count += 1;
        }
    }

    pub fn cleanup(&self, max_age: Duration) {
        let now = Instant::now();
        self.entries.retain(|_, (_, start)| now.duration_since(*start) < max_age);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_after_five_failures() {
        let limiter = LoginRateLimiter::new();
        let now = Instant::now();
        for _ in 0..4 {
            limiter.record_failure_at("alice@example.com", now);
            assert!(limiter.check_at("alice@example.com", now).is_ok());
        }
        limiter.record_failure_at("alice@example.com", now);
        let retry_after = limiter.check_at("alice@example.com", now).unwrap_err();
        assert_eq!(retry_after, 15 * 60);
    }

    #[test]
    fn emails_are_case_insensitive() {
        let limiter = LoginRateLimiter::new();
        let now = Instant::now();
        for _ in 0..5 {
            limiter.record_failure_at("Bob@Example.com", now);
        }
        assert!(limiter.check_at("bob@example.com", now).is_err());
        assert!(limiter.check_at("carol@example.com", now).is_ok());
    }

    #[test]
    fn window_expiry_resets_the_count() {
        let limiter = LoginRateLimiter::new();
        let start = Instant::now();
        for _ in 0..5 {
            limiter.record_failure_at("dave@example.com", start);
        }
        let later = start + WINDOW + Duration::from_secs(1);
        assert!(limiter.check_at("dave@example.com", later).is_ok());

        limiter.record_failure_at("dave@example.com", later);
        assert_eq!(limiter.entries.get("dave@example.com").unwrap().0, 1);
    }
}
