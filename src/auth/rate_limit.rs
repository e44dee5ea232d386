use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Fixed-window request counter keyed by `(bucket, caller)`.
///
/// Process-local and shared across all requests. A fixed window is
/// deliberately approximate - up to 2x the limit can slip through across a
/// window boundary - which is fine for abuse mitigation, not for metering.
/// Per-key mutations go through the map's sharded entry lock, so concurrent
/// requests for the same key cannot lose updates and unrelated keys never
/// serialize on each other.
#[derive(Default)]
pub struct RateLimiter {
    windows: DashMap<String, WindowEntry>,
}

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u32,
    window_start: Instant,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a request against `(bucket, caller)` and report whether it is
    /// allowed. The request that pushes the count past `limit` is rejected;
    /// rejection does not reset the window.
    pub fn allow(&self, bucket: &str, caller: &str, limit: u32, window: Duration) -> bool {
        let key = format!("{bucket}:{caller}");
        let now = Instant::now();

        let mut entry = self.windows.entry(key).or_insert(WindowEntry {
            count: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start) > window {
            entry.count = 1;
            entry.window_start = now;
        } else {
            entry.count += 1;
        }

        entry.count <= limit
    }

    /// Drop entries whose window started longer than `max_age` ago. Keys are
    /// never evicted on the request path, so a long-lived process must run
    /// this periodically to bound memory for high-churn caller keys.
    pub fn sweep(&self, max_age: Duration) {
        let now = Instant::now();
        self.windows
            .retain(|_, entry| now.duration_since(entry.window_start) <= max_age);
    }

    /// Number of live window entries (observability and tests).
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    #[test]
    fn test_fourth_call_within_window_rejected() {
        let limiter = RateLimiter::new();

        assert!(limiter.allow("login", "1.2.3.4", 3, WINDOW));
        assert!(limiter.allow("login", "1.2.3.4", 3, WINDOW));
        assert!(limiter.allow("login", "1.2.3.4", 3, WINDOW));
        assert!(!limiter.allow("login", "1.2.3.4", 3, WINDOW));
    }

    #[test]
    fn test_separate_callers_do_not_interfere() {
        let limiter = RateLimiter::new();

        assert!(limiter.allow("login", "1.2.3.4", 1, WINDOW));
        assert!(!limiter.allow("login", "1.2.3.4", 1, WINDOW));
        assert!(limiter.allow("login", "5.6.7.8", 1, WINDOW));
    }

    #[test]
    fn test_separate_buckets_do_not_interfere() {
        let limiter = RateLimiter::new();

        assert!(limiter.allow("login", "1.2.3.4", 1, WINDOW));
        assert!(!limiter.allow("login", "1.2.3.4", 1, WINDOW));
        assert!(limiter.allow("register", "1.2.3.4", 1, WINDOW));
    }

    #[test]
    fn test_window_elapse_resets_count() {
        let limiter = RateLimiter::new();
        let window = Duration::from_millis(20);

        assert!(limiter.allow("login", "1.2.3.4", 1, window));
        assert!(!limiter.allow("login", "1.2.3.4", 1, window));

        std::thread::sleep(Duration::from_millis(30));
        // Fresh window, count starts at 1 again
        assert!(limiter.allow("login", "1.2.3.4", 1, window));
    }

    #[test]
    fn test_rejection_does_not_reset_window() {
        let limiter = RateLimiter::new();
        let window = Duration::from_millis(50);

        assert!(limiter.allow("login", "1.2.3.4", 1, window));
        // Hammering past the limit keeps rejecting within the same window
        for _ in 0..5 {
            assert!(!limiter.allow("login", "1.2.3.4", 1, window));
        }
    }

    #[test]
    fn test_sweep_drops_stale_entries() {
        let limiter = RateLimiter::new();
        let window = Duration::from_millis(10);

        limiter.allow("login", "1.2.3.4", 3, window);
        limiter.allow("reset", "5.6.7.8", 3, window);
        assert_eq!(limiter.len(), 2);

        std::thread::sleep(Duration::from_millis(25));
        limiter.sweep(Duration::from_millis(20));
        assert!(limiter.is_empty());
    }
}
