use chrono::{DateTime, Duration, Utc};

use crate::db::Account;

/// Brute-force login throttle: a per-account failed-attempt counter and a
/// time-boxed lock.
///
/// An account is either open (attempts below the limit) or locked
/// (`locked_until` in the future). The failed attempt that reaches the limit
/// sets the lock and zeroes the counter, so attempts after the lock expires
/// count from scratch rather than accumulating across lock cycles. Unlock is
/// implicit: every check re-evaluates the timestamp, no timer fires.
#[derive(Debug, Clone, Copy)]
pub struct LoginThrottle {
    max_attempts: u32,
    lock_duration: Duration,
}

impl LoginThrottle {
    pub fn new(max_attempts: u32, lock_duration: Duration) -> Self {
        Self {
            max_attempts,
            lock_duration,
        }
    }

    /// Whether the account currently refuses authentication. Checked before
    /// the credential is verified at all.
    pub fn is_locked(&self, account: &Account, now: DateTime<Utc>) -> bool {
        account.locked_until.is_some_and(|until| until > now)
    }

    /// Record a failed attempt while the account is open. Crossing the
    /// threshold installs the lock and resets the counter.
    pub fn record_failure(&self, account: &mut Account, now: DateTime<Utc>) {
        account.failed_attempts += 1;
        if account.failed_attempts >= self.max_attempts {
            account.locked_until = Some(now + self.lock_duration);
            account.failed_attempts = 0;
        }
    }

    /// Record a successful authentication: counter back to zero, stale lock
    /// cleared.
    pub fn record_success(&self, account: &mut Account) {
        account.failed_attempts = 0;
        account.locked_until = None;
    }
}
