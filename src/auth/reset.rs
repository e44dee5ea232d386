use chrono::{DateTime, Duration, Utc};
use subtle::ConstantTimeEq;

use crate::auth::hasher::{random_token, CredentialHasher};
use crate::auth::history::PasswordHistory;
use crate::db::Account;
use crate::types::{AppError, Result};

/// Reset-token byte length (hex-encodes to twice this).
const RESET_TOKEN_LEN: usize = 16;

/// Single-use, time-limited password-reset tokens.
///
/// A reset token is a high-entropy bearer secret handed out out-of-band, not
/// a signed session token. Only one live token exists per account: issuing
/// overwrites any unconsumed predecessor. Consumption clears token and expiry
/// together with the password change; any failure leaves the stored token
/// untouched so a legitimate retry remains possible, but expiry is a hard
/// deadline that failed attempts do not extend.
#[derive(Debug, Clone, Copy)]
pub struct ResetTokens {
    ttl: Duration,
}

impl ResetTokens {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    /// Issue a fresh token for the account, replacing any prior one.
    pub fn issue(&self, account: &mut Account, now: DateTime<Utc>) -> String {
        let token = random_token(RESET_TOKEN_LEN);
        account.reset_token = Some(token.clone());
        account.reset_token_expiry = Some(now + self.ttl);
        token
    }

    /// Validate `token` and install `new_password`, enforcing the password
    /// history guard. On success the token and expiry are cleared atomically
    /// with the credential change.
    pub fn consume(
        &self,
        account: &mut Account,
        token: &str,
        new_password: &str,
        hasher: &CredentialHasher,
        history: &PasswordHistory,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let stored = account
            .reset_token
            .as_deref()
            .ok_or(AppError::ResetTokenInvalid)?;
        if !bool::from(stored.as_bytes().ct_eq(token.as_bytes())) {
            return Err(AppError::ResetTokenInvalid);
        }
        match account.reset_token_expiry {
            Some(expiry) if expiry > now => {}
            _ => return Err(AppError::ResetTokenInvalid),
        }

        if history.would_reuse(hasher, new_password, &account.password_history) {
            return Err(AppError::ReusedPassword);
        }

        let salt = hasher.generate_salt();
        let hash = hasher.hash(new_password, &salt)?;
        account.password_salt = salt.clone();
        account.password_hash = hash.clone();
        history.record_change(&mut account.password_history, hash, salt, now);

        account.reset_token = None;
        account.reset_token_expiry = None;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (ResetTokens, CredentialHasher, PasswordHistory, Account) {
        let hasher = CredentialHasher::new();
        let history = PasswordHistory::new(3);
        let mut account = Account::stub();

        // Seed the current credential and its history entry
        let salt = hasher.generate_salt();
        let hash = hasher.hash("old_password", &salt).expect("should hash");
        account.password_salt = salt.clone();
        account.password_hash = hash.clone();
        history.record_change(&mut account.password_history, hash, salt, Utc::now());

        (ResetTokens::new(Duration::hours(1)), hasher, history, account)
    }

    #[test]
    fn test_issue_overwrites_prior_token() {
        let (reset, _, _, mut account) = setup();
        let now = Utc::now();

        let first = reset.issue(&mut account, now);
        let second = reset.issue(&mut account, now);

        assert_ne!(first, second);
        assert_eq!(account.reset_token.as_deref(), Some(second.as_str()));
        assert_eq!(account.reset_token_expiry, Some(now + Duration::hours(1)));
    }

    #[test]
    fn test_consume_accepted_exactly_once() {
        let (reset, hasher, history, mut account) = setup();
        let now = Utc::now();
        let token = reset.issue(&mut account, now);

        reset
            .consume(&mut account, &token, "new_password", &hasher, &history, now)
            .expect("first consume should succeed");

        assert!(account.reset_token.is_none());
        assert!(account.reset_token_expiry.is_none());
        assert!(hasher.verify(
            "new_password",
            &account.password_salt,
            &account.password_hash
        ));

        // Replay fails
        let err = reset
            .consume(&mut account, &token, "another_pw", &hasher, &history, now)
            .unwrap_err();
        assert!(matches!(err, AppError::ResetTokenInvalid));
    }

    #[test]
    fn test_mismatched_token_leaves_state_untouched() {
        let (reset, hasher, history, mut account) = setup();
        let now = Utc::now();
        let token = reset.issue(&mut account, now);

        let err = reset
            .consume(&mut account, "wrong-token", "new_pw", &hasher, &history, now)
            .unwrap_err();
        assert!(matches!(err, AppError::ResetTokenInvalid));

        // A legitimate retry still works
        reset
            .consume(&mut account, &token, "new_pw", &hasher, &history, now)
            .expect("retry with the real token should succeed");
    }

    #[test]
    fn test_expired_token_rejected() {
        let (reset, hasher, history, mut account) = setup();
        let now = Utc::now();
        let token = reset.issue(&mut account, now);

        let later = now + Duration::hours(2);
        let err = reset
            .consume(&mut account, &token, "new_pw", &hasher, &history, later)
            .unwrap_err();
        assert!(matches!(err, AppError::ResetTokenInvalid));
    }

    #[test]
    fn test_reused_password_rejected_and_token_kept() {
        let (reset, hasher, history, mut account) = setup();
        let now = Utc::now();
        let token = reset.issue(&mut account, now);

        let err = reset
            .consume(
                &mut account,
                &token,
                "old_password",
                &hasher,
                &history,
                now,
            )
            .unwrap_err();
        assert!(matches!(err, AppError::ReusedPassword));
        // Token survives so the caller can retry with a fresh password
        assert!(account.reset_token.is_some());
    }
}
