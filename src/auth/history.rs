use chrono::{DateTime, Utc};

use crate::auth::hasher::CredentialHasher;
use crate::db::PasswordHistoryEntry;

/// Password-reuse guard over a bounded, most-recent-first history.
///
/// Each history entry keeps the salt its digest was derived under, so a
/// candidate password is hashed against every entry's own salt - a fresh salt
/// would never match anything.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHistory {
    limit: usize,
}

impl PasswordHistory {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    /// Whether `candidate` matches any remembered credential.
    pub fn would_reuse(
        &self,
        hasher: &CredentialHasher,
        candidate: &str,
        entries: &[PasswordHistoryEntry],
    ) -> bool {
        entries
            .iter()
            .any(|entry| hasher.verify(candidate, &entry.salt, &entry.hash))
    }

    /// Record an accepted change at the front, evicting the oldest entries
    /// beyond the limit.
    pub fn record_change(
        &self,
        entries: &mut Vec<PasswordHistoryEntry>,
        hash: String,
        salt: String,
        now: DateTime<Utc>,
    ) {
        entries.insert(
            0,
            PasswordHistoryEntry {
                hash,
                salt,
                changed_at: now,
            },
        );
        entries.truncate(self.limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_for(hasher: &CredentialHasher, password: &str) -> PasswordHistoryEntry {
        let salt = hasher.generate_salt();
        let hash = hasher.hash(password, &salt).expect("should hash");
        PasswordHistoryEntry {
            hash,
            salt,
            changed_at: Utc::now(),
        }
    }

    #[test]
    fn test_recent_passwords_are_rejected() {
        let hasher = CredentialHasher::new();
        let history = PasswordHistory::new(3);
        let entries = vec![
            entry_for(&hasher, "first"),
            entry_for(&hasher, "second"),
            entry_for(&hasher, "third"),
        ];

        assert!(history.would_reuse(&hasher, "first", &entries));
        assert!(history.would_reuse(&hasher, "second", &entries));
        assert!(history.would_reuse(&hasher, "third", &entries));
        assert!(!history.would_reuse(&hasher, "fourth", &entries));
    }

    #[test]
    fn test_record_change_truncates_oldest() {
        let hasher = CredentialHasher::new();
        let history = PasswordHistory::new(3);
        let mut entries = Vec::new();

        for password in ["one", "two", "three", "four"] {
            let salt = hasher.generate_salt();
            let hash = hasher.hash(password, &salt).expect("should hash");
            history.record_change(&mut entries, hash, salt, Utc::now());
        }

        assert_eq!(entries.len(), 3);
        // Newest first; "one" was evicted and may be reused again
        assert!(history.would_reuse(&hasher, "four", &entries));
        assert!(history.would_reuse(&hasher, "two", &entries));
        assert!(!history.would_reuse(&hasher, "one", &entries));
    }

    #[test]
    fn test_empty_history_never_matches() {
        let hasher = CredentialHasher::new();
        let history = PasswordHistory::new(3);
        assert!(!history.would_reuse(&hasher, "anything", &[]));
    }
}
