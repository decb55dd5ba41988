use std::collections::HashSet;
use std::sync::Mutex;

/// Tokens explicitly logged out before their natural expiry. Process-lifetime
/// only: the set is lost on restart, which is acceptable because every token
/// also self-expires.
#[derive(Debug, Default)]
pub struct TokenBlacklist {
    revoked: Mutex<HashSet<String>>,
}

impl TokenBlacklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent.
    pub fn revoke(&self, token: &str) {
        self.revoked
            .lock()
            .expect("blacklist lock poisoned")
            .insert(token.to_string());
    }

    pub fn contains(&self, token: &str) -> bool {
        self.revoked
            .lock()
            .expect("blacklist lock poisoned")
            .contains(token)
    }
}
