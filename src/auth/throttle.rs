use std::collections::HashMap;
use std::sync::Mutex;

use time::{Duration, OffsetDateTime};

pub const MAX_FAILURES: u32 = 5;
pub const LOCKOUT: Duration = Duration::minutes(15);

#[derive(Debug, Clone)]
struct AttemptRecord {
    count: u32,
    last_attempt: OffsetDateTime,
    lock_until: Option<OffsetDateTime>,
}

/// Per-email failed-login counter. Five failures lock the identity for
/// fifteen minutes; elapsed locks are dropped lazily on the next access.
/// Process-local, reset on restart.
#[derive(Debug, Default)]
pub struct LoginThrottle {
    attempts: Mutex<HashMap<String, AttemptRecord>>,
}

impl LoginThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining lockout in whole seconds, if currently locked.
    pub fn remaining_lockout(&self, email: &str, now: OffsetDateTime) -> Option<i64> {
        let mut map = self.attempts.lock().expect("throttle lock poisoned");
        match map.get(email).and_then(|rec| rec.lock_until) {
            Some(until) if now < until => Some((until - now).whole_seconds().max(1)),
            Some(_) => {
                // lock elapsed
                map.remove(email);
                None
            }
            None => None,
        }
    }

    pub fn is_locked(&self, email: &str, now: OffsetDateTime) -> bool {
        self.remaining_lockout(email, now).is_some()
    }

    pub fn record_failure(&self, email: &str, now: OffsetDateTime) {
        let mut map = self.attempts.lock().expect("throttle lock poisoned");
        let rec = map.entry(email.to_string()).or_insert(AttemptRecord {
            count: 0,
            last_attempt: now,
            lock_until: None,
        });
        rec.count += 1;
        rec.last_attempt = now;
        if rec.count >= MAX_FAILURES {
            rec.lock_until = Some(now + LOCKOUT);
        }
    }

    /// Called on successful login.
    pub fn clear(&self, email: &str) {
        self.attempts
            .lock()
            .expect("throttle lock poisoned")
            .remove(email);
    }
}
