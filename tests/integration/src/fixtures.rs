//! Test fixtures and data generators

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Email/password pair for a fresh account
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn unique() -> Self {
        let suffix = unique_suffix();
        Self {
            email: format!("user{suffix}@example.com"),
            password: "TestPass123!".to_string(),
        }
    }
}

/// Stored digests keyed by email, as the application's user table would hold them
#[derive(Debug, Default)]
pub struct AccountDirectory {
    digests: Mutex<HashMap<String, String>>,
}

impl AccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, email: &str, digest: String) {
        self.digests
            .lock()
            .unwrap()
            .insert(email.to_string(), digest);
    }

    pub fn digest_for(&self, email: &str) -> Option<String> {
        self.digests.lock().unwrap().get(email).cloned()
    }
}
