//! Conversation thread identifiers.

use std::sync::OnceLock;

use regex::Regex;
use uuid::Uuid;

use crate::error::SessionError;

pub const MAX_THREAD_ID_LEN: usize = 100;

/// A fresh, opaque thread id (UUID v4 without hyphens).
pub fn generate() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Check `id` against the backend's accepted alphabet and length.
pub fn validate(id: &str) -> Result<(), SessionError> {
    let invalid = |reason| SessionError::InvalidThreadId {
        id: id.to_string(),
        reason,
    };

    if id.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if id.len() > MAX_THREAD_ID_LEN {
        return Err(invalid("must be at most 100 characters"));
    }
    if !thread_id_pattern().is_match(id) {
        return Err(invalid("may only contain ASCII letters, digits, '-' and '_'"));
    }
    Ok(())
}

fn thread_id_pattern() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("thread id regex must compile"))
}
