//! Round-robin rotation over the configured API credentials.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::PipelineError;

/// Thread-safe strict round-robin over an ordered set of opaque credentials.
///
/// Every attempt against the fleet service draws a fresh credential, so a
/// rate-limited token is never retried back-to-back.
#[derive(Debug)]
pub struct TokenPool {
    tokens: Vec<String>,
    cursor: AtomicUsize,
}

impl TokenPool {
    /// Build a pool from the configured credential list.
    ///
    /// An empty list is a configuration error and fails fast.
    pub fn new(tokens: Vec<String>) -> Result<Self, PipelineError> {
        if tokens.is_empty() {
            return Err(PipelineError::ConfigMissing(
                "fleet credentials: at least one token is required".into(),
            ));
        }
        Ok(Self {
            tokens,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Next credential in rotation order.
    pub fn next(&self) -> &str {
        let i = self.cursor.fetch_add(1, Ordering::Relaxed) % self.tokens.len();
        &self.tokens[i]
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
