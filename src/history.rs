//! history.rs: bounded in-memory audit log of persisted score changes.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

const MAX_CAPACITY: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub subject_id: String,
    pub old_score: Option<f64>,
    pub new_score: f64,
    pub weights_version: String,
    pub reason: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct AuditLog {
    inner: Mutex<Vec<AuditEntry>>,
    cap: usize,
}

impl AuditLog {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            inner: Mutex::new(Vec::with_capacity(cap.min(MAX_CAPACITY))),
            cap: cap.min(MAX_CAPACITY),
        }
    }

    /// Oldest entries are dropped once the cap is reached.
    pub fn push(&self, entry: AuditEntry) -> Result<(), StoreError> {
        let mut v = self
            .inner
            .lock()
            .map_err(|_| StoreError::Poisoned("audit log"))?;
        v.push(entry);
        if v.len() > self.cap {
            let excess = v.len() - self.cap;
            v.drain(0..excess);
        }
        Ok(())
    }

    pub fn snapshot_last_n(&self, n: usize) -> Vec<AuditEntry> {
        let Ok(v) = self.inner.lock() else {
            return Vec::new();
        };
        let start = v.len().saturating_sub(n);
        v[start..].to_vec()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::with_capacity(1_000)
    }
}
