//! In-memory correlation cache backed by `DashMap`.

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;
use time::OffsetDateTime;

use crate::error::CacheError;
use crate::traits::CorrelationCacheStore;
use crate::types::{CorrelationCacheEntry, CorrelationStatus};

/// Rows are bucketed per local patient: (local patient id, lowercased local
/// home community id).
type PatientKey = (String, String);

fn patient_key(local_patient_id: &str, local_home_community_id: &str) -> PatientKey {
    (
        local_patient_id.to_string(),
        local_home_community_id.to_ascii_lowercase(),
    )
}

/// In-memory correlation cache.
///
/// This implementation provides:
/// - Sharded concurrent access via `DashMap`
/// - Replace-per-triple writes (last write wins)
/// - Optional time-to-live; expired rows are invisible to `lookup` and are
///   evicted lazily
#[derive(Debug, Default)]
pub struct InMemoryCorrelationCache {
    rows: DashMap<PatientKey, Vec<CorrelationCacheEntry>>,
    ttl: Option<time::Duration>,
}

impl InMemoryCorrelationCache {
    /// Creates a cache whose rows never expire.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache whose rows expire `ttl` after they were written.
    ///
    /// A `ttl` too large to represent keeps rows until purged.
    pub fn with_ttl(ttl: std::time::Duration) -> Self {
        Self {
            rows: DashMap::new(),
            ttl: time::Duration::try_from(ttl).ok(),
        }
    }

    /// Total number of stored rows, expired ones included.
    pub fn row_count(&self) -> usize {
        self.rows.iter().map(|slot| slot.value().len()).sum()
    }

    fn is_live(&self, row: &CorrelationCacheEntry, now: OffsetDateTime) -> bool {
        match self.ttl {
            Some(ttl) => row
                .created_at
                .checked_add(ttl)
                .is_none_or(|expires_at| expires_at > now),
            None => true,
        }
    }

    fn validate(entry: &CorrelationCacheEntry) -> Result<(), CacheError> {
        if entry.local_patient_id.is_empty() {
            return Err(CacheError::invalid_entry("local patient id must not be empty"));
        }
        if entry.local_home_community_id.is_empty() || entry.remote_home_community_id.is_empty() {
            return Err(CacheError::invalid_entry("home community ids must not be empty"));
        }
        if entry.status == CorrelationStatus::Active
            && entry.remote_patient_id.as_deref().is_none_or(str::is_empty)
        {
            return Err(CacheError::invalid_entry(format!(
                "ACTIVE row for {} at {} has no remote patient id",
                entry.local_patient_id, entry.remote_home_community_id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CorrelationCacheStore for InMemoryCorrelationCache {
    async fn lookup(
        &self,
        local_patient_id: &str,
        local_home_community_id: &str,
    ) -> Result<Vec<CorrelationCacheEntry>, CacheError> {
        let key = patient_key(local_patient_id, local_home_community_id);
        if self.ttl.is_none() {
            return Ok(self
                .rows
                .get(&key)
                .map(|slot| slot.value().clone())
                .unwrap_or_default());
        }

        let now = OffsetDateTime::now_utc();
        let live = {
            let Some(mut slot) = self.rows.get_mut(&key) else {
                return Ok(Vec::new());
            };
            slot.retain(|row| self.is_live(row, now));
            slot.clone()
        };

        if live.is_empty() {
            self.rows.remove_if(&key, |_, rows| rows.is_empty());
        }
        Ok(live)
    }

    async fn store(&self, entries: &[CorrelationCacheEntry]) -> Result<(), CacheError> {
        for entry in entries {
            Self::validate(entry)?;
        }

        let mut batches: HashMap<PatientKey, Vec<CorrelationCacheEntry>> = HashMap::new();
        for entry in entries {
            batches
                .entry(patient_key(
                    &entry.local_patient_id,
                    &entry.local_home_community_id,
                ))
                .or_default()
                .push(entry.clone());
        }

        for (key, new_rows) in batches {
            let mut slot = self.rows.entry(key).or_default();
            slot.retain(|row| {
                !new_rows
                    .iter()
                    .any(|new_row| new_row.is_for_remote_community(&row.remote_home_community_id))
            });
            slot.extend(new_rows);
        }

        tracing::debug!(rows = entries.len(), "correlation cache rows stored");
        Ok(())
    }

    async fn purge_remote_community(
        &self,
        remote_home_community_id: &str,
    ) -> Result<usize, CacheError> {
        let mut removed = 0;
        for mut slot in self.rows.iter_mut() {
            let before = slot.len();
            slot.retain(|row| !row.is_for_remote_community(remote_home_community_id));
            removed += before - slot.len();
        }
        self.rows.retain(|_, rows| !rows.is_empty());

        tracing::info!(
            remote_home_community_id,
            removed,
            "correlation cache purged for remote community"
        );
        Ok(removed)
    }

    async fn purge_patient(
        &self,
        local_patient_id: &str,
        local_home_community_id: &str,
    ) -> Result<usize, CacheError> {
        let key = patient_key(local_patient_id, local_home_community_id);
        Ok(self
            .rows
            .remove(&key)
            .map(|(_, rows)| rows.len())
            .unwrap_or(0))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
