//! The correlation cache store contract.

use async_trait::async_trait;

use crate::error::CacheError;
use crate::types::CorrelationCacheEntry;

/// A store of past discovery outcomes.
///
/// Implementations must be thread-safe (`Send + Sync`); the gateway shares
/// one store across concurrent discoveries and holds no lock across calls,
/// so concurrent writers to the same key triple race with last-write-wins.
///
/// # Example
///
/// ```ignore
/// use xcpd_cache::{CorrelationCacheStore, CacheError};
///
/// async fn already_queried(
///     cache: &dyn CorrelationCacheStore,
///     patient: &str,
///     home: &str,
///     remote: &str,
/// ) -> Result<bool, CacheError> {
///     let rows = cache.lookup(patient, home).await?;
///     Ok(rows.iter().any(|row| row.is_for_remote_community(remote)))
/// }
/// ```
#[async_trait]
pub trait CorrelationCacheStore: Send + Sync {
    /// Returns every live row for a local patient across all remote
    /// communities.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Unavailable` when the backing store cannot be
    /// reached.
    async fn lookup(
        &self,
        local_patient_id: &str,
        local_home_community_id: &str,
    ) -> Result<Vec<CorrelationCacheEntry>, CacheError>;

    /// Writes a batch of rows.
    ///
    /// Rows are grouped by key triple; the rows of each triple replace any
    /// rows previously stored for that triple. Nothing is merged.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::InvalidEntry` if any row is malformed (the batch
    /// is rejected as a whole) and `CacheError::Unavailable` when the backing
    /// store cannot be reached.
    async fn store(&self, entries: &[CorrelationCacheEntry]) -> Result<(), CacheError>;

    /// Forgets everything known about one remote community, so that the
    /// next discovery for any patient queries it again.
    ///
    /// Returns the number of rows removed.
    async fn purge_remote_community(
        &self,
        remote_home_community_id: &str,
    ) -> Result<usize, CacheError>;

    /// Forgets everything known about one local patient.
    ///
    /// Returns the number of rows removed.
    async fn purge_patient(
        &self,
        local_patient_id: &str,
        local_home_community_id: &str,
    ) -> Result<usize, CacheError>;

    /// Returns the name of this backend for logging.
    fn backend_name(&self) -> &'static str;
}
