//! # xcpd-cache
//!
//! Patient correlation cache for the XCPD initiating gateway.
//!
//! The cache remembers, per local patient and remote community, whether a
//! previous discovery found the patient there (`Active`, with the remote
//! patient id) or not (`NotFound`). The gateway consults it before fanning
//! out so that already-resolved communities are not queried again until the
//! cache is flushed.
//!
//! ## Example
//!
//! ```ignore
//! use xcpd_cache::{CorrelationCacheEntry, CorrelationCacheStore, InMemoryCorrelationCache};
//!
//! let cache = InMemoryCorrelationCache::new();
//! cache
//!     .store(&[CorrelationCacheEntry::not_found("1^^^&1.1&ISO", "urn:oid:1", "urn:oid:2")])
//!     .await?;
//! let rows = cache.lookup("1^^^&1.1&ISO", "urn:oid:1").await?;
//! assert_eq!(rows.len(), 1);
//! ```

mod error;
pub mod memory;
mod traits;
mod types;

pub use error::{CacheError, ErrorCategory};
pub use memory::InMemoryCorrelationCache;
pub use traits::CorrelationCacheStore;
pub use types::{CorrelationCacheEntry, CorrelationStatus};

/// Type alias for a cache result.
pub type CacheResult<T> = Result<T, CacheError>;

/// Type alias for a shareable cache store.
pub type DynCorrelationCache = std::sync::Arc<dyn CorrelationCacheStore>;
