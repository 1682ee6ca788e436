use std::sync::Arc;

use async_trait::async_trait;
use xcpd_core::{SubjectSearchCriteria, SubjectSearchResponse};

use crate::error::LookupError;

/// Search against the local identity index.
///
/// Implementations honour `minimum_degree_match_percentage` and prune the
/// identifiers of every returned subject to the criteria's scoping
/// assigning authorities when any are given.
#[async_trait]
pub trait LocalIdentityLookup: Send + Sync {
    async fn find_candidates(
        &self,
        criteria: &SubjectSearchCriteria,
    ) -> Result<SubjectSearchResponse, LookupError>;
}

pub type DynLocalIdentityLookup = Arc<dyn LocalIdentityLookup>;
