//! Match confirmation: a remote candidate is trusted only when its
//! demographics resolve locally back to the patient being discovered.

use xcpd_core::{Subject, SubjectIdentifier, SubjectSearchCriteria};

use crate::lookup::DynLocalIdentityLookup;

#[derive(Clone)]
pub struct MatchConfirmer {
    lookup: DynLocalIdentityLookup,
}

impl MatchConfirmer {
    pub fn new(lookup: DynLocalIdentityLookup) -> Self {
        Self { lookup }
    }

    /// Returns `true` if a local search on the candidate's demographics
    /// finds a subject carrying `local_patient_id`.
    ///
    /// The search runs on an identifier-free copy of the candidate, scoped to
    /// the local patient's assigning authority, with the minimum degree match
    /// percentage of `query`. The candidate itself is not modified. A failed
    /// lookup leaves the candidate unconfirmed.
    pub async fn confirm(
        &self,
        candidate: &Subject,
        local_patient_id: &SubjectIdentifier,
        query: &SubjectSearchCriteria,
    ) -> bool {
        let local_authority = local_patient_id.domain.clone();
        let mut criteria = SubjectSearchCriteria::new(candidate.without_identifiers())
            .with_community_assigning_authority(local_authority.clone());
        criteria.add_scoping_assigning_authority(local_authority);
        criteria.minimum_degree_match_percentage = query.minimum_degree_match_percentage;

        match self.lookup.find_candidates(&criteria).await {
            Ok(response) => response
                .subjects
                .iter()
                .any(|subject| subject.has_identifier(local_patient_id)),
            Err(e) => {
                tracing::warn!(
                    local_patient_id = %local_patient_id,
                    error = %e,
                    "local lookup failed while confirming a remote candidate"
                );
                false
            }
        }
    }
}
