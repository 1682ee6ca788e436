//! Response aggregation and correlation cache update.

use xcpd_cache::{CorrelationCacheEntry, DynCorrelationCache};
use xcpd_core::{Subject, SubjectIdentifier, SubjectSearchCriteria, SubjectSearchResponse};

use crate::confirm::MatchConfirmer;
use crate::fanout::{DispatchMode, TargetFailure};
use crate::target::GatewayTarget;
use crate::transport::GatewayResponse;

/// What happened at one dispatched target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetOutcome {
    /// At least one candidate was confirmed.
    Correlated { confirmed: usize, unconfirmed: usize },
    /// The target answered but nothing was confirmed.
    NotFound { unconfirmed: usize },
    /// No response was obtained.
    Failed { reason: String },
}

#[derive(Debug, Clone)]
pub struct TargetSummary {
    pub target: GatewayTarget,
    pub outcome: TargetOutcome,
}

/// Confirmed matches of one discovery, plus a per-target account.
#[derive(Debug, Clone, Default)]
pub struct AggregatedResult {
    /// Confirmed subjects carrying their remote identifiers, grouped by
    /// target. Not de-duplicated across targets.
    pub subjects: Vec<Subject>,
    pub targets: Vec<TargetSummary>,
    /// `None` when nothing was dispatched.
    pub dispatch_mode: Option<DispatchMode>,
}

impl AggregatedResult {
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    pub fn failed_targets(&self) -> impl Iterator<Item = &GatewayTarget> {
        self.targets
            .iter()
            .filter(|summary| matches!(summary.outcome, TargetOutcome::Failed { .. }))
            .map(|summary| &summary.target)
    }

    pub fn record_failure(&mut self, failure: &TargetFailure) {
        self.targets.push(TargetSummary {
            target: failure.target.clone(),
            outcome: TargetOutcome::Failed {
                reason: failure.error.to_string(),
            },
        });
    }

    pub fn into_response(self) -> SubjectSearchResponse {
        SubjectSearchResponse::new(self.subjects)
    }
}

/// Confirms the candidates of each response and records the outcome of each
/// target in the correlation cache.
#[derive(Clone)]
pub struct ResponseAggregator {
    confirmer: MatchConfirmer,
    cache: DynCorrelationCache,
    local_home_community_id: String,
}

impl ResponseAggregator {
    pub fn new(
        confirmer: MatchConfirmer,
        cache: DynCorrelationCache,
        local_home_community_id: impl Into<String>,
    ) -> Self {
        Self {
            confirmer,
            cache,
            local_home_community_id: local_home_community_id.into(),
        }
    }

    pub async fn aggregate(
        &self,
        responses: Vec<GatewayResponse>,
        local_patient_id: &SubjectIdentifier,
        query: &SubjectSearchCriteria,
    ) -> AggregatedResult {
        let mut result = AggregatedResult::default();
        for GatewayResponse { target, response } in responses {
            let (confirmed, unconfirmed) = self
                .confirm_candidates(&target, response.subjects, local_patient_id, query)
                .await;

            tracing::info!(
                remote_home_community_id = %target.home_community_id,
                confirmed = confirmed.len(),
                unconfirmed,
                "responding gateway candidates confirmed"
            );

            self.record_outcome(&target, &confirmed, local_patient_id).await;

            let outcome = if confirmed.is_empty() {
                TargetOutcome::NotFound { unconfirmed }
            } else {
                TargetOutcome::Correlated {
                    confirmed: confirmed.len(),
                    unconfirmed,
                }
            };
            result.targets.push(TargetSummary { target, outcome });
            result.subjects.extend(confirmed);
        }
        result
    }

    async fn confirm_candidates(
        &self,
        target: &GatewayTarget,
        candidates: Vec<Subject>,
        local_patient_id: &SubjectIdentifier,
        query: &SubjectSearchCriteria,
    ) -> (Vec<Subject>, usize) {
        let mut confirmed = Vec::new();
        let mut unconfirmed = 0;
        for candidate in candidates {
            if !self
                .confirmer
                .confirm(&candidate, local_patient_id, query)
                .await
            {
                unconfirmed += 1;
                continue;
            }
            if !carries_scoped_identifier(&candidate, query) {
                tracing::warn!(
                    remote_home_community_id = %target.home_community_id,
                    "confirmed candidate has no identifier in the requested authorities; dropped"
                );
                unconfirmed += 1;
                continue;
            }
            confirmed.push(candidate);
        }
        (confirmed, unconfirmed)
    }

    /// Writes ACTIVE rows (one per identifier of each confirmed subject), or a
    /// single NOTFOUND row when nothing was confirmed.
    async fn record_outcome(
        &self,
        target: &GatewayTarget,
        confirmed: &[Subject],
        local_patient_id: &SubjectIdentifier,
    ) {
        let local_patient_cx = local_patient_id.cx_formatted();
        let rows: Vec<CorrelationCacheEntry> = if confirmed.is_empty() {
            vec![CorrelationCacheEntry::not_found(
                &local_patient_cx,
                &self.local_home_community_id,
                &target.home_community_id,
            )]
        } else {
            confirmed
                .iter()
                .flat_map(|subject| subject.identifiers.iter())
                .map(|remote_id| {
                    CorrelationCacheEntry::active(
                        &local_patient_cx,
                        &self.local_home_community_id,
                        &target.home_community_id,
                        remote_id.cx_formatted(),
                    )
                })
                .collect()
        };

        if let Err(e) = self.cache.store(&rows).await {
            tracing::error!(
                remote_home_community_id = %target.home_community_id,
                local_patient_id = %local_patient_cx,
                error = %e,
                category = %e.category(),
                "failed to store correlation outcome"
            );
        }
    }
}

/// Without scoping authorities any identifier will do.
fn carries_scoped_identifier(subject: &Subject, query: &SubjectSearchCriteria) -> bool {
    if query.has_scoping_assigning_authorities() {
        subject
            .identifiers_within(&query.scoping_assigning_authorities)
            .next()
            .is_some()
    } else {
        subject.has_identifiers()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xcpd_core::SubjectIdentifierDomain;

    fn subject_with(domain: &str) -> Subject {
        Subject {
            identifiers: vec![SubjectIdentifier::new(
                "R1",
                SubjectIdentifierDomain::new(domain),
            )],
            ..Default::default()
        }
    }

    #[test]
    fn test_scoped_identifier_check() {
        let mut query = SubjectSearchCriteria::default();
        assert!(carries_scoped_identifier(&subject_with("2.2"), &query));
        assert!(!carries_scoped_identifier(&Subject::default(), &query));

        query.add_scoping_assigning_authority(SubjectIdentifierDomain::new("1.1"));
        assert!(!carries_scoped_identifier(&subject_with("2.2"), &query));
        assert!(carries_scoped_identifier(&subject_with("1.1"), &query));
    }
}
