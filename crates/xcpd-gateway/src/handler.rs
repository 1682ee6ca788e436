//! Inbound operations of the initiating gateway.

use serde::Serialize;
use xcpd_core::{Subject, SubjectSearchCriteria, SubjectSearchResponse};

use crate::discovery::DiscoveryOrchestrator;
use crate::error::{GatewayError, GatewayResult};
use crate::validation::{validate_discovery_query, validate_identifier_query};

/// Acknowledgement of a new local record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordAddedAck {
    /// Remote subjects confirmed as the same patient.
    pub correlated: usize,
    /// Responding gateways that did not answer.
    pub failed_targets: usize,
}

#[derive(Clone)]
pub struct InitiatingGatewayHandler {
    orchestrator: DiscoveryOrchestrator,
}

impl InitiatingGatewayHandler {
    pub fn new(orchestrator: DiscoveryOrchestrator) -> Self {
        Self { orchestrator }
    }

    pub fn orchestrator(&self) -> &DiscoveryOrchestrator {
        &self.orchestrator
    }

    /// Patient discovery query from a local system.
    pub async fn find_candidates(
        &self,
        mut criteria: SubjectSearchCriteria,
    ) -> GatewayResult<SubjectSearchResponse> {
        self.prepare(&mut criteria);
        validate_discovery_query(&criteria)?;

        let result = self.orchestrator.perform_discovery(&criteria).await?;
        Ok(result.into_response())
    }

    /// Known-identifier lookup: resolves the identifier locally, then runs
    /// discovery for the single local subject found.
    pub async fn get_identifiers(
        &self,
        mut criteria: SubjectSearchCriteria,
    ) -> GatewayResult<SubjectSearchResponse> {
        self.prepare(&mut criteria);
        let authority = self.orchestrator.community().assigning_authority.clone();
        criteria.add_scoping_assigning_authority(authority.clone());
        validate_identifier_query(&criteria)?;

        let local = self.orchestrator.lookup().find_candidates(&criteria).await?;
        let subject = match local.subjects.as_slice() {
            [] => return Err(GatewayError::validation("0 local subjects found")),
            [subject] => subject.clone(),
            _ => return Err(GatewayError::validation("> 1 local subjects found")),
        };

        let mut discovery = SubjectSearchCriteria::new(subject)
            .with_community_assigning_authority(authority);
        discovery.minimum_degree_match_percentage = criteria.minimum_degree_match_percentage;

        let result = self.orchestrator.perform_discovery(&discovery).await?;
        Ok(result.into_response())
    }

    /// A new record was registered locally; correlates it with the remote
    /// communities so later queries are answered from the cache.
    pub async fn record_added(&self, subject: Subject) -> GatewayResult<RecordAddedAck> {
        let mut criteria = SubjectSearchCriteria::new(subject);
        self.prepare(&mut criteria);
        validate_discovery_query(&criteria)?;

        let result = self.orchestrator.perform_discovery(&criteria).await?;
        let ack = RecordAddedAck {
            correlated: result.subjects.len(),
            failed_targets: result.failed_targets().count(),
        };
        tracing::info!(correlated = ack.correlated, "new record correlated");
        Ok(ack)
    }

    fn prepare(&self, criteria: &mut SubjectSearchCriteria) {
        let community = self.orchestrator.community();
        criteria.community_assigning_authority = Some(community.assigning_authority.clone());
        if !criteria.has_specified_minimum_degree_match_percentage() {
            tracing::debug!(
                percentage = community.minimum_degree_match_percentage,
                "applying configured minimum degree match percentage"
            );
            criteria.default_minimum_degree_match_percentage(community.minimum_degree_match_percentage);
        }
    }
}
