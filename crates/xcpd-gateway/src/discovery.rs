//! Cross-community patient discovery.
//!
//! [`DiscoveryOrchestrator`] is the composition root of the gateway: it is
//! built once at startup (from configuration plus the three collaborators)
//! and shared by cloning. Each call to
//! [`perform_discovery`](DiscoveryOrchestrator::perform_discovery) selects the
//! targets without a cached outcome, fans out to them, confirms the
//! candidates they return and records every dispatched target's outcome in
//! the correlation cache.

use std::sync::Arc;

use tracing::Instrument;
use uuid::Uuid;
use xcpd_cache::DynCorrelationCache;
use xcpd_core::{SubjectIdentifier, SubjectIdentifierDomain, SubjectSearchCriteria};

use crate::aggregate::{AggregatedResult, ResponseAggregator};
use crate::config::AppConfig;
use crate::confirm::MatchConfirmer;
use crate::error::{GatewayError, GatewayResult};
use crate::fanout::{FanOutController, WorkerPool};
use crate::lookup::DynLocalIdentityLookup;
use crate::selector::TargetSelector;
use crate::target::{GatewayTarget, TargetRegistry};
use crate::transport::{DynGatewayTransport, GatewayRequest};

/// Identity of the local community.
#[derive(Debug, Clone)]
pub struct LocalCommunity {
    pub home_community_id: String,
    pub assigning_authority: SubjectIdentifierDomain,
    pub minimum_degree_match_percentage: u8,
}

#[derive(Clone)]
pub struct DiscoveryOrchestrator {
    community: Arc<LocalCommunity>,
    registry: Arc<TargetRegistry>,
    lookup: DynLocalIdentityLookup,
    cache: DynCorrelationCache,
    selector: TargetSelector,
    fanout: FanOutController,
    aggregator: ResponseAggregator,
}

impl DiscoveryOrchestrator {
    /// Wires the orchestrator from validated configuration.
    pub fn from_config(
        config: &AppConfig,
        cache: DynCorrelationCache,
        lookup: DynLocalIdentityLookup,
        transport: DynGatewayTransport,
    ) -> Self {
        let community = LocalCommunity {
            home_community_id: config.gateway.home_community_id.clone(),
            assigning_authority: config.community_assigning_authority(),
            minimum_degree_match_percentage: config.gateway.minimum_degree_match_percentage,
        };
        let registry = Arc::new(TargetRegistry::new(config.responding_gateways.clone()));
        let fanout = FanOutController::new(
            transport,
            WorkerPool::new(config.gateway.max_concurrent_requests),
        )
        .with_multi_thread(config.gateway.multi_thread)
        .with_request_timeout(config.request_timeout());

        tracing::info!(
            home_community_id = %community.home_community_id,
            responding_gateways = registry.len(),
            pool_size = fanout.pool().size(),
            multi_thread = config.gateway.multi_thread,
            cache_backend = cache.backend_name(),
            "discovery orchestrator initialized"
        );

        Self::new(community, registry, cache, lookup, fanout)
    }

    pub fn new(
        community: LocalCommunity,
        registry: Arc<TargetRegistry>,
        cache: DynCorrelationCache,
        lookup: DynLocalIdentityLookup,
        fanout: FanOutController,
    ) -> Self {
        let selector = TargetSelector::new(
            Arc::clone(&registry),
            Arc::clone(&cache),
            community.home_community_id.clone(),
        );
        let aggregator = ResponseAggregator::new(
            MatchConfirmer::new(Arc::clone(&lookup)),
            Arc::clone(&cache),
            community.home_community_id.clone(),
        );
        Self {
            community: Arc::new(community),
            registry,
            lookup,
            cache,
            selector,
            fanout,
            aggregator,
        }
    }

    pub fn community(&self) -> &LocalCommunity {
        &self.community
    }

    pub fn registry(&self) -> &TargetRegistry {
        &self.registry
    }

    pub fn fanout(&self) -> &FanOutController {
        &self.fanout
    }

    pub fn cache(&self) -> &DynCorrelationCache {
        &self.cache
    }

    pub fn lookup(&self) -> &DynLocalIdentityLookup {
        &self.lookup
    }

    /// Returns the responding gateways `criteria` would be sent to.
    pub async fn select_targets(
        &self,
        criteria: &SubjectSearchCriteria,
    ) -> GatewayResult<Vec<GatewayTarget>> {
        self.selector.select_targets(criteria).await
    }

    /// Runs one discovery for the patient identified by the criteria's
    /// community identifier.
    ///
    /// Remote, cache and confirmation faults only degrade the result.
    ///
    /// # Errors
    ///
    /// `GatewayError::MissingCommunityIdentifier` when the criteria carry no
    /// identifier under their community assigning authority.
    pub async fn perform_discovery(
        &self,
        criteria: &SubjectSearchCriteria,
    ) -> GatewayResult<AggregatedResult> {
        let local_patient_id = criteria
            .community_identifier()
            .ok_or(GatewayError::MissingCommunityIdentifier)?
            .clone();

        let span = tracing::info_span!(
            "discovery",
            discovery_id = %Uuid::new_v4(),
            local_patient_id = %local_patient_id,
        );

        self.discover(criteria, &local_patient_id)
            .instrument(span)
            .await
    }

    async fn discover(
        &self,
        criteria: &SubjectSearchCriteria,
        local_patient_id: &SubjectIdentifier,
    ) -> GatewayResult<AggregatedResult> {
        let targets = self.selector.select_targets(criteria).await?;
        if targets.is_empty() {
            tracing::info!("no responding gateway left to query");
            return Ok(AggregatedResult::default());
        }

        let shared = Arc::new(criteria.clone());
        let requests = targets
            .into_iter()
            .map(|target| GatewayRequest::new(target, Arc::clone(&shared)))
            .collect();
        let dispatch = self.fanout.dispatch(requests).await;

        let mode = dispatch.mode;
        let mut result = self
            .aggregator
            .aggregate(dispatch.responses, local_patient_id, criteria)
            .await;
        for failure in &dispatch.failures {
            result.record_failure(failure);
        }
        result.dispatch_mode = Some(mode);

        tracing::info!(
            dispatch_mode = ?mode,
            targets = result.targets.len(),
            failed = dispatch.failures.len(),
            confirmed = result.subjects.len(),
            "discovery completed"
        );
        Ok(result)
    }
}
