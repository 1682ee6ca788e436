//! Target selection: which responding gateways still need to be asked.

use std::sync::Arc;

use xcpd_cache::DynCorrelationCache;
use xcpd_core::SubjectSearchCriteria;

use crate::error::{GatewayError, GatewayResult};
use crate::target::{GatewayTarget, TargetRegistry};

/// Selects the configured targets without a cached outcome for the patient.
#[derive(Clone)]
pub struct TargetSelector {
    registry: Arc<TargetRegistry>,
    cache: DynCorrelationCache,
    local_home_community_id: String,
}

impl TargetSelector {
    pub fn new(
        registry: Arc<TargetRegistry>,
        cache: DynCorrelationCache,
        local_home_community_id: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            cache,
            local_home_community_id: local_home_community_id.into(),
        }
    }

    /// Returns the targets to query for `criteria`, in configuration order.
    ///
    /// A target is skipped when the cache holds any row (ACTIVE or NOTFOUND)
    /// for it. A failing cache is treated as empty.
    ///
    /// # Errors
    ///
    /// `GatewayError::MissingCommunityIdentifier` when the criteria carry no
    /// identifier under the community assigning authority.
    pub async fn select_targets(
        &self,
        criteria: &SubjectSearchCriteria,
    ) -> GatewayResult<Vec<GatewayTarget>> {
        let local_patient_id = criteria
            .community_identifier()
            .ok_or(GatewayError::MissingCommunityIdentifier)?
            .cx_formatted();
        let targets = self.registry.snapshot();

        let cached = match self
            .cache
            .lookup(&local_patient_id, &self.local_home_community_id)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    category = %e.category(),
                    backend = self.cache.backend_name(),
                    "correlation cache lookup failed; querying every responding gateway"
                );
                return Ok(targets.to_vec());
            }
        };

        let selected: Vec<GatewayTarget> = targets
            .iter()
            .filter(|target| {
                let known = cached
                    .iter()
                    .any(|row| row.is_for_remote_community(&target.home_community_id));
                if known {
                    tracing::debug!(gateway = %target, "skipping responding gateway with cached outcome");
                }
                !known
            })
            .cloned()
            .collect();

        tracing::debug!(
            configured = targets.len(),
            selected = selected.len(),
            "responding gateways selected"
        );
        Ok(selected)
    }
}
