//! Outbound requests to responding gateways.

use std::sync::Arc;

use async_trait::async_trait;
use xcpd_core::{SubjectSearchCriteria, SubjectSearchResponse};

use crate::error::TransportError;
use crate::target::GatewayTarget;

/// Sends a patient discovery query to one responding gateway.
///
/// Message building and wire delivery live behind this trait. One call is
/// one round trip; implementations apply their own transport timeout and
/// return an error for transport faults and for structurally invalid
/// responses.
#[async_trait]
pub trait GatewayTransport: Send + Sync {
    async fn send_discovery_request(
        &self,
        target: &GatewayTarget,
        criteria: &SubjectSearchCriteria,
    ) -> Result<SubjectSearchResponse, TransportError>;
}

/// Type alias for a shared transport.
pub type DynGatewayTransport = Arc<dyn GatewayTransport>;

/// One outbound discovery request. Created per orchestration run and
/// dropped after aggregation.
#[derive(Debug, Clone)]
pub struct GatewayRequest {
    pub target: GatewayTarget,
    pub criteria: Arc<SubjectSearchCriteria>,
}

impl GatewayRequest {
    pub fn new(target: GatewayTarget, criteria: Arc<SubjectSearchCriteria>) -> Self {
        Self { target, criteria }
    }
}

/// The answer of one responding gateway.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub target: GatewayTarget,
    pub response: SubjectSearchResponse,
}
