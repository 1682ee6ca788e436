//! Initiating gateway for cross-community patient discovery.
//!
//! Given a local identity query, the gateway asks the configured responding
//! gateways (remote communities) for the same patient, accepts a remote
//! candidate only after its demographics resolve back to the local patient,
//! and remembers every outcome in a correlation cache so a community that
//! already answered is not asked again.
//!
//! # Components
//!
//! - [`TargetSelector`]: responding gateways without a cached outcome
//! - [`FanOutController`]: concurrent requests on a bounded [`WorkerPool`]
//! - [`MatchConfirmer`]: local re-query of remote demographics
//! - [`ResponseAggregator`]: merging and cache update
//! - [`DiscoveryOrchestrator`]: composition root tying them together
//! - [`InitiatingGatewayHandler`]: inbound operations
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use xcpd_gateway::{DiscoveryOrchestrator, InitiatingGatewayHandler, config::loader};
//!
//! let config = loader::load_config(None)?;
//! xcpd_gateway::observability::init_from_config(&config.logging);
//!
//! let cache = Arc::new(config.cache.build_memory_cache());
//! let orchestrator = DiscoveryOrchestrator::from_config(&config, cache, lookup, transport);
//! let handler = InitiatingGatewayHandler::new(orchestrator);
//! let response = handler.find_candidates(criteria).await?;
//! ```

pub mod aggregate;
pub mod config;
pub mod confirm;
pub mod discovery;
pub mod error;
pub mod fanout;
pub mod handler;
pub mod lookup;
pub mod observability;
pub mod selector;
pub mod target;
pub mod transport;
pub mod validation;

pub use aggregate::{AggregatedResult, ResponseAggregator, TargetOutcome, TargetSummary};
pub use config::{AppConfig, ConfigError};
pub use confirm::MatchConfirmer;
pub use discovery::{DiscoveryOrchestrator, LocalCommunity};
pub use error::{GatewayError, GatewayResult, LookupError, TransportError};
pub use fanout::{Dispatch, DispatchMode, FanOutController, TargetFailure, WorkerPool};
pub use handler::{InitiatingGatewayHandler, RecordAddedAck};
pub use lookup::{DynLocalIdentityLookup, LocalIdentityLookup};
pub use selector::TargetSelector;
pub use target::{GatewayTarget, TargetRegistry};
pub use transport::{DynGatewayTransport, GatewayRequest, GatewayResponse, GatewayTransport};
