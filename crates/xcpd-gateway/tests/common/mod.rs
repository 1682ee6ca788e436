//! In-memory fakes of the gateway collaborators.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use url::Url;
use xcpd_cache::{
    CacheError, CorrelationCacheEntry, CorrelationCacheStore, InMemoryCorrelationCache,
};
use xcpd_core::{
    Subject, SubjectIdentifier, SubjectIdentifierDomain, SubjectName, SubjectSearchCriteria,
    SubjectSearchResponse,
};
use xcpd_gateway::{
    AppConfig, DiscoveryOrchestrator, GatewayTarget, GatewayTransport, LocalIdentityLookup,
    LookupError, TransportError,
};

pub const LOCAL_HOME: &str = "urn:oid:1.1";
pub const LOCAL_AUTHORITY: &str = "1.1.1";
pub const LOCAL_PATIENT_CX: &str = "L1^^^&1.1.1&ISO";

pub fn local_authority() -> SubjectIdentifierDomain {
    SubjectIdentifierDomain::new(LOCAL_AUTHORITY)
}

pub fn local_patient_id() -> SubjectIdentifier {
    SubjectIdentifier::new("L1", local_authority())
}

pub fn person(given: &str, family: &str, birth_time: &str) -> Subject {
    Subject {
        names: vec![SubjectName::new(given, family)],
        gender: Some("F".into()),
        birth_time: Some(birth_time.into()),
        ..Default::default()
    }
}

/// Jane Doe as registered locally.
pub fn local_patient() -> Subject {
    Subject {
        identifiers: vec![local_patient_id()],
        ..person("Jane", "Doe", "19700101")
    }
}

/// A remote subject with one identifier per `(value, universal id)` pair.
pub fn remote_subject(family: &str, ids: &[(&str, &str)]) -> Subject {
    Subject {
        identifiers: ids
            .iter()
            .map(|(value, domain)| SubjectIdentifier::new(*value, SubjectIdentifierDomain::new(*domain)))
            .collect(),
        match_confidence_percentage: Some(95),
        ..person("Jane", family, "19700101")
    }
}

/// Discovery criteria for the local patient, as the handler would prepare them.
pub fn discovery_criteria() -> SubjectSearchCriteria {
    SubjectSearchCriteria::new(local_patient())
        .with_community_assigning_authority(local_authority())
        .with_minimum_degree_match_percentage(90)
}

pub fn community_id(n: usize) -> String {
    format!("urn:oid:2.{n}")
}

pub fn target(n: usize) -> GatewayTarget {
    GatewayTarget::new(
        community_id(n),
        Url::parse(&format!("https://rg{n}.example.org/xcpd")).unwrap(),
    )
    .with_name(format!("Community {n}"))
}

pub fn config(targets: usize) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.gateway.home_community_id = LOCAL_HOME.into();
    cfg.gateway.community_assigning_authority = LOCAL_AUTHORITY.into();
    cfg.responding_gateways = (1..=targets).map(target).collect();
    cfg.validate().unwrap();
    cfg
}

pub fn orchestrator(
    cfg: &AppConfig,
    cache: Arc<dyn CorrelationCacheStore>,
    lookup: Arc<FakeLookup>,
    transport: Arc<FakeTransport>,
) -> DiscoveryOrchestrator {
    DiscoveryOrchestrator::from_config(cfg, cache, lookup, transport)
}

/// Local identity index.
///
/// Queries carrying identifiers match on identifiers; demographic queries
/// match on family name plus birth time. Returned identifiers are pruned to
/// the scoping authorities.
#[derive(Default)]
pub struct FakeLookup {
    subjects: Vec<Subject>,
    failing_family: Option<String>,
    queries: Mutex<Vec<SubjectSearchCriteria>>,
}

impl FakeLookup {
    pub fn new(subjects: Vec<Subject>) -> Self {
        Self {
            subjects,
            ..Default::default()
        }
    }

    /// Index holding only the local patient.
    pub fn with_local_patient() -> Self {
        Self::new(vec![local_patient()])
    }

    /// Demographic queries for `family` fail with a transport fault.
    pub fn failing_for(mut self, family: &str) -> Self {
        self.failing_family = Some(family.into());
        self
    }

    pub fn queries(&self) -> Vec<SubjectSearchCriteria> {
        self.queries.lock().unwrap().clone()
    }
}

fn family_of(subject: &Subject) -> Option<&str> {
    subject.names.first().and_then(|n| n.family.as_deref())
}

#[async_trait]
impl LocalIdentityLookup for FakeLookup {
    async fn find_candidates(
        &self,
        criteria: &SubjectSearchCriteria,
    ) -> Result<SubjectSearchResponse, LookupError> {
        self.queries.lock().unwrap().push(criteria.clone());
        let wanted = &criteria.subject;

        if let (Some(failing), Some(family)) = (&self.failing_family, family_of(wanted)) {
            if failing == family {
                return Err(LookupError::Transport("local index unreachable".into()));
            }
        }

        let subjects = self
            .subjects
            .iter()
            .filter(|local| {
                if wanted.has_identifiers() {
                    wanted.identifiers.iter().any(|id| local.has_identifier(id))
                } else {
                    family_of(local) == family_of(wanted) && local.birth_time == wanted.birth_time
                }
            })
            .map(|local| {
                let mut found = local.clone();
                if criteria.has_scoping_assigning_authorities() {
                    found.identifiers = local
                        .identifiers_within(&criteria.scoping_assigning_authorities)
                        .cloned()
                        .collect();
                }
                found
            })
            .collect();
        Ok(SubjectSearchResponse::new(subjects))
    }
}

pub enum Reply {
    Subjects(Vec<Subject>),
    Delayed(Duration, Vec<Subject>),
    Fail,
    Panic,
}

/// Responding gateways keyed by community id. Unknown communities answer
/// with no candidates.
#[derive(Default)]
pub struct FakeTransport {
    replies: HashMap<String, Reply>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, target: usize, reply: Reply) -> Self {
        self.replies.insert(community_id(target), reply);
        self
    }

    /// Community ids called, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, target: usize) -> bool {
        self.calls().contains(&community_id(target))
    }

    /// Highest number of simultaneous calls observed.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GatewayTransport for FakeTransport {
    async fn send_discovery_request(
        &self,
        target: &GatewayTarget,
        _criteria: &SubjectSearchCriteria,
    ) -> Result<SubjectSearchResponse, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push(target.home_community_id.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let result = match self.replies.get(&target.home_community_id) {
            None => Ok(SubjectSearchResponse::default()),
            Some(Reply::Subjects(subjects)) => Ok(SubjectSearchResponse::new(subjects.clone())),
            Some(Reply::Delayed(delay, subjects)) => {
                tokio::time::sleep(*delay).await;
                Ok(SubjectSearchResponse::new(subjects.clone()))
            }
            Some(Reply::Fail) => Err(TransportError::transport("connection refused")),
            Some(Reply::Panic) => panic!("responding gateway stub panicked"),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// A correlation cache whose backing store is down.
pub struct UnavailableCache;

#[async_trait]
impl CorrelationCacheStore for UnavailableCache {
    async fn lookup(&self, _: &str, _: &str) -> Result<Vec<CorrelationCacheEntry>, CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }

    async fn store(&self, _: &[CorrelationCacheEntry]) -> Result<(), CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }

    async fn purge_remote_community(&self, _: &str) -> Result<usize, CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }

    async fn purge_patient(&self, _: &str, _: &str) -> Result<usize, CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }

    fn backend_name(&self) -> &'static str {
        "unavailable"
    }
}

/// Rows cached for the local patient at remote community `n`.
pub async fn rows_for(cache: &InMemoryCorrelationCache, n: usize) -> Vec<CorrelationCacheEntry> {
    cache
        .lookup(LOCAL_PATIENT_CX, LOCAL_HOME)
        .await
        .unwrap()
        .into_iter()
        .filter(|row| row.is_for_remote_community(&community_id(n)))
        .collect()
}
