//! Responding gateway descriptors and the process-wide target registry.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use url::Url;

/// A configured remote community.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayTarget {
    /// Home community id of the responding gateway (e.g. `urn:oid:1.2.3`).
    pub home_community_id: String,
    /// Discovery endpoint of the responding gateway.
    pub endpoint: Url,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl GatewayTarget {
    pub fn new(home_community_id: impl Into<String>, endpoint: Url) -> Self {
        Self {
            home_community_id: home_community_id.into(),
            endpoint,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Community ids compare ASCII case-insensitively.
    pub fn is_community(&self, home_community_id: &str) -> bool {
        self.home_community_id
            .eq_ignore_ascii_case(home_community_id)
    }
}

impl fmt::Display for GatewayTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(community: {}, endpoint: {})",
            self.home_community_id, self.endpoint
        )
    }
}

/// The configured responding gateways.
///
/// Readers take a lock-free snapshot; `replace` swaps the whole list
/// atomically, so a discovery in flight keeps the list it started with.
#[derive(Debug)]
pub struct TargetRegistry {
    targets: ArcSwap<Vec<GatewayTarget>>,
}

impl TargetRegistry {
    pub fn new(targets: Vec<GatewayTarget>) -> Self {
        Self {
            targets: ArcSwap::from_pointee(targets),
        }
    }

    /// Returns the current target list.
    pub fn snapshot(&self) -> Arc<Vec<GatewayTarget>> {
        self.targets.load_full()
    }

    /// Replaces the target list, e.g. after the directory of responding
    /// gateways changed.
    pub fn replace(&self, targets: Vec<GatewayTarget>) {
        tracing::info!(count = targets.len(), "responding gateway list replaced");
        self.targets.store(Arc::new(targets));
    }

    pub fn len(&self) -> usize {
        self.targets.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.load().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(id: &str) -> GatewayTarget {
        GatewayTarget::new(id, Url::parse("https://rg.example.org/xcpd").unwrap())
    }

    #[test]
    fn test_display() {
        assert_eq!(
            target("urn:oid:2.2").to_string(),
            "(community: urn:oid:2.2, endpoint: https://rg.example.org/xcpd)"
        );
    }

    #[test]
    fn test_community_match_ignores_case() {
        assert!(target("urn:oid:2.2").is_community("URN:OID:2.2"));
        assert!(!target("urn:oid:2.2").is_community("urn:oid:2.3"));
    }

    #[test]
    fn test_snapshot_survives_replace() {
        let registry = TargetRegistry::new(vec![target("urn:oid:1"), target("urn:oid:2")]);
        let before = registry.snapshot();

        registry.replace(vec![target("urn:oid:3")]);

        assert_eq!(before.len(), 2);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.snapshot()[0].home_community_id, "urn:oid:3");
        assert!(!registry.is_empty());
    }
}
