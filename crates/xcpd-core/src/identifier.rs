//! Patient identifiers and the assigning authorities that issue them.
//!
//! Identifiers are rendered in HL7 CX form when they need a flat string
//! representation (for example as correlation cache keys):
//!
//! ```text
//! 12345^^^HOSP&1.2.840.113619.6.197&ISO
//! value    namespace&universal id&type
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::{CoreError, Result};

const CX_COMPONENT_SEPARATOR: &str = "^^^";
const CX_SUBCOMPONENT_SEPARATOR: char = '&';

/// An identifier domain (assigning authority).
///
/// Two domains are the same authority when their `universal_id` values are
/// equal; `namespace_id` and `universal_id_type` are descriptive only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectIdentifierDomain {
    pub universal_id: String,
    #[serde(default = "default_universal_id_type")]
    pub universal_id_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_id: Option<String>,
}

fn default_universal_id_type() -> String {
    "ISO".to_string()
}

impl SubjectIdentifierDomain {
    /// Creates an ISO (OID) domain with no namespace.
    pub fn new(universal_id: impl Into<String>) -> Self {
        Self {
            universal_id: universal_id.into(),
            universal_id_type: default_universal_id_type(),
            namespace_id: None,
        }
    }

    pub fn with_namespace(mut self, namespace_id: impl Into<String>) -> Self {
        self.namespace_id = Some(namespace_id.into());
        self
    }

    /// Fails when the universal id is blank.
    pub fn validate(&self) -> Result<()> {
        if self.universal_id.trim().is_empty() {
            return Err(CoreError::invalid_assigning_authority(
                "universal id must not be empty",
            ));
        }
        Ok(())
    }
}

impl PartialEq for SubjectIdentifierDomain {
    fn eq(&self, other: &Self) -> bool {
        self.universal_id == other.universal_id
    }
}

impl Eq for SubjectIdentifierDomain {}

impl Hash for SubjectIdentifierDomain {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.universal_id.hash(state);
    }
}

/// A patient identifier scoped to its assigning authority.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectIdentifier {
    pub identifier: String,
    pub domain: SubjectIdentifierDomain,
}

impl SubjectIdentifier {
    pub fn new(identifier: impl Into<String>, domain: SubjectIdentifierDomain) -> Self {
        Self {
            identifier: identifier.into(),
            domain,
        }
    }

    /// Returns `true` if this identifier was issued by `domain`.
    pub fn is_in_domain(&self, domain: &SubjectIdentifierDomain) -> bool {
        self.domain == *domain
    }

    /// Renders the identifier in CX form.
    pub fn cx_formatted(&self) -> String {
        self.to_string()
    }

    /// Parses an identifier from CX form.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidIdentifier` when the value or universal id
    /// component is missing.
    pub fn from_cx(cx: &str) -> Result<Self> {
        let (value, authority) = cx
            .split_once(CX_COMPONENT_SEPARATOR)
            .ok_or_else(|| CoreError::invalid_identifier(cx))?;
        if value.is_empty() {
            return Err(CoreError::invalid_identifier(cx));
        }

        let mut parts = authority.splitn(3, CX_SUBCOMPONENT_SEPARATOR);
        let namespace_id = parts.next().filter(|s| !s.is_empty());
        let universal_id = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CoreError::invalid_identifier(cx))?;
        let universal_id_type = parts
            .next()
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(default_universal_id_type);

        Ok(Self {
            identifier: value.to_string(),
            domain: SubjectIdentifierDomain {
                universal_id: universal_id.to_string(),
                universal_id_type,
                namespace_id: namespace_id.map(str::to_string),
            },
        })
    }
}

impl fmt::Display for SubjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}&{}&{}",
            self.identifier,
            CX_COMPONENT_SEPARATOR,
            self.domain.namespace_id.as_deref().unwrap_or(""),
            self.domain.universal_id,
            self.domain.universal_id_type
        )
    }
}

impl FromStr for SubjectIdentifier {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_cx(s)
    }
}
