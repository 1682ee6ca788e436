use serde::{Deserialize, Serialize};

use crate::identifier::{SubjectIdentifier, SubjectIdentifierDomain};

/// A person name as carried on identity queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectName {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
}

impl SubjectName {
    pub fn new(given: impl Into<String>, family: impl Into<String>) -> Self {
        Self {
            given: vec![given.into()],
            family: Some(family.into()),
            prefix: None,
            suffix: None,
        }
    }
}

/// A postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectAddress {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub street_lines: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// A patient as known to one community: demographics plus identifiers.
///
/// The same type is used for the local search seed, for untrusted remote
/// candidates and for confirmed matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    #[serde(default)]
    pub names: Vec<SubjectName>,
    /// Administrative gender code (e.g. `M`, `F`, `UN`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    /// Birth time in HL7 TS form (`YYYYMMDD[HHMM...]`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_time: Option<String>,
    #[serde(default)]
    pub addresses: Vec<SubjectAddress>,
    #[serde(default)]
    pub identifiers: Vec<SubjectIdentifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_confidence_percentage: Option<u8>,
}

impl Subject {
    pub fn has_identifiers(&self) -> bool {
        !self.identifiers.is_empty()
    }

    pub fn has_identifier(&self, identifier: &SubjectIdentifier) -> bool {
        self.identifiers.iter().any(|id| id == identifier)
    }

    /// Returns the first identifier issued by `domain`.
    pub fn identifier_for(&self, domain: &SubjectIdentifierDomain) -> Option<&SubjectIdentifier> {
        self.identifiers.iter().find(|id| id.is_in_domain(domain))
    }

    /// Returns the identifiers issued by any of `domains`.
    pub fn identifiers_within<'a>(
        &'a self,
        domains: &'a [SubjectIdentifierDomain],
    ) -> impl Iterator<Item = &'a SubjectIdentifier> + 'a {
        self.identifiers
            .iter()
            .filter(move |id| domains.iter().any(|d| id.is_in_domain(d)))
    }

    /// Returns a copy of this subject carrying demographics only.
    pub fn without_identifiers(&self) -> Subject {
        Subject {
            identifiers: Vec::new(),
            match_confidence_percentage: None,
            ..self.clone()
        }
    }

    pub fn has_names(&self) -> bool {
        !self.names.is_empty()
    }
}
