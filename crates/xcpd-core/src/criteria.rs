use serde::{Deserialize, Serialize};

use crate::identifier::{SubjectIdentifier, SubjectIdentifierDomain};
use crate::subject::Subject;

/// A patient search: a template subject plus query modifiers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectSearchCriteria {
    pub subject: Subject,
    /// The identifier domain that represents "this community".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community_assigning_authority: Option<SubjectIdentifierDomain>,
    /// Domains whose identifiers may be returned. Empty means unrestricted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scoping_assigning_authorities: Vec<SubjectIdentifierDomain>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_degree_match_percentage: Option<u8>,
}

impl SubjectSearchCriteria {
    pub fn new(subject: Subject) -> Self {
        Self {
            subject,
            ..Default::default()
        }
    }

    pub fn with_community_assigning_authority(mut self, domain: SubjectIdentifierDomain) -> Self {
        self.community_assigning_authority = Some(domain);
        self
    }

    pub fn with_minimum_degree_match_percentage(mut self, percentage: u8) -> Self {
        self.minimum_degree_match_percentage = Some(percentage);
        self
    }

    /// Adds a scoping authority unless an equal one is already present.
    pub fn add_scoping_assigning_authority(&mut self, domain: SubjectIdentifierDomain) {
        if !self.scoping_assigning_authorities.contains(&domain) {
            self.scoping_assigning_authorities.push(domain);
        }
    }

    pub fn has_scoping_assigning_authorities(&self) -> bool {
        !self.scoping_assigning_authorities.is_empty()
    }

    pub fn has_specified_minimum_degree_match_percentage(&self) -> bool {
        self.minimum_degree_match_percentage.is_some()
    }

    /// Fills in the minimum degree match percentage when the query left it open.
    pub fn default_minimum_degree_match_percentage(&mut self, percentage: u8) {
        self.minimum_degree_match_percentage.get_or_insert(percentage);
    }

    /// Returns the template subject's identifier issued by `domain`.
    pub fn subject_identifier(&self, domain: &SubjectIdentifierDomain) -> Option<&SubjectIdentifier> {
        self.subject.identifier_for(domain)
    }

    /// Returns the template subject's identifier under the community
    /// assigning authority, i.e. the local patient id.
    pub fn community_identifier(&self) -> Option<&SubjectIdentifier> {
        self.community_assigning_authority
            .as_ref()
            .and_then(|domain| self.subject_identifier(domain))
    }
}

/// Subjects returned by a search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectSearchResponse {
    #[serde(default)]
    pub subjects: Vec<Subject>,
}

impl SubjectSearchResponse {
    pub fn new(subjects: Vec<Subject>) -> Self {
        Self { subjects }
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }
}
