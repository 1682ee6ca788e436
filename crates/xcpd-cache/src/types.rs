//! Correlation cache rows.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Outcome recorded for a (patient, remote community) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CorrelationStatus {
    /// The remote community holds a confirmed match.
    Active,
    /// The remote community was queried and nothing was confirmed.
    NotFound,
}

impl CorrelationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::NotFound => "NOTFOUND",
        }
    }
}

/// One correlation cache row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationCacheEntry {
    /// Local patient id in CX form.
    pub local_patient_id: String,
    pub local_home_community_id: String,
    pub remote_home_community_id: String,
    /// Remote patient id in CX form, present on `Active` rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_patient_id: Option<String>,
    pub status: CorrelationStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl CorrelationCacheEntry {
    /// Creates an `Active` row for a confirmed remote identifier.
    pub fn active(
        local_patient_id: impl Into<String>,
        local_home_community_id: impl Into<String>,
        remote_home_community_id: impl Into<String>,
        remote_patient_id: impl Into<String>,
    ) -> Self {
        Self {
            local_patient_id: local_patient_id.into(),
            local_home_community_id: local_home_community_id.into(),
            remote_home_community_id: remote_home_community_id.into(),
            remote_patient_id: Some(remote_patient_id.into()),
            status: CorrelationStatus::Active,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// Creates a `NotFound` row recording an unsuccessful query.
    pub fn not_found(
        local_patient_id: impl Into<String>,
        local_home_community_id: impl Into<String>,
        remote_home_community_id: impl Into<String>,
    ) -> Self {
        Self {
            local_patient_id: local_patient_id.into(),
            local_home_community_id: local_home_community_id.into(),
            remote_home_community_id: remote_home_community_id.into(),
            remote_patient_id: None,
            status: CorrelationStatus::NotFound,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == CorrelationStatus::Active
    }

    /// Returns `true` if this row concerns `remote_home_community_id`.
    pub fn is_for_remote_community(&self, remote_home_community_id: &str) -> bool {
        self.remote_home_community_id
            .eq_ignore_ascii_case(remote_home_community_id)
    }
}
