//! Inbound query validation.

use xcpd_core::{SubjectIdentifierDomain, SubjectSearchCriteria};

use crate::error::{GatewayError, GatewayResult};

fn community_authority(criteria: &SubjectSearchCriteria) -> GatewayResult<&SubjectIdentifierDomain> {
    criteria
        .community_assigning_authority
        .as_ref()
        .ok_or_else(|| GatewayError::validation("community assigning authority is not set"))
}

/// Checks a discovery query (patient discovery or new record feed): an
/// identifier under the community assigning authority, a name and a birth
/// time are required.
pub fn validate_discovery_query(criteria: &SubjectSearchCriteria) -> GatewayResult<()> {
    let authority = community_authority(criteria)?;
    let subject = &criteria.subject;

    if subject.identifier_for(authority).is_none() {
        return Err(GatewayError::validation(format!(
            "at least one subject identifier for the {} assigning authority is required",
            authority.universal_id
        )));
    }
    if !subject.has_names() {
        return Err(GatewayError::validation("subject name is required"));
    }
    if subject.birth_time.as_deref().is_none_or(|t| t.trim().is_empty()) {
        return Err(GatewayError::validation("subject birth time is required"));
    }
    Ok(())
}

/// Checks a known-identifier lookup: exactly one identifier, issued by the
/// community assigning authority.
pub fn validate_identifier_query(criteria: &SubjectSearchCriteria) -> GatewayResult<()> {
    let authority = community_authority(criteria)?;
    let identifiers = &criteria.subject.identifiers;

    match identifiers.as_slice() {
        [] => Err(GatewayError::validation(format!(
            "one subject identifier for the {} assigning authority is required",
            authority.universal_id
        ))),
        [only] if only.is_in_domain(authority) => Ok(()),
        [_] => Err(GatewayError::validation(format!(
            "the subject identifier must be issued by the {} assigning authority",
            authority.universal_id
        ))),
        _ => Err(GatewayError::validation(format!(
            "only one subject identifier for the {} assigning authority may be given",
            authority.universal_id
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xcpd_core::{Subject, SubjectIdentifier, SubjectName};

    fn local() -> SubjectIdentifierDomain {
        SubjectIdentifierDomain::new("1.1")
    }

    fn discovery_query() -> SubjectSearchCriteria {
        SubjectSearchCriteria::new(Subject {
            names: vec![SubjectName::new("Jane", "Doe")],
            birth_time: Some("19700101".into()),
            identifiers: vec![SubjectIdentifier::new("L1", local())],
            ..Default::default()
        })
        .with_community_assigning_authority(local())
    }

    #[test]
    fn test_valid_discovery_query() {
        validate_discovery_query(&discovery_query()).unwrap();
    }

    #[test]
    fn test_discovery_query_requirements() {
        let mut no_local_id = discovery_query();
        no_local_id.subject.identifiers =
            vec![SubjectIdentifier::new("X", SubjectIdentifierDomain::new("9.9"))];
        let err = validate_discovery_query(&no_local_id).unwrap_err();
        assert!(err.to_string().contains("1.1 assigning authority"));

        let mut no_name = discovery_query();
        no_name.subject.names.clear();
        assert!(validate_discovery_query(&no_name).unwrap_err().to_string().contains("name"));

        let mut no_birth = discovery_query();
        no_birth.subject.birth_time = None;
        assert!(
            validate_discovery_query(&no_birth)
                .unwrap_err()
                .to_string()
                .contains("birth time")
        );

        let mut no_authority = discovery_query();
        no_authority.community_assigning_authority = None;
        assert!(validate_discovery_query(&no_authority).is_err());
    }

    #[test]
    fn test_identifier_query_requirements() {
        let mut query = discovery_query();
        validate_identifier_query(&query).unwrap();

        query.subject.identifiers.push(SubjectIdentifier::new("L2", local()));
        assert!(
            validate_identifier_query(&query)
                .unwrap_err()
                .to_string()
                .contains("only one")
        );

        query.subject.identifiers =
            vec![SubjectIdentifier::new("X", SubjectIdentifierDomain::new("9.9"))];
        assert!(validate_identifier_query(&query).is_err());

        query.subject.identifiers.clear();
        assert!(validate_identifier_query(&query).is_err());
    }
}
