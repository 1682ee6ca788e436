//! # xcpd-core
//!
//! Patient identity model shared by the XCPD gateway crates: subjects with
//! their demographics, identifiers and assigning authorities in CX form,
//! and the search criteria and responses exchanged with local and remote
//! communities.

pub mod criteria;
pub mod error;
pub mod identifier;
pub mod subject;

pub use criteria::{SubjectSearchCriteria, SubjectSearchResponse};
pub use error::{CoreError, Result};
pub use identifier::{SubjectIdentifier, SubjectIdentifierDomain};
pub use subject::{Subject, SubjectAddress, SubjectName};
