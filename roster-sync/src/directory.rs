//! Remote account directory capability.
//!
//! The pipeline never probes for individual operations; whatever implements
//! [`AccountDirectory`] is wired in once, up front.

use roster_core::{StudentRecord, Username};

use crate::error::DirectoryError;

/// The remote source of truth for student identities and account state.
pub trait AccountDirectory {
    /// Current roster for `org_id`.
    fn fetch_roster(&self, org_id: &str) -> Result<Vec<StudentRecord>, DirectoryError>;

    fn set_password(&self, username: &Username, secret: &str) -> Result<(), DirectoryError>;

    fn enable_service(&self, username: &Username, service: &str) -> Result<(), DirectoryError>;
}

impl<D: AccountDirectory + ?Sized> AccountDirectory for &D {
    fn fetch_roster(&self, org_id: &str) -> Result<Vec<StudentRecord>, DirectoryError> {
        (**self).fetch_roster(org_id)
    }

    fn set_password(&self, username: &Username, secret: &str) -> Result<(), DirectoryError> {
        (**self).set_password(username, secret)
    }

    fn enable_service(&self, username: &Username, service: &str) -> Result<(), DirectoryError> {
        (**self).enable_service(username, service)
    }
}
