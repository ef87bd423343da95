//! Membership service: policy decisions applied to the store under a per-group-set
//! lock, with events published only after the write commits.
//!
//! Every mutating operation follows the same sequence:
//! lock → read aggregate → decide → write → publish → unlock.
//! A rejected decision or failed write returns before publishing anything.

mod group_sets;
mod groups;
mod memberships;
mod roster;

pub use groups::CreateGroupsRequest;
pub use group_sets::CreateGroupSetRequest;
pub use roster::EnrollRequest;

use cohort_policy::{PolicyViolation, ValidationError};
use cohort_storage::{ClassroomId, GroupSetDetail, GroupSetId, StoreError};
use thiserror::Error;

use crate::server::CohortServer;

/// Result of a mutating operation that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Changed { message: String, value: T },
    /// Nothing was written and nothing was published.
    Unchanged { message: String },
}

impl<T> Outcome<T> {
    pub fn changed(message: impl Into<String>, value: T) -> Self {
        Outcome::Changed {
            message: message.into(),
            value,
        }
    }

    pub fn unchanged(message: impl Into<String>) -> Self {
        Outcome::Unchanged {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Outcome::Changed { message, .. } | Outcome::Unchanged { message } => message,
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Changed { value, .. } => Some(value),
            Outcome::Unchanged { .. } => None,
        }
    }

    pub fn is_changed(&self) -> bool {
        matches!(self, Outcome::Changed { .. })
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Policy(#[from] PolicyViolation),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Forbidden(String),
    #[error("storage error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ServiceError::NotFound("record"),
            e => ServiceError::Store(e),
        }
    }
}

pub(crate) trait StoreResultExt<T> {
    /// Name the missing entity instead of the generic "record".
    fn or_not_found(self, what: &'static str) -> Result<T, ServiceError>;
}

impl<T> StoreResultExt<T> for Result<T, StoreError> {
    fn or_not_found(self, what: &'static str) -> Result<T, ServiceError> {
        self.map_err(|e| match e {
            StoreError::NotFound => ServiceError::NotFound(what),
            e => ServiceError::Store(e),
        })
    }
}

impl CohortServer {
    /// Populated group set, provided it belongs to `classroom_id`.
    ///
    /// A group set owned by another classroom is reported as not found.
    pub(crate) async fn load_group_set(
        &self,
        classroom_id: &ClassroomId,
        group_set_id: &GroupSetId,
    ) -> Result<GroupSetDetail, ServiceError> {
        let detail = self
            .store
            .get_group_set_detail(group_set_id)
            .await
            .or_not_found("group set")?;
        if detail.classroom_id != *classroom_id {
            return Err(ServiceError::NotFound("group set"));
        }
        Ok(detail)
    }
}
