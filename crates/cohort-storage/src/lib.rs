//! Storage abstraction for cohort.
//!
//! Backend crates (e.g., cohort-store-sqlite) implement [`Store`] so the membership
//! service doesn't depend on any specific database engine or schema details.
//!
//! Write-side entities (`GroupSet`, `Group`, `Membership`, `Enrollment`) are kept
//! normalized. The populated shapes served to clients (`GroupSetDetail`, `GroupDetail`)
//! are assembled at read time by [`types::assemble_group_set`].

use thiserror::Error;

mod store;
pub mod types;

pub use store::*;
pub use types::*;

/// Uniform error type for all storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error("conflict")]
    Conflict,
    #[error("backend error: {0}")]
    Backend(String),
}
