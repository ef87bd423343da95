//! Membership policy for cohort group sets.
//!
//! Everything in this crate is a pure function over already-loaded records: the
//! caller reads the aggregate, asks for a decision here, and persists the result.
//! Nothing touches storage or the clock on its own; `now` is always passed in.

use thiserror::Error;

mod batch;
mod join;
mod naming;
mod updates;

pub use batch::*;
pub use join::*;
pub use naming::*;
pub use updates::*;

/// Input rejected before any store access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Name is required")]
    EmptyName,
    #[error("Email is required")]
    EmptyEmail,
    #[error("Group count must be a positive integer (got {0})")]
    InvalidCount(i64),
    #[error("Cannot create more than {max} groups at once (requested {requested})")]
    TooManyGroups { requested: i64, max: u32 },
    #[error("Max members cannot be negative (got {0})")]
    NegativeCapacity(i64),
    #[error("Max members is too large (got {0})")]
    CapacityTooLarge(i64),
    #[error("No members selected")]
    NoSelection,
}

/// A request that is well formed but not allowed by the current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyViolation {
    #[error("Group does not belong to this group set")]
    GroupNotInGroupSet,
    #[error("You are already a member of group {group_name} in this group set")]
    AlreadyActiveInGroupSet { group_name: String },
    #[error("You are suspended from this group")]
    SuspendedInGroup,
    #[error("Group is full (max {max} members)")]
    GroupFull { max: u32 },
    #[error("Max members cannot be lower than the current member count ({active})")]
    CapacityBelowActive { requested: u32, active: usize },
    #[error("A group named {0} already exists in this group set")]
    DuplicateGroupName(String),
}
