//! Type definitions for cohort storage.

mod details;
mod enrollments;
mod group_sets;
mod groups;
mod ids;
mod memberships;

// Re-export all types from submodules
pub use details::*;
pub use enrollments::*;
pub use group_sets::*;
pub use groups::*;
pub use ids::*;
pub use memberships::*;
