//! Server unit and integration tests.
//!
//! Tests are organized into modules by feature area:
//! - `common` - Shared test helpers
//! - `group_sets` - Group set and group management
//! - `memberships` - Join, leave and teacher batch actions
//! - `roster` - Enrollment and classroom removal cascade
//! - `concurrency` - Capacity and single-membership rules under parallel joins
//! - `store_failures` - Failed writes publish nothing
//! - `http` - Routing, identity headers and response bodies

pub mod common;

mod http;
mod roster;
