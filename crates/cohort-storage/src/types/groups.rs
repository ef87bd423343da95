//! Group types for group-set-level student grouping.

use chrono::{DateTime, Utc};

use super::{GroupId, GroupSetId};

/// Group record
#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    pub id: GroupId,
    pub group_set_id: GroupSetId,
    pub name: String,
    pub max_members: Option<u32>,
    pub image: Option<String>,
    /// Creation order within the group set.
    pub position: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters for creating several groups in one group set
#[derive(Clone, Debug)]
pub struct CreateGroupsParams {
    pub group_set_id: GroupSetId,
    /// One group is created per name, in order.
    pub names: Vec<String>,
    pub max_members: Option<u32>,
}

/// Fields to overwrite on a group. `None` leaves the field untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GroupChanges {
    pub name: Option<String>,
    pub max_members: Option<Option<u32>>,
    pub image: Option<Option<String>>,
}

impl GroupChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
