//! Group set types: a classroom-owned policy container for groups.

use chrono::{DateTime, Utc};

use super::{ClassroomId, GroupSetId};

/// Group set record
#[derive(Clone, Debug, PartialEq)]
pub struct GroupSet {
    pub id: GroupSetId,
    pub classroom_id: ClassroomId,
    pub name: String,
    pub self_signup: bool,
    pub join_approval: bool,
    /// Default capacity copied onto each group at creation time. `None` is unlimited.
    pub max_members: Option<u32>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters for creating a group set
#[derive(Clone, Debug)]
pub struct CreateGroupSetParams {
    pub classroom_id: ClassroomId,
    pub name: String,
    pub self_signup: bool,
    pub join_approval: bool,
    pub max_members: Option<u32>,
    pub image: Option<String>,
}

/// Fields to overwrite on a group set. `None` leaves the field untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GroupSetChanges {
    pub name: Option<String>,
    pub self_signup: Option<bool>,
    pub join_approval: Option<bool>,
    pub max_members: Option<Option<u32>>,
    pub image: Option<Option<String>>,
}

impl GroupSetChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
