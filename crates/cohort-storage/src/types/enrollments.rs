//! Classroom roster types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ClassroomId, GroupSetDetail, StudentId};

/// A student enrolled in a classroom.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub classroom_id: ClassroomId,
    pub student_id: StudentId,
    pub email: String,
    pub name: Option<String>,
    pub enrolled_at: DateTime<Utc>,
}

/// Parameters for enrolling (or re-enrolling) a student
#[derive(Clone, Debug)]
pub struct EnrollStudentParams {
    pub classroom_id: ClassroomId,
    pub student_id: StudentId,
    pub email: String,
    pub name: Option<String>,
}

/// A committed enrollment and the roster it belongs to.
#[derive(Clone, Debug, PartialEq)]
pub struct EnrollmentUpdate {
    pub enrollment: Enrollment,
    pub roster: Vec<Enrollment>,
}

/// What a classroom removal left behind.
#[derive(Clone, Debug, PartialEq)]
pub struct EnrollmentRemoval {
    pub roster: Vec<Enrollment>,
    /// Group sets that lost a membership, populated after the removal.
    pub group_sets: Vec<GroupSetDetail>,
}
