//! Teacher batch actions over a group's members.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use cohort_storage::{GroupDetail, MembershipChange, MembershipStatus, StudentId};

use crate::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchAction {
    Approve,
    Reject,
    Suspend,
}

impl BatchAction {
    /// The only status this action applies to.
    pub fn required_status(&self) -> MembershipStatus {
        match self {
            BatchAction::Approve | BatchAction::Reject => MembershipStatus::Pending,
            BatchAction::Suspend => MembershipStatus::Approved,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BatchAction::Approve => "approve",
            BatchAction::Reject => "reject",
            BatchAction::Suspend => "suspend",
        }
    }

    fn past_tense(&self) -> &'static str {
        match self {
            BatchAction::Approve => "Approved",
            BatchAction::Reject => "Rejected",
            BatchAction::Suspend => "Suspended",
        }
    }

    /// Suspension keeps the original join date; approval stamps a new one.
    fn change_for(
        &self,
        student_id: StudentId,
        join_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> MembershipChange {
        match self {
            BatchAction::Approve => MembershipChange::SetStatus {
                student_id,
                status: MembershipStatus::Approved,
                join_date: Some(now),
            },
            BatchAction::Reject => MembershipChange::Remove { student_id },
            BatchAction::Suspend => MembershipChange::SetStatus {
                student_id,
                status: MembershipStatus::Suspended,
                join_date,
            },
        }
    }
}

impl fmt::Display for BatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an id in a batch was not acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotAMember,
    IncompatibleStatus(MembershipStatus),
}

/// The changes a batch will apply, plus the ids it left alone.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchPlan {
    pub action: BatchAction,
    pub changes: Vec<MembershipChange>,
    pub skipped: Vec<(StudentId, SkipReason)>,
}

impl BatchPlan {
    pub fn affected(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Always non-empty, including for partial and fully skipped batches.
    pub fn message(&self) -> String {
        let n = self.affected();
        let noun = if n == 1 { "member" } else { "members" };
        match (n, self.skipped.len()) {
            (0, skipped) => format!(
                "No members were {} ({} skipped)",
                self.action.past_tense().to_lowercase(),
                skipped
            ),
            (_, 0) => format!("{} {} {}", self.action.past_tense(), n, noun),
            (_, skipped) => format!(
                "{} {} {}, skipped {}",
                self.action.past_tense(),
                n,
                noun,
                skipped
            ),
        }
    }
}

/// Plan an approve/reject/suspend batch against one group.
///
/// Duplicate ids are collapsed. Ids whose membership is missing or in the wrong
/// status are skipped, never failing the batch. An empty selection is rejected.
pub fn plan_batch(
    action: BatchAction,
    group: &GroupDetail,
    student_ids: &[StudentId],
    now: DateTime<Utc>,
) -> Result<BatchPlan, ValidationError> {
    if student_ids.is_empty() {
        return Err(ValidationError::NoSelection);
    }

    let mut seen = HashSet::new();
    let mut changes = Vec::new();
    let mut skipped = Vec::new();

    for id in student_ids.iter().filter(|id| seen.insert(**id)) {
        match group.member(id) {
            None => skipped.push((*id, SkipReason::NotAMember)),
            Some(m) if m.status != action.required_status() => {
                skipped.push((*id, SkipReason::IncompatibleStatus(m.status)))
            }
            Some(m) => changes.push(action.change_for(*id, m.join_date, now)),
        }
    }

    Ok(BatchPlan {
        action,
        changes,
        skipped,
    })
}
