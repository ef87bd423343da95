use cohort_events::ClassroomEvent;
use cohort_policy::{ValidationError, NO_CHANGES_MESSAGE};
use cohort_storage::{ClassroomId, EnrollStudentParams, Enrollment, StudentId};
use serde::Deserialize;

use super::{Outcome, ServiceError, StoreResultExt};
use crate::server::CohortServer;

#[derive(Debug, Clone, Deserialize)]
pub struct EnrollRequest {
    pub email: String,
    pub name: Option<String>,
}

impl CohortServer {
    pub async fn list_roster(&self, classroom_id: &ClassroomId) -> Result<Vec<Enrollment>, ServiceError> {
        Ok(self.store.list_enrollments(classroom_id).await?)
    }

    /// Add a student to the classroom roster, or refresh their email and name.
    pub async fn enroll_student(
        &self,
        classroom_id: &ClassroomId,
        student_id: &StudentId,
        req: EnrollRequest,
    ) -> Result<Outcome<Enrollment>, ServiceError> {
        let email = req.email.trim().to_string();
        if email.is_empty() {
            return Err(ValidationError::EmptyEmail.into());
        }
        let name = req.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());

        match self.store.get_enrollment(classroom_id, student_id).await {
            Ok(existing) if existing.email == email && existing.name == name => {
                return Ok(Outcome::unchanged(NO_CHANGES_MESSAGE));
            }
            Ok(_) | Err(cohort_storage::StoreError::NotFound) => {}
            Err(e) => return Err(ServiceError::Store(e)),
        }

        let update = self
            .store
            .upsert_enrollment(&EnrollStudentParams {
                classroom_id: *classroom_id,
                student_id: *student_id,
                email,
                name,
            })
            .await?;

        tracing::info!(classroom_id = %classroom_id, student_id = %student_id, "student enrolled");
        self.publish_roster(classroom_id, update.roster).await;

        Ok(Outcome::changed("Student enrolled", update.enrollment))
    }

    /// Remove a student from the classroom along with every membership they hold
    /// in its group sets.
    pub async fn remove_student(
        &self,
        classroom_id: &ClassroomId,
        student_id: &StudentId,
    ) -> Result<Outcome<StudentId>, ServiceError> {
        let sets = self.store.list_group_sets(classroom_id).await?;
        let _guards = self
            .lock_group_sets(sets.iter().map(|s| s.id).collect())
            .await;

        let removal = self
            .store
            .remove_enrollment(classroom_id, student_id)
            .await
            .or_not_found("student")?;

        tracing::info!(
            classroom_id = %classroom_id,
            student_id = %student_id,
            group_sets = removal.group_sets.len(),
            "student removed from classroom"
        );

        self.publish(
            classroom_id,
            ClassroomEvent::ClassroomRemoval {
                classroom_id: *classroom_id,
                student_id: *student_id,
            },
        )
        .await;
        self.publish_roster(classroom_id, removal.roster).await;
        for detail in removal.group_sets {
            self.publish(classroom_id, ClassroomEvent::GroupsetUpdate(detail))
                .await;
        }

        Ok(Outcome::changed("Student removed from classroom", *student_id))
    }

    async fn publish_roster(&self, classroom_id: &ClassroomId, students: Vec<Enrollment>) {
        self.publish(
            classroom_id,
            ClassroomEvent::ClassroomUpdate {
                classroom_id: *classroom_id,
                students,
            },
        )
        .await;
    }
}
