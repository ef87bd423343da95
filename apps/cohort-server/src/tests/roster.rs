//! Classroom roster: enrollment and removal cascade.

use super::common::*;
use crate::service::{EnrollRequest, ServiceError};
use cohort_events::ClassroomEvent;
use cohort_policy::ValidationError;
use cohort_storage::{ClassroomId, StudentId};

#[tokio::test]
async fn enroll_publishes_roster_and_detects_noop() {
    let server = create_test_server().await;
    let classroom = ClassroomId::new();
    let student = StudentId::new();
    let mut events = subscribe(&server, &classroom).await;

    let req = EnrollRequest {
        email: "a@school.edu".into(),
        name: Some("Ada".into()),
    };
    let outcome = server
        .enroll_student(&classroom, &student, req.clone())
        .await
        .unwrap();
    assert!(outcome.is_changed());
    match next_event(&mut events).await {
        ClassroomEvent::ClassroomUpdate { students, .. } => {
            assert_eq!(students.len(), 1);
            assert_eq!(students[0].name.as_deref(), Some("Ada"));
        }
        other => panic!("expected classroom_update, got {other:?}"),
    }

    let outcome = server.enroll_student(&classroom, &student, req).await.unwrap();
    assert_eq!(outcome.message(), "No changes were made");
    assert_no_event(&mut events).await;
}

#[tokio::test]
async fn enroll_requires_an_email() {
    let server = create_test_server().await;
    let err = server
        .enroll_student(
            &ClassroomId::new(),
            &StudentId::new(),
            EnrollRequest {
                email: "   ".into(),
                name: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(ValidationError::EmptyEmail)));
}

#[tokio::test]
async fn changed_email_shows_up_in_group_members() {
    let server = create_test_server().await;
    let classroom = ClassroomId::new();
    let set = create_group_set(&server, &classroom, false, None, 1).await;
    let a = enroll(&server, &classroom, "old@school.edu").await;
    server
        .join_group(&classroom, &set.id, &set.groups[0].id, &a)
        .await
        .unwrap();

    server
        .enroll_student(
            &classroom,
            &a,
            EnrollRequest {
                email: "new@school.edu".into(),
                name: None,
            },
        )
        .await
        .unwrap();

    let detail = server.get_group_set(&classroom, &set.id).await.unwrap();
    let member = detail.groups[0].member(&a).unwrap();
    assert_eq!(member.email.as_deref(), Some("new@school.edu"));
}

#[tokio::test]
async fn removal_cascades_across_group_sets() {
    let server = create_test_server().await;
    let classroom = ClassroomId::new();
    let first = create_group_set(&server, &classroom, false, None, 1).await;
    let second = create_group_set(&server, &classroom, true, None, 1).await;
    let untouched = create_group_set(&server, &classroom, false, None, 1).await;
    let a = enroll(&server, &classroom, "a@school.edu").await;
    let b = enroll(&server, &classroom, "b@school.edu").await;
    server
        .join_group(&classroom, &first.id, &first.groups[0].id, &a)
        .await
        .unwrap();
    server
        .join_group(&classroom, &second.id, &second.groups[0].id, &a)
        .await
        .unwrap();
    server
        .join_group(&classroom, &untouched.id, &untouched.groups[0].id, &b)
        .await
        .unwrap();
    let mut events = subscribe(&server, &classroom).await;

    let outcome = server.remove_student(&classroom, &a).await.unwrap();
    assert_eq!(outcome.message(), "Student removed from classroom");

    assert_eq!(
        next_event(&mut events).await,
        ClassroomEvent::ClassroomRemoval {
            classroom_id: classroom,
            student_id: a
        }
    );
    match next_event(&mut events).await {
        ClassroomEvent::ClassroomUpdate { students, .. } => {
            assert_eq!(students.len(), 1);
            assert_eq!(students[0].student_id, b);
        }
        other => panic!("expected classroom_update, got {other:?}"),
    }
    let mut updated = Vec::new();
    for _ in 0..2 {
        match next_event(&mut events).await {
            ClassroomEvent::GroupsetUpdate(detail) => {
                assert!(detail.groups.iter().all(|g| g.member(&a).is_none()));
                updated.push(detail.id);
            }
            other => panic!("expected groupset_update, got {other:?}"),
        }
    }
    updated.sort();
    let mut expected = vec![first.id, second.id];
    expected.sort();
    assert_eq!(updated, expected);
    assert_no_event(&mut events).await;

    let sets = server.list_group_sets(&classroom).await.unwrap();
    for set in &sets {
        assert!(set.groups.iter().all(|g| g.member(&a).is_none()));
    }
    assert!(server.list_roster(&classroom).await.unwrap().iter().all(|e| e.student_id != a));
}

#[tokio::test]
async fn removed_student_can_no_longer_join() {
    let server = create_test_server().await;
    let classroom = ClassroomId::new();
    let set = create_group_set(&server, &classroom, false, None, 1).await;
    let a = enroll(&server, &classroom, "a@school.edu").await;

    server.remove_student(&classroom, &a).await.unwrap();

    let err = server
        .join_group(&classroom, &set.id, &set.groups[0].id, &a)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
}

#[tokio::test]
async fn removing_unknown_student_is_not_found() {
    let server = create_test_server().await;
    let err = server
        .remove_student(&ClassroomId::new(), &StudentId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound("student")));
}

#[tokio::test]
async fn removal_in_one_classroom_keeps_other_enrollments() {
    let server = create_test_server().await;
    let home = ClassroomId::new();
    let elsewhere = ClassroomId::new();
    let a = enroll(&server, &home, "a@school.edu").await;
    server
        .enroll_student(
            &elsewhere,
            &a,
            EnrollRequest {
                email: "a@school.edu".into(),
                name: None,
            },
        )
        .await
        .unwrap();

    server.remove_student(&home, &a).await.unwrap();

    assert!(server.list_roster(&home).await.unwrap().is_empty());
    assert_eq!(server.list_roster(&elsewhere).await.unwrap().len(), 1);
}
