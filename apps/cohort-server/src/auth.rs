//! Request actor, resolved from headers set by the upstream session layer.
//!
//! Authentication happens before requests reach this service. The gateway
//! forwards the authenticated user as `x-cohort-user` (a UUID) and their role as
//! `x-cohort-role` (`student`, `teacher` or `admin`).

use std::fmt;
use std::str::FromStr;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use cohort_storage::StudentId;
use uuid::Uuid;

use crate::error::ApiError;
use crate::service::ServiceError;

pub const USER_HEADER: &str = "x-cohort-user";
pub const ROLE_HEADER: &str = "x-cohort-role";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError(pub String);

impl fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid role: {}", self.0)
    }
}

impl std::error::Error for ParseRoleError {}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            "admin" => Ok(Role::Admin),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

/// The authenticated caller of a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn is_staff(&self) -> bool {
        matches!(self.role, Role::Teacher | Role::Admin)
    }

    /// The caller acting as a student on their own behalf.
    pub fn student_id(&self) -> StudentId {
        StudentId(self.user_id)
    }

    pub fn require_staff(&self) -> Result<(), ServiceError> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(
                "Only teachers can perform this action".to_string(),
            ))
        }
    }

    pub fn require_student(&self) -> Result<(), ServiceError> {
        if self.role == Role::Student {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(
                "Only students can perform this action".to_string(),
            ))
        }
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header(parts, USER_HEADER)
            .and_then(|v| Uuid::try_parse(v).ok())
            .ok_or(ApiError::Unauthenticated)?;
        let role = header(parts, ROLE_HEADER)
            .and_then(|v| v.parse::<Role>().ok())
            .ok_or(ApiError::Unauthenticated)?;

        Ok(Actor { user_id, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("Teacher".parse::<Role>().unwrap(), Role::Teacher);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("janitor".parse::<Role>().is_err());
    }

    #[test]
    fn staff_checks() {
        let student = Actor {
            user_id: Uuid::now_v7(),
            role: Role::Student,
        };
        let admin = Actor {
            user_id: Uuid::now_v7(),
            role: Role::Admin,
        };
        assert!(student.require_staff().is_err());
        assert!(admin.require_staff().is_ok());
        assert!(admin.require_student().is_err());
        assert_eq!(student.student_id().0, student.user_id);
    }
}
