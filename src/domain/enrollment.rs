//! Enrollment lifecycle: (none) -> active -> {completed, dropped}.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::course::Course;
use super::user::User;
use crate::config::{ENROLLMENT_ACTIVE, ENROLLMENT_COMPLETED, ENROLLMENT_DROPPED};
use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Active,
    Completed,
    Dropped,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Active => ENROLLMENT_ACTIVE,
            EnrollmentStatus::Completed => ENROLLMENT_COMPLETED,
            EnrollmentStatus::Dropped => ENROLLMENT_DROPPED,
        }
    }

    /// Dropped enrollments keep their history but no longer open the content.
    pub fn grants_content_access(&self) -> bool {
        !matches!(self, EnrollmentStatus::Dropped)
    }

    /// Validate a transition. Only an explicit re-enrollment moves a dropped
    /// row back to active; completed is terminal.
    pub fn transition(self, to: EnrollmentStatus) -> AppResult<EnrollmentStatus> {
        use EnrollmentStatus::*;

        match (self, to) {
            (Active, Completed) | (Active, Dropped) | (Dropped, Active) => Ok(to),
            (from, to) => Err(AppError::invalid_state(format!(
                "Cannot move enrollment from {} to {}",
                from, to
            ))),
        }
    }
}

impl FromStr for EnrollmentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ENROLLMENT_ACTIVE => Ok(EnrollmentStatus::Active),
            ENROLLMENT_COMPLETED => Ok(EnrollmentStatus::Completed),
            ENROLLMENT_DROPPED => Ok(EnrollmentStatus::Dropped),
            other => Err(AppError::internal(format!("Unknown enrollment status: {}", other))),
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub status: EnrollmentStatus,
    pub enrolled_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Enrollment together with its course, for a student's dashboard
#[derive(Debug, Clone, Serialize)]
pub struct CourseEnrollment {
    pub course: Course,
    pub enrollment: Enrollment,
}

/// Row of a course's student list
#[derive(Debug, Clone, Serialize)]
pub struct EnrolledStudent {
    pub user: User,
    pub enrollment: Enrollment,
}

#[cfg(test)]
mod tests {
    use super::EnrollmentStatus::*;

    #[test]
    fn test_forward_transitions() {
        assert_eq!(Active.transition(Completed).unwrap(), Completed);
        assert_eq!(Active.transition(Dropped).unwrap(), Dropped);
        assert_eq!(Dropped.transition(Active).unwrap(), Active);
    }

    #[test]
    fn test_status_never_moves_backward() {
        assert!(Completed.transition(Active).is_err());
        assert!(Completed.transition(Dropped).is_err());
        assert!(Dropped.transition(Completed).is_err());
        assert!(Active.transition(Active).is_err());
    }

    #[test]
    fn test_content_access() {
        assert!(Active.grants_content_access());
        assert!(Completed.grants_content_access());
        assert!(!Dropped.grants_content_access());
    }
}
