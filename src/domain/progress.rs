//! Per-lesson progress and course completion arithmetic.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::course::Course;
use super::enrollment::EnrollmentStatus;
use crate::config::{MAX_SCORE, MIN_SCORE, PROGRESS_COMPLETED, PROGRESS_IN_PROGRESS, PROGRESS_NOT_STARTED};
use crate::errors::{AppError, AppResult};

/// Ordered: a row may only move forward through these states
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::NotStarted => PROGRESS_NOT_STARTED,
            ProgressStatus::InProgress => PROGRESS_IN_PROGRESS,
            ProgressStatus::Completed => PROGRESS_COMPLETED,
        }
    }
}

impl Default for ProgressStatus {
    /// A lesson without a progress row
    fn default() -> Self {
        ProgressStatus::NotStarted
    }
}

impl FromStr for ProgressStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            PROGRESS_NOT_STARTED => Ok(ProgressStatus::NotStarted),
            PROGRESS_IN_PROGRESS => Ok(ProgressStatus::InProgress),
            PROGRESS_COMPLETED => Ok(ProgressStatus::Completed),
            other => Err(AppError::internal(format!("Unknown progress status: {}", other))),
        }
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub lesson_id: Uuid,
    pub status: ProgressStatus,
    pub score: Option<f64>,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_viewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lesson id -> existing progress row. Missing lessons are implicitly not started.
pub type LessonProgressMap = HashMap<Uuid, ProgressRecord>;

/// Completion summary for one (user, course) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseCompletion {
    pub course_id: Uuid,
    pub total_lessons: u64,
    pub completed_lessons: u64,
    pub percent: u8,
}

impl CourseCompletion {
    pub fn new(course_id: Uuid, completed_lessons: u64, total_lessons: u64) -> Self {
        Self {
            course_id,
            total_lessons,
            completed_lessons,
            percent: completion_percent(completed_lessons, total_lessons),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.percent == 100
    }
}

/// One row of a student's progress overview
#[derive(Debug, Clone, Serialize)]
pub struct CourseProgress {
    pub course: Course,
    pub enrollment_status: EnrollmentStatus,
    pub completion: CourseCompletion,
}

/// `floor(completed / total * 100)`, 0 for a course without lessons.
///
/// Integer arithmetic, so 3 of 7 gives 42 with no float rounding surprises.
/// Clamped to 100 in case stale rows outnumber the lessons.
pub fn completion_percent(completed: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = completed.min(total).saturating_mul(100) / total;
    percent as u8
}

/// Reject scores outside 0..=100 (and NaN).
pub fn validate_score(score: Option<f64>) -> AppResult<()> {
    match score {
        Some(s) if !(MIN_SCORE..=MAX_SCORE).contains(&s) => Err(AppError::validation(format!(
            "Score must be between {} and {}",
            MIN_SCORE, MAX_SCORE
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_lessons_is_zero_percent() {
        assert_eq!(completion_percent(0, 0), 0);
        assert_eq!(completion_percent(5, 0), 0);
    }

    #[test]
    fn test_floor_division() {
        assert_eq!(completion_percent(3, 7), 42);
        assert_eq!(completion_percent(1, 3), 33);
        assert_eq!(completion_percent(2, 3), 66);
        assert_eq!(completion_percent(7, 7), 100);
        assert_eq!(completion_percent(0, 7), 0);
    }

    #[test]
    fn test_percent_is_clamped() {
        assert_eq!(completion_percent(9, 7), 100);
    }

    #[test]
    fn test_status_ordering_is_forward_only() {
        assert!(ProgressStatus::NotStarted < ProgressStatus::InProgress);
        assert!(ProgressStatus::InProgress < ProgressStatus::Completed);
        assert_eq!(ProgressStatus::default(), ProgressStatus::NotStarted);
    }

    #[test]
    fn test_score_bounds() {
        assert!(validate_score(None).is_ok());
        assert!(validate_score(Some(0.0)).is_ok());
        assert!(validate_score(Some(100.0)).is_ok());
        assert!(validate_score(Some(-1.0)).is_err());
        assert!(validate_score(Some(100.5)).is_err());
        assert!(validate_score(Some(f64::NAN)).is_err());
    }

    #[test]
    fn test_course_completion_summary() {
        let summary = CourseCompletion::new(Uuid::new_v4(), 4, 4);
        assert!(summary.is_complete());
        assert_eq!(summary.percent, 100);
    }
}
