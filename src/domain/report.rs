//! Generated-artifact records and the row shapes handed to the exporter.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enrollment::EnrollmentStatus;
use crate::config::{
    REPORT_CERTIFICATE, REPORT_PROGRESS_EXPORT, REPORT_STATS_EXPORT, REPORT_STATUS_FAILED,
    REPORT_STATUS_READY,
};
use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Certificate,
    ProgressExport,
    StatsExport,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Certificate => REPORT_CERTIFICATE,
            ReportKind::ProgressExport => REPORT_PROGRESS_EXPORT,
            ReportKind::StatsExport => REPORT_STATS_EXPORT,
        }
    }
}

impl FromStr for ReportKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            REPORT_CERTIFICATE => Ok(ReportKind::Certificate),
            REPORT_PROGRESS_EXPORT => Ok(ReportKind::ProgressExport),
            REPORT_STATS_EXPORT => Ok(ReportKind::StatsExport),
            other => Err(AppError::internal(format!("Unknown report kind: {}", other))),
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Ready,
    Failed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Ready => REPORT_STATUS_READY,
            ReportStatus::Failed => REPORT_STATUS_FAILED,
        }
    }
}

impl FromStr for ReportStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            REPORT_STATUS_READY => Ok(ReportStatus::Ready),
            REPORT_STATUS_FAILED => Ok(ReportStatus::Failed),
            other => Err(AppError::internal(format!("Unknown report status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Option<Uuid>,
    pub kind: ReportKind,
    pub status: ReportStatus,
    /// Cleared when the file is deleted
    pub file_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Data printed on a certificate
#[derive(Debug, Clone, PartialEq)]
pub struct CertificateData {
    pub username: String,
    pub email: String,
    pub course_title: String,
    pub course_slug: String,
    pub issuer: String,
    pub issued_at: DateTime<Utc>,
}

/// One student line of a course progress export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressReportRow {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub enrollment_status: EnrollmentStatus,
    pub enrolled_at: DateTime<Utc>,
    pub completed_lessons: u64,
    pub total_lessons: u64,
    pub percent: u8,
}

/// One course line of the platform statistics export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReportRow {
    pub course_id: Uuid,
    pub title: String,
    pub is_published: bool,
    pub lessons: u64,
    pub active_enrollments: u64,
    pub completed_enrollments: u64,
    pub dropped_enrollments: u64,
}

/// Outcome of issuing an artifact: the report row and the file it points at
#[derive(Debug, Clone, Serialize)]
pub struct IssuedArtifact {
    pub report: Report,
    pub file: super::file::FileRecord,
}
