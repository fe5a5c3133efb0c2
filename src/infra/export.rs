//! Document rendering for certificates and CSV exports.

use crate::config::{CONTENT_TYPE_CSV, CONTENT_TYPE_TEXT};
use crate::domain::{CertificateData, ProgressReportRow, StatsReportRow};
use crate::errors::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Rendered bytes plus the metadata needed to store them as a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub file_name: String,
}

/// Turns report data into downloadable documents
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait DocumentExporter: Send + Sync {
    fn render_certificate(&self, data: &CertificateData) -> AppResult<RenderedDocument>;

    fn render_progress_report(
        &self,
        course_slug: &str,
        rows: &[ProgressReportRow],
    ) -> AppResult<RenderedDocument>;

    fn render_stats_report(&self, rows: &[StatsReportRow]) -> AppResult<RenderedDocument>;
}

/// Plain-text certificates and RFC 4180 CSV exports
#[derive(Debug, Clone, Default)]
pub struct PlainTextExporter;

impl DocumentExporter for PlainTextExporter {
    fn render_certificate(&self, data: &CertificateData) -> AppResult<RenderedDocument> {
        let body = format!(
            "CERTIFICATE OF COMPLETION\n\
             \n\
             This certifies that {username} <{email}>\n\
             has completed the course \"{course}\".\n\
             \n\
             Issued by {issuer} on {date}\n",
            username = data.username,
            email = data.email,
            course = data.course_title,
            issuer = data.issuer,
            date = data.issued_at.format("%Y-%m-%d"),
        );

        Ok(RenderedDocument {
            bytes: body.into_bytes(),
            content_type: CONTENT_TYPE_TEXT.to_string(),
            file_name: format!("certificate-{}-{}.txt", data.course_slug, data.username),
        })
    }

    fn render_progress_report(
        &self,
        course_slug: &str,
        rows: &[ProgressReportRow],
    ) -> AppResult<RenderedDocument> {
        let mut csv = String::from(
            "user_id,username,email,enrollment_status,enrolled_at,completed_lessons,total_lessons,percent\n",
        );
        for row in rows {
            push_record(
                &mut csv,
                &[
                    row.user_id.to_string(),
                    row.username.clone(),
                    row.email.clone(),
                    row.enrollment_status.to_string(),
                    row.enrolled_at.to_rfc3339(),
                    row.completed_lessons.to_string(),
                    row.total_lessons.to_string(),
                    row.percent.to_string(),
                ],
            );
        }

        Ok(RenderedDocument {
            bytes: csv.into_bytes(),
            content_type: CONTENT_TYPE_CSV.to_string(),
            file_name: format!("progress-{}.csv", course_slug),
        })
    }

    fn render_stats_report(&self, rows: &[StatsReportRow]) -> AppResult<RenderedDocument> {
        let mut csv = String::from(
            "course_id,title,is_published,lessons,active_enrollments,completed_enrollments,dropped_enrollments\n",
        );
        for row in rows {
            push_record(
                &mut csv,
                &[
                    row.course_id.to_string(),
                    row.title.clone(),
                    row.is_published.to_string(),
                    row.lessons.to_string(),
                    row.active_enrollments.to_string(),
                    row.completed_enrollments.to_string(),
                    row.dropped_enrollments.to_string(),
                ],
            );
        }

        Ok(RenderedDocument {
            bytes: csv.into_bytes(),
            content_type: CONTENT_TYPE_CSV.to_string(),
            file_name: "platform-stats.csv".to_string(),
        })
    }
}

fn push_record(out: &mut String, fields: &[String]) {
    let line = fields
        .iter()
        .map(|f| escape_field(f))
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(&line);
    out.push('\n');
}

fn escape_field(field: &str) -> String {
    if field.contains(|c: char| matches!(c, ',' | '"' | '\n' | '\r')) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::domain::EnrollmentStatus;

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_certificate_mentions_user_and_course() {
        let data = CertificateData {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            course_title: "Rust Basics".to_string(),
            course_slug: "rust-basics".to_string(),
            issuer: "Course Hub".to_string(),
            issued_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        };

        let doc = PlainTextExporter.render_certificate(&data).unwrap();
        let text = String::from_utf8(doc.bytes).unwrap();

        assert!(text.contains("alice <alice@example.com>"));
        assert!(text.contains("\"Rust Basics\""));
        assert!(text.contains("2024-05-01"));
        assert_eq!(doc.file_name, "certificate-rust-basics-alice.txt");
    }

    #[test]
    fn test_progress_csv_has_header_and_rows() {
        let rows = vec![ProgressReportRow {
            user_id: Uuid::nil(),
            username: "bob, jr".to_string(),
            email: "bob@example.com".to_string(),
            enrollment_status: EnrollmentStatus::Active,
            enrolled_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            completed_lessons: 3,
            total_lessons: 7,
            percent: 42,
        }];

        let doc = PlainTextExporter.render_progress_report("rust", &rows).unwrap();
        let csv = String::from_utf8(doc.bytes).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("user_id,username"));
        assert!(lines[1].contains("\"bob, jr\""));
        assert!(lines[1].ends_with(",3,7,42"));
        assert_eq!(doc.content_type, CONTENT_TYPE_CSV);
    }
}
