//! Catalog: courses, lessons and lesson materials.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::config::{LEVEL_ADVANCED, LEVEL_BEGINNER, LEVEL_INTERMEDIATE};
use crate::errors::{AppError, AppResult};

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid slug regex"));

/// Course difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl CourseLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseLevel::Beginner => LEVEL_BEGINNER,
            CourseLevel::Intermediate => LEVEL_INTERMEDIATE,
            CourseLevel::Advanced => LEVEL_ADVANCED,
        }
    }
}

impl FromStr for CourseLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            LEVEL_BEGINNER => Ok(CourseLevel::Beginner),
            LEVEL_INTERMEDIATE => Ok(CourseLevel::Intermediate),
            LEVEL_ADVANCED => Ok(CourseLevel::Advanced),
            other => Err(AppError::validation(format!("Unknown course level: {}", other))),
        }
    }
}

impl fmt::Display for CourseLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check that a slug is lower-case kebab case.
pub fn validate_slug(slug: &str) -> AppResult<()> {
    if slug.len() > 255 || !SLUG_RE.is_match(slug) {
        return Err(AppError::validation(
            "Slug must be lower-case letters, digits and single dashes",
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub level: CourseLevel,
    pub is_published: bool,
    /// Author; `None` for system-owned courses
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewCourse {
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub level: CourseLevel,
    #[serde(default)]
    pub is_published: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCourse {
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub level: Option<CourseLevel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub order_index: i32,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewLesson {
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: String,
    pub content: Option<String>,
    #[validate(range(min = 0, message = "Order index must not be negative"))]
    pub order_index: i32,
    #[serde(default)]
    pub is_published: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateLesson {
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_published: Option<bool>,
}

/// Attachment on a lesson: an uploaded file, an external link, or both
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub title: String,
    /// Cleared when the file is deleted
    pub file_id: Option<Uuid>,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewMaterial {
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: String,
    pub file_id: Option<Uuid>,
    pub url: Option<String>,
}

impl NewMaterial {
    /// Field validation plus the cross-field rules: at least one of file or
    /// link, and links must be http(s).
    pub fn check(&self) -> AppResult<()> {
        self.validate()?;
        if self.file_id.is_none() && self.url.is_none() {
            return Err(AppError::validation("Material needs a file or a URL"));
        }
        if let Some(url) = &self.url {
            if !(url.starts_with("https://") || url.starts_with("http://")) || url.contains(char::is_whitespace) {
                return Err(AppError::validation("Invalid material URL"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_round_trip() {
        for level in [CourseLevel::Beginner, CourseLevel::Intermediate, CourseLevel::Advanced] {
            assert_eq!(level.as_str().parse::<CourseLevel>().unwrap(), level);
        }
        assert!("expert".parse::<CourseLevel>().is_err());
    }

    #[test]
    fn test_slug_validation() {
        assert!(validate_slug("rust-101").is_ok());
        assert!(validate_slug("intro").is_ok());
        assert!(validate_slug("Rust-101").is_err());
        assert!(validate_slug("double--dash").is_err());
        assert!(validate_slug("-leading").is_err());
        assert!(validate_slug("").is_err());
    }

    #[test]
    fn test_new_material_requires_valid_url() {
        let material = NewMaterial {
            title: "Slides".to_string(),
            file_id: None,
            url: Some("not a url".to_string()),
        };
        assert!(material.check().is_err());
    }

    #[test]
    fn test_new_material_needs_file_or_url() {
        let material = NewMaterial {
            title: "Slides".to_string(),
            file_id: None,
            url: None,
        };
        assert!(material.check().is_err());

        let linked = NewMaterial {
            url: Some("https://example.com/slides.pdf".to_string()),
            ..material
        };
        assert!(linked.check().is_ok());
    }
}
