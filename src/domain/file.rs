//! Metadata for uploaded and generated binary artifacts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{VISIBILITY_PRIVATE, VISIBILITY_PUBLIC};

/// File visibility. Stored as free text: only `private` restricts access,
/// any other stored value reads as public.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    Public,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Private => VISIBILITY_PRIVATE,
            Visibility::Public => VISIBILITY_PUBLIC,
        }
    }

    pub fn from_stored(value: &str) -> Self {
        if value == VISIBILITY_PRIVATE {
            Visibility::Private
        } else {
            Visibility::Public
        }
    }

    pub fn is_private(&self) -> bool {
        matches!(self, Visibility::Private)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: Uuid,
    /// `None` for system/admin-issued artifacts
    pub owner_user_id: Option<Uuid>,
    pub original_name: String,
    /// Opaque storage handle; never exposed to end users
    #[serde(skip_serializing)]
    pub path: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub visibility: Visibility,
    pub created_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_user_id == Some(user_id)
    }
}

/// Metadata row to insert after the bytes have been stored
#[derive(Debug, Clone)]
pub struct NewFile {
    pub owner_user_id: Option<Uuid>,
    pub original_name: String,
    pub path: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub visibility: Visibility,
}

/// Extension of a user-supplied file name, lower-cased.
pub fn file_extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_non_private_value_is_public() {
        assert_eq!(Visibility::from_stored("private"), Visibility::Private);
        assert_eq!(Visibility::from_stored("public"), Visibility::Public);
        assert_eq!(Visibility::from_stored("course"), Visibility::Public);
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("report.PDF").as_deref(), Some("pdf"));
        assert_eq!(file_extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(file_extension("README"), None);
        assert_eq!(file_extension(".bashrc"), None);
        assert_eq!(file_extension("trailing."), None);
    }
}
