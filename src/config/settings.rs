//! Application settings loaded from environment variables.

use std::env;
use std::path::PathBuf;

use super::constants::{
    DEFAULT_ALLOWED_UPLOAD_EXTENSIONS, DEFAULT_CERTIFICATE_ISSUER, DEFAULT_DATABASE_URL,
    DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_UPLOAD_DIR,
};

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: u64,
    pub allowed_upload_extensions: Vec<String>,
    pub certificate_issuer: String,
    /// Refuse certificates until the course is 100% complete
    pub require_completion_for_certificate: bool,
    /// Move an active enrollment to completed when the last lesson is completed
    pub auto_complete_enrollment: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("upload_dir", &self.upload_dir)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("allowed_upload_extensions", &self.allowed_upload_extensions)
            .field("certificate_issuer", &self.certificate_issuer)
            .field(
                "require_completion_for_certificate",
                &self.require_completion_for_certificate,
            )
            .field("auto_complete_enrollment", &self.auto_complete_enrollment)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_upload_extensions: DEFAULT_ALLOWED_UPLOAD_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            certificate_issuer: DEFAULT_CERTIFICATE_ISSUER.to_string(),
            require_completion_for_certificate: false,
            auto_complete_enrollment: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_upload_bytes),
            allowed_upload_extensions: env::var("ALLOWED_UPLOAD_EXTENSIONS")
                .map(|v| parse_extensions(&v))
                .unwrap_or(defaults.allowed_upload_extensions),
            certificate_issuer: env::var("CERTIFICATE_ISSUER")
                .unwrap_or(defaults.certificate_issuer),
            require_completion_for_certificate: env::var("REQUIRE_COMPLETION_FOR_CERTIFICATE")
                .ok()
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.require_completion_for_certificate),
            auto_complete_enrollment: env::var("AUTO_COMPLETE_ENROLLMENT")
                .ok()
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.auto_complete_enrollment),
        }
    }

    /// Check whether an upload extension is on the allow-list (case-insensitive).
    pub fn is_allowed_extension(&self, ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        self.allowed_upload_extensions.iter().any(|e| *e == ext)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_extensions(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}
