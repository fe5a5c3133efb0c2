//! Role names and role sets.
//!
//! Roles form an open vocabulary: admins may create new ones at runtime, so a
//! role name is a validated string rather than an enum. Checks against a
//! [`RoleSet`] are plain membership tests; no role implies another.

use std::collections::BTreeSet;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::{MAX_ROLE_NAME_LENGTH, ROLE_ADMIN, ROLE_STUDENT, ROLE_TEACHER};
use crate::errors::{AppError, AppResult};

static ROLE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]*$").expect("valid role name regex"));

/// Validated role name (lower-case ASCII, digits, `_`, `-`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoleName(String);

impl RoleName {
    /// Parse and validate a role name. Surrounding whitespace is ignored and
    /// upper-case input is folded to lower case.
    pub fn parse(raw: &str) -> AppResult<Self> {
        let name = raw.trim().to_ascii_lowercase();
        if name.is_empty() || name.len() > MAX_ROLE_NAME_LENGTH {
            return Err(AppError::validation(format!(
                "Role name must be between 1 and {} characters",
                MAX_ROLE_NAME_LENGTH
            )));
        }
        if !ROLE_NAME_RE.is_match(&name) {
            return Err(AppError::validation(format!("Invalid role name: {}", raw)));
        }
        Ok(Self(name))
    }

    pub fn admin() -> Self {
        Self(ROLE_ADMIN.to_string())
    }

    pub fn teacher() -> Self {
        Self(ROLE_TEACHER.to_string())
    }

    pub fn student() -> Self {
        Self(ROLE_STUDENT.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RoleName {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoleName> for String {
    fn from(role: RoleName) -> Self {
        role.0
    }
}

/// An unordered set of role names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSet(BTreeSet<RoleName>);

impl RoleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from role names already known to be valid.
    pub fn of(roles: impl IntoIterator<Item = RoleName>) -> Self {
        Self(roles.into_iter().collect())
    }

    /// Build a set from raw strings (e.g. rows loaded from the role table).
    /// Invalid names are skipped.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self(
            names
                .into_iter()
                .filter_map(|n| RoleName::parse(n).ok())
                .collect(),
        )
    }

    pub fn insert(&mut self, role: RoleName) -> bool {
        self.0.insert(role)
    }

    pub fn contains(&self, role: &str) -> bool {
        self.0.iter().any(|r| r.as_str() == role)
    }

    /// True when the two sets share at least one role.
    pub fn intersects(&self, other: &RoleSet) -> bool {
        self.0.iter().any(|r| other.0.contains(r))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoleName> {
        self.0.iter()
    }
}

impl FromIterator<RoleName> for RoleSet {
    fn from_iter<I: IntoIterator<Item = RoleName>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Role row as stored in the role table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: uuid::Uuid,
    pub name: RoleName,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case_and_whitespace() {
        let role = RoleName::parse("  Teacher ").unwrap();
        assert_eq!(role.as_str(), "teacher");
    }

    #[test]
    fn test_parse_rejects_invalid_names() {
        assert!(RoleName::parse("").is_err());
        assert!(RoleName::parse("has space").is_err());
        assert!(RoleName::parse("_leading").is_err());
        assert!(RoleName::parse(&"x".repeat(51)).is_err());
    }

    #[test]
    fn test_open_vocabulary_accepts_new_roles() {
        assert_eq!(RoleName::parse("content-manager").unwrap().as_str(), "content-manager");
    }

    #[test]
    fn test_intersects_is_membership_only() {
        let actor = RoleSet::of([RoleName::student(), RoleName::teacher()]);
        let required = RoleSet::of([RoleName::admin(), RoleName::teacher()]);
        assert!(actor.intersects(&required));

        let admin_only = RoleSet::of([RoleName::admin()]);
        let teacher_check = RoleSet::of([RoleName::teacher()]);
        assert!(!admin_only.intersects(&teacher_check));
    }

    #[test]
    fn test_from_names_skips_invalid() {
        let set = RoleSet::from_names(["admin", "not valid", "student"]);
        assert_eq!(set.len(), 2);
        assert!(set.contains("admin"));
        assert!(!set.contains("not valid"));
    }
}
