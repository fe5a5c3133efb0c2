//! Access-control policy.
//!
//! Role checks are set membership: an actor passes when its role set shares
//! at least one role with the required set. There is no hierarchy, so an
//! `admin` does not satisfy a `teacher`-only check; every rule below lists
//! its accepted roles explicitly.

use uuid::Uuid;

use crate::config::{ROLE_ADMIN, ROLE_TEACHER};
use crate::domain::{Actor, Course, FileRecord, RoleSet};
use crate::errors::{AppError, AppResult};

/// Why a request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    Unauthenticated,
    Forbidden,
}

/// Policy outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Logical OR of two decisions. An unauthenticated denial wins over a
    /// forbidden one so anonymous callers are told to log in.
    pub fn or(self, other: Decision) -> Decision {
        match (self, other) {
            (Decision::Allow, _) | (_, Decision::Allow) => Decision::Allow,
            (Decision::Deny(Denial::Unauthenticated), _)
            | (_, Decision::Deny(Denial::Unauthenticated)) => {
                Decision::Deny(Denial::Unauthenticated)
            }
            _ => Decision::Deny(Denial::Forbidden),
        }
    }

    /// Convert into the error taxonomy.
    pub fn into_result(self) -> AppResult<()> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(Denial::Unauthenticated) => Err(AppError::Unauthenticated),
            Decision::Deny(Denial::Forbidden) => Err(AppError::Forbidden),
        }
    }
}

/// Build a required-role set from names.
pub fn roles(names: &[&str]) -> RoleSet {
    RoleSet::from_names(names.iter().copied())
}

/// Allow when the actor holds any of `required`.
pub fn authorize(actor: &Actor, required: &RoleSet) -> Decision {
    match actor.principal() {
        None => Decision::Deny(Denial::Unauthenticated),
        Some(principal) if principal.roles.intersects(required) => Decision::Allow,
        Some(_) => Decision::Deny(Denial::Forbidden),
    }
}

/// Allow when the actor owns the resource or holds any of `required`.
/// A resource without an owner can only be reached through the role check.
pub fn authorize_owner_or_role(
    actor: &Actor,
    resource_owner_id: Option<Uuid>,
    required: &RoleSet,
) -> Decision {
    match actor.principal() {
        None => Decision::Deny(Denial::Unauthenticated),
        Some(principal) if resource_owner_id == Some(principal.user_id) => Decision::Allow,
        Some(_) => authorize(actor, required),
    }
}

/// Only requires a logged-in actor.
pub fn authenticated(actor: &Actor) -> Decision {
    if actor.is_authenticated() {
        Decision::Allow
    } else {
        Decision::Deny(Denial::Unauthenticated)
    }
}

// =============================================================================
// Per-action rules
// =============================================================================

pub fn admin_only() -> RoleSet {
    roles(&[ROLE_ADMIN])
}

pub fn staff() -> RoleSet {
    roles(&[ROLE_ADMIN, ROLE_TEACHER])
}

/// Creating courses: admins and teachers.
pub fn can_create_course(actor: &Actor) -> Decision {
    authorize(actor, &staff())
}

/// Editing, publishing or deleting a course and its lessons: author or admin.
pub fn can_manage_course(actor: &Actor, course: &Course) -> Decision {
    authorize_owner_or_role(actor, course.created_by, &admin_only())
}

/// Seeing unpublished catalog entries: same as managing them.
pub fn can_preview_course(actor: &Actor, course: &Course) -> Decision {
    if course.is_published {
        return Decision::Allow;
    }
    can_manage_course(actor, course)
}

/// Course student list: author or admin.
pub fn can_view_course_students(actor: &Actor, course: &Course) -> Decision {
    authorize_owner_or_role(actor, course.created_by, &admin_only())
}

/// Progress export for a course: author or admin.
pub fn can_export_course_progress(actor: &Actor, course: &Course) -> Decision {
    authorize_owner_or_role(actor, course.created_by, &admin_only())
}

/// Platform statistics export: admin only.
pub fn can_export_stats(actor: &Actor) -> Decision {
    authorize(actor, &admin_only())
}

/// Certificate for `target_user`: the user themself, or staff.
pub fn can_issue_certificate(actor: &Actor, target_user: Uuid) -> Decision {
    authorize_owner_or_role(actor, Some(target_user), &staff())
}

/// Downloading a file: owner, admin, or any logged-in user for non-private files.
pub fn can_download_file(actor: &Actor, file: &FileRecord) -> Decision {
    if !file.visibility.is_private() {
        return authenticated(actor);
    }
    authorize_owner_or_role(actor, file.owner_user_id, &admin_only())
}

/// Changing visibility or deleting a file: owner or admin.
pub fn can_manage_file(actor: &Actor, file: &FileRecord) -> Decision {
    authorize_owner_or_role(actor, file.owner_user_id, &admin_only())
}

/// Reading or editing per-user data (profile, reports, progress overview).
pub fn can_act_for_user(actor: &Actor, user_id: Uuid) -> Decision {
    authorize_owner_or_role(actor, Some(user_id), &admin_only())
}

/// Account administration: activation, role assignment, deletion.
pub fn can_manage_users(actor: &Actor) -> Decision {
    authorize(actor, &admin_only())
}
