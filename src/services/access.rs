//! Shared authorization helpers for services.

use sea_orm::ConnectionTrait;

use crate::domain::{Actor, Course};
use crate::errors::AppResult;
use crate::infra::Store;
use crate::policy::{self, Decision};

/// Turn a policy decision into a result, logging refusals.
pub(crate) fn enforce(actor: &Actor, decision: Decision, action: &'static str) -> AppResult<()> {
    if !decision.is_allowed() {
        tracing::warn!(
            user_id = ?actor.user_id(),
            action,
            decision = ?decision,
            "Authorization refused"
        );
    }
    decision.into_result()
}

/// Course content is open to the author, admins, and students whose
/// enrollment is active or completed. Dropped enrollments do not count.
pub(crate) async fn has_content_access<C: ConnectionTrait>(
    store: &Store<'_, C>,
    actor: &Actor,
    course: &Course,
) -> AppResult<bool> {
    let Some(principal) = actor.principal() else {
        return Ok(false);
    };
    if policy::can_manage_course(actor, course).is_allowed() {
        return Ok(true);
    }

    let enrollment = store.enrollments().find(principal.user_id, course.id).await?;
    Ok(enrollment.is_some_and(|e| e.status.grants_content_access()))
}

/// Like [`has_content_access`] but fails with the matching denial.
pub(crate) async fn require_content_access<C: ConnectionTrait>(
    store: &Store<'_, C>,
    actor: &Actor,
    course: &Course,
) -> AppResult<()> {
    let decision = if !actor.is_authenticated() {
        policy::authenticated(actor)
    } else if has_content_access(store, actor, course).await? {
        Decision::Allow
    } else {
        Decision::Deny(policy::Denial::Forbidden)
    };
    enforce(actor, decision, "course.content")
}
