//! The authenticated (or anonymous) party performing an operation.

use uuid::Uuid;

use super::role::RoleSet;

/// Identity and resolved roles of an authenticated user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub roles: RoleSet,
}

impl Principal {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// Actor supplied by the authentication collaborator to every operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Anonymous,
    Authenticated(Principal),
}

impl Actor {
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Actor::Anonymous => None,
            Actor::Authenticated(p) => Some(p),
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.principal().map(|p| p.user_id)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Actor::Authenticated(_))
    }
}

impl From<Principal> for Actor {
    fn from(principal: Principal) -> Self {
        Actor::Authenticated(principal)
    }
}
