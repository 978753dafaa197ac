//! The authenticated caller.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::Role;

/// Who is performing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    /// The caller's employee id.
    pub user_id: String,
    /// The caller's role.
    pub role: Role,
}

impl Actor {
    /// Creates an actor.
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    /// The actor recurring jobs run as.
    pub fn system() -> Self {
        Self::new("system", Role::Admin)
    }

    /// Returns true for admin and HR callers.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Fails with `Permission` unless the caller is an administrator.
    pub fn require_admin(&self) -> EngineResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(EngineError::permission("administrator role required"))
        }
    }

    /// Fails with `Permission` unless the caller is an administrator or
    /// `owner_id` itself.
    pub fn require_admin_or_self(&self, owner_id: &str) -> EngineResult<()> {
        if self.is_admin() || self.user_id == owner_id {
            Ok(())
        } else {
            Err(EngineError::permission("not allowed to access another employee's records"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hr_counts_as_admin() {
        assert!(Actor::new("hr_1", Role::Hr).require_admin().is_ok());
        assert!(Actor::new("emp_001", Role::Employee).require_admin().is_err());
    }

    #[test]
    fn test_owner_access() {
        let actor = Actor::new("emp_001", Role::Employee);
        assert!(actor.require_admin_or_self("emp_001").is_ok());
        assert!(matches!(
            actor.require_admin_or_self("emp_002"),
            Err(EngineError::Permission { .. })
        ));
    }
}
