use entity::users::Role;
use uuid::Uuid;

use crate::error::{HrError, HrResult};

/// The verified caller of a core operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthContext {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn admin(user_id: Uuid) -> Self {
        Self::new(user_id, Role::Admin)
    }

    pub fn employee(user_id: Uuid) -> Self {
        Self::new(user_id, Role::Employee)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> HrResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(HrError::Forbidden)
        }
    }

    pub fn require_self_or_admin(&self, user_id: Uuid) -> HrResult<()> {
        if self.user_id == user_id || self.is_admin() {
            Ok(())
        } else {
            Err(HrError::Forbidden)
        }
    }
}
