use async_graphql::{ID, SimpleObject};
use products_hr::profile::EmployeeRecord;

use super::types::{ProfileNode, RoleKind};

#[derive(Clone, Debug, SimpleObject)]
pub struct MePayload {
    pub id: ID,
    #[graphql(name = "employeeCode")]
    pub employee_code: String,
    pub email: String,
    pub role: RoleKind,
    #[graphql(name = "isAdmin")]
    pub is_admin: bool,
    pub name: Option<String>,
    pub profile: Option<ProfileNode>,
}

impl MePayload {
    pub fn from_record(record: EmployeeRecord) -> Self {
        let role = RoleKind::from(record.identity.role);
        Self {
            id: ID(record.identity.id.to_string()),
            employee_code: record.identity.employee_code,
            email: record.identity.email,
            is_admin: role == RoleKind::Admin,
            role,
            name: record.profile.as_ref().map(|profile| profile.full_name()),
            profile: record.profile.map(Into::into),
        }
    }
}
