use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::role::Role;

/// The signed-in user, decoded once at login and kept for the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 7,
    "name": "Ana",
    "surname": "Silva",
    "role": "employee",
    "employee_id": 1000
}))]
pub struct SessionUser {
    pub id: u64,
    pub name: String,
    pub surname: String,
    pub role: Role,
    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl SessionUser {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname).trim().to_string()
    }
}
