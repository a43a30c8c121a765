use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Portal roles. `Display`/`FromStr` use the backend spelling, serde the portal one.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum Role {
    Admin,
    Employee,
}

impl Role {
    /// Route the front end lands on right after login.
    pub fn landing_route(self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::Employee => "/home",
        }
    }

    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }
}
