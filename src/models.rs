use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::user::SessionUser;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "ana.silva@company.com")]
    pub email: String,
    #[schema(example = "correct horse battery staple")]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterReq {
    #[schema(example = "Ana")]
    pub name: String,
    #[schema(example = "Silva")]
    pub surname: String,
    #[schema(example = "ana.silva@company.com")]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PasswordResetRequest {
    #[schema(example = "ana.silva@company.com")]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PasswordResetConfirm {
    /// token received by e-mail
    pub token: String,
    pub new_password: String,
}

/// What the backend hands back on a successful login.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginGrant {
    pub token: String,
    /// Some backends send the user next to the token; otherwise it is decoded from the token.
    pub user: Option<SessionUser>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub user: SessionUser,
    #[schema(example = "/home")]
    pub redirect: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Success,
    Info,
    Error,
}

/// Transient notification shown after an action.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Info,
            message: message.into(),
        }
    }
}

/// Body of every screen: the (refreshed) data plus an optional toast.
#[derive(Debug, Serialize)]
pub struct Screen<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toast: Option<Toast>,
}

impl<T> Screen<T> {
    pub fn show(data: T) -> Self {
        Self { data, toast: None }
    }

    pub fn with_toast(data: T, toast: Toast) -> Self {
        Self {
            data,
            toast: Some(toast),
        }
    }
}
