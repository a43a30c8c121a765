use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::{Display, Error};
use serde_json::json;

/// Every failure a screen can surface. Rendered as an error toast.
#[derive(Debug, Display, Error)]
pub enum PortalError {
    #[display(fmt = "Could not reach the HR service: {}", message)]
    Network { message: String },

    #[display(fmt = "HR service answered {}: {}", status, message)]
    Backend { status: u16, message: String },

    #[display(fmt = "{}", message)]
    Validation { message: String },

    #[display(fmt = "{}", message)]
    NotYetReady { message: String },

    #[display(fmt = "{}", message)]
    Unauthorized { message: String },

    #[display(fmt = "{}", message)]
    Forbidden { message: String },

    #[display(fmt = "{}", message)]
    NotFound { message: String },

    #[display(fmt = "Polling was cancelled")]
    Cancelled,
}

impl PortalError {
    pub fn validation(message: impl Into<String>) -> Self {
        PortalError::Validation {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        PortalError::Unauthorized {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        PortalError::Forbidden {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        PortalError::NotFound {
            message: message.into(),
        }
    }

    /// Short machine-readable tag sent next to the toast.
    pub fn kind(&self) -> &'static str {
        match self {
            PortalError::Network { .. } | PortalError::Backend { .. } => "network",
            PortalError::Validation { .. } => "validation",
            PortalError::NotYetReady { .. } => "not_ready",
            PortalError::Unauthorized { .. } => "unauthorized",
            PortalError::Forbidden { .. } => "forbidden",
            PortalError::NotFound { .. } => "not_found",
            PortalError::Cancelled => "cancelled",
        }
    }
}

impl From<reqwest::Error> for PortalError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => PortalError::Backend {
                status: status.as_u16(),
                message: e.to_string(),
            },
            None => PortalError::Network {
                message: e.to_string(),
            },
        }
    }
}

impl ResponseError for PortalError {
    fn status_code(&self) -> StatusCode {
        match self {
            PortalError::Network { .. } => StatusCode::BAD_GATEWAY,
            PortalError::Backend { status: 404, .. } => StatusCode::NOT_FOUND,
            PortalError::Backend { .. } => StatusCode::BAD_GATEWAY,
            PortalError::Validation { .. } => StatusCode::BAD_REQUEST,
            PortalError::NotYetReady { .. } => StatusCode::SERVICE_UNAVAILABLE,
            PortalError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            PortalError::Forbidden { .. } => StatusCode::FORBIDDEN,
            PortalError::NotFound { .. } => StatusCode::NOT_FOUND,
            PortalError::Cancelled => StatusCode::CONFLICT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "toast": { "level": "error", "message": self.to_string() },
            "kind": self.kind(),
        }))
    }
}

pub type PortalResult<T> = Result<T, PortalError>;
