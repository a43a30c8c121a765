use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};

use super::session::{SESSION_COOKIE, SessionStore};
use crate::error::PortalError;

/// Resolves the session cookie and attaches the [`Session`](super::session::Session)
/// to the request. Requests without a live session stop here, before any backend call.
pub async fn session_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let store = req
        .app_data::<Data<SessionStore>>()
        .cloned()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Session store missing"))?;

    let cookie = match req.request().cookie(SESSION_COOKIE) {
        Some(c) => c,
        None => {
            let resp = PortalError::unauthorized("Not signed in").error_response();
            return Ok(req.into_response(resp));
        }
    };

    let session = match store.resolve(cookie.value()).await {
        Some(s) => s,
        None => {
            tracing::debug!("session cookie did not match a live session");
            let resp = PortalError::unauthorized("Session expired, please sign in again")
                .error_response();
            return Ok(req.into_response(resp));
        }
    };

    req.extensions_mut().insert(session);

    next.call(req).await
}
