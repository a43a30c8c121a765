use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures::future::{Ready, ready};

use super::session::Session;
use crate::error::PortalError;

/// The session resolved by the session middleware for this request.
///
/// Handlers take it as an argument and pass it on to every backend call.
impl FromRequest for Session {
    type Error = PortalError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Session>()
                .cloned()
                .ok_or_else(|| PortalError::unauthorized("Not signed in")),
        )
    }
}

/// A session whose user has the admin role. Used by the HR console screens.
pub struct AdminSession(pub Session);

impl FromRequest for AdminSession {
    type Error = PortalError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let session = match req.extensions().get::<Session>().cloned() {
            Some(s) => s,
            None => return ready(Err(PortalError::unauthorized("Not signed in"))),
        };
        ready(session.require_admin().map(|_| AdminSession(session)))
    }
}

impl std::ops::Deref for AdminSession {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.0
    }
}
