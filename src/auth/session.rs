use chrono::{DateTime, Utc};
use moka::future::Cache;
use uuid::Uuid;

use crate::{config::Config, error::PortalError, model::user::SessionUser};

/// Name of the cookie holding the opaque session id.
pub const SESSION_COOKIE: &str = "hr_session";

/// A signed-in user together with the bearer token for backend calls.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub user: SessionUser,
    pub token: String,
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub fn open(user: SessionUser, token: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user,
            token,
            started_at: Utc::now(),
        }
    }

    /// Employee record of the signed-in user; self-service screens need one.
    pub fn employee_id(&self) -> Result<u64, PortalError> {
        self.user
            .employee_id
            .ok_or_else(|| PortalError::forbidden("No employee profile"))
    }

    pub fn require_admin(&self) -> Result<(), PortalError> {
        if self.user.role.is_admin() {
            Ok(())
        } else {
            Err(PortalError::forbidden("Admin only"))
        }
    }

    /// Admins may act on any employee, everyone else only on themselves.
    pub fn require_self_or_admin(&self, employee_id: u64) -> Result<(), PortalError> {
        if self.user.role.is_admin() || self.user.employee_id == Some(employee_id) {
            Ok(())
        } else {
            Err(PortalError::forbidden("Not allowed to view another employee"))
        }
    }
}

/// Live sessions, keyed by the id stored in the session cookie.
/// Entries expire after `session_ttl` without use.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<Uuid, Session>,
}

impl SessionStore {
    pub fn new(config: &Config) -> Self {
        Self {
            sessions: Cache::builder()
                .max_capacity(config.session_capacity)
                .time_to_idle(config.session_ttl())
                .eviction_listener(|id, _session, cause| {
                    if cause.was_evicted() {
                        log::info!("Session {} dropped from store: {:?}", id, cause);
                    }
                })
                .build(),
        }
    }

    /// Starts a session for a freshly logged-in user.
    pub async fn start(&self, user: SessionUser, token: String) -> Session {
        let session = Session::open(user, token);
        self.sessions.insert(session.id, session.clone()).await;
        tracing::info!(session_id = %session.id, user_id = session.user.id, "session started");
        session
    }

    pub async fn get(&self, id: &Uuid) -> Option<Session> {
        self.sessions.get(id).await
    }

    /// Looks a session up from the raw cookie value.
    pub async fn resolve(&self, raw_id: &str) -> Option<Session> {
        let id = Uuid::parse_str(raw_id.trim()).ok()?;
        self.get(&id).await
    }

    /// Ends a session. Ending an unknown session is not an error.
    pub async fn end(&self, id: &Uuid) -> Option<Session> {
        let removed = self.sessions.remove(id).await;
        if removed.is_some() {
            tracing::info!(session_id = %id, "session ended");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;

    fn employee() -> SessionUser {
        SessionUser {
            id: 7,
            name: "Ana".into(),
            surname: "Silva".into(),
            role: Role::Employee,
            employee_id: Some(1000),
        }
    }

    #[actix_web::test]
    async fn start_resolve_end() {
        let store = SessionStore::new(&Config::default());
        let session = store.start(employee(), "token".into()).await;

        let found = store.resolve(&session.id.to_string()).await.unwrap();
        assert_eq!(found.user, employee());
        assert_eq!(found.token, "token");

        assert!(store.end(&session.id).await.is_some());
        assert!(store.get(&session.id).await.is_none());
        assert!(store.end(&session.id).await.is_none());
    }

    #[actix_web::test]
    async fn garbage_cookie_resolves_to_nothing() {
        let store = SessionStore::new(&Config::default());
        assert!(store.resolve("not-a-uuid").await.is_none());
    }

    #[test]
    fn employees_only_see_themselves() {
        let session = Session::open(employee(), "t".into());
        assert!(session.require_self_or_admin(1000).is_ok());
        assert!(session.require_self_or_admin(1001).is_err());
        assert!(session.require_admin().is_err());
        assert_eq!(session.employee_id().unwrap(), 1000);
    }
}
