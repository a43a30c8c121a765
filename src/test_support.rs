//! Fixtures shared by the screen tests.

use actix_web::cookie::Cookie;

use crate::{
    auth::session::{SESSION_COOKIE, Session, SessionStore},
    model::{role::Role, user::SessionUser},
};

pub fn employee_user() -> SessionUser {
    SessionUser {
        id: 7,
        name: "Ana".into(),
        surname: "Silva".into(),
        role: Role::Employee,
        employee_id: Some(1000),
    }
}

pub fn admin_user() -> SessionUser {
    SessionUser {
        id: 1,
        name: "Hanna".into(),
        surname: "Berg".into(),
        role: Role::Admin,
        employee_id: Some(1),
    }
}

/// Starts a session in `store` and returns it with the matching cookie.
pub async fn signed_in(store: &SessionStore, user: SessionUser) -> (Session, Cookie<'static>) {
    let session = store.start(user, "test-token".into()).await;
    let cookie = Cookie::new(SESSION_COOKIE, session.id.to_string());
    (session, cookie)
}

/// Builds a test service with every portal dependency wired and the given
/// screen routes mounted under `/portal` behind the session middleware.
macro_rules! portal_service {
    ($api:expr, $store:expr, $configure:expr) => {{
        let api: std::sync::Arc<dyn $crate::backend::HrApi> = std::sync::Arc::new($api);
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::from(api))
                .app_data(actix_web::web::Data::new($store.clone()))
                .app_data(actix_web::web::Data::new($crate::config::Config {
                    payslip_poll_delay_secs: 0,
                    ..$crate::config::Config::default()
                }))
                .app_data(actix_web::web::Data::new(
                    $crate::utils::payslip_poll::PollRegistry::new(),
                ))
                .service(
                    actix_web::web::scope("/portal")
                        .wrap(actix_web::middleware::from_fn(
                            $crate::auth::middleware::session_middleware,
                        ))
                        .configure($configure),
                ),
        )
        .await
    }};
}
