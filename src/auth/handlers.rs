use actix_web::{
    HttpRequest, HttpResponse, Responder,
    cookie::{Cookie, SameSite, time::Duration as CookieDuration},
    get, web,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use tracing::{info, instrument};

use super::{
    session::{SESSION_COOKIE, Session, SessionStore},
    token::decode_user,
};
use crate::{
    backend::HrApi,
    config::Config,
    error::{PortalError, PortalResult},
    model::user::SessionUser,
    models::{
        LoginReqDto, LoginResponse, PasswordResetConfirm, PasswordResetRequest, RegisterReq,
        Toast,
    },
    utils::payslip_poll::PollRegistry,
};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid"));

const MIN_PASSWORD_LEN: usize = 8;

fn validate_email(email: &str) -> PortalResult<()> {
    if EMAIL_RE.is_match(email.trim()) {
        Ok(())
    } else {
        Err(PortalError::validation("A valid e-mail address is required"))
    }
}

fn validate_password(password: &str) -> PortalResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PortalError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn session_cookie(session: &Session, config: &Config) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, session.id.to_string())
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .finish()
}

fn expired_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .max_age(CookieDuration::ZERO)
        .finish()
}

/// Login
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Signed in; session cookie set", body = LoginResponse),
        (status = 400, description = "Missing e-mail or password"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(api, store, config, credentials),
    fields(email = %credentials.email)
)]
pub async fn login(
    credentials: web::Json<LoginReqDto>,
    api: web::Data<dyn HrApi>,
    store: web::Data<SessionStore>,
    config: web::Data<Config>,
) -> PortalResult<HttpResponse> {
    info!("Login request received");

    if credentials.email.trim().is_empty() || credentials.password.is_empty() {
        return Err(PortalError::validation("E-mail and password are required"));
    }

    let grant = api.login(&credentials).await?;

    // Prefer the user object sent along; otherwise read it out of the token.
    let user = match grant.user {
        Some(user) => user,
        None => decode_user(&grant.token)?,
    };

    let session = store.start(user, grant.token).await;
    let redirect = session.user.role.landing_route().to_string();
    info!(user_id = session.user.id, role = %session.user.role, %redirect, "Login successful");

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(&session, &config))
        .json(LoginResponse {
            user: session.user.clone(),
            redirect,
        }))
}

/// Register
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "Account created"),
        (status = 400, description = "Invalid form")
    ),
    tag = "Auth"
)]
pub async fn register(
    user: web::Json<RegisterReq>,
    api: web::Data<dyn HrApi>,
) -> PortalResult<HttpResponse> {
    if user.name.trim().is_empty() || user.surname.trim().is_empty() {
        return Err(PortalError::validation("Name and surname are required"));
    }
    validate_email(&user.email)?;
    validate_password(&user.password)?;

    api.register(&user).await?;

    Ok(HttpResponse::Created().json(json!({
        "toast": Toast::success("Account created, you can sign in now")
    })))
}

/// Logout
///
/// Ends the session (if any), aborts its payslip polls and clears the cookie.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Signed out")),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    store: web::Data<SessionStore>,
    polls: web::Data<PollRegistry>,
) -> impl Responder {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        if let Some(session) = store.resolve(cookie.value()).await {
            let aborted = polls.cancel_session(session.id);
            store.end(&session.id).await;
            info!(user_id = session.user.id, aborted_polls = aborted, "Logout");
        }
    }

    // success even if there was nothing to end
    HttpResponse::NoContent().cookie(expired_cookie()).finish()
}

/// Request a password reset e-mail
#[utoipa::path(
    post,
    path = "/auth/password-reset/request",
    request_body = PasswordResetRequest,
    responses((status = 200, description = "Reset e-mail sent when the address is known")),
    tag = "Auth"
)]
pub async fn request_password_reset(
    body: web::Json<PasswordResetRequest>,
    api: web::Data<dyn HrApi>,
) -> PortalResult<HttpResponse> {
    validate_email(&body.email)?;

    match api.request_password_reset(body.email.trim()).await {
        // Same answer for unknown addresses.
        Ok(()) | Err(PortalError::NotFound { .. }) => {}
        Err(e) => return Err(e),
    }

    Ok(HttpResponse::Ok().json(json!({
        "toast": Toast::info("If the address is registered, a reset link is on its way")
    })))
}

/// Set a new password with the e-mailed token
#[utoipa::path(
    post,
    path = "/auth/password-reset/confirm",
    request_body = PasswordResetConfirm,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Invalid token or password")
    ),
    tag = "Auth"
)]
pub async fn confirm_password_reset(
    body: web::Json<PasswordResetConfirm>,
    api: web::Data<dyn HrApi>,
) -> PortalResult<HttpResponse> {
    if body.token.trim().is_empty() {
        return Err(PortalError::validation("Reset token is required"));
    }
    validate_password(&body.new_password)?;

    api.confirm_password_reset(&body).await?;

    Ok(HttpResponse::Ok().json(json!({
        "toast": Toast::success("Password changed, please sign in")
    })))
}

/// Current user
#[utoipa::path(
    get,
    path = "/portal/me",
    responses(
        (status = 200, description = "Signed-in user", body = SessionUser),
        (status = 401, description = "Not signed in")
    ),
    tag = "Auth"
)]
#[get("/me")]
pub async fn me(session: Session) -> impl Responder {
    HttpResponse::Ok().json(&session.user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::payslip,
        auth::{middleware::session_middleware, token::tests::backend_token},
        backend::api::MockHrApi,
        model::{
            payslip::{PayslipFetch, PayslipPeriod},
            role::Role,
        },
        models::LoginGrant,
        utils::payslip_poll::PollKey,
    };
    use actix_web::{App, http::StatusCode, middleware::from_fn, test as actix_test};
    use serde_json::Value;
    use std::{sync::Arc, time::Duration};

    fn employee() -> SessionUser {
        SessionUser {
            id: 7,
            name: "Ana".into(),
            surname: "Silva".into(),
            role: Role::Employee,
            employee_id: Some(1000),
        }
    }

    macro_rules! portal_app {
        ($api:expr, $store:expr) => {{
            let api: Arc<dyn HrApi> = Arc::new($api);
            actix_test::init_service(
                App::new()
                    .app_data(web::Data::from(api))
                    .app_data(web::Data::new($store.clone()))
                    .app_data(web::Data::new(Config::default()))
                    .app_data(web::Data::new(PollRegistry::new()))
                    .service(
                        web::scope("/auth")
                            .route("/login", web::post().to(login))
                            .route("/logout", web::post().to(logout)),
                    )
                    .service(
                        web::scope("/portal")
                            .wrap(from_fn(session_middleware))
                            .service(me),
                    ),
            )
            .await
        }};
    }

    #[actix_web::test]
    async fn admin_login_lands_on_admin_route() {
        let token = backend_token(json!({
            "id": 1, "name": "Hanna", "surname": "Berg", "role": "Admin"
        }));
        let mut api = MockHrApi::new();
        api.expect_login().times(1).returning(move |_| {
            Ok(LoginGrant {
                token: token.clone(),
                user: None,
            })
        });
        let store = SessionStore::new(&Config::default());
        let app = portal_app!(api, store);

        let req = actix_test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({ "email": "hanna@company.com", "password": "secret-pass" }))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let cookie = resp
            .response()
            .cookies()
            .find(|c| c.name() == SESSION_COOKIE)
            .expect("session cookie");
        assert!(store.resolve(cookie.value()).await.is_some());

        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["redirect"], "/admin");
        assert_eq!(body["user"]["role"], "admin");
    }

    #[actix_web::test]
    async fn employee_login_lands_on_home() {
        let mut api = MockHrApi::new();
        api.expect_login().times(1).returning(|_| {
            Ok(LoginGrant {
                token: "opaque".into(),
                user: Some(employee()),
            })
        });
        let store = SessionStore::new(&Config::default());
        let app = portal_app!(api, store);

        let req = actix_test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({ "email": "ana@company.com", "password": "secret-pass" }))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["redirect"], "/home");
        assert_eq!(body["user"]["employee_id"], 1000);
    }

    #[actix_web::test]
    async fn empty_credentials_never_reach_backend() {
        let api = MockHrApi::new();
        let store = SessionStore::new(&Config::default());
        let app = portal_app!(api, store);

        let req = actix_test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({ "email": " ", "password": "" }))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn logout_clears_session_and_blocks_protected_calls() {
        // No backend expectations: any call after logout would fail the test.
        let api = MockHrApi::new();
        let store = SessionStore::new(&Config::default());
        let session = store.start(employee(), "token".into()).await;
        let app = portal_app!(api, store);

        let me_req = || {
            actix_test::TestRequest::get()
                .uri("/portal/me")
                .cookie(Cookie::new(SESSION_COOKIE, session.id.to_string()))
                .to_request()
        };
        let resp = actix_test::call_service(&app, me_req()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let logout_req = actix_test::TestRequest::post()
            .uri("/auth/logout")
            .cookie(Cookie::new(SESSION_COOKIE, session.id.to_string()))
            .to_request();
        let resp = actix_test::call_service(&app, logout_req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert!(store.get(&session.id).await.is_none());

        let resp = actix_test::call_service(&app, me_req()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn logout_aborts_a_running_payslip_poll() {
        let mut api = MockHrApi::new();
        api.expect_fetch_payslip().returning(|_, _, _| {
            Ok(PayslipFetch {
                ready: false,
                payslip: None,
            })
        });
        let api: Arc<dyn HrApi> = Arc::new(api);
        let store = SessionStore::new(&Config::default());
        let session = store.start(employee(), "token".into()).await;
        let polls = web::Data::new(PollRegistry::new());
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::from(api))
                .app_data(web::Data::new(store.clone()))
                .app_data(web::Data::new(Config {
                    payslip_poll_delay_secs: 1,
                    ..Config::default()
                }))
                .app_data(polls.clone())
                .route("/auth/logout", web::post().to(logout))
                .service(
                    web::scope("/portal")
                        .wrap(from_fn(session_middleware))
                        .configure(payslip::configure),
                ),
        )
        .await;
        let key = PollKey {
            session_id: session.id,
            employee_id: 1000,
            period: PayslipPeriod::new(2024, 3).unwrap(),
        };

        let poll = async {
            let req = actix_test::TestRequest::post()
                .uri("/portal/payslips/1000/2024/3/poll")
                .cookie(Cookie::new(SESSION_COOKIE, session.id.to_string()))
                .to_request();
            actix_test::call_service(&app, req).await
        };
        let sign_out = async {
            while !polls.is_running(&key) {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            let req = actix_test::TestRequest::post()
                .uri("/auth/logout")
                .cookie(Cookie::new(SESSION_COOKIE, session.id.to_string()))
                .to_request();
            actix_test::call_service(&app, req).await
        };
        let (poll_resp, logout_resp) = tokio::join!(poll, sign_out);

        assert_eq!(logout_resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(poll_resp.status(), StatusCode::CONFLICT);
        let body: Value = actix_test::read_body_json(poll_resp).await;
        assert_eq!(body["kind"], "cancelled");
        assert!(!polls.is_running(&key));
    }

    #[test]
    fn email_and_password_rules() {
        assert!(validate_email("ana@company.com").is_ok());
        assert!(validate_email("ana@company").is_err());
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough").is_ok());
    }
}
