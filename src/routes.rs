use crate::{
    api::{appointment, document, hr_admin, leave_request, payslip, todo},
    auth::{handlers, middleware::session_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::{Context, Result};
use std::sync::Arc;

type Limiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

/// Per-IP rate limiters, built once at startup and shared by every worker.
#[derive(Clone)]
pub struct Limiters {
    login: Limiter,
    register: Limiter,
    password_reset: Limiter,
    portal: Limiter,
}

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Result<Limiter> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .with_context(|| format!("invalid rate limit {requests_per_min}/min"))?;
    Ok(Arc::new(Governor::new(&cfg)))
}

impl Limiters {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            login: build_limiter(config.rate_login_per_min)?,
            register: build_limiter(config.rate_register_per_min)?,
            password_reset: build_limiter(config.rate_password_reset_per_min)?,
            portal: build_limiter(config.rate_portal_per_min)?,
        })
    }
}

fn portal_screens(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::me)
        .configure(leave_request::configure)
        .configure(appointment::configure)
        .configure(document::configure)
        .configure(payslip::configure)
        .configure(todo::configure);
}

fn admin_screens(cfg: &mut web::ServiceConfig) {
    cfg.configure(leave_request::configure_admin)
        .configure(appointment::configure_admin)
        .configure(document::configure_admin)
        .configure(payslip::configure_admin)
        .configure(hr_admin::configure_admin);
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiters: &Limiters) {
    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(limiters.login.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(limiters.register.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/logout")
                    .wrap(limiters.login.clone())
                    .route(web::post().to(handlers::logout)),
            )
            .service(
                web::resource("/password-reset/request")
                    .wrap(limiters.password_reset.clone())
                    .route(web::post().to(handlers::request_password_reset)),
            )
            .service(
                web::resource("/password-reset/confirm")
                    .wrap(limiters.password_reset.clone())
                    .route(web::post().to(handlers::confirm_password_reset)),
            ),
    );

    // Signed-in screens; /admin ones additionally check the role per handler
    cfg.service(
        web::scope(&config.portal_prefix)
            .wrap(from_fn(session_middleware))
            .wrap(limiters.portal.clone())
            .service(web::scope("/admin").configure(admin_screens))
            .configure(portal_screens),
    );
}

// LOGIN
//  ├─ backend token kept server-side in the session store
//  └─ browser only holds the hr_session cookie

// PORTAL REQUEST
//  └─ cookie -> session -> Authorization: Bearer <backend token>

// LOGOUT
//  └─ session dropped, running payslip polls aborted, cookie expired

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiters_accept_edge_rates() {
        assert!(Limiters::from_config(&Config::default()).is_ok());
        // zero is clamped to one request a minute
        assert!(build_limiter(0).is_ok());
        // more than one request per millisecond still yields a valid period
        assert!(build_limiter(120_000).is_ok());
    }
}
