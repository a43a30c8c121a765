use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::{
    auth::{auth::AdminSession, session::Session},
    backend::HrApi,
    config::Config,
    error::{PortalError, PortalResult},
    model::payslip::{Payslip, PayslipPeriod},
    models::{Screen, Toast},
    utils::payslip_poll::{PollKey, PollPolicy, PollRegistry, poll_payslip},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct GeneratePayslip {
    #[schema(example = 1000)]
    pub employee_id: u64,
    /// month picker value
    #[schema(example = "2024-03")]
    pub month: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateForPosition {
    #[schema(example = "Accountant")]
    pub position: String,
    #[schema(example = "2024-03")]
    pub month: String,
}

/// Path segments `{employee_id}/{year}/{month}`.
fn period_path(path: (u64, i32, u32)) -> PortalResult<(u64, PayslipPeriod)> {
    let (employee_id, year, month) = path;
    Ok((employee_id, PayslipPeriod::new(year, month)?))
}

/// Polls under the caller's session so that leaving, logging out or a newer
/// request for the same payslip stops it.
async fn poll_for(
    api: &dyn HrApi,
    polls: &PollRegistry,
    config: &Config,
    session: &Session,
    employee_id: u64,
    period: PayslipPeriod,
) -> PortalResult<Payslip> {
    let key = PollKey {
        session_id: session.id,
        employee_id,
        period,
    };
    let policy = PollPolicy::from_config(config);
    polls
        .run(key, poll_payslip(api, session, employee_id, period, policy))
        .await
}

#[utoipa::path(
    get,
    path = "/portal/payslips",
    responses(
        (status = 200, description = "Own payslips, newest first", body = Object),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Payslips"
)]
pub async fn my_payslips(session: Session, api: web::Data<dyn HrApi>) -> PortalResult<HttpResponse> {
    let mut rows = api.payslips(&session, session.employee_id()?).await?;
    rows.sort_by_key(|p| std::cmp::Reverse(p.period()));
    Ok(HttpResponse::Ok().json(Screen::show(rows)))
}

#[utoipa::path(
    get,
    path = "/portal/payslips/{employee_id}/{year}/{month}",
    params(
        ("employee_id" = u64, Path, description = "Employee the payslip belongs to"),
        ("year" = i32, Path, description = "Year of the pay period"),
        ("month" = u32, Path, description = "Month of the pay period, 1-12")
    ),
    responses(
        (status = 200, description = "Payslip", body = Object),
        (status = 403, description = "Another employee's payslip"),
        (status = 503, description = "Not generated yet")
    ),
    tag = "Payslips"
)]
pub async fn view_payslip(
    session: Session,
    api: web::Data<dyn HrApi>,
    path: web::Path<(u64, i32, u32)>,
) -> PortalResult<HttpResponse> {
    let (employee_id, period) = period_path(path.into_inner())?;
    session.require_self_or_admin(employee_id)?;

    let fetch = api.fetch_payslip(&session, employee_id, period).await?;
    match fetch.payslip {
        Some(payslip) if fetch.ready => Ok(HttpResponse::Ok().json(Screen::show(payslip))),
        _ => Err(PortalError::NotYetReady {
            message: format!("Payslip for {period} is not available yet"),
        }),
    }
}

#[utoipa::path(
    post,
    path = "/portal/payslips/{employee_id}/{year}/{month}/poll",
    params(
        ("employee_id" = u64, Path, description = "Employee the payslip belongs to"),
        ("year" = i32, Path, description = "Year of the pay period"),
        ("month" = u32, Path, description = "Month of the pay period, 1-12")
    ),
    responses(
        (status = 200, description = "Payslip became available", body = Object),
        (status = 409, description = "Poll cancelled"),
        (status = 503, description = "Still not available after every attempt")
    ),
    tag = "Payslips"
)]
#[instrument(name = "payslip_resume_poll", skip_all)]
pub async fn resume_poll(
    session: Session,
    api: web::Data<dyn HrApi>,
    polls: web::Data<PollRegistry>,
    config: web::Data<Config>,
    path: web::Path<(u64, i32, u32)>,
) -> PortalResult<HttpResponse> {
    let (employee_id, period) = period_path(path.into_inner())?;
    session.require_self_or_admin(employee_id)?;

    let payslip = poll_for(api.get_ref(), &polls, &config, &session, employee_id, period).await?;
    Ok(HttpResponse::Ok().json(Screen::with_toast(
        payslip,
        Toast::success(format!("Payslip for {period} is ready")),
    )))
}

#[utoipa::path(
    delete,
    path = "/portal/payslips/{employee_id}/{year}/{month}/poll",
    params(
        ("employee_id" = u64, Path, description = "Employee the payslip belongs to"),
        ("year" = i32, Path, description = "Year of the pay period"),
        ("month" = u32, Path, description = "Month of the pay period, 1-12")
    ),
    responses(
        (status = 200, description = "Whether a poll was running", body = Object)
    ),
    tag = "Payslips"
)]
pub async fn cancel_poll(
    session: Session,
    polls: web::Data<PollRegistry>,
    path: web::Path<(u64, i32, u32)>,
) -> PortalResult<HttpResponse> {
    let (employee_id, period) = period_path(path.into_inner())?;
    let cancelled = polls.cancel(&PollKey {
        session_id: session.id,
        employee_id,
        period,
    });

    Ok(HttpResponse::Ok().json(json!({ "cancelled": cancelled })))
}

/* =========================
Payroll run (HR/Admin)
========================= */

#[utoipa::path(
    post,
    path = "/portal/admin/payslips/generate",
    request_body = GeneratePayslip,
    responses(
        (status = 200, description = "Generated and read back", body = Object,
         example = json!({
            "data": { "employee_id": 1000, "year": 2024, "month": 3, "net_salary": 2500.0 },
            "toast": { "level": "success", "message": "Payslip for 2024-03 generated" }
         })
        ),
        (status = 400, description = "Invalid month"),
        (status = 409, description = "Poll cancelled"),
        (status = 503, description = "Generated but not readable after every attempt")
    ),
    tag = "Payslips"
)]
#[instrument(name = "payslip_generate", skip_all, fields(employee_id = payload.employee_id))]
pub async fn generate_payslip(
    admin: AdminSession,
    api: web::Data<dyn HrApi>,
    polls: web::Data<PollRegistry>,
    config: web::Data<Config>,
    payload: web::Json<GeneratePayslip>,
) -> PortalResult<HttpResponse> {
    let period = PayslipPeriod::from_month_picker(&payload.month)?;
    let employee_id = payload.employee_id;

    api.generate_payslip(&admin, employee_id, period).await?;
    info!(%period, "payslip generation requested");

    let payslip = poll_for(api.get_ref(), &polls, &config, &admin, employee_id, period).await?;
    Ok(HttpResponse::Ok().json(Screen::with_toast(
        payslip,
        Toast::success(format!("Payslip for {period} generated")),
    )))
}

#[utoipa::path(
    post,
    path = "/portal/admin/payslips/generate/position",
    request_body = GenerateForPosition,
    responses(
        (status = 200, description = "Generation queued for every holder of the position", body = Object),
        (status = 400, description = "Invalid form")
    ),
    tag = "Payslips"
)]
pub async fn generate_for_position(
    admin: AdminSession,
    api: web::Data<dyn HrApi>,
    payload: web::Json<GenerateForPosition>,
) -> PortalResult<HttpResponse> {
    let period = PayslipPeriod::from_month_picker(&payload.month)?;
    let position = payload.position.trim();
    if position.is_empty() {
        return Err(PortalError::validation("Position is required"));
    }

    let count = api
        .generate_payslips_for_position(&admin, position, period)
        .await?;
    info!(%period, position, count, "bulk payslip generation requested");

    Ok(HttpResponse::Ok().json(Screen::with_toast(
        json!({ "position": position, "period": period, "count": count }),
        Toast::info(format!(
            "Generating {count} payslip(s) for {position}, {period}"
        )),
    )))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/payslips").route(web::get().to(my_payslips)))
        .service(
            web::resource("/payslips/{employee_id}/{year}/{month}")
                .route(web::get().to(view_payslip)),
        )
        .service(
            web::resource("/payslips/{employee_id}/{year}/{month}/poll")
                .route(web::post().to(resume_poll))
                .route(web::delete().to(cancel_poll)),
        );
}

pub fn configure_admin(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/payslips/generate").route(web::post().to(generate_payslip)))
        .service(
            web::resource("/payslips/generate/position")
                .route(web::post().to(generate_for_position)),
        );
}
