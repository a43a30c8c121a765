use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::{auth::AdminSession, session::Session},
    backend::HrApi,
    error::{PortalError, PortalResult},
    model::appointment::{Appointment, AppointmentStatus, NewAppointment},
    models::{Screen, Toast},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAppointment {
    #[schema(example = "2024-02-12")]
    pub date: NaiveDate,
    #[schema(value_type = String, example = "09:30")]
    #[serde(deserialize_with = "hh_mm::deserialize")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, example = "10:00")]
    #[serde(deserialize_with = "hh_mm::deserialize")]
    pub end_time: NaiveTime,
    #[schema(example = "Contract questions")]
    pub subject: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AppointmentFilter {
    pub status: Option<AppointmentStatus>,
    pub employee_id: Option<u64>,
}

// time pickers send "HH:MM", seconds are optional
mod hh_mm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, de::Error};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(|_| D::Error::custom(format!("invalid time {raw:?}, expected HH:MM")))
    }
}

pub fn validate_appointment(
    employee_id: u64,
    form: CreateAppointment,
) -> PortalResult<NewAppointment> {
    let subject = form.subject.trim().to_string();
    if subject.is_empty() {
        return Err(PortalError::validation("Subject is required"));
    }
    if form.end_time <= form.start_time {
        return Err(PortalError::validation("End time must be after start time"));
    }

    Ok(NewAppointment {
        employee_id,
        date: form.date,
        start_time: form.start_time,
        end_time: form.end_time,
        subject,
    })
}

fn sorted(mut rows: Vec<Appointment>) -> Vec<Appointment> {
    rows.sort_by_key(|a| (a.date, a.start_time));
    rows
}

async fn load_own(api: &dyn HrApi, session: &Session) -> PortalResult<Vec<Appointment>> {
    let employee_id = session.employee_id()?;
    Ok(sorted(api.appointments(session, Some(employee_id)).await?))
}

#[utoipa::path(
    get,
    path = "/portal/appointments",
    responses(
        (status = 200, description = "Own appointments", body = Object),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Appointments"
)]
pub async fn my_appointments(
    session: Session,
    api: web::Data<dyn HrApi>,
) -> PortalResult<HttpResponse> {
    let rows = load_own(api.get_ref(), &session).await?;
    Ok(HttpResponse::Ok().json(Screen::show(rows)))
}

#[utoipa::path(
    post,
    path = "/portal/appointments",
    request_body = CreateAppointment,
    responses(
        (status = 200, description = "Appointment requested; refreshed list", body = Object),
        (status = 400, description = "Invalid form"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Appointments"
)]
pub async fn request_appointment(
    session: Session,
    api: web::Data<dyn HrApi>,
    payload: web::Json<CreateAppointment>,
) -> PortalResult<HttpResponse> {
    let appointment = validate_appointment(session.employee_id()?, payload.into_inner())?;

    api.create_appointment(&session, &appointment).await?;
    info!(employee_id = appointment.employee_id, date = %appointment.date, "appointment requested");

    let rows = load_own(api.get_ref(), &session).await?;
    Ok(HttpResponse::Ok().json(Screen::with_toast(
        rows,
        Toast::success("Appointment requested"),
    )))
}

#[utoipa::path(
    put,
    path = "/portal/appointments/{appointment_id}/cancel",
    params(("appointment_id" = u64, Path, description = "Own appointment to cancel")),
    responses(
        (status = 200, description = "Appointment cancelled", body = Object),
        (status = 400, description = "Appointment can no longer be cancelled"),
        (status = 404, description = "Not found")
    ),
    tag = "Appointments"
)]
pub async fn cancel_appointment(
    session: Session,
    api: web::Data<dyn HrApi>,
    path: web::Path<u64>,
) -> PortalResult<HttpResponse> {
    let appointment_id = path.into_inner();
    let own = load_own(api.get_ref(), &session).await?;

    let current = own
        .iter()
        .find(|a| a.id == appointment_id)
        .ok_or_else(|| PortalError::not_found("Appointment not found"))?;
    if current.status != AppointmentStatus::Pending {
        return Err(PortalError::validation(format!(
            "Appointment is already {}",
            current.status
        )));
    }

    api.set_appointment_status(&session, appointment_id, AppointmentStatus::Cancelled)
        .await?;

    let rows = load_own(api.get_ref(), &session).await?;
    Ok(HttpResponse::Ok().json(Screen::with_toast(
        rows,
        Toast::info("Appointment cancelled"),
    )))
}

/* =========================
HR calendar
========================= */

async fn load_all(
    api: &dyn HrApi,
    session: &Session,
    filter: &AppointmentFilter,
) -> PortalResult<Vec<Appointment>> {
    let rows = api
        .appointments(session, filter.employee_id)
        .await?
        .into_iter()
        .filter(|a| filter.status.is_none_or(|s| a.status == s))
        .collect();
    Ok(sorted(rows))
}

#[utoipa::path(
    get,
    path = "/portal/admin/appointments",
    params(AppointmentFilter),
    responses(
        (status = 200, description = "All appointments", body = Object),
        (status = 403, description = "Forbidden")
    ),
    tag = "Appointments"
)]
pub async fn appointment_list(
    admin: AdminSession,
    api: web::Data<dyn HrApi>,
    filter: web::Query<AppointmentFilter>,
) -> PortalResult<HttpResponse> {
    let rows = load_all(api.get_ref(), &admin, &filter).await?;
    Ok(HttpResponse::Ok().json(Screen::show(rows)))
}

async fn respond(
    admin: AdminSession,
    api: web::Data<dyn HrApi>,
    appointment_id: u64,
    status: AppointmentStatus,
) -> PortalResult<HttpResponse> {
    api.set_appointment_status(&admin, appointment_id, status)
        .await?;
    info!(appointment_id, %status, "appointment answered");

    let all = AppointmentFilter {
        status: None,
        employee_id: None,
    };
    let rows = load_all(api.get_ref(), &admin, &all).await?;
    Ok(HttpResponse::Ok().json(Screen::with_toast(
        rows,
        Toast::success(format!("Appointment {}", status.to_string().to_lowercase())),
    )))
}

#[utoipa::path(
    put,
    path = "/portal/admin/appointments/{appointment_id}/accept",
    params(("appointment_id" = u64, Path, description = "Appointment to accept")),
    responses(
        (status = 200, description = "Appointment accepted", body = Object),
        (status = 403, description = "Forbidden")
    ),
    tag = "Appointments"
)]
pub async fn accept_appointment(
    admin: AdminSession,
    api: web::Data<dyn HrApi>,
    path: web::Path<u64>,
) -> PortalResult<HttpResponse> {
    respond(admin, api, path.into_inner(), AppointmentStatus::Accepted).await
}

#[utoipa::path(
    put,
    path = "/portal/admin/appointments/{appointment_id}/reject",
    params(("appointment_id" = u64, Path, description = "Appointment to reject")),
    responses(
        (status = 200, description = "Appointment rejected", body = Object),
        (status = 403, description = "Forbidden")
    ),
    tag = "Appointments"
)]
pub async fn reject_appointment(
    admin: AdminSession,
    api: web::Data<dyn HrApi>,
    path: web::Path<u64>,
) -> PortalResult<HttpResponse> {
    respond(admin, api, path.into_inner(), AppointmentStatus::Rejected).await
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/appointments")
            .route(web::get().to(my_appointments))
            .route(web::post().to(request_appointment)),
    )
    .service(
        web::resource("/appointments/{appointment_id}/cancel").route(web::put().to(cancel_appointment)),
    );
}

pub fn configure_admin(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/appointments").route(web::get().to(appointment_list)))
        .service(
            web::resource("/appointments/{appointment_id}/accept").route(web::put().to(accept_appointment)),
        )
        .service(
            web::resource("/appointments/{appointment_id}/reject").route(web::put().to(reject_appointment)),
        );
}
