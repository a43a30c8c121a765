use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::{auth::AdminSession, session::Session},
    backend::HrApi,
    error::{PortalError, PortalResult},
    model::leave_request::{LeaveRequest, LeaveStatus, LeaveType, NewLeaveRequest},
    models::{Screen, Toast},
    utils::leave_days::inclusive_days,
};

const MAX_REASON_LEN: usize = 500;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "2024-01-01")]
    pub start_date: NaiveDate,
    #[schema(example = "2024-01-05")]
    pub end_date: NaiveDate,
    #[schema(example = "annual")]
    pub leave_type: LeaveType, // enum ensures Swagger dropdown
    #[schema(example = "Family trip")]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    /// Filter by leave status
    pub status: Option<LeaveStatus>,
    /// Filter by employee ID
    pub employee_id: Option<u64>,
}

/// Validates the form and computes the day count.
pub fn validate_leave(employee_id: u64, form: CreateLeave) -> PortalResult<NewLeaveRequest> {
    let total_days = inclusive_days(form.start_date, form.end_date)?;

    let reason = form
        .reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());
    if reason.as_ref().is_some_and(|r| r.chars().count() > MAX_REASON_LEN) {
        return Err(PortalError::validation(format!(
            "Reason must be at most {MAX_REASON_LEN} characters"
        )));
    }

    Ok(NewLeaveRequest {
        employee_id,
        start_date: form.start_date,
        end_date: form.end_date,
        leave_type: form.leave_type,
        reason,
        total_days,
    })
}

/// Loads the signed-in employee's requests, newest first.
pub async fn load_own(api: &dyn HrApi, session: &Session) -> PortalResult<Vec<LeaveRequest>> {
    let mut rows = api
        .employee_leave_requests(session, session.employee_id()?)
        .await?;
    rows.sort_by(|a, b| b.start_date.cmp(&a.start_date));
    Ok(rows)
}

/// Loads every request, pending ones first.
pub async fn load_all(
    api: &dyn HrApi,
    session: &Session,
    filter: &LeaveFilter,
) -> PortalResult<Vec<LeaveRequest>> {
    let mut rows: Vec<LeaveRequest> = api
        .all_leave_requests(session)
        .await?
        .into_iter()
        .filter(|r| filter.status.is_none_or(|s| r.status == s))
        .filter(|r| filter.employee_id.is_none_or(|id| r.employee_id == id))
        .collect();
    rows.sort_by_key(|r| (r.status != LeaveStatus::Pending, r.start_date));
    Ok(rows)
}

/* =========================
Employee leave screen
========================= */

#[utoipa::path(
    get,
    path = "/portal/leave",
    responses(
        (status = 200, description = "Own leave requests", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    tag = "Leave"
)]
pub async fn my_leave(session: Session, api: web::Data<dyn HrApi>) -> PortalResult<HttpResponse> {
    let rows = load_own(api.get_ref(), &session).await?;
    Ok(HttpResponse::Ok().json(Screen::show(rows)))
}

#[utoipa::path(
    post,
    path = "/portal/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave request submitted; refreshed list", body = Object,
         example = json!({
            "data": [],
            "toast": { "level": "success", "message": "Leave request submitted for 5 day(s)" }
         })
        ),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    session: Session,
    api: web::Data<dyn HrApi>,
    payload: web::Json<CreateLeave>,
) -> PortalResult<HttpResponse> {
    let request = validate_leave(session.employee_id()?, payload.into_inner())?;

    api.submit_leave_request(&session, &request).await?;
    info!(
        employee_id = request.employee_id,
        days = request.total_days,
        "leave request submitted"
    );

    let rows = load_own(api.get_ref(), &session).await?;
    Ok(HttpResponse::Ok().json(Screen::with_toast(
        rows,
        Toast::success(format!(
            "Leave request submitted for {} day(s)",
            request.total_days
        )),
    )))
}

/* =========================
Approvals (HR/Admin)
========================= */

#[utoipa::path(
    get,
    path = "/portal/admin/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "All leave requests", body = Object),
        (status = 403, description = "Forbidden")
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    admin: AdminSession,
    api: web::Data<dyn HrApi>,
    filter: web::Query<LeaveFilter>,
) -> PortalResult<HttpResponse> {
    let rows = load_all(api.get_ref(), &admin, &filter).await?;
    Ok(HttpResponse::Ok().json(Screen::show(rows)))
}

async fn decide(
    admin: AdminSession,
    api: web::Data<dyn HrApi>,
    leave_id: u64,
    status: LeaveStatus,
) -> PortalResult<HttpResponse> {
    let current = api
        .all_leave_requests(&admin)
        .await?
        .into_iter()
        .find(|r| r.id == leave_id);
    match current {
        Some(r) if r.status == LeaveStatus::Pending => {}
        _ => {
            return Err(PortalError::validation(
                "Leave request not found or already processed",
            ));
        }
    }

    api.set_leave_status(&admin, leave_id, status).await?;
    info!(leave_id, %status, decided_by = admin.user.id, "leave request decided");

    let rows = load_all(
        api.get_ref(),
        &admin,
        &LeaveFilter {
            status: None,
            employee_id: None,
        },
    )
    .await?;
    let verb = match status {
        LeaveStatus::Approved => "approved",
        _ => "denied",
    };
    Ok(HttpResponse::Ok().json(Screen::with_toast(
        rows,
        Toast::success(format!("Leave {verb}")),
    )))
}

#[utoipa::path(
    put,
    path = "/portal/admin/leave/{leave_id}/approve",
    params(("leave_id" = u64, Path, description = "ID of the leave request to approve")),
    responses(
        (status = 200, description = "Leave approved", body = Object),
        (status = 400, description = "Leave request not found or already processed"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    admin: AdminSession,
    api: web::Data<dyn HrApi>,
    path: web::Path<u64>,
) -> PortalResult<HttpResponse> {
    decide(admin, api, path.into_inner(), LeaveStatus::Approved).await
}

#[utoipa::path(
    put,
    path = "/portal/admin/leave/{leave_id}/deny",
    params(("leave_id" = u64, Path, description = "ID of the leave request to deny")),
    responses(
        (status = 200, description = "Leave denied", body = Object),
        (status = 400, description = "Leave request not found or already processed"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Leave"
)]
pub async fn deny_leave(
    admin: AdminSession,
    api: web::Data<dyn HrApi>,
    path: web::Path<u64>,
) -> PortalResult<HttpResponse> {
    decide(admin, api, path.into_inner(), LeaveStatus::Denied).await
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/leave")
            .route(web::get().to(my_leave))
            .route(web::post().to(create_leave)),
    );
}

pub fn configure_admin(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/leave").route(web::get().to(leave_list)))
        .service(web::resource("/leave/{leave_id}/approve").route(web::put().to(approve_leave)))
        .service(web::resource("/leave/{leave_id}/deny").route(web::put().to(deny_leave)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::session::SessionStore,
        backend::api::MockHrApi,
        config::Config,
        test_support::{admin_user, employee_user, signed_in},
    };
    use actix_web::{http::StatusCode, test as actix_test};
    use serde_json::{Value, json};

    fn row(id: u64, status: LeaveStatus) -> LeaveRequest {
        LeaveRequest {
            id,
            employee_id: 1000,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            leave_type: "Annual".into(),
            reason: None,
            status,
            total_days: 5,
        }
    }

    fn routes(cfg: &mut web::ServiceConfig) {
        configure(cfg);
        cfg.service(web::scope("/admin").configure(configure_admin));
    }

    #[test]
    fn validation_computes_inclusive_days() {
        let form = CreateLeave {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            leave_type: LeaveType::Annual,
            reason: Some("  ".into()),
        };
        let request = validate_leave(1000, form).unwrap();
        assert_eq!(request.total_days, 5);
        assert_eq!(request.reason, None);
    }

    #[actix_web::test]
    async fn submit_sends_day_count_and_refreshes() {
        let mut api = MockHrApi::new();
        api.expect_submit_leave_request()
            .withf(|_, request| request.total_days == 1 && request.employee_id == 1000)
            .times(1)
            .returning(|_, _| Ok(()));
        api.expect_employee_leave_requests()
            .times(1)
            .returning(|_, _| Ok(vec![row(1, LeaveStatus::Pending)]));
        let store = SessionStore::new(&Config::default());
        let (_, cookie) = signed_in(&store, employee_user()).await;
        let app = portal_service!(api, store, routes);

        let req = actix_test::TestRequest::post()
            .uri("/portal/leave")
            .cookie(cookie)
            .set_json(json!({
                "start_date": "2024-01-01",
                "end_date": "2024-01-01",
                "leave_type": "sick"
            }))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["data"][0]["status"], "pending");
        assert_eq!(body["toast"]["level"], "success");
    }

    #[actix_web::test]
    async fn inverted_dates_are_rejected_before_backend() {
        let api = MockHrApi::new();
        let store = SessionStore::new(&Config::default());
        let (_, cookie) = signed_in(&store, employee_user()).await;
        let app = portal_service!(api, store, routes);

        let req = actix_test::TestRequest::post()
            .uri("/portal/leave")
            .cookie(cookie)
            .set_json(json!({
                "start_date": "2024-01-05",
                "end_date": "2024-01-01",
                "leave_type": "annual"
            }))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn employees_cannot_approve() {
        let api = MockHrApi::new();
        let store = SessionStore::new(&Config::default());
        let (_, cookie) = signed_in(&store, employee_user()).await;
        let app = portal_service!(api, store, routes);

        let req = actix_test::TestRequest::put()
            .uri("/portal/admin/leave/1/approve")
            .cookie(cookie)
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn approving_processed_request_is_rejected() {
        let mut api = MockHrApi::new();
        api.expect_all_leave_requests()
            .times(1)
            .returning(|_| Ok(vec![row(1, LeaveStatus::Denied)]));
        let store = SessionStore::new(&Config::default());
        let (_, cookie) = signed_in(&store, admin_user()).await;
        let app = portal_service!(api, store, routes);

        let req = actix_test::TestRequest::put()
            .uri("/portal/admin/leave/1/approve")
            .cookie(cookie)
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn admin_approves_pending_request() {
        let mut api = MockHrApi::new();
        api.expect_all_leave_requests()
            .times(2)
            .returning(|_| Ok(vec![row(1, LeaveStatus::Pending), row(2, LeaveStatus::Approved)]));
        api.expect_set_leave_status()
            .withf(|_, id, status| *id == 1 && *status == LeaveStatus::Approved)
            .times(1)
            .returning(|_, _, _| Ok(()));
        let store = SessionStore::new(&Config::default());
        let (_, cookie) = signed_in(&store, admin_user()).await;
        let app = portal_service!(api, store, routes);

        let req = actix_test::TestRequest::put()
            .uri("/portal/admin/leave/1/approve")
            .cookie(cookie)
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["toast"]["message"], "Leave approved");
        // pending rows are listed first
        assert_eq!(body["data"][0]["id"], 1);
    }
}
