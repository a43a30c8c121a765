//! HR console: staff list, admission, contracts, offboarding.
//!
//! Every handler here takes an [`AdminSession`], so employees get 403 before
//! the backend is asked anything.

use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::auth::AdminSession,
    backend::HrApi,
    error::{PortalError, PortalResult},
    model::employee::{Admission, Contract, ContractTerms, Employee},
    models::{Screen, Toast},
};

const MAX_WEEKLY_HOURS: f32 = 168.0;

#[derive(Debug, Deserialize, IntoParams)]
pub struct EmployeeSearch {
    /// Case-insensitive match on name, surname, e-mail or employee code
    pub q: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdmissionForm {
    #[schema(example = "John")]
    pub name: String,
    #[schema(example = "Doe")]
    pub surname: String,
    #[schema(example = "john.doe@company.com")]
    pub email: String,
    #[schema(example = "2024-01-01")]
    pub hire_date: NaiveDate,
    pub contract: ContractTerms,
}

pub fn validate_terms(mut terms: ContractTerms) -> PortalResult<ContractTerms> {
    terms.position = terms.position.trim().to_string();
    terms.contract_type = terms.contract_type.trim().to_string();

    if terms.position.is_empty() {
        return Err(PortalError::validation("Position is required"));
    }
    if terms.contract_type.is_empty() {
        return Err(PortalError::validation("Contract type is required"));
    }
    if !terms.base_salary.is_finite() || terms.base_salary < 0.0 {
        return Err(PortalError::validation("Base salary cannot be negative"));
    }
    if terms.end_date.is_some_and(|end| end < terms.start_date) {
        return Err(PortalError::validation(
            "Contract end date cannot be before its start date",
        ));
    }
    if terms
        .weekly_hours
        .is_some_and(|h| !(0.0..=MAX_WEEKLY_HOURS).contains(&h))
    {
        return Err(PortalError::validation("Weekly hours must be between 0 and 168"));
    }
    Ok(terms)
}

impl AdmissionForm {
    fn validate(self) -> PortalResult<Admission> {
        let name = self.name.trim().to_string();
        let surname = self.surname.trim().to_string();
        let email = self.email.trim().to_string();
        if name.is_empty() || surname.is_empty() {
            return Err(PortalError::validation("Name and surname are required"));
        }
        if !email.contains('@') {
            return Err(PortalError::validation("A valid e-mail address is required"));
        }
        Ok(Admission {
            name,
            surname,
            email,
            hire_date: self.hire_date,
            terms: validate_terms(self.contract)?,
        })
    }
}

fn matches(employee: &Employee, needle: &str) -> bool {
    [
        Some(employee.name.as_str()),
        Some(employee.surname.as_str()),
        Some(employee.email.as_str()),
        employee.employee_code.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(needle))
}

async fn load_employees(
    api: &dyn HrApi,
    admin: &AdminSession,
    search: Option<&str>,
) -> PortalResult<Vec<Employee>> {
    let needle = search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());
    let mut rows: Vec<Employee> = api
        .employees(admin)
        .await?
        .into_iter()
        .filter(|e| needle.as_deref().is_none_or(|n| matches(e, n)))
        .collect();
    rows.sort_by(|a, b| (&a.surname, &a.name).cmp(&(&b.surname, &b.name)));
    Ok(rows)
}

#[utoipa::path(
    get,
    path = "/portal/admin/employees",
    params(EmployeeSearch),
    responses(
        (status = 200, description = "Staff list", body = Object),
        (status = 403, description = "Forbidden")
    ),
    tag = "HrAdmin"
)]
pub async fn employee_list(
    admin: AdminSession,
    api: web::Data<dyn HrApi>,
    search: web::Query<EmployeeSearch>,
) -> PortalResult<HttpResponse> {
    let rows = load_employees(api.get_ref(), &admin, search.q.as_deref()).await?;
    Ok(HttpResponse::Ok().json(Screen::show(rows)))
}

#[utoipa::path(
    post,
    path = "/portal/admin/employees",
    request_body = AdmissionForm,
    responses(
        (status = 201, description = "Employee admitted", body = Object),
        (status = 400, description = "Invalid form"),
        (status = 403, description = "Forbidden")
    ),
    tag = "HrAdmin"
)]
pub async fn admit_employee(
    admin: AdminSession,
    api: web::Data<dyn HrApi>,
    payload: web::Json<AdmissionForm>,
) -> PortalResult<HttpResponse> {
    let admission = payload.into_inner().validate()?;

    let employee = api.admit_employee(&admin, &admission).await?;
    info!(employee_id = employee.id, admitted_by = admin.user.id, "employee admitted");

    Ok(HttpResponse::Created().json(Screen::with_toast(
        employee,
        Toast::success(format!("{} {} admitted", admission.name, admission.surname)),
    )))
}

#[utoipa::path(
    delete,
    path = "/portal/admin/employees/{employee_id}",
    params(("employee_id" = u64, Path, description = "Employee to offboard")),
    responses(
        (status = 200, description = "Offboarded; refreshed staff list", body = Object),
        (status = 404, description = "Not found"),
        (status = 403, description = "Forbidden")
    ),
    tag = "HrAdmin"
)]
pub async fn offboard_employee(
    admin: AdminSession,
    api: web::Data<dyn HrApi>,
    path: web::Path<u64>,
) -> PortalResult<HttpResponse> {
    let employee_id = path.into_inner();
    if admin.user.employee_id == Some(employee_id) {
        return Err(PortalError::validation("You cannot offboard yourself"));
    }

    api.offboard_employee(&admin, employee_id).await?;
    warn!(employee_id, offboarded_by = admin.user.id, "employee offboarded");

    let rows = load_employees(api.get_ref(), &admin, None).await?;
    Ok(HttpResponse::Ok().json(Screen::with_toast(
        rows,
        Toast::info("Employee offboarded"),
    )))
}

#[utoipa::path(
    get,
    path = "/portal/admin/employees/{employee_id}/contract",
    params(("employee_id" = u64, Path, description = "Employee whose contract to view")),
    responses(
        (status = 200, description = "Current contract", body = Object),
        (status = 404, description = "No contract")
    ),
    tag = "HrAdmin"
)]
pub async fn view_contract(
    admin: AdminSession,
    api: web::Data<dyn HrApi>,
    path: web::Path<u64>,
) -> PortalResult<HttpResponse> {
    let contract = api.contract(&admin, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(Screen::show(contract)))
}

#[utoipa::path(
    put,
    path = "/portal/admin/employees/{employee_id}/contract",
    params(("employee_id" = u64, Path, description = "Employee whose contract to edit")),
    request_body = ContractTerms,
    responses(
        (status = 200, description = "Contract saved", body = Object),
        (status = 400, description = "Invalid terms")
    ),
    tag = "HrAdmin"
)]
pub async fn edit_contract(
    admin: AdminSession,
    api: web::Data<dyn HrApi>,
    path: web::Path<u64>,
    payload: web::Json<ContractTerms>,
) -> PortalResult<HttpResponse> {
    let employee_id = path.into_inner();
    let terms = validate_terms(payload.into_inner())?;

    api.update_contract(&admin, employee_id, &terms).await?;
    info!(employee_id, position = %terms.position, "contract updated");

    Ok(HttpResponse::Ok().json(Screen::with_toast(
        Contract::from_terms(employee_id, terms),
        Toast::success("Contract saved"),
    )))
}

#[utoipa::path(
    get,
    path = "/portal/admin/positions",
    responses(
        (status = 200, description = "Positions known to HR", body = Object),
        (status = 403, description = "Forbidden")
    ),
    tag = "HrAdmin"
)]
pub async fn position_list(
    admin: AdminSession,
    api: web::Data<dyn HrApi>,
) -> PortalResult<HttpResponse> {
    let mut positions = api.positions(&admin).await?;
    positions.sort();
    positions.dedup();
    Ok(HttpResponse::Ok().json(Screen::show(positions)))
}

pub fn configure_admin(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/employees")
            .route(web::get().to(employee_list))
            .route(web::post().to(admit_employee)),
    )
    .service(web::resource("/employees/{employee_id}").route(web::delete().to(offboard_employee)))
    .service(
        web::resource("/employees/{employee_id}/contract")
            .route(web::get().to(view_contract))
            .route(web::put().to(edit_contract)),
    )
    .service(web::resource("/positions").route(web::get().to(position_list)));
}
