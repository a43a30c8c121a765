use crate::api::appointment::CreateAppointment;
use crate::api::hr_admin::AdmissionForm;
use crate::api::leave_request::{CreateLeave, LeaveFilter};
use crate::api::payslip::{GenerateForPosition, GeneratePayslip};
use crate::api::todo::{CreateTodo, UpdateTodo};
use crate::auth::session::SESSION_COOKIE;
use crate::model::appointment::{Appointment, AppointmentStatus};
use crate::model::document::Document;
use crate::model::employee::{Contract, ContractTerms, Employee};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};
use crate::model::payslip::{Payslip, PayslipPeriod};
use crate::model::role::Role;
use crate::model::todo::{Todo, TodoPriority, TodoStatus};
use crate::model::user::SessionUser;
use crate::models::{
    LoginReqDto, LoginResponse, PasswordResetConfirm, PasswordResetRequest, RegisterReq, Toast,
    ToastLevel,
};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HR Portal API",
        version = "1.0.0",
        description = r#"
## HR Self-Service Portal

Screen endpoints behind the HR portal's browser front end. Every call is
forwarded to the HR backend with the signed-in user's token.

### Screens
- **Leave**: own requests with computed day count, HR approvals
- **Appointments**: request and cancel meetings with HR, HR calendar
- **Documents**: upload, download and delete personal files
- **Payslips**: own payslips, payroll run with read-back polling
- **To-do**: personal task list
- **HR admin**: staff list, admission, contracts, offboarding

### Session
Sign in at `/auth/login`. The response sets an HttpOnly `hr_session` cookie;
the backend token never reaches the browser. Admins land on `/admin`,
everyone else on `/home`.

### Response Format
Screens answer `{ "data": ..., "toast": { "level", "message" } }`.
Failures answer `{ "toast": { "level": "error", "message" }, "kind" }`.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::register,
        crate::auth::handlers::logout,
        crate::auth::handlers::request_password_reset,
        crate::auth::handlers::confirm_password_reset,
        crate::auth::handlers::me,

        crate::api::leave_request::my_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::deny_leave,

        crate::api::appointment::my_appointments,
        crate::api::appointment::request_appointment,
        crate::api::appointment::cancel_appointment,
        crate::api::appointment::appointment_list,
        crate::api::appointment::accept_appointment,
        crate::api::appointment::reject_appointment,

        crate::api::document::my_documents,
        crate::api::document::upload_document,
        crate::api::document::download_document,
        crate::api::document::delete_document,
        crate::api::document::employee_documents,
        crate::api::document::upload_employee_document,

        crate::api::payslip::my_payslips,
        crate::api::payslip::view_payslip,
        crate::api::payslip::resume_poll,
        crate::api::payslip::cancel_poll,
        crate::api::payslip::generate_payslip,
        crate::api::payslip::generate_for_position,

        crate::api::todo::list_todos,
        crate::api::todo::create_todo,
        crate::api::todo::update_todo,
        crate::api::todo::delete_todo,

        crate::api::hr_admin::employee_list,
        crate::api::hr_admin::admit_employee,
        crate::api::hr_admin::offboard_employee,
        crate::api::hr_admin::view_contract,
        crate::api::hr_admin::edit_contract,
        crate::api::hr_admin::position_list
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            RegisterReq,
            PasswordResetRequest,
            PasswordResetConfirm,
            SessionUser,
            Role,
            Toast,
            ToastLevel,
            CreateLeave,
            LeaveFilter,
            LeaveRequest,
            LeaveStatus,
            LeaveType,
            CreateAppointment,
            Appointment,
            AppointmentStatus,
            Document,
            GeneratePayslip,
            GenerateForPosition,
            Payslip,
            PayslipPeriod,
            CreateTodo,
            UpdateTodo,
            Todo,
            TodoPriority,
            TodoStatus,
            AdmissionForm,
            Employee,
            Contract,
            ContractTerms
        )
    ),
    modifiers(&SessionCookie),
    security(("session_cookie" = [])),
    tags(
        (name = "Auth", description = "Sign-in, registration and password reset"),
        (name = "Leave", description = "Leave requests and approvals"),
        (name = "Appointments", description = "Appointments with HR"),
        (name = "Documents", description = "Personal documents"),
        (name = "Payslips", description = "Payslips and payroll runs"),
        (name = "ToDo", description = "Personal to-do list"),
        (name = "HrAdmin", description = "HR console"),
    )
)]
pub struct ApiDoc;

struct SessionCookie;

impl Modify for SessionCookie {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE))),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_screen_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/auth/login",
            "/portal/leave",
            "/portal/admin/payslips/generate",
            "/portal/payslips/{employee_id}/{year}/{month}/poll",
            "/portal/admin/employees/{employee_id}/contract",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
    }
}
