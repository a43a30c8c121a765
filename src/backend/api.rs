use async_trait::async_trait;

use crate::{
    auth::session::Session,
    error::PortalResult,
    model::{
        appointment::{Appointment, AppointmentStatus, NewAppointment},
        document::{Document, DocumentContent, NewDocument},
        employee::{Admission, Contract, ContractTerms, Employee},
        leave_request::{LeaveRequest, LeaveStatus, NewLeaveRequest},
        payslip::{Payslip, PayslipFetch, PayslipPeriod},
        todo::{NewTodo, Todo},
    },
    models::{LoginGrant, LoginReqDto, PasswordResetConfirm, RegisterReq},
};

/// Everything the screens need from the HR backend.
///
/// Calls that act for a signed-in user take the [`Session`] explicitly; its
/// token becomes the bearer of the outgoing request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HrApi: Send + Sync {
    // auth
    async fn login(&self, credentials: &LoginReqDto) -> PortalResult<LoginGrant>;
    async fn register(&self, user: &RegisterReq) -> PortalResult<()>;
    async fn request_password_reset(&self, email: &str) -> PortalResult<()>;
    async fn confirm_password_reset(&self, reset: &PasswordResetConfirm) -> PortalResult<()>;

    // leave
    async fn employee_leave_requests(
        &self,
        session: &Session,
        employee_id: u64,
    ) -> PortalResult<Vec<LeaveRequest>>;
    async fn all_leave_requests(&self, session: &Session) -> PortalResult<Vec<LeaveRequest>>;
    async fn submit_leave_request(
        &self,
        session: &Session,
        request: &NewLeaveRequest,
    ) -> PortalResult<()>;
    async fn set_leave_status(
        &self,
        session: &Session,
        leave_id: u64,
        status: LeaveStatus,
    ) -> PortalResult<()>;

    // appointments
    async fn appointments(
        &self,
        session: &Session,
        employee_id: Option<u64>,
    ) -> PortalResult<Vec<Appointment>>;
    async fn create_appointment(
        &self,
        session: &Session,
        appointment: &NewAppointment,
    ) -> PortalResult<()>;
    async fn set_appointment_status(
        &self,
        session: &Session,
        appointment_id: u64,
        status: AppointmentStatus,
    ) -> PortalResult<()>;

    // documents
    async fn documents(&self, session: &Session, employee_id: u64) -> PortalResult<Vec<Document>>;
    async fn upload_document(&self, session: &Session, document: NewDocument) -> PortalResult<()>;
    async fn download_document(
        &self,
        session: &Session,
        document_id: u64,
    ) -> PortalResult<DocumentContent>;
    async fn delete_document(&self, session: &Session, document_id: u64) -> PortalResult<()>;

    // payslips
    async fn payslips(&self, session: &Session, employee_id: u64) -> PortalResult<Vec<Payslip>>;
    async fn generate_payslip(
        &self,
        session: &Session,
        employee_id: u64,
        period: PayslipPeriod,
    ) -> PortalResult<()>;
    /// Bulk generation for every employee holding `position`. Returns how many were queued.
    async fn generate_payslips_for_position(
        &self,
        session: &Session,
        position: &str,
        period: PayslipPeriod,
    ) -> PortalResult<u32>;
    async fn fetch_payslip(
        &self,
        session: &Session,
        employee_id: u64,
        period: PayslipPeriod,
    ) -> PortalResult<PayslipFetch>;

    // to-do
    async fn todos(&self, session: &Session, employee_id: u64) -> PortalResult<Vec<Todo>>;
    async fn create_todo(&self, session: &Session, todo: &NewTodo) -> PortalResult<()>;
    async fn update_todo(&self, session: &Session, todo: &Todo) -> PortalResult<()>;
    async fn delete_todo(&self, session: &Session, todo_id: u64) -> PortalResult<()>;

    // HR admin
    async fn employees(&self, session: &Session) -> PortalResult<Vec<Employee>>;
    async fn admit_employee(
        &self,
        session: &Session,
        admission: &Admission,
    ) -> PortalResult<Employee>;
    async fn contract(&self, session: &Session, employee_id: u64) -> PortalResult<Contract>;
    async fn update_contract(
        &self,
        session: &Session,
        employee_id: u64,
        terms: &ContractTerms,
    ) -> PortalResult<()>;
    async fn offboard_employee(&self, session: &Session, employee_id: u64) -> PortalResult<()>;
    async fn positions(&self, session: &Session) -> PortalResult<Vec<String>>;
}
