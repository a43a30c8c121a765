//! Mapping between the backend's JSON and the portal's canonical models.
//!
//! The backend is inconsistent about casing (`employeeId` and `employee_id`
//! both occur), sends ids as numbers or strings and dates with or without a
//! time part. Incoming structs accept every spelling seen; outgoing bodies
//! are always camelCase.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    error::PortalError,
    model::{
        appointment::{Appointment, AppointmentStatus, NewAppointment},
        document::Document,
        employee::{Admission, Contract, ContractTerms, Employee},
        leave_request::{LeaveRequest, LeaveStatus, NewLeaveRequest},
        payslip::{Payslip, PayslipFetch, PayslipPeriod},
        role::Role,
        todo::{NewTodo, Todo, TodoPriority, TodoStatus},
        user::SessionUser,
    },
    utils::leave_days::inclusive_days_between,
};

fn malformed(message: impl Into<String>) -> PortalError {
    PortalError::Backend {
        status: 502,
        message: format!("unexpected response: {}", message.into()),
    }
}

/* =========================
Scalar helpers
========================= */

#[derive(Deserialize)]
#[serde(untagged)]
enum NumOrStr {
    Num(u64),
    Str(String),
}

impl NumOrStr {
    fn into_u64<E: serde::de::Error>(self) -> Result<u64, E> {
        match self {
            NumOrStr::Num(n) => Ok(n),
            NumOrStr::Str(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("invalid id {s:?}"))),
        }
    }
}

pub(crate) fn de_id<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    NumOrStr::deserialize(d)?.into_u64()
}

pub(crate) fn de_opt_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    match Option::<NumOrStr>::deserialize(d)? {
        Some(NumOrStr::Str(s)) if s.trim().is_empty() => Ok(None),
        Some(v) => v.into_u64().map(Some),
        None => Ok(None),
    }
}

/// Accepts `2024-01-05`, `2024-01-05T09:00:00`, `2024-01-05 09:00:00` and RFC 3339.
pub fn parse_wire_datetime(raw: &str) -> Result<NaiveDateTime, PortalError> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_local());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(dt);
        }
    }
    Err(malformed(format!("invalid date {raw:?}")))
}

pub fn parse_wire_date(raw: &str) -> Result<NaiveDate, PortalError> {
    parse_wire_datetime(raw).map(|dt| dt.date())
}

fn parse_opt_date(raw: Option<&str>) -> Result<Option<NaiveDate>, PortalError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_wire_date(s).map(Some),
    }
}

fn parse_wire_time(raw: &str) -> Result<NaiveTime, PortalError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| malformed(format!("invalid time {raw:?}")))
}

fn parse_enum<T: FromStr>(raw: &str, what: &str) -> Result<T, PortalError> {
    T::from_str(raw.trim()).map_err(|_| malformed(format!("unknown {what} {raw:?}")))
}

/* =========================
Auth
========================= */

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireUser {
    #[serde(deserialize_with = "de_id", alias = "userId", alias = "user_id")]
    pub id: u64,
    #[serde(default, alias = "firstName", alias = "first_name")]
    pub name: String,
    #[serde(default, alias = "lastName", alias = "last_name")]
    pub surname: String,
    pub role: String,
    #[serde(default, deserialize_with = "de_opt_id", alias = "employee_id")]
    pub employee_id: Option<u64>,
}

impl TryFrom<WireUser> for SessionUser {
    type Error = PortalError;

    fn try_from(w: WireUser) -> Result<Self, Self::Error> {
        Ok(SessionUser {
            id: w.id,
            name: w.name,
            surname: w.surname,
            role: parse_enum::<Role>(&w.role, "role")?,
            employee_id: w.employee_id,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct WireLoginResponse {
    #[serde(alias = "accessToken", alias = "access_token")]
    pub token: String,
    #[serde(default)]
    pub user: Option<WireUser>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBody<'a> {
    pub name: &'a str,
    pub surname: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetRequestBody<'a> {
    pub email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetBody<'a> {
    pub token: &'a str,
    pub new_password: &'a str,
}

/* =========================
Leave
========================= */

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireLeaveRequest {
    #[serde(deserialize_with = "de_id")]
    pub id: u64,
    #[serde(deserialize_with = "de_id", alias = "employee_id")]
    pub employee_id: u64,
    #[serde(alias = "start_date", alias = "leaveStart")]
    pub start_date: String,
    #[serde(alias = "end_date", alias = "leaveEnd")]
    pub end_date: String,
    #[serde(alias = "leave_type", alias = "type")]
    pub leave_type: String,
    #[serde(default)]
    pub reason: Option<String>,
    pub status: String,
}

impl TryFrom<WireLeaveRequest> for LeaveRequest {
    type Error = PortalError;

    fn try_from(w: WireLeaveRequest) -> Result<Self, Self::Error> {
        let start = parse_wire_datetime(&w.start_date)?;
        let end = parse_wire_datetime(&w.end_date)?;
        // Rows with an inverted range come from legacy data; show them with zero days.
        let total_days = inclusive_days_between(start, end).unwrap_or(0);
        Ok(LeaveRequest {
            id: w.id,
            employee_id: w.employee_id,
            start_date: start.date(),
            end_date: end.date(),
            leave_type: w.leave_type,
            reason: w.reason.filter(|r| !r.trim().is_empty()),
            status: parse_enum::<LeaveStatus>(&w.status, "leave status")?,
            total_days,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequestBody<'a> {
    pub employee_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub leave_type: String,
    pub reason: Option<&'a str>,
    pub total_days: u32,
}

impl<'a> From<&'a NewLeaveRequest> for LeaveRequestBody<'a> {
    fn from(r: &'a NewLeaveRequest) -> Self {
        Self {
            employee_id: r.employee_id,
            start_date: r.start_date,
            end_date: r.end_date,
            leave_type: r.leave_type.to_string(),
            reason: r.reason.as_deref(),
            total_days: r.total_days,
        }
    }
}

/// Status change for leave requests and appointments.
#[derive(Serialize)]
pub struct StatusBody {
    pub status: String,
}

/* =========================
Appointments
========================= */

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAppointment {
    #[serde(deserialize_with = "de_id")]
    pub id: u64,
    #[serde(deserialize_with = "de_id", alias = "employee_id")]
    pub employee_id: u64,
    #[serde(alias = "appointmentDate")]
    pub date: String,
    #[serde(alias = "start_time")]
    pub start_time: String,
    #[serde(alias = "end_time")]
    pub end_time: String,
    pub subject: String,
    pub status: String,
}

impl TryFrom<WireAppointment> for Appointment {
    type Error = PortalError;

    fn try_from(w: WireAppointment) -> Result<Self, Self::Error> {
        Ok(Appointment {
            id: w.id,
            employee_id: w.employee_id,
            date: parse_wire_date(&w.date)?,
            start_time: parse_wire_time(&w.start_time)?,
            end_time: parse_wire_time(&w.end_time)?,
            subject: w.subject,
            status: parse_enum::<AppointmentStatus>(&w.status, "appointment status")?,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentBody<'a> {
    pub employee_id: u64,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub subject: &'a str,
}

impl<'a> From<&'a NewAppointment> for AppointmentBody<'a> {
    fn from(a: &'a NewAppointment) -> Self {
        Self {
            employee_id: a.employee_id,
            date: a.date,
            start_time: a.start_time.format("%H:%M").to_string(),
            end_time: a.end_time.format("%H:%M").to_string(),
            subject: &a.subject,
        }
    }
}

/* =========================
Documents
========================= */

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDocument {
    #[serde(deserialize_with = "de_id")]
    pub id: u64,
    #[serde(deserialize_with = "de_id", alias = "employee_id")]
    pub employee_id: u64,
    #[serde(alias = "file_name", alias = "name")]
    pub file_name: String,
    #[serde(default, alias = "content_type")]
    pub content_type: Option<String>,
    #[serde(default, alias = "size", alias = "size_bytes")]
    pub size_bytes: Option<u64>,
    #[serde(default, alias = "uploaded_at", alias = "createdAt")]
    pub uploaded_at: Option<String>,
}

impl TryFrom<WireDocument> for Document {
    type Error = PortalError;

    fn try_from(w: WireDocument) -> Result<Self, Self::Error> {
        let uploaded_at = match w.uploaded_at.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_wire_datetime(raw)?.and_utc()),
        };
        Ok(Document {
            id: w.id,
            employee_id: w.employee_id,
            file_name: w.file_name,
            content_type: w.content_type,
            size_bytes: w.size_bytes,
            uploaded_at,
        })
    }
}

/* =========================
Payslips
========================= */

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePayslip {
    #[serde(deserialize_with = "de_id", alias = "employee_id")]
    pub employee_id: u64,
    pub year: i32,
    pub month: u32,
    #[serde(default, alias = "base_salary", alias = "grossSalary")]
    pub base_salary: f64,
    #[serde(default)]
    pub allowances: f64,
    #[serde(default)]
    pub bonus: f64,
    #[serde(default)]
    pub deductions: f64,
    #[serde(default)]
    pub tax: f64,
    #[serde(alias = "net_salary")]
    pub net_salary: Option<f64>,
    #[serde(default, alias = "generated_at")]
    pub generated_at: Option<String>,
    #[serde(default, alias = "artifact_url", alias = "pdfUrl", alias = "url")]
    pub artifact_url: Option<String>,
}

impl TryFrom<WirePayslip> for Payslip {
    type Error = PortalError;

    fn try_from(w: WirePayslip) -> Result<Self, Self::Error> {
        let period = PayslipPeriod::new(w.year, w.month).map_err(|e| malformed(e.to_string()))?;
        let net_salary = w
            .net_salary
            .unwrap_or(w.base_salary + w.allowances + w.bonus - w.deductions - w.tax);
        let generated_at = match w.generated_at.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_wire_datetime(raw)?.and_utc()),
        };
        Ok(Payslip {
            employee_id: w.employee_id,
            year: period.year,
            month: period.month,
            base_salary: w.base_salary,
            allowances: w.allowances,
            bonus: w.bonus,
            deductions: w.deductions,
            tax: w.tax,
            net_salary,
            generated_at,
            artifact_url: w.artifact_url,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePayslipFetch {
    #[serde(default, alias = "isReady", alias = "is_ready")]
    pub ready: bool,
    #[serde(default)]
    pub payslip: Option<WirePayslip>,
}

impl TryFrom<WirePayslipFetch> for PayslipFetch {
    type Error = PortalError;

    fn try_from(w: WirePayslipFetch) -> Result<Self, Self::Error> {
        let payslip = w.payslip.map(Payslip::try_from).transpose()?;
        Ok(PayslipFetch {
            ready: w.ready && payslip.is_some(),
            payslip,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePayslipBody {
    pub employee_id: u64,
    pub year: i32,
    pub month: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateByPositionBody<'a> {
    pub position: &'a str,
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireGenerateResult {
    #[serde(default, alias = "generated", alias = "count")]
    pub generated_count: u32,
}

/* =========================
To-do
========================= */

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTodo {
    #[serde(deserialize_with = "de_id")]
    pub id: u64,
    #[serde(deserialize_with = "de_id", alias = "employee_id")]
    pub employee_id: u64,
    pub title: String,
    #[serde(default, alias = "due_date")]
    pub due_date: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl TryFrom<WireTodo> for Todo {
    type Error = PortalError;

    fn try_from(w: WireTodo) -> Result<Self, Self::Error> {
        let priority = match w.priority.as_deref() {
            Some(p) if !p.trim().is_empty() => parse_enum::<TodoPriority>(p, "priority")?,
            _ => TodoPriority::Medium,
        };
        let status = match w.status.as_deref() {
            Some(s) if !s.trim().is_empty() => parse_enum::<TodoStatus>(s, "to-do status")?,
            _ => TodoStatus::Pending,
        };
        Ok(Todo {
            id: w.id,
            employee_id: w.employee_id,
            title: w.title,
            due_date: parse_opt_date(w.due_date.as_deref())?,
            priority,
            status,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub employee_id: u64,
    pub title: &'a str,
    pub due_date: Option<NaiveDate>,
    pub priority: String,
    pub status: String,
}

impl<'a> From<&'a NewTodo> for TodoBody<'a> {
    fn from(t: &'a NewTodo) -> Self {
        Self {
            id: None,
            employee_id: t.employee_id,
            title: &t.title,
            due_date: t.due_date,
            priority: t.priority.to_string(),
            status: TodoStatus::Pending.to_string(),
        }
    }
}

impl<'a> From<&'a Todo> for TodoBody<'a> {
    fn from(t: &'a Todo) -> Self {
        Self {
            id: Some(t.id),
            employee_id: t.employee_id,
            title: &t.title,
            due_date: t.due_date,
            priority: t.priority.to_string(),
            status: t.status.to_string(),
        }
    }
}

/* =========================
HR admin
========================= */

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEmployee {
    #[serde(deserialize_with = "de_id", alias = "employeeId", alias = "employee_id")]
    pub id: u64,
    #[serde(default, alias = "employee_code")]
    pub employee_code: Option<String>,
    #[serde(alias = "firstName", alias = "first_name")]
    pub name: String,
    #[serde(default, alias = "lastName", alias = "last_name")]
    pub surname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "jobTitle")]
    pub position: Option<String>,
    #[serde(default, alias = "hire_date")]
    pub hire_date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl TryFrom<WireEmployee> for Employee {
    type Error = PortalError;

    fn try_from(w: WireEmployee) -> Result<Self, Self::Error> {
        Ok(Employee {
            id: w.id,
            employee_code: w.employee_code,
            name: w.name,
            surname: w.surname,
            email: w.email,
            position: w.position,
            hire_date: parse_opt_date(w.hire_date.as_deref())?,
            status: w.status.map(|s| s.to_lowercase()),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireContract {
    #[serde(deserialize_with = "de_id", alias = "employee_id")]
    pub employee_id: u64,
    pub position: String,
    #[serde(alias = "contract_type", alias = "type")]
    pub contract_type: String,
    #[serde(alias = "start_date")]
    pub start_date: String,
    #[serde(default, alias = "end_date")]
    pub end_date: Option<String>,
    #[serde(alias = "base_salary", alias = "salary")]
    pub base_salary: f64,
    #[serde(default, alias = "weekly_hours")]
    pub weekly_hours: Option<f32>,
}

impl TryFrom<WireContract> for Contract {
    type Error = PortalError;

    fn try_from(w: WireContract) -> Result<Self, Self::Error> {
        Ok(Contract {
            employee_id: w.employee_id,
            position: w.position,
            contract_type: w.contract_type,
            start_date: parse_wire_date(&w.start_date)?,
            end_date: parse_opt_date(w.end_date.as_deref())?,
            base_salary: w.base_salary,
            weekly_hours: w.weekly_hours,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractBody<'a> {
    pub position: &'a str,
    pub contract_type: &'a str,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub base_salary: f64,
    pub weekly_hours: Option<f32>,
}

impl<'a> From<&'a ContractTerms> for ContractBody<'a> {
    fn from(t: &'a ContractTerms) -> Self {
        Self {
            position: &t.position,
            contract_type: &t.contract_type,
            start_date: t.start_date,
            end_date: t.end_date,
            base_salary: t.base_salary,
            weekly_hours: t.weekly_hours,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionBody<'a> {
    pub name: &'a str,
    pub surname: &'a str,
    pub email: &'a str,
    pub hire_date: NaiveDate,
    pub contract: ContractBody<'a>,
}

impl<'a> From<&'a Admission> for AdmissionBody<'a> {
    fn from(a: &'a Admission) -> Self {
        Self {
            name: &a.name,
            surname: &a.surname,
            email: &a.email,
            hire_date: a.hire_date,
            contract: ContractBody::from(&a.terms),
        }
    }
}

/// Positions come back either as plain strings or as `{ "name": ... }` objects.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WirePosition {
    Name(String),
    Object {
        #[serde(alias = "title", alias = "position")]
        name: String,
    },
}

impl From<WirePosition> for String {
    fn from(p: WirePosition) -> Self {
        match p {
            WirePosition::Name(name) | WirePosition::Object { name } => name,
        }
    }
}

/// Maps a list of wire rows, failing on the first malformed one.
pub fn map_all<W, T>(rows: Vec<W>) -> Result<Vec<T>, PortalError>
where
    T: TryFrom<W, Error = PortalError>,
{
    rows.into_iter().map(T::try_from).collect()
}
