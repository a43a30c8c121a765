use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, multipart};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::api::HrApi;
use super::wire::{
    AdmissionBody, AppointmentBody, ContractBody, GenerateByPositionBody, GeneratePayslipBody,
    LeaveRequestBody, LoginBody, PasswordResetBody, PasswordResetRequestBody, RegisterBody,
    StatusBody, TodoBody, WireAppointment, WireContract, WireDocument, WireEmployee,
    WireGenerateResult, WireLeaveRequest, WireLoginResponse, WirePayslip, WirePayslipFetch,
    WirePosition, WireTodo, map_all,
};
use crate::{
    auth::session::Session,
    config::Config,
    error::{PortalError, PortalResult},
    model::{
        appointment::{Appointment, AppointmentStatus, NewAppointment},
        document::{Document, DocumentContent, NewDocument},
        employee::{Admission, Contract, ContractTerms, Employee},
        leave_request::{LeaveRequest, LeaveStatus, NewLeaveRequest},
        payslip::{Payslip, PayslipFetch, PayslipPeriod},
        todo::{NewTodo, Todo},
        user::SessionUser,
    },
    models::{LoginGrant, LoginReqDto, PasswordResetConfirm, RegisterReq},
};

/// HTTP client for the HR backend. Stateless apart from the connection pool.
#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(config: &Config) -> PortalResult<Self> {
        let http = Client::builder()
            .user_agent(concat!("hr-portal/", env!("CARGO_PKG_VERSION")))
            .timeout(config.backend_timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: config.backend_base_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Starts a request. The bearer header is set only when a session is given.
    pub(crate) fn request(
        &self,
        method: Method,
        path: &str,
        session: Option<&Session>,
    ) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match session {
            Some(session) => builder.bearer_auth(&session.token),
            None => builder,
        }
    }

    async fn send(builder: RequestBuilder) -> PortalResult<Response> {
        let response = builder.send().await?;
        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "backend responded");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
        warn!(status = status.as_u16(), %message, "backend call failed");

        Err(match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY | StatusCode::CONFLICT => {
                PortalError::Validation { message }
            }
            StatusCode::UNAUTHORIZED => PortalError::Unauthorized { message },
            StatusCode::FORBIDDEN => PortalError::Forbidden { message },
            StatusCode::NOT_FOUND => PortalError::NotFound { message },
            other => PortalError::Backend {
                status: other.as_u16(),
                message,
            },
        })
    }

    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> PortalResult<T> {
        let response = Self::send(builder).await?;
        response.json::<T>().await.map_err(|e| PortalError::Backend {
            status: 502,
            message: format!("unexpected response: {e}"),
        })
    }

    async fn send_empty(builder: RequestBuilder) -> PortalResult<()> {
        Self::send(builder).await.map(|_| ())
    }
}

/// Pulls a human readable message out of an error body.
fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(body) {
        Ok(Value::String(s)) => Some(s),
        Ok(value) => ["message", "error", "title", "detail"]
            .iter()
            .find_map(|key| value.get(*key).and_then(Value::as_str))
            .map(str::to_string),
        Err(_) => Some(body.chars().take(200).collect()),
    }
}

fn file_name_from_disposition(header: &str) -> Option<String> {
    header.split(';').map(str::trim).find_map(|part| {
        part.strip_prefix("filename=")
            .map(|name| name.trim_matches('"').to_string())
            .filter(|name| !name.is_empty())
    })
}

#[async_trait]
impl HrApi for BackendClient {
    #[instrument(name = "backend_login", skip(self, credentials), fields(email = %credentials.email))]
    async fn login(&self, credentials: &LoginReqDto) -> PortalResult<LoginGrant> {
        let body = LoginBody {
            email: &credentials.email,
            password: &credentials.password,
        };
        let response: WireLoginResponse =
            Self::send_json(self.request(Method::POST, "/api/login", None).json(&body)).await?;
        let user = response.user.map(SessionUser::try_from).transpose()?;
        Ok(LoginGrant {
            token: response.token,
            user,
        })
    }

    async fn register(&self, user: &RegisterReq) -> PortalResult<()> {
        let body = RegisterBody {
            name: &user.name,
            surname: &user.surname,
            email: &user.email,
            password: &user.password,
        };
        Self::send_empty(self.request(Method::POST, "/api/register", None).json(&body)).await
    }

    async fn request_password_reset(&self, email: &str) -> PortalResult<()> {
        let body = PasswordResetRequestBody { email };
        Self::send_empty(
            self.request(Method::POST, "/api/passwordreset/request", None)
                .json(&body),
        )
        .await
    }

    async fn confirm_password_reset(&self, reset: &PasswordResetConfirm) -> PortalResult<()> {
        let body = PasswordResetBody {
            token: &reset.token,
            new_password: &reset.new_password,
        };
        Self::send_empty(
            self.request(Method::POST, "/api/passwordreset/reset", None)
                .json(&body),
        )
        .await
    }

    async fn employee_leave_requests(
        &self,
        session: &Session,
        employee_id: u64,
    ) -> PortalResult<Vec<LeaveRequest>> {
        let path = format!("/api/LeaveRequest/employee/{employee_id}");
        let rows: Vec<WireLeaveRequest> =
            Self::send_json(self.request(Method::GET, &path, Some(session))).await?;
        map_all(rows)
    }

    async fn all_leave_requests(&self, session: &Session) -> PortalResult<Vec<LeaveRequest>> {
        let rows: Vec<WireLeaveRequest> =
            Self::send_json(self.request(Method::GET, "/api/LeaveRequest", Some(session))).await?;
        map_all(rows)
    }

    async fn submit_leave_request(
        &self,
        session: &Session,
        request: &NewLeaveRequest,
    ) -> PortalResult<()> {
        let body = LeaveRequestBody::from(request);
        Self::send_empty(
            self.request(Method::POST, "/api/LeaveRequest", Some(session))
                .json(&body),
        )
        .await
    }

    async fn set_leave_status(
        &self,
        session: &Session,
        leave_id: u64,
        status: LeaveStatus,
    ) -> PortalResult<()> {
        let path = format!("/api/LeaveRequest/{leave_id}/status");
        let body = StatusBody {
            status: status.to_string(),
        };
        Self::send_empty(self.request(Method::PUT, &path, Some(session)).json(&body)).await
    }

    async fn appointments(
        &self,
        session: &Session,
        employee_id: Option<u64>,
    ) -> PortalResult<Vec<Appointment>> {
        let mut builder = self.request(Method::GET, "/api/appointment", Some(session));
        if let Some(id) = employee_id {
            builder = builder.query(&[("employeeId", id)]);
        }
        let rows: Vec<WireAppointment> = Self::send_json(builder).await?;
        map_all(rows)
    }

    async fn create_appointment(
        &self,
        session: &Session,
        appointment: &NewAppointment,
    ) -> PortalResult<()> {
        let body = AppointmentBody::from(appointment);
        Self::send_empty(
            self.request(Method::POST, "/api/appointment", Some(session))
                .json(&body),
        )
        .await
    }

    async fn set_appointment_status(
        &self,
        session: &Session,
        appointment_id: u64,
        status: AppointmentStatus,
    ) -> PortalResult<()> {
        let path = format!("/api/appointment/{appointment_id}/status");
        let body = StatusBody {
            status: status.to_string(),
        };
        Self::send_empty(self.request(Method::PUT, &path, Some(session)).json(&body)).await
    }

    async fn documents(&self, session: &Session, employee_id: u64) -> PortalResult<Vec<Document>> {
        let path = format!("/api/Document/employee/{employee_id}");
        let rows: Vec<WireDocument> =
            Self::send_json(self.request(Method::GET, &path, Some(session))).await?;
        map_all(rows)
    }

    async fn upload_document(&self, session: &Session, document: NewDocument) -> PortalResult<()> {
        let part = multipart::Part::bytes(document.bytes)
            .file_name(document.file_name)
            .mime_str(&document.content_type)
            .map_err(|_| {
                PortalError::validation(format!(
                    "Unsupported content type {:?}",
                    document.content_type
                ))
            })?;
        let form = multipart::Form::new()
            .text("employeeId", document.employee_id.to_string())
            .part("file", part);
        Self::send_empty(
            self.request(Method::POST, "/api/Document/upload", Some(session))
                .multipart(form),
        )
        .await
    }

    async fn download_document(
        &self,
        session: &Session,
        document_id: u64,
    ) -> PortalResult<DocumentContent> {
        let path = format!("/api/Document/{document_id}/download");
        let response = Self::send(self.request(Method::GET, &path, Some(session))).await?;
        let headers = response.headers();
        let content_type = headers
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let file_name = headers
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|h| h.to_str().ok())
            .and_then(file_name_from_disposition)
            .unwrap_or_else(|| format!("document-{document_id}"));
        let bytes = response.bytes().await?.to_vec();
        Ok(DocumentContent {
            file_name,
            content_type,
            bytes,
        })
    }

    async fn delete_document(&self, session: &Session, document_id: u64) -> PortalResult<()> {
        let path = format!("/api/Document/{document_id}");
        Self::send_empty(self.request(Method::DELETE, &path, Some(session))).await
    }

    async fn payslips(&self, session: &Session, employee_id: u64) -> PortalResult<Vec<Payslip>> {
        let path = format!("/api/Payslips/employee/{employee_id}");
        let rows: Vec<WirePayslip> =
            Self::send_json(self.request(Method::GET, &path, Some(session))).await?;
        map_all(rows)
    }

    #[instrument(skip(self, session), fields(period = %period))]
    async fn generate_payslip(
        &self,
        session: &Session,
        employee_id: u64,
        period: PayslipPeriod,
    ) -> PortalResult<()> {
        let body = GeneratePayslipBody {
            employee_id,
            year: period.year,
            month: period.month,
        };
        Self::send_empty(
            self.request(Method::POST, "/api/Payslips/generate", Some(session))
                .json(&body),
        )
        .await
    }

    #[instrument(skip(self, session), fields(period = %period))]
    async fn generate_payslips_for_position(
        &self,
        session: &Session,
        position: &str,
        period: PayslipPeriod,
    ) -> PortalResult<u32> {
        let body = GenerateByPositionBody {
            position,
            year: period.year,
            month: period.month,
        };
        let response = Self::send(
            self.request(Method::POST, "/api/Payslips/generate/position", Some(session))
                .json(&body),
        )
        .await?;
        // The count is informational; an empty or unexpected body still means success.
        let text = response.text().await.unwrap_or_default();
        let result: WireGenerateResult = serde_json::from_str(&text).unwrap_or_default();
        Ok(result.generated_count)
    }

    async fn fetch_payslip(
        &self,
        session: &Session,
        employee_id: u64,
        period: PayslipPeriod,
    ) -> PortalResult<PayslipFetch> {
        let path = format!(
            "/api/Payslips/{employee_id}/{}/{}",
            period.year, period.month
        );
        let fetch: WirePayslipFetch =
            Self::send_json(self.request(Method::GET, &path, Some(session))).await?;
        PayslipFetch::try_from(fetch)
    }

    async fn todos(&self, session: &Session, employee_id: u64) -> PortalResult<Vec<Todo>> {
        let builder = self
            .request(Method::GET, "/api/ToDo", Some(session))
            .query(&[("employeeId", employee_id)]);
        let rows: Vec<WireTodo> = Self::send_json(builder).await?;
        map_all(rows)
    }

    async fn create_todo(&self, session: &Session, todo: &NewTodo) -> PortalResult<()> {
        let body = TodoBody::from(todo);
        Self::send_empty(self.request(Method::POST, "/api/ToDo", Some(session)).json(&body)).await
    }

    async fn update_todo(&self, session: &Session, todo: &Todo) -> PortalResult<()> {
        let path = format!("/api/ToDo/{}", todo.id);
        let body = TodoBody::from(todo);
        Self::send_empty(self.request(Method::PUT, &path, Some(session)).json(&body)).await
    }

    async fn delete_todo(&self, session: &Session, todo_id: u64) -> PortalResult<()> {
        let path = format!("/api/ToDo/{todo_id}");
        Self::send_empty(self.request(Method::DELETE, &path, Some(session))).await
    }

    async fn employees(&self, session: &Session) -> PortalResult<Vec<Employee>> {
        let rows: Vec<WireEmployee> = Self::send_json(self.request(
            Method::GET,
            "/api/HrAdmin/employees",
            Some(session),
        ))
        .await?;
        map_all(rows)
    }

    async fn admit_employee(
        &self,
        session: &Session,
        admission: &Admission,
    ) -> PortalResult<Employee> {
        let body = AdmissionBody::from(admission);
        let row: WireEmployee = Self::send_json(
            self.request(Method::POST, "/api/HrAdmin/admission", Some(session))
                .json(&body),
        )
        .await?;
        Employee::try_from(row)
    }

    async fn contract(&self, session: &Session, employee_id: u64) -> PortalResult<Contract> {
        let path = format!("/api/HrAdmin/contract/{employee_id}");
        let row: WireContract =
            Self::send_json(self.request(Method::GET, &path, Some(session))).await?;
        Contract::try_from(row)
    }

    async fn update_contract(
        &self,
        session: &Session,
        employee_id: u64,
        terms: &ContractTerms,
    ) -> PortalResult<()> {
        let path = format!("/api/HrAdmin/contract/{employee_id}");
        let body = ContractBody::from(terms);
        Self::send_empty(self.request(Method::PUT, &path, Some(session)).json(&body)).await
    }

    async fn offboard_employee(&self, session: &Session, employee_id: u64) -> PortalResult<()> {
        let path = format!("/api/HrAdmin/offboarding/{employee_id}");
        Self::send_empty(self.request(Method::DELETE, &path, Some(session))).await
    }

    async fn positions(&self, session: &Session) -> PortalResult<Vec<String>> {
        let rows: Vec<WirePosition> = Self::send_json(self.request(
            Method::GET,
            "/api/HrAdmin/positions",
            Some(session),
        ))
        .await?;
        Ok(rows.into_iter().map(String::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;
    use reqwest::header::AUTHORIZATION;

    fn session() -> Session {
        Session::open(
            SessionUser {
                id: 7,
                name: "Ana".into(),
                surname: "Silva".into(),
                role: Role::Employee,
                employee_id: Some(1000),
            },
            "token-abc".into(),
        )
    }

    fn client() -> BackendClient {
        let config = Config {
            backend_base_url: "http://hr.test".into(),
            ..Config::default()
        };
        BackendClient::new(&config).unwrap()
    }

    #[test]
    fn session_request_carries_bearer() {
        let session = session();
        let request = client()
            .request(Method::GET, "/api/ToDo", Some(&session))
            .build()
            .unwrap();
        assert_eq!(request.url().as_str(), "http://hr.test/api/ToDo");
        assert_eq!(
            request.headers().get(AUTHORIZATION).unwrap(),
            "Bearer token-abc"
        );
    }

    #[test]
    fn request_without_session_has_no_bearer() {
        let request = client()
            .request(Method::POST, "/api/login", None)
            .build()
            .unwrap();
        assert!(request.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn error_message_from_common_shapes() {
        assert_eq!(
            error_message(r#"{"message":"Leave overlaps"}"#).as_deref(),
            Some("Leave overlaps")
        );
        assert_eq!(
            error_message(r#"{"title":"One or more validation errors occurred."}"#).as_deref(),
            Some("One or more validation errors occurred.")
        );
        assert_eq!(error_message("plain text").as_deref(), Some("plain text"));
        assert_eq!(error_message("  "), None);
    }

    #[test]
    fn disposition_file_name() {
        assert_eq!(
            file_name_from_disposition(r#"attachment; filename="contract.pdf""#).as_deref(),
            Some("contract.pdf")
        );
        assert_eq!(file_name_from_disposition("inline"), None);
    }
}
