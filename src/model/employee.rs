use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1000,
        "employee_code": "EMP-001",
        "name": "John",
        "surname": "Doe",
        "email": "john.doe@company.com",
        "position": "Accountant",
        "hire_date": "2024-01-01",
        "status": "active"
    })
)]
pub struct Employee {
    pub id: u64,
    pub employee_code: Option<String>,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub position: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Contract {
    pub employee_id: u64,
    pub position: String,
    pub contract_type: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub base_salary: f64,
    pub weekly_hours: Option<f32>,
}

/// Contract fields an admin can edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ContractTerms {
    #[schema(example = "Accountant")]
    pub position: String,
    #[schema(example = "permanent")]
    pub contract_type: String,
    #[schema(example = "2024-01-01")]
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[schema(example = 52000.0)]
    pub base_salary: f64,
    #[schema(example = 40.0)]
    pub weekly_hours: Option<f32>,
}

impl Contract {
    pub fn from_terms(employee_id: u64, terms: ContractTerms) -> Self {
        Self {
            employee_id,
            position: terms.position,
            contract_type: terms.contract_type,
            start_date: terms.start_date,
            end_date: terms.end_date,
            base_salary: terms.base_salary,
            weekly_hours: terms.weekly_hours,
        }
    }
}

/// Admission form: a new employee together with the first contract.
#[derive(Debug, Clone, PartialEq)]
pub struct Admission {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub hire_date: NaiveDate,
    pub terms: ContractTerms,
}
