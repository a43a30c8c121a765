use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Document {
    pub id: u64,
    pub employee_id: u64,
    pub file_name: String,
    pub content_type: Option<String>,
    pub size_bytes: Option<u64>,
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// File body as returned by a download.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentContent {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// File body as received from an upload form.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    pub employee_id: u64,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}
