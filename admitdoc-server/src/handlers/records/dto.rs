use serde::Deserialize;
use serde_json::Value;

/// Request body for record create/update.
#[derive(Debug, Deserialize)]
pub struct RecordPayload {
    #[serde(alias = "applicantName")]
    pub applicant_name: String,
    pub program: String,
    #[serde(default)]
    pub fields: Value,
}
