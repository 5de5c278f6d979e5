use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// Step of a submission recorded in the trace file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitStage {
    Validate,
    Upload,
    Create,
    Update,
}

#[derive(Debug, Serialize)]
pub struct SubmitTraceEvent {
    pub timestamp_ms: u128,

    pub form: String,
    pub resource: String,
    pub stage: SubmitStage,

    pub ok: bool,

    pub record_id: Option<String>,
    pub field: Option<String>,
    pub detail: Option<String>,
}

impl SubmitTraceEvent {
    pub fn now(form: &str, resource: &str, stage: SubmitStage) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            form: form.to_string(),
            resource: resource.to_string(),
            stage,
            ok: true,
            record_id: None,
            field: None,
            detail: None,
        }
    }

    pub fn failed(mut self, detail: impl ToString) -> Self {
        self.ok = false;
        self.detail = Some(detail.to_string());
        self
    }

    pub fn with_field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }

    pub fn with_record(mut self, id: impl ToString) -> Self {
        self.record_id = Some(id.to_string());
        self
    }

    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }
}
