use serde::Serialize;

use crate::submit::submitter::{SubmitError, SubmitMode, SubmitReceipt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    Success,
    Error,
}

/// The blocking dialog shown after a submission attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feedback {
    pub kind: FeedbackKind,
    pub title: String,
    pub message: String,
}

impl Feedback {
    pub fn success(title: &str, message: impl Into<String>) -> Self {
        Self {
            kind: FeedbackKind::Success,
            title: title.to_string(),
            message: message.into(),
        }
    }

    pub fn error(title: &str, message: impl Into<String>) -> Self {
        Self {
            kind: FeedbackKind::Error,
            title: title.to_string(),
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind == FeedbackKind::Success
    }

    pub fn from_receipt(form_title: &str, receipt: &SubmitReceipt) -> Self {
        let verb = match receipt.mode {
            SubmitMode::Create => "created",
            SubmitMode::Update(_) => "updated",
        };
        let message = match &receipt.record_id {
            Some(id) => format!("{} {} successfully (id {}).", form_title, verb, id),
            None => format!("{} {} successfully.", form_title, verb),
        };
        Feedback::success("Saved", message)
    }

    /// Server-supplied message when there is one, a generic line otherwise.
    pub fn from_submit_error(err: &SubmitError) -> Self {
        match err {
            SubmitError::Invalid(errors) => Feedback::error(
                "Please correct the highlighted fields",
                format!("{} field(s) need attention.", errors.len()),
            ),
            SubmitError::Upload {
                field,
                source,
                orphaned_key,
                ..
            } => {
                let mut message = format!("Could not upload '{}'. {}", field, source.user_message());
                if let Some(key) = orphaned_key {
                    message.push_str(&format!(
                        " The file was stored as '{}' but is not attached to any record.",
                        key
                    ));
                }
                Feedback::error("Upload failed", message)
            }
            SubmitError::Api(api) => Feedback::error("Could not save", api.user_message()),
            SubmitError::Form(form) => Feedback::error("Could not save", form.to_string()),
            SubmitError::AlreadySubmitted => Feedback::error(
                "Already submitted",
                "This form has already been saved.",
            ),
        }
    }
}
