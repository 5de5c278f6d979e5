use std::fmt;

use crate::api::api_model::{Attachment, AttachmentRequest};
use crate::api::client::SchoolApi;
use crate::api::error::ApiError;
use crate::form::form_model::FileHandle;
use crate::session::session_model::SessionContext;

/// The three steps of an upload, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    SignedUrl,
    Put,
    Register,
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UploadStage::SignedUrl => "signed-url",
            UploadStage::Put => "put",
            UploadStage::Register => "register",
        })
    }
}

#[derive(Debug)]
pub enum UploadOutcome {
    /// All three steps succeeded
    Registered(Attachment),

    /// Bytes reached storage under `object_key` but no attachment record exists
    PartialFailure {
        stage: UploadStage,
        object_key: String,
        error: ApiError,
    },

    /// Nothing was stored
    Failed { stage: UploadStage, error: ApiError },
}

impl UploadOutcome {
    pub fn is_registered(&self) -> bool {
        matches!(self, UploadOutcome::Registered(_))
    }

    pub fn into_result(self) -> Result<Attachment, (UploadStage, ApiError)> {
        match self {
            UploadOutcome::Registered(a) => Ok(a),
            UploadOutcome::PartialFailure { stage, error, .. }
            | UploadOutcome::Failed { stage, error } => Err((stage, error)),
        }
    }
}

/// Signed URL → PUT to storage → attachment record. Each step runs only
/// after the previous one succeeded; the first failure ends the sequence.
pub fn upload_then_register(
    api: &dyn SchoolApi,
    session: &SessionContext,
    file: &FileHandle,
) -> UploadOutcome {
    let signed = match api.upload_url(session, &file.file_name, &file.content_type) {
        Ok(s) => s,
        Err(error) => {
            tracing::error!(file = %file.file_name, %error, "could not obtain signed upload URL");
            return UploadOutcome::Failed {
                stage: UploadStage::SignedUrl,
                error,
            };
        }
    };

    if let Err(error) = api.put_object(&signed.url, &file.content_type, &file.bytes) {
        tracing::error!(file = %file.file_name, %error, "upload to storage failed");
        return UploadOutcome::Failed {
            stage: UploadStage::Put,
            error,
        };
    }

    let request = AttachmentRequest {
        key: signed.key.clone(),
        file_name: file.file_name.clone(),
        content_type: file.content_type.clone(),
        size: file.size(),
        checksum: file.fingerprint(),
    };

    match api.register_attachment(session, &request) {
        Ok(attachment) => {
            tracing::info!(file = %file.file_name, attachment = %attachment.id, "attachment registered");
            UploadOutcome::Registered(attachment)
        }
        Err(error) => {
            tracing::error!(file = %file.file_name, key = %signed.key, %error, "attachment registration failed");
            UploadOutcome::PartialFailure {
                stage: UploadStage::Register,
                object_key: signed.key,
                error,
            }
        }
    }
}
