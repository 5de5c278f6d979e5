use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use crate::api::api_model::{Attachment, Resource};
use crate::api::client::SchoolApi;
use crate::api::error::ApiError;
use crate::catalog::options::record_id;
use crate::form::engine::FormEngine;
use crate::form::error::FormError;
use crate::form::validation::ValidationErrors;
use crate::session::session_model::SessionContext;
use crate::trace::logger::TraceLogger;
use crate::trace::trace::{SubmitStage, SubmitTraceEvent};
use crate::upload::uploader::{UploadOutcome, UploadStage, upload_then_register};

#[derive(Debug, Error)]
pub enum SubmitError {
    /// Local validation failed; nothing was sent
    #[error("form has {} invalid field(s): {0}", .0.len())]
    Invalid(ValidationErrors),

    /// A file upload step failed; the record call was not made
    #[error("upload of '{field}' failed at the {stage} step: {source}")]
    Upload {
        field: String,
        stage: UploadStage,
        /// Object stored without an attachment record, if any
        orphaned_key: Option<String>,
        #[source]
        source: ApiError,
    },

    /// The create/update call itself failed
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error("this form was already submitted")]
    AlreadySubmitted,
}

/// Add or edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitMode {
    Create,
    Update(String),
}

#[derive(Debug, Clone)]
pub struct SubmitReceipt {
    pub mode: SubmitMode,
    /// Record as returned by the backend
    pub record: Value,
    pub record_id: Option<String>,
    /// Attachments registered during this submission, by file field
    pub attachments: Vec<(String, Attachment)>,
}

/// Runs a submission: validate → upload pending files → create/update.
pub struct Submitter<'a> {
    api: &'a dyn SchoolApi,
    session: &'a SessionContext,
    tracer: &'a TraceLogger,
}

impl<'a> Submitter<'a> {
    pub fn new(api: &'a dyn SchoolApi, session: &'a SessionContext, tracer: &'a TraceLogger) -> Self {
        Self {
            api,
            session,
            tracer,
        }
    }

    /// Submit the engine's current state to `resource`.
    ///
    /// Validation runs first and is purely local. Every pending file is then
    /// uploaded and registered; the record call happens only when all of
    /// them succeeded. A successful submit marks the engine submitted, and a
    /// submitted engine refuses to submit again.
    pub fn submit(
        &self,
        engine: &mut FormEngine,
        resource: Resource,
        mode: &SubmitMode,
    ) -> Result<SubmitReceipt, SubmitError> {
        let form = engine.schema().name.clone();
        let resource_name = resource.to_string();

        if engine.is_submitted() {
            return Err(SubmitError::AlreadySubmitted);
        }

        let errors = engine.validate();
        if !errors.is_empty() {
            self.tracer.log(
                &SubmitTraceEvent::now(&form, &resource_name, SubmitStage::Validate)
                    .failed(&errors),
            );
            return Err(SubmitError::Invalid(errors));
        }

        let mut attachments = Vec::new();
        let mut attachment_ids = BTreeMap::new();
        for (field, file) in engine.pending_files() {
            let event = SubmitTraceEvent::now(&form, &resource_name, SubmitStage::Upload)
                .with_field(&field);
            match upload_then_register(self.api, self.session, file) {
                UploadOutcome::Registered(attachment) => {
                    self.tracer.log(&event.with_record(&attachment.id));
                    attachment_ids.insert(field.clone(), attachment.id.clone());
                    attachments.push((field, attachment));
                }
                UploadOutcome::PartialFailure {
                    stage,
                    object_key,
                    error,
                } => {
                    self.tracer.log(&event.failed(format!(
                        "{}: {} (stored as {})",
                        stage, error, object_key
                    )));
                    return Err(SubmitError::Upload {
                        field,
                        stage,
                        orphaned_key: Some(object_key),
                        source: error,
                    });
                }
                UploadOutcome::Failed { stage, error } => {
                    self.tracer.log(&event.failed(format!("{}: {}", stage, error)));
                    return Err(SubmitError::Upload {
                        field,
                        stage,
                        orphaned_key: None,
                        source: error,
                    });
                }
            }
        }

        let payload = engine.payload(&attachment_ids)?;

        let (stage, result) = match mode {
            SubmitMode::Create => (
                SubmitStage::Create,
                self.api.create(self.session, resource, &payload),
            ),
            SubmitMode::Update(id) => (
                SubmitStage::Update,
                self.api.update(self.session, resource, id, &payload),
            ),
        };

        let event = SubmitTraceEvent::now(&form, &resource_name, stage);
        let record = match result {
            Ok(record) => record,
            Err(error) => {
                tracing::error!(%form, %resource, %error, "submission rejected");
                self.tracer.log(&event.failed(&error));
                return Err(SubmitError::Api(error));
            }
        };

        let id = record_id(&record).or_else(|| match mode {
            SubmitMode::Update(id) => Some(id.clone()),
            SubmitMode::Create => None,
        });
        self.tracer.log(&match &id {
            Some(id) => event.with_record(id),
            None => event.with_detail("no id in response"),
        });
        tracing::info!(%form, %resource, id = id.as_deref().unwrap_or("-"), "submitted");

        engine.mark_submitted();
        Ok(SubmitReceipt {
            mode: mode.clone(),
            record,
            record_id: id,
            attachments,
        })
    }
}
