use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::CONTENT_TYPE;
use serde_json::{Value, json};

use crate::api::api_model::{
    Attachment, AttachmentRequest, DataEnvelope, ListQuery, Page, Pagination, Resource,
    SignedUpload,
};
use crate::api::endpoints::{collection_path, join_url, record_path, upload_url_path};
use crate::api::error::ApiError;
use crate::session::session_model::SessionContext;

// ============================================================================
// SchoolApi trait (backend boundary)
// ============================================================================

/// Everything the dashboard asks of the REST backend and the storage behind
/// signed upload URLs.
pub trait SchoolApi {
    fn list(
        &self,
        session: &SessionContext,
        resource: Resource,
        query: &ListQuery,
    ) -> Result<Page, ApiError>;

    fn fetch(&self, session: &SessionContext, resource: Resource, id: &str)
        -> Result<Value, ApiError>;

    fn create(
        &self,
        session: &SessionContext,
        resource: Resource,
        payload: &Value,
    ) -> Result<Value, ApiError>;

    fn update(
        &self,
        session: &SessionContext,
        resource: Resource,
        id: &str,
        payload: &Value,
    ) -> Result<Value, ApiError>;

    fn delete(&self, session: &SessionContext, resource: Resource, id: &str)
        -> Result<(), ApiError>;

    /// Phase one of an upload: ask the backend for a signed URL.
    fn upload_url(
        &self,
        session: &SessionContext,
        file_name: &str,
        content_type: &str,
    ) -> Result<SignedUpload, ApiError>;

    /// Phase two: PUT the raw bytes to the signed URL.
    fn put_object(&self, url: &str, content_type: &str, bytes: &[u8]) -> Result<(), ApiError>;

    /// Phase three: register the stored object as an attachment record.
    fn register_attachment(
        &self,
        session: &SessionContext,
        request: &AttachmentRequest,
    ) -> Result<Attachment, ApiError>;
}

// ============================================================================
// HTTP implementation (reqwest, blocking)
// ============================================================================

pub struct HttpApi {
    pub base_url: String,
    client: Client,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build().map_err(|source| ApiError::Transport {
            url: base_url.to_string(),
            source,
        })?;
        Ok(Self {
            base_url: base_url.to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    fn authorized(
        &self,
        builder: RequestBuilder,
        session: &SessionContext,
    ) -> Result<RequestBuilder, ApiError> {
        Ok(builder.bearer_auth(session.token()?))
    }

    /// Send a request and unwrap the `data` member of the JSON response.
    fn send_for_data(&self, url: &str, request: RequestBuilder) -> Result<Value, ApiError> {
        let body = self.send(url, request)?;
        let parsed: Value = serde_json::from_str(&body).map_err(|source| {
            tracing::error!(%url, %body, "response is not JSON");
            ApiError::Json {
                context: url.to_string(),
                source,
            }
        })?;
        match parsed {
            Value::Object(mut map) => map.remove("data").ok_or_else(|| {
                tracing::error!(%url, %body, "response has no data member");
                ApiError::Envelope {
                    url: url.to_string(),
                    detail: "missing 'data'".into(),
                }
            }),
            _ => Err(ApiError::Envelope {
                url: url.to_string(),
                detail: "body is not an object".into(),
            }),
        }
    }

    /// Send a request and return the raw body of a successful response.
    fn send(&self, url: &str, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().map_err(|source| {
            tracing::error!(%url, error = %source, "request failed");
            ApiError::Transport {
                url: url.to_string(),
                source,
            }
        })?;
        let status = response.status();
        let body = response.text().map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;

        if !status.is_success() {
            let message = server_message(&body).unwrap_or_default();
            tracing::error!(%url, status = status.as_u16(), %body, "backend rejected request");
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                message,
                body,
            });
        }
        Ok(body)
    }
}

impl SchoolApi for HttpApi {
    fn list(
        &self,
        session: &SessionContext,
        resource: Resource,
        query: &ListQuery,
    ) -> Result<Page, ApiError> {
        let url = self.url(&collection_path(session, resource)?);
        let request = self.authorized(self.client.get(&url), session)?.query(&query.to_params());
        let data = self.send_for_data(&url, request)?;
        parse_page(&url, resource, data)
    }

    fn fetch(
        &self,
        session: &SessionContext,
        resource: Resource,
        id: &str,
    ) -> Result<Value, ApiError> {
        let url = self.url(&record_path(session, resource, id)?);
        let request = self.authorized(self.client.get(&url), session)?;
        self.send_for_data(&url, request)
    }

    fn create(
        &self,
        session: &SessionContext,
        resource: Resource,
        payload: &Value,
    ) -> Result<Value, ApiError> {
        let url = self.url(&collection_path(session, resource)?);
        let request = self
            .authorized(self.client.post(&url), session)?
            .json(&DataEnvelope { data: payload });
        tracing::debug!(%url, "creating record");
        self.send_for_data(&url, request)
    }

    fn update(
        &self,
        session: &SessionContext,
        resource: Resource,
        id: &str,
        payload: &Value,
    ) -> Result<Value, ApiError> {
        let url = self.url(&record_path(session, resource, id)?);
        let request = self
            .authorized(self.client.put(&url), session)?
            .json(&DataEnvelope { data: payload });
        tracing::debug!(%url, "updating record");
        self.send_for_data(&url, request)
    }

    fn delete(
        &self,
        session: &SessionContext,
        resource: Resource,
        id: &str,
    ) -> Result<(), ApiError> {
        let url = self.url(&record_path(session, resource, id)?);
        let request = self.authorized(self.client.delete(&url), session)?;
        self.send(&url, request).map(|_| ())
    }

    fn upload_url(
        &self,
        session: &SessionContext,
        file_name: &str,
        content_type: &str,
    ) -> Result<SignedUpload, ApiError> {
        let url = self.url(&upload_url_path(session)?);
        let body = json!({ "fileName": file_name, "contentType": content_type });
        let request = self
            .authorized(self.client.post(&url), session)?
            .json(&DataEnvelope { data: &body });
        let data = self.send_for_data(&url, request)?;
        serde_json::from_value(data).map_err(|source| ApiError::Json {
            context: format!("signed upload from {}", url),
            source,
        })
    }

    fn put_object(&self, url: &str, content_type: &str, bytes: &[u8]) -> Result<(), ApiError> {
        // Signed URLs carry their own authorization; no bearer token here.
        let request = self
            .client
            .put(url)
            .header(CONTENT_TYPE, content_type)
            .body(bytes.to_vec());
        self.send(url, request).map(|_| ())
    }

    fn register_attachment(
        &self,
        session: &SessionContext,
        attachment: &AttachmentRequest,
    ) -> Result<Attachment, ApiError> {
        let url = self.url(&collection_path(session, Resource::Attachments)?);
        let request = self
            .authorized(self.client.post(&url), session)?
            .json(&DataEnvelope { data: attachment });
        let data = self.send_for_data(&url, request)?;
        serde_json::from_value(data).map_err(|source| ApiError::Json {
            context: format!("attachment from {}", url),
            source,
        })
    }
}

// ============================================================================
// Response helpers
// ============================================================================

/// Pull a human-readable message out of an error body:
/// `{ "error": { "message": ... } }` or `{ "message": ... }`.
pub fn server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/error/message")
        .or_else(|| value.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Parse `{ <collection>: [...], meta: { pagination } }`.
pub fn parse_page(url: &str, resource: Resource, data: Value) -> Result<Page, ApiError> {
    let items = match data.get(resource.collection_key()) {
        Some(Value::Array(items)) => items.clone(),
        _ => {
            return Err(ApiError::Envelope {
                url: url.to_string(),
                detail: format!("missing '{}' array", resource.collection_key()),
            });
        }
    };

    let pagination = match data.pointer("/meta/pagination") {
        Some(p) => serde_json::from_value::<Pagination>(p.clone()).map_err(|source| {
            ApiError::Json {
                context: format!("pagination from {}", url),
                source,
            }
        })?,
        None => Pagination {
            page: 1,
            page_size: items.len() as u32,
            page_count: 1,
            total: items.len() as u64,
        },
    };

    Ok(Page { items, pagination })
}
