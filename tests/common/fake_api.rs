use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use serde_json::{Value, json};

use school_dashboard::api::api_model::{
    Attachment, AttachmentRequest, ListQuery, Page, Pagination, Resource, SignedUpload,
};
use school_dashboard::api::client::SchoolApi;
use school_dashboard::api::error::ApiError;
use school_dashboard::session::session_model::SessionContext;

/// In-memory backend that records every call in order.
///
/// Each call is logged as a short string (`"create schools"`,
/// `"put https://storage/obj-1"`), which tests assert on to check both
/// what was called and in which order.
#[derive(Default)]
pub struct FakeApi {
    pub calls: RefCell<Vec<String>>,
    pub created: RefCell<Vec<Value>>,
    pub updated: RefCell<Vec<(String, Value)>>,
    pub registered: RefCell<Vec<AttachmentRequest>>,
    /// Records returned by `fetch`, by id
    pub records: BTreeMap<String, Value>,
    /// Items returned by `list`, by resource
    pub lists: HashMap<Resource, Vec<Value>>,
    pub fail_upload_url: bool,
    pub fail_put: bool,
    pub fail_register: bool,
    /// Status + message for create/update failures
    pub fail_write: Option<(u16, String)>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn called(&self, prefix: &str) -> bool {
        self.calls.borrow().iter().any(|c| c.starts_with(prefix))
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    fn status(status: u16, message: &str) -> ApiError {
        ApiError::Status {
            url: "fake".into(),
            status,
            message: message.into(),
            body: json!({ "error": { "message": message } }).to_string(),
        }
    }
}

impl SchoolApi for FakeApi {
    fn list(
        &self,
        session: &SessionContext,
        resource: Resource,
        query: &ListQuery,
    ) -> Result<Page, ApiError> {
        session.tenant()?;
        let filters: Vec<String> = query
            .filters
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        self.record(format!("list {} {}", resource, filters.join("&")).trim_end().to_string());

        let items: Vec<Value> = self
            .lists
            .get(&resource)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|item| {
                query.filters.iter().all(|(k, v)| match item.get(k) {
                    Some(Value::String(s)) => s == v,
                    Some(Value::Number(n)) => n.to_string() == *v,
                    _ => false,
                })
            })
            .collect();
        let total = items.len() as u64;
        Ok(Page {
            items,
            pagination: Pagination {
                page: query.page,
                page_size: query.page_size,
                page_count: 1,
                total,
            },
        })
    }

    fn fetch(&self, session: &SessionContext, resource: Resource, id: &str) -> Result<Value, ApiError> {
        session.tenant()?;
        self.record(format!("fetch {} {}", resource, id));
        self.records
            .get(id)
            .cloned()
            .ok_or_else(|| Self::status(404, "Not Found"))
    }

    fn create(&self, session: &SessionContext, resource: Resource, payload: &Value) -> Result<Value, ApiError> {
        session.tenant()?;
        self.record(format!("create {}", resource));
        if let Some((status, message)) = &self.fail_write {
            return Err(Self::status(*status, message));
        }
        self.created.borrow_mut().push(payload.clone());
        let mut record = payload.clone();
        if let Value::Object(map) = &mut record {
            map.insert("id".into(), json!(101));
        }
        Ok(record)
    }

    fn update(
        &self,
        session: &SessionContext,
        resource: Resource,
        id: &str,
        payload: &Value,
    ) -> Result<Value, ApiError> {
        session.tenant()?;
        self.record(format!("update {} {}", resource, id));
        if let Some((status, message)) = &self.fail_write {
            return Err(Self::status(*status, message));
        }
        self.updated.borrow_mut().push((id.to_string(), payload.clone()));
        Ok(payload.clone())
    }

    fn delete(&self, session: &SessionContext, resource: Resource, id: &str) -> Result<(), ApiError> {
        session.tenant()?;
        self.record(format!("delete {} {}", resource, id));
        Ok(())
    }

    fn upload_url(
        &self,
        session: &SessionContext,
        file_name: &str,
        _content_type: &str,
    ) -> Result<SignedUpload, ApiError> {
        session.tenant()?;
        self.record(format!("upload-url {}", file_name));
        if self.fail_upload_url {
            return Err(Self::status(500, "Signing service unavailable"));
        }
        Ok(SignedUpload {
            url: format!("https://storage/{}", file_name),
            key: format!("obj-{}", file_name),
        })
    }

    fn put_object(&self, url: &str, _content_type: &str, _bytes: &[u8]) -> Result<(), ApiError> {
        self.record(format!("put {}", url));
        if self.fail_put {
            return Err(Self::status(403, "Signature expired"));
        }
        Ok(())
    }

    fn register_attachment(
        &self,
        session: &SessionContext,
        request: &AttachmentRequest,
    ) -> Result<Attachment, ApiError> {
        session.tenant()?;
        self.record(format!("register {}", request.key));
        if self.fail_register {
            return Err(Self::status(422, "Attachment rejected"));
        }
        self.registered.borrow_mut().push(request.clone());
        Ok(Attachment {
            id: format!("att-{}", self.registered.borrow().len()),
            key: Some(request.key.clone()),
            file_name: Some(request.file_name.clone()),
            url: None,
        })
    }
}
