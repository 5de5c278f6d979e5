use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Backend resources
// ============================================================================

/// A backend collection reachable through the tenant-scoped REST API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Schools,
    Users,
    Classes,
    Sections,
    Lessons,
    Assignments,
    Diaries,
    Banners,
    Attachments,
}

impl Resource {
    pub const ALL: [Resource; 9] = [
        Resource::Schools,
        Resource::Users,
        Resource::Classes,
        Resource::Sections,
        Resource::Lessons,
        Resource::Assignments,
        Resource::Diaries,
        Resource::Banners,
        Resource::Attachments,
    ];

    /// Path segment, also the collection key inside paginated responses.
    pub fn collection_key(&self) -> &'static str {
        match self {
            Resource::Schools => "schools",
            Resource::Users => "users",
            Resource::Classes => "classes",
            Resource::Sections => "sections",
            Resource::Lessons => "lessons",
            Resource::Assignments => "assignments",
            Resource::Diaries => "diaries",
            Resource::Banners => "banners",
            Resource::Attachments => "attachments",
        }
    }

    /// Resources nested under `tenants/{tenantId}/schools/{schoolId}/`.
    pub fn is_school_scoped(&self) -> bool {
        matches!(
            self,
            Resource::Classes
                | Resource::Sections
                | Resource::Lessons
                | Resource::Assignments
                | Resource::Diaries
        )
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection_key())
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::ALL
            .iter()
            .copied()
            .find(|r| r.collection_key() == s)
            .ok_or_else(|| format!("unknown resource '{}'", s))
    }
}

// ============================================================================
// List queries and pagination
// ============================================================================

/// Query parameters for a paginated list call.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub page: u32,
    pub page_size: u32,
    pub search: Option<String>,
    /// Equality filters sent verbatim as query parameters (`classId=...`).
    pub filters: BTreeMap<String, String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 25,
            search: None,
            filters: BTreeMap::new(),
        }
    }
}

impl ListQuery {
    pub fn with_filter(mut self, key: &str, value: &str) -> Self {
        self.filters.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_search(mut self, search: &str) -> Self {
        self.search = Some(search.to_string());
        self
    }

    /// Flatten into `(name, value)` pairs in a stable order.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), self.page.to_string()),
            ("pageSize".to_string(), self.page_size.to_string()),
        ];
        if let Some(search) = &self.search {
            params.push(("search".to_string(), search.clone()));
        }
        for (k, v) in &self.filters {
            params.push((k.clone(), v.clone()));
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub page_count: u32,
    #[serde(default)]
    pub total: u64,
}

fn default_page() -> u32 { 1 }

/// One page of records from `{ data: { <collection>: [...], meta: { pagination } } }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Value>,
    pub pagination: Pagination,
}

impl Page {
    pub fn has_next(&self) -> bool {
        self.pagination.page < self.pagination.page_count
    }
}

// ============================================================================
// Attachments
// ============================================================================

/// Signed, time-limited URL for a direct client-to-storage PUT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUpload {
    pub url: String,
    /// Storage object key the attachment record is registered under.
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentRequest {
    pub key: String,
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
    pub checksum: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Write envelope: every create/update body is `{ "data": ... }`.
#[derive(Debug, Serialize)]
pub struct DataEnvelope<'a, T: Serialize> {
    pub data: &'a T,
}
