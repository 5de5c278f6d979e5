use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;

/// Roles a signed-in dashboard user may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SessionRole {
    TenantAdmin,
    SchoolAdmin,
    Teacher,
    Student,
}

/// Authenticated session, passed explicitly to every API call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    #[serde(default)]
    pub tenant_id: Option<String>,

    #[serde(default)]
    pub roles: Vec<SessionRole>,

    #[serde(default)]
    pub token: Option<String>,

    /// School the user is currently working in, for school-scoped resources
    #[serde(default)]
    pub school_id: Option<String>,
}

impl SessionContext {
    pub fn new(tenant_id: &str, token: &str) -> Self {
        Self {
            tenant_id: Some(tenant_id.to_string()),
            roles: Vec::new(),
            token: Some(token.to_string()),
            school_id: None,
        }
    }

    pub fn with_role(mut self, role: SessionRole) -> Self {
        if !self.roles.contains(&role) {
            self.roles.push(role);
        }
        self
    }

    pub fn with_school(mut self, school_id: &str) -> Self {
        self.school_id = Some(school_id.to_string());
        self
    }

    pub fn tenant(&self) -> Result<&str, ApiError> {
        non_blank(self.tenant_id.as_deref()).ok_or(ApiError::MissingContext("tenant id"))
    }

    pub fn token(&self) -> Result<&str, ApiError> {
        non_blank(self.token.as_deref()).ok_or(ApiError::MissingContext("auth token"))
    }

    pub fn school(&self) -> Result<&str, ApiError> {
        non_blank(self.school_id.as_deref()).ok_or(ApiError::MissingContext("school id"))
    }

    pub fn has_any_role(&self, allowed: &[SessionRole]) -> bool {
        self.roles.iter().any(|r| allowed.contains(r))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
