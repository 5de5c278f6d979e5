use crate::api::api_model::Resource;
use crate::api::error::ApiError;
use crate::session::session_model::SessionContext;

// ============================================================================
// Path templates
// ============================================================================

/// Collection path for a resource, templated by tenant and (where the
/// resource is school-scoped) school id.
///
/// ```text
/// tenants/{tenantId}/schools
/// tenants/{tenantId}/schools/{schoolId}/classes
/// ```
pub fn collection_path(session: &SessionContext, resource: Resource) -> Result<String, ApiError> {
    let tenant = session.tenant()?;
    if resource.is_school_scoped() {
        let school = session.school()?;
        Ok(format!(
            "tenants/{}/schools/{}/{}",
            tenant,
            school,
            resource.collection_key()
        ))
    } else {
        Ok(format!("tenants/{}/{}", tenant, resource.collection_key()))
    }
}

pub fn record_path(
    session: &SessionContext,
    resource: Resource,
    id: &str,
) -> Result<String, ApiError> {
    Ok(format!("{}/{}", collection_path(session, resource)?, id))
}

pub fn upload_url_path(session: &SessionContext) -> Result<String, ApiError> {
    Ok(format!("{}/upload-url", collection_path(session, Resource::Attachments)?))
}

/// Join a base URL and a relative path with exactly one slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
