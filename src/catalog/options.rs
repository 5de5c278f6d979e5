use serde_json::Value;

use crate::api::api_model::{ListQuery, Resource};
use crate::api::client::SchoolApi;
use crate::api::error::ApiError;
use crate::form::engine::FormEngine;
use crate::form::form_model::{OptionList, OptionSource};
use crate::session::session_model::SessionContext;

/// Largest option list fetched for a dropdown.
const OPTION_PAGE_SIZE: u32 = 200;

/// Ids of `resource` records matching `filter_key = parent_value`.
pub fn fetch_option_ids(
    api: &dyn SchoolApi,
    session: &SessionContext,
    resource: Resource,
    filter_key: &str,
    parent_value: &str,
) -> Result<Vec<String>, ApiError> {
    let query = option_query().with_filter(filter_key, parent_value);
    let page = api.list(session, resource, &query)?;
    Ok(page.items.iter().filter_map(record_id).collect())
}

fn option_query() -> ListQuery {
    ListQuery {
        page_size: OPTION_PAGE_SIZE,
        ..ListQuery::default()
    }
}

/// Record id as a string, whether the backend sends it as a number or text.
pub fn record_id(record: &Value) -> Option<String> {
    match record.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Load remote option lists for every dependent field whose parent currently
/// has a value, and hand them to the engine. Returns the fields refreshed.
pub fn refresh_dependent_options(
    engine: &mut FormEngine,
    api: &dyn SchoolApi,
    session: &SessionContext,
) -> Result<Vec<String>, ApiError> {
    let wanted: Vec<(String, String, Resource, String)> = engine
        .schema()
        .dependents
        .iter()
        .filter_map(|d| match &d.source {
            OptionSource::Remote { resource, filter_key } => {
                let parent_value = engine.value(&d.parent)?.display();
                Some((d.field.clone(), parent_value, *resource, filter_key.clone()))
            }
            OptionSource::Static(_) => None,
        })
        .collect();

    let mut refreshed = Vec::new();
    for (field, parent_value, resource, filter_key) in wanted {
        let ids = fetch_option_ids(api, session, resource, &filter_key, &parent_value)?;
        tracing::debug!(%field, parent = %parent_value, options = ids.len(), "dependent options loaded");
        engine.provide_dependent_options(&field, &parent_value, ids);
        refreshed.push(field);
    }
    Ok(refreshed)
}

/// Load the option lists of independent selects that are visible and hold a
/// value, so validation can check the value is still offered. Returns the
/// fields loaded.
pub fn load_option_lists(
    engine: &mut FormEngine,
    api: &dyn SchoolApi,
    session: &SessionContext,
) -> Result<Vec<String>, ApiError> {
    let wanted: Vec<OptionList> = engine
        .schema()
        .option_lists
        .iter()
        .filter(|list| engine.is_visible(&list.field) && engine.value(&list.field).is_some())
        .cloned()
        .collect();

    let mut loaded = Vec::new();
    for list in wanted {
        let mut query = option_query();
        if let Some((key, value)) = &list.filter {
            query = query.with_filter(key, value);
        }
        let page = api.list(session, list.resource, &query)?;
        let ids: Vec<String> = page.items.iter().filter_map(record_id).collect();
        tracing::debug!(field = %list.field, resource = %list.resource, options = ids.len(), "option list loaded");
        engine.set_options(&list.field, ids);
        loaded.push(list.field);
    }
    Ok(loaded)
}
