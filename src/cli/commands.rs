use std::path::Path;

use serde_json::{Map, Value};

use crate::api::api_model::{ListQuery, Resource};
use crate::api::client::SchoolApi;
use crate::catalog::{Access, FormKind, resource_roles};
use crate::catalog::options::{load_option_lists, refresh_dependent_options};
use crate::form::engine::FormEngine;
use crate::form::error::FormError;
use crate::form::form_model::{FileHandle, Record};
use crate::report::console::{format_feedback, format_form, format_page, format_validation};
use crate::report::feedback::Feedback;
use crate::session::session_model::{SessionContext, SessionRole};
use crate::session::store::SessionStore;
use crate::submit::submitter::{SubmitError, SubmitMode, Submitter};
use crate::trace::logger::TraceLogger;

// ============================================================================
// forms / describe / validate subcommands (local only)
// ============================================================================

pub fn cmd_forms() {
    for kind in FormKind::ALL {
        let schema = kind.schema();
        println!("  {:<12} {:<14} {}", kind.name(), kind.resource(), schema.title);
    }
}

pub fn cmd_describe(kind: FormKind, set: &[(String, String)]) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = FormEngine::initialize(kind.schema(), Record::new());
    apply_sets(&mut engine, set)?;
    print!("{}", format_form(&engine));
    Ok(())
}

/// Validate input locally. Returns whether the form is valid.
pub fn cmd_validate(
    kind: FormKind,
    input: Option<&str>,
    set: &[(String, String)],
) -> Result<bool, Box<dyn std::error::Error>> {
    let mut engine = FormEngine::initialize(kind.schema(), Record::new());
    if let Some(path) = input {
        engine.apply_input(&load_input(path)?)?;
    }
    apply_sets(&mut engine, set)?;

    let errors = engine.validate();
    print!("{}", format_validation(&errors));
    Ok(errors.is_empty())
}

// ============================================================================
// submit subcommand
// ============================================================================

/// Everything `submit` needs besides the backend and session.
#[derive(Debug, Clone, Default)]
pub struct SubmitArgs {
    pub input: Option<String>,
    pub id: Option<String>,
    pub set: Vec<(String, String)>,
    pub files: Vec<(String, String)>,
}

/// Add or edit a record. Returns whether the record was saved.
pub fn cmd_submit(
    kind: FormKind,
    args: &SubmitArgs,
    api: &dyn SchoolApi,
    session: &SessionContext,
    tracer: &TraceLogger,
    verbose: u8,
) -> Result<bool, Box<dyn std::error::Error>> {
    ensure_allowed(kind, session)?;

    let resource = kind.resource();
    let (mut engine, mode) = match &args.id {
        Some(id) => {
            let record = api.fetch(session, resource, id)?;
            (FormEngine::from_record(kind.schema(), &record), SubmitMode::Update(id.clone()))
        }
        None => (FormEngine::initialize(kind.schema(), Record::new()), SubmitMode::Create),
    };

    if let Some(path) = &args.input {
        engine.apply_input(&load_input(path)?)?;
    }
    apply_sets(&mut engine, &args.set)?;

    for (field, path) in &args.files {
        let handle = FileHandle::from_path(Path::new(path)).map_err(|e| FormError::Input {
            source_name: path.clone(),
            detail: e.to_string(),
        })?;
        engine.set_field(field, handle)?;
    }

    refresh_dependent_options(&mut engine, api, session)?;
    load_option_lists(&mut engine, api, session)?;

    if verbose > 0 {
        eprint!("{}", format_form(&engine));
    }

    let submitter = Submitter::new(api, session, tracer);
    match submitter.submit(&mut engine, resource, &mode) {
        Ok(receipt) => {
            print!("{}", format_feedback(&Feedback::from_receipt(&engine.schema().title, &receipt)));
            Ok(true)
        }
        Err(err) => {
            if let SubmitError::Invalid(errors) = &err {
                print!("{}", format_validation(errors));
            }
            print!("{}", format_feedback(&Feedback::from_submit_error(&err)));
            if let Some(path) = tracer.path() {
                println!("  Details were written to {}", path.display());
            }
            Ok(false)
        }
    }
}

// ============================================================================
// list / delete subcommands
// ============================================================================

pub fn cmd_list(
    api: &dyn SchoolApi,
    session: &SessionContext,
    resource: Resource,
    query: &ListQuery,
) -> Result<(), Box<dyn std::error::Error>> {
    ensure_resource_allowed(resource, Access::Read, session)?;
    let page = api.list(session, resource, query)?;
    print!("{}", format_page(resource, &page));
    Ok(())
}

pub fn cmd_delete(
    api: &dyn SchoolApi,
    session: &SessionContext,
    resource: Resource,
    id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    ensure_resource_allowed(resource, Access::Delete, session)?;
    api.delete(session, resource, id)?;
    println!("Deleted {} {}", resource, id);
    Ok(())
}

// ============================================================================
// session subcommand
// ============================================================================

pub fn cmd_session_set(
    store: &SessionStore,
    tenant: &str,
    token: &str,
    roles: &[SessionRole],
    school: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = SessionContext::new(tenant, token);
    for role in roles {
        session = session.with_role(*role);
    }
    if let Some(school) = school {
        session = session.with_school(school);
    }
    store.save(&session)?;
    println!("Session stored in {}", store.path().display());
    Ok(())
}

pub fn cmd_session_show(store: &SessionStore) -> Result<(), Box<dyn std::error::Error>> {
    let session = store.load()?;
    println!("tenant: {}", session.tenant_id.as_deref().unwrap_or("-"));
    println!("school: {}", session.school_id.as_deref().unwrap_or("-"));
    println!(
        "roles:  {}",
        session
            .roles
            .iter()
            .map(|r| format!("{:?}", r))
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("token:  {}", mask_token(session.token.as_deref()));
    Ok(())
}

pub fn cmd_session_clear(store: &SessionStore) -> Result<(), Box<dyn std::error::Error>> {
    store.clear()?;
    println!("Session cleared");
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Load a YAML or JSON object of field values.
pub fn load_input(path: &str) -> Result<Map<String, Value>, FormError> {
    let content = std::fs::read_to_string(path).map_err(|e| FormError::Input {
        source_name: path.to_string(),
        detail: e.to_string(),
    })?;
    parse_input(path, &content)
}

pub fn parse_input(source_name: &str, content: &str) -> Result<Map<String, Value>, FormError> {
    if content.trim().is_empty() {
        return Ok(Map::new());
    }
    // YAML is a superset of JSON, so one parser covers both.
    let value: Value = serde_yaml::from_str(content).map_err(|e| FormError::Input {
        source_name: source_name.to_string(),
        detail: e.to_string(),
    })?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(FormError::Input {
            source_name: source_name.to_string(),
            detail: "expected a mapping of field names to values".into(),
        }),
    }
}

fn apply_sets(engine: &mut FormEngine, set: &[(String, String)]) -> Result<(), FormError> {
    for (field, value) in set {
        engine.set_field(field, value.as_str())?;
    }
    Ok(())
}

pub fn ensure_allowed(kind: FormKind, session: &SessionContext) -> Result<(), FormError> {
    if session.has_any_role(kind.allowed_roles()) {
        Ok(())
    } else {
        Err(FormError::Forbidden(kind.name().to_string()))
    }
}

pub fn ensure_resource_allowed(
    resource: Resource,
    access: Access,
    session: &SessionContext,
) -> Result<(), FormError> {
    if session.has_any_role(resource_roles(resource, access)) {
        Ok(())
    } else {
        Err(FormError::AccessDenied {
            action: access.verb(),
            resource: resource.to_string(),
        })
    }
}

/// Show only the last four characters of a token.
pub fn mask_token(token: Option<&str>) -> String {
    match token {
        Some(t) if t.chars().count() > 4 => {
            let tail: String = t.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
            format!("****{}", tail)
        }
        Some(_) => "****".to_string(),
        None => "-".to_string(),
    }
}
