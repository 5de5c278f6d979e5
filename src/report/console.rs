use serde_json::Value;

use crate::api::api_model::{Page, Resource};
use crate::form::engine::FormEngine;
use crate::form::form_model::{FieldKind, FieldValue};
use crate::form::validation::ValidationErrors;
use crate::report::feedback::{Feedback, FeedbackKind};

// ============================================================================
// Console renderer: forms, validation errors, dialogs and record lists
// ============================================================================

/// Render the visible fields of a form, one per line.
///
/// Produces output like:
/// ```text
/// === User ===
/// [sections: student]
///
///   * type          enum     = Student   (Teacher | Student | School Admin)
///     lastName      text
///   * classId       select   = 7
/// ```
pub fn format_form(engine: &FormEngine) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {} ===\n", engine.schema().title));

    let sections = engine.active_sections();
    if !sections.is_empty() {
        out.push_str(&format!("[sections: {}]\n", sections.join(", ")));
    }
    out.push('\n');

    let fields = engine.visible_fields();
    let width = fields.iter().map(|f| f.name.len()).max().unwrap_or(0);

    for field in fields {
        let marker = if field.required { '*' } else { ' ' };
        let mut line = format!(
            "  {} {:<width$}  {:<8}",
            marker,
            field.name,
            field.kind.name(),
            width = width
        );

        if let Some(value) = engine.value(&field.name) {
            line.push_str(&format!(" = {}", display_value(value)));
        }

        let choices: Option<Vec<String>> = match &field.kind {
            FieldKind::Enum(opts) => Some(opts.clone()),
            _ => engine.options(&field.name).map(|o| o.to_vec()),
        };
        if let Some(choices) = choices.filter(|c| !c.is_empty()) {
            line.push_str(&format!("   ({})", choices.join(" | ")));
        }

        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn display_value(value: &FieldValue) -> String {
    match value {
        FieldValue::File(f) => format!("<file {} ({} bytes)>", f.file_name, f.size()),
        other => other.display(),
    }
}

/// One line per invalid field, in field order.
pub fn format_validation(errors: &ValidationErrors) -> String {
    if errors.is_empty() {
        return "\u{2713} Form is valid\n".to_string();
    }
    let mut out = format!("\u{2717} {} field(s) invalid\n", errors.len());
    for (field, message) in errors.iter() {
        out.push_str(&format!("    [{}] {}\n", field, message));
    }
    out
}

pub fn format_feedback(feedback: &Feedback) -> String {
    let marker = match feedback.kind {
        FeedbackKind::Success => "\u{2713}",
        FeedbackKind::Error => "\u{2717}",
    };
    format!("{} {}\n  {}\n", marker, feedback.title, feedback.message)
}

/// Tabular listing of a page of records: id plus the record's display name.
pub fn format_page(resource: Resource, page: &Page) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "=== {} (page {}/{}, {} total) ===\n",
        resource,
        page.pagination.page,
        page.pagination.page_count.max(1),
        page.pagination.total
    ));

    if page.items.is_empty() {
        out.push_str("  (no records)\n");
        return out;
    }

    for item in &page.items {
        let id = match item.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => "-".to_string(),
        };
        out.push_str(&format!("  {:<12} {}\n", id, record_label(item)));
    }
    out
}

/// Best human-readable name for a record.
pub fn record_label(item: &Value) -> String {
    let text = |key: &str| item.get(key).and_then(Value::as_str).map(str::to_string);

    if let (Some(first), last) = (text("firstName"), text("lastName")) {
        return match last {
            Some(last) => format!("{} {}", first, last),
            None => first,
        };
    }

    ["name", "title", "fileName"]
        .iter()
        .find_map(|k| text(k))
        .unwrap_or_default()
}
