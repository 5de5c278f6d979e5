use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::form::form_model::{FieldKind, FieldSpec, FieldValue, Record, Refinement, Rule};

/// Field → message. Empty means valid. The first error recorded for a field wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
        f.write_str(&parts.join("; "))
    }
}

static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

fn email_regex() -> Option<&'static Regex> {
    EMAIL_PATTERN.as_ref()
}

/// Validate one field. `key` is where errors are attached (`classes[0].classId`
/// for array items). `options` is the current option list for selects, if known.
pub fn validate_field(
    spec: &FieldSpec,
    key: &str,
    value: Option<&FieldValue>,
    options: Option<&[String]>,
    errors: &mut ValidationErrors,
) {
    let value = match value.filter(|v| !v.is_blank()) {
        Some(v) => v,
        None => {
            if spec.required {
                errors.insert(key, format!("{} is required", spec.label));
            }
            return;
        }
    };

    if let Some(message) = kind_error(spec, value, options) {
        errors.insert(key, message);
        return;
    }

    if let FieldKind::Array(array) = &spec.kind {
        validate_rows(spec, array.min_rows, &array.item_fields, key, value, errors);
        return;
    }

    for rule in &spec.rules {
        if let Some(message) = rule_error(spec, rule, value) {
            errors.insert(key, message);
            return;
        }
    }
}

fn kind_error(spec: &FieldSpec, value: &FieldValue, options: Option<&[String]>) -> Option<String> {
    let label = &spec.label;
    match (&spec.kind, value) {
        (FieldKind::Number, FieldValue::Number(_)) => None,
        (FieldKind::Number, _) => Some(format!("{} must be a number", label)),

        (FieldKind::Date, FieldValue::Date(_)) => None,
        (FieldKind::Date, _) => Some(format!("{} must be a date (YYYY-MM-DD)", label)),

        (FieldKind::Bool, FieldValue::Bool(_)) => None,
        (FieldKind::Bool, _) => Some(format!("{} must be yes or no", label)),

        (FieldKind::Email, FieldValue::Text(s)) => {
            let ok = email_regex().map(|re| re.is_match(s)).unwrap_or(true);
            (!ok).then(|| format!("{} must be a valid email address", label))
        }

        (FieldKind::Mobile { max_digits }, FieldValue::Text(s)) => {
            let ok = s.len() == *max_digits && s.chars().all(|c| c.is_ascii_digit());
            (!ok).then(|| format!("{} must be {} digits", label, max_digits))
        }

        (FieldKind::Enum(choices), FieldValue::Text(s)) => (!choices.iter().any(|c| c == s))
            .then(|| format!("{} must be one of: {}", label, choices.join(", "))),

        (FieldKind::Select, FieldValue::Text(s)) => match options {
            Some(opts) if !opts.iter().any(|o| o == s) => {
                Some(format!("{} '{}' is not an available option", label, s))
            }
            _ => None,
        },

        // An existing attachment id (edit flow) or a freshly picked file
        (FieldKind::File, FieldValue::File(_) | FieldValue::Text(_)) => None,
        (FieldKind::File, _) => Some(format!("{} must be a file", label)),

        (FieldKind::Array(_), FieldValue::Rows(_)) => None,
        (FieldKind::Array(_), _) => Some(format!("{} must be a list of entries", label)),

        (FieldKind::Text, FieldValue::Text(_)) => None,
        (_, _) => Some(format!("{} has an invalid value", label)),
    }
}

fn rule_error(spec: &FieldSpec, rule: &Rule, value: &FieldValue) -> Option<String> {
    let label = &spec.label;
    match (rule, value) {
        (Rule::Pattern { regex: Some(re), message }, FieldValue::Text(s)) => {
            (!re.is_match(s)).then(|| message.clone())
        }
        (Rule::MinLength(min), FieldValue::Text(s)) => (s.chars().count() < *min)
            .then(|| format!("{} must be at least {} characters", label, min)),
        (Rule::MaxLength(max), FieldValue::Text(s)) => (s.chars().count() > *max)
            .then(|| format!("{} must be at most {} characters", label, max)),
        (Rule::Min(min), FieldValue::Number(n)) => {
            (n < min).then(|| {
                if *min == 0.0 {
                    format!("{} cannot be negative", label)
                } else {
                    format!("{} must be at least {}", label, min)
                }
            })
        }
        (Rule::Max(max), FieldValue::Number(n)) => {
            (n > max).then(|| format!("{} must be at most {}", label, max))
        }
        (Rule::Integer, FieldValue::Number(n)) => {
            (n.fract() != 0.0).then(|| format!("{} must be a whole number", label))
        }
        _ => None,
    }
}

fn validate_rows(
    spec: &FieldSpec,
    min_rows: usize,
    item_fields: &[FieldSpec],
    key: &str,
    value: &FieldValue,
    errors: &mut ValidationErrors,
) {
    let rows: &[Record] = match value {
        FieldValue::Rows(rows) => rows,
        _ => return,
    };

    let min = if spec.required { min_rows.max(1) } else { min_rows };
    if rows.len() < min {
        errors.insert(key, format!("{} needs at least {} entries", spec.label, min));
        return;
    }

    for (i, row) in rows.iter().enumerate() {
        for item in item_fields {
            let item_key = format!("{}[{}].{}", key, i, item.name);
            validate_field(item, &item_key, row.get(&item.name), None, errors);
        }
    }
}

/// Cross-field rules, evaluated after per-field validation.
pub fn apply_refinements(
    refinements: &[Refinement],
    value_of: impl Fn(&str) -> Option<FieldValue>,
    errors: &mut ValidationErrors,
) {
    for refinement in refinements {
        match refinement {
            Refinement::RequiredWhen {
                field,
                when,
                equals,
                message,
            } => {
                let active = value_of(when).map(|v| v.matches(equals)).unwrap_or(false);
                let blank = value_of(field).map(|v| v.is_blank()).unwrap_or(true);
                if active && blank {
                    errors.insert(field, message.clone());
                }
            }
            Refinement::NotBefore {
                field,
                other,
                message,
            } => {
                let a = value_of(field).and_then(|v| v.as_date());
                let b = value_of(other).and_then(|v| v.as_date());
                if let (Some(a), Some(b)) = (a, b) {
                    if a < b {
                        errors.insert(field, message.clone());
                    }
                }
            }
        }
    }
}
