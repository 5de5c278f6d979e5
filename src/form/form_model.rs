use std::collections::BTreeMap;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde_json::Value;

use crate::api::api_model::Resource;

// ============================================================================
// Field values
// ============================================================================

/// One sub-record of a repeatable field (a class-configuration row).
pub type Record = BTreeMap<String, FieldValue>;

/// A value held by the form engine. An unset field has no entry at all.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
    File(FileHandle),
    Rows(Vec<Record>),
}

impl FieldValue {
    /// Blank text and empty row lists count as "not provided".
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Rows(rows) => rows.is_empty(),
            _ => false,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Display form used for discriminant matching and option lookups.
    pub fn display(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => format_number(*n),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            FieldValue::File(f) => f.file_name.clone(),
            FieldValue::Rows(rows) => format!("{} rows", rows.len()),
        }
    }

    pub fn matches(&self, expected: &str) -> bool {
        self.display() == expected
    }

    /// JSON rendering for payloads. Files render as their name; the submitter
    /// replaces them with attachment ids before anything is sent.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Number(n) => number_json(*n),
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            FieldValue::File(f) => Value::String(f.file_name.clone()),
            FieldValue::Rows(rows) => Value::Array(
                rows.iter()
                    .map(|row| {
                        Value::Object(
                            row.iter()
                                .filter(|(_, v)| !v.is_blank())
                                .map(|(k, v)| (k.clone(), v.to_json()))
                                .collect(),
                        )
                    })
                    .collect(),
            ),
        }
    }

    /// Raw conversion from JSON/YAML input. `null` yields `None`.
    /// Kind-specific coercion happens later in the engine.
    pub fn from_json(value: &Value) -> Option<FieldValue> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(FieldValue::Bool(*b)),
            Value::Number(n) => n.as_f64().map(FieldValue::Number),
            Value::String(s) => Some(FieldValue::Text(s.clone())),
            Value::Array(items) => Some(FieldValue::Rows(
                items
                    .iter()
                    .filter_map(|item| item.as_object())
                    .map(|obj| {
                        obj.iter()
                            .filter_map(|(k, v)| FieldValue::from_json(v).map(|fv| (k.clone(), fv)))
                            .collect()
                    })
                    .collect(),
            )),
            Value::Object(_) => Some(FieldValue::Text(value.to_string())),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(d: NaiveDate) -> Self {
        FieldValue::Date(d)
    }
}

impl From<FileHandle> for FieldValue {
    fn from(f: FileHandle) -> Self {
        FieldValue::File(f)
    }
}

impl From<Vec<Record>> for FieldValue {
    fn from(rows: Vec<Record>) -> Self {
        FieldValue::Rows(rows)
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn number_json(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

// ============================================================================
// File handles
// ============================================================================

/// A file picked by the user, held in memory until submit.
#[derive(Debug, Clone, PartialEq)]
pub struct FileHandle {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl FileHandle {
    pub fn new(file_name: &str, content_type: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let content_type = guess_content_type(&file_name);
        Ok(Self::new(&file_name, content_type, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// SHA-1 of the content, registered alongside the attachment.
    pub fn fingerprint(&self) -> String {
        use sha1::{Digest, Sha1};

        let mut hasher = Sha1::new();
        hasher.update(&self.bytes);
        format!("{:x}", hasher.finalize())
    }
}

pub fn guess_content_type(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, e)| e.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "mp4" => "video/mp4",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

// ============================================================================
// Field declarations
// ============================================================================

#[derive(Debug, Clone)]
pub enum FieldKind {
    Text,
    Email,
    /// Digits only, capped at `max_digits` on input
    Mobile { max_digits: usize },
    Number,
    Date,
    Bool,
    /// Closed set of choices known at schema time
    Enum(Vec<String>),
    /// Choices supplied at runtime (from the backend or a parent field)
    Select,
    File,
    Array(ArraySpec),
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Email => "email",
            FieldKind::Mobile { .. } => "mobile",
            FieldKind::Number => "number",
            FieldKind::Date => "date",
            FieldKind::Bool => "bool",
            FieldKind::Enum(_) => "enum",
            FieldKind::Select => "select",
            FieldKind::File => "file",
            FieldKind::Array(_) => "array",
        }
    }
}

/// Item layout of a repeatable field.
#[derive(Debug, Clone)]
pub struct ArraySpec {
    pub item_fields: Vec<FieldSpec>,
    /// Minimum number of rows once the array is provided (or required)
    pub min_rows: usize,
}

#[derive(Debug, Clone)]
pub enum Rule {
    /// `regex` is `None` when the pattern failed to compile; the rule is then skipped
    Pattern { regex: Option<Regex>, message: String },
    MinLength(usize),
    MaxLength(usize),
    Min(f64),
    Max(f64),
    Integer,
}

impl Rule {
    pub fn pattern(pattern: &str, message: &str) -> Rule {
        let regex = match Regex::new(pattern) {
            Ok(r) => Some(r),
            Err(e) => {
                tracing::error!(%pattern, error = %e, "invalid field pattern, rule disabled");
                None
            }
        };
        Rule::Pattern {
            regex,
            message: message.to_string(),
        }
    }
}

/// Default applied at initialization for fields without an initial value.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Value(FieldValue),
    Today,
    /// April 30 of the following year (end of the academic licence year)
    NextAcademicYearEnd,
}

impl DefaultValue {
    pub fn resolve(&self, today: NaiveDate) -> FieldValue {
        match self {
            DefaultValue::Value(v) => v.clone(),
            DefaultValue::Today => FieldValue::Date(today),
            DefaultValue::NextAcademicYearEnd => FieldValue::Date(
                NaiveDate::from_ymd_opt(today.year() + 1, 4, 30).unwrap_or(today),
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    pub rules: Vec<Rule>,
    pub default: Option<DefaultValue>,
    /// Key used in the submitted payload when it differs from `name`
    pub payload_key: Option<String>,
}

impl FieldSpec {
    pub fn new(name: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind,
            required: false,
            rules: Vec::new(),
            default: None,
            payload_key: None,
        }
    }

    pub fn text(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    pub fn email(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Email)
    }

    /// Ten-digit mobile number.
    pub fn mobile(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Mobile { max_digits: 10 })
    }

    /// Non-negative whole number (head counts, licence counts).
    pub fn count(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Number)
            .rule(Rule::Integer)
            .rule(Rule::Min(0.0))
    }

    pub fn date(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Date)
    }

    pub fn flag(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Bool)
    }

    pub fn choice(name: &str, label: &str, options: &[&str]) -> Self {
        Self::new(
            name,
            label,
            FieldKind::Enum(options.iter().map(|o| o.to_string()).collect()),
        )
    }

    pub fn select(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Select)
    }

    pub fn file(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::File)
    }

    pub fn rows(name: &str, label: &str, item_fields: Vec<FieldSpec>, min_rows: usize) -> Self {
        Self::new(
            name,
            label,
            FieldKind::Array(ArraySpec {
                item_fields,
                min_rows,
            }),
        )
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn default_value(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn payload_key(mut self, key: &str) -> Self {
        self.payload_key = Some(key.to_string());
        self
    }

    pub fn key(&self) -> &str {
        self.payload_key.as_deref().unwrap_or(&self.name)
    }
}

// ============================================================================
// Schema structure
// ============================================================================

/// Fields active only while `discriminant` displays as `equals`.
#[derive(Debug, Clone)]
pub struct ConditionalSection {
    pub name: String,
    pub discriminant: String,
    pub equals: String,
    pub fields: Vec<FieldSpec>,
}

impl ConditionalSection {
    pub fn new(name: &str, discriminant: &str, equals: &str, fields: Vec<FieldSpec>) -> Self {
        Self {
            name: name.to_string(),
            discriminant: discriminant.to_string(),
            equals: equals.to_string(),
            fields,
        }
    }
}

/// Where a dependent field's options come from.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionSource {
    /// Parent value → allowed child values
    Static(BTreeMap<String, Vec<String>>),
    /// Records of `resource` filtered by `filter_key = <parent value>`
    Remote { resource: Resource, filter_key: String },
}

/// An option list for `field` that depends on the current value of `parent`.
#[derive(Debug, Clone, PartialEq)]
pub struct DependentOption {
    pub field: String,
    pub parent: String,
    pub source: OptionSource,
}

impl DependentOption {
    pub fn remote(field: &str, parent: &str, resource: Resource, filter_key: &str) -> Self {
        Self {
            field: field.to_string(),
            parent: parent.to_string(),
            source: OptionSource::Remote {
                resource,
                filter_key: filter_key.to_string(),
            },
        }
    }

    pub fn fixed(field: &str, parent: &str, choices: &[(&str, &[&str])]) -> Self {
        Self {
            field: field.to_string(),
            parent: parent.to_string(),
            source: OptionSource::Static(
                choices
                    .iter()
                    .map(|(p, opts)| (p.to_string(), opts.iter().map(|o| o.to_string()).collect()))
                    .collect(),
            ),
        }
    }
}

/// Options of a select that does not depend on another field: the ids of
/// `resource` records, optionally narrowed by one equality filter.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionList {
    pub field: String,
    pub resource: Resource,
    pub filter: Option<(String, String)>,
}

impl OptionList {
    pub fn records_of(field: &str, resource: Resource) -> Self {
        Self {
            field: field.to_string(),
            resource,
            filter: None,
        }
    }

    pub fn filtered(mut self, key: &str, value: &str) -> Self {
        self.filter = Some((key.to_string(), value.to_string()));
        self
    }
}

/// Cross-field rules evaluated after per-field validation.
#[derive(Debug, Clone, PartialEq)]
pub enum Refinement {
    /// `field` must be non-blank while `when` displays as `equals`
    RequiredWhen {
        field: String,
        when: String,
        equals: String,
        message: String,
    },
    /// Date `field` must not be earlier than date `other`
    NotBefore {
        field: String,
        other: String,
        message: String,
    },
}

/// Reshaping from the flat form state into the backend's nested payload.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadRule {
    /// Move `(payload key, entry key)` pairs into one entry appended to the
    /// array `into`, tagged with `tag = (key, value)`.
    Group {
        into: String,
        tag: Option<(String, String)>,
        fields: Vec<(String, String)>,
    },
    /// Move the listed payload keys into the object `under`.
    Nest { under: String, fields: Vec<String> },
}

/// Declarative description of one screen's form.
#[derive(Debug, Clone)]
pub struct FormSchema {
    pub name: String,
    pub title: String,
    pub fields: Vec<FieldSpec>,
    pub sections: Vec<ConditionalSection>,
    pub dependents: Vec<DependentOption>,
    pub option_lists: Vec<OptionList>,
    pub refinements: Vec<Refinement>,
    pub payload_rules: Vec<PayloadRule>,
}

impl FormSchema {
    pub fn new(name: &str, title: &str) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
            fields: Vec::new(),
            sections: Vec::new(),
            dependents: Vec::new(),
            option_lists: Vec::new(),
            refinements: Vec::new(),
            payload_rules: Vec::new(),
        }
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn section(mut self, section: ConditionalSection) -> Self {
        self.sections.push(section);
        self
    }

    pub fn dependent(mut self, dependent: DependentOption) -> Self {
        self.dependents.push(dependent);
        self
    }

    pub fn options_from(mut self, list: OptionList) -> Self {
        self.option_lists.push(list);
        self
    }

    pub fn refine(mut self, refinement: Refinement) -> Self {
        self.refinements.push(refinement);
        self
    }

    pub fn payload_rule(mut self, rule: PayloadRule) -> Self {
        self.payload_rules.push(rule);
        self
    }

    /// Every declared field, base fields first, then each section's in order.
    pub fn all_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields
            .iter()
            .chain(self.sections.iter().flat_map(|s| s.fields.iter()))
    }

    pub fn find_field(&self, name: &str) -> Option<&FieldSpec> {
        self.all_fields().find(|f| f.name == name)
    }

    pub fn is_discriminant(&self, name: &str) -> bool {
        self.sections.iter().any(|s| s.discriminant == name)
    }

    pub fn dependents_of<'a>(&'a self, parent: &'a str) -> impl Iterator<Item = &'a DependentOption> {
        self.dependents.iter().filter(move |d| d.parent == parent)
    }

    pub fn dependent_for(&self, field: &str) -> Option<&DependentOption> {
        self.dependents.iter().find(|d| d.field == field)
    }
}
