use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::form::error::FormError;
use crate::form::form_model::{
    ArraySpec, ConditionalSection, FieldKind, FieldSpec, FieldValue, FileHandle, FormSchema,
    OptionSource, Record,
};
use crate::form::input_filter::coerce;
use crate::form::payload::{flatten_record, reshape};
use crate::form::validation::{ValidationErrors, apply_refinements, validate_field};

/// What a single `set_field` did to the form.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub field: String,
    /// Value after input filtering; `None` when the field was cleared
    pub stored: Option<FieldValue>,
    /// Dependent fields whose selection was invalidated by this change
    pub cleared: Vec<String>,
    /// Fields that became visible / hidden (discriminant changes only)
    pub shown: Vec<String>,
    pub hidden: Vec<String>,
}

/// Live state of one form: schema, current values and option lists.
///
/// Created per form use, seeded with defaults (add) or a fetched record
/// (edit), mutated field by field, and dropped once submitted.
#[derive(Debug, Clone)]
pub struct FormEngine {
    schema: FormSchema,
    values: Record,
    /// Dependent field → parent value → allowed values
    dependent_options: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    /// Options for selects that do not depend on another field
    options: BTreeMap<String, Vec<String>>,
    submitted: bool,
}

impl FormEngine {
    /// Initialize with defaults computed against today's local date.
    pub fn initialize(schema: FormSchema, initial: Record) -> Self {
        Self::initialize_on(schema, initial, chrono::Local::now().date_naive())
    }

    /// Initialize with defaults computed against `today`.
    ///
    /// Fields without an initial value take their schema default; initial
    /// values pass through the same input filtering as `set_field`. Keys the
    /// schema does not declare are ignored.
    pub fn initialize_on(schema: FormSchema, initial: Record, today: NaiveDate) -> Self {
        let mut values = Record::new();
        for spec in schema.all_fields() {
            if let Some(default) = &spec.default {
                values.insert(spec.name.clone(), default.resolve(today));
            }
        }

        for (name, value) in initial {
            match schema.find_field(&name) {
                Some(spec) => match coerce(&spec.kind, value) {
                    Some(v) => {
                        values.insert(name, v);
                    }
                    None => {
                        values.remove(&name);
                    }
                },
                None => tracing::debug!(form = %schema.name, field = %name, "ignoring undeclared initial value"),
            }
        }

        let dependent_options = schema
            .dependents
            .iter()
            .filter_map(|d| match &d.source {
                OptionSource::Static(choices) => Some((d.field.clone(), choices.clone())),
                OptionSource::Remote { .. } => None,
            })
            .collect();

        Self {
            schema,
            values,
            dependent_options,
            options: BTreeMap::new(),
            submitted: false,
        }
    }

    /// Edit flow: seed the form from a record fetched from the backend.
    pub fn from_record(schema: FormSchema, record: &Value) -> Self {
        let flat = flatten_record(&schema, record);
        let initial = json_to_record(&flat);
        Self::initialize(schema, initial)
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn values(&self) -> &Record {
        &self.values
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn mark_submitted(&mut self) {
        self.submitted = true;
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Update one field, re-evaluating the sections it discriminates and the
    /// dependent options it parents.
    ///
    /// Values of fields that become hidden stay in memory (a quick toggle back
    /// restores them) but are never submitted.
    pub fn set_field(
        &mut self,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> Result<FieldChange, FormError> {
        self.store(name, Some(value.into()))
    }

    pub fn clear_field(&mut self, name: &str) -> Result<FieldChange, FormError> {
        self.store(name, None)
    }

    fn store(&mut self, name: &str, value: Option<FieldValue>) -> Result<FieldChange, FormError> {
        let kind = self.spec(name)?.kind.clone();
        let discriminant = self.schema.is_discriminant(name);
        let visible_before = if discriminant { self.visible_names() } else { BTreeSet::new() };

        let previous = self.values.get(name).cloned();
        let stored = value.and_then(|v| coerce(&kind, v));
        match &stored {
            Some(v) => {
                self.values.insert(name.to_string(), v.clone());
            }
            None => {
                self.values.remove(name);
            }
        }

        let mut cleared = Vec::new();
        if previous != stored {
            self.cascade(name, &mut cleared);
        }

        let (shown, hidden) = if discriminant {
            let visible_after = self.visible_names();
            let shown: Vec<String> = visible_after.difference(&visible_before).cloned().collect();
            let hidden: Vec<String> = visible_before.difference(&visible_after).cloned().collect();
            if !shown.is_empty() || !hidden.is_empty() {
                tracing::debug!(form = %self.schema.name, field = %name, ?shown, ?hidden, "sections re-evaluated");
            }
            (shown, hidden)
        } else {
            (Vec::new(), Vec::new())
        };

        Ok(FieldChange {
            field: name.to_string(),
            stored,
            cleared,
            shown,
            hidden,
        })
    }

    /// Invalidate dependent selections after `parent` changed. A dependent is
    /// kept only when the new parent value has a known option list that still
    /// contains the current selection.
    fn cascade(&mut self, parent: &str, cleared: &mut Vec<String>) {
        let mut pending = vec![parent.to_string()];
        while let Some(current) = pending.pop() {
            let parent_value = self.values.get(&current).map(FieldValue::display);
            let dependents: Vec<String> = self
                .schema
                .dependents_of(&current)
                .map(|d| d.field.clone())
                .collect();

            for field in dependents {
                let Some(selected) = self.values.get(&field).map(FieldValue::display) else {
                    continue;
                };
                let still_offered = parent_value
                    .as_deref()
                    .and_then(|pv| self.dependent_options.get(&field)?.get(pv))
                    .map(|opts| opts.iter().any(|o| *o == selected))
                    .unwrap_or(false);

                if !still_offered {
                    self.values.remove(&field);
                    tracing::debug!(form = %self.schema.name, %field, parent = %current, "dependent selection cleared");
                    cleared.push(field.clone());
                    pending.push(field);
                }
            }
        }
    }

    /// Apply a flat input map (from a YAML/JSON file) in schema order, so
    /// parents are set before their dependents. Unknown keys are rejected.
    pub fn apply_input(&mut self, input: &Map<String, Value>) -> Result<Vec<FieldChange>, FormError> {
        if let Some(unknown) = input.keys().find(|k| self.schema.find_field(k).is_none()) {
            return Err(FormError::UnknownField {
                form: self.schema.name.clone(),
                field: unknown.clone(),
            });
        }

        let ordered: Vec<String> = self
            .schema
            .all_fields()
            .map(|f| f.name.clone())
            .filter(|n| input.contains_key(n))
            .collect::<Vec<_>>();

        let mut changes = Vec::new();
        let mut seen = BTreeSet::new();
        for name in ordered {
            if !seen.insert(name.clone()) {
                continue;
            }
            let change = match input.get(&name).and_then(FieldValue::from_json) {
                Some(v) => self.set_field(&name, v)?,
                None => self.clear_field(&name)?,
            };
            changes.push(change);
        }
        Ok(changes)
    }

    pub fn push_row(&mut self, name: &str, row: Record) -> Result<usize, FormError> {
        let mut rows = self.rows(name)?;
        rows.push(row);
        let len = rows.len();
        self.set_field(name, rows)?;
        Ok(len)
    }

    pub fn remove_row(&mut self, name: &str, index: usize) -> Result<Record, FormError> {
        let mut rows = self.rows(name)?;
        if index >= rows.len() {
            return Err(FormError::RowOutOfRange {
                field: name.to_string(),
                index,
            });
        }
        let removed = rows.remove(index);
        self.set_field(name, rows)?;
        Ok(removed)
    }

    fn rows(&self, name: &str) -> Result<Vec<Record>, FormError> {
        if !matches!(self.spec(name)?.kind, FieldKind::Array(_)) {
            return Err(FormError::NotAnArray(name.to_string()));
        }
        Ok(match self.values.get(name) {
            Some(FieldValue::Rows(rows)) => rows.clone(),
            _ => Vec::new(),
        })
    }

    // ------------------------------------------------------------------
    // Options
    // ------------------------------------------------------------------

    /// Supply options for a select that does not depend on another field.
    pub fn set_options(&mut self, field: &str, options: Vec<String>) {
        self.options.insert(field.to_string(), options);
    }

    /// Supply the option list `field` has while its parent equals `parent_value`
    /// (typically fetched from the backend).
    pub fn provide_dependent_options(&mut self, field: &str, parent_value: &str, options: Vec<String>) {
        self.dependent_options
            .entry(field.to_string())
            .or_default()
            .insert(parent_value.to_string(), options);
    }

    /// Current option list for `field`, if known.
    pub fn options(&self, field: &str) -> Option<&[String]> {
        match self.schema.dependent_for(field) {
            Some(dep) => {
                let parent_value = self.values.get(&dep.parent)?.display();
                self.dependent_options
                    .get(field)?
                    .get(&parent_value)
                    .map(Vec::as_slice)
            }
            None => self.options.get(field).map(Vec::as_slice),
        }
    }

    // ------------------------------------------------------------------
    // Visibility
    // ------------------------------------------------------------------

    fn section_active(&self, section: &ConditionalSection) -> bool {
        self.values
            .get(&section.discriminant)
            .map(|v| v.matches(&section.equals))
            .unwrap_or(false)
    }

    /// Names of the conditional sections active for the current discriminants.
    pub fn active_sections(&self) -> Vec<&str> {
        self.schema
            .sections
            .iter()
            .filter(|s| self.section_active(s))
            .map(|s| s.name.as_str())
            .collect()
    }

    /// Fields to render: base fields, then the fields of every active section.
    pub fn visible_fields(&self) -> Vec<&FieldSpec> {
        let mut out: Vec<&FieldSpec> = self.schema.fields.iter().collect();
        for section in self.schema.sections.iter().filter(|s| self.section_active(s)) {
            for field in &section.fields {
                if !out.iter().any(|f| f.name == field.name) {
                    out.push(field);
                }
            }
        }
        out
    }

    pub fn is_visible(&self, name: &str) -> bool {
        self.visible_fields().iter().any(|f| f.name == name)
    }

    fn visible_names(&self) -> BTreeSet<String> {
        self.visible_fields().iter().map(|f| f.name.clone()).collect()
    }

    // ------------------------------------------------------------------
    // Validation and payload
    // ------------------------------------------------------------------

    /// Per-field validation of the visible fields, then cross-field refinements.
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        let visible = self.visible_fields();

        for spec in &visible {
            validate_field(
                spec,
                &spec.name,
                self.values.get(&spec.name),
                self.options(&spec.name),
                &mut errors,
            );
        }

        let visible_names: BTreeSet<&str> = visible.iter().map(|f| f.name.as_str()).collect();
        apply_refinements(
            &self.schema.refinements,
            |name| {
                if visible_names.contains(name) {
                    self.values.get(name).cloned()
                } else {
                    None
                }
            },
            &mut errors,
        );

        if !errors.is_empty() {
            tracing::debug!(form = %self.schema.name, errors = errors.len(), "validation failed");
        }
        errors
    }

    /// Visible file fields holding a freshly picked file.
    pub fn pending_files(&self) -> Vec<(String, &FileHandle)> {
        self.visible_fields()
            .into_iter()
            .filter(|f| matches!(f.kind, FieldKind::File))
            .filter_map(|f| match self.values.get(&f.name) {
                Some(FieldValue::File(handle)) => Some((f.name.clone(), handle)),
                _ => None,
            })
            .collect()
    }

    /// Build the backend payload from the visible fields only.
    ///
    /// `attachments` maps file field names to registered attachment ids; a
    /// picked file without an entry is an error.
    pub fn payload(&self, attachments: &BTreeMap<String, String>) -> Result<Value, FormError> {
        let mut flat = Map::new();
        for spec in self.visible_fields() {
            let Some(value) = self.values.get(&spec.name).filter(|v| !v.is_blank()) else {
                continue;
            };
            let json = match (&spec.kind, value) {
                (FieldKind::File, FieldValue::File(_)) => attachments
                    .get(&spec.name)
                    .map(|id| Value::String(id.clone()))
                    .ok_or_else(|| FormError::UnresolvedFile(spec.name.clone()))?,
                (FieldKind::Array(array), FieldValue::Rows(rows)) => rows_json(array, rows),
                _ => value.to_json(),
            };
            flat.insert(spec.key().to_string(), json);
        }
        Ok(Value::Object(reshape(&self.schema.payload_rules, flat)))
    }

    fn spec(&self, name: &str) -> Result<&FieldSpec, FormError> {
        self.schema
            .find_field(name)
            .ok_or_else(|| FormError::UnknownField {
                form: self.schema.name.clone(),
                field: name.to_string(),
            })
    }
}

fn rows_json(array: &ArraySpec, rows: &[Record]) -> Value {
    Value::Array(
        rows.iter()
            .map(|row| {
                let mut obj = Map::new();
                for item in &array.item_fields {
                    if let Some(v) = row.get(&item.name).filter(|v| !v.is_blank()) {
                        obj.insert(item.key().to_string(), v.to_json());
                    }
                }
                Value::Object(obj)
            })
            .collect(),
    )
}

/// Convert a flat JSON object into engine values (no kind coercion yet).
pub fn json_to_record(map: &Map<String, Value>) -> Record {
    map.iter()
        .filter_map(|(k, v)| FieldValue::from_json(v).map(|fv| (k.clone(), fv)))
        .collect()
}
