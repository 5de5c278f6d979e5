use serde_json::{Map, Value};

use crate::form::form_model::{FieldKind, FieldSpec, FormSchema, PayloadRule};

// ============================================================================
// Flat form state → backend shape
// ============================================================================

/// Apply the schema's payload rules to a flat object keyed by payload keys.
///
/// `Group` rules collect their fields into one tagged entry appended to an
/// array (`principalName` → `contacts[n].name` with `role: "principal"`);
/// a group with none of its fields present adds no entry. `Nest` rules move
/// keys into a sub-object.
pub fn reshape(rules: &[PayloadRule], mut flat: Map<String, Value>) -> Map<String, Value> {
    for rule in rules {
        match rule {
            PayloadRule::Group { into, tag, fields } => {
                let mut entry = Map::new();
                for (source, target) in fields {
                    if let Some(v) = flat.remove(source) {
                        entry.insert(target.clone(), v);
                    }
                }
                if entry.is_empty() {
                    continue;
                }
                if let Some((k, v)) = tag {
                    entry.insert(k.clone(), Value::String(v.clone()));
                }
                let slot = flat
                    .entry(into.clone())
                    .or_insert_with(|| Value::Array(Vec::new()));
                match slot {
                    Value::Array(items) => items.push(Value::Object(entry)),
                    other => *other = Value::Array(vec![Value::Object(entry)]),
                }
            }
            PayloadRule::Nest { under, fields } => {
                let mut nested = Map::new();
                for key in fields {
                    if let Some(v) = flat.remove(key) {
                        nested.insert(key.clone(), v);
                    }
                }
                if nested.is_empty() {
                    continue;
                }
                match flat.entry(under.clone()).or_insert_with(|| Value::Object(Map::new())) {
                    Value::Object(existing) => existing.extend(nested),
                    other => *other = Value::Object(nested),
                }
            }
        }
    }
    flat
}

// ============================================================================
// Backend record → flat form state (edit flows)
// ============================================================================

/// Inverse of [`reshape`] plus payload-key renames: turn a fetched record
/// into a flat map keyed by form field names, ready for `FormEngine::initialize`.
///
/// Keys the schema does not declare are dropped.
pub fn flatten_record(schema: &FormSchema, record: &Value) -> Map<String, Value> {
    let mut flat = match record {
        Value::Object(map) => map.clone(),
        _ => return Map::new(),
    };

    for rule in schema.payload_rules.iter().rev() {
        match rule {
            PayloadRule::Nest { under, fields } => {
                if let Some(Value::Object(nested)) = flat.remove(under) {
                    for key in fields {
                        if let Some(v) = nested.get(key) {
                            flat.insert(key.clone(), v.clone());
                        }
                    }
                }
            }
            PayloadRule::Group { into, tag, fields } => {
                let entry = flat
                    .get(into)
                    .and_then(Value::as_array)
                    .and_then(|items| find_tagged(items, tag.as_ref()))
                    .cloned();
                if let Some(Value::Object(entry)) = entry {
                    for (source, target) in fields {
                        if let Some(v) = entry.get(target) {
                            flat.insert(source.clone(), v.clone());
                        }
                    }
                }
            }
        }
    }

    let mut out = Map::new();
    for spec in schema.all_fields() {
        if let Some(v) = flat.get(spec.key()) {
            out.insert(spec.name.clone(), unkey_value(spec, v));
        }
    }
    out
}

fn find_tagged<'a>(items: &'a [Value], tag: Option<&(String, String)>) -> Option<&'a Value> {
    match tag {
        Some((k, v)) => items
            .iter()
            .find(|item| item.get(k).and_then(Value::as_str) == Some(v.as_str())),
        None => items.first(),
    }
}

/// Array items carry their own payload keys; map them back to item field names.
/// Related records may arrive populated (`{ "id": ... }`); keep only the id.
fn unkey_value(spec: &FieldSpec, value: &Value) -> Value {
    match (&spec.kind, value) {
        (FieldKind::Array(array), Value::Array(rows)) => Value::Array(
            rows.iter()
                .map(|row| {
                    let mut out = Map::new();
                    for item in &array.item_fields {
                        if let Some(v) = row.get(item.key()) {
                            out.insert(item.name.clone(), unkey_value(item, v));
                        }
                    }
                    Value::Object(out)
                })
                .collect(),
        ),
        (_, Value::Object(obj)) => obj.get("id").cloned().unwrap_or(Value::Null),
        _ => value.clone(),
    }
}
