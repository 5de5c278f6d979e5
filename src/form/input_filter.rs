use chrono::NaiveDate;

use crate::form::form_model::{FieldKind, FieldValue, Record};

/// Keep only ASCII digits, capped at `max_digits`.
pub fn digits_only(raw: &str, max_digits: usize) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit())
        .take(max_digits)
        .collect()
}

/// Parse user-typed numeric text. Accepts surrounding whitespace and
/// thousands separators ("1,200").
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let t = raw.trim();
    NaiveDate::parse_from_str(t, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(t, "%d/%m/%Y"))
        .ok()
        // Backend timestamps: keep the date part
        .or_else(|| t.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "on" => Some(true),
        "false" | "no" | "n" | "0" | "off" => Some(false),
        _ => None,
    }
}

/// Input-level filtering applied on every `set_field`.
///
/// Values that cannot be coerced are kept as typed so validation can report
/// them; blank text becomes `None` (field cleared).
pub fn coerce(kind: &FieldKind, value: FieldValue) -> Option<FieldValue> {
    if value.is_blank() && !matches!(kind, FieldKind::Array(_)) {
        return None;
    }

    match (kind, value) {
        (FieldKind::Mobile { max_digits }, FieldValue::Text(s)) => {
            let digits = digits_only(&s, *max_digits);
            if digits.is_empty() { None } else { Some(FieldValue::Text(digits)) }
        }
        (FieldKind::Mobile { max_digits }, FieldValue::Number(n)) => {
            let digits = digits_only(&format!("{:.0}", n.abs()), *max_digits);
            Some(FieldValue::Text(digits))
        }
        (FieldKind::Number, FieldValue::Text(s)) => Some(
            parse_number(&s)
                .map(FieldValue::Number)
                .unwrap_or(FieldValue::Text(s)),
        ),
        (FieldKind::Date, FieldValue::Text(s)) => Some(
            parse_date(&s)
                .map(FieldValue::Date)
                .unwrap_or(FieldValue::Text(s)),
        ),
        (FieldKind::Bool, FieldValue::Text(s)) => Some(
            parse_flag(&s)
                .map(FieldValue::Bool)
                .unwrap_or(FieldValue::Text(s)),
        ),
        // Ids for selects and enums arrive as numbers from YAML and JSON
        (FieldKind::Select | FieldKind::Enum(_) | FieldKind::Text, FieldValue::Number(n)) => {
            Some(FieldValue::Text(FieldValue::Number(n).display()))
        }
        (FieldKind::Text | FieldKind::Email | FieldKind::Select | FieldKind::Enum(_), FieldValue::Text(s)) => {
            Some(FieldValue::Text(s.trim().to_string()))
        }
        (FieldKind::Array(spec), FieldValue::Rows(rows)) => Some(FieldValue::Rows(
            rows.into_iter()
                .map(|row| coerce_row(&spec.item_fields, row))
                .collect(),
        )),
        (_, other) => Some(other),
    }
}

fn coerce_row(item_fields: &[crate::form::form_model::FieldSpec], row: Record) -> Record {
    row.into_iter()
        .filter_map(|(key, value)| {
            let coerced = match item_fields.iter().find(|f| f.name == key) {
                Some(spec) => coerce(&spec.kind, value),
                None => Some(value),
            };
            coerced.map(|v| (key, v))
        })
        .collect()
}
