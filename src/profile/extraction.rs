//! Parsing of the extraction model's JSON output
//!
//! The model is asked for a fixed schema but may wrap it in a markdown
//! fence or return loosely typed values. Only recognized keys are read;
//! anything that fails numeric coercion becomes `None`.

use crate::error::CompassError;
use crate::models::{IncomePeriod, ProfileUpdate};
use crate::Result;
use serde_json::{Map, Value};

/// Remove a surrounding ```json / ``` fence, if any
pub fn strip_code_fence(raw: &str) -> &str {
    let raw = raw.trim();

    let inner = if let Some((_, rest)) = raw.split_once("```json") {
        rest.split("```").next().unwrap_or(rest)
    } else if let Some((_, rest)) = raw.split_once("```") {
        rest.split("```").next().unwrap_or(rest)
    } else {
        raw
    };

    inner.trim()
}

/// Parse raw model output into a sparse profile update
pub fn parse_extraction(raw: &str) -> Result<ProfileUpdate> {
    let cleaned = strip_code_fence(raw);

    let value: Value = serde_json::from_str(cleaned)?;

    let object = value.as_object().ok_or_else(|| {
        CompassError::ExtractionError(format!("Expected a JSON object, got: {}", cleaned))
    })?;

    Ok(update_from_object(object))
}

fn update_from_object(object: &Map<String, Value>) -> ProfileUpdate {
    let field = |key: &str| object.get(key).unwrap_or(&Value::Null);

    ProfileUpdate {
        age: coerce_count(field("age")),
        income: coerce_number(field("income")).filter(|v| *v >= 0.0),
        income_type: coerce_text(field("income_type")).and_then(|s| IncomePeriod::parse(&s)),
        income_scope: coerce_text(field("income_scope")),
        residence: coerce_text(field("residence")),
        is_seoul_resident: coerce_bool(field("is_seoul_resident")),
        employment_status: coerce_text(field("employment_status")),
        housing_type: coerce_text(field("housing_type")),
        special_conditions: coerce_list(field("special_conditions")),
        needs: coerce_list(field("needs")),
        household_size: coerce_count(field("household_size")),
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    };

    number.filter(|v| v.is_finite())
}

/// Positive whole numbers (age, household size)
fn coerce_count(value: &Value) -> Option<u32> {
    coerce_number(value)
        .filter(|v| *v >= 1.0 && *v <= f64::from(u32::MAX))
        .map(|v| v.trunc() as u32)
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "예" | "네" => Some(true),
            "false" | "no" | "아니오" | "아니요" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn coerce_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(coerce_text).collect(),
        Value::String(_) => coerce_text(value).into_iter().collect(),
        _ => Vec::new(),
    }
}
