//! Schema validation: presence, type, allowed values, bounds, defaults.

use crate::config::{EntitySchema, FieldSpec, ValidationRule, RESERVED_FIELDS};
use crate::error::{AppError, FieldViolation};
use regex::Regex;
use serde_json::{Map, Value};

pub struct SchemaValidator;

impl SchemaValidator {
    /// Validate a full input and produce the normalized record. Unknown and store-managed
    /// keys are dropped, defaults fill omitted or null fields, and every violation is reported.
    pub fn validate(schema: &EntitySchema, input: &Map<String, Value>) -> Result<Map<String, Value>, AppError> {
        let mut out = Map::new();
        let mut violations = Vec::new();
        for spec in &schema.fields {
            let value = input
                .get(&spec.name)
                .filter(|v| !v.is_null())
                .or(spec.default.as_ref());
            match value {
                None if spec.is_required() => {
                    violations.push(FieldViolation::new(&spec.name, "required", format!("{} is required", spec.name)));
                }
                None => {}
                Some(v) => match Self::check_field(spec, v) {
                    Ok(normalized) => {
                        out.insert(spec.name.clone(), normalized);
                    }
                    Err(mut errs) => violations.append(&mut errs),
                },
            }
        }
        if violations.is_empty() {
            Ok(out)
        } else {
            Err(AppError::Validation(violations))
        }
    }

    /// Apply a partial update onto a stored record and validate the result as a whole.
    /// A null in the patch clears the field, so its default (if any) applies again.
    pub fn validate_merged(
        schema: &EntitySchema,
        existing: &Map<String, Value>,
        patch: &Map<String, Value>,
    ) -> Result<Map<String, Value>, AppError> {
        let mut merged = existing.clone();
        for (k, v) in patch {
            if RESERVED_FIELDS.contains(&k.as_str()) {
                continue;
            }
            if v.is_null() {
                merged.remove(k);
            } else {
                merged.insert(k.clone(), v.clone());
            }
        }
        Self::validate(schema, &merged)
    }

    /// Check one non-null value against its field spec. Returns the normalized value.
    pub fn check_field(spec: &FieldSpec, v: &Value) -> Result<Value, Vec<FieldViolation>> {
        let col = spec.name.as_str();
        if !spec.kind.accepts(v) {
            return Err(vec![FieldViolation::new(
                col,
                "type",
                format!("{} must be of type {}", col, spec.kind.name()),
            )]);
        }
        let v = normalize(v, &spec.rule);
        let violations = validate_rule(col, &v, &spec.rule);
        if violations.is_empty() {
            Ok(v)
        } else {
            Err(violations)
        }
    }
}

fn normalize(v: &Value, rule: &ValidationRule) -> Value {
    match v.as_str() {
        Some(s) => {
            let mut s = if rule.trim == Some(true) { s.trim().to_string() } else { s.to_string() };
            if rule.lowercase == Some(true) {
                s = s.to_lowercase();
            }
            Value::String(s)
        }
        None => v.clone(),
    }
}

fn validate_rule(col: &str, v: &Value, rule: &ValidationRule) -> Vec<FieldViolation> {
    let mut out = Vec::new();
    if let Some(format) = &rule.format {
        if let Some(violation) = validate_format(col, v, format) {
            out.push(violation);
        }
    }
    if let Some(s) = v.as_str() {
        let len = s.chars().count();
        if let Some(max) = rule.max_length {
            if len > max as usize {
                out.push(FieldViolation::new(
                    col,
                    "max_length",
                    format!("{} must be at most {} characters", col, max),
                ));
            }
        }
        if let Some(min) = rule.min_length {
            if len < min as usize {
                out.push(FieldViolation::new(
                    col,
                    "min_length",
                    format!("{} must be at least {} characters", col, min),
                ));
            }
        }
        if let Some(ref pattern) = rule.pattern {
            match Regex::new(pattern) {
                Ok(re) if re.is_match(s) => {}
                Ok(_) => out.push(FieldViolation::new(
                    col,
                    "pattern",
                    format!("{} does not match required pattern", col),
                )),
                Err(_) => out.push(FieldViolation::new(col, "pattern", format!("invalid pattern for {}", col))),
            }
        }
    }
    if let Some(ref allowed) = rule.allowed {
        if !allowed.iter().any(|a| value_eq(v, a)) {
            let listed: Vec<String> = allowed.iter().map(display_value).collect();
            out.push(FieldViolation::new(
                col,
                "enum",
                format!("{} must be one of: {}", col, listed.join(", ")),
            ));
        }
    }
    if let Some(n) = v.as_f64() {
        if let Some(min) = rule.minimum {
            if n < min {
                out.push(FieldViolation::new(col, "minimum", format!("{} must be at least {}", col, min)));
            }
        }
        if let Some(max) = rule.maximum {
            if n > max {
                out.push(FieldViolation::new(col, "maximum", format!("{} must be at most {}", col, max)));
            }
        }
    }
    out
}

fn display_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(s), Value::String(t)) => s == t,
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}

fn validate_format(col: &str, v: &Value, format: &str) -> Option<FieldViolation> {
    let s = v.as_str()?;
    match format.to_lowercase().as_str() {
        "email" => {
            let valid = match s.split_once('@') {
                Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
                None => false,
            };
            (!valid).then(|| FieldViolation::new(col, "format", format!("{} must be a valid email", col)))
        }
        "uuid" => uuid::Uuid::parse_str(s)
            .is_err()
            .then(|| FieldViolation::new(col, "format", format!("{} must be a valid UUID", col))),
        _ => None,
    }
}
