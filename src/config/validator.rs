//! Resource declaration validation: names, field uniqueness, rule consistency.

use crate::config::{SortKey, RESERVED_FIELDS};
use crate::error::ConfigError;
use crate::resources::ResourceDef;
use crate::service::SchemaValidator;
use regex::Regex;
use std::collections::HashSet;

fn is_path_segment(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

/// Collections double as SQL table names, so they are held to identifier rules.
pub fn is_collection_name(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && s.len() <= 63
}

pub fn validate_resource(def: &ResourceDef) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidSchema {
        resource: def.name.to_string(),
        reason,
    };

    if !is_path_segment(def.path_segment) {
        return Err(invalid(format!("invalid path segment '{}'", def.path_segment)));
    }
    if !is_collection_name(def.collection) {
        return Err(invalid(format!("invalid collection name '{}'", def.collection)));
    }
    if def.schema.fields.is_empty() {
        return Err(invalid("schema declares no fields".into()));
    }

    let mut names = HashSet::new();
    for field in &def.schema.fields {
        if RESERVED_FIELDS.contains(&field.name.as_str()) {
            return Err(invalid(format!("field '{}' is managed by the store", field.name)));
        }
        if !names.insert(field.name.as_str()) {
            return Err(invalid(format!("duplicate field '{}'", field.name)));
        }
        if let Some(pattern) = &field.rule.pattern {
            Regex::new(pattern).map_err(|e| invalid(format!("field '{}': bad pattern: {}", field.name, e)))?;
        }
        if let (Some(min), Some(max)) = (field.rule.minimum, field.rule.maximum) {
            if min > max {
                return Err(invalid(format!("field '{}': minimum exceeds maximum", field.name)));
            }
        }
        if let Some(default) = &field.default {
            if let Err(violations) = SchemaValidator::check_field(field, default) {
                let reasons: Vec<_> = violations.into_iter().map(|v| v.message).collect();
                return Err(invalid(format!(
                    "default for '{}' violates its own rule: {}",
                    field.name,
                    reasons.join("; ")
                )));
            }
        }
    }

    if let SortKey::Field(key) = &def.schema.sort_key {
        if !names.contains(key.as_str()) {
            return Err(invalid(format!("sort key '{}' is not a field", key)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EntitySchema, FieldSpec};

    fn def(schema: EntitySchema) -> ResourceDef {
        ResourceDef {
            name: "Crate",
            plural: "Crates",
            path_segment: "crates",
            collection: "crates",
            schema,
        }
    }

    #[test]
    fn shipped_resources_are_valid() {
        for d in [
            crate::resources::mango::definition(),
            crate::resources::order::definition(),
            crate::resources::user::definition(),
        ] {
            validate_resource(&d).unwrap();
        }
    }

    #[test]
    fn default_must_satisfy_rule() {
        let schema = EntitySchema::new().field(FieldSpec::text("unit").one_of(["KG", "BOX"]).default_value("TON"));
        let err = validate_resource(&def(schema)).unwrap_err();
        assert!(err.to_string().contains("default for 'unit'"), "{err}");
    }

    #[test]
    fn reserved_and_duplicate_fields_are_rejected() {
        let schema = EntitySchema::new().field(FieldSpec::text("id"));
        assert!(validate_resource(&def(schema)).is_err());

        let schema = EntitySchema::new()
            .field(FieldSpec::text("name"))
            .field(FieldSpec::number("name"));
        assert!(validate_resource(&def(schema)).is_err());
    }

    #[test]
    fn bad_pattern_and_sort_key_are_rejected() {
        let schema = EntitySchema::new().field(FieldSpec::text("code").pattern("(unclosed"));
        assert!(validate_resource(&def(schema)).is_err());

        let schema = EntitySchema::new().field(FieldSpec::text("name")).sort_by("price");
        assert!(validate_resource(&def(schema)).is_err());
    }

    #[test]
    fn names_are_checked() {
        assert!(is_collection_name("mangoes"));
        assert!(!is_collection_name("drop table"));
        assert!(!is_collection_name("Mangoes"));
        let mut d = def(EntitySchema::new().field(FieldSpec::text("name")));
        d.path_segment = "/crates";
        assert!(validate_resource(&d).is_err());
    }
}
