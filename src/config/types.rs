//! Declarative entity schema types: fields, kinds, validation rules, defaults.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON type a field must hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Integer,
    Boolean,
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Integer => "integer",
            FieldKind::Boolean => "boolean",
        }
    }

    pub fn accepts(&self, v: &Value) -> bool {
        match self {
            FieldKind::Text => v.is_string(),
            FieldKind::Number => v.is_number(),
            FieldKind::Integer => {
                v.is_i64() || v.is_u64() || v.as_f64().map(|n| n.fract() == 0.0).unwrap_or(false)
            }
            FieldKind::Boolean => v.is_boolean(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub allowed: Option<Vec<Value>>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
    /// Strip surrounding whitespace from text before checking.
    #[serde(default)]
    pub trim: Option<bool>,
    #[serde(default)]
    pub lowercase: Option<bool>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub rule: ValidationRule,
    /// Applied when the field is omitted or null.
    #[serde(default)]
    pub default: Option<Value>,
}

impl FieldSpec {
    pub fn new(name: &str, kind: FieldKind) -> Self {
        FieldSpec {
            name: name.to_string(),
            kind,
            rule: ValidationRule::default(),
            default: None,
        }
    }

    pub fn text(name: &str) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn number(name: &str) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub fn integer(name: &str) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn boolean(name: &str) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn required(mut self) -> Self {
        self.rule.required = Some(true);
        self
    }

    pub fn is_required(&self) -> bool {
        self.rule.required == Some(true)
    }

    pub fn one_of<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.rule.allowed = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn minimum(mut self, min: f64) -> Self {
        self.rule.minimum = Some(min);
        self
    }

    pub fn maximum(mut self, max: f64) -> Self {
        self.rule.maximum = Some(max);
        self
    }

    pub fn length(mut self, min: u32, max: u32) -> Self {
        self.rule.min_length = Some(min);
        self.rule.max_length = Some(max);
        self
    }

    pub fn max_length(mut self, max: u32) -> Self {
        self.rule.max_length = Some(max);
        self
    }

    pub fn pattern(mut self, re: &str) -> Self {
        self.rule.pattern = Some(re.to_string());
        self
    }

    pub fn format(mut self, format: &str) -> Self {
        self.rule.format = Some(format.to_string());
        self
    }

    pub fn trimmed(mut self) -> Self {
        self.rule.trim = Some(true);
        self
    }

    pub fn lowercase(mut self) -> Self {
        self.rule.lowercase = Some(true);
        self
    }

    pub fn default_value(mut self, v: impl Into<Value>) -> Self {
        self.default = Some(v.into());
        self
    }
}

/// Ordering applied by `list`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SortKey {
    /// Insertion order (oldest first).
    CreatedAt,
    /// Ascending by a schema field; ties fall back to creation order. Missing values
    /// sort first. Mixed types follow jsonb order (string < number < boolean), and
    /// string comparison follows the store (collation in PostgreSQL, bytes in memory).
    Field(String),
}

#[derive(Clone, Debug)]
pub struct EntitySchema {
    pub fields: Vec<FieldSpec>,
    pub sort_key: SortKey,
}

impl Default for EntitySchema {
    fn default() -> Self {
        EntitySchema {
            fields: Vec::new(),
            sort_key: SortKey::CreatedAt,
        }
    }
}

impl EntitySchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn sort_by(mut self, field: &str) -> Self {
        self.sort_key = SortKey::Field(field.to_string());
        self
    }
}
