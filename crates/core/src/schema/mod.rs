//! Declarative tool schemas.
//!
//! A schema only describes shape; checking it is the job of
//! [`crate::validation`]. The same description renders to the JSON Schema
//! advertised in `tools/list`, so what callers see and what gets enforced
//! cannot drift apart.

mod patterns;

pub use patterns::Pattern;

use serde::Serialize;
use serde_json::{json, Map, Value};

/// Semantic type of a field.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Integer,
    Number,
    String,
    Boolean,
    Enum(&'static [&'static str]),
    /// Object with a declared set of sub-fields.
    Object(ObjectSchema),
    /// Free-form object passed through to the remote service.
    Record,
    Array(Box<FieldSchema>),
    /// String, number or boolean.
    Scalar,
    Any,
}

impl FieldKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String | Self::Enum(_) => "string",
            Self::Boolean => "boolean",
            Self::Object(_) | Self::Record => "object",
            Self::Array(_) => "array",
            Self::Scalar => "string, number or boolean",
            Self::Any => "any",
        }
    }
}

/// One field descriptor: type, optionality, default and constraints.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub default: Option<Value>,
    pub minimum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub length: Option<usize>,
    pub pattern: Option<Pattern>,
}

impl FieldSchema {
    fn new(name: &'static str, description: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            description,
            kind,
            required: true,
            default: None,
            minimum: None,
            exclusive_minimum: None,
            maximum: None,
            min_length: None,
            max_length: None,
            length: None,
            pattern: None,
        }
    }

    pub fn integer(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, FieldKind::Integer)
    }

    pub fn number(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, FieldKind::Number)
    }

    pub fn string(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, FieldKind::String)
    }

    pub fn boolean(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, FieldKind::Boolean)
    }

    pub fn one_of(
        name: &'static str,
        description: &'static str,
        values: &'static [&'static str],
    ) -> Self {
        Self::new(name, description, FieldKind::Enum(values))
    }

    pub fn object(name: &'static str, description: &'static str, schema: ObjectSchema) -> Self {
        Self::new(name, description, FieldKind::Object(schema))
    }

    pub fn record(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, FieldKind::Record)
    }

    pub fn array(name: &'static str, description: &'static str, items: FieldSchema) -> Self {
        Self::new(name, description, FieldKind::Array(Box::new(items)))
    }

    pub fn scalar(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, FieldKind::Scalar)
    }

    pub fn any(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, FieldKind::Any)
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Value substituted when the field is absent. Implies optional.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.required = false;
        self.default = Some(value.into());
        self
    }

    pub fn min(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    pub fn max(mut self, maximum: f64) -> Self {
        self.maximum = Some(maximum);
        self
    }

    /// Strictly greater than zero.
    pub fn positive(mut self) -> Self {
        match self.kind {
            FieldKind::Integer => self.minimum = Some(1.0),
            _ => self.exclusive_minimum = Some(0.0),
        }
        self
    }

    pub fn non_negative(self) -> Self {
        self.min(0.0)
    }

    pub fn min_len(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    pub fn max_len(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Exact length in characters.
    pub fn exact_len(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    pub fn pattern(mut self, pattern: Pattern) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// JSON Schema rendering of this field.
    pub fn to_json_schema(&self) -> Value {
        let mut out = Map::new();
        let integer = matches!(self.kind, FieldKind::Integer);

        match &self.kind {
            FieldKind::Scalar => {
                out.insert("type".into(), json!(["string", "number", "boolean"]));
            }
            FieldKind::Any => {}
            kind => {
                out.insert("type".into(), json!(kind.type_name()));
            }
        }
        if !self.description.is_empty() {
            out.insert("description".into(), json!(self.description));
        }
        match &self.kind {
            FieldKind::Enum(values) => {
                out.insert("enum".into(), json!(values));
            }
            FieldKind::Object(schema) => {
                let rendered = schema.to_json_schema();
                if let Value::Object(rendered) = rendered {
                    for (key, value) in rendered {
                        if key != "type" {
                            out.insert(key, value);
                        }
                    }
                }
            }
            FieldKind::Array(items) => {
                out.insert("items".into(), items.to_json_schema());
            }
            _ => {}
        }
        if let Some(min) = self.minimum {
            out.insert("minimum".into(), render_number(min, integer));
        }
        if let Some(min) = self.exclusive_minimum {
            out.insert("exclusiveMinimum".into(), render_number(min, integer));
        }
        if let Some(max) = self.maximum {
            out.insert("maximum".into(), render_number(max, integer));
        }
        if let Some(len) = self.length {
            out.insert("minLength".into(), json!(len));
            out.insert("maxLength".into(), json!(len));
        } else {
            if let Some(min) = self.min_length {
                out.insert("minLength".into(), json!(min));
            }
            if let Some(max) = self.max_length {
                out.insert("maxLength".into(), json!(max));
            }
        }
        if let Some(pattern) = self.pattern {
            out.insert("pattern".into(), json!(pattern.source()));
        }
        if let Some(default) = &self.default {
            out.insert("default".into(), default.clone());
        }
        Value::Object(out)
    }
}

fn render_number(value: f64, integer: bool) -> Value {
    if integer && value.fract() == 0.0 {
        json!(value as i64)
    } else {
        json!(value)
    }
}

/// Ordered set of fields making up an object.
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    pub fields: Vec<FieldSchema>,
}

impl ObjectSchema {
    pub fn new(fields: Vec<FieldSchema>) -> Self {
        Self { fields }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.to_string(), f.to_json_schema()))
            .collect();
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name)
            .collect();

        let mut out = json!({
            "type": "object",
            "properties": properties,
        });
        if !required.is_empty() {
            out["required"] = json!(required);
        }
        out
    }
}

// Shorthands for the field shapes the catalog repeats.

/// Required positive integer identifier.
pub fn id(name: &'static str, description: &'static str) -> FieldSchema {
    FieldSchema::integer(name, description).positive()
}

/// Page size with a per-tool default.
pub fn limit(default: u32) -> FieldSchema {
    FieldSchema::integer("limit", "Maximum number of records to return")
        .positive()
        .max(2000.0)
        .default(default)
}

pub fn offset() -> FieldSchema {
    FieldSchema::integer("offset", "Number of records to skip")
        .non_negative()
        .default(0)
}

/// Chunk size for the `list_all_*` tools.
pub fn chunk_size() -> FieldSchema {
    FieldSchema::integer("chunk_size", "Records per page request while aggregating")
        .positive()
        .max(2000.0)
        .default(100)
}

pub fn date(name: &'static str, description: &'static str) -> FieldSchema {
    FieldSchema::string(name, description).pattern(Pattern::IsoDate)
}

/// Free-form payload object.
pub fn data(name: &'static str, description: &'static str) -> FieldSchema {
    FieldSchema::record(name, description)
}

/// Advisory safety metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Safety {
    ReadOnly,
    /// Changes remote state in a way this catalog can undo.
    #[default]
    Mutating,
    /// Irreversible through this catalog.
    Destructive,
}

/// Annotation pair reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Annotations {
    #[serde(rename = "readOnlyHint")]
    pub read_only: bool,
    #[serde(rename = "destructiveHint")]
    pub destructive: bool,
}

/// Immutable metadata of one tool.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub safety: Safety,
    pub input_schema: ObjectSchema,
}

impl ToolDefinition {
    pub fn new(name: &'static str, description: &'static str, input_schema: ObjectSchema) -> Self {
        Self {
            name,
            description,
            safety: Safety::default(),
            input_schema,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.safety = Safety::ReadOnly;
        self
    }

    pub fn destructive(mut self) -> Self {
        self.safety = Safety::Destructive;
        self
    }

    pub fn annotations(&self) -> Annotations {
        Annotations {
            read_only: self.safety == Safety::ReadOnly,
            destructive: self.safety == Safety::Destructive,
        }
    }
}
