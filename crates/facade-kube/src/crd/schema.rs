//! CRD schema representation
//!
//! Structured types for the OpenAPI v3 schemas carried by generated
//! definitions. User fragments are parsed into [`SchemaProperty`] by the
//! translator and rendered back to JSON when the definition is assembled.

use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

/// CRD naming information
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CrdNames {
    /// Kind (e.g., "Widget")
    pub kind: String,
    /// Plural name (e.g., "widgets")
    pub plural: String,
    /// Singular name (e.g., "widget")
    pub singular: String,
    /// Short names for kubectl (e.g., ["wdg"])
    pub short_names: Vec<String>,
    /// List kind (e.g., "WidgetList")
    pub list_kind: String,
    /// Categories for grouping in kubectl (e.g., ["facade"])
    pub categories: Vec<String>,
}

impl CrdNames {
    pub fn to_value(&self) -> Value {
        let mut names = Map::new();
        names.insert("kind".into(), json!(self.kind));
        names.insert("listKind".into(), json!(self.list_kind));
        names.insert("plural".into(), json!(self.plural));
        names.insert("singular".into(), json!(self.singular));
        if !self.short_names.is_empty() {
            names.insert("shortNames".into(), json!(self.short_names));
        }
        if !self.categories.is_empty() {
            names.insert("categories".into(), json!(self.categories));
        }
        Value::Object(names)
    }
}

/// Schema for a single property
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaProperty {
    /// Property type
    pub type_: PropertyType,
    /// Short title
    pub title: Option<String>,
    /// Human-readable description
    pub description: Option<String>,
    /// Default value
    pub default: Option<Value>,
    /// Example value
    pub example: Option<Value>,
    /// Format hint (e.g., "date-time", "email", "uri")
    pub format: Option<String>,
    /// Regex pattern for strings
    pub pattern: Option<String>,
    /// Allowed values (enum)
    pub enum_values: Option<Vec<Value>>,
    /// Minimum value for numbers
    pub minimum: Option<f64>,
    /// Maximum value for numbers
    pub maximum: Option<f64>,
    /// Whether `minimum` is exclusive
    pub exclusive_minimum: bool,
    /// Whether `maximum` is exclusive
    pub exclusive_maximum: bool,
    /// Multiple of (for numbers)
    pub multiple_of: Option<f64>,
    /// Minimum string length
    pub min_length: Option<u64>,
    /// Maximum string length
    pub max_length: Option<u64>,
    /// Minimum array items
    pub min_items: Option<u64>,
    /// Maximum array items
    pub max_items: Option<u64>,
    /// Minimum object properties
    pub min_properties: Option<u64>,
    /// Maximum object properties
    pub max_properties: Option<u64>,
    /// Whether null is allowed
    pub nullable: bool,
    /// Nested object properties
    pub properties: Option<BTreeMap<String, SchemaProperty>>,
    /// Required nested properties
    pub required: Option<Vec<String>>,
    /// Array item schema
    pub items: Option<Box<SchemaProperty>>,
    /// Additional properties for objects
    pub additional_properties: Option<AdditionalProperties>,
    /// All of these schemas must match
    pub all_of: Option<Vec<SchemaProperty>>,
    /// At least one of these schemas must match
    pub any_of: Option<Vec<SchemaProperty>>,
    /// Exactly one of these schemas must match
    pub one_of: Option<Vec<SchemaProperty>>,
    /// This schema must not match
    pub not: Option<Box<SchemaProperty>>,
    /// Preserve unknown fields
    pub x_preserve_unknown: bool,
    /// Kubernetes embedded resource
    pub x_embedded_resource: bool,
    /// Integer or string (for ports, etc.)
    pub x_int_or_string: bool,
    /// List semantics: atomic, set or map
    pub x_list_type: Option<String>,
    /// Keys identifying entries of a map-type list
    pub x_list_map_keys: Option<Vec<String>>,
    /// Map semantics: granular or atomic
    pub x_map_type: Option<String>,
    /// CEL validation rules, kept verbatim
    pub x_validations: Option<Vec<Value>>,
}

impl SchemaProperty {
    /// Create a simple string property
    pub fn string() -> Self {
        Self {
            type_: PropertyType::String,
            ..Default::default()
        }
    }

    /// Create a simple integer property
    pub fn integer() -> Self {
        Self {
            type_: PropertyType::Integer,
            ..Default::default()
        }
    }

    /// Create an object property with nested properties
    pub fn object(properties: BTreeMap<String, SchemaProperty>) -> Self {
        Self {
            type_: PropertyType::Object,
            properties: Some(properties),
            ..Default::default()
        }
    }

    /// Create an array property with item schema
    pub fn array(items: SchemaProperty) -> Self {
        Self {
            type_: PropertyType::Array,
            items: Some(Box::new(items)),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Render as an OpenAPI v3 JSON document
    ///
    /// Unset fields are omitted, so a parsed fragment renders back to the
    /// fragment it was read from.
    pub fn to_value(&self) -> Value {
        let mut out = Map::new();

        if let Some(type_) = self.type_.as_str() {
            out.insert("type".into(), json!(type_));
        }
        insert_opt(&mut out, "title", self.title.as_ref().map(|v| json!(v)));
        insert_opt(&mut out, "description", self.description.as_ref().map(|v| json!(v)));
        insert_opt(&mut out, "default", self.default.clone());
        insert_opt(&mut out, "example", self.example.clone());
        insert_opt(&mut out, "format", self.format.as_ref().map(|v| json!(v)));
        insert_opt(&mut out, "pattern", self.pattern.as_ref().map(|v| json!(v)));
        insert_opt(&mut out, "enum", self.enum_values.as_ref().map(|v| json!(v)));
        insert_opt(&mut out, "minimum", self.minimum.map(number));
        insert_opt(&mut out, "maximum", self.maximum.map(number));
        insert_flag(&mut out, "exclusiveMinimum", self.exclusive_minimum);
        insert_flag(&mut out, "exclusiveMaximum", self.exclusive_maximum);
        insert_opt(&mut out, "multipleOf", self.multiple_of.map(number));
        insert_opt(&mut out, "minLength", self.min_length.map(|v| json!(v)));
        insert_opt(&mut out, "maxLength", self.max_length.map(|v| json!(v)));
        insert_opt(&mut out, "minItems", self.min_items.map(|v| json!(v)));
        insert_opt(&mut out, "maxItems", self.max_items.map(|v| json!(v)));
        insert_opt(&mut out, "minProperties", self.min_properties.map(|v| json!(v)));
        insert_opt(&mut out, "maxProperties", self.max_properties.map(|v| json!(v)));
        insert_flag(&mut out, "nullable", self.nullable);

        if let Some(properties) = &self.properties {
            let rendered: Map<String, Value> = properties
                .iter()
                .map(|(name, prop)| (name.clone(), prop.to_value()))
                .collect();
            out.insert("properties".into(), Value::Object(rendered));
        }
        insert_opt(&mut out, "required", self.required.as_ref().map(|v| json!(v)));
        insert_opt(&mut out, "items", self.items.as_ref().map(|i| i.to_value()));
        insert_opt(
            &mut out,
            "additionalProperties",
            self.additional_properties.as_ref().map(AdditionalProperties::to_value),
        );
        insert_opt(&mut out, "allOf", self.all_of.as_deref().map(render_all));
        insert_opt(&mut out, "anyOf", self.any_of.as_deref().map(render_all));
        insert_opt(&mut out, "oneOf", self.one_of.as_deref().map(render_all));
        insert_opt(&mut out, "not", self.not.as_ref().map(|n| n.to_value()));

        insert_flag(&mut out, "x-kubernetes-preserve-unknown-fields", self.x_preserve_unknown);
        insert_flag(&mut out, "x-kubernetes-embedded-resource", self.x_embedded_resource);
        insert_flag(&mut out, "x-kubernetes-int-or-string", self.x_int_or_string);
        insert_opt(&mut out, "x-kubernetes-list-type", self.x_list_type.as_ref().map(|v| json!(v)));
        insert_opt(
            &mut out,
            "x-kubernetes-list-map-keys",
            self.x_list_map_keys.as_ref().map(|v| json!(v)),
        );
        insert_opt(&mut out, "x-kubernetes-map-type", self.x_map_type.as_ref().map(|v| json!(v)));
        insert_opt(
            &mut out,
            "x-kubernetes-validations",
            self.x_validations.as_ref().map(|v| json!(v)),
        );

        Value::Object(out)
    }
}

fn insert_opt(out: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        out.insert(key.to_string(), value);
    }
}

fn insert_flag(out: &mut Map<String, Value>, key: &str, flag: bool) {
    if flag {
        out.insert(key.to_string(), Value::Bool(true));
    }
}

/// Render whole numbers as integers so `minimum: 1` stays `1`
fn number(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() < 9_007_199_254_740_992.0 {
        json!(v as i64)
    } else {
        json!(v)
    }
}

fn render_all(schemas: &[SchemaProperty]) -> Value {
    Value::Array(schemas.iter().map(SchemaProperty::to_value).collect())
}

/// Property type in OpenAPI schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PropertyType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    /// No `type` given (allowed with int-or-string or preserve-unknown-fields)
    #[default]
    Unspecified,
}

impl PropertyType {
    /// Type names accepted in a schema
    pub const NAMES: &'static [&'static str] =
        &["string", "integer", "number", "boolean", "array", "object"];

    /// Parse from string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&'static str> {
        match self {
            Self::String => Some("string"),
            Self::Integer => Some("integer"),
            Self::Number => Some("number"),
            Self::Boolean => Some("boolean"),
            Self::Array => Some("array"),
            Self::Object => Some("object"),
            Self::Unspecified => None,
        }
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().unwrap_or("<unspecified>"))
    }
}

/// Additional properties configuration for objects
#[derive(Debug, Clone, PartialEq)]
pub enum AdditionalProperties {
    /// Additional properties are allowed (any type)
    Allowed,
    /// Additional properties are not allowed
    Denied,
    /// Additional properties must match a schema
    Schema(Box<SchemaProperty>),
}

impl AdditionalProperties {
    pub fn to_value(&self) -> Value {
        match self {
            Self::Allowed => Value::Bool(true),
            Self::Denied => Value::Bool(false),
            Self::Schema(schema) => schema.to_value(),
        }
    }
}

/// Printer column for kubectl output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterColumn {
    /// Column name shown in kubectl output
    pub name: String,
    /// Column type (string, integer, date, etc.)
    pub type_: String,
    /// JSON path to extract value
    pub json_path: String,
    /// Column description
    pub description: Option<String>,
    /// Priority (0 = always shown, higher = hidden by default)
    pub priority: i32,
    /// Output format
    pub format: Option<String>,
}

impl PrinterColumn {
    pub fn new(name: impl Into<String>, type_: impl Into<String>, json_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_: type_.into(),
            json_path: json_path.into(),
            description: None,
            priority: 0,
            format: None,
        }
    }

    pub fn to_value(&self) -> Value {
        let mut col = Map::new();
        col.insert("name".into(), json!(self.name));
        col.insert("type".into(), json!(self.type_));
        col.insert("jsonPath".into(), json!(self.json_path));
        insert_opt(&mut col, "description", self.description.as_ref().map(|v| json!(v)));
        if self.priority != 0 {
            col.insert("priority".into(), json!(self.priority));
        }
        insert_opt(&mut col, "format", self.format.as_ref().map(|v| json!(v)));
        Value::Object(col)
    }
}
