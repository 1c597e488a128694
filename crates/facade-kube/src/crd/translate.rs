//! Schema translation
//!
//! Converts the user-authored `openAPIV3Schema` fragment of a Facade into the
//! complete root schema of the generated definition: `apiVersion`, `kind`,
//! `metadata`, the caller's `spec` and a fixed `status` carrying the standard
//! conditions array.
//!
//! The fragment is parsed strictly. Anything the API server would refuse in a
//! structural schema is reported here with the JSON path of the offending node,
//! so no definition is ever built from a half-understood fragment.

use std::collections::BTreeMap;

use regex::Regex;
use serde_json::{Map, Value, json};

use super::schema::{AdditionalProperties, PropertyType, SchemaProperty};
use crate::error::{FacadeError, Result};

/// Keys understood by the translator
const KNOWN_KEYS: &[&str] = &[
    "type",
    "title",
    "description",
    "default",
    "example",
    "format",
    "pattern",
    "enum",
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "multipleOf",
    "minLength",
    "maxLength",
    "minItems",
    "maxItems",
    "uniqueItems",
    "minProperties",
    "maxProperties",
    "nullable",
    "properties",
    "required",
    "items",
    "additionalProperties",
    "allOf",
    "anyOf",
    "oneOf",
    "not",
    "x-kubernetes-preserve-unknown-fields",
    "x-kubernetes-embedded-resource",
    "x-kubernetes-int-or-string",
    "x-kubernetes-list-type",
    "x-kubernetes-list-map-keys",
    "x-kubernetes-map-type",
    "x-kubernetes-validations",
];

/// JSON-schema keywords that structural CRD schemas forbid
const FORBIDDEN_KEYS: &[&str] = &[
    "$ref",
    "$schema",
    "id",
    "definitions",
    "dependencies",
    "patternProperties",
    "additionalItems",
    "externalDocs",
];

const LIST_TYPES: &[&str] = &["atomic", "set", "map"];
const MAP_TYPES: &[&str] = &["granular", "atomic"];

/// Pattern for condition `reason` values
pub const CONDITION_REASON_PATTERN: &str = "^[A-Za-z]([A-Za-z0-9_,:]*[A-Za-z0-9_])?$";

/// Pattern for condition `type` values: `(dns1123SubdomainFmt/)?(qualifiedNameFmt)`
pub const CONDITION_TYPE_PATTERN: &str = "^([a-z0-9]([-a-z0-9]*[a-z0-9])?(\\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*/)?(([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9])$";

/// Translator from user schema fragments to definition schemas
pub struct SchemaTranslator;

impl SchemaTranslator {
    /// Build the full root schema around a `spec` fragment
    ///
    /// Object nodes that omit `type` get `type: object`, which the API server
    /// requires of every node carrying `properties` or `additionalProperties`.
    pub fn translate(spec: &Value) -> Result<SchemaProperty> {
        let mut spec = Self::parse_property(spec, "spec")?;
        default_object_types(&mut spec);
        Ok(Self::root_schema(spec))
    }

    /// Wrap an already-parsed `spec` schema with the standard envelope
    pub fn root_schema(spec: SchemaProperty) -> SchemaProperty {
        let mut properties = BTreeMap::new();
        properties.insert("apiVersion".to_string(), SchemaProperty::string());
        properties.insert("kind".to_string(), SchemaProperty::string());
        properties.insert(
            "metadata".to_string(),
            SchemaProperty {
                type_: PropertyType::Object,
                ..Default::default()
            },
        );
        properties.insert("spec".to_string(), spec);
        properties.insert("status".to_string(), Self::status_schema());

        SchemaProperty::object(properties)
    }

    /// The fixed `status` schema shared by every generated definition
    pub fn status_schema() -> SchemaProperty {
        let mut condition = BTreeMap::new();
        condition.insert(
            "lastTransitionTime".to_string(),
            SchemaProperty {
                format: Some("date-time".to_string()),
                ..SchemaProperty::string()
            },
        );
        condition.insert(
            "message".to_string(),
            SchemaProperty {
                max_length: Some(1024),
                ..SchemaProperty::string().with_description("human readable message")
            },
        );
        condition.insert(
            "observedGeneration".to_string(),
            SchemaProperty {
                format: Some("int64".to_string()),
                minimum: Some(0.0),
                ..SchemaProperty::integer()
            },
        );
        condition.insert(
            "reason".to_string(),
            SchemaProperty {
                min_length: Some(1),
                max_length: Some(256),
                pattern: Some(CONDITION_REASON_PATTERN.to_string()),
                ..SchemaProperty::string()
            },
        );
        condition.insert(
            "status".to_string(),
            SchemaProperty {
                enum_values: Some(vec![json!("True"), json!("False"), json!("Unknown")]),
                ..SchemaProperty::string()
                    .with_description("status of the condition, one of True, False, Unknown.")
            },
        );
        condition.insert(
            "type".to_string(),
            SchemaProperty {
                max_length: Some(316),
                pattern: Some(CONDITION_TYPE_PATTERN.to_string()),
                ..SchemaProperty::string().with_description(
                    "type of condition in CamelCase or in foo.example.com/CamelCase.",
                )
            },
        );

        let item = SchemaProperty {
            required: Some(
                ["lastTransitionTime", "message", "reason", "status", "type"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
            ),
            ..SchemaProperty::object(condition)
        };

        let mut status = BTreeMap::new();
        status.insert("conditions".to_string(), SchemaProperty::array(item));

        SchemaProperty {
            x_preserve_unknown: true,
            ..SchemaProperty::object(status)
        }
    }

    /// Parse one schema node (recursive)
    pub fn parse_property(value: &Value, path: &str) -> Result<SchemaProperty> {
        let obj = value
            .as_object()
            .ok_or_else(|| FacadeError::translation(path, "expected a schema object"))?;

        check_keys(obj, path)?;

        let type_ = match obj.get("type") {
            None => PropertyType::Unspecified,
            Some(Value::String(s)) => PropertyType::parse(s).ok_or_else(|| {
                let message = match suggest(s, PropertyType::NAMES) {
                    Some(hint) => format!("unknown type '{}', did you mean '{}'?", s, hint),
                    None => format!(
                        "unknown type '{}', expected one of: {}",
                        s,
                        PropertyType::NAMES.join(", ")
                    ),
                };
                FacadeError::translation(format!("{}.type", path), message)
            })?,
            Some(_) => {
                return Err(FacadeError::translation(
                    format!("{}.type", path),
                    "must be a string",
                ));
            }
        };

        if bool_flag(obj, "uniqueItems", path)? {
            return Err(FacadeError::translation(
                format!("{}.uniqueItems", path),
                "uniqueItems cannot be enabled, use x-kubernetes-list-type: set",
            ));
        }

        let pattern = string_field(obj, "pattern", path)?;
        if let Some(pattern) = &pattern {
            Regex::new(pattern).map_err(|e| {
                FacadeError::translation(format!("{}.pattern", path), format!("invalid regex: {}", e))
            })?;
        }

        let enum_values = match obj.get("enum") {
            None => None,
            Some(Value::Array(values)) => Some(values.clone()),
            Some(_) => {
                return Err(FacadeError::translation(
                    format!("{}.enum", path),
                    "must be an array",
                ));
            }
        };

        let minimum = number_field(obj, "minimum", path)?;
        let maximum = number_field(obj, "maximum", path)?;
        check_range(minimum, maximum, "minimum", "maximum", path)?;

        let multiple_of = number_field(obj, "multipleOf", path)?;
        if multiple_of.is_some_and(|m| m <= 0.0) {
            return Err(FacadeError::translation(
                format!("{}.multipleOf", path),
                "must be greater than zero",
            ));
        }

        let min_length = count_field(obj, "minLength", path)?;
        let max_length = count_field(obj, "maxLength", path)?;
        check_range(min_length, max_length, "minLength", "maxLength", path)?;

        let min_items = count_field(obj, "minItems", path)?;
        let max_items = count_field(obj, "maxItems", path)?;
        check_range(min_items, max_items, "minItems", "maxItems", path)?;

        let min_properties = count_field(obj, "minProperties", path)?;
        let max_properties = count_field(obj, "maxProperties", path)?;
        check_range(
            min_properties,
            max_properties,
            "minProperties",
            "maxProperties",
            path,
        )?;

        let properties = match obj.get("properties") {
            None => None,
            Some(Value::Object(props)) => {
                let mut parsed = BTreeMap::new();
                for (name, prop) in props {
                    let child = Self::parse_property(prop, &format!("{}.properties.{}", path, name))?;
                    parsed.insert(name.clone(), child);
                }
                Some(parsed)
            }
            Some(_) => {
                return Err(FacadeError::translation(
                    format!("{}.properties", path),
                    "must be an object",
                ));
            }
        };

        let items = match obj.get("items") {
            None => None,
            Some(Value::Array(_)) => {
                return Err(FacadeError::translation(
                    format!("{}.items", path),
                    "tuple items are not supported, items must be a single schema",
                ));
            }
            Some(items) => Some(Box::new(Self::parse_property(
                items,
                &format!("{}.items", path),
            )?)),
        };

        let additional_properties = match obj.get("additionalProperties") {
            None => None,
            Some(Value::Bool(true)) => Some(AdditionalProperties::Allowed),
            Some(Value::Bool(false)) => Some(AdditionalProperties::Denied),
            Some(schema) => Some(AdditionalProperties::Schema(Box::new(Self::parse_property(
                schema,
                &format!("{}.additionalProperties", path),
            )?))),
        };

        if properties.as_ref().is_some_and(|p| !p.is_empty())
            && matches!(
                additional_properties,
                Some(AdditionalProperties::Allowed | AdditionalProperties::Schema(_))
            )
        {
            return Err(FacadeError::translation(
                path,
                "properties and additionalProperties are mutually exclusive",
            ));
        }

        let x_list_type = string_field(obj, "x-kubernetes-list-type", path)?;
        if let Some(list_type) = &x_list_type {
            check_one_of(list_type, LIST_TYPES, "x-kubernetes-list-type", path)?;
        }
        let x_map_type = string_field(obj, "x-kubernetes-map-type", path)?;
        if let Some(map_type) = &x_map_type {
            check_one_of(map_type, MAP_TYPES, "x-kubernetes-map-type", path)?;
        }

        let x_validations = match obj.get("x-kubernetes-validations") {
            None => None,
            Some(Value::Array(rules)) => Some(rules.clone()),
            Some(_) => {
                return Err(FacadeError::translation(
                    format!("{}.x-kubernetes-validations", path),
                    "must be an array",
                ));
            }
        };

        Ok(SchemaProperty {
            type_,
            title: string_field(obj, "title", path)?,
            description: string_field(obj, "description", path)?,
            default: obj.get("default").cloned(),
            example: obj.get("example").cloned(),
            format: string_field(obj, "format", path)?,
            pattern,
            enum_values,
            minimum,
            maximum,
            exclusive_minimum: bool_flag(obj, "exclusiveMinimum", path)?,
            exclusive_maximum: bool_flag(obj, "exclusiveMaximum", path)?,
            multiple_of,
            min_length,
            max_length,
            min_items,
            max_items,
            min_properties,
            max_properties,
            nullable: bool_flag(obj, "nullable", path)?,
            properties,
            required: string_list(obj, "required", path)?,
            items,
            additional_properties,
            all_of: schema_list(obj, "allOf", path)?,
            any_of: schema_list(obj, "anyOf", path)?,
            one_of: schema_list(obj, "oneOf", path)?,
            not: match obj.get("not") {
                None => None,
                Some(not) => Some(Box::new(Self::parse_property(
                    not,
                    &format!("{}.not", path),
                )?)),
            },
            x_preserve_unknown: bool_flag(obj, "x-kubernetes-preserve-unknown-fields", path)?,
            x_embedded_resource: bool_flag(obj, "x-kubernetes-embedded-resource", path)?,
            x_int_or_string: bool_flag(obj, "x-kubernetes-int-or-string", path)?,
            x_list_type,
            x_list_map_keys: string_list(obj, "x-kubernetes-list-map-keys", path)?,
            x_map_type,
            x_validations,
        })
    }
}

/// Fill in `type: object` on untyped nodes that describe object members
///
/// Branches of `allOf`/`anyOf`/`oneOf`/`not` are left alone: structural
/// schemas forbid `type` there.
fn default_object_types(prop: &mut SchemaProperty) {
    if prop.type_ == PropertyType::Unspecified
        && (prop.properties.is_some() || prop.additional_properties.is_some())
    {
        prop.type_ = PropertyType::Object;
    }
    for child in prop.properties.iter_mut().flat_map(|p| p.values_mut()) {
        default_object_types(child);
    }
    if let Some(items) = prop.items.as_mut() {
        default_object_types(items);
    }
    if let Some(AdditionalProperties::Schema(schema)) = prop.additional_properties.as_mut() {
        default_object_types(schema);
    }
}

fn check_keys(obj: &Map<String, Value>, path: &str) -> Result<()> {
    for key in obj.keys() {
        if FORBIDDEN_KEYS.contains(&key.as_str()) {
            return Err(FacadeError::translation(
                format!("{}.{}", path, key),
                format!("'{}' is not supported in CRD schemas", key),
            ));
        }
        if !KNOWN_KEYS.contains(&key.as_str()) {
            let message = match suggest(key, KNOWN_KEYS) {
                Some(hint) => format!("unknown field '{}', did you mean '{}'?", key, hint),
                None => format!("unknown field '{}'", key),
            };
            return Err(FacadeError::translation(format!("{}.{}", path, key), message));
        }
    }
    Ok(())
}

/// Closest candidate within a small edit distance
fn suggest<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .map(|c| (*c, strsim::levenshtein(input, c)))
        .filter(|(_, d)| *d <= 2)
        .min_by_key(|(_, d)| *d)
        .map(|(c, _)| c)
}

fn string_field(obj: &Map<String, Value>, key: &str, path: &str) -> Result<Option<String>> {
    match obj.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(FacadeError::translation(
            format!("{}.{}", path, key),
            "must be a string",
        )),
    }
}

fn bool_flag(obj: &Map<String, Value>, key: &str, path: &str) -> Result<bool> {
    match obj.get(key) {
        None => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(FacadeError::translation(
            format!("{}.{}", path, key),
            "must be a boolean",
        )),
    }
}

fn number_field(obj: &Map<String, Value>, key: &str, path: &str) -> Result<Option<f64>> {
    match obj.get(key) {
        None => Ok(None),
        Some(v) => v.as_f64().map(Some).ok_or_else(|| {
            FacadeError::translation(format!("{}.{}", path, key), "must be a number")
        }),
    }
}

fn count_field(obj: &Map<String, Value>, key: &str, path: &str) -> Result<Option<u64>> {
    match obj.get(key) {
        None => Ok(None),
        Some(v) => {
            if let Some(n) = v.as_u64() {
                return Ok(Some(n));
            }
            let message = if v.as_i64().is_some_and(|n| n < 0) {
                "must not be negative"
            } else {
                "must be a non-negative integer"
            };
            Err(FacadeError::translation(format!("{}.{}", path, key), message))
        }
    }
}

fn string_list(obj: &Map<String, Value>, key: &str, path: &str) -> Result<Option<Vec<String>>> {
    let Some(value) = obj.get(key) else {
        return Ok(None);
    };
    let invalid = || FacadeError::translation(format!("{}.{}", path, key), "must be an array of strings");

    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|v| v.as_str().map(String::from).ok_or_else(invalid))
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

fn schema_list(obj: &Map<String, Value>, key: &str, path: &str) -> Result<Option<Vec<SchemaProperty>>> {
    let Some(value) = obj.get(key) else {
        return Ok(None);
    };
    let schemas = value.as_array().ok_or_else(|| {
        FacadeError::translation(format!("{}.{}", path, key), "must be an array of schemas")
    })?;

    schemas
        .iter()
        .enumerate()
        .map(|(i, s)| SchemaTranslator::parse_property(s, &format!("{}.{}[{}]", path, key, i)))
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

fn check_range<T: PartialOrd + std::fmt::Display>(
    min: Option<T>,
    max: Option<T>,
    min_key: &str,
    max_key: &str,
    path: &str,
) -> Result<()> {
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(FacadeError::translation(
                path,
                format!("{} ({}) is greater than {} ({})", min_key, min, max_key, max),
            ));
        }
    }
    Ok(())
}

fn check_one_of(value: &str, allowed: &[&str], key: &str, path: &str) -> Result<()> {
    if allowed.contains(&value) {
        return Ok(());
    }
    Err(FacadeError::translation(
        format!("{}.{}", path, key),
        format!("'{}' is not one of: {}", value, allowed.join(", ")),
    ))
}
