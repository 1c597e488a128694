//! Definition builder
//!
//! A [`FacadeDefinition`] holds the identity of a generated resource type
//! (group, version, names, labels) plus its root schema, and renders the
//! final `CustomResourceDefinition`.

use std::collections::BTreeMap;
use std::fmt;

use facade_core::Pluralizer;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use serde_json::{Map, Value, json};

use super::schema::{CrdNames, PrinterColumn, SchemaProperty};
use super::translate::SchemaTranslator;
use crate::error::{FacadeError, Result};

/// Default API group for generated definitions
pub const FACADE_GROUP: &str = "facade.compositions.google.com";

/// Default version for generated definitions
pub const DEFAULT_VERSION: &str = "v1";

/// Label marking a definition as generated from a Facade
pub const FACADE_LABEL: &str = "compositions.google.com/facade";

/// Generated types are always namespaced, like the Facades that declare them
const SCOPE: &str = "Namespaced";

/// Categories every generated definition belongs to
pub const DEFAULT_CATEGORIES: &[&str] = &["facade", "facades"];

/// Builder for [`FacadeDefinition`]
#[derive(Debug, Clone, Default)]
pub struct FacadeDefinitionBuilder {
    kind: String,
    group: Option<String>,
    version: Option<String>,
    plural: Option<String>,
    short_names: Vec<String>,
    categories: Option<Vec<String>>,
    labels: BTreeMap<String, String>,
    printer_columns: Vec<PrinterColumn>,
}

impl FacadeDefinitionBuilder {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Default::default()
        }
    }

    /// API group (empty keeps the default)
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into()).filter(|g| !g.is_empty());
        self
    }

    /// API version (empty keeps the default)
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into()).filter(|v| !v.is_empty());
        self
    }

    /// Explicit plural, bypassing the pluralizer
    pub fn plural(mut self, plural: impl Into<String>) -> Self {
        self.plural = Some(plural.into()).filter(|p| !p.is_empty());
        self
    }

    pub fn short_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.short_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the default categories
    pub fn categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = Some(categories.into_iter().map(Into::into).collect());
        self
    }

    pub fn label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.labels.extend(labels);
        self
    }

    pub fn printer_column(mut self, column: PrinterColumn) -> Self {
        self.printer_columns.push(column);
        self
    }

    /// Resolve defaults and produce the definition
    ///
    /// The pluralizer is only consulted when no explicit plural was given.
    pub fn build(self, pluralizer: &dyn Pluralizer) -> FacadeDefinition {
        let plural = self
            .plural
            .unwrap_or_else(|| pluralizer.pluralize(&self.kind))
            .to_lowercase();

        let categories = self
            .categories
            .unwrap_or_else(|| DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect());

        let mut labels = BTreeMap::new();
        labels.insert(FACADE_LABEL.to_string(), "yes".to_string());
        labels.extend(self.labels);

        FacadeDefinition {
            group: self.group.unwrap_or_else(|| FACADE_GROUP.to_string()),
            version: self.version.unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            names: CrdNames {
                singular: self.kind.to_lowercase(),
                list_kind: format!("{}List", self.kind),
                kind: self.kind,
                plural,
                short_names: self.short_names,
                categories,
            },
            labels,
            printer_columns: self.printer_columns,
            schema: None,
        }
    }
}

/// A generated resource type, identified by `<plural>.<group>`
#[derive(Debug, Clone, PartialEq)]
pub struct FacadeDefinition {
    group: String,
    version: String,
    names: CrdNames,
    labels: BTreeMap<String, String>,
    printer_columns: Vec<PrinterColumn>,
    schema: Option<SchemaProperty>,
}

impl FacadeDefinition {
    /// Fully-qualified definition name, used as the idempotency key
    pub fn name(&self) -> String {
        format!("{}.{}", self.names.plural, self.group)
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn kind(&self) -> &str {
        &self.names.kind
    }

    pub fn plural(&self) -> &str {
        &self.names.plural
    }

    pub fn names(&self) -> &CrdNames {
        &self.names
    }

    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    pub fn schema(&self) -> Option<&SchemaProperty> {
        self.schema.as_ref()
    }

    /// Translate a user `spec` fragment and install it as the root schema
    ///
    /// On failure the previous schema is left untouched.
    pub fn set_spec(&mut self, spec: &Value) -> Result<()> {
        self.schema = Some(SchemaTranslator::translate(spec)?);
        Ok(())
    }

    /// Use a complete root schema as-is
    pub fn set_schema(&mut self, schema: SchemaProperty) {
        self.schema = Some(schema);
    }

    /// Render the definition as an `apiextensions.k8s.io/v1` document
    pub fn to_document(&self) -> Result<Value> {
        let schema = self.schema.as_ref().ok_or_else(|| FacadeError::SchemaNotSet {
            name: self.name(),
        })?;

        let mut version = Map::new();
        version.insert("name".into(), json!(self.version));
        version.insert("served".into(), json!(true));
        version.insert("storage".into(), json!(true));
        version.insert(
            "schema".into(),
            json!({ "openAPIV3Schema": schema.to_value() }),
        );
        version.insert("subresources".into(), json!({ "status": {} }));
        if !self.printer_columns.is_empty() {
            let columns: Vec<Value> = self.printer_columns.iter().map(PrinterColumn::to_value).collect();
            version.insert("additionalPrinterColumns".into(), Value::Array(columns));
        }

        Ok(json!({
            "apiVersion": "apiextensions.k8s.io/v1",
            "kind": "CustomResourceDefinition",
            "metadata": {
                "name": self.name(),
                "labels": self.labels,
            },
            "spec": {
                "group": self.group,
                "names": self.names.to_value(),
                "scope": SCOPE,
                "preserveUnknownFields": false,
                "versions": [Value::Object(version)],
            },
        }))
    }

    /// Finalize into a typed `CustomResourceDefinition`
    pub fn crd(&self) -> Result<CustomResourceDefinition> {
        let document = self.to_document()?;
        Ok(serde_json::from_value(document)?)
    }
}

impl fmt::Display for FacadeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facade_core::EnglishPluralizer;

    fn widget() -> FacadeDefinition {
        FacadeDefinitionBuilder::new("Widget").build(&EnglishPluralizer)
    }

    #[test]
    fn test_defaults() {
        let def = widget();

        assert_eq!(def.name(), "widgets.facade.compositions.google.com");
        assert_eq!(def.group(), FACADE_GROUP);
        assert_eq!(def.version(), "v1");
        assert_eq!(def.names().singular, "widget");
        assert_eq!(def.names().list_kind, "WidgetList");
        assert_eq!(def.names().categories, vec!["facade", "facades"]);
        assert_eq!(def.labels().get(FACADE_LABEL).map(String::as_str), Some("yes"));
        assert_eq!(def.to_string(), def.name());
    }

    #[test]
    fn test_explicit_plural_and_group() {
        let def = FacadeDefinitionBuilder::new("Widget")
            .group("example.com")
            .plural("Gadgets")
            .build(&EnglishPluralizer);

        assert_eq!(def.name(), "gadgets.example.com");
        assert_eq!(def.plural(), "gadgets");
    }

    #[test]
    fn test_empty_overrides_keep_defaults() {
        let def = FacadeDefinitionBuilder::new("Widget")
            .group("")
            .version("")
            .plural("")
            .build(&EnglishPluralizer);

        assert_eq!(def.name(), "widgets.facade.compositions.google.com");
        assert_eq!(def.version(), "v1");
    }

    #[test]
    fn test_caller_labels_win() {
        let def = FacadeDefinitionBuilder::new("Widget")
            .label(FACADE_LABEL, "no")
            .label("team", "platform")
            .build(&EnglishPluralizer);

        assert_eq!(def.labels().get(FACADE_LABEL).map(String::as_str), Some("no"));
        assert_eq!(def.labels().get("team").map(String::as_str), Some("platform"));
    }

    #[test]
    fn test_setter_order_does_not_matter() {
        let spec = json!({"type": "object", "properties": {"size": {"type": "string"}}});

        let mut a = FacadeDefinitionBuilder::new("Widget")
            .label("a", "1")
            .label("b", "2")
            .short_names(["wdg"])
            .build(&EnglishPluralizer);
        a.set_spec(&spec).unwrap();

        let mut b = FacadeDefinitionBuilder::new("Widget")
            .short_names(["wdg"])
            .label("b", "2")
            .label("a", "1")
            .build(&EnglishPluralizer);
        b.set_spec(&spec).unwrap();

        assert_eq!(a.name(), b.name());
        assert_eq!(a.to_document().unwrap(), b.to_document().unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn test_schema_not_set() {
        let err = widget().crd().unwrap_err();
        assert!(matches!(err, FacadeError::SchemaNotSet { .. }));
        insta::assert_snapshot!(
            err.to_string(),
            @"schema is not set for 'widgets.facade.compositions.google.com', use set_spec or set_schema first"
        );
    }

    #[test]
    fn test_failed_set_spec_keeps_previous_schema() {
        let mut def = widget();
        def.set_spec(&json!({"type": "object"})).unwrap();
        let before = def.schema().cloned();

        assert!(def.set_spec(&json!({"type": "objekt"})).is_err());
        assert_eq!(def.schema().cloned(), before);
    }

    #[test]
    fn test_crd_document() {
        let mut def = FacadeDefinitionBuilder::new("Widget")
            .short_names(["wdg"])
            .printer_column(PrinterColumn::new("Size", "string", ".spec.size"))
            .build(&EnglishPluralizer);
        def.set_spec(&json!({"type": "object", "properties": {"size": {"type": "string"}}}))
            .unwrap();

        let crd = def.crd().unwrap();

        assert_eq!(crd.metadata.name.as_deref(), Some("widgets.facade.compositions.google.com"));
        assert_eq!(crd.spec.group, FACADE_GROUP);
        assert_eq!(crd.spec.scope, "Namespaced");
        assert_eq!(crd.spec.preserve_unknown_fields, Some(false));
        assert_eq!(crd.spec.names.kind, "Widget");
        assert_eq!(crd.spec.names.list_kind.as_deref(), Some("WidgetList"));
        assert_eq!(crd.spec.names.short_names, Some(vec!["wdg".to_string()]));

        assert_eq!(crd.spec.versions.len(), 1);
        let version = &crd.spec.versions[0];
        assert_eq!(version.name, "v1");
        assert!(version.served && version.storage);
        assert!(version.subresources.as_ref().and_then(|s| s.status.as_ref()).is_some());
        assert_eq!(
            version.additional_printer_columns.as_ref().map(Vec::len),
            Some(1)
        );

        let root = version
            .schema
            .as_ref()
            .and_then(|s| s.open_api_v3_schema.as_ref())
            .unwrap();
        let props = root.properties.as_ref().unwrap();
        let size = &props["spec"].properties.as_ref().unwrap()["size"];
        assert_eq!(size.type_.as_deref(), Some("string"));
        assert!(props["status"].properties.as_ref().unwrap().contains_key("conditions"));
    }

    #[test]
    fn test_set_schema_directly() {
        let mut def = widget();
        def.set_schema(SchemaProperty::object(BTreeMap::new()));

        let doc = def.to_document().unwrap();
        assert_eq!(
            doc["spec"]["versions"][0]["schema"]["openAPIV3Schema"],
            json!({"type": "object", "properties": {}})
        );
    }
}
