//! Structural checks on a finalized definition
//!
//! The API server performs the authoritative validation. These checks catch
//! the naming mistakes a generated definition can carry (an odd plural, a
//! group without a dot) before a create is attempted, so they surface as a
//! readable condition instead of a 422 from the server.

use std::sync::LazyLock;

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    CustomResourceDefinition, JSONSchemaProps, JSONSchemaPropsOrArray, JSONSchemaPropsOrBool,
};
use regex::Regex;

use crate::error::{FacadeError, Result};

static DNS1035_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]([-a-z0-9]*[a-z0-9])?$").expect("valid regex"));

static DNS1123_SUBDOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
        .expect("valid regex")
});

static KIND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]*$").expect("valid regex"));

const MAX_LABEL_LENGTH: usize = 63;
const MAX_SUBDOMAIN_LENGTH: usize = 253;

/// Check a definition and report every problem found
pub fn validate_definition(crd: &CustomResourceDefinition) -> Result<()> {
    let name = crd.metadata.name.clone().unwrap_or_default();
    let spec = &crd.spec;
    let names = &spec.names;
    let mut problems = Vec::new();

    let expected = format!("{}.{}", names.plural, spec.group);
    if name != expected {
        problems.push(format!("metadata.name must be '{}', got '{}'", expected, name));
    }

    if !is_subdomain(&spec.group) || !spec.group.contains('.') {
        problems.push(format!(
            "spec.group '{}' must be a DNS subdomain with at least one dot",
            spec.group
        ));
    }

    check_label(&names.plural, "spec.names.plural", &mut problems);
    if let Some(singular) = &names.singular {
        check_label(singular, "spec.names.singular", &mut problems);
    }
    for short in names.short_names.iter().flatten() {
        check_label(short, "spec.names.shortNames", &mut problems);
    }

    if !KIND.is_match(&names.kind) {
        problems.push(format!("spec.names.kind '{}' is not a valid kind", names.kind));
    }
    if let Some(list_kind) = &names.list_kind {
        if !KIND.is_match(list_kind) {
            problems.push(format!(
                "spec.names.listKind '{}' is not a valid kind",
                list_kind
            ));
        }
        if list_kind == &names.kind {
            problems.push("spec.names.listKind must differ from kind".to_string());
        }
    }

    if !matches!(spec.scope.as_str(), "Namespaced" | "Cluster") {
        problems.push(format!(
            "spec.scope must be Namespaced or Cluster, got '{}'",
            spec.scope
        ));
    }

    let storage = spec.versions.iter().filter(|v| v.storage).count();
    if storage != 1 {
        problems.push(format!(
            "exactly one version must be marked as storage, found {}",
            storage
        ));
    }

    for (i, version) in spec.versions.iter().enumerate() {
        check_label(&version.name, &format!("spec.versions[{}].name", i), &mut problems);

        let root = version
            .schema
            .as_ref()
            .and_then(|s| s.open_api_v3_schema.as_ref());
        if root.and_then(|s| s.type_.as_deref()) != Some("object") {
            problems.push(format!(
                "spec.versions[{}].schema.openAPIV3Schema.type must be 'object'",
                i
            ));
        }
        if let Some(root) = root {
            check_typed(
                root,
                &format!("spec.versions[{}].schema.openAPIV3Schema", i),
                &mut problems,
            );
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(FacadeError::InvalidDefinition { name, problems })
    }
}

fn is_subdomain(value: &str) -> bool {
    value.len() <= MAX_SUBDOMAIN_LENGTH && DNS1123_SUBDOMAIN.is_match(value)
}

/// Every node with object members must declare its type
fn check_typed(schema: &JSONSchemaProps, path: &str, problems: &mut Vec<String>) {
    let has_members = schema.properties.is_some()
        || matches!(schema.additional_properties, Some(JSONSchemaPropsOrBool::Schema(_)));
    if has_members && schema.type_.is_none() {
        problems.push(format!("{}.type must be set on a node with properties", path));
    }

    for (name, child) in schema.properties.iter().flatten() {
        check_typed(child, &format!("{}.properties.{}", path, name), problems);
    }
    if let Some(JSONSchemaPropsOrArray::Schema(items)) = &schema.items {
        check_typed(items, &format!("{}.items", path), problems);
    }
    if let Some(JSONSchemaPropsOrBool::Schema(extra)) = &schema.additional_properties {
        check_typed(extra, &format!("{}.additionalProperties", path), problems);
    }
}

fn check_label(value: &str, field: &str, problems: &mut Vec<String>) {
    if value.len() > MAX_LABEL_LENGTH || !DNS1035_LABEL.is_match(value) {
        problems.push(format!("{} '{}' must be a DNS-1035 label", field, value));
    }
}
