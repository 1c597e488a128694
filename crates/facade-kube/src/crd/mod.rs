//! CRD (CustomResourceDefinition) generation and installation for facades
//!
//! - **Schema representation** (`schema`): Structured types for CRD schemas
//! - **Translation** (`translate`): Turn a Facade's spec fragment into a full root schema
//! - **Definition** (`definition`): Naming defaults and the final CRD document
//! - **Validation** (`validate`): Structural checks before anything is sent
//! - **Installation** (`install`): Create-if-absent against the object store
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Facade → CRD Pipeline                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │   spec fragment ──► Translator ──► Definition ──► Installer │
//! │                         │              │             │      │
//! │                         ▼              ▼             ▼      │
//! │                   root schema     CRD document   get/create │
//! │                   (+ status)      (validated)               │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use facade_core::EnglishPluralizer;
//! use facade_kube::crd::{FacadeDefinitionBuilder, Installer};
//!
//! let mut definition = FacadeDefinitionBuilder::new("Widget").build(&EnglishPluralizer);
//! definition.set_spec(&spec_fragment)?;
//!
//! // widgets.facade.compositions.google.com
//! Installer::new(&store).ensure_installed(&definition).await?;
//! ```

mod definition;
mod install;
mod schema;
mod translate;
mod validate;

// Schema types
pub use schema::{AdditionalProperties, CrdNames, PrinterColumn, PropertyType, SchemaProperty};

// Translation
pub use translate::{CONDITION_REASON_PATTERN, CONDITION_TYPE_PATTERN, SchemaTranslator};

// Definition
pub use definition::{
    DEFAULT_CATEGORIES, DEFAULT_VERSION, FACADE_GROUP, FACADE_LABEL, FacadeDefinition,
    FacadeDefinitionBuilder,
};

// Validation
pub use validate::validate_definition;

// Installation
pub use install::{InstallOutcome, Installer};
