//! Facade Core - Core types for facade resource types
//!
//! This crate provides the foundational types used throughout the facade controller:
//! - `Facade`: The user-declared resource type (kind + spec schema)
//! - `FacadeStatus`: Condition bookkeeping with one record per condition type
//! - `Validator`: Pre-install checks over a Facade spec
//! - `Pluralizer`: Deterministic English plurals for resource names

pub mod condition;
pub mod error;
pub mod facade;
pub mod pluralize;
pub mod validate;

pub use condition::{ConditionStatus, ConditionType, ConditionUpdate, FacadeStatus};
pub use error::{CoreError, Result, ValidationIssue};
pub use facade::{FACADE_API_GROUP, FACADE_API_VERSION, Facade, FacadeSpec, ObjectKey};
pub use pluralize::{EnglishPluralizer, Pluralizer};
pub use validate::{FacadeValidator, Validator};
