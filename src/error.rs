use thiserror::Error;

use crate::descriptor::{ScalarKind, TypeName};
use crate::validate::FieldError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Type(#[from] TypeError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// Schema file could not be parsed; `path` is the JSON path of the offending node.
    #[error("at JSON path {path} → {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Raw input rejected by a type's validation gate.
#[derive(Debug, Error)]
#[error("validation failed for {type_name}{}: {}", at_path(.path), join_errors(.errors))]
pub struct ValidationError {
    pub type_name: TypeName,
    pub path: String,
    pub errors: Vec<FieldError>,
}

/// A raw value could not be shaped into its declared type.
///
/// `path` is the dotted field path from the top-level map (`address.street`,
/// `lines[2].sku`); empty for the root.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypeError {
    #[error("cannot convert {path} to one of {}: {}", .alternatives.join(", "), .reasons.join("; "))]
    UnionResolutionFailure {
        path: String,
        alternatives: Vec<String>,
        reasons: Vec<String>,
    },
    #[error("{path}: no case of {enum_name} has value {value}")]
    EnumValueNotFound { path: String, enum_name: TypeName, value: String },
    #[error("{path}: expected a map to build {target}, found {found}")]
    ExpectedStructuredValue { path: String, target: TypeName, found: &'static str },
    #[error("{path}: value must be a map to cast to {target}, found {found}")]
    CastExpectedStructure { path: String, target: TypeName, found: &'static str },
    #[error("{path}: value must be a sequence to cast to a group of {target}, found {found}")]
    CastExpectedSequence { path: String, target: TypeName, found: &'static str },
    #[error("{path}: null given to non-nullable {}", .alternatives.join("|"))]
    NonNullableUnion { path: String, alternatives: Vec<String> },
    #[error("{path}: cannot coerce {found} to {kind}")]
    ScalarCoercion { path: String, kind: ScalarKind, found: &'static str },
    #[error("{path}: nesting deeper than {limit} levels")]
    DepthExceeded { path: String, limit: usize },
}

/// Declarations that cannot be turned into metadata.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("unknown type {0}")]
    UnknownType(TypeName),
    #[error("unknown enum {0}")]
    UnknownEnum(TypeName),
    #[error("type {0} is declared twice")]
    DuplicateType(TypeName),
    #[error("inheritance cycle through {0}")]
    InheritanceCycle(TypeName),
    #[error("{type_name}: cast on undeclared field {field}")]
    CastOnUnknownField { type_name: TypeName, field: String },
    #[error("{type_name}.{field}: union has no alternatives")]
    EmptyUnion { type_name: TypeName, field: String },
    #[error("a global registry is already installed")]
    GlobalAlreadyInstalled,
}

fn at_path(path: &str) -> String {
    if path.is_empty() { String::new() } else { format!(" at {path}") }
}

fn join_errors(errors: &[FieldError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}
