//! Declared shapes: type names, field descriptors, casts and enum cases.
//!
//! Everything here is plain data. Declarations are assembled with the small
//! builder methods below (or deserialized from a schema file) and handed to
//! [`crate::registry::RegistryBuilder`], which turns them into cached metadata.
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::validate::Validator;

// ------------------------------- Names ------------------------------------ //

/// Identifier of a declared type or enum. Cheap to clone.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeName(Arc<str>);

impl TypeName {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl From<&str> for TypeName {
    fn from(s: &str) -> Self { Self::new(s) }
}

impl From<String> for TypeName {
    fn from(s: String) -> Self { Self(Arc::from(s)) }
}

impl std::borrow::Borrow<str> for TypeName {
    fn borrow(&self) -> &str { &self.0 }
}

// ----------------------------- Descriptors -------------------------------- //

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    String,
    Int,
    Bool,
    Float,
    Array,
}

impl ScalarKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Bool => "bool",
            Self::Float => "float",
            Self::Array => "array",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Allowed shape of one field.
///
/// Nullability lives on [`FieldSpec`], so a union never carries an explicit
/// null arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeDescriptor {
    Scalar(ScalarKind),
    Nested(TypeName),
    Enum(TypeName),
    Union(Vec<TypeDescriptor>), // tried in declaration order
    Mixed,                      // untyped: assigned as-is
}

impl TypeDescriptor {
    pub fn string() -> Self { Self::Scalar(ScalarKind::String) }
    pub fn int() -> Self { Self::Scalar(ScalarKind::Int) }
    pub fn bool() -> Self { Self::Scalar(ScalarKind::Bool) }
    pub fn float() -> Self { Self::Scalar(ScalarKind::Float) }
    pub fn array() -> Self { Self::Scalar(ScalarKind::Array) }

    pub fn nested(target: impl Into<TypeName>) -> Self {
        Self::Nested(target.into())
    }

    pub fn enumeration(target: impl Into<TypeName>) -> Self {
        Self::Enum(target.into())
    }

    pub fn union(alternatives: impl IntoIterator<Item = TypeDescriptor>) -> Self {
        Self::Union(alternatives.into_iter().collect())
    }

    /// Human-readable name used in error messages (`string|int`, `Address`, ...).
    pub fn display_name(&self) -> String {
        match self {
            Self::Scalar(kind) => kind.as_str().to_string(),
            Self::Nested(name) | Self::Enum(name) => name.to_string(),
            Self::Union(alts) => alts
                .iter()
                .map(TypeDescriptor::display_name)
                .collect::<Vec<_>>()
                .join("|"),
            Self::Mixed => "mixed".to_string(),
        }
    }

    /// Every type or enum name this descriptor mentions.
    pub(crate) fn referenced_names(&self, out: &mut Vec<(TypeName, bool)>) {
        match self {
            Self::Nested(name) => out.push((name.clone(), false)),
            Self::Enum(name) => out.push((name.clone(), true)),
            Self::Union(alts) => {
                for alt in alts { alt.referenced_names(out); }
            }
            Self::Scalar(_) | Self::Mixed => {}
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub descriptor: TypeDescriptor,
    #[serde(default)]
    pub nullable: bool,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        Self { name: name.into(), descriptor, nullable: false }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

// -------------------------------- Casts ----------------------------------- //

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CastMode {
    Single,
    Sequence,
    Collection,
}

/// Field refinement: rebuild the raw value as one `target` or a group of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastSpec {
    pub mode: CastMode,
    pub target: TypeName,
}

impl CastSpec {
    pub fn single(target: impl Into<TypeName>) -> Self {
        Self { mode: CastMode::Single, target: target.into() }
    }
    pub fn sequence(target: impl Into<TypeName>) -> Self {
        Self { mode: CastMode::Sequence, target: target.into() }
    }
    pub fn collection(target: impl Into<TypeName>) -> Self {
        Self { mode: CastMode::Collection, target: target.into() }
    }
}

// -------------------------------- Enums ----------------------------------- //

/// Backing value of an enum case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumScalar {
    Int(i64),
    String(String),
}

impl fmt::Display for EnumScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<i64> for EnumScalar {
    fn from(i: i64) -> Self { Self::Int(i) }
}

impl From<i32> for EnumScalar {
    fn from(i: i32) -> Self { Self::Int(i.into()) }
}

impl From<&str> for EnumScalar {
    fn from(s: &str) -> Self { Self::String(s.to_string()) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumCase {
    pub name: String,
    pub value: EnumScalar,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDecl {
    pub name: TypeName,
    pub cases: Vec<EnumCase>,
}

impl EnumDecl {
    pub fn new(name: impl Into<TypeName>) -> Self {
        Self { name: name.into(), cases: Vec::new() }
    }

    pub fn case(mut self, name: impl Into<String>, value: impl Into<EnumScalar>) -> Self {
        self.cases.push(EnumCase { name: name.into(), value: value.into() });
        self
    }
}

// ---------------------------- Type declarations --------------------------- //

/// Statically declared shape of one constructible type.
///
/// `casts` follow override semantics: `None` inherits the nearest ancestor's
/// table, `Some` replaces it wholesale. A `validator` adds to the ancestors'
/// gates instead of replacing them.
#[derive(Clone, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: TypeName,
    #[serde(default)]
    pub extends: Option<TypeName>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    pub casts: Option<IndexMap<String, CastSpec>>,
    #[serde(skip)]
    pub validator: Option<Arc<dyn Validator>>,
}

impl TypeDecl {
    pub fn new(name: impl Into<TypeName>) -> Self {
        Self { name: name.into(), extends: None, fields: Vec::new(), casts: None, validator: None }
    }

    pub fn extends(mut self, base: impl Into<TypeName>) -> Self {
        self.extends = Some(base.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        self.fields.push(FieldSpec::new(name, descriptor));
        self
    }

    pub fn nullable_field(mut self, name: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        self.fields.push(FieldSpec::new(name, descriptor).nullable());
        self
    }

    pub fn cast(mut self, field: impl Into<String>, cast: CastSpec) -> Self {
        self.casts.get_or_insert_with(IndexMap::new).insert(field.into(), cast);
        self
    }

    /// Declare an empty cast table, dropping anything inherited.
    pub fn no_casts(mut self) -> Self {
        self.casts = Some(IndexMap::new());
        self
    }

    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }
}

impl fmt::Debug for TypeDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDecl")
            .field("name", &self.name)
            .field("extends", &self.extends)
            .field("fields", &self.fields)
            .field("casts", &self.casts)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

// ------------------------------- Tests ------------------------------------ //
