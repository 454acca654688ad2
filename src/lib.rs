//! Typed boundary between loosely-typed input and declared models.
//!
//! Declare types (fields, unions, nested types, enums, casts) once, then
//! hydrate raw key-value maps into [`Instance`]s and lower them back to plain
//! maps or JSON.
//!
//! ```
//! use typecast::{Registry, TypeDecl, TypeDescriptor as D, Value};
//! use serde_json::json;
//!
//! let registry = Registry::builder()
//!     .register(TypeDecl::new("Person").field("name", D::string()).field("age", D::int()))
//!     .build()
//!     .unwrap();
//! let person = registry.hydrate_json("Person", json!({"name": 123, "age": "30"})).unwrap();
//! assert_eq!(person.get("age"), Some(&Value::Int(30)));
//! assert_eq!(person.to_json(), r#"{"name":"123","age":30}"#);
//! ```
pub mod adapter;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod hydrate;
pub mod path_de;
pub mod registry;
pub mod serialize;
pub mod validate;
pub mod value;

pub use adapter::{CamelCaseKeys, ModelAdapter};
pub use config::Config;
pub use descriptor::{CastMode, CastSpec, EnumDecl, FieldSpec, ScalarKind, TypeDecl, TypeDescriptor, TypeName};
pub use error::{Error, SchemaError, TypeError, ValidationError};
pub use registry::{Registry, RegistryBuilder, SchemaFile, TypeMetadata};
pub use validate::{FieldError, Validator};
pub use value::{EnumValue, Instance, Map, Value};
