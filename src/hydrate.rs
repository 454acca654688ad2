//! Hydration: raw key-value maps in, typed instances out.
//!
//! Per hydrate call: run the lineage's validation gates over the whole raw
//! map (skipped for an empty map), then for every raw key that names a
//! declared field resolve the raw value against the field's descriptor, let a
//! cast override the result, and assign by field index. Any failure aborts the whole call; no partial instance
//! escapes.
pub mod scalar;
pub mod cast;

use crate::adapter::ModelAdapter;
use crate::descriptor::{EnumScalar, FieldSpec, TypeDescriptor, TypeName};
use crate::error::{Error, SchemaError, TypeError, ValidationError};
use crate::registry::{Registry, TypeMetadata};
use crate::value::{EnumValue, Instance, Map, Value};

// ------------------------------- Front API -------------------------------- //

impl Registry {
    /// Build an instance of `type_name` from `data`.
    pub fn hydrate(&self, type_name: &str, data: Map) -> Result<Instance, Error> {
        self.hydrate_at(type_name, data, "", 0)
    }

    /// Same operation as [`Registry::hydrate`].
    pub fn from_plain(&self, type_name: &str, data: Map) -> Result<Instance, Error> {
        self.hydrate(type_name, data)
    }

    /// Hydrate from decoded JSON; anything but a JSON object is rejected.
    pub fn hydrate_json(&self, type_name: &str, data: serde_json::Value) -> Result<Instance, Error> {
        match Value::from(data) {
            Value::Map(map) => self.hydrate(type_name, map),
            other => Err(TypeError::ExpectedStructuredValue {
                path: String::new(),
                target: TypeName::new(type_name),
                found: other.kind_name(),
            }.into()),
        }
    }

    /// Hydrate from whatever fields an external record exposes.
    pub fn from_model(&self, type_name: &str, model: &impl ModelAdapter) -> Result<Instance, Error> {
        self.hydrate(type_name, model.extract_fields())
    }

    pub(crate) fn hydrate_at(&self, type_name: &str, data: Map, path: &str, depth: usize) -> Result<Instance, Error> {
        if depth > self.config().max_depth {
            return Err(TypeError::DepthExceeded { path: path.to_string(), limit: self.config().max_depth }.into());
        }
        let meta = self.metadata(type_name)?;
        tracing::trace!(type_name = %meta.type_name, path, keys = data.len(), "hydrating");

        // an empty map always builds an empty instance
        if !data.is_empty() {
            meta.validate(&data).map_err(|errors| ValidationError {
                type_name: meta.type_name.clone(),
                path: path.to_string(),
                errors,
            })?;
        }

        let mut instance = Instance::empty(meta.clone());
        for (key, raw) in data {
            // undeclared keys only feed the validator
            let Some((index, _, spec)) = meta.fields.get_full(key.as_str()) else { continue };
            let field_path = join_path(path, &spec.name);
            let value = self.resolve_field(&meta, spec, raw, &field_path, depth)?;
            instance.assign(index, value);
        }
        Ok(instance)
    }

    fn resolve_field(
        &self,
        meta: &TypeMetadata,
        spec: &FieldSpec,
        raw: Value,
        path: &str,
        depth: usize,
    ) -> Result<Value, Error> {
        let resolved = self.resolve(&spec.descriptor, spec.nullable, raw.clone(), path, depth)?;
        match meta.cast(&spec.name) {
            Some(cast) => self.apply_cast(cast, resolved, raw, path, depth),
            None => Ok(resolved),
        }
    }

    // ------------------------- Descriptor resolution ------------------------ //

    /// Resolve `raw` against `desc`. `nullable` lets an explicit null through
    /// untouched.
    pub(crate) fn resolve(
        &self,
        desc: &TypeDescriptor,
        nullable: bool,
        raw: Value,
        path: &str,
        depth: usize,
    ) -> Result<Value, Error> {
        if nullable && raw.is_null() {
            return Ok(Value::Null);
        }
        match desc {
            TypeDescriptor::Mixed => Ok(raw),
            TypeDescriptor::Scalar(kind) => scalar::coerce(*kind, raw).map_err(|found| {
                TypeError::ScalarCoercion { path: path.to_string(), kind: *kind, found }.into()
            }),
            TypeDescriptor::Enum(name) => self.resolve_enum(name, raw, path),
            TypeDescriptor::Nested(target) => match raw {
                Value::Object(inst) if inst.is_a(target) => Ok(Value::Object(inst)),
                Value::Map(map) => Ok(Value::Object(self.hydrate_at(target.as_str(), map, path, depth + 1)?)),
                other => Err(TypeError::ExpectedStructuredValue {
                    path: path.to_string(),
                    target: target.clone(),
                    found: other.kind_name(),
                }.into()),
            },
            TypeDescriptor::Union(alternatives) => self.resolve_union(alternatives, nullable, raw, path, depth),
        }
    }

    fn resolve_enum(&self, name: &TypeName, raw: Value, path: &str) -> Result<Value, Error> {
        let decl = self.enum_decl(name.as_str()).ok_or_else(|| SchemaError::UnknownEnum(name.clone()))?;
        if let Value::Enum(e) = &raw {
            if &e.enum_name == name {
                return Ok(raw);
            }
        }
        decl.cases
            .iter()
            .find(|case| enum_value_matches(&case.value, &raw))
            .map(|case| Value::Enum(EnumValue {
                enum_name: name.clone(),
                case: case.name.clone(),
                value: case.value.clone(),
            }))
            .ok_or_else(|| TypeError::EnumValueNotFound {
                path: path.to_string(),
                enum_name: name.clone(),
                value: raw.to_json_value().to_string(),
            }.into())
    }

    fn resolve_union(
        &self,
        alternatives: &[TypeDescriptor],
        nullable: bool,
        raw: Value,
        path: &str,
        depth: usize,
    ) -> Result<Value, Error> {
        let names = || alternatives.iter().map(TypeDescriptor::display_name).collect::<Vec<_>>();

        if raw.is_null() {
            return if nullable {
                Ok(Value::Null)
            } else {
                Err(TypeError::NonNullableUnion { path: path.to_string(), alternatives: names() }.into())
            };
        }

        // pass 1: first alternative that takes the value unchanged
        if let Some(alt) = alternatives.iter().find(|alt| accepts_as_is(alt, &raw)) {
            tracing::trace!(path, alternative = %alt, "union matched as-is");
            return Ok(raw);
        }

        // pass 2: first alternative that resolves with conversion
        let mut reasons = Vec::with_capacity(alternatives.len());
        for alt in alternatives {
            match self.resolve(alt, false, raw.clone(), path, depth) {
                Ok(value) => {
                    tracing::trace!(path, alternative = %alt, "union resolved by conversion");
                    return Ok(value);
                }
                Err(err) => reasons.push(format!("{alt}: {err}")),
            }
        }

        Err(TypeError::UnionResolutionFailure { path: path.to_string(), alternatives: names(), reasons }.into())
    }
}

// ------------------------------- Utilities -------------------------------- //

/// Whether `raw` already is a value of `desc` (subtypes included).
fn accepts_as_is(desc: &TypeDescriptor, raw: &Value) -> bool {
    match (desc, raw) {
        (TypeDescriptor::Scalar(kind), v) => scalar::matches_kind(*kind, v),
        (TypeDescriptor::Nested(target), Value::Object(inst)) => inst.is_a(target),
        (TypeDescriptor::Enum(name), Value::Enum(e)) => &e.enum_name == name,
        (TypeDescriptor::Union(alts), v) => alts.iter().any(|alt| accepts_as_is(alt, v)),
        (TypeDescriptor::Mixed, _) => true,
        _ => false,
    }
}

/// Value equality between a backing value and raw input. Numeric strings
/// match integer cases and integers match string cases with the same text.
fn enum_value_matches(case: &EnumScalar, raw: &Value) -> bool {
    match (case, raw) {
        (EnumScalar::Int(i), Value::Int(j)) => i == j,
        (EnumScalar::Int(i), Value::Float(f)) => f.fract() == 0.0 && *f == *i as f64,
        (EnumScalar::Int(i), Value::String(s)) => s.trim().parse::<i64>().is_ok_and(|j| j == *i),
        (EnumScalar::String(s), Value::String(t)) => s == t,
        (EnumScalar::String(s), Value::Int(j)) => *s == j.to_string(),
        _ => false,
    }
}

fn join_path(parent: &str, field: &str) -> String {
    if parent.is_empty() { field.to_string() } else { format!("{parent}.{field}") }
}

// ------------------------------- Tests ------------------------------------ //
