//! Runtime values: raw input and hydrated instance contents share one model.
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::descriptor::{EnumScalar, TypeName};
use crate::registry::TypeMetadata;

/// Ordered key-value map; iteration follows insertion order.
pub type Map = IndexMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Map(Map),
    Sequence(Vec<Value>),   // ordered array
    Collection(Vec<Value>), // ordered collection wrapper
    Object(Instance),
    Enum(EnumValue),
}

impl Value {
    /// Runtime kind, as reported in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Map(_) => "map",
            Value::Sequence(_) => "sequence",
            Value::Collection(_) => "collection",
            Value::Object(_) => "object",
            Value::Enum(_) => "enum",
        }
    }

    pub fn is_null(&self) -> bool { matches!(self, Value::Null) }

    pub fn as_str(&self) -> Option<&str> {
        match self { Value::String(s) => Some(s), _ => None }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self { Value::Int(i) => Some(*i), _ => None }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self { Value::Float(f) => Some(*f), _ => None }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self { Value::Bool(b) => Some(*b), _ => None }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self { Value::Map(m) => Some(m), _ => None }
    }

    /// Elements of either group shape.
    pub fn as_elements(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(xs) | Value::Collection(xs) => Some(xs),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self { Value::Object(i) => Some(i), _ => None }
    }

    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self { Value::Enum(e) => Some(e), _ => None }
    }

    /// Lossy conversion to JSON: instances lower through [`Instance::to_plain`]
    /// without elision, enum cases become their backing value, and non-finite
    /// floats become `null`.
    pub fn to_json_value(&self) -> serde_json::Value {
        use serde_json::Value as J;
        match self {
            Value::Null => J::Null,
            Value::Bool(b) => J::Bool(*b),
            Value::Int(i) => J::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f).map(J::Number).unwrap_or(J::Null),
            Value::String(s) => J::String(s.clone()),
            Value::Map(m) => J::Object(m.iter().map(|(k, v)| (k.clone(), v.to_json_value())).collect()),
            Value::Sequence(xs) | Value::Collection(xs) => J::Array(xs.iter().map(Value::to_json_value).collect()),
            Value::Object(i) => i.to_json_value(),
            Value::Enum(e) => match &e.value {
                EnumScalar::Int(i) => J::from(*i),
                EnumScalar::String(s) => J::String(s.clone()),
            },
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value as J;
        match v {
            J::Null => Value::Null,
            J::Bool(b) => Value::Bool(b),
            J::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                // u64 above i64::MAX and real numbers both land here
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            J::String(s) => Value::String(s),
            J::Array(xs) => Value::Sequence(xs.into_iter().map(Value::from).collect()),
            J::Object(m) => Value::Map(m.into_iter().map(|(k, v)| (k, Value::from(v))).collect()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Value::String(s.to_string()) }
}

impl From<String> for Value {
    fn from(s: String) -> Self { Value::String(s) }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self { Value::Int(i) }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self { Value::Float(f) }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self { Value::Bool(b) }
}

impl From<Instance> for Value {
    fn from(i: Instance) -> Self { Value::Object(i) }
}

impl From<EnumValue> for Value {
    fn from(e: EnumValue) -> Self { Value::Enum(e) }
}

/// Convert a JSON object into a raw map; `None` for any other JSON kind.
pub fn map_from_json(v: serde_json::Value) -> Option<Map> {
    match Value::from(v) {
        Value::Map(m) => Some(m),
        _ => None,
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            Value::Float(_) => serializer.serialize_unit(),
            Value::String(s) => serializer.serialize_str(s),
            Value::Map(m) => {
                let mut out = serializer.serialize_map(Some(m.len()))?;
                for (k, v) in m { out.serialize_entry(k, v)?; }
                out.end()
            }
            Value::Sequence(xs) | Value::Collection(xs) => {
                let mut out = serializer.serialize_seq(Some(xs.len()))?;
                for x in xs { out.serialize_element(x)?; }
                out.end()
            }
            Value::Object(i) => i.serialize(serializer),
            Value::Enum(e) => match &e.value {
                EnumScalar::Int(i) => serializer.serialize_i64(*i),
                EnumScalar::String(s) => serializer.serialize_str(s),
            },
        }
    }
}

// -------------------------------- Enums ----------------------------------- //

/// A resolved enum case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    pub enum_name: TypeName,
    pub case: String,
    pub value: EnumScalar,
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.enum_name, self.case)
    }
}

// ------------------------------- Instances -------------------------------- //

/// A hydrated typed object.
///
/// Slots are indexed by field position in the type's metadata; `None` means
/// the field was never assigned, which is distinct from an explicit null.
#[derive(Clone)]
pub struct Instance {
    meta: Arc<TypeMetadata>,
    slots: Vec<Option<Value>>,
}

impl Instance {
    pub(crate) fn empty(meta: Arc<TypeMetadata>) -> Self {
        let slots = vec![None; meta.fields.len()];
        Self { meta, slots }
    }

    pub(crate) fn assign(&mut self, index: usize, value: Value) {
        self.slots[index] = Some(value);
    }

    pub fn type_name(&self) -> &TypeName {
        &self.meta.type_name
    }

    pub fn metadata(&self) -> &Arc<TypeMetadata> {
        &self.meta
    }

    /// True if this instance's type is `name` or derives from it.
    pub fn is_a(&self, name: &TypeName) -> bool {
        self.meta.is_subtype_of(name)
    }

    /// Current value of a field; `None` when unset or not declared.
    pub fn get(&self, field: &str) -> Option<&Value> {
        let index = self.meta.fields.get_index_of(field)?;
        self.slots[index].as_ref()
    }

    pub fn is_set(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Replace a declared field's value, returning the previous one.
    /// Undeclared fields are left alone and `None` is returned.
    pub fn set(&mut self, field: &str, value: Value) -> Option<Value> {
        let index = self.meta.fields.get_index_of(field)?;
        self.slots[index].replace(value)
    }

    /// Fields in declaration order with their current (possibly unset) values.
    pub fn fields(&self) -> impl Iterator<Item = (&str, Option<&Value>)> + '_ {
        self.meta.fields.keys().map(String::as_str).zip(self.slots.iter().map(Option::as_ref))
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.meta.type_name == other.meta.type_name && self.slots == other.slots
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct(self.meta.type_name.as_str());
        for (name, value) in self.fields() {
            match value {
                Some(v) => out.field(name, v),
                None => out.field(name, &format_args!("<unset>")),
            };
        }
        out.finish()
    }
}

impl Serialize for Instance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let plain = self.to_plain(false);
        let mut out = serializer.serialize_map(Some(plain.len()))?;
        for (k, v) in &plain { out.serialize_entry(k, v)?; }
        out.end()
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_numbers_split_into_int_and_float() {
        assert_eq!(Value::from(json!(7)), Value::Int(7));
        assert_eq!(Value::from(json!(7.5)), Value::Float(7.5));
        assert_eq!(Value::from(json!(u64::MAX)), Value::Float(u64::MAX as f64));
    }

    #[test]
    fn json_objects_keep_key_order() {
        let m = map_from_json(json!({"z": 1, "a": 2, "m": 3})).unwrap();
        let keys: Vec<_> = m.keys().cloned().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn map_from_json_rejects_non_objects() {
        assert!(map_from_json(json!([1, 2])).is_none());
    }

    #[test]
    fn non_finite_floats_serialize_as_null() {
        let v = Value::Sequence(vec![Value::Float(f64::NAN), Value::Float(1.5)]);
        assert_eq!(serde_json::to_string(&v).unwrap(), "[null,1.5]");
        assert_eq!(v.to_json_value(), json!([null, 1.5]));
    }

    #[test]
    fn collections_and_sequences_serialize_alike() {
        let s = Value::Sequence(vec![Value::Int(1)]);
        let c = Value::Collection(vec![Value::Int(1)]);
        assert_eq!(serde_json::to_string(&s).unwrap(), serde_json::to_string(&c).unwrap());
        assert_ne!(s, c);
    }
}
