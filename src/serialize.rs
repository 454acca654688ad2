//! Lower instances back to plain data.
//!
//! Walks fields in metadata order (inherited first). Unset fields read as
//! null. Null elision is decided per level with the same flag.
use crate::descriptor::EnumScalar;
use crate::value::{Instance, Map, Value};

impl Instance {
    /// Plain ordered map of this instance; nested instances and enum cases
    /// are replaced by their plain forms.
    pub fn to_plain(&self, elide_nulls: bool) -> Map {
        let mut out = Map::with_capacity(self.metadata().fields.len());
        for (name, value) in self.fields() {
            let value = value.unwrap_or(&Value::Null);
            if elide_nulls && value.is_null() {
                continue;
            }
            out.insert(name.to_string(), lower_value(value, elide_nulls));
        }
        out
    }

    /// JSON view of `to_plain(false)`.
    pub fn to_json_value(&self) -> serde_json::Value {
        Value::Map(self.to_plain(false)).to_json_value()
    }

    pub fn to_json(&self) -> String {
        self.to_json_value().to_string()
    }

    pub fn to_json_pretty(&self) -> String {
        // a serde_json::Value always serializes
        serde_json::to_string_pretty(&self.to_json_value()).unwrap_or_default()
    }
}

fn lower_value(value: &Value, elide_nulls: bool) -> Value {
    match value {
        Value::Sequence(xs) => Value::Sequence(xs.iter().map(|x| lower_member(x, elide_nulls)).collect()),
        Value::Collection(xs) => Value::Collection(xs.iter().map(|x| lower_member(x, elide_nulls)).collect()),
        other => lower_member(other, elide_nulls),
    }
}

/// Instance/enum substitution; everything else passes through.
fn lower_member(value: &Value, elide_nulls: bool) -> Value {
    match value {
        Value::Object(inst) => Value::Map(inst.to_plain(elide_nulls)),
        Value::Enum(e) => match &e.value {
            EnumScalar::Int(i) => Value::Int(*i),
            EnumScalar::String(s) => Value::String(s.clone()),
        },
        other => other.clone(),
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use crate::descriptor::{CastSpec, EnumDecl, TypeDecl, TypeDescriptor as D};
    use crate::registry::Registry;
    use crate::value::Value;
    use serde_json::json;

    fn registry() -> Registry {
        Registry::builder()
            .enumeration(EnumDecl::new("TestEnum").case("One", 1).case("Two", 2))
            .register(
                TypeDecl::new("SimpleDTO")
                    .field("name", D::string())
                    .field("age", D::int())
                    .nullable_field("email", D::string()),
            )
            .register(TypeDecl::new("AddressDTO").field("street", D::string()).field("number", D::int()))
            .register(
                TypeDecl::new("SerializationDTO")
                    .field("name", D::string())
                    .nullable_field("nullableName", D::string())
                    .field("age", D::int())
                    .nullable_field("nullableAge", D::int())
                    .nullable_field("nullableAddress", D::nested("AddressDTO"))
                    .field("items", D::array())
                    .nullable_field("nullableCollection", D::array())
                    .nullable_field("enum", D::enumeration("TestEnum"))
                    .cast("nullableCollection", CastSpec::collection("SimpleDTO")),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn nulls_are_kept_by_default() {
        let dto = registry()
            .hydrate_json("SerializationDTO", json!({
                "name": "John", "nullableName": null, "age": 25, "nullableAge": null,
                "items": [1, 2, 3], "nullableCollection": null
            }))
            .unwrap();
        let plain = dto.to_plain(false);
        assert_eq!(plain["nullableName"], Value::Null);
        assert_eq!(plain["nullableAge"], Value::Null);
        // never assigned, still listed
        assert_eq!(plain["nullableAddress"], Value::Null);
        assert_eq!(plain["nullableCollection"], Value::Null);
        assert_eq!(plain["name"], Value::from("John"));
        assert_eq!(plain["items"], Value::from(json!([1, 2, 3])));
    }

    #[test]
    fn elision_drops_every_null() {
        let dto = registry()
            .hydrate_json("SerializationDTO", json!({"name": "John", "nullableName": null, "age": 25, "items": [1, 2, 3]}))
            .unwrap();
        let full = dto.to_plain(false);
        let lean = dto.to_plain(true);
        assert!(lean.values().all(|v| !v.is_null()));
        assert!(lean.keys().all(|k| full.contains_key(k)));
        let keys: Vec<_> = lean.keys().cloned().collect();
        assert_eq!(keys, vec!["name", "age", "items"]);
    }

    #[test]
    fn nested_values_become_plain() {
        let dto = registry()
            .hydrate_json("SerializationDTO", json!({
                "name": "John", "age": 25, "items": [],
                "nullableAddress": {"street": "Main St", "number": 123},
                "nullableCollection": [{"name": "Nested User", "age": 30, "email": null}],
                "enum": 2
            }))
            .unwrap();
        let plain = dto.to_plain(true);
        let address = plain["nullableAddress"].as_map().unwrap();
        assert_eq!(address["street"], Value::from("Main St"));
        assert_eq!(plain["enum"], Value::Int(2));
        // container shape survives; nested elision follows the flag
        match &plain["nullableCollection"] {
            Value::Collection(xs) => {
                let user = xs[0].as_map().unwrap();
                assert_eq!(user["name"], Value::from("Nested User"));
                assert!(!user.contains_key("email"));
            }
            other => panic!("expected collection, got {other:?}"),
        }
        let full = dto.to_plain(false);
        let user = full["nullableCollection"].as_elements().unwrap()[0].as_map().unwrap().clone();
        assert_eq!(user["email"], Value::Null);
    }

    #[test]
    fn json_follows_field_order() {
        let dto = registry()
            .hydrate_json("SimpleDTO", json!({"email": "a@b.c", "age": "28", "name": "Jane"}))
            .unwrap();
        assert_eq!(dto.to_json(), r#"{"name":"Jane","age":28,"email":"a@b.c"}"#);
        assert_eq!(serde_json::to_string(&dto).unwrap(), dto.to_json());
        assert!(dto.to_json_pretty().contains("\n"));
    }

    #[test]
    fn unset_fields_serialize_as_null() {
        let dto = registry().hydrate_json("SimpleDTO", json!({"name": "Jane"})).unwrap();
        assert_eq!(dto.to_json_value(), json!({"name": "Jane", "age": null, "email": null}));
    }
}
