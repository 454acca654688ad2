//! Model adapters: anything that can expose its fields as a raw map.
//!
//! Key naming is the adapter's concern; [`CamelCaseKeys`] covers the common
//! snake_case storage → camelCase field mapping.
use crate::value::{Map, Value};

pub trait ModelAdapter {
    fn extract_fields(&self) -> Map;
}

impl ModelAdapter for Map {
    fn extract_fields(&self) -> Map {
        self.clone()
    }
}

impl ModelAdapter for serde_json::Map<String, serde_json::Value> {
    fn extract_fields(&self) -> Map {
        self.iter().map(|(k, v)| (k.clone(), Value::from(v.clone()))).collect()
    }
}

/// Wraps an adapter and rewrites its top-level keys from snake_case to camelCase.
#[derive(Debug, Clone)]
pub struct CamelCaseKeys<A>(pub A);

impl<A: ModelAdapter> ModelAdapter for CamelCaseKeys<A> {
    fn extract_fields(&self) -> Map {
        self.0.extract_fields()
            .into_iter()
            .map(|(k, v)| (snake_to_camel(&k), v))
            .collect()
    }
}

/// `snake_case_field` → `snakeCaseField`. Leading underscores are kept.
pub fn snake_to_camel(key: &str) -> String {
    let body = key.trim_start_matches('_');
    let mut out = String::with_capacity(key.len());
    out.push_str(&key[..key.len() - body.len()]);
    let mut upper = false;
    for ch in body.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

// ------------------------------- Tests ------------------------------------ //
