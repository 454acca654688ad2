//! Cast application: rebuild a field as one nested object or a group of them.
use crate::descriptor::{CastMode, CastSpec};
use crate::error::{Error, TypeError};
use crate::registry::Registry;
use crate::value::Value;

impl Registry {
    /// Apply `cast` to a field whose descriptor already resolved `raw` to
    /// `resolved`. The cast result replaces the resolved value.
    ///
    /// A single cast keeps `resolved` when it already is a `target`; groups
    /// are always rebuilt from `raw`.
    pub(crate) fn apply_cast(
        &self,
        cast: &CastSpec,
        resolved: Value,
        raw: Value,
        path: &str,
        depth: usize,
    ) -> Result<Value, Error> {
        // null never turns into an empty container
        if raw.is_null() {
            return Ok(Value::Null);
        }
        match cast.mode {
            CastMode::Single => match resolved {
                Value::Object(inst) if inst.is_a(&cast.target) => Ok(Value::Object(inst)),
                _ => self.cast_member(cast, raw, path, depth),
            },
            CastMode::Sequence | CastMode::Collection => {
                let elements = match raw {
                    Value::Sequence(xs) | Value::Collection(xs) => xs,
                    other => {
                        return Err(TypeError::CastExpectedSequence {
                            path: path.to_string(),
                            target: cast.target.clone(),
                            found: other.kind_name(),
                        }.into());
                    }
                };
                let members = elements
                    .into_iter()
                    .enumerate()
                    .map(|(i, el)| self.cast_member(cast, el, &format!("{path}[{i}]"), depth))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(match cast.mode {
                    CastMode::Collection => Value::Collection(members),
                    _ => Value::Sequence(members),
                })
            }
        }
    }

    /// One `target`: keep an existing instance, hydrate a map, reject the rest.
    fn cast_member(&self, cast: &CastSpec, raw: Value, path: &str, depth: usize) -> Result<Value, Error> {
        match raw {
            Value::Object(inst) if inst.is_a(&cast.target) => Ok(Value::Object(inst)),
            Value::Map(map) => Ok(Value::Object(self.hydrate_at(cast.target.as_str(), map, path, depth + 1)?)),
            other => Err(TypeError::CastExpectedStructure {
                path: path.to_string(),
                target: cast.target.clone(),
                found: other.kind_name(),
            }.into()),
        }
    }
}

// ------------------------------- Tests ------------------------------------ //
