//! Validation gate consumed by the hydrator.
//!
//! Rule syntax is not our business: a gate sees the whole raw map and either
//! passes or reports field-level messages.
use std::fmt;

use serde::Serialize;

use crate::value::Map;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub trait Validator: Send + Sync {
    fn validate(&self, data: &Map) -> Result<(), Vec<FieldError>>;
}

impl<F> Validator for F
where
    F: Fn(&Map) -> Result<(), Vec<FieldError>> + Send + Sync,
{
    fn validate(&self, data: &Map) -> Result<(), Vec<FieldError>> {
        self(data)
    }
}

/// Gate that requires every listed key to be present and non-null.
#[derive(Debug, Clone, Default)]
pub struct Required(pub Vec<String>);

impl Required {
    pub fn fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(fields.into_iter().map(Into::into).collect())
    }
}

impl Validator for Required {
    fn validate(&self, data: &Map) -> Result<(), Vec<FieldError>> {
        let errors: Vec<FieldError> = self.0.iter()
            .filter(|k| data.get(k.as_str()).is_none_or(|v| v.is_null()))
            .map(|k| FieldError::new(k.clone(), format!("field {k} is required")))
            .collect();
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

// ------------------------------- Tests ------------------------------------ //
