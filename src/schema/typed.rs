//! Serde-backed schema for any `Deserialize + ToSchema` type.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use utoipa::openapi::schema::Schema as OpenApiSchema;
use utoipa::openapi::RefOr;
use utoipa::ToSchema;

use super::{Component, Schema, SchemaDoc, SchemaError};

type Check<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Schema derived from a Rust type.
///
/// Validation is deserialization: a body must decode into `T`, params and
/// query pairs must decode into `T` with scalar coercion. Extra constraints
/// that the type cannot express are added with [`Typed::refine`].
pub struct Typed<T> {
    checks: Vec<(Check<T>, String)>,
    components: Vec<Component>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Typed<T> {
    pub fn new() -> Self {
        Self {
            checks: Vec::new(),
            components: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Add a predicate the parsed value must satisfy.
    pub fn refine<F>(mut self, check: F, message: impl Into<String>) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.checks.push((Arc::new(check), message.into()));
        self
    }

    /// Publish `C` under `#/components/schemas` so `$ref`s to it resolve.
    pub fn component<C>(mut self) -> Self
    where
        C: for<'s> ToSchema<'s>,
    {
        let (name, schema) = C::schema();
        self.components.push((name.to_string(), schema));
        self
    }

    fn check(&self, value: T) -> Result<T, SchemaError> {
        for (check, message) in &self.checks {
            if !check(&value) {
                return Err(SchemaError::Refinement(message.clone()));
            }
        }
        Ok(value)
    }
}

impl<T> Default for Typed<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Typed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Typed")
            .field("type", &std::any::type_name::<T>())
            .field("checks", &self.checks.len())
            .finish()
    }
}

impl<T> SchemaDoc for Typed<T>
where
    T: for<'s> ToSchema<'s> + 'static,
{
    fn schema(&self) -> RefOr<OpenApiSchema> {
        T::schema().1
    }

    fn components(&self) -> Vec<Component> {
        self.components.clone()
    }
}

impl<T> Schema for Typed<T>
where
    T: DeserializeOwned + for<'s> ToSchema<'s> + Send + 'static,
{
    type Output = T;

    fn parse_json(&self, value: &Value) -> Result<T, SchemaError> {
        let parsed = T::deserialize(value)?;
        self.check(parsed)
    }

    fn parse_pairs(&self, pairs: &[(String, String)]) -> Result<T, SchemaError> {
        let encoded = serde_urlencoded::to_string(pairs)?;
        let parsed = serde_urlencoded::from_str(&encoded)?;
        self.check(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, ToSchema, PartialEq)]
    struct Page {
        n: u32,
        active: Option<bool>,
    }

    #[derive(Debug, Deserialize, ToSchema, PartialEq)]
    struct NewPet {
        name: String,
        age: u8,
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_pairs_coerce_numeric_strings() {
        let schema = Typed::<Page>::new();
        let page = schema.parse_pairs(&pairs(&[("n", "5")])).unwrap();
        assert_eq!(page, Page { n: 5, active: None });

        let page = schema
            .parse_pairs(&pairs(&[("n", "7"), ("active", "true")]))
            .unwrap();
        assert_eq!(page.active, Some(true));
    }

    #[test]
    fn test_pairs_reject_non_numeric() {
        let schema = Typed::<Page>::new();
        assert!(schema.parse_pairs(&pairs(&[("n", "five")])).is_err());
        assert!(schema.parse_pairs(&[]).is_err());
    }

    #[test]
    fn test_json_does_not_coerce_strings() {
        let schema = Typed::<NewPet>::new();
        assert!(schema.parse_json(&json!({"name": "Rex", "age": 3})).is_ok());
        assert!(schema.parse_json(&json!({"name": "Rex", "age": "3"})).is_err());
        assert!(schema.parse_json(&Value::Null).is_err());
    }

    #[test]
    fn test_refine_rejects() {
        let schema =
            Typed::<NewPet>::new().refine(|p| !p.name.is_empty(), "name must not be empty");
        let err = schema
            .parse_json(&json!({"name": "", "age": 1}))
            .unwrap_err();
        assert!(matches!(err, SchemaError::Refinement(ref m) if m == "name must not be empty"));
    }

    #[test]
    fn test_doc_is_object_schema() {
        let schema = Typed::<NewPet>::new();
        let json = serde_json::to_value(schema.schema()).unwrap();
        assert_eq!(json["type"], "object");
        assert!(json["properties"].get("name").is_some());
        assert!(schema.components().is_empty());
    }
}
