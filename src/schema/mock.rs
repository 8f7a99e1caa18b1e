//! Mock value synthesis from schemas.
//!
//! # Responsibilities
//! - Produce one plausible JSON value that conforms to a schema
//! - Resolve `$ref`s against the published components
//! - Pick the first concrete variant of `oneOf`/`anyOf`
//! - Respect enums, bounds and well-known string formats
//!
//! # Design Decisions
//! - Works on the JSON form of the schema so raw and derived schemas share one path
//! - Explicit `example`/`default`/`const` win over synthesis
//! - Recursion is capped; anything deeper becomes `null`
//! - Seedable so documents can be reproducible in tests

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};
use utoipa::openapi::schema::Schema as OpenApiSchema;
use utoipa::openapi::RefOr;

const MAX_DEPTH: usize = 8;
const COMPONENT_PREFIX: &str = "#/components/schemas/";

const WORDS: &[&str] = &[
    "alpha", "bravo", "canyon", "delta", "ember", "falcon", "garnet", "harbor", "island",
    "juniper", "kestrel", "lumen", "meadow", "nimbus", "orchid", "pepper", "quartz", "river",
    "summit", "tundra", "umber", "violet", "willow", "zephyr",
];

/// Synthesizes example payloads.
#[derive(Debug, Clone)]
pub struct MockGenerator {
    rng: fastrand::Rng,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map(Self::seeded).unwrap_or_default()
    }

    /// Generate a value for `schema`; `components` maps component names to their JSON form.
    pub fn generate(
        &mut self,
        schema: &RefOr<OpenApiSchema>,
        components: &BTreeMap<String, Value>,
    ) -> Value {
        match serde_json::to_value(schema) {
            Ok(json) => self.value(&json, components, 0),
            Err(e) => {
                tracing::debug!(error = %e, "schema not serializable, mock is null");
                Value::Null
            }
        }
    }

    /// Generate directly from the JSON form of a schema.
    pub fn generate_json(&mut self, schema: &Value, components: &BTreeMap<String, Value>) -> Value {
        self.value(schema, components, 0)
    }

    fn value(
        &mut self,
        schema: &Value,
        components: &BTreeMap<String, Value>,
        depth: usize,
    ) -> Value {
        if depth > MAX_DEPTH {
            return Value::Null;
        }
        let Some(obj) = schema.as_object() else {
            return Value::Null;
        };

        if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
            let name = reference.strip_prefix(COMPONENT_PREFIX).unwrap_or(reference);
            return match components.get(name) {
                Some(target) => self.value(target, components, depth + 1),
                None => Value::Null,
            };
        }

        for key in ["example", "default", "const"] {
            if let Some(v) = obj.get(key) {
                return v.clone();
            }
        }

        if let Some(choices) = obj.get("enum").and_then(Value::as_array) {
            if !choices.is_empty() {
                return choices[self.rng.usize(..choices.len())].clone();
            }
        }

        if let Some(parts) = obj.get("allOf").and_then(Value::as_array) {
            let mut merged = Map::new();
            for part in parts {
                match self.value(part, components, depth + 1) {
                    Value::Object(fields) => merged.extend(fields),
                    other if parts.len() == 1 => return other,
                    _ => {}
                }
            }
            return Value::Object(merged);
        }

        for key in ["oneOf", "anyOf"] {
            if let Some(variants) = obj.get(key).and_then(Value::as_array) {
                let first = variants
                    .iter()
                    .find(|v| v.get("type").and_then(Value::as_str) != Some("null"));
                return match first {
                    Some(variant) => self.value(variant, components, depth + 1),
                    None => Value::Null,
                };
            }
        }

        match schema_type(obj) {
            Some("string") => self.string(obj),
            Some("integer") => self.integer(obj),
            Some("number") => self.number(obj),
            Some("boolean") => Value::Bool(self.rng.bool()),
            Some("array") => self.array(obj, components, depth),
            Some("object") => self.object(obj, components, depth),
            _ => Value::Null,
        }
    }

    fn string(&mut self, obj: &Map<String, Value>) -> Value {
        let text = match obj.get("format").and_then(Value::as_str) {
            Some("date-time") => format!(
                "2024-{:02}-{:02}T{:02}:{:02}:00Z",
                self.rng.u8(1..=12),
                self.rng.u8(1..=28),
                self.rng.u8(0..24),
                self.rng.u8(0..60)
            ),
            Some("date") => format!("2024-{:02}-{:02}", self.rng.u8(1..=12), self.rng.u8(1..=28)),
            Some("uuid") => {
                let mut bytes = [0u8; 16];
                self.rng.fill(&mut bytes);
                uuid::Builder::from_random_bytes(bytes).into_uuid().to_string()
            }
            Some("email") => format!("{}@example.com", self.word()),
            Some("uri") | Some("url") => format!("https://example.com/{}", self.word()),
            _ => {
                let min = bound(obj, "minLength").unwrap_or(0.0) as usize;
                let max = bound(obj, "maxLength").map(|m| m as usize);
                let mut text = self.word().to_string();
                while text.len() < min {
                    text.push_str(self.word());
                }
                if let Some(max) = max {
                    text.truncate(max.max(min));
                }
                text
            }
        };
        Value::String(text)
    }

    fn integer(&mut self, obj: &Map<String, Value>) -> Value {
        let min = bound(obj, "minimum").map(|v| v as i64).unwrap_or(1);
        let max = bound(obj, "maximum")
            .map(|v| v as i64)
            .unwrap_or(min.saturating_add(99))
            .max(min);
        Value::Number(self.rng.i64(min..=max).into())
    }

    fn number(&mut self, obj: &Map<String, Value>) -> Value {
        let min = bound(obj, "minimum").unwrap_or(0.0);
        let max = bound(obj, "maximum").unwrap_or(min + 100.0).max(min);
        let raw = min + self.rng.f64() * (max - min);
        let rounded = (raw * 100.0).round() / 100.0;
        Number::from_f64(rounded.clamp(min, max))
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }

    fn array(
        &mut self,
        obj: &Map<String, Value>,
        components: &BTreeMap<String, Value>,
        depth: usize,
    ) -> Value {
        let min = bound(obj, "minItems").map(|v| v as usize).unwrap_or(1);
        let max = bound(obj, "maxItems").map(|v| v as usize).unwrap_or(min.max(3)).max(min);
        let count = self.rng.usize(min..=max);
        let items = obj.get("items").cloned().unwrap_or(Value::Null);
        Value::Array(
            (0..count)
                .map(|_| self.value(&items, components, depth + 1))
                .collect(),
        )
    }

    fn object(
        &mut self,
        obj: &Map<String, Value>,
        components: &BTreeMap<String, Value>,
        depth: usize,
    ) -> Value {
        let mut out = Map::new();
        if let Some(properties) = obj.get("properties").and_then(Value::as_object) {
            for (name, property) in properties {
                out.insert(name.clone(), self.value(property, components, depth + 1));
            }
        }
        Value::Object(out)
    }

    fn word(&mut self) -> &'static str {
        WORDS[self.rng.usize(..WORDS.len())]
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn schema_type(obj: &Map<String, Value>) -> Option<&str> {
    match obj.get("type") {
        Some(Value::String(t)) => Some(t.as_str()),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null"),
        _ if obj.contains_key("properties") || obj.contains_key("additionalProperties") => {
            Some("object")
        }
        _ if obj.contains_key("items") => Some("array"),
        _ => None,
    }
}

fn bound(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    obj.get(key).and_then(Value::as_f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mock(schema: Value) -> Value {
        MockGenerator::seeded(7).generate_json(&schema, &BTreeMap::new())
    }

    #[test]
    fn test_object_has_every_property() {
        let value = mock(json!({
            "type": "object",
            "required": ["name"],
            "properties": {
                "name": {"type": "string"},
                "age": {"type": "integer", "minimum": 0, "maximum": 20},
                "tags": {"type": "array", "items": {"type": "string"}}
            }
        }));
        assert!(value["name"].is_string());
        let age = value["age"].as_i64().unwrap();
        assert!((0..=20).contains(&age));
        let tags = value["tags"].as_array().unwrap();
        assert!(!tags.is_empty() && tags.iter().all(Value::is_string));
    }

    #[test]
    fn test_explicit_example_wins() {
        assert_eq!(mock(json!({"type": "string", "example": "fixed"})), json!("fixed"));
        assert_eq!(mock(json!({"type": "integer", "default": 4})), json!(4));
    }

    #[test]
    fn test_enum_picks_member() {
        let value = mock(json!({"type": "string", "enum": ["dog", "cat"]}));
        assert!(value == json!("dog") || value == json!("cat"));
    }

    #[test]
    fn test_ref_resolves_component() {
        let mut components = BTreeMap::new();
        components.insert(
            "Pet".to_string(),
            json!({"type": "object", "properties": {"id": {"type": "integer"}}}),
        );
        let value = MockGenerator::seeded(1)
            .generate_json(&json!({"$ref": "#/components/schemas/Pet"}), &components);
        assert!(value["id"].is_i64());

        let missing = MockGenerator::seeded(1)
            .generate_json(&json!({"$ref": "#/components/schemas/Nope"}), &components);
        assert!(missing.is_null());
    }

    #[test]
    fn test_self_reference_terminates() {
        let mut components = BTreeMap::new();
        components.insert(
            "Node".to_string(),
            json!({
                "type": "object",
                "properties": {"next": {"$ref": "#/components/schemas/Node"}}
            }),
        );
        let value = MockGenerator::seeded(3)
            .generate_json(&json!({"$ref": "#/components/schemas/Node"}), &components);
        assert!(value.is_object());
    }

    #[test]
    fn test_one_of_takes_first_concrete_variant() {
        let value = mock(json!({
            "oneOf": [{"type": "null"}, {"type": "boolean"}, {"type": "string"}]
        }));
        assert!(value.is_boolean());
    }

    #[test]
    fn test_string_formats() {
        let uuid = mock(json!({"type": "string", "format": "uuid"}));
        assert!(uuid::Uuid::parse_str(uuid.as_str().unwrap()).is_ok());

        let email = mock(json!({"type": "string", "format": "email"}));
        assert!(email.as_str().unwrap().ends_with("@example.com"));

        let short = mock(json!({"type": "string", "minLength": 2, "maxLength": 3}));
        let len = short.as_str().unwrap().len();
        assert!((2..=3).contains(&len));
    }

    #[test]
    fn test_same_seed_same_value() {
        let schema = json!({
            "type": "object",
            "properties": {"n": {"type": "number"}, "s": {"type": "string"}}
        });
        let a = MockGenerator::seeded(42).generate_json(&schema, &BTreeMap::new());
        let b = MockGenerator::seeded(42).generate_json(&schema, &BTreeMap::new());
        assert_eq!(a, b);
    }

    #[test]
    fn test_unknown_shape_is_null() {
        assert!(mock(json!({})).is_null());
        assert!(mock(json!(true)).is_null());
    }
}
