//! Projection of registered routes into an OpenAPI document.
//!
//! # Responsibilities
//! - Walk route docs in registration order and build one operation per method+path
//! - Attach request bodies, parameters and responses with their schemas
//! - Fill in examples: declared ones first, synthesized ones when enabled
//! - Publish every referenced component schema
//!
//! # Design Decisions
//! - Rebuilt from scratch on every call; nothing is cached
//! - Paths keep first-seen order; the first route for a method+path is documented
//! - Responses without a schema are documented without content

use std::collections::{BTreeMap, HashMap, HashSet};

use serde_json::Value;
use utoipa::openapi::content::{Content, ContentBuilder};
use utoipa::openapi::example::ExampleBuilder;
use utoipa::openapi::path::{
    Operation, OperationBuilder, Parameter, ParameterBuilder, ParameterIn, PathItemBuilder,
};
use utoipa::openapi::request_body::RequestBodyBuilder;
use utoipa::openapi::response::ResponseBuilder;
use utoipa::openapi::schema::Schema as OpenApiSchema;
use utoipa::openapi::{
    ComponentsBuilder, InfoBuilder, OpenApi, OpenApiBuilder, PathsBuilder, RefOr, Required,
    ServerBuilder,
};

use crate::config::ApplicationOptions;
use crate::routing::{Method, RouteDoc};
use crate::schema::{MockGenerator, SchemaDoc};

/// Builds documents from route docs under one set of options.
pub struct SpecProjector<'a> {
    options: &'a ApplicationOptions,
}

impl<'a> SpecProjector<'a> {
    pub fn new(options: &'a ApplicationOptions) -> Self {
        Self { options }
    }

    /// Build the document for `routes`, in the order given.
    pub fn project<'r, I>(&self, routes: I) -> OpenApi
    where
        I: IntoIterator<Item = &'r RouteDoc>,
    {
        let routes: Vec<&RouteDoc> = routes.into_iter().collect();

        let mut components: BTreeMap<String, RefOr<OpenApiSchema>> = BTreeMap::new();
        for route in &routes {
            for (name, schema) in route.components() {
                components.entry(name).or_insert(schema);
            }
        }
        let components_json: BTreeMap<String, Value> = components
            .iter()
            .filter_map(|(name, schema)| {
                serde_json::to_value(schema)
                    .ok()
                    .map(|json| (name.clone(), json))
            })
            .collect();

        let mut examples = Examples {
            enabled: self.options.generate_mock_examples,
            mock: MockGenerator::from_seed(self.options.mock_seed),
            components: &components_json,
        };

        let mut seen: HashSet<(Method, &str)> = HashSet::new();
        let mut order: Vec<&str> = Vec::new();
        let mut grouped: HashMap<&str, Vec<(Method, Operation)>> = HashMap::new();
        for route in &routes {
            if !seen.insert((route.method, route.path.as_str())) {
                tracing::debug!(
                    method = %route.method,
                    path = %route.path,
                    "duplicate route left out of the document"
                );
                continue;
            }
            let operation = operation(route, &mut examples);
            let path = route.path.as_str();
            grouped
                .entry(path)
                .or_insert_with(|| {
                    order.push(path);
                    Vec::new()
                })
                .push((route.method, operation));
        }

        let mut paths = PathsBuilder::new();
        for path in order {
            let mut item = PathItemBuilder::new();
            for (method, operation) in grouped.remove(path).unwrap_or_default() {
                item = item.operation(method.path_item_type(), operation);
            }
            paths = paths.path(path, item.build());
        }

        let components = components
            .into_iter()
            .fold(ComponentsBuilder::new(), |builder, (name, schema)| {
                builder.schema(name, schema)
            })
            .build();

        let info = &self.options.openapi.info;
        let servers = &self.options.openapi.servers;
        OpenApiBuilder::new()
            .info(
                InfoBuilder::new()
                    .title(info.title.as_str())
                    .version(info.version.as_str())
                    .description(info.description.as_deref())
                    .build(),
            )
            .servers((!servers.is_empty()).then(|| {
                servers
                    .iter()
                    .map(|server| {
                        ServerBuilder::new()
                            .url(server.url.as_str())
                            .description(server.description.as_deref())
                            .build()
                    })
                    .collect::<Vec<_>>()
            }))
            .paths(paths.build())
            .components(Some(components))
            .build()
    }
}

struct Examples<'c> {
    enabled: bool,
    mock: MockGenerator,
    components: &'c BTreeMap<String, Value>,
}

impl Examples<'_> {
    /// Declared example, else a synthesized one when enabled.
    fn pick(&mut self, schema: &RefOr<OpenApiSchema>, declared: Option<&Value>) -> Option<Value> {
        match declared {
            Some(value) => Some(value.clone()),
            None if self.enabled => Some(self.mock.generate(schema, self.components)),
            None => None,
        }
    }
}

fn operation(route: &RouteDoc, examples: &mut Examples<'_>) -> Operation {
    let mut builder = OperationBuilder::new()
        .operation_id(route.operation_id.clone())
        .summary(route.summary.clone());
    for tag in &route.tags {
        builder = builder.tag(tag.as_str());
    }

    if let Some(params) = &route.params {
        for parameter in parameters(params.as_ref(), ParameterIn::Path, examples.components) {
            builder = builder.parameter(parameter);
        }
    }
    if let Some(query) = &route.query {
        for parameter in parameters(query.as_ref(), ParameterIn::Query, examples.components) {
            builder = builder.parameter(parameter);
        }
    }

    if let Some(body) = &route.request_body {
        let schema = body.schema.schema();
        let content = content(&schema, body.example.as_ref(), &body.examples, examples);
        builder = builder.request_body(Some(
            RequestBodyBuilder::new()
                .description(body.description.clone())
                .content(body.content_type.as_str(), content)
                .required(Some(Required::True))
                .build(),
        ));
    }

    for (status, response) in &route.responses {
        let mut doc = ResponseBuilder::new().description(response.description.as_str());
        if let Some(schema) = &response.schema {
            let schema = schema.schema();
            let content = content(&schema, response.example.as_ref(), &response.examples, examples);
            doc = doc.content(response.content_type.as_str(), content);
        }
        builder = builder.response(status.to_string(), doc.build());
    }

    builder.build()
}

fn content(
    schema: &RefOr<OpenApiSchema>,
    example: Option<&Value>,
    named: &BTreeMap<String, Value>,
    examples: &mut Examples<'_>,
) -> Content {
    let mut builder = ContentBuilder::new()
        .schema(schema.clone())
        .example(examples.pick(schema, example));
    if !named.is_empty() {
        builder = builder.examples_from_iter(named.iter().map(|(name, value)| {
            (
                name.clone(),
                ExampleBuilder::new().value(Some(value.clone())).build(),
            )
        }));
    }
    builder.build()
}

/// One parameter per top-level property of an object schema.
fn parameters(
    schema: &dyn SchemaDoc,
    location: ParameterIn,
    components: &BTreeMap<String, Value>,
) -> Vec<Parameter> {
    let Ok(mut json) = serde_json::to_value(schema.schema()) else {
        return Vec::new();
    };
    if let Some(target) = json
        .get("$ref")
        .and_then(Value::as_str)
        .and_then(|r| r.rsplit('/').next())
        .and_then(|name| components.get(name))
    {
        json = target.clone();
    }

    let required: HashSet<&str> = json
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    let Some(properties) = json.get("properties").and_then(Value::as_object) else {
        return Vec::new();
    };

    properties
        .iter()
        .map(|(name, property)| {
            let is_required =
                matches!(location, ParameterIn::Path) || required.contains(name.as_str());
            let property_schema =
                serde_json::from_value::<RefOr<OpenApiSchema>>(property.clone()).ok();
            let description = property
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string);
            ParameterBuilder::new()
                .name(name.as_str())
                .parameter_in(location.clone())
                .required(if is_required { Required::True } else { Required::False })
                .description(description)
                .schema(property_schema)
                .build()
        })
        .collect()
}
