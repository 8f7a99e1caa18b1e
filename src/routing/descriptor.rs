//! Route descriptors and their builder.
//!
//! # Responsibilities
//! - Hold one endpoint's method, path, schemas, responses, metadata and handler
//! - Type the handler context by the schemas declared on the builder
//! - Split a finished descriptor into a documentation view and a dispatch binding
//!
//! # Design Decisions
//! - A descriptor cannot exist without a handler (`RouteBuilder::handler` finishes it)
//! - Declaring a schema changes the builder's type parameter; each part can
//!   be declared once
//! - Descriptors are consumed by registration and never mutated afterwards

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use axum::routing::MethodFilter;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use utoipa::openapi::path::PathItemType;
use utoipa::ToSchema;

use crate::dispatch::middleware::apply_middlewares;
use crate::dispatch::pipeline::Pipeline;
use crate::dispatch::{Handler, HandlerOutput, Middleware, RouteContext};
use crate::routing::registry::RouteEntry;
use crate::schema::{Component, Schema, SchemaDoc, SchemaError, SchemaRef, Typed};

const JSON: &str = "application/json";
const FORM: &str = "application/x-www-form-urlencoded";

/// HTTP methods a route can be declared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

#[derive(Debug, Error)]
#[error("unknown HTTP method: {0}")]
pub struct UnknownMethod(pub String);

impl Method {
    pub const ALL: [Method; 7] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Patch,
        Method::Delete,
        Method::Head,
        Method::Options,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }

    /// Router-side method filter.
    pub fn filter(self) -> MethodFilter {
        match self {
            Method::Get => MethodFilter::GET,
            Method::Post => MethodFilter::POST,
            Method::Put => MethodFilter::PUT,
            Method::Patch => MethodFilter::PATCH,
            Method::Delete => MethodFilter::DELETE,
            Method::Head => MethodFilter::HEAD,
            Method::Options => MethodFilter::OPTIONS,
        }
    }

    /// Document-side operation key.
    pub fn path_item_type(self) -> PathItemType {
        match self {
            Method::Get => PathItemType::Get,
            Method::Post => PathItemType::Post,
            Method::Put => PathItemType::Put,
            Method::Patch => PathItemType::Patch,
            Method::Delete => PathItemType::Delete,
            Method::Head => PathItemType::Head,
            Method::Options => PathItemType::Options,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownMethod(s.to_string()))
    }
}

/// Declared request body: schema plus how it is documented.
pub struct BodySpec<B> {
    schema: SchemaRef<B>,
    content_type: String,
    description: Option<String>,
    example: Option<Value>,
    examples: BTreeMap<String, Value>,
}

impl<B: Send + 'static> BodySpec<B> {
    /// JSON body validated by `schema`.
    pub fn json<S>(schema: S) -> Self
    where
        S: Schema<Output = B>,
    {
        Self {
            schema: SchemaRef::new(schema),
            content_type: JSON.to_string(),
            description: None,
            example: None,
            examples: BTreeMap::new(),
        }
    }

    /// Urlencoded form body; fields are coerced like query pairs.
    pub fn form<S>(schema: S) -> Self
    where
        S: Schema<Output = B>,
    {
        Self::json(schema).content_type(FORM)
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn example(mut self, example: impl Serialize) -> Self {
        self.example = to_example(example);
        self
    }

    pub fn named_example(mut self, name: impl Into<String>, example: impl Serialize) -> Self {
        if let Some(value) = to_example(example) {
            self.examples.insert(name.into(), value);
        }
        self
    }

    fn is_form(&self) -> bool {
        self.content_type.starts_with(FORM)
    }

    /// Parse raw body bytes according to the declared content type.
    pub(crate) fn parse(&self, bytes: &[u8]) -> Result<B, SchemaError> {
        if self.is_form() {
            let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(bytes)?;
            return self.schema.parse_pairs(&pairs);
        }
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(bytes)?
        };
        self.schema.parse_json(&value)
    }

    fn doc(&self) -> BodyDoc {
        BodyDoc {
            content_type: self.content_type.clone(),
            description: self.description.clone(),
            schema: self.schema.doc(),
            example: self.example.clone(),
            examples: self.examples.clone(),
        }
    }
}

fn to_example(example: impl Serialize) -> Option<Value> {
    match serde_json::to_value(example) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(error = %e, "example is not serializable, dropped");
            None
        }
    }
}

/// Which request parts are validated, and against what.
pub struct ValidateRequest<B, P, Q> {
    pub(crate) body: Option<BodySpec<B>>,
    pub(crate) params: Option<SchemaRef<P>>,
    pub(crate) query: Option<SchemaRef<Q>>,
}

impl<B, P, Q> ValidateRequest<B, P, Q> {
    fn none() -> Self {
        Self {
            body: None,
            params: None,
            query: None,
        }
    }
}

/// Documentation for one response status.
#[derive(Clone)]
pub struct ResponseSpec {
    pub(crate) description: String,
    pub(crate) content_type: String,
    pub(crate) schema: Option<Arc<dyn SchemaDoc>>,
    pub(crate) components: Vec<Component>,
    pub(crate) example: Option<Value>,
    pub(crate) examples: BTreeMap<String, Value>,
}

impl ResponseSpec {
    /// JSON response shaped like `T`.
    pub fn json<T>(description: impl Into<String>) -> Self
    where
        T: for<'s> ToSchema<'s> + 'static,
    {
        Self::with_schema(description, Typed::<T>::new())
    }

    /// JSON response described by any schema.
    pub fn with_schema(description: impl Into<String>, schema: impl SchemaDoc) -> Self {
        Self {
            description: description.into(),
            content_type: JSON.to_string(),
            schema: Some(Arc::new(schema)),
            components: Vec::new(),
            example: None,
            examples: BTreeMap::new(),
        }
    }

    /// Response without a body.
    pub fn empty(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            content_type: JSON.to_string(),
            schema: None,
            components: Vec::new(),
            example: None,
            examples: BTreeMap::new(),
        }
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Publish `C` so `$ref`s in a hand-built schema resolve.
    pub fn component<C>(mut self) -> Self
    where
        C: for<'s> ToSchema<'s>,
    {
        let (name, schema) = C::schema();
        self.components.push((name.to_string(), schema));
        self
    }

    pub fn example(mut self, example: impl Serialize) -> Self {
        self.example = to_example(example);
        self
    }

    pub fn named_example(mut self, name: impl Into<String>, example: impl Serialize) -> Self {
        if let Some(value) = to_example(example) {
            self.examples.insert(name.into(), value);
        }
        self
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn example_value(&self) -> Option<&Value> {
        self.example.as_ref()
    }
}

impl fmt::Debug for ResponseSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseSpec")
            .field("description", &self.description)
            .field("content_type", &self.content_type)
            .field("has_schema", &self.schema.is_some())
            .field("example", &self.example)
            .finish()
    }
}

/// Type-erased request body documentation.
#[derive(Clone)]
pub struct BodyDoc {
    pub content_type: String,
    pub description: Option<String>,
    pub schema: Arc<dyn SchemaDoc>,
    pub example: Option<Value>,
    pub examples: BTreeMap<String, Value>,
}

/// Everything the document needs to know about a registered route.
#[derive(Clone)]
pub struct RouteDoc {
    pub method: Method,
    pub path: String,
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub request_body: Option<BodyDoc>,
    pub params: Option<Arc<dyn SchemaDoc>>,
    pub query: Option<Arc<dyn SchemaDoc>>,
    pub responses: BTreeMap<u16, ResponseSpec>,
}

impl RouteDoc {
    /// Every named schema referenced by this route.
    pub fn components(&self) -> Vec<Component> {
        let mut out = Vec::new();
        if let Some(body) = &self.request_body {
            out.extend(body.schema.components());
        }
        for schema in self.params.iter().chain(self.query.iter()) {
            out.extend(schema.components());
        }
        for response in self.responses.values() {
            if let Some(schema) = &response.schema {
                out.extend(schema.components());
            }
            out.extend(response.components.iter().cloned());
        }
        out
    }
}

impl fmt::Debug for RouteDoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDoc")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("operation_id", &self.operation_id)
            .field("summary", &self.summary)
            .field("tags", &self.tags)
            .field("responses", &self.responses.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
struct RouteMeta {
    operation_id: Option<String>,
    summary: Option<String>,
    tags: Vec<String>,
}

/// A fully declared endpoint, ready to register.
pub struct RouteDescriptor<B = (), P = (), Q = ()> {
    method: Method,
    path: String,
    validate: ValidateRequest<B, P, Q>,
    responses: BTreeMap<u16, ResponseSpec>,
    handler: Arc<dyn Handler<B, P, Q>>,
    meta: RouteMeta,
    middlewares: Vec<Middleware>,
}

impl<B, P, Q> RouteDescriptor<B, P, Q>
where
    B: Send + 'static,
    P: Send + 'static,
    Q: Send + 'static,
{
    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Split into the erased documentation view and the dispatch binding.
    pub(crate) fn into_entry(self) -> RouteEntry {
        let doc = RouteDoc {
            method: self.method,
            path: self.path,
            operation_id: self.meta.operation_id,
            summary: self.meta.summary,
            tags: self.meta.tags,
            request_body: self.validate.body.as_ref().map(BodySpec::doc),
            params: self.validate.params.as_ref().map(SchemaRef::doc),
            query: self.validate.query.as_ref().map(SchemaRef::doc),
            responses: self.responses,
        };
        let binding = Pipeline::new(self.validate, self.handler).into_binding(self.method);
        RouteEntry::new(doc, apply_middlewares(binding, &self.middlewares))
    }
}

impl<B, P, Q> fmt::Debug for RouteDescriptor<B, P, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDescriptor")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("meta", &self.meta)
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}

/// Entry point for declaring routes: `Route::get("/pets").handler(...)`.
pub struct Route;

impl Route {
    pub fn new(method: Method, path: impl Into<String>) -> RouteBuilder {
        RouteBuilder {
            method,
            path: path.into(),
            validate: ValidateRequest::none(),
            responses: BTreeMap::new(),
            meta: RouteMeta::default(),
            middlewares: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> RouteBuilder {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> RouteBuilder {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> RouteBuilder {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> RouteBuilder {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> RouteBuilder {
        Self::new(Method::Delete, path)
    }

    pub fn head(path: impl Into<String>) -> RouteBuilder {
        Self::new(Method::Head, path)
    }

    pub fn options(path: impl Into<String>) -> RouteBuilder {
        Self::new(Method::Options, path)
    }
}

/// Builder for a [`RouteDescriptor`]; `B`, `P`, `Q` track the declared schemas.
pub struct RouteBuilder<B = (), P = (), Q = ()> {
    method: Method,
    path: String,
    validate: ValidateRequest<B, P, Q>,
    responses: BTreeMap<u16, ResponseSpec>,
    meta: RouteMeta,
    middlewares: Vec<Middleware>,
}

impl<P, Q> RouteBuilder<(), P, Q> {
    /// Validate the body as JSON against `schema`.
    pub fn body<S>(self, schema: S) -> RouteBuilder<S::Output, P, Q>
    where
        S: Schema,
    {
        self.body_spec(BodySpec::json(schema))
    }

    /// Validate the body with a fully described [`BodySpec`].
    pub fn body_spec<B: Send + 'static>(self, spec: BodySpec<B>) -> RouteBuilder<B, P, Q> {
        RouteBuilder {
            method: self.method,
            path: self.path,
            validate: ValidateRequest {
                body: Some(spec),
                params: self.validate.params,
                query: self.validate.query,
            },
            responses: self.responses,
            meta: self.meta,
            middlewares: self.middlewares,
        }
    }
}

impl<B, Q> RouteBuilder<B, (), Q> {
    /// Validate path params against `schema`.
    pub fn params<S>(self, schema: S) -> RouteBuilder<B, S::Output, Q>
    where
        S: Schema,
    {
        RouteBuilder {
            method: self.method,
            path: self.path,
            validate: ValidateRequest {
                body: self.validate.body,
                params: Some(SchemaRef::new(schema)),
                query: self.validate.query,
            },
            responses: self.responses,
            meta: self.meta,
            middlewares: self.middlewares,
        }
    }
}

impl<B, P> RouteBuilder<B, P, ()> {
    /// Validate the query string against `schema`.
    pub fn query<S>(self, schema: S) -> RouteBuilder<B, P, S::Output>
    where
        S: Schema,
    {
        RouteBuilder {
            method: self.method,
            path: self.path,
            validate: ValidateRequest {
                body: self.validate.body,
                params: self.validate.params,
                query: Some(SchemaRef::new(schema)),
            },
            responses: self.responses,
            meta: self.meta,
            middlewares: self.middlewares,
        }
    }
}

impl<B, P, Q> RouteBuilder<B, P, Q> {
    pub fn response(mut self, status: u16, response: ResponseSpec) -> Self {
        self.responses.insert(status, response);
        self
    }

    pub fn operation_id(mut self, id: impl Into<String>) -> Self {
        self.meta.operation_id = Some(id.into());
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.meta.summary = Some(summary.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.meta.tags.push(tag.into());
        self
    }

    pub fn tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.meta.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Run `middleware` before validation; declaration order is run order.
    pub fn middleware(mut self, middleware: Middleware) -> Self {
        self.middlewares.push(middleware);
        self
    }
}

impl<B, P, Q> RouteBuilder<B, P, Q>
where
    B: Send + 'static,
    P: Send + 'static,
    Q: Send + 'static,
{
    /// Finish the route with its handler.
    pub fn handler<F, Fut, R>(self, handler: F) -> RouteDescriptor<B, P, Q>
    where
        F: Fn(RouteContext<B, P, Q>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: HandlerOutput,
    {
        self.handler_arc(Arc::new(handler))
    }

    /// Finish the route with an already shared handler.
    pub fn handler_arc(self, handler: Arc<dyn Handler<B, P, Q>>) -> RouteDescriptor<B, P, Q> {
        RouteDescriptor {
            method: self.method,
            path: self.path,
            validate: self.validate,
            responses: self.responses,
            handler,
            meta: self.meta,
            middlewares: self.middlewares,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, Serialize, ToSchema)]
    struct Pet {
        name: String,
        age: u8,
    }

    #[derive(Debug, Deserialize, ToSchema)]
    struct PetId {
        id: u64,
    }

    #[test]
    fn test_method_parse_case_insensitive() {
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("Options".parse::<Method>().unwrap(), Method::Options);
        assert!("TRACE".parse::<Method>().is_err());
        assert_eq!(Method::Patch.to_string(), "PATCH");
    }

    #[test]
    fn test_builder_types_follow_schemas() {
        let route: RouteDescriptor<Pet, PetId, ()> = Route::put("/pets/{id}")
            .params(Typed::<PetId>::new())
            .body(Typed::<Pet>::new())
            .operation_id("updatePet")
            .tags(["pets", "write"])
            .handler(|ctx: RouteContext<Pet, PetId, ()>| async move {
                let id = ctx.req.params.map(|p| p.id).unwrap_or_default();
                format!("{id}")
            });
        assert_eq!(route.method(), Method::Put);
        assert_eq!(route.path(), "/pets/{id}");
        assert_eq!(route.meta.tags, vec!["pets", "write"]);
    }

    #[test]
    fn test_body_spec_parses_by_content_type() {
        let json_body = BodySpec::json(Typed::<Pet>::new());
        assert!(json_body.parse(br#"{"name":"Rex","age":2}"#).is_ok());
        assert!(json_body.parse(b"").is_err());
        assert!(json_body.parse(b"{not json").is_err());

        let form_body = BodySpec::form(Typed::<Pet>::new());
        let pet = form_body.parse(b"name=Rex&age=4").unwrap();
        assert_eq!(pet.age, 4);
    }

    #[test]
    fn test_doc_collects_examples_and_components() {
        let route = Route::post("/pets")
            .body_spec(
                BodySpec::json(Typed::<Pet>::new().component::<PetId>())
                    .description("new pet")
                    .example(json!({"name": "Rex", "age": 1})),
            )
            .response(
                201,
                ResponseSpec::json::<Pet>("created")
                    .named_example("rex", json!({"name": "Rex", "age": 1})),
            )
            .handler(|_ctx| async {});
        let entry = route.into_entry();
        let doc = entry.doc();

        let body = doc.request_body.as_ref().unwrap();
        assert_eq!(body.content_type, "application/json");
        assert_eq!(body.example, Some(json!({"name": "Rex", "age": 1})));
        assert_eq!(doc.responses[&201].examples.len(), 1);
        assert_eq!(doc.components().len(), 1);
        assert_eq!(doc.components()[0].0, "PetId");
    }
}
