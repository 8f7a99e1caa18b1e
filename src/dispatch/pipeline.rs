//! Validation dispatch: the per-request path from raw request to handler.
//!
//! # Responsibilities
//! - Collect path params, query pairs and the body from the request
//! - Validate body, then params, then query; stop at the first failure
//! - Invoke the handler with the parsed values and build the response
//!
//! # Design Decisions
//! - Validation failure is a fixed 422 `Invalid request!`; no detail is returned
//! - Handler errors and panics become marked 500s for the error handler
//! - The body limit comes from the router's `DefaultBodyLimit`

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, MatchedPath, RawPathParams, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{on, MethodRouter};
use futures_util::FutureExt;

use super::context::{RawRequest, ResponseWriter, RouteContext, ValidatedRequest};
use super::handler::{Handler, HandlerError};
use super::middleware::HandlerFailure;
use crate::observability::metrics;
use crate::routing::descriptor::{Method, ValidateRequest};

/// Body of the response sent for any validation failure.
pub const INVALID_REQUEST: &str = "Invalid request!";

/// Request part that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part {
    Body,
    Params,
    Query,
}

impl Part {
    pub fn as_str(&self) -> &'static str {
        match self {
            Part::Body => "body",
            Part::Params => "params",
            Part::Query => "query",
        }
    }
}

pub(crate) struct Pipeline<B, P, Q> {
    validate: ValidateRequest<B, P, Q>,
    handler: Arc<dyn Handler<B, P, Q>>,
}

impl<B, P, Q> Pipeline<B, P, Q>
where
    B: Send + 'static,
    P: Send + 'static,
    Q: Send + 'static,
{
    pub(crate) fn new(
        validate: ValidateRequest<B, P, Q>,
        handler: Arc<dyn Handler<B, P, Q>>,
    ) -> Self {
        Self { validate, handler }
    }

    /// Bind this pipeline to `method` as an axum method router.
    pub(crate) fn into_binding(self, method: Method) -> MethodRouter {
        let pipeline = Arc::new(self);
        on(method.filter(), move |req: Request| {
            let pipeline = Arc::clone(&pipeline);
            async move { pipeline.run(req).await }
        })
    }

    async fn run(&self, req: Request) -> Response {
        let started = Instant::now();
        let (mut parts, body) = req.into_parts();
        let method = parts.method.clone();
        let route = parts
            .extensions
            .get::<MatchedPath>()
            .map(|p| p.as_str().to_owned())
            .unwrap_or_else(|| parts.uri.path().to_owned());

        let params = match RawPathParams::from_request_parts(&mut parts, &()).await {
            Ok(raw) => raw
                .iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect(),
            Err(_) => Vec::new(),
        };
        let query = parts
            .uri
            .query()
            .and_then(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).ok())
            .unwrap_or_default();
        let uri = parts.uri.clone();
        let headers = parts.headers.clone();

        let body = match Bytes::from_request(Request::from_parts(parts, body), &()).await {
            Ok(bytes) => bytes,
            Err(rejection) => return rejection.into_response(),
        };

        let raw = RawRequest {
            method: method.clone(),
            uri,
            headers,
            body,
            params,
            query,
        };

        let validated = match validate(&self.validate, raw) {
            Ok(validated) => validated,
            Err(part) => {
                metrics::record_validation_failure(part.as_str());
                metrics::record_request(
                    method.as_str(),
                    &route,
                    StatusCode::UNPROCESSABLE_ENTITY,
                    started,
                );
                return invalid_request();
            }
        };

        let writer = ResponseWriter::new();
        let ctx = RouteContext {
            req: validated,
            res: writer.clone(),
        };
        let outcome = AssertUnwindSafe(async { self.handler.call(ctx).await })
            .catch_unwind()
            .await;

        let response = match outcome {
            Ok(Ok(returned)) => {
                if let Some(payload) = returned.filter(|p| !p.is_empty()) {
                    writer.send(payload);
                }
                writer.into_response()
            }
            Ok(Err(err)) => HandlerFailure(Arc::new(err)).into_response(),
            Err(panic) => HandlerFailure(Arc::new(HandlerError::panic(panic))).into_response(),
        };
        metrics::record_request(method.as_str(), &route, response.status(), started);
        response
    }
}

/// Body, then params, then query. The first failing part short-circuits.
fn validate<B, P, Q>(
    spec: &ValidateRequest<B, P, Q>,
    raw: RawRequest,
) -> Result<ValidatedRequest<B, P, Q>, Part>
where
    B: Send + 'static,
    P: Send + 'static,
    Q: Send + 'static,
{
    let body = match &spec.body {
        Some(body) => Some(body.parse(&raw.body).map_err(|_| Part::Body)?),
        None => None,
    };
    let params = match &spec.params {
        Some(schema) => Some(schema.parse_pairs(&raw.params).map_err(|_| Part::Params)?),
        None => None,
    };
    let query = match &spec.query {
        Some(schema) => Some(schema.parse_pairs(&raw.query).map_err(|_| Part::Query)?),
        None => None,
    };
    Ok(ValidatedRequest {
        body,
        params,
        query,
        raw,
    })
}

/// The fixed validation failure response.
pub fn invalid_request() -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, INVALID_REQUEST).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaRef, Typed};
    use crate::routing::descriptor::BodySpec;
    use axum::http::{HeaderMap, Uri};
    use serde::Deserialize;
    use utoipa::ToSchema;

    #[derive(Debug, Deserialize, ToSchema)]
    struct Body {
        name: String,
    }

    #[derive(Debug, Deserialize, ToSchema)]
    struct Page {
        n: u32,
    }

    fn raw(body: &'static [u8], query: &[(&str, &str)]) -> RawRequest {
        RawRequest {
            method: axum::http::Method::POST,
            uri: Uri::from_static("/"),
            headers: HeaderMap::new(),
            body: Bytes::from_static(body),
            params: Vec::new(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn spec() -> ValidateRequest<Body, Page, Page> {
        ValidateRequest {
            body: Some(BodySpec::json(Typed::<Body>::new())),
            params: Some(SchemaRef::new(Typed::<Page>::new())),
            query: Some(SchemaRef::new(Typed::<Page>::new())),
        }
    }

    #[test]
    fn test_body_checked_first() {
        let err = validate(&spec(), raw(b"nope", &[("n", "x")])).unwrap_err();
        assert_eq!(err, Part::Body);
    }

    #[test]
    fn test_params_before_query() {
        let err = validate(&spec(), raw(br#"{"name":"a"}"#, &[("n", "x")])).unwrap_err();
        assert_eq!(err, Part::Params);
    }

    #[test]
    fn test_undeclared_parts_stay_raw() {
        let spec: ValidateRequest<(), (), Page> = ValidateRequest {
            body: None,
            params: None,
            query: Some(SchemaRef::new(Typed::<Page>::new())),
        };
        let validated = validate(&spec, raw(b"free text", &[("n", "5")])).unwrap();
        assert!(validated.body.is_none());
        assert_eq!(validated.query.unwrap().n, 5);
        assert_eq!(&validated.raw.body[..], b"free text");
    }
}
