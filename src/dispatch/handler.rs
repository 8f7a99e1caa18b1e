//! Route handler abstraction.

use std::error::Error as StdError;
use std::fmt;
use std::future::Future;

use axum::body::Bytes;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::Serialize;
use serde_json::Value;

use super::context::{Payload, RouteContext};

/// Failure raised by a handler, or a panic caught around one.
pub struct HandlerError {
    source: Box<dyn StdError + Send + Sync>,
    panicked: bool,
}

impl HandlerError {
    pub fn msg(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self {
            source: message.into(),
            panicked: false,
        }
    }

    pub(crate) fn panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "handler panicked".to_string()
        };
        Self {
            source: message.into(),
            panicked: true,
        }
    }

    pub fn is_panic(&self) -> bool {
        self.panicked
    }

    pub fn source_ref(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.source.as_ref()
    }
}

impl<E> From<E> for HandlerError
where
    E: StdError + Send + Sync + 'static,
{
    fn from(err: E) -> Self {
        Self {
            source: Box::new(err),
            panicked: false,
        }
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.panicked {
            write!(f, "handler panicked: {}", self.source)
        } else {
            write!(f, "{}", self.source)
        }
    }
}

impl fmt::Debug for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerError")
            .field("source", &self.source)
            .field("panicked", &self.panicked)
            .finish()
    }
}

/// Values a handler may return. A non-empty payload is sent for the handler.
pub trait HandlerOutput: Send + 'static {
    fn into_payload(self) -> Result<Option<Payload>, HandlerError>;
}

impl HandlerOutput for () {
    fn into_payload(self) -> Result<Option<Payload>, HandlerError> {
        Ok(None)
    }
}

impl HandlerOutput for Payload {
    fn into_payload(self) -> Result<Option<Payload>, HandlerError> {
        Ok(Some(self))
    }
}

impl HandlerOutput for String {
    fn into_payload(self) -> Result<Option<Payload>, HandlerError> {
        Ok(Some(Payload::Text(self)))
    }
}

impl HandlerOutput for &'static str {
    fn into_payload(self) -> Result<Option<Payload>, HandlerError> {
        Ok(Some(Payload::from(self)))
    }
}

impl HandlerOutput for Value {
    fn into_payload(self) -> Result<Option<Payload>, HandlerError> {
        Ok(Some(Payload::Json(self)))
    }
}

impl HandlerOutput for Bytes {
    fn into_payload(self) -> Result<Option<Payload>, HandlerError> {
        Ok(Some(Payload::Bytes(self)))
    }
}

impl<T> HandlerOutput for axum::Json<T>
where
    T: Serialize + Send + 'static,
{
    fn into_payload(self) -> Result<Option<Payload>, HandlerError> {
        Ok(Some(Payload::Json(serde_json::to_value(self.0)?)))
    }
}

impl<T: HandlerOutput> HandlerOutput for Option<T> {
    fn into_payload(self) -> Result<Option<Payload>, HandlerError> {
        match self {
            Some(inner) => inner.into_payload(),
            None => Ok(None),
        }
    }
}

impl<T, E> HandlerOutput for Result<T, E>
where
    T: HandlerOutput,
    E: Into<HandlerError> + Send + 'static,
{
    fn into_payload(self) -> Result<Option<Payload>, HandlerError> {
        self.map_err(Into::into)?.into_payload()
    }
}

/// A route handler over validated body `B`, params `P` and query `Q`.
///
/// Implemented for every `async fn(RouteContext<B, P, Q>) -> impl HandlerOutput`.
pub trait Handler<B, P, Q>: Send + Sync + 'static {
    fn call(
        &self,
        ctx: RouteContext<B, P, Q>,
    ) -> BoxFuture<'static, Result<Option<Payload>, HandlerError>>;
}

impl<F, Fut, R, B, P, Q> Handler<B, P, Q> for F
where
    F: Fn(RouteContext<B, P, Q>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: HandlerOutput,
{
    fn call(
        &self,
        ctx: RouteContext<B, P, Q>,
    ) -> BoxFuture<'static, Result<Option<Payload>, HandlerError>> {
        (self)(ctx).map(HandlerOutput::into_payload).boxed()
    }
}
