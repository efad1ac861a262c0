pub mod client;
pub mod server;

#[cfg(test)]
pub(crate) mod mock;

use crate::types::Value;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::{io, net::SocketAddr};
use thiserror::Error;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Request {
    pub function: String,
    pub params: Value,
}

impl Request {
    pub fn new(function: impl Into<String>, params: Value) -> Self {
        Self {
            function: function.into(),
            params,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Error,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Response {
    pub status: Status,
    pub payload: Value,
}

impl Response {
    pub fn ok(payload: Value) -> Self {
        Self {
            status: Status::Ok,
            payload,
        }
    }

    /// An error response whose payload is the diagnostic text.
    pub fn error(diagnostic: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            payload: Value::String(diagnostic.into()),
        }
    }
}

/// Sends one request and waits for its response.
///
/// Implementations own their connection semantics; failures are reported as
/// [`TransportError`] and never reinterpreted by callers.
pub trait Transport: Send + Sync {
    fn send(&self, addr: SocketAddr, request: Request)
        -> BoxFuture<'_, Result<Response, TransportError>>;
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("codec: {0}")]
    Codec(String),

    #[error("connection closed before a response arrived")]
    Closed,

    #[error("no response within {0:?}")]
    Timeout(std::time::Duration),
}
