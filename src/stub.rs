use crate::{
    args::IntoArgs,
    net::{client::TcpTransport, Request, Status, Transport, TransportError},
    types::{Decode, TypeMismatch, Value},
};
use std::net::SocketAddr;
use thiserror::Error;

/// Client side of a call: one request, one response, one typed result.
#[derive(Debug, Clone, Default)]
pub struct CallStub<T = TcpTransport> {
    transport: T,
}

impl CallStub<TcpTransport> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Transport> CallStub<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Calls `function` on the service at `addr` and decodes its result as `R`.
    ///
    /// Zero-argument functions take `()`.
    pub async fn call<A, R>(&self, addr: SocketAddr, function: &str, args: A) -> Result<R, CallError>
    where
        A: IntoArgs,
        R: Decode,
    {
        let request = Request::new(function, args.encode_args());
        let response = self.transport.send(addr, request).await?;
        match response.status {
            Status::Ok => R::decode(response.payload).map_err(|mismatch| CallError::RemoteCall {
                function: function.to_owned(),
                mismatch,
            }),
            Status::Error => Err(CallError::RemoteExecution(diagnostic(response.payload))),
        }
    }
}

fn diagnostic(payload: Value) -> String {
    match payload {
        Value::String(text) => text,
        other => format!("{other:?}"),
    }
}

#[derive(Debug, Error)]
pub enum CallError {
    /// The server ran the call and reported a failure.
    #[error("remote execution failed: {0}")]
    RemoteExecution(String),

    /// The server answered OK but the result does not fit the expected type.
    #[error("unexpected result from `{function}`: {mismatch}")]
    RemoteCall {
        function: String,
        mismatch: TypeMismatch,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),
}
