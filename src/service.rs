use crate::{
    args::{FromArgs, IntoArgs},
    config::ServiceEntry,
    dispatcher::{Dispatcher, RegisterError},
    handler::{RpcFunction, Signature},
    net::{server, Request, Response, Status},
    reference::RemoteFunctionRef,
};
use std::io;
use tokio::net::TcpListener;
use tracing::debug;

/// Name of the liveness function every service answers.
pub const PING: &str = "ping";

/// A service context: identity, port and dispatch table.
///
/// Built once at process start, populated with [`Service::register`], then
/// handed to the dispatch loop with [`Service::serve`].
pub struct Service {
    entry: ServiceEntry,
    dispatcher: Dispatcher,
}

impl Service {
    pub fn new(entry: ServiceEntry) -> Self {
        let mut dispatcher = Dispatcher::default();
        dispatcher.bind(PING, || async { true });
        Self { entry, dispatcher }
    }

    pub fn entry(&self) -> &ServiceEntry {
        &self.entry
    }

    pub fn name(&self) -> &str {
        &self.entry.name
    }

    pub fn port(&self) -> u16 {
        self.entry.port
    }

    /// Binds `rpc_function` under `name`.
    ///
    /// `ping` is reserved and an existing binding is never overwritten.
    pub fn register<RFn, Domain>(
        &mut self,
        name: &str,
        rpc_function: RFn,
    ) -> Result<&mut Self, RegisterError>
    where
        RFn: RpcFunction<Domain>,
        Domain: IntoArgs + FromArgs + Send + 'static,
    {
        if name == PING {
            return Err(RegisterError::Reserved(name.to_owned()));
        }
        self.dispatcher.add(name, rpc_function)?;
        Ok(self)
    }

    /// Lists every bound function, `ping` included, ordered by name.
    pub fn functions(&self) -> Vec<(String, Signature)> {
        self.dispatcher.rpc_functions()
    }

    /// A reference to one of this service's own functions, for handing out as
    /// a callback. `None` if nothing is registered under `func_name`.
    pub fn reference(&self, func_name: &str) -> Option<RemoteFunctionRef> {
        self.dispatcher
            .contains(func_name)
            .then(|| self.entry().reference(func_name))
    }

    pub async fn dispatch(&self, request: Request) -> Response {
        let function = request.function.clone();
        let response = self.dispatcher.call(request).await;
        if response.status == Status::Error {
            debug!(service = self.name(), %function, payload = ?response.payload, "call failed");
        }
        response
    }

    /// Serves on `0.0.0.0` at the entry's port until the listener fails.
    pub async fn serve(self) -> io::Result<()> {
        let port = self.port();
        server::serve_tcp(self, port).await
    }

    /// Serves on a listener bound by the caller.
    pub async fn serve_on(self, listener: TcpListener) -> io::Result<()> {
        server::serve(listener, self).await
    }
}
