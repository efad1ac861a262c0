use crate::{
    args::{FromArgs, IntoArgs},
    handler::{Handler, RpcFunction, Signature, TypedHandler},
    net::{Request, Response},
};
use std::{
    collections::{btree_map::Entry, BTreeMap},
    sync::Arc,
};
use thiserror::Error;
use tracing::{debug, warn};

/// Maps function names to their bound [`Handler`]s.
///
/// Bindings are added once with [`Dispatcher::add`] and never replaced or
/// removed; requests are routed with [`Dispatcher::call`] by exact name.
#[derive(Default)]
pub(crate) struct Dispatcher {
    rpc_functions: BTreeMap<String, Arc<dyn Handler>>,
}

impl Dispatcher {
    pub(crate) fn add<RFn, Domain>(&mut self, name: &str, rpc_function: RFn) -> Result<(), RegisterError>
    where
        RFn: RpcFunction<Domain>,
        Domain: IntoArgs + FromArgs + Send + 'static,
    {
        match self.rpc_functions.entry(name.to_owned()) {
            Entry::Occupied(_) => Err(RegisterError::Duplicate(name.to_owned())),
            Entry::Vacant(slot) => {
                slot.insert(bound(name, rpc_function));
                Ok(())
            }
        }
    }

    /// Binds without checking for an existing entry.
    pub(crate) fn bind<RFn, Domain>(&mut self, name: &str, rpc_function: RFn)
    where
        RFn: RpcFunction<Domain>,
        Domain: IntoArgs + FromArgs + Send + 'static,
    {
        self.rpc_functions
            .insert(name.to_owned(), bound(name, rpc_function));
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.rpc_functions.contains_key(name)
    }

    pub(crate) async fn call(&self, request: Request) -> Response {
        let Some(handler) = self.rpc_functions.get(&request.function) else {
            warn!(function = %request.function, "no such function");
            return Response::error(format!("no function named `{}`", request.function));
        };
        handler.handle(request).await
    }

    pub(crate) fn rpc_functions(&self) -> Vec<(String, Signature)> {
        self.rpc_functions
            .iter()
            .map(|(name, handler)| (name.clone(), handler.signature().clone()))
            .collect()
    }
}

fn bound<RFn, Domain>(name: &str, rpc_function: RFn) -> Arc<dyn Handler>
where
    RFn: RpcFunction<Domain>,
    Domain: IntoArgs + FromArgs + Send + 'static,
{
    let handler = TypedHandler::new(rpc_function);
    debug!(function = name, signature = %handler.signature(), "registered");
    Arc::new(handler)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("`{0}` is reserved for the liveness check")]
    Reserved(String),

    #[error("a function named `{0}` is already registered")]
    Duplicate(String),
}
