use crate::{
    args::IntoArgs,
    handler::Outcome,
    net::Transport,
    stub::{CallError, CallStub},
    types::{Decode, Encode, Type, TypeMismatch, Typed, Value},
    LOCAL_HOST,
};
use std::{collections::BTreeMap, net::SocketAddr};

/// Names a function on a service so it can be passed around as a value and
/// invoked later, typically as a callback into the service that created it.
///
/// This is data, not a connection: invoking a reference to a service that is
/// down fails like any other call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteFunctionRef {
    pub port: u16,
    pub service_name: String,
    pub func_name: String,
}

impl RemoteFunctionRef {
    pub fn new(port: u16, service_name: impl Into<String>, func_name: impl Into<String>) -> Self {
        Self {
            port,
            service_name: service_name.into(),
            func_name: func_name.into(),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from((LOCAL_HOST, self.port))
    }

    pub async fn invoke<T, A, R>(&self, stub: &CallStub<T>, args: A) -> Result<R, CallError>
    where
        T: Transport,
        A: IntoArgs,
        R: Decode,
    {
        stub.call(self.addr(), &self.func_name, args).await
    }
}

impl Typed for RemoteFunctionRef {
    fn rpc_type() -> Type {
        Type::Record("RemoteFunctionRef")
    }
}

impl Encode for RemoteFunctionRef {
    fn encode(val: Self) -> Value {
        let mut fields = BTreeMap::new();
        fields.insert("port".to_owned(), Value::from(val.port));
        fields.insert("service_name".to_owned(), Value::String(val.service_name));
        fields.insert("func_name".to_owned(), Value::String(val.func_name));
        Value::Map(fields)
    }
}

impl Decode for RemoteFunctionRef {
    fn decode(val: Value) -> Result<Self, TypeMismatch> {
        let fields = match val {
            Value::Map(fields) => fields,
            val => return Err(TypeMismatch::new(val, Self::rpc_type())),
        };
        let port = match fields.get("port") {
            Some(Value::Number(n)) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
            _ => None,
        };
        let text = |key: &str| match fields.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        };
        match (port, text("service_name"), text("func_name")) {
            (Some(port), Some(service_name), Some(func_name)) => Ok(Self {
                port,
                service_name,
                func_name,
            }),
            _ => Err(TypeMismatch::new(Value::Map(fields), Self::rpc_type())),
        }
    }
}

impl From<RemoteFunctionRef> for Value {
    fn from(reference: RemoteFunctionRef) -> Self {
        Encode::encode(reference)
    }
}

impl Outcome for RemoteFunctionRef {
    type Ok = Self;

    fn into_result(self) -> Result<Self, String> {
        Ok(self)
    }
}
