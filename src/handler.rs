use crate::{
    args::{FromArgs, IntoArgs},
    net::{Request, Response},
    types::{Encode, Type, Typed, Value},
};
use futures::future::{BoxFuture, FutureExt};
use std::{
    any::Any,
    collections::{BTreeMap, HashMap},
    fmt,
    future::Future,
    marker::PhantomData,
    panic::AssertUnwindSafe,
};

/// The argument types and return type of a bound function.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub domain: Vec<Type>,
    pub range: Type,
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("(")?;
        for (i, typ) in self.domain.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{typ}")?;
        }
        write!(f, ") -> {}", self.range)
    }
}

/// What a business function hands back: either a plain encodable value or a
/// `Result` whose error is reported to the caller as text.
pub trait Outcome: Send + 'static {
    type Ok: Encode;

    fn into_result(self) -> Result<Self::Ok, String>;
}

impl<T, E> Outcome for Result<T, E>
where
    T: Encode + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    type Ok = T;

    fn into_result(self) -> Result<T, String> {
        self.map_err(|e| e.to_string())
    }
}

macro_rules! impl_outcome {
    ($($rust_type:ty),*) => {$(
        impl Outcome for $rust_type {
            type Ok = $rust_type;

            fn into_result(self) -> Result<Self, String> {
                Ok(self)
            }
        }
    )*};
}

impl_outcome!((), bool, String, Value, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl<T: Encode + Send + 'static> Outcome for Option<T> {
    type Ok = Self;

    fn into_result(self) -> Result<Self, String> {
        Ok(self)
    }
}

impl<T: Encode + Send + 'static> Outcome for Vec<T> {
    type Ok = Self;

    fn into_result(self) -> Result<Self, String> {
        Ok(self)
    }
}

impl<T: Encode + Send + 'static> Outcome for BTreeMap<String, T> {
    type Ok = Self;

    fn into_result(self) -> Result<Self, String> {
        Ok(self)
    }
}

impl<T: Encode + Send + 'static> Outcome for HashMap<String, T> {
    type Ok = Self;

    fn into_result(self) -> Result<Self, String> {
        Ok(self)
    }
}

/// A business function with a fixed argument list `Domain`.
///
/// Implemented for every `Fn(T1, .., Tn) -> impl Future` whose arguments are
/// decodable and whose output is an [`Outcome`], for up to eight arguments.
pub trait RpcFunction<Domain>: Send + Sync + 'static {
    type Output: Outcome;

    fn call(&self, args: Domain) -> BoxFuture<'static, Self::Output>;
}

impl<F, Fut, O> RpcFunction<()> for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = O> + Send + 'static,
    O: Outcome,
{
    type Output = O;

    fn call(&self, _args: ()) -> BoxFuture<'static, O> {
        Box::pin(self())
    }
}

macro_rules! impl_rpc_function {
    ($($ty:ident $var:ident),+) => {
        impl<F, Fut, O, $($ty),+> RpcFunction<($($ty,)+)> for F
        where
            F: Fn($($ty),+) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = O> + Send + 'static,
            O: Outcome,
        {
            type Output = O;

            fn call(&self, ($($var,)+): ($($ty,)+)) -> BoxFuture<'static, O> {
                Box::pin(self($($var),+))
            }
        }
    };
}

impl_rpc_function!(T1 a1);
impl_rpc_function!(T1 a1, T2 a2);
impl_rpc_function!(T1 a1, T2 a2, T3 a3);
impl_rpc_function!(T1 a1, T2 a2, T3 a3, T4 a4);
impl_rpc_function!(T1 a1, T2 a2, T3 a3, T4 a4, T5 a5);
impl_rpc_function!(T1 a1, T2 a2, T3 a3, T4 a4, T5 a5, T6 a6);
impl_rpc_function!(T1 a1, T2 a2, T3 a3, T4 a4, T5 a5, T6 a6, T7 a7);
impl_rpc_function!(T1 a1, T2 a2, T3 a3, T4 a4, T5 a5, T6 a6, T7 a7, T8 a8);

/// A type-erased bound function, as stored in a dispatch table.
pub trait Handler: Send + Sync {
    fn signature(&self) -> &Signature;

    /// Never fails: every problem is materialised as an error [`Response`].
    fn handle(&self, request: Request) -> BoxFuture<'_, Response>;
}

pub struct TypedHandler<RFn, Domain> {
    rpc_function: RFn,
    signature: Signature,
    _domain: PhantomData<fn(Domain)>,
}

impl<RFn, Domain> TypedHandler<RFn, Domain>
where
    RFn: RpcFunction<Domain>,
    Domain: IntoArgs + FromArgs + Send + 'static,
{
    pub fn new(rpc_function: RFn) -> Self {
        let signature = Signature {
            domain: Domain::types(),
            range: <<RFn::Output as Outcome>::Ok as Typed>::rpc_type(),
        };
        Self {
            rpc_function,
            signature,
            _domain: PhantomData,
        }
    }

    pub async fn handle(&self, request: Request) -> Response {
        let Request { function, params } = request;
        let args = match Domain::decode_args(params) {
            Ok(args) => args,
            Err(e) => return Response::error(format!("invalid arguments for `{function}`: {e}")),
        };

        let call = AssertUnwindSafe(async { self.rpc_function.call(args).await }).catch_unwind();
        match call.await {
            Ok(outcome) => match outcome.into_result() {
                Ok(retval) => Response::ok(Encode::encode(retval)),
                Err(e) => Response::error(format!("`{function}` failed: {e}")),
            },
            Err(panic) => Response::error(format!(
                "`{function}` panicked: {}",
                panic_message(&*panic)
            )),
        }
    }
}

impl<RFn, Domain> Handler for TypedHandler<RFn, Domain>
where
    RFn: RpcFunction<Domain>,
    Domain: IntoArgs + FromArgs + Send + 'static,
{
    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn handle(&self, request: Request) -> BoxFuture<'_, Response> {
        Box::pin(self.handle(request))
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::Status;

    fn add_handler() -> TypedHandler<impl RpcFunction<(i64, i64)>, (i64, i64)> {
        TypedHandler::new(|a: i64, b: i64| async move { a + b })
    }

    #[tokio::test]
    async fn adds_two_numbers() {
        let response = add_handler()
            .handle(Request::new("add", (2i64, 3i64).encode_args()))
            .await;
        assert_eq!(response, Response::ok(Value::from(5i64)));
    }

    #[tokio::test]
    async fn bad_arguments_become_an_error_response() {
        let response = add_handler()
            .handle(Request::new("add", ("x", 3i64).encode_args()))
            .await;
        assert_eq!(response.status, Status::Error);
        let Value::String(diagnostic) = response.payload else {
            panic!("diagnostic should be text");
        };
        assert!(diagnostic.contains("argument 0"), "{diagnostic}");
    }

    #[tokio::test]
    async fn missing_arguments_become_an_error_response() {
        let response = add_handler()
            .handle(Request::new("add", (2i64,).encode_args()))
            .await;
        assert_eq!(response.status, Status::Error);
    }

    #[tokio::test]
    async fn failed_outcome_becomes_an_error_response() {
        let handler = TypedHandler::new(|a: i64, b: i64| async move {
            a.checked_div(b).ok_or("division by zero")
        });
        let response = handler
            .handle(Request::new("div", (1i64, 0i64).encode_args()))
            .await;
        assert_eq!(response, Response::error("`div` failed: division by zero"));

        let response = handler
            .handle(Request::new("div", (9i64, 3i64).encode_args()))
            .await;
        assert_eq!(response, Response::ok(Value::from(3i64)));
    }

    #[tokio::test]
    async fn panics_do_not_escape() {
        let handler = TypedHandler::new(|items: Vec<u8>| async move { items[10] });
        let response = handler
            .handle(Request::new("index", (vec![1u8],).encode_args()))
            .await;
        assert_eq!(response.status, Status::Error);
        let Value::String(diagnostic) = response.payload else {
            panic!("diagnostic should be text");
        };
        assert!(diagnostic.starts_with("`index` panicked"), "{diagnostic}");
    }

    #[tokio::test]
    async fn handler_is_reusable() {
        let handler = add_handler();
        for n in 0..4i64 {
            let response = handler
                .handle(Request::new("add", (n, n).encode_args()))
                .await;
            assert_eq!(response, Response::ok(Value::from(2 * n)));
        }
    }

    #[test]
    fn signature_is_captured() {
        let handler = TypedHandler::new(|_: String, _: Option<u32>| async { vec![true] });
        assert_eq!(handler.signature.to_string(), "(String, Optional<UInt>) -> Array<Bool>");
        let ping = TypedHandler::new(|| async { true });
        assert_eq!(ping.signature.to_string(), "() -> Bool");
    }
}
