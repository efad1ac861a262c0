//! Conversion between ordered typed argument lists and the [`Value::Array`]
//! carried in a request's parameters.
//!
//! Argument lists are Rust tuples: `()`, `(T1,)`, `(T1, T2)` and so on up to
//! eight elements. Position is significant: element `i` of the array is the
//! `i`-th argument.

use crate::types::{Decode, Encode, Type, TypeMismatch, Value};
use thiserror::Error;

/// An argument list that can be sent as request parameters.
pub trait IntoArgs {
    /// The ordered type descriptors of the arguments.
    fn types() -> Vec<Type>;

    fn encode_args(self) -> Value;
}

/// An argument list that can be recovered from request parameters.
///
/// Decoding is all-or-nothing: either every element converts or the whole
/// list is rejected.
pub trait FromArgs: Sized {
    fn decode_args(params: Value) -> Result<Self, DecodeError>;
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("parameters must be an array, got {0:?}")]
    NotAnArray(Value),

    #[error("expected {expected} arguments, got {got}")]
    Arity { expected: usize, got: usize },

    #[error("argument {index}: {mismatch}")]
    Argument { index: usize, mismatch: TypeMismatch },
}

impl IntoArgs for () {
    fn types() -> Vec<Type> {
        Vec::new()
    }

    fn encode_args(self) -> Value {
        Value::Array(Vec::new())
    }
}

// Older peers send an empty map (or nothing) for calls without arguments.
fn is_empty_params(params: &Value) -> bool {
    match params {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Map(entries) => entries.is_empty(),
        _ => false,
    }
}

impl FromArgs for () {
    fn decode_args(params: Value) -> Result<Self, DecodeError> {
        match params {
            params if is_empty_params(&params) => Ok(()),
            Value::Array(items) => Err(DecodeError::Arity {
                expected: 0,
                got: items.len(),
            }),
            params => Err(DecodeError::NotAnArray(params)),
        }
    }
}

fn expect_array<const N: usize>(params: Value) -> Result<[Value; N], DecodeError> {
    let items = match params {
        Value::Array(items) => items,
        params => return Err(DecodeError::NotAnArray(params)),
    };
    let got = items.len();
    items
        .try_into()
        .map_err(|_| DecodeError::Arity { expected: N, got })
}

macro_rules! impl_args {
    ($len:literal; $($ty:ident $var:ident $idx:tt),+) => {
        impl<$($ty),+> IntoArgs for ($($ty,)+)
        where
            $($ty: Encode),+
        {
            fn types() -> Vec<Type> {
                vec![$($ty::rpc_type()),+]
            }

            fn encode_args(self) -> Value {
                Value::Array(vec![$($ty::encode(self.$idx)),+])
            }
        }

        impl<$($ty),+> FromArgs for ($($ty,)+)
        where
            $($ty: Decode),+
        {
            fn decode_args(params: Value) -> Result<Self, DecodeError> {
                let [$($var),+] = expect_array::<$len>(params)?;
                Ok(($(
                    $ty::decode($var)
                        .map_err(|mismatch| DecodeError::Argument { index: $idx, mismatch })?,
                )+))
            }
        }
    };
}

impl_args!(1; T1 a1 0);
impl_args!(2; T1 a1 0, T2 a2 1);
impl_args!(3; T1 a1 0, T2 a2 1, T3 a3 2);
impl_args!(4; T1 a1 0, T2 a2 1, T3 a3 2, T4 a4 3);
impl_args!(5; T1 a1 0, T2 a2 1, T3 a3 2, T4 a4 3, T5 a5 4);
impl_args!(6; T1 a1 0, T2 a2 1, T3 a3 2, T4 a4 3, T5 a5 4, T6 a6 5);
impl_args!(7; T1 a1 0, T2 a2 1, T3 a3 2, T4 a4 3, T5 a5 4, T6 a6 5, T7 a7 6);
impl_args!(8; T1 a1 0, T2 a2 1, T3 a3 2, T4 a4 3, T5 a5 4, T6 a6 5, T7 a7 6, T8 a8 7);
