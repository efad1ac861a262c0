use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
};
use thiserror::Error;

/// Describes the shape a [`Value`] must have to convert into a Rust type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Null,
    Bool,
    Int,
    UInt,
    Float,
    String,
    Array(Box<Type>),
    Map(Box<Type>),
    Optional(Box<Type>),
    Record(&'static str),
    Any,
}

impl Type {
    fn name(&self) -> &'static str {
        use Type::*;
        match self {
            Null => "Null",
            Bool => "Bool",
            Int => "Int",
            UInt => "UInt",
            Float => "Float",
            String => "String",
            Array(_) => "Array",
            Map(_) => "Map",
            Optional(_) => "Optional",
            Record(name) => *name,
            Any => "Any",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())?;
        match self {
            Type::Array(inner) | Type::Map(inner) | Type::Optional(inner) => {
                write!(f, "<{inner}>")
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub enum Number {
    Int(i64),
    UInt(u64),
    Float(f64),
}

// 2^63 and 2^64: `as` saturates at these, so an equal round trip proves nothing.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;
const U64_BOUND: f64 = 18_446_744_073_709_551_616.0;

impl Number {
    pub fn from_u64(n: u64) -> Self {
        match i64::try_from(n) {
            Ok(n) => Number::Int(n),
            Err(_) => Number::UInt(n),
        }
    }

    pub fn as_i64(self) -> Option<i64> {
        match self {
            Number::Int(n) => Some(n),
            Number::UInt(n) => i64::try_from(n).ok(),
            Number::Float(f) => {
                let integral = f.is_finite() && f.fract() == 0.0;
                (integral && f >= -I64_BOUND && f < I64_BOUND).then_some(f as i64)
            }
        }
    }

    pub fn as_u64(self) -> Option<u64> {
        match self {
            Number::Int(n) => u64::try_from(n).ok(),
            Number::UInt(n) => Some(n),
            Number::Float(f) => {
                let integral = f.is_finite() && f.fract() == 0.0;
                (integral && f >= 0.0 && f < U64_BOUND).then_some(f as u64)
            }
        }
    }

    /// `None` if the integer has no exact `f64` representation.
    pub fn as_f64(self) -> Option<f64> {
        match self {
            Number::Int(n) => {
                let f = n as f64;
                (f < I64_BOUND && f as i64 == n).then_some(f)
            }
            Number::UInt(n) => {
                let f = n as f64;
                (f < U64_BOUND && f as u64 == n).then_some(f)
            }
            Number::Float(f) => Some(f),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{n}"),
            Number::UInt(n) => write!(f, "{n}"),
            Number::Float(n) => write!(f, "{n}"),
        }
    }
}

/// The tree-shaped data format every parameter list and return value travels as.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

macro_rules! impl_from_for_value {
    ($($rust_type:ty),*) => {$(
        impl From<$rust_type> for Value {
            fn from(val: $rust_type) -> Self {
                Encode::encode(val)
            }
        }
    )*};
}

impl_from_for_value!((), bool, String, &str, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

pub trait Typed {
    fn rpc_type() -> Type;
}

pub trait Encode: Typed {
    fn encode(val: Self) -> Value;
}

pub trait Decode: Typed + Sized {
    fn decode(val: Value) -> Result<Self, TypeMismatch>;
}

macro_rules! impl_encode_decode {
    ($rust_type:ty, $rpc_type:expr, $encode_name:pat => $encode_expr:expr, $($from_rpc_arm:tt)*) => {
        impl Typed for $rust_type {
            fn rpc_type() -> Type {
                $rpc_type
            }
        }

        impl Encode for $rust_type {
            fn encode($encode_name: $rust_type) -> Value {
                $encode_expr
            }
        }

        impl Decode for $rust_type {
            fn decode(val: Value) -> Result<Self, TypeMismatch> {
                Ok(match val {
                    $($from_rpc_arm)*,
                    _ => return Err(TypeMismatch::new(val, <Self as Typed>::rpc_type()))
                })
            }
        }
    };
}

impl_encode_decode!((), Type::Null, () => Value::Null, Value::Null => ());
impl_encode_decode!(bool, Type::Bool, b => Value::Bool(b), Value::Bool(b) => b);
impl_encode_decode!(String, Type::String, s => Value::String(s), Value::String(s) => s);

impl Typed for Value {
    fn rpc_type() -> Type {
        Type::Any
    }
}

impl Encode for Value {
    fn encode(val: Value) -> Value {
        val
    }
}

impl Decode for Value {
    fn decode(val: Value) -> Result<Self, TypeMismatch> {
        Ok(val)
    }
}

macro_rules! impl_numeric {
    ($rpc_type:expr, $into_number:expr, $from_number:expr; $($rust_type:ty),*) => {$(
        impl Typed for $rust_type {
            fn rpc_type() -> Type {
                $rpc_type
            }
        }

        impl Encode for $rust_type {
            fn encode(val: $rust_type) -> Value {
                let into_number: fn($rust_type) -> Number = $into_number;
                Value::Number(into_number(val))
            }
        }

        impl Decode for $rust_type {
            fn decode(val: Value) -> Result<Self, TypeMismatch> {
                let from_number: fn(Number) -> Option<$rust_type> = $from_number;
                if let Value::Number(n) = &val {
                    if let Some(converted) = from_number(*n) {
                        return Ok(converted);
                    }
                }
                Err(TypeMismatch::new(val, $rpc_type))
            }
        }
    )*};
}

impl_numeric!(
    Type::Int,
    |n| Number::Int(i64::from(n)),
    |n: Number| n.as_i64().and_then(|n| n.try_into().ok());
    i8, i16, i32, i64
);
impl_numeric!(
    Type::UInt,
    |n| Number::from_u64(u64::from(n)),
    |n: Number| n.as_u64().and_then(|n| n.try_into().ok());
    u8, u16, u32, u64
);
impl_numeric!(
    Type::Int,
    |n: isize| Number::Int(n as i64),
    |n: Number| n.as_i64().and_then(|n| n.try_into().ok());
    isize
);
impl_numeric!(
    Type::UInt,
    |n: usize| Number::from_u64(n as u64),
    |n: Number| n.as_u64().and_then(|n| n.try_into().ok());
    usize
);
impl_numeric!(Type::Float, Number::Float, Number::as_f64; f64);
impl_numeric!(
    Type::Float,
    |n| Number::Float(f64::from(n)),
    |n: Number| n.as_f64().and_then(narrow_f32);
    f32
);

fn narrow_f32(f: f64) -> Option<f32> {
    let narrowed = f as f32;
    (f.is_nan() || f64::from(narrowed) == f).then_some(narrowed)
}

impl Typed for &str {
    fn rpc_type() -> Type {
        Type::String
    }
}

impl Encode for &str {
    fn encode(val: Self) -> Value {
        Value::String(val.to_owned())
    }
}

impl<T: Typed> Typed for Option<T> {
    fn rpc_type() -> Type {
        Type::Optional(Box::new(T::rpc_type()))
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(val: Self) -> Value {
        val.map_or(Value::Null, T::encode)
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(val: Value) -> Result<Self, TypeMismatch> {
        match val {
            Value::Null => Ok(None),
            val => T::decode(val).map(Some),
        }
    }
}

impl<T: Typed> Typed for Vec<T> {
    fn rpc_type() -> Type {
        Type::Array(Box::new(T::rpc_type()))
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(val: Self) -> Value {
        Value::Array(val.into_iter().map(T::encode).collect())
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(val: Value) -> Result<Self, TypeMismatch> {
        match val {
            Value::Array(items) => items.into_iter().map(T::decode).collect(),
            val => Err(TypeMismatch::new(val, Self::rpc_type())),
        }
    }
}

macro_rules! impl_string_map {
    ($($map:ident),*) => {$(
        impl<T: Typed> Typed for $map<String, T> {
            fn rpc_type() -> Type {
                Type::Map(Box::new(T::rpc_type()))
            }
        }

        impl<T: Encode> Encode for $map<String, T> {
            fn encode(val: Self) -> Value {
                Value::Map(val.into_iter().map(|(k, v)| (k, T::encode(v))).collect())
            }
        }

        impl<T: Decode> Decode for $map<String, T> {
            fn decode(val: Value) -> Result<Self, TypeMismatch> {
                match val {
                    Value::Map(entries) => entries
                        .into_iter()
                        .map(|(k, v)| T::decode(v).map(|v| (k, v)))
                        .collect(),
                    val => Err(TypeMismatch::new(val, Self::rpc_type())),
                }
            }
        }
    )*};
}

impl_string_map!(BTreeMap, HashMap);

#[derive(Debug, Clone, PartialEq, Error)]
#[error("type error: {value:?} is not a valid {expected}")]
pub struct TypeMismatch {
    pub value: Value,
    pub expected: Type,
}

impl TypeMismatch {
    pub fn new(value: Value, expected: Type) -> Self {
        Self { value, expected }
    }
}
