// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Local values flowing through the gateway.

use super::{ContractRef, ValueType};
use crate::enumeration::RemoteEnumeration;
use crate::error::{Error, Result};
use crate::proxy::{Proxy, TypedProxy};
use crate::session::DispatchHandle;
use crate::variant::Variant;
use std::fmt;

/// A local argument or result, before marshalling / after unmarshalling.
pub enum Value {
    /// Omitted optional argument, or the result of a void member.
    Null,
    Int(i32),
    Str(String),
    /// Raw variant, passed through untouched.
    Variant(Variant),
    Variants(Vec<Variant>),
    Dispatch(DispatchHandle),
    Proxy(Proxy),
    /// Target contract of a cast request.
    Contract(ContractRef),
    Enumeration(RemoteEnumeration),
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Int(_) => "i32",
            Self::Str(_) => "String",
            Self::Variant(_) => "variant",
            Self::Variants(_) => "Vec<Variant>",
            Self::Dispatch(_) => "dispatch",
            Self::Proxy(_) => "proxy",
            Self::Contract(_) => "contract",
            Self::Enumeration(_) => "enumeration",
        }
    }

    fn unexpected(self, expected: &str) -> Error {
        Error::AssertionFailure(format!(
            "gateway produced {} where {} was declared",
            self.kind_name(),
            expected
        ))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::Int(v) => write!(f, "Int({})", v),
            Self::Str(s) => write!(f, "Str({:?})", s),
            Self::Variant(v) => write!(f, "Variant({:?})", v),
            Self::Variants(vs) => write!(f, "Variants({:?})", vs),
            Self::Dispatch(h) => write!(f, "Dispatch(#{})", h.id()),
            Self::Proxy(p) => write!(f, "Proxy({})", p.contract().name),
            Self::Contract(c) => write!(f, "{:?}", c),
            Self::Enumeration(_) => write!(f, "Enumeration"),
        }
    }
}

/// Conversion from a gateway result into a declared return type.
pub trait FromValue: Sized {
    /// Declared type used for unmarshalling.
    const TYPE: ValueType;

    fn from_value(value: Value) -> Result<Self>;
}

/// Conversion from a declared parameter type into a gateway argument.
pub trait IntoValue {
    const TYPE: ValueType;

    fn into_value(self) -> Value;
}

impl FromValue for () {
    const TYPE: ValueType = ValueType::Void;

    fn from_value(_value: Value) -> Result<Self> {
        Ok(())
    }
}

impl FromValue for i32 {
    const TYPE: ValueType = ValueType::Int;

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Int(v) => Ok(v),
            other => Err(other.unexpected("i32")),
        }
    }
}

impl FromValue for String {
    const TYPE: ValueType = ValueType::Str;

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(other.unexpected("String")),
        }
    }
}

impl FromValue for Variant {
    const TYPE: ValueType = ValueType::Variant;

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Variant(v) => Ok(v),
            other => Err(other.unexpected("variant")),
        }
    }
}

impl FromValue for DispatchHandle {
    const TYPE: ValueType = ValueType::Dispatch;

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Dispatch(h) => Ok(h),
            other => Err(other.unexpected("dispatch")),
        }
    }
}

impl IntoValue for i32 {
    const TYPE: ValueType = ValueType::Int;

    fn into_value(self) -> Value {
        Value::Int(self)
    }
}

impl IntoValue for String {
    const TYPE: ValueType = ValueType::Str;

    fn into_value(self) -> Value {
        Value::Str(self)
    }
}

impl IntoValue for &str {
    const TYPE: ValueType = ValueType::Str;

    fn into_value(self) -> Value {
        Value::Str(self.to_string())
    }
}

impl IntoValue for Variant {
    const TYPE: ValueType = ValueType::Variant;

    fn into_value(self) -> Value {
        Value::Variant(self)
    }
}

impl IntoValue for Vec<Variant> {
    const TYPE: ValueType = ValueType::Array;

    fn into_value(self) -> Value {
        Value::Variants(self)
    }
}

impl IntoValue for DispatchHandle {
    const TYPE: ValueType = ValueType::Dispatch;

    fn into_value(self) -> Value {
        Value::Dispatch(self)
    }
}

/// `None` is sent as an omitted optional argument.
impl<T: IntoValue> IntoValue for Option<T> {
    const TYPE: ValueType = T::TYPE;

    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }
}

/// Typed view of a proxy result. Used by generated `FromValue` impls.
pub fn proxy_from_value<P: TypedProxy>(value: Value) -> Result<P> {
    match value {
        Value::Proxy(proxy) if std::ptr::eq(proxy.contract(), P::contract()) => {
            Ok(P::from_proxy(proxy))
        }
        Value::Proxy(proxy) => Err(Error::AssertionFailure(format!(
            "proxy bound to {} where {} was declared",
            proxy.contract().name,
            P::contract().name
        ))),
        other => Err(other.unexpected(P::contract().name)),
    }
}
