// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type-directed conversion between local values and variants.
//!
//! Arguments are converted by their runtime kind; results are converted by
//! their declared type, in a fixed order:
//!
//! 1. raw dispatch handle
//! 2. contract (typed proxy)
//! 3. variant
//! 4. integer
//! 5. void
//! 6. string
//! 7. anything else: `UnsupportedReturnType`
//!
//! Handle and contract rules come first because a contract's variant is an
//! object handle and must not be returned as opaque variant data.

use crate::contract::{Value, ValueType};
use crate::error::{Error, Result};
use crate::proxy::ProxyFactory;
use crate::session::DispatchHandle;
use crate::variant::Variant;

/// Convert a local argument into a variant for a remote call.
///
/// No validation against `declared` is done here; a wrong argument surfaces
/// as a remote call failure.
pub fn marshal_argument(value: Value, declared: &ValueType) -> Result<Variant> {
    let variant = match value {
        Value::Null => Variant::optional_param(),
        Value::Str(s) => Variant::Str(s),
        Value::Int(i) => Variant::Int(i),
        Value::Variant(v) => v,
        Value::Variants(items) => Variant::Array(items),
        Value::Dispatch(h) => Variant::Object(h.into_object()),
        Value::Proxy(p) => Variant::Object(p.dispatch_handle().object().clone()),
        other @ (Value::Contract(_) | Value::Enumeration(_)) => {
            return Err(Error::UnsupportedArgument {
                member: None,
                type_name: format!("{} (declared {})", other.kind_name(), declared),
            })
        }
    };
    Ok(variant)
}

/// Convert a returned variant into a value of the declared type.
pub fn unmarshal_result(
    variant: Variant,
    declared: &ValueType,
    factory: &ProxyFactory,
) -> Result<Value> {
    match declared {
        ValueType::Dispatch => {
            let object = variant.into_object()?;
            Ok(Value::Dispatch(DispatchHandle::narrow(object)))
        }
        ValueType::Contract(contract) => {
            let object = variant.into_object()?;
            let proxy = factory.wrap_object_dynamic(contract.get(), &object)?;
            Ok(Value::Proxy(proxy))
        }
        ValueType::Variant => Ok(Value::Variant(variant)),
        ValueType::Int => variant.as_int().map(Value::Int),
        ValueType::Void => Ok(Value::Null),
        ValueType::Str => variant.into_string().map(Value::Str),
        ValueType::Array | ValueType::Other(_) => Err(Error::UnsupportedReturnType {
            member: None,
            type_name: declared.name().to_string(),
        }),
    }
}
