// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Static contract metadata.

use crate::proxy::TypedProxy;
use std::fmt;

/// Declared local type of a parameter, a return value or an iteration element.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// Raw dispatch handle, returned without typed wrapping.
    Dispatch,
    /// Another contract; results are wrapped in a typed proxy.
    Contract(ContractRef),
    /// The variant itself (raw access).
    Variant,
    Int,
    Void,
    Str,
    /// Ordered list of variants. Accepted as an argument only.
    Array,
    /// Any other local type. Never unmarshalled.
    Other(&'static str),
}

impl ValueType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dispatch => "dispatch",
            Self::Contract(c) => c.get().name,
            Self::Variant => "variant",
            Self::Int => "i32",
            Self::Void => "()",
            Self::Str => "String",
            Self::Array => "Vec<Variant>",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Debug for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contract(c) => write!(f, "Contract({})", c.get().name),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// Lazily resolved reference to a contract descriptor.
///
/// Contracts may refer to each other (or themselves) through return types, so
/// the reference is a function pointer rather than a `&'static`.
#[derive(Clone, Copy)]
pub struct ContractRef(pub fn() -> &'static ContractDescriptor);

impl ContractRef {
    pub const fn of<P: TypedProxy>() -> Self {
        Self(P::contract)
    }

    pub fn get(&self) -> &'static ContractDescriptor {
        (self.0)()
    }
}

impl PartialEq for ContractRef {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.get(), other.get())
    }
}

impl Eq for ContractRef {}

impl fmt::Debug for ContractRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContractRef({})", self.get().name)
    }
}

/// Generic operations of the dispatch facet itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intrinsic {
    Get,
    Put,
    Call,
}

/// How the gateway treats a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// Forwarded to the dispatch handle untouched.
    Intrinsic(Intrinsic),
    /// Re-view the same remote object through another contract.
    Cast,
    /// Produce an iterator over the contract's element type.
    Iterate,
    /// Named get, no arguments.
    Property,
    /// Named call with positional arguments.
    Method,
}

/// Metadata of one contract member.
#[derive(Debug, Clone, Copy)]
pub struct MemberDescriptor {
    /// Remote name.
    pub name: &'static str,
    pub kind: MemberKind,
    pub params: &'static [ValueType],
    pub returns: ValueType,
}

impl MemberDescriptor {
    pub const fn property(name: &'static str, returns: ValueType) -> Self {
        Self {
            name,
            kind: MemberKind::Property,
            params: &[],
            returns,
        }
    }

    pub const fn method(
        name: &'static str,
        params: &'static [ValueType],
        returns: ValueType,
    ) -> Self {
        Self {
            name,
            kind: MemberKind::Method,
            params,
            returns,
        }
    }
}

/// Reflective shape of a contract: its members and, if iterable, its element type.
#[derive(Debug)]
pub struct ContractDescriptor {
    pub name: &'static str,
    pub members: &'static [MemberDescriptor],
    pub element: Option<ValueType>,
}

impl ContractDescriptor {
    pub fn member(&self, name: &str) -> Option<&'static MemberDescriptor> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn is_iterable(&self) -> bool {
        self.element.is_some()
    }
}
