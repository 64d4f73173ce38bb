// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Contract metadata and local value conversions.
//!
//! A contract is an application-declared trait whose members map onto a
//! remote dispatch object. Its reflective shape is a static
//! [`ContractDescriptor`], normally generated by
//! [`#[contract]`](macro@crate::contract), listing each member with its kind,
//! declared parameter types and declared return type.
//!
//! # Example
//!
//! ```rust
//! use autoproxy::{ContractDescriptor, MemberDescriptor, ValueType};
//!
//! static PROCESS: ContractDescriptor = ContractDescriptor {
//!     name: "Process",
//!     members: &[
//!         MemberDescriptor::property("Name", ValueType::Str),
//!         MemberDescriptor::method("Terminate", &[ValueType::Int], ValueType::Int),
//!     ],
//!     element: None,
//! };
//!
//! assert!(PROCESS.member("Terminate").is_some());
//! assert!(!PROCESS.is_iterable());
//! ```

mod descriptor;
mod overrides;
mod value;

pub use descriptor::{
    ContractDescriptor, ContractRef, Intrinsic, MemberDescriptor, MemberKind, ValueType,
};
pub use overrides::{OverrideFn, OverrideRegistry, OverrideTable, StaticOverride};
pub use value::{proxy_from_value, FromValue, IntoValue, Value};
