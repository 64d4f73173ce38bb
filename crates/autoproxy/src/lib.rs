// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # autoproxy - Typed proxies over remote dynamic-dispatch objects
//!
//! Declare a contract as an ordinary Rust trait, and `autoproxy` turns every
//! call on it into a named get or call against a remote automation object,
//! converting arguments and results between local types and variants.
//!
//! ## Quick Start
//!
//! ```rust
//! use autoproxy::{contract, LocalObject, LoopbackSession, ProxyFactory, Result, Variant};
//!
//! #[contract]
//! pub trait Process {
//!     #[property]
//!     fn name(&self) -> Result<String>;
//!     #[property]
//!     fn process_id(&self) -> Result<i32>;
//! }
//!
//! #[contract(iterable = ProcessProxy)]
//! pub trait ProcessSet {
//!     #[property]
//!     fn count(&self) -> Result<i32>;
//! }
//!
//! fn main() -> Result<()> {
//!     let session = LoopbackSession::new();
//!     let p = session.insert(
//!         LocalObject::new()
//!             .property("Name", "explorer.exe")
//!             .property("ProcessId", 4312),
//!     );
//!     let set = session.insert(
//!         LocalObject::new()
//!             .property("Count", 1)
//!             .collection(vec![Variant::from(p)]),
//!     );
//!
//!     let set: ProcessSetProxy = ProxyFactory::new().wrap_object(&set)?;
//!     for process in set.iter()? {
//!         let process = process?;
//!         println!("{} {}", process.process_id()?, process.name()?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |   #[contract] trait  ->  XProxy (TypedProxy)  ->  Proxy             |
//! +---------------------------------------------------------------------+
//! |   DispatchGateway: intrinsic | cast | iterate | property | method   |
//! |       +-- OverrideTable (static local implementations)              |
//! |       +-- marshal (Value <-> Variant)                               |
//! |       +-- RemoteEnumeration (_NewEnum -> Next, one element a trip)  |
//! +---------------------------------------------------------------------+
//! |   Session trait: get / put / call / query_capability / fetch_batch  |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ProxyFactory`] | Wraps remote handles into typed proxies |
//! | [`Proxy`] | Untyped proxy owning one dispatch gateway |
//! | [`Variant`] | Tagged value crossing the session boundary |
//! | [`Session`] | Transport collaborator the proxies call into |
//! | [`Error`] | Marshalling, capability and remote call failures |

// Lets generated code use `::autoproxy::` paths inside this crate's tests.
extern crate self as autoproxy;

/// Protocol constants and capability identifiers.
pub mod config;
/// Contract descriptors, local values and static overrides.
pub mod contract;
/// Pull-based iteration over remote collections.
pub mod enumeration;
/// Error types.
pub mod error;
/// Call interception and routing.
pub mod gateway;
/// Local value <-> variant conversions.
pub mod marshal;
/// Proxies and the proxy factory.
pub mod proxy;
/// Session collaborator contract, handles and the in-process loopback session.
pub mod session;
/// Variant data model.
pub mod variant;

pub use config::CapabilityId;
pub use contract::{
    ContractDescriptor, ContractRef, FromValue, Intrinsic, IntoValue, MemberDescriptor,
    MemberKind, OverrideRegistry, OverrideTable, Value, ValueType,
};
pub use enumeration::{Elements, RemoteEnumeration};
pub use error::{Error, Result, TransportError};
pub use gateway::DispatchGateway;
pub use proxy::{Proxy, ProxyFactory, ProxyFactoryBuilder, TypedProxy};
pub use session::{
    DispatchHandle, EnumeratorHandle, LocalObject, LoopbackSession, ObjectHandle, ObjectId,
    Session,
};
pub use variant::{Variant, VariantTag};

/// Attribute macro that turns a trait into a contract and generates its proxy.
pub use autoproxy_codegen::contract;

#[cfg(test)]
mod tests;
