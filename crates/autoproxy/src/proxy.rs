// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Proxies and the typed-proxy factory.
//!
//! A [`Proxy`] is the untyped core of every typed proxy: it owns exactly one
//! [`DispatchGateway`] and routes every member through it. Typed proxies
//! generated by [`#[contract]`](macro@crate::contract) wrap a `Proxy` and implement
//! the contract trait on top of it.
//!
//! # Example
//!
//! ```rust
//! use autoproxy::{contract, LocalObject, LoopbackSession, ProxyFactory, Result};
//!
//! #[contract]
//! pub trait Service {
//!     #[property]
//!     fn display_name(&self) -> Result<String>;
//!     fn stop_service(&self) -> Result<i32>;
//! }
//!
//! # fn main() -> Result<()> {
//! let session = LoopbackSession::new();
//! let object = session.insert(
//!     LocalObject::new()
//!         .property("DisplayName", "Print Spooler")
//!         .method("StopService", |_| Ok(0.into())),
//! );
//!
//! let service: ServiceProxy = ProxyFactory::new().wrap_object(&object)?;
//! assert_eq!(service.display_name()?, "Print Spooler");
//! assert_eq!(service.stop_service()?, 0);
//! # Ok(())
//! # }
//! ```

use crate::config::NEW_ENUM_PROPERTY;
use crate::contract::{
    ContractDescriptor, ContractRef, FromValue, MemberDescriptor, OverrideRegistry, OverrideTable,
    Value,
};
use crate::enumeration::{Elements, RemoteEnumeration};
use crate::error::{Error, Result};
use crate::gateway::{intrinsic, DispatchGateway};
use crate::session::{DispatchHandle, ObjectHandle};
use crate::variant::Variant;
use std::fmt;
use std::sync::Arc;

/// Implemented by every typed proxy (the proxy-capability marker).
pub trait TypedProxy: Sized + Clone {
    /// Static shape of the contract this proxy implements.
    fn contract() -> &'static ContractDescriptor;

    /// Wrap an untyped proxy already bound to [`Self::contract`].
    fn from_proxy(proxy: Proxy) -> Self;

    fn as_proxy(&self) -> &Proxy;

    fn into_proxy(self) -> Proxy;
}

/// Untyped proxy: one gateway bound to one contract and one remote handle.
///
/// Cloning shares the gateway.
#[derive(Clone)]
pub struct Proxy {
    gateway: Arc<DispatchGateway>,
}

impl Proxy {
    pub fn contract(&self) -> &'static ContractDescriptor {
        self.gateway.contract()
    }

    pub fn dispatch_handle(&self) -> &DispatchHandle {
        self.gateway.handle()
    }

    pub fn gateway(&self) -> &DispatchGateway {
        &self.gateway
    }

    /// Intercept a call to `member` with the given arguments.
    pub fn invoke(&self, member: &MemberDescriptor, args: Vec<Value>) -> Result<Value> {
        self.gateway.dispatch(self, member, args)
    }

    /// Generic named property get on the underlying handle.
    pub fn get(&self, name: &str) -> Result<Variant> {
        let value = self.invoke(&intrinsic::GET, vec![Value::Str(name.to_string())])?;
        Variant::from_value(value)
    }

    /// Generic named property put on the underlying handle.
    pub fn put(&self, name: &str, value: impl Into<Variant>) -> Result<()> {
        self.invoke(
            &intrinsic::PUT,
            vec![Value::Str(name.to_string()), Value::Variant(value.into())],
        )
        .map(drop)
    }

    /// Generic named call on the underlying handle; returns every result variant.
    pub fn call(&self, name: &str, args: Vec<Variant>) -> Result<Vec<Variant>> {
        match self.invoke(
            &intrinsic::CALL,
            vec![Value::Str(name.to_string()), Value::Variants(args)],
        )? {
            Value::Variants(vs) => Ok(vs),
            other => Err(Error::AssertionFailure(format!(
                "call returned {}",
                other.kind_name()
            ))),
        }
    }

    /// View the same remote object through contract `P`.
    pub fn cast<P: TypedProxy>(&self) -> Result<P> {
        let value = self.invoke(
            &intrinsic::CAST,
            vec![Value::Contract(ContractRef::of::<P>())],
        )?;
        crate::contract::proxy_from_value(value)
    }

    /// View the same remote object through `contract`.
    pub fn cast_dynamic(&self, contract: ContractRef) -> Result<Proxy> {
        match self.invoke(&intrinsic::CAST, vec![Value::Contract(contract)])? {
            Value::Proxy(p) => Ok(p),
            other => Err(Error::AssertionFailure(format!(
                "cast returned {}",
                other.kind_name()
            ))),
        }
    }

    /// Untyped iteration over the contract's element type.
    pub fn enumerate(&self) -> Result<RemoteEnumeration> {
        match self.invoke(&intrinsic::ITERATE, Vec::new())? {
            Value::Enumeration(e) => Ok(e),
            other => Err(Error::AssertionFailure(format!(
                "iteration returned {}",
                other.kind_name()
            ))),
        }
    }

    /// Typed iteration over the contract's element type.
    pub fn elements<T: FromValue>(&self) -> Result<Elements<T>> {
        self.enumerate().map(Elements::new)
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("contract", &self.contract().name)
            .field("handle", &self.dispatch_handle().id())
            .finish()
    }
}

struct FactoryInner {
    overrides: OverrideRegistry,
    enumerator_property: String,
}

/// Creates proxies. Cheap to clone; every gateway carries the factory that
/// built it so nested proxies share its configuration.
#[derive(Clone)]
pub struct ProxyFactory {
    inner: Arc<FactoryInner>,
}

impl ProxyFactory {
    /// Factory with no overrides and the standard enumerator property.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> ProxyFactoryBuilder {
        ProxyFactoryBuilder::default()
    }

    pub fn overrides(&self) -> &OverrideRegistry {
        &self.inner.overrides
    }

    pub fn enumerator_property(&self) -> &str {
        &self.inner.enumerator_property
    }

    /// Typed proxy over a ready-made dispatch handle.
    pub fn wrap<P: TypedProxy>(&self, handle: DispatchHandle) -> P {
        P::from_proxy(self.wrap_dynamic(P::contract(), handle))
    }

    /// Typed proxy over a generic object, obtaining its dispatch facet first.
    ///
    /// # Errors
    ///
    /// `UnsupportedCapability` if the object has no dispatch facet.
    pub fn wrap_object<P: TypedProxy>(&self, object: &ObjectHandle) -> Result<P> {
        self.wrap_object_dynamic(P::contract(), object)
            .map(P::from_proxy)
    }

    pub fn wrap_dynamic(
        &self,
        contract: &'static ContractDescriptor,
        handle: DispatchHandle,
    ) -> Proxy {
        log::trace!("[factory] wrap #{} as {}", handle.id(), contract.name);
        Proxy {
            gateway: Arc::new(DispatchGateway::new(contract, handle, self.clone())),
        }
    }

    pub fn wrap_object_dynamic(
        &self,
        contract: &'static ContractDescriptor,
        object: &ObjectHandle,
    ) -> Result<Proxy> {
        let handle = object.query_dispatch()?;
        Ok(self.wrap_dynamic(contract, handle))
    }
}

impl Default for ProxyFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProxyFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyFactory")
            .field("overrides", &self.inner.overrides)
            .field("enumerator_property", &self.inner.enumerator_property)
            .finish()
    }
}

/// Builder for [`ProxyFactory`].
#[derive(Debug)]
pub struct ProxyFactoryBuilder {
    tables: Vec<OverrideTable>,
    enumerator_property: String,
}

impl Default for ProxyFactoryBuilder {
    fn default() -> Self {
        Self {
            tables: Vec::new(),
            enumerator_property: NEW_ENUM_PROPERTY.to_string(),
        }
    }
}

impl ProxyFactoryBuilder {
    /// Register static overrides for one contract.
    pub fn override_table(mut self, table: OverrideTable) -> Self {
        self.tables.push(table);
        self
    }

    /// Property used to obtain enumerators (default `_NewEnum`).
    pub fn enumerator_property(mut self, name: impl Into<String>) -> Self {
        self.enumerator_property = name.into();
        self
    }

    pub fn build(self) -> ProxyFactory {
        let overrides = OverrideRegistry::new();
        for table in self.tables {
            overrides.register(table);
        }
        ProxyFactory {
            inner: Arc::new(FactoryInner {
                overrides,
                enumerator_property: self.enumerator_property,
            }),
        }
    }
}
