// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dispatch gateway: the call interceptor behind every proxy.
//!
//! Each intercepted member is classified by its [`MemberKind`], in this
//! order:
//!
//! 1. **Intrinsic**: generic get/put/call on the dispatch handle, forwarded
//!    without marshalling.
//! 2. **Cast**: the same handle wrapped for another contract. No remote call.
//! 3. **Iterate**: a fresh enumerator adapted by the enumeration bridge.
//! 4. **Property**: named get with no arguments, result unmarshalled against
//!    the declared return type.
//! 5. **Method**: static override if one matches, otherwise marshal the
//!    arguments, call by name and unmarshal the first returned variant.
//!
//! Failures are never retried here.

use crate::contract::{
    ContractDescriptor, Intrinsic, MemberDescriptor, MemberKind, OverrideTable, Value,
};
use crate::enumeration::RemoteEnumeration;
use crate::error::{Error, Result};
use crate::marshal::{marshal_argument, unmarshal_result};
use crate::proxy::{Proxy, ProxyFactory};
use crate::session::DispatchHandle;
use crate::variant::Variant;
use std::fmt;
use std::sync::Arc;

/// Descriptors for members every proxy has regardless of its contract.
pub mod intrinsic {
    use crate::contract::{Intrinsic, MemberDescriptor, MemberKind, ValueType};

    pub static GET: MemberDescriptor = MemberDescriptor {
        name: "get",
        kind: MemberKind::Intrinsic(Intrinsic::Get),
        params: &[ValueType::Str],
        returns: ValueType::Variant,
    };

    pub static PUT: MemberDescriptor = MemberDescriptor {
        name: "put",
        kind: MemberKind::Intrinsic(Intrinsic::Put),
        params: &[ValueType::Str, ValueType::Variant],
        returns: ValueType::Void,
    };

    pub static CALL: MemberDescriptor = MemberDescriptor {
        name: "call",
        kind: MemberKind::Intrinsic(Intrinsic::Call),
        params: &[ValueType::Str, ValueType::Array],
        returns: ValueType::Array,
    };

    pub static CAST: MemberDescriptor = MemberDescriptor {
        name: "cast",
        kind: MemberKind::Cast,
        params: &[ValueType::Other("contract")],
        returns: ValueType::Other("proxy"),
    };

    pub static ITERATE: MemberDescriptor = MemberDescriptor {
        name: "iter",
        kind: MemberKind::Iterate,
        params: &[],
        returns: ValueType::Other("enumeration"),
    };
}

/// Binds one contract to one remote dispatch handle.
pub struct DispatchGateway {
    contract: &'static ContractDescriptor,
    handle: DispatchHandle,
    overrides: Option<Arc<OverrideTable>>,
    factory: ProxyFactory,
}

impl DispatchGateway {
    /// Bind `contract` to `handle`, resolving its override table once.
    pub(crate) fn new(
        contract: &'static ContractDescriptor,
        handle: DispatchHandle,
        factory: ProxyFactory,
    ) -> Self {
        let overrides = factory.overrides().resolve(contract);
        if let Some(table) = &overrides {
            log::debug!(
                "[gateway] {} #{} bound with {} static override(s)",
                contract.name,
                handle.id(),
                table.len()
            );
        }
        Self {
            contract,
            handle,
            overrides,
            factory,
        }
    }

    pub fn contract(&self) -> &'static ContractDescriptor {
        self.contract
    }

    pub fn handle(&self) -> &DispatchHandle {
        &self.handle
    }

    pub fn factory(&self) -> &ProxyFactory {
        &self.factory
    }

    pub fn overrides(&self) -> Option<&Arc<OverrideTable>> {
        self.overrides.as_ref()
    }

    /// Route one intercepted call. `this` is the proxy that owns the gateway.
    pub(crate) fn dispatch(
        &self,
        this: &Proxy,
        member: &MemberDescriptor,
        args: Vec<Value>,
    ) -> Result<Value> {
        match member.kind {
            MemberKind::Intrinsic(op) => self.intrinsic(op, member, args),
            MemberKind::Cast => self.cast(member, args),
            MemberKind::Iterate => self.iterate().map(Value::Enumeration),
            MemberKind::Property => self.property(member, args),
            MemberKind::Method => self.method(this, member, args),
        }
    }

    fn intrinsic(
        &self,
        op: Intrinsic,
        member: &MemberDescriptor,
        args: Vec<Value>,
    ) -> Result<Value> {
        let mut args = expect_args(member, args)?.into_iter();
        let name = match args.next() {
            Some(Value::Str(name)) => name,
            other => return Err(bad_argument(member, other)),
        };
        match op {
            Intrinsic::Get => self.handle.get(&name).map(Value::Variant),
            Intrinsic::Put => {
                let value = match args.next() {
                    Some(Value::Variant(v)) => v,
                    other => return Err(bad_argument(member, other)),
                };
                self.handle.put(&name, value).map(|()| Value::Null)
            }
            Intrinsic::Call => {
                let call_args = match args.next() {
                    Some(Value::Variants(vs)) => vs,
                    other => return Err(bad_argument(member, other)),
                };
                self.handle.call(&name, call_args).map(Value::Variants)
            }
        }
    }

    fn cast(&self, member: &MemberDescriptor, args: Vec<Value>) -> Result<Value> {
        match expect_args(member, args)?.pop() {
            Some(Value::Contract(target)) => {
                let target = target.get();
                log::trace!(
                    "[gateway] cast {} #{} -> {}",
                    self.contract.name,
                    self.handle.id(),
                    target.name
                );
                Ok(Value::Proxy(
                    self.factory.wrap_dynamic(target, self.handle.clone()),
                ))
            }
            other => Err(bad_argument(member, other)),
        }
    }

    /// Open a fresh enumerator over the contract's element type.
    pub fn iterate(&self) -> Result<RemoteEnumeration> {
        let element = self.contract.element.ok_or(Error::NotIterable {
            contract: self.contract.name,
        })?;
        RemoteEnumeration::open(
            &self.handle,
            self.factory.enumerator_property(),
            element,
            self.factory.clone(),
        )
    }

    fn property(&self, member: &MemberDescriptor, args: Vec<Value>) -> Result<Value> {
        expect_args(member, args)?;
        log::trace!(
            "[gateway] {} #{} get {}",
            self.contract.name,
            self.handle.id(),
            member.name
        );
        let variant = self.handle.get(member.name)?;
        unmarshal_result(variant, &member.returns, &self.factory)
            .map_err(|e| e.in_member(member.name))
    }

    fn method(
        &self,
        this: &Proxy,
        member: &MemberDescriptor,
        args: Vec<Value>,
    ) -> Result<Value> {
        let args = expect_args(member, args)?;

        if let Some(found) = self.overrides.as_ref().and_then(|t| t.find(member)) {
            log::trace!(
                "[gateway] {} {} served by static override",
                self.contract.name,
                member.name
            );
            return found.invoke(this, &args);
        }

        let variants = args
            .into_iter()
            .zip(member.params)
            .map(|(value, declared)| marshal_argument(value, declared))
            .collect::<Result<Vec<Variant>>>()
            .map_err(|e| e.in_member(member.name))?;

        log::trace!(
            "[gateway] {} #{} call {} ({} args)",
            self.contract.name,
            self.handle.id(),
            member.name,
            variants.len()
        );
        // the first element of the reply is the return value
        let ret = self
            .handle
            .call(member.name, variants)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                Error::AssertionFailure(format!("{} replied without a return value", member.name))
            })?;
        unmarshal_result(ret, &member.returns, &self.factory)
            .map_err(|e| e.in_member(member.name))
    }
}

impl fmt::Debug for DispatchGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchGateway")
            .field("contract", &self.contract.name)
            .field("handle", &self.handle.id())
            .field("overrides", &self.overrides.as_ref().map(|t| t.len()))
            .finish()
    }
}

fn expect_args(member: &MemberDescriptor, args: Vec<Value>) -> Result<Vec<Value>> {
    if args.len() == member.params.len() {
        Ok(args)
    } else {
        Err(Error::ArgumentCount {
            member: member.name.to_string(),
            expected: member.params.len(),
            found: args.len(),
        })
    }
}

fn bad_argument(member: &MemberDescriptor, got: Option<Value>) -> Error {
    let type_name = got.as_ref().map_or("nothing", Value::kind_name).to_string();
    Error::UnsupportedArgument {
        member: Some(member.name.to_string()),
        type_name,
    }
}
