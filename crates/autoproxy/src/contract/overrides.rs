// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Statically compiled member overrides.
//!
//! An [`OverrideTable`] supplies local implementations for some methods of
//! one contract. The gateway consults it before dispatching a method
//! remotely; a hit never touches the remote object.
//!
//! Every override implicitly takes the proxy it was invoked on as its first
//! parameter, so a table entry matches a member when the names agree and the
//! remaining parameter types are identical.
//!
//! Tables are registered on the [`ProxyFactory`](crate::ProxyFactory) and
//! resolved once per gateway.

use super::{ContractDescriptor, ContractRef, MemberDescriptor, MemberKind, ValueType};
use crate::error::Result;
use crate::proxy::{Proxy, TypedProxy};
use crate::Value;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

/// Override implementation: `(self proxy, original arguments) -> result`.
pub type OverrideFn = dyn Fn(&Proxy, &[Value]) -> Result<Value> + Send + Sync;

/// One overridden method.
#[derive(Clone)]
pub struct StaticOverride {
    name: String,
    params: Vec<ValueType>,
    func: Arc<OverrideFn>,
}

impl StaticOverride {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ValueType] {
        &self.params
    }

    fn matches(&self, member: &MemberDescriptor) -> bool {
        member.kind == MemberKind::Method
            && self.name == member.name
            && self.params.as_slice() == member.params
    }

    pub fn invoke(&self, this: &Proxy, args: &[Value]) -> Result<Value> {
        (self.func)(this, args)
    }
}

impl fmt::Debug for StaticOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticOverride")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

/// Overrides for a single contract.
#[derive(Clone, Debug)]
pub struct OverrideTable {
    contract: ContractRef,
    entries: Vec<StaticOverride>,
}

impl OverrideTable {
    pub fn new(contract: ContractRef) -> Self {
        Self {
            contract,
            entries: Vec::new(),
        }
    }

    pub fn for_proxy<P: TypedProxy>() -> Self {
        Self::new(ContractRef::of::<P>())
    }

    /// Add an override for method `name` taking `params` (after the implicit self).
    pub fn with<F>(mut self, name: impl Into<String>, params: &[ValueType], func: F) -> Self
    where
        F: Fn(&Proxy, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.entries.push(StaticOverride {
            name: name.into(),
            params: params.to_vec(),
            func: Arc::new(func),
        });
        self
    }

    pub fn contract(&self) -> ContractRef {
        self.contract
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Override matching `member` by name and parameter shape.
    pub fn find(&self, member: &MemberDescriptor) -> Option<&StaticOverride> {
        self.entries.iter().find(|e| e.matches(member))
    }
}

/// Contract name -> override table.
#[derive(Default)]
pub struct OverrideRegistry {
    tables: DashMap<&'static str, Arc<OverrideTable>>,
}

impl OverrideRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `table`, replacing any previous table for the same contract.
    ///
    /// Gateways already constructed keep the table they resolved.
    pub fn register(&self, table: OverrideTable) {
        let name = table.contract.get().name;
        log::debug!(
            "[overrides] registered {} override(s) for {}",
            table.len(),
            name
        );
        self.tables.insert(name, Arc::new(table));
    }

    /// Table for `contract`, if one is registered.
    pub fn resolve(&self, contract: &'static ContractDescriptor) -> Option<Arc<OverrideTable>> {
        let table = self.tables.get(contract.name)?;
        if std::ptr::eq(table.contract.get(), contract) {
            Some(Arc::clone(table.value()))
        } else {
            log::warn!(
                "[overrides] table registered under {} belongs to another contract",
                contract.name
            );
            None
        }
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl fmt::Debug for OverrideRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverrideRegistry")
            .field("contracts", &self.tables.len())
            .finish()
    }
}
