// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Protocol constants shared by the gateway, the enumeration bridge and
//! session implementations.
//!
//! Runtime knobs (override tables, enumerator property) live on
//! [`ProxyFactoryBuilder`](crate::ProxyFactoryBuilder); everything here is fixed
//! by the remote automation protocol.

use std::fmt;

/// Property that hands out a fresh enumerator for a collection object.
pub const NEW_ENUM_PROPERTY: &str = "_NewEnum";

/// Method name reported in errors raised by an enumerator fetch.
pub const ENUM_NEXT_METHOD: &str = "Next";

/// Number of elements requested per enumerator fetch.
///
/// The bridge is single-step: one element per round trip.
pub const ENUM_FETCH_BATCH: u32 = 1;

/// Remote status code that marks the end of an enumeration (S_FALSE).
pub const END_OF_SEQUENCE_CODE: i32 = 1;

/// 128-bit capability (interface) identifier used by `query_capability`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CapabilityId(u128);

impl CapabilityId {
    /// Generic named get/put/invoke facet (IDispatch).
    pub const DISPATCH: CapabilityId = CapabilityId(0x00020400_0000_0000_C000_000000000046);

    /// Batch enumerator facet (IEnumVARIANT).
    pub const ENUM_VARIANT: CapabilityId = CapabilityId(0x00020404_0000_0000_C000_000000000046);

    /// Base object facet (IUnknown).
    pub const UNKNOWN: CapabilityId = CapabilityId(0x00000000_0000_0000_C000_000000000046);

    pub const fn from_u128(raw: u128) -> Self {
        Self(raw)
    }

    pub const fn as_u128(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        write!(
            f,
            "{:08X}-{:04X}-{:04X}-{:04X}-{:012X}",
            (v >> 96) as u32,
            (v >> 80) as u16,
            (v >> 64) as u16,
            (v >> 48) as u16,
            v & 0xFFFF_FFFF_FFFF
        )
    }
}

impl fmt::Debug for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CapabilityId({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_id_formats_as_registry_guid() {
        assert_eq!(
            CapabilityId::DISPATCH.to_string(),
            "00020400-0000-0000-C000-000000000046"
        );
        assert_eq!(
            CapabilityId::ENUM_VARIANT.to_string(),
            "00020404-0000-0000-C000-000000000046"
        );
    }

    #[test]
    fn well_known_ids_are_distinct() {
        assert_ne!(CapabilityId::DISPATCH, CapabilityId::ENUM_VARIANT);
        assert_ne!(CapabilityId::DISPATCH, CapabilityId::UNKNOWN);
    }
}
