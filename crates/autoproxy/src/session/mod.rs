// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Remote session collaborator contract.
//!
//! A [`Session`] carries named property/method calls, capability queries and
//! enumerator fetches to the process hosting the remote objects. Connection
//! setup, wire transport and handle release all belong to the session; the
//! proxy layer only needs the five operations below, each of which is one
//! synchronous round trip.
//!
//! # Handles
//!
//! ```text
//! ObjectHandle       (object id + Arc<dyn Session>)
//! +-- DispatchHandle    narrowed dispatch facet: get / put / call
//! +-- EnumeratorHandle  narrowed enumerator facet: next_batch
//! ```
//!
//! # Thread Safety
//!
//! `Session` implementations must be `Send + Sync`. No ordering is promised
//! between calls issued from different threads against the same handle.

mod handle;
mod loopback;

pub use handle::{DispatchHandle, EnumeratorHandle, ObjectHandle};
pub use loopback::{CallCounts, CallRecord, LocalObject, LoopbackSession, SessionOp};

use crate::config::CapabilityId;
use crate::error::TransportError;
use crate::variant::Variant;
use std::fmt;

/// Session-scoped identifier of a remote object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transport-side operations consumed by the proxy layer.
pub trait Session: Send + Sync {
    /// Named property get.
    fn get_property(&self, target: ObjectId, name: &str) -> Result<Variant, TransportError>;

    /// Named property put.
    fn put_property(
        &self,
        target: ObjectId,
        name: &str,
        value: Variant,
    ) -> Result<(), TransportError>;

    /// Named method call with positional arguments.
    ///
    /// The first returned variant is the method's return value.
    fn call_method(
        &self,
        target: ObjectId,
        name: &str,
        args: Vec<Variant>,
    ) -> Result<Vec<Variant>, TransportError>;

    /// Ask the object for another facet.
    ///
    /// Returns `Ok(None)` when the object does not expose `capability`.
    fn query_capability(
        &self,
        target: ObjectId,
        capability: CapabilityId,
    ) -> Result<Option<ObjectId>, TransportError>;

    /// Fetch up to `count` elements from an enumerator.
    ///
    /// Reply shape is `[Array(elements), Int(fetched)]`; an empty reply or
    /// [`TransportError::EndOfSequence`] ends the enumeration.
    fn fetch_batch(&self, enumerator: ObjectId, count: u32)
        -> Result<Vec<Variant>, TransportError>;
}
