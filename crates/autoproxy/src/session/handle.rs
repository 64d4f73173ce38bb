// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Remote object handles.

use super::{ObjectId, Session};
use crate::config::CapabilityId;
use crate::error::{Error, Result, TransportError};
use crate::variant::Variant;
use std::fmt;
use std::sync::Arc;

const QUERY_CAPABILITY: &str = "QueryInterface";

/// Handle to a remote object, bound to the session that owns it.
///
/// Cloning is cheap. Dropping a handle does not release the remote object;
/// that is the session's concern.
#[derive(Clone)]
pub struct ObjectHandle {
    id: ObjectId,
    session: Arc<dyn Session>,
}

impl ObjectHandle {
    pub fn new(id: ObjectId, session: Arc<dyn Session>) -> Self {
        Self { id, session }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn session(&self) -> &Arc<dyn Session> {
        &self.session
    }

    /// Handle to another object living in the same session.
    pub fn sibling(&self, id: ObjectId) -> Self {
        Self {
            id,
            session: Arc::clone(&self.session),
        }
    }

    /// Ask the remote object for another facet.
    ///
    /// # Errors
    ///
    /// `UnsupportedCapability` if the object does not expose `capability`,
    /// `RemoteCallFailure` if the query itself fails.
    pub fn query_capability(&self, capability: CapabilityId) -> Result<ObjectHandle> {
        log::trace!("[session] #{} query {}", self.id, capability);
        match self.session.query_capability(self.id, capability) {
            Ok(Some(id)) => Ok(self.sibling(id)),
            Ok(None) => Err(Error::UnsupportedCapability { capability }),
            Err(e) => Err(Error::remote(QUERY_CAPABILITY, e)),
        }
    }

    /// Obtain the dispatch facet through a capability query.
    pub fn query_dispatch(&self) -> Result<DispatchHandle> {
        self.query_capability(CapabilityId::DISPATCH)
            .map(DispatchHandle::narrow)
    }

    fn same_session(&self, other: &Self) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.session).cast::<()>(),
            Arc::as_ptr(&other.session).cast::<()>(),
        )
    }
}

impl PartialEq for ObjectHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.same_session(other)
    }
}

impl Eq for ObjectHandle {}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectHandle").field("id", &self.id).finish()
    }
}

/// Dispatch facet of a remote object: named get, put and call.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct DispatchHandle(ObjectHandle);

impl DispatchHandle {
    /// Treat `object` as dispatch-capable without a remote round trip.
    ///
    /// Use [`ObjectHandle::query_dispatch`] when the facet is not known to
    /// be present.
    pub fn narrow(object: ObjectHandle) -> Self {
        Self(object)
    }

    pub fn object(&self) -> &ObjectHandle {
        &self.0
    }

    pub fn into_object(self) -> ObjectHandle {
        self.0
    }

    pub fn id(&self) -> ObjectId {
        self.0.id
    }

    pub fn get(&self, name: &str) -> Result<Variant> {
        log::trace!("[session] #{} get {}", self.0.id, name);
        self.0
            .session
            .get_property(self.0.id, name)
            .map_err(|e| Error::remote(name, e))
    }

    pub fn put(&self, name: &str, value: Variant) -> Result<()> {
        log::trace!("[session] #{} put {}", self.0.id, name);
        self.0
            .session
            .put_property(self.0.id, name, value)
            .map_err(|e| Error::remote(name, e))
    }

    pub fn call(&self, name: &str, args: Vec<Variant>) -> Result<Vec<Variant>> {
        log::trace!("[session] #{} call {} ({} args)", self.0.id, name, args.len());
        self.0
            .session
            .call_method(self.0.id, name, args)
            .map_err(|e| Error::remote(name, e))
    }
}

/// Enumerator facet of a remote object.
#[derive(Clone, Debug)]
pub struct EnumeratorHandle(ObjectHandle);

impl EnumeratorHandle {
    pub fn narrow(object: ObjectHandle) -> Self {
        Self(object)
    }

    pub fn id(&self) -> ObjectId {
        self.0.id
    }

    /// Raw batch fetch.
    ///
    /// The transport error is returned untouched so the caller can tell
    /// end of sequence apart from real failures.
    pub fn next_batch(&self, count: u32) -> core::result::Result<Vec<Variant>, TransportError> {
        log::trace!("[session] #{} next({})", self.0.id, count);
        self.0.session.fetch_batch(self.0.id, count)
    }
}
