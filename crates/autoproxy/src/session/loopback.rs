// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-process session.
//!
//! `LoopbackSession` serves [`LocalObject`]s through the [`Session`] contract
//! without any transport. Every operation bumps a per-kind counter; sessions
//! built with [`LoopbackSession::recording`] also keep a call journal.
//!
//! # Architecture
//!
//! ```text
//! LoopbackSession
//! +-- objects: RwLock<HashMap<ObjectId, Arc<LocalObject>>>
//! +-- enumerators: Mutex<HashMap<ObjectId, VecDeque<Reply>>>  (drained ones retired)
//! +-- journal: Option<Mutex<Vec<CallRecord>>>
//! ```
//!
//! Stored values keep object references as bare ids so that objects never
//! hold a strong reference back to their session.

use super::{ObjectHandle, ObjectId, Session};
use crate::config::{CapabilityId, NEW_ENUM_PROPERTY};
use crate::error::TransportError;
use crate::variant::Variant;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// DISP_E_UNKNOWNNAME
const UNKNOWN_NAME: i32 = 0x8002_0006_u32 as i32;
/// E_NOTIMPL
const NOT_IMPLEMENTED: i32 = 0x8000_4001_u32 as i32;

type MethodFn = dyn Fn(&[Variant]) -> Result<Variant, TransportError> + Send + Sync;
type Reply = Result<Vec<Stored>, TransportError>;

/// Variant with object references detached from the session.
#[derive(Debug, Clone)]
enum Stored {
    Empty,
    Int(i32),
    Str(String),
    Object(ObjectId),
    Array(Vec<Stored>),
}

impl Stored {
    fn detach(v: Variant) -> Self {
        match v {
            Variant::Empty => Self::Empty,
            Variant::Int(i) => Self::Int(i),
            Variant::Str(s) => Self::Str(s),
            Variant::Object(h) => Self::Object(h.id()),
            Variant::Array(items) => Self::Array(items.into_iter().map(Self::detach).collect()),
        }
    }

    fn attach(&self, session: &Arc<dyn Session>) -> Variant {
        match self {
            Self::Empty => Variant::Empty,
            Self::Int(i) => Variant::Int(*i),
            Self::Str(s) => Variant::Str(s.clone()),
            Self::Object(id) => Variant::Object(ObjectHandle::new(*id, Arc::clone(session))),
            Self::Array(items) => Variant::Array(items.iter().map(|s| s.attach(session)).collect()),
        }
    }
}

/// An object hosted by a [`LoopbackSession`].
pub struct LocalObject {
    properties: RwLock<HashMap<String, Stored>>,
    methods: HashMap<String, Box<MethodFn>>,
    enumeration: Option<Vec<Reply>>,
    dispatch: bool,
}

impl LocalObject {
    pub fn new() -> Self {
        Self {
            properties: RwLock::new(HashMap::new()),
            methods: HashMap::new(),
            enumeration: None,
            dispatch: true,
        }
    }

    pub fn property(self, name: impl Into<String>, value: impl Into<Variant>) -> Self {
        self.properties
            .write()
            .insert(name.into(), Stored::detach(value.into()));
        self
    }

    pub fn method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Variant]) -> Result<Variant, TransportError> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Box::new(f));
        self
    }

    /// Expose `items` through `_NewEnum`; the enumerator ends with an empty batch.
    pub fn collection(self, items: Vec<Variant>) -> Self {
        self.collection_ending_with(items, Ok(Vec::new()))
    }

    /// Expose `items` through `_NewEnum`; `end` is the reply after the last element.
    pub fn collection_ending_with(
        self,
        items: Vec<Variant>,
        end: Result<Vec<Variant>, TransportError>,
    ) -> Self {
        let mut replies: Vec<Result<Vec<Variant>, TransportError>> = items
            .into_iter()
            .map(|item| Ok(vec![Variant::Array(vec![item]), Variant::Int(1)]))
            .collect();
        replies.push(end);
        self.enumerator_script(replies)
    }

    /// Raw enumerator replies, served in order. Exhausted scripts reply empty.
    pub fn enumerator_script(mut self, replies: Vec<Result<Vec<Variant>, TransportError>>) -> Self {
        self.enumeration = Some(
            replies
                .into_iter()
                .map(|r| r.map(|batch| batch.into_iter().map(Stored::detach).collect()))
                .collect(),
        );
        self
    }

    /// Object that refuses the dispatch capability query.
    pub fn without_dispatch(mut self) -> Self {
        self.dispatch = false;
        self
    }
}

impl Default for LocalObject {
    fn default() -> Self {
        Self::new()
    }
}

/// Session operation kind, as recorded in the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionOp {
    Get,
    Put,
    Call,
    Query,
    Fetch,
}

/// One journal entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    pub op: SessionOp,
    pub target: ObjectId,
    pub name: String,
    pub arg_count: usize,
}

/// Per-operation call counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub get: u64,
    pub put: u64,
    pub call: u64,
    pub query: u64,
    pub fetch: u64,
}

impl CallCounts {
    pub fn total(&self) -> u64 {
        self.get + self.put + self.call + self.query + self.fetch
    }
}

#[derive(Default)]
struct CallStats {
    get: AtomicU64,
    put: AtomicU64,
    call: AtomicU64,
    query: AtomicU64,
    fetch: AtomicU64,
}

impl CallStats {
    fn counter(&self, op: SessionOp) -> &AtomicU64 {
        match op {
            SessionOp::Get => &self.get,
            SessionOp::Put => &self.put,
            SessionOp::Call => &self.call,
            SessionOp::Query => &self.query,
            SessionOp::Fetch => &self.fetch,
        }
    }

    fn snapshot(&self) -> CallCounts {
        CallCounts {
            get: self.get.load(Ordering::Relaxed),
            put: self.put.load(Ordering::Relaxed),
            call: self.call.load(Ordering::Relaxed),
            query: self.query.load(Ordering::Relaxed),
            fetch: self.fetch.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        for op in [
            SessionOp::Get,
            SessionOp::Put,
            SessionOp::Call,
            SessionOp::Query,
            SessionOp::Fetch,
        ] {
            self.counter(op).store(0, Ordering::Relaxed);
        }
    }
}

/// In-process [`Session`] serving [`LocalObject`]s.
pub struct LoopbackSession {
    this: Weak<LoopbackSession>,
    next_id: AtomicU64,
    objects: RwLock<HashMap<ObjectId, Arc<LocalObject>>>,
    enumerators: Mutex<HashMap<ObjectId, VecDeque<Reply>>>,
    stats: CallStats,
    journal: Option<Mutex<Vec<CallRecord>>>,
}

impl LoopbackSession {
    /// Session with counters only.
    pub fn new() -> Arc<Self> {
        Self::build(None)
    }

    /// Session that also journals every operation, see [`journal`](Self::journal).
    pub fn recording() -> Arc<Self> {
        Self::build(Some(Mutex::new(Vec::new())))
    }

    fn build(journal: Option<Mutex<Vec<CallRecord>>>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            next_id: AtomicU64::new(1),
            objects: RwLock::new(HashMap::new()),
            enumerators: Mutex::new(HashMap::new()),
            stats: CallStats::default(),
            journal,
        })
    }

    fn allocate_id(&self) -> ObjectId {
        ObjectId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn shared(&self) -> Option<Arc<dyn Session>> {
        self.this.upgrade().map(|s| s as Arc<dyn Session>)
    }

    /// Host `object` and return a handle to it.
    pub fn insert(self: &Arc<Self>, object: LocalObject) -> ObjectHandle {
        let id = self.allocate_id();
        self.objects.write().insert(id, Arc::new(object));
        log::debug!("[loopback] hosted object #{}", id);
        self.handle(id)
    }

    /// Handle for `id`, whether or not such an object is hosted.
    pub fn handle(self: &Arc<Self>, id: ObjectId) -> ObjectHandle {
        ObjectHandle::new(id, Arc::clone(self) as Arc<dyn Session>)
    }

    pub fn counts(&self) -> CallCounts {
        self.stats.snapshot()
    }

    /// Recorded operations; always empty unless built with [`recording`](Self::recording).
    pub fn journal(&self) -> Vec<CallRecord> {
        self.journal
            .as_ref()
            .map(|j| j.lock().clone())
            .unwrap_or_default()
    }

    /// Clear counters and journal.
    pub fn reset_counts(&self) {
        self.stats.reset();
        if let Some(journal) = &self.journal {
            journal.lock().clear();
        }
    }

    /// Number of enumerators still holding unserved replies.
    pub fn open_enumerators(&self) -> usize {
        self.enumerators.lock().len()
    }

    fn record(&self, op: SessionOp, target: ObjectId, name: &str, arg_count: usize) {
        self.stats.counter(op).fetch_add(1, Ordering::Relaxed);
        if let Some(journal) = &self.journal {
            journal.lock().push(CallRecord {
                op,
                target,
                name: name.to_string(),
                arg_count,
            });
        }
    }

    /// Issued id that is neither a hosted object nor a live enumerator.
    fn is_retired(&self, id: ObjectId) -> bool {
        id.0 < self.next_id.load(Ordering::Relaxed) && !self.objects.read().contains_key(&id)
    }

    fn object(&self, id: ObjectId) -> Result<Arc<LocalObject>, TransportError> {
        self.objects
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| TransportError::Disconnected(format!("no object #{}", id)))
    }

    fn attach(&self, stored: &Stored) -> Result<Variant, TransportError> {
        let session = self
            .shared()
            .ok_or_else(|| TransportError::Disconnected("session dropped".into()))?;
        Ok(stored.attach(&session))
    }

    fn open_enumerator(&self, script: &[Reply]) -> ObjectId {
        let id = self.allocate_id();
        self.enumerators
            .lock()
            .insert(id, script.iter().cloned().collect());
        log::debug!("[loopback] opened enumerator #{}", id);
        id
    }
}

impl Session for LoopbackSession {
    fn get_property(&self, target: ObjectId, name: &str) -> Result<Variant, TransportError> {
        self.record(SessionOp::Get, target, name, 0);
        let object = self.object(target)?;

        if name == NEW_ENUM_PROPERTY {
            if let Some(script) = &object.enumeration {
                let id = self.open_enumerator(script);
                return self.attach(&Stored::Object(id));
            }
        }

        let stored = object.properties.read().get(name).cloned();
        match stored {
            Some(value) => self.attach(&value),
            None => Err(TransportError::Remote {
                code: UNKNOWN_NAME,
                message: format!("unknown property {}", name),
            }),
        }
    }

    fn put_property(
        &self,
        target: ObjectId,
        name: &str,
        value: Variant,
    ) -> Result<(), TransportError> {
        self.record(SessionOp::Put, target, name, 1);
        let object = self.object(target)?;
        object
            .properties
            .write()
            .insert(name.to_string(), Stored::detach(value));
        Ok(())
    }

    fn call_method(
        &self,
        target: ObjectId,
        name: &str,
        args: Vec<Variant>,
    ) -> Result<Vec<Variant>, TransportError> {
        self.record(SessionOp::Call, target, name, args.len());
        let object = self.object(target)?;
        let method = object.methods.get(name).ok_or_else(|| TransportError::Remote {
            code: UNKNOWN_NAME,
            message: format!("unknown method {}", name),
        })?;
        method(&args).map(|ret| vec![ret])
    }

    fn query_capability(
        &self,
        target: ObjectId,
        capability: CapabilityId,
    ) -> Result<Option<ObjectId>, TransportError> {
        self.record(SessionOp::Query, target, &capability.to_string(), 0);

        if self.enumerators.lock().contains_key(&target) || self.is_retired(target) {
            let supported =
                capability == CapabilityId::ENUM_VARIANT || capability == CapabilityId::UNKNOWN;
            return Ok(supported.then_some(target));
        }

        let object = self.object(target)?;
        let supported = capability == CapabilityId::UNKNOWN
            || (capability == CapabilityId::DISPATCH && object.dispatch);
        Ok(supported.then_some(target))
    }

    fn fetch_batch(
        &self,
        enumerator: ObjectId,
        count: u32,
    ) -> Result<Vec<Variant>, TransportError> {
        self.record(SessionOp::Fetch, enumerator, "Next", count as usize);
        if count == 0 {
            return Err(TransportError::Remote {
                code: NOT_IMPLEMENTED,
                message: "zero-element fetch".into(),
            });
        }

        let reply = {
            let mut enumerators = self.enumerators.lock();
            match enumerators.get_mut(&enumerator) {
                Some(script) => {
                    let reply = script.pop_front().unwrap_or_else(|| Ok(Vec::new()));
                    if script.is_empty() {
                        enumerators.remove(&enumerator);
                        log::debug!("[loopback] retired enumerator #{}", enumerator);
                    }
                    reply
                }
                // drained enumerators keep answering with the end of sequence
                None if self.is_retired(enumerator) => Ok(Vec::new()),
                None => {
                    return Err(TransportError::Disconnected(format!(
                        "no enumerator #{}",
                        enumerator
                    )))
                }
            }
        };

        let batch = reply?;
        batch.iter().map(|s| self.attach(s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_property_reports_remote_error() {
        let session = LoopbackSession::new();
        let obj = session.insert(LocalObject::new());
        let err = session.get_property(obj.id(), "Missing").unwrap_err();
        assert_eq!(err.code(), Some(UNKNOWN_NAME));
    }

    #[test]
    fn object_properties_round_trip_through_ids() {
        let session = LoopbackSession::new();
        let child = session.insert(LocalObject::new().property("Name", "child"));
        let parent = session.insert(LocalObject::new().property("Child", child.clone()));

        let v = session.get_property(parent.id(), "Child").unwrap();
        assert_eq!(v.into_object().unwrap(), child);
    }

    #[test]
    fn enumerator_serves_script_then_empty() {
        let session = LoopbackSession::new();
        let coll = session.insert(LocalObject::new().collection(vec![Variant::Int(5)]));

        let enum_obj = session
            .get_property(coll.id(), NEW_ENUM_PROPERTY)
            .unwrap()
            .into_object()
            .unwrap();
        assert_eq!(
            session
                .query_capability(enum_obj.id(), CapabilityId::ENUM_VARIANT)
                .unwrap(),
            Some(enum_obj.id())
        );

        let first = session.fetch_batch(enum_obj.id(), 1).unwrap();
        assert_eq!(first, vec![Variant::Array(vec![Variant::Int(5)]), Variant::Int(1)]);
        assert!(session.fetch_batch(enum_obj.id(), 1).unwrap().is_empty());
        assert!(session.fetch_batch(enum_obj.id(), 1).unwrap().is_empty());
    }

    #[test]
    fn each_new_enum_gets_a_fresh_cursor() {
        let session = LoopbackSession::new();
        let coll = session.insert(LocalObject::new().collection(vec![Variant::Int(1)]));
        let a = session.get_property(coll.id(), NEW_ENUM_PROPERTY).unwrap();
        let b = session.get_property(coll.id(), NEW_ENUM_PROPERTY).unwrap();
        assert_ne!(a, b);
        assert_eq!(session.fetch_batch(b.as_object().unwrap().id(), 1).unwrap().len(), 2);
    }

    #[test]
    fn counters_and_journal_track_operations() {
        let session = LoopbackSession::recording();
        let obj = session.insert(
            LocalObject::new()
                .property("Count", 3)
                .method("Echo", |args| Ok(args[0].clone())),
        );

        session.get_property(obj.id(), "Count").unwrap();
        session
            .call_method(obj.id(), "Echo", vec![Variant::from("hi")])
            .unwrap();

        let counts = session.counts();
        assert_eq!(counts.get, 1);
        assert_eq!(counts.call, 1);
        assert_eq!(counts.total(), 2);

        let journal = session.journal();
        assert_eq!(journal[1].name, "Echo");
        assert_eq!(journal[1].arg_count, 1);

        session.reset_counts();
        assert_eq!(session.counts(), CallCounts::default());
        assert!(session.journal().is_empty());
    }

    #[test]
    fn journal_is_off_unless_requested() {
        let session = LoopbackSession::new();
        let obj = session.insert(LocalObject::new().property("Count", 3));
        for _ in 0..100 {
            session.get_property(obj.id(), "Count").unwrap();
        }
        assert_eq!(session.counts().get, 100);
        assert!(session.journal().is_empty());
    }

    #[test]
    fn drained_enumerators_are_retired() {
        let session = LoopbackSession::new();
        let empty = session.insert(LocalObject::new().collection(Vec::new()));
        let one = session.insert(LocalObject::new().collection(vec![Variant::Int(1)]));

        for _ in 0..1000 {
            let e = session.get_property(empty.id(), NEW_ENUM_PROPERTY).unwrap();
            let id = e.as_object().unwrap().id();
            assert!(session.fetch_batch(id, 1).unwrap().is_empty());
        }
        assert_eq!(session.open_enumerators(), 0);

        let e = session.get_property(one.id(), NEW_ENUM_PROPERTY).unwrap();
        let id = e.as_object().unwrap().id();
        assert_eq!(session.open_enumerators(), 1);
        assert_eq!(session.fetch_batch(id, 1).unwrap().len(), 2);
        assert_eq!(session.open_enumerators(), 1);
        assert!(session.fetch_batch(id, 1).unwrap().is_empty());
        assert_eq!(session.open_enumerators(), 0);
        // a retired enumerator still reports the end
        assert!(session.fetch_batch(id, 1).unwrap().is_empty());
        assert_eq!(
            session
                .query_capability(id, CapabilityId::ENUM_VARIANT)
                .unwrap(),
            Some(id)
        );
    }

    #[test]
    fn unknown_enumerator_is_disconnected() {
        let session = LoopbackSession::new();
        let err = session.fetch_batch(ObjectId(999), 1).unwrap_err();
        assert!(matches!(err, TransportError::Disconnected(_)));
    }

    #[test]
    fn dispatch_can_be_withheld() {
        let session = LoopbackSession::new();
        let obj = session.insert(LocalObject::new().without_dispatch());
        assert_eq!(
            session
                .query_capability(obj.id(), CapabilityId::DISPATCH)
                .unwrap(),
            None
        );
    }
}
