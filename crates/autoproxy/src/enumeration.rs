// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Adapter from the remote batch enumerator to pull-based iteration.
//!
//! A collection object hands out an enumerator through its `_NewEnum`
//! property. The bridge asks it for one element per round trip and keeps at
//! most one decoded element buffered:
//!
//! ```text
//! Ready --fetch ok--> Buffered(value) --consume--> Ready
//! Ready --end of sequence / failure--> Exhausted (terminal)
//! ```
//!
//! `has_next` only fetches from `Ready`, so repeated calls are a peek.
//! The sequence is single-pass: a new iteration request opens a new
//! enumerator.

use crate::config::{CapabilityId, ENUM_FETCH_BATCH, ENUM_NEXT_METHOD};
use crate::contract::{FromValue, Value, ValueType};
use crate::error::{Error, Result, TransportError};
use crate::marshal::unmarshal_result;
use crate::proxy::ProxyFactory;
use crate::session::{DispatchHandle, EnumeratorHandle};
use crate::variant::Variant;
use std::iter::FusedIterator;
use std::marker::PhantomData;

enum Cursor {
    Ready,
    Buffered(Box<Value>),
    Exhausted,
}

/// Untyped, forward-only sequence over a remote collection.
pub struct RemoteEnumeration {
    enumerator: EnumeratorHandle,
    element: ValueType,
    factory: ProxyFactory,
    cursor: Cursor,
}

impl RemoteEnumeration {
    /// Acquire a fresh enumerator from `source` and bind it to `element`.
    pub(crate) fn open(
        source: &DispatchHandle,
        property: &str,
        element: ValueType,
        factory: ProxyFactory,
    ) -> Result<Self> {
        let object = source
            .get(property)?
            .into_object()
            .map_err(|e| e.in_member(property))?;
        let enumerator =
            EnumeratorHandle::narrow(object.query_capability(CapabilityId::ENUM_VARIANT)?);
        log::debug!(
            "[enum] #{} opened enumerator #{} over {}",
            source.id(),
            enumerator.id(),
            element
        );
        Ok(Self {
            enumerator,
            element,
            factory,
            cursor: Cursor::Ready,
        })
    }

    pub fn element_type(&self) -> ValueType {
        self.element
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.cursor, Cursor::Exhausted)
    }

    /// True if another element is available. Does not consume it.
    pub fn has_next(&mut self) -> Result<bool> {
        self.fetch()?;
        Ok(matches!(self.cursor, Cursor::Buffered(_)))
    }

    /// Consume the next element; `None` once the sequence has ended.
    pub fn next_value(&mut self) -> Result<Option<Value>> {
        self.fetch()?;
        match std::mem::replace(&mut self.cursor, Cursor::Ready) {
            Cursor::Buffered(value) => Ok(Some(*value)),
            state => {
                self.cursor = state;
                Ok(None)
            }
        }
    }

    /// Removal is not part of the enumerator protocol.
    pub fn remove(&mut self) -> Result<()> {
        Err(Error::UnsupportedOperation("remove during remote enumeration"))
    }

    fn fetch(&mut self) -> Result<()> {
        if !matches!(self.cursor, Cursor::Ready) {
            return Ok(());
        }
        match self.pull() {
            Ok(Some(value)) => {
                self.cursor = Cursor::Buffered(Box::new(value));
                Ok(())
            }
            Ok(None) => {
                log::trace!("[enum] #{} end of sequence", self.enumerator.id());
                self.cursor = Cursor::Exhausted;
                Ok(())
            }
            Err(e) => {
                self.cursor = Cursor::Exhausted;
                Err(e)
            }
        }
    }

    fn pull(&self) -> Result<Option<Value>> {
        let batch = match self.enumerator.next_batch(ENUM_FETCH_BATCH) {
            Ok(batch) => batch,
            Err(TransportError::EndOfSequence) => return Ok(None),
            Err(e) => {
                log::warn!("[enum] #{} fetch failed: {}", self.enumerator.id(), e);
                return Err(Error::remote(ENUM_NEXT_METHOD, e));
            }
        };
        match decode_batch(batch)? {
            Some(variant) => unmarshal_result(variant, &self.element, &self.factory)
                .map(Some)
                .map_err(|e| e.in_member(ENUM_NEXT_METHOD)),
            None => Ok(None),
        }
    }
}

/// Unpack a single-element reply: `[Array([element]), fetched]`.
fn decode_batch(batch: Vec<Variant>) -> Result<Option<Variant>> {
    if batch.is_empty() {
        return Ok(None);
    }
    if batch.len() != 2 {
        log::warn!("[enum] enumerator replied with {} values", batch.len());
        return Err(Error::AssertionFailure(format!(
            "enumerator replied with {} values, expected 2",
            batch.len()
        )));
    }
    let mut batch = batch;
    let elements = match batch.swap_remove(0) {
        Variant::Array(items) => items,
        other => {
            return Err(Error::AssertionFailure(format!(
                "enumerator element slot holds {}, expected array",
                other.tag()
            )))
        }
    };
    if elements.len() != 1 {
        log::warn!("[enum] enumerator returned {} elements", elements.len());
        return Err(Error::AssertionFailure(format!(
            "enumerator returned {} elements for a batch of {}",
            elements.len(),
            ENUM_FETCH_BATCH
        )));
    }
    Ok(elements.into_iter().next())
}

impl Iterator for RemoteEnumeration {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_value().transpose()
    }
}

impl FusedIterator for RemoteEnumeration {}

/// Typed sequence over a remote collection.
pub struct Elements<T> {
    inner: RemoteEnumeration,
    _marker: PhantomData<fn() -> T>,
}

impl<T: FromValue> Elements<T> {
    pub fn new(inner: RemoteEnumeration) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    pub fn has_next(&mut self) -> Result<bool> {
        self.inner.has_next()
    }

    pub fn next_element(&mut self) -> Result<Option<T>> {
        self.inner.next_value()?.map(T::from_value).transpose()
    }

    pub fn remove(&mut self) -> Result<()> {
        self.inner.remove()
    }

    pub fn into_inner(self) -> RemoteEnumeration {
        self.inner
    }
}

impl<T: FromValue> Iterator for Elements<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_element().transpose()
    }
}

impl<T: FromValue> FusedIterator for Elements<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_batch_is_end_of_sequence() {
        assert!(decode_batch(Vec::new()).unwrap().is_none());
    }

    #[test]
    fn well_formed_batch_yields_element() {
        let batch = vec![Variant::Array(vec![Variant::from("a")]), Variant::Int(1)];
        assert_eq!(decode_batch(batch).unwrap(), Some(Variant::from("a")));
    }

    #[test]
    fn wrong_reply_length_is_an_assertion_failure() {
        let err = decode_batch(vec![Variant::Array(vec![Variant::Int(1)])]).unwrap_err();
        assert!(matches!(err, Error::AssertionFailure(_)));
    }

    #[test]
    fn multi_element_array_is_an_assertion_failure() {
        let batch = vec![
            Variant::Array(vec![Variant::Int(1), Variant::Int(2)]),
            Variant::Int(2),
        ];
        assert!(matches!(
            decode_batch(batch).unwrap_err(),
            Error::AssertionFailure(_)
        ));
    }

    #[test]
    fn cursor_keeps_buffered_value_behind_a_pointer() {
        // Value::Enumeration holds a cursor, so the buffer must be indirect
        assert!(std::mem::size_of::<Cursor>() <= 2 * std::mem::size_of::<usize>());
        assert!(std::mem::size_of::<Cursor>() < std::mem::size_of::<Value>());
    }

    #[test]
    fn non_array_slot_is_an_assertion_failure() {
        let batch = vec![Variant::Int(7), Variant::Int(1)];
        assert!(matches!(
            decode_batch(batch).unwrap_err(),
            Error::AssertionFailure(_)
        ));
    }
}
