// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Tagged variant value.

use crate::error::{Error, Result};
use crate::session::ObjectHandle;
use std::fmt;

/// Active tag of a [`Variant`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantTag {
    Empty,
    Int,
    Str,
    Object,
    Array,
}

impl fmt::Display for VariantTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Empty => "empty",
            Self::Int => "integer",
            Self::Str => "string",
            Self::Object => "object",
            Self::Array => "array",
        };
        f.write_str(name)
    }
}

/// A value that can cross the session boundary.
#[derive(Clone, PartialEq)]
pub enum Variant {
    /// Placeholder for an omitted optional argument. Only legal as input.
    Empty,
    Int(i32),
    Str(String),
    /// Handle to another remote object.
    Object(ObjectHandle),
    Array(Vec<Variant>),
}

impl Variant {
    /// Omitted optional argument.
    pub const fn optional_param() -> Self {
        Self::Empty
    }

    pub fn tag(&self) -> VariantTag {
        match self {
            Self::Empty => VariantTag::Empty,
            Self::Int(_) => VariantTag::Int,
            Self::Str(_) => VariantTag::Str,
            Self::Object(_) => VariantTag::Object,
            Self::Array(_) => VariantTag::Array,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    fn mismatch(&self, expected: VariantTag) -> Error {
        Error::TypeMismatch {
            member: None,
            expected,
            found: self.tag(),
        }
    }

    pub fn as_int(&self) -> Result<i32> {
        match self {
            Self::Int(v) => Ok(*v),
            other => Err(other.mismatch(VariantTag::Int)),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Self::Str(s) => Ok(s),
            other => Err(other.mismatch(VariantTag::Str)),
        }
    }

    pub fn as_object(&self) -> Result<&ObjectHandle> {
        match self {
            Self::Object(h) => Ok(h),
            other => Err(other.mismatch(VariantTag::Object)),
        }
    }

    pub fn as_array(&self) -> Result<&[Variant]> {
        match self {
            Self::Array(items) => Ok(items),
            other => Err(other.mismatch(VariantTag::Array)),
        }
    }

    pub fn into_string(self) -> Result<String> {
        match self {
            Self::Str(s) => Ok(s),
            other => Err(other.mismatch(VariantTag::Str)),
        }
    }

    pub fn into_object(self) -> Result<ObjectHandle> {
        match self {
            Self::Object(h) => Ok(h),
            other => Err(other.mismatch(VariantTag::Object)),
        }
    }

    pub fn into_array(self) -> Result<Vec<Variant>> {
        match self {
            Self::Array(items) => Ok(items),
            other => Err(other.mismatch(VariantTag::Array)),
        }
    }
}

impl fmt::Debug for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Empty"),
            Self::Int(v) => write!(f, "Int({})", v),
            Self::Str(s) => write!(f, "Str({:?})", s),
            Self::Object(h) => write!(f, "Object(#{})", h.id()),
            Self::Array(items) => f.debug_list().entries(items).finish(),
        }
    }
}

impl From<i32> for Variant {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<String> for Variant {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<&str> for Variant {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<ObjectHandle> for Variant {
    fn from(h: ObjectHandle) -> Self {
        Self::Object(h)
    }
}

impl From<Vec<Variant>> for Variant {
    fn from(items: Vec<Variant>) -> Self {
        Self::Array(items)
    }
}
