// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for proxy dispatch and the session collaborator contract.

use crate::config::{CapabilityId, END_OF_SEQUENCE_CODE};
use crate::variant::VariantTag;
use std::fmt;

/// Convenient alias for results produced by proxies and the gateway.
pub type Result<T> = core::result::Result<T, Error>;

/// Failure reported by a [`Session`](crate::Session) implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Enumerator has no more elements (S_FALSE on `Next`).
    ///
    /// Absorbed by the enumeration bridge; never surfaces from a proxy.
    EndOfSequence,

    /// Remote side rejected the call with a status code.
    Remote { code: i32, message: String },

    /// Session is gone (connection dropped, object released).
    Disconnected(String),
}

impl TransportError {
    /// Map a raw remote status code to a transport error.
    pub fn from_code(code: i32, message: impl Into<String>) -> Self {
        if code == END_OF_SEQUENCE_CODE {
            Self::EndOfSequence
        } else {
            Self::Remote {
                code,
                message: message.into(),
            }
        }
    }

    /// Raw status code, if the remote side supplied one.
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::EndOfSequence => Some(END_OF_SEQUENCE_CODE),
            Self::Remote { code, .. } => Some(*code),
            Self::Disconnected(_) => None,
        }
    }

    pub fn is_end_of_sequence(&self) -> bool {
        matches!(self, Self::EndOfSequence)
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EndOfSequence => write!(f, "end of sequence"),
            Self::Remote { code, message } => {
                write!(f, "remote error 0x{:08X}", *code as u32)?;
                if !message.is_empty() {
                    write!(f, ": {}", message)?;
                }
                Ok(())
            }
            Self::Disconnected(msg) => write!(f, "session disconnected: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

/// Errors returned by proxy members, the marshaller and the factory.
#[derive(Debug)]
pub enum Error {
    // ========================================================================
    // Marshalling Errors
    // ========================================================================
    /// Variant tag disagrees with the requested primitive type.
    TypeMismatch {
        member: Option<String>,
        expected: VariantTag,
        found: VariantTag,
    },
    /// Declared return type has no unmarshalling rule.
    UnsupportedReturnType {
        member: Option<String>,
        type_name: String,
    },
    /// Local argument value has no variant representation.
    UnsupportedArgument {
        member: Option<String>,
        type_name: String,
    },
    /// Argument list length differs from the member descriptor.
    ArgumentCount {
        member: String,
        expected: usize,
        found: usize,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Remote object does not expose the requested facet.
    UnsupportedCapability { capability: CapabilityId },
    /// Iteration requested on a contract that declares no element type.
    NotIterable { contract: &'static str },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Remote protocol returned a shape that violates its own contract.
    AssertionFailure(String),
    /// Remote call failed for any reason other than end of sequence.
    RemoteCallFailure {
        member: String,
        source: TransportError,
    },

    // ========================================================================
    // Other Errors
    // ========================================================================
    /// Operation is not part of the proxy protocol (e.g. iterator removal).
    UnsupportedOperation(&'static str),
}

impl Error {
    pub(crate) fn remote(member: impl Into<String>, source: TransportError) -> Self {
        Self::RemoteCallFailure {
            member: member.into(),
            source,
        }
    }

    /// Attach a member name to a marshalling error that has none yet.
    pub fn in_member(mut self, name: &str) -> Self {
        match &mut self {
            Self::TypeMismatch { member, .. }
            | Self::UnsupportedReturnType { member, .. }
            | Self::UnsupportedArgument { member, .. } => {
                if member.is_none() {
                    *member = Some(name.to_string());
                }
            }
            _ => {}
        }
        self
    }

    /// True for coverage gaps and protocol violations that a retry cannot fix.
    pub fn is_defect(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedReturnType { .. }
                | Self::UnsupportedArgument { .. }
                | Self::UnsupportedCapability { .. }
                | Self::AssertionFailure(_)
        )
    }

    /// Transport error behind a remote call failure, if any.
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            Self::RemoteCallFailure { source, .. } => Some(source),
            _ => None,
        }
    }
}

fn write_member(f: &mut fmt::Formatter<'_>, member: &Option<String>) -> fmt::Result {
    match member {
        Some(name) => write!(f, " (member {})", name),
        None => Ok(()),
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TypeMismatch {
                member,
                expected,
                found,
            } => {
                write!(f, "Type mismatch: expected {}, got {}", expected, found)?;
                write_member(f, member)
            }
            Error::UnsupportedReturnType { member, type_name } => {
                write!(f, "Unsupported return type: {}", type_name)?;
                write_member(f, member)
            }
            Error::UnsupportedArgument { member, type_name } => {
                write!(f, "Unsupported argument type: {}", type_name)?;
                write_member(f, member)
            }
            Error::ArgumentCount {
                member,
                expected,
                found,
            } => write!(
                f,
                "Member {} takes {} argument(s), {} supplied",
                member, expected, found
            ),
            Error::UnsupportedCapability { capability } => {
                write!(f, "Remote object does not expose capability {}", capability)
            }
            Error::NotIterable { contract } => {
                write!(f, "Contract {} declares no element type", contract)
            }
            Error::AssertionFailure(msg) => write!(f, "Protocol assertion failed: {}", msg),
            Error::RemoteCallFailure { member, source } => {
                write!(f, "Remote call {} failed: {}", member, source)
            }
            Error::UnsupportedOperation(op) => write!(f, "Unsupported operation: {}", op),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::RemoteCallFailure { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_code_recognizes_end_of_sequence() {
        assert_eq!(
            TransportError::from_code(END_OF_SEQUENCE_CODE, "ignored"),
            TransportError::EndOfSequence
        );
        let err = TransportError::from_code(0x8001_0108_u32 as i32, "object disconnected");
        assert!(!err.is_end_of_sequence());
        assert_eq!(err.code(), Some(0x8001_0108_u32 as i32));
    }

    #[test]
    fn in_member_fills_missing_context_only() {
        let err = Error::TypeMismatch {
            member: None,
            expected: VariantTag::Int,
            found: VariantTag::Str,
        }
        .in_member("Count")
        .in_member("Other");
        match err {
            Error::TypeMismatch { member, .. } => assert_eq!(member.as_deref(), Some("Count")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn remote_failure_exposes_source() {
        use std::error::Error as _;
        let err = Error::remote(
            "ExecQuery",
            TransportError::Remote {
                code: -2147217392,
                message: "Invalid class".into(),
            },
        );
        assert!(err.source().is_some());
        assert!(!err.is_defect());
        assert!(err.to_string().contains("ExecQuery"));
    }

    #[test]
    fn coverage_gaps_are_defects() {
        assert!(Error::AssertionFailure("batch".into()).is_defect());
        assert!(Error::UnsupportedReturnType {
            member: None,
            type_name: "f64".into()
        }
        .is_defect());
        assert!(!Error::UnsupportedOperation("remove").is_defect());
    }
}
