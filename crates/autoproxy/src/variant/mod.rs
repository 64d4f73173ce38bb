// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Variant values exchanged with the remote object.
//!
//! A [`Variant`] is the only payload that crosses the session boundary:
//! arguments are marshalled into variants, results are unmarshalled out of
//! them. Extraction never coerces between tags; conversions belong to the
//! marshaller.
//!
//! # Example
//!
//! ```rust
//! use autoproxy::{Variant, VariantTag};
//!
//! let v = Variant::from("Win32_Process");
//! assert_eq!(v.tag(), VariantTag::Str);
//! assert_eq!(v.as_str().unwrap(), "Win32_Process");
//! assert!(v.as_int().is_err());
//! ```

mod value;

pub use value::{Variant, VariantTag};
