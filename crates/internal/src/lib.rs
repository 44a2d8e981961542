//! Internal helpers for the xform crates
//!
//! Not part of the public API; the signatures here may change between patch
//! releases.

#![forbid(unsafe_code)]

pub mod block;
pub mod constant_time;

pub use constant_time::{ct_eq, pkcs7_pad_len};
