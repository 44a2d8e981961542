//! Engine contracts implemented by pluggable providers
//!
//! - [`engine`]: the cipher transform engine driven by the `Cipher` facade
//! - [`mac`]: the message authentication engine driven by the `Mac` facade

pub mod engine;
pub mod mac;

pub use engine::TransformEngine;
pub use mac::MacEngine;
