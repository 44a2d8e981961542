//! Public API traits and types for the xform dispatcher
//!
//! This crate provides the contract shared by the dispatcher and the engines it
//! drives: the error taxonomy, the engine traits, provider/service descriptors,
//! and the key, parameter and certificate value types passed across that seam.

#![forbid(unsafe_code)]

pub mod cert;
pub mod error;
pub mod provider;
pub mod traits;
pub mod types;

// Re-export commonly used items at the crate level for convenience
pub use error::{validate, Error, Result};
pub use types::*;

pub use cert::{Certificate, CertificateKind, KeyUsage};
pub use provider::{EngineFactory, Provider, ProviderBuilder, Service, ServiceType};
pub use traits::{MacEngine, TransformEngine};

// Re-export trait modules for direct access
pub use traits::{engine, mac};
