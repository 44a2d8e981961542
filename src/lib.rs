//! # xform
//!
//! A provider-agnostic cryptographic transformation dispatcher.
//!
//! Callers request a transformation by name (`"AES/CBC/PKCS5Padding"`,
//! `"AES/GCM/NoPadding"`); a priority-ordered provider registry picks the
//! engine, and the [`Cipher`] facade drives it through a strict
//! init/update/finalize lifecycle.
//!
//! ## Usage
//!
//! ```ignore
//! use xform::prelude::*;
//!
//! let key = Key::secret("AES", &[0u8; 16]);
//! let mut cipher = Cipher::get_instance(xform::default_context(), "AES/GCM/NoPadding")?;
//! cipher.init(OperationMode::Encrypt, &key)?;
//! cipher.update_aad(b"header")?;
//! let sealed = cipher.finalize_with(b"attack at dawn")?;
//! ```
//!
//! ## Features
//!
//! - `builtin` (default): install the `XForm` provider (AES, AES-GCM,
//!   HmacSHA256) into [`default_context`]
//! - `serde`: serialization of value types and configuration
//! - `full`: all features enabled
//!
//! ## Crate Structure
//!
//! This is a facade crate that re-exports functionality from its sub-crates:
//!
//! - [`xform-api`]: error taxonomy, engine traits, providers and value types
//! - [`xform-cipher`]: name resolution, registry, facades and stream adapters
//! - [`xform-symmetric`]: the built-in engines

#![forbid(unsafe_code)]

// Core re-exports (always available)
pub use xform_api as api;
pub use xform_cipher as dispatch;
pub use xform_internal as internal;

#[cfg(feature = "builtin")]
pub use xform_symmetric as symmetric;

pub use xform_api::{Error, Key, KeyType, OperationMode, ParameterSpec, Provider, Result};
pub use xform_cipher::{Cipher, CryptoContext, Mac, ProviderRegistry};

use std::sync::Arc;

use once_cell::sync::Lazy;

static DEFAULT: Lazy<CryptoContext> = Lazy::new(|| {
    let registry = Arc::new(ProviderRegistry::new());
    install_builtin(&registry);
    CryptoContext::new(registry)
});

/// Context with the built-in provider installed and no key-size limits.
///
/// Unlike [`CryptoContext::global`], which starts empty, this context is
/// ready for use. Both are process-wide; providers added to one are not
/// visible through the other.
pub fn default_context() -> &'static CryptoContext {
    &DEFAULT
}

/// Append the built-in provider to `registry`.
///
/// Returns its 1-based position, or `None` when a provider of the same
/// name is already installed. Without the `builtin` feature this does
/// nothing.
pub fn install_builtin(registry: &ProviderRegistry) -> Option<usize> {
    #[cfg(feature = "builtin")]
    {
        let position = registry.add_provider(xform_symmetric::provider());
        tracing::debug!(?position, "installed built-in provider");
        position
    }
    #[cfg(not(feature = "builtin"))]
    {
        let _ = registry;
        None
    }
}

/// Common imports for xform users
pub mod prelude {
    // Re-export error types
    pub use crate::api::{Error, Result};

    // Re-export engine contracts
    pub use crate::api::{EngineParams, MacEngine, SecureRandom, TransformEngine};

    // Re-export value types
    pub use crate::api::{
        AlgorithmParameters, Certificate, Key, KeyType, KeyUsage, OperationMode, ParameterSpec,
        Provider, Service, ServiceType,
    };

    // Re-export facades and configuration
    pub use crate::dispatch::{
        ByteBuffer, Cipher, CipherReader, CipherWriter, CryptoContext, CryptoPolicy, Mac,
        ProviderRegistry, StreamConfig,
    };

    pub use crate::default_context;
}
