//! Transformation dispatch for the xform library
//!
//! This crate resolves transformation strings against a priority-ordered
//! provider registry, binds the facades ([`Cipher`], [`Mac`]) to engines, and
//! adapts them to cursor buffers and `std::io` streams.
//!
//! # Example
//!
//! ```ignore
//! let context = CryptoContext::global();
//! let mut cipher = Cipher::get_instance(context, "AES/CBC/PKCS5Padding")?;
//! cipher.init(OperationMode::Encrypt, &key)?;
//! let ciphertext = cipher.finalize_with(b"attack at dawn")?;
//! ```

#![forbid(unsafe_code)]

pub mod buffer;
pub mod cipher;
pub mod config;
pub mod context;
pub mod locator;
pub mod mac;
pub mod policy;
pub mod registry;
pub mod stream;
pub mod transform;

pub use buffer::ByteBuffer;
pub use cipher::{Cipher, Lifecycle};
pub use config::{StreamConfig, DEFAULT_CHUNK_SIZE};
pub use context::CryptoContext;
pub use mac::Mac;
pub use policy::{ConfiguredPolicy, CryptoPolicy, PolicyConfig, UnlimitedPolicy};
pub use registry::{AllowList, Entry, ProviderRegistry, ProviderVerifier, Support, TrustAll};
pub use stream::{CipherReader, CipherWriter, ReadState};
pub use transform::{Candidate, Transform};

#[cfg(test)]
pub(crate) mod testing;
