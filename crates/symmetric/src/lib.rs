//! Built-in engines for the xform dispatcher
//!
//! This crate implements the engines behind the `XForm` provider: the AES
//! block cipher in ECB, CBC and CTR modes with optional PKCS#5 padding,
//! AES-GCM authenticated encryption, and HMAC-SHA256. Engines are thin
//! adapters over the RustCrypto `aes`, `aes-gcm` and `hmac` crates; this
//! crate only adds the mode, padding and buffering logic the
//! [`TransformEngine`](xform_api::TransformEngine) contract asks for.
//!
//! Install the provider into a registry with
//! `registry.add_provider(xform_symmetric::provider())`.

#![forbid(unsafe_code)]

pub mod aead;
pub mod aes;
mod keys;
pub mod mac;

use xform_api::provider::{SUPPORTED_KEY_FORMATS, SUPPORTED_MODES, SUPPORTED_PADDINGS};
use xform_api::{EngineFactory, MacEngine, Provider, Service, TransformEngine};

pub use crate::aead::gcm::GcmEngine;
pub use crate::aes::{AesEngine, BlockMode, Padding};
pub use crate::mac::HmacSha256Engine;

/// Name the built-in provider registers under
pub const PROVIDER_NAME: &str = "XForm";

/// The built-in provider
pub fn provider() -> Provider {
    Provider::builder(PROVIDER_NAME)
        .version(env!("CARGO_PKG_VERSION"))
        .info("AES (ECB, CBC, CTR), AES-GCM and HMAC-SHA256")
        .service(
            Service::new(
                "AES",
                EngineFactory::cipher(|| {
                    Ok(Box::new(AesEngine::new()) as Box<dyn TransformEngine>)
                }),
            )
            .with_attribute(SUPPORTED_MODES, "ECB|CBC|CTR")
            .with_attribute(SUPPORTED_PADDINGS, "NOPADDING|PKCS5PADDING")
            .with_attribute(SUPPORTED_KEY_FORMATS, "RAW"),
        )
        .service(
            Service::new(
                "AES/GCM/NoPadding",
                EngineFactory::cipher(|| {
                    Ok(Box::new(GcmEngine::new()) as Box<dyn TransformEngine>)
                }),
            )
            .with_attribute(SUPPORTED_KEY_FORMATS, "RAW"),
        )
        .service(
            Service::new(
                "HmacSHA256",
                EngineFactory::mac(|| {
                    Ok(Box::new(HmacSha256Engine::new()) as Box<dyn MacEngine>)
                }),
            )
            .with_attribute(SUPPORTED_KEY_FORMATS, "RAW"),
        )
        .build()
}
