//! Key-strength policy and certificate key usage

use std::sync::Arc;

use xform_api::{Certificate, Error, KeyUsage, OperationMode};
use xform_cipher::{Cipher, ConfiguredPolicy, CryptoContext, PolicyConfig, ProviderRegistry};
use xform_tests::{aes_key, iv_spec};

fn limited_context() -> CryptoContext {
    let registry = Arc::new(ProviderRegistry::new());
    xform::install_builtin(&registry);
    let policy = ConfiguredPolicy::new(PolicyConfig::default().with_limit("AES", 128));
    CryptoContext::new(registry).with_policy(Arc::new(policy))
}

#[test]
fn policy_caps_key_sizes() {
    let ctx = limited_context();
    assert_eq!(
        Cipher::max_allowed_key_length(&ctx, "AES/GCM/NoPadding").unwrap(),
        128
    );
    assert_eq!(
        Cipher::max_allowed_key_length(&ctx, "Blowfish").unwrap(),
        usize::MAX
    );

    let mut cipher = Cipher::get_instance(&ctx, "AES/CBC/PKCS5Padding").unwrap();
    assert!(matches!(
        cipher.init(OperationMode::Encrypt, &aes_key(32)),
        Err(Error::InvalidKey { .. })
    ));
    assert!(matches!(
        cipher.init_with_spec(OperationMode::Encrypt, &aes_key(32), &iv_spec(0)),
        Err(Error::InvalidAlgorithmParameter { .. })
    ));
    cipher.init(OperationMode::Encrypt, &aes_key(16)).unwrap();
}

#[test]
fn malformed_name_is_reported_by_policy_query() {
    assert!(matches!(
        Cipher::max_allowed_key_length(&limited_context(), "AES/CBC"),
        Err(Error::MalformedTransformation { .. })
    ));
}

#[test]
fn critical_key_usage_is_enforced() {
    let ctx = limited_context();
    let signing_only = Certificate::x509(aes_key(16))
        .with_key_usage(KeyUsage::with(&[KeyUsage::DIGITAL_SIGNATURE]), true);

    let mut cipher = Cipher::get_instance(&ctx, "AES").unwrap();
    assert_eq!(
        cipher.init_with_certificate(OperationMode::Encrypt, &signing_only),
        Err(Error::invalid_key("certificate", "wrong key usage"))
    );
    assert!(matches!(
        cipher.init_with_certificate(OperationMode::WrapKey, &signing_only),
        Err(Error::InvalidKey { .. })
    ));
    // decryption is not restricted by key usage
    cipher
        .init_with_certificate(OperationMode::Decrypt, &signing_only)
        .unwrap();

    let data_only = Certificate::x509(aes_key(16))
        .with_key_usage(KeyUsage::with(&[KeyUsage::DATA_ENCIPHERMENT]), true);
    cipher
        .init_with_certificate(OperationMode::Encrypt, &data_only)
        .unwrap();
    assert!(cipher
        .init_with_certificate(OperationMode::WrapKey, &data_only)
        .is_err());
}

#[test]
fn non_critical_or_foreign_usage_is_ignored() {
    let ctx = limited_context();
    let mut cipher = Cipher::get_instance(&ctx, "AES").unwrap();

    let non_critical = Certificate::x509(aes_key(16))
        .with_key_usage(KeyUsage::with(&[KeyUsage::DIGITAL_SIGNATURE]), false);
    cipher
        .init_with_certificate(OperationMode::Encrypt, &non_critical)
        .unwrap();

    let foreign = Certificate::other("PGP", aes_key(16))
        .with_key_usage(KeyUsage::with(&[]), true);
    cipher
        .init_with_certificate(OperationMode::WrapKey, &foreign)
        .unwrap();
}
