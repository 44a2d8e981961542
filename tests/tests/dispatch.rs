//! Provider selection across several registered providers

use std::sync::Arc;

use xform_api::{Error, OperationMode};
use xform_cipher::{AllowList, Cipher, CryptoContext, ProviderRegistry};
use xform_tests::{aes_key, context_with, counting_provider, iv_spec, run_chunked};

#[test]
fn exact_registration_beats_provider_priority() {
    let (generic, _) = counting_provider("Generic", "AES", None);
    let (specific, _) = counting_provider("Specific", "AES/CBC/PKCS5Padding", Some(("CBC", "PKCS5Padding")));
    let ctx = context_with(vec![generic, specific]);

    let mut cipher = Cipher::get_instance(&ctx, "AES/CBC/PKCS5Padding").unwrap();
    cipher
        .init_with_spec(OperationMode::Encrypt, &aes_key(16), &iv_spec(0))
        .unwrap();
    assert_eq!(cipher.provider().unwrap().name(), "Specific");

    // a bare algorithm name only matches the generic entry
    let bare = Cipher::get_instance(&ctx, "AES").unwrap();
    assert_eq!(bare.provider().unwrap().name(), "Generic");
}

#[test]
fn generic_entry_gets_mode_and_padding_applied() {
    let (generic, _) = counting_provider("Generic", "AES", None);
    let ctx = context_with(vec![generic, xform_symmetric::provider()]);

    let mut enc = Cipher::get_instance(&ctx, "AES/CTR/NoPadding").unwrap();
    enc.init_with_spec(OperationMode::Encrypt, &aes_key(16), &iv_spec(1))
        .unwrap();
    assert_eq!(enc.provider().unwrap().name(), "Generic");
    // CTR: no expansion, so the generic engine really switched mode
    assert_eq!(enc.finalize_with(&[0; 5]).unwrap().len(), 5);
}

#[test]
fn binding_is_deferred_until_init() {
    let (first, first_count) = counting_provider("First", "AES", None);
    let (second, second_count) = counting_provider("Second", "AES", None);
    let ctx = context_with(vec![first, second]);

    let mut cipher = Cipher::get_instance(&ctx, "AES/CBC/PKCS5Padding").unwrap();
    let probed = first_count.get();
    assert!(probed >= 1);
    assert_eq!(second_count.get(), 0);

    cipher
        .init_with_spec(OperationMode::Encrypt, &aes_key(16), &iv_spec(2))
        .unwrap();
    assert_eq!(cipher.provider().unwrap().name(), "First");
    // init reused the engine probed at lookup
    assert_eq!(first_count.get(), probed);
    assert_eq!(second_count.get(), 0);
}

#[test]
fn init_falls_through_to_a_provider_that_takes_the_key() {
    let (first, _) = counting_provider("First", "AES", None);
    let ctx = context_with(vec![first, xform_symmetric::provider()]);

    // a 20-byte key is rejected by every AES engine: the first key error surfaces
    let mut cipher = Cipher::get_instance(&ctx, "AES").unwrap();
    let bad_key = xform_api::Key::secret("AES", &[0; 20]);
    assert!(matches!(
        cipher.init(OperationMode::Encrypt, &bad_key),
        Err(Error::InvalidKey { .. })
    ));

    // the failed init committed nothing; a good key binds the first provider
    cipher.init(OperationMode::Encrypt, &aes_key(16)).unwrap();
    assert_eq!(cipher.provider().unwrap().name(), "First");
}

#[test]
fn malformed_and_unknown_transformations() {
    let ctx = context_with(vec![xform_symmetric::provider()]);
    for bad in ["", "   ", "AES/CBC", "/CBC/NoPadding"] {
        assert!(
            matches!(
                Cipher::get_instance(&ctx, bad),
                Err(Error::MalformedTransformation { .. })
            ),
            "{:?}",
            bad
        );
    }
    assert!(matches!(
        Cipher::get_instance(&ctx, "Blowfish"),
        Err(Error::NoSuchAlgorithm { .. })
    ));
    assert!(matches!(
        Cipher::get_instance(&ctx, "AES/OFB/NoPadding"),
        Err(Error::NoSuchAlgorithm { .. })
    ));
    assert!(matches!(
        Cipher::get_instance(&ctx, "AES/CBC/ISO10126Padding"),
        Err(Error::NoSuchPadding { .. })
    ));
}

#[test]
fn empty_segments_fall_back_to_defaults() {
    let ctx = context_with(vec![xform_symmetric::provider()]);
    let key = aes_key(16);

    // "AES//" is plain AES: ECB with PKCS5 padding
    let mut implicit = Cipher::get_instance(&ctx, "AES//").unwrap();
    implicit.init(OperationMode::Encrypt, &key).unwrap();
    let mut explicit = Cipher::get_instance(&ctx, "AES/ECB/PKCS5Padding").unwrap();
    explicit.init(OperationMode::Encrypt, &key).unwrap();
    assert_eq!(
        run_chunked(&mut implicit, b"same bytes", 4).unwrap(),
        run_chunked(&mut explicit, b"same bytes", 4).unwrap()
    );
}

#[test]
fn pinned_provider_lookup() {
    let (other, _) = counting_provider("Other", "AES", None);
    let ctx = context_with(vec![other, xform_symmetric::provider()]);

    let pinned = Cipher::get_instance_from(&ctx, "AES/GCM/NoPadding", "XForm").unwrap();
    assert_eq!(pinned.provider().unwrap().name(), "XForm");

    assert!(matches!(
        Cipher::get_instance_from(&ctx, "AES", "Missing"),
        Err(Error::NoSuchProvider { .. })
    ));
    assert!(matches!(
        Cipher::get_instance_from(&ctx, "AES", ""),
        Err(Error::InvalidParameter { .. })
    ));
    assert!(matches!(
        Cipher::get_instance_from(&ctx, "AES/GCM/NoPadding", "Other"),
        Err(Error::NoSuchAlgorithm { .. })
    ));
}

#[test]
fn untrusted_providers_are_skipped() {
    let registry = Arc::new(ProviderRegistry::with_verifier(Arc::new(AllowList::new([
        "XForm",
    ]))));
    let (rogue, rogue_count) = counting_provider("Rogue", "AES", None);
    registry.add_provider(rogue);
    registry.add_provider(xform_symmetric::provider());
    let ctx = CryptoContext::new(registry);

    let mut cipher = Cipher::get_instance(&ctx, "AES").unwrap();
    cipher.init(OperationMode::Encrypt, &aes_key(16)).unwrap();
    assert_eq!(cipher.provider().unwrap().name(), "XForm");
    assert_eq!(rogue_count.get(), 0);

    assert!(matches!(
        Cipher::get_instance_from(&ctx, "AES", "Rogue"),
        Err(Error::UntrustedProvider { .. })
    ));
}

#[test]
fn display_names_mode_and_provider() {
    let ctx = context_with(vec![xform_symmetric::provider()]);
    let mut cipher = Cipher::get_instance(&ctx, "AES/CBC/PKCS5Padding").unwrap();
    cipher
        .init_with_spec(OperationMode::Decrypt, &aes_key(16), &iv_spec(0))
        .unwrap();
    assert_eq!(
        cipher.to_string(),
        "Cipher.AES/CBC/PKCS5Padding, mode: decryption, algorithm from: XForm"
    );
}
