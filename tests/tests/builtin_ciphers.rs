//! The built-in AES engines driven through the cipher facade

use xform::default_context;
use xform_api::{Error, Key, KeyType, OperationMode, ParameterSpec};
use xform_cipher::{Cipher, Lifecycle};
use xform_tests::{aes_key, builtin_context, cipher, gcm_spec, iv_spec, run_chunked};

#[test]
fn hello_world_pads_to_two_blocks() {
    let ctx = builtin_context();
    let key = aes_key(16);
    let zero_iv = ParameterSpec::Iv(vec![0; 16]);

    let mut enc = cipher(&ctx, "AES/CBC/PKCS5Padding", OperationMode::Encrypt, &key, Some(&zero_iv));
    let first = enc.update(b"HELLO WORLD!!!!!").unwrap().unwrap();
    assert_eq!(first.len(), 16);
    let last = enc.finalize().unwrap();
    assert_eq!(last.len(), 16);

    let ciphertext = [first, last].concat();
    let mut dec = cipher(&ctx, "AES/CBC/PKCS5Padding", OperationMode::Decrypt, &key, Some(&zero_iv));
    let plain = dec.finalize_with(&ciphertext).unwrap();
    assert_eq!(plain, b"HELLO WORLD!!!!!");
}

#[test]
fn every_mode_round_trips_through_the_facade() {
    let ctx = builtin_context();
    let data: Vec<u8> = (0..=200u8).collect();
    let cases = [
        ("AES", None),
        ("AES/ECB/PKCS5Padding", None),
        ("AES/CBC/PKCS5Padding", Some(iv_spec(1))),
        ("AES/CTR/NoPadding", Some(iv_spec(2))),
        ("AES/GCM/NoPadding", Some(gcm_spec(3))),
    ];
    for key_len in [16, 24, 32] {
        let key = aes_key(key_len);
        for (transformation, spec) in &cases {
            let mut enc = cipher(&ctx, transformation, OperationMode::Encrypt, &key, spec.as_ref());
            let sealed = run_chunked(&mut enc, &data, 13).unwrap();
            let mut dec = cipher(&ctx, transformation, OperationMode::Decrypt, &key, spec.as_ref());
            let opened = run_chunked(&mut dec, &sealed, 7).unwrap();
            assert_eq!(opened, data, "{} with {}-byte key", transformation, key_len);
        }
    }
}

#[test]
fn ciphertext_lengths_follow_the_mode() {
    let ctx = builtin_context();
    let key = aes_key(16);
    for len in [0usize, 1, 15, 16, 17, 32] {
        let data = vec![0xabu8; len];

        let mut padded = cipher(&ctx, "AES/CBC/PKCS5Padding", OperationMode::Encrypt, &key, Some(&iv_spec(0)));
        assert_eq!(padded.finalize_with(&data).unwrap().len(), (len / 16 + 1) * 16);

        let mut ctr = cipher(&ctx, "AES/CTR/NoPadding", OperationMode::Encrypt, &key, Some(&iv_spec(0)));
        assert_eq!(ctr.finalize_with(&data).unwrap().len(), len);

        let mut gcm = cipher(&ctx, "AES/GCM/NoPadding", OperationMode::Encrypt, &key, Some(&gcm_spec(len as u8)));
        assert_eq!(gcm.finalize_with(&data).unwrap().len(), len + 16);
    }
}

#[test]
fn cbc_facade_matches_sp800_38a() {
    let ctx = builtin_context();
    let key = Key::secret("AES", &hex::decode("2b7e151628aed2a6abf7158809cf4f3c").unwrap());
    let iv = ParameterSpec::Iv(hex::decode("000102030405060708090a0b0c0d0e0f").unwrap());
    let plaintext = hex::decode("6bc1bee22e409f96e93d7e117393172aae2d8a571e03ac9c9eb76fac45af8e51").unwrap();

    let mut enc = cipher(&ctx, "AES/CBC/NoPadding", OperationMode::Encrypt, &key, Some(&iv));
    assert_eq!(
        hex::encode(run_chunked(&mut enc, &plaintext, 5).unwrap()),
        "7649abac8119b246cee98e9b12e9197d5086cb9b507219ee95db113a917678b2"
    );
}

#[test]
fn gcm_aad_and_tag() {
    let ctx = builtin_context();
    let key = aes_key(32);
    let spec = gcm_spec(9);

    let mut enc = cipher(&ctx, "AES/GCM/NoPadding", OperationMode::Encrypt, &key, Some(&spec));
    enc.update_aad(b"header").unwrap();
    // the AEAD engine releases nothing before finalize
    assert_eq!(enc.update(b"secret message").unwrap(), Some(Vec::new()));
    let sealed = enc.finalize().unwrap();

    let mut dec = cipher(&ctx, "AES/GCM/NoPadding", OperationMode::Decrypt, &key, Some(&spec));
    dec.update_aad(b"header").unwrap();
    assert_eq!(dec.finalize_with(&sealed).unwrap(), b"secret message");

    let mut tampered = sealed.clone();
    let last = tampered.len() - 1;
    tampered[last] ^= 0x80;
    dec.update_aad(b"header").unwrap();
    let err = dec.finalize_with(&tampered).unwrap_err();
    assert!(matches!(err, Error::AeadBadTag { .. }));
    assert!(err.is_bad_padding());
    assert_eq!(dec.lifecycle(), Lifecycle::Finalized);

    // the failed finalize reset the operation; a clean retry succeeds
    dec.update_aad(b"header").unwrap();
    assert_eq!(dec.finalize_with(&sealed).unwrap(), b"secret message");
}

#[test]
fn gcm_refuses_iv_reuse_and_stale_encryption() {
    let ctx = builtin_context();
    let key = aes_key(16);
    let spec = gcm_spec(4);

    let mut enc = cipher(&ctx, "AES/GCM/NoPadding", OperationMode::Encrypt, &key, Some(&spec));
    enc.finalize_with(b"one").unwrap();
    assert!(matches!(enc.update(b"two"), Err(Error::IllegalState { .. })));
    assert!(matches!(
        enc.init_with_spec(OperationMode::Encrypt, &key, &spec),
        Err(Error::InvalidAlgorithmParameter { .. })
    ));
    assert_eq!(enc.lifecycle(), Lifecycle::Uninitialized);

    enc.init_with_spec(OperationMode::Encrypt, &key, &gcm_spec(5)).unwrap();
    assert_eq!(enc.finalize_with(b"two").unwrap().len(), 3 + 16);
}

#[test]
fn generated_parameters_decrypt() {
    let ctx = builtin_context();
    let key = aes_key(16);
    for transformation in ["AES/CBC/PKCS5Padding", "AES/GCM/NoPadding"] {
        let mut enc = Cipher::get_instance(&ctx, transformation).unwrap();
        enc.init(OperationMode::Encrypt, &key).unwrap();
        let params = enc.parameters().unwrap().unwrap();
        let sealed = enc.finalize_with(b"generated").unwrap();

        let mut dec = Cipher::get_instance(&ctx, transformation).unwrap();
        dec.init_with_parameters(OperationMode::Decrypt, &key, &params)
            .unwrap();
        assert_eq!(dec.finalize_with(&sealed).unwrap(), b"generated");
        assert_eq!(dec.iv().unwrap(), enc.iv().unwrap());
    }
}

#[test]
fn decrypting_without_parameters_is_rejected() {
    let ctx = builtin_context();
    let mut dec = Cipher::get_instance(&ctx, "AES/CBC/PKCS5Padding").unwrap();
    assert!(matches!(
        dec.init(OperationMode::Decrypt, &aes_key(16)),
        Err(Error::InvalidAlgorithmParameter { .. })
    ));
}

#[test]
fn padding_and_block_size_failures() {
    let ctx = builtin_context();
    let key = aes_key(16);

    let mut unpadded = cipher(&ctx, "AES/ECB/NoPadding", OperationMode::Encrypt, &key, None);
    assert!(matches!(
        unpadded.finalize_with(&[0; 20]),
        Err(Error::IllegalBlockSize { .. })
    ));

    let mut raw = cipher(&ctx, "AES/ECB/NoPadding", OperationMode::Encrypt, &key, None);
    let garbage = raw.finalize_with(&[0xff; 16]).unwrap();
    let mut dec = cipher(&ctx, "AES/ECB/PKCS5Padding", OperationMode::Decrypt, &key, None);
    assert!(dec.finalize_with(&garbage).unwrap_err().is_bad_padding());
}

#[test]
fn ctr_rejects_padding() {
    let ctx = builtin_context();
    assert!(matches!(
        Cipher::get_instance(&ctx, "AES/CTR/PKCS5Padding"),
        Err(Error::NoSuchPadding { .. })
    ));
}

#[test]
fn keys_wrap_under_aes() {
    let ctx = builtin_context();
    let kek = aes_key(32);
    let secret = Key::secret("HmacSHA256", &[0x33; 40]);

    let mut wrapper = cipher(&ctx, "AES/CBC/PKCS5Padding", OperationMode::WrapKey, &kek, Some(&iv_spec(6)));
    let wrapped = wrapper.wrap(&secret).unwrap();
    assert!(matches!(
        wrapper.update(b"data"),
        Err(Error::IllegalState { .. })
    ));

    let mut unwrapper = cipher(&ctx, "AES/CBC/PKCS5Padding", OperationMode::UnwrapKey, &kek, Some(&iv_spec(6)));
    let recovered = unwrapper
        .unwrap(&wrapped, "HmacSHA256", KeyType::Secret)
        .unwrap();
    assert_eq!(recovered, secret);
    assert!(matches!(
        unwrapper.wrap(&secret),
        Err(Error::IllegalState { .. })
    ));
}

#[test]
fn default_context_serves_builtin_transformations() {
    let cipher = Cipher::get_instance(default_context(), "AES/GCM/NoPadding").unwrap();
    assert_eq!(cipher.provider().unwrap().name(), xform_symmetric::PROVIDER_NAME);
    assert_eq!(cipher.block_size().unwrap(), 16);
}
