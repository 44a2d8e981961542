//! Key checks shared by the AES engines

use xform_api::{validate, Error, Key, KeyType, Result};

/// Accepted AES key lengths in bytes
pub(crate) const AES_KEY_SIZES: [usize; 3] = [16, 24, 32];

/// Raw key material of an AES secret key
pub(crate) fn aes_key_bytes(key: &Key) -> Result<&[u8]> {
    if key.key_type() != KeyType::Secret || !key.algorithm().eq_ignore_ascii_case("AES") {
        return Err(Error::invalid_key(
            "AES",
            format!("not an AES secret key: {}", key.algorithm()),
        ));
    }
    validate::key_length("AES", key.encoded().len(), &AES_KEY_SIZES)?;
    Ok(key.encoded())
}

/// Rebuild a key recovered by unwrapping, in its conventional encoding
pub(crate) fn unwrapped_key(encoded: &[u8], algorithm: &str, key_type: KeyType) -> Result<Key> {
    if encoded.is_empty() {
        return Err(Error::invalid_key("unwrap", "wrapped key is empty"));
    }
    let format = match key_type {
        KeyType::Secret => "RAW",
        KeyType::Public => "X.509",
        KeyType::Private => "PKCS#8",
    };
    Ok(Key::new(key_type, algorithm, Some(format.to_string()), encoded))
}

/// Report a failed wrap or unwrap as a key problem
pub(crate) fn as_key_error(context: &'static str, err: Error) -> Error {
    match err {
        Error::IllegalBlockSize { .. } | Error::BadPadding { .. } | Error::AeadBadTag { .. } => {
            Error::invalid_key(context, err.to_string())
        }
        other => other,
    }
}
