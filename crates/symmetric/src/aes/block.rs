//! Key-size dispatch over the RustCrypto AES implementations

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes128, Aes192, Aes256};

use xform_api::{validate, Error, Result};

use crate::keys::AES_KEY_SIZES;

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;

/// Expanded AES key of any supported size
#[derive(Clone)]
pub(crate) enum BlockKey {
    Aes128(Aes128),
    Aes192(Aes192),
    Aes256(Aes256),
}

impl BlockKey {
    pub(crate) fn new(key: &[u8]) -> Result<Self> {
        validate::key_length("AES", key.len(), &AES_KEY_SIZES)?;
        let invalid = |_| Error::invalid_key("AES", "key schedule rejected key");
        Ok(match key.len() {
            16 => Self::Aes128(Aes128::new_from_slice(key).map_err(invalid)?),
            24 => Self::Aes192(Aes192::new_from_slice(key).map_err(invalid)?),
            _ => Self::Aes256(Aes256::new_from_slice(key).map_err(invalid)?),
        })
    }

    pub(crate) fn encrypt(&self, block: &mut [u8; BLOCK_SIZE]) {
        let block = GenericArray::from_mut_slice(block);
        match self {
            Self::Aes128(c) => c.encrypt_block(block),
            Self::Aes192(c) => c.encrypt_block(block),
            Self::Aes256(c) => c.encrypt_block(block),
        }
    }

    pub(crate) fn decrypt(&self, block: &mut [u8; BLOCK_SIZE]) {
        let block = GenericArray::from_mut_slice(block);
        match self {
            Self::Aes128(c) => c.decrypt_block(block),
            Self::Aes192(c) => c.decrypt_block(block),
            Self::Aes256(c) => c.decrypt_block(block),
        }
    }
}
