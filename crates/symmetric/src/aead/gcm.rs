//! AES-GCM engine for `AES/GCM/NoPadding`

use aes_gcm::aead::consts::U12;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm};
use rand::RngCore;
use tracing::{debug, trace};
use zeroize::Zeroizing;

use xform_api::{
    validate, AlgorithmParameters, EngineParams, Error, Key, KeyType, OperationMode,
    ParameterSpec, Result, SecureRandom, TransformEngine,
};
use xform_internal::ct_eq;

use super::TAG_LEN;
use crate::keys::{aes_key_bytes, as_key_error, unwrapped_key};

/// GCM nonce length in bytes
pub const NONCE_LEN: usize = 12;

const TAG_BITS: usize = TAG_LEN * 8;
const ALGORITHM: &str = "AES/GCM";

type Aes192Gcm = AesGcm<aes::Aes192, U12>;

enum GcmCipher {
    Aes128(Aes128Gcm),
    Aes192(Aes192Gcm),
    Aes256(Aes256Gcm),
}

impl GcmCipher {
    fn new(key: &[u8]) -> Result<Self> {
        let invalid = |_| Error::invalid_key("AES/GCM", "key schedule rejected key");
        Ok(match key.len() {
            16 => Self::Aes128(Aes128Gcm::new_from_slice(key).map_err(invalid)?),
            24 => Self::Aes192(Aes192Gcm::new_from_slice(key).map_err(invalid)?),
            _ => Self::Aes256(Aes256Gcm::new_from_slice(key).map_err(invalid)?),
        })
    }

    fn seal(&self, nonce: &[u8; NONCE_LEN], msg: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        let nonce = GenericArray::from_slice(nonce);
        let payload = Payload { msg, aad };
        match self {
            Self::Aes128(c) => c.encrypt(nonce, payload),
            Self::Aes192(c) => c.encrypt(nonce, payload),
            Self::Aes256(c) => c.encrypt(nonce, payload),
        }
        .map_err(|_| Error::Provider {
            context: ALGORITHM,
            message: "input too long for GCM".to_string(),
        })
    }

    fn open(&self, nonce: &[u8; NONCE_LEN], msg: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        let nonce = GenericArray::from_slice(nonce);
        let payload = Payload { msg, aad };
        match self {
            Self::Aes128(c) => c.decrypt(nonce, payload),
            Self::Aes192(c) => c.decrypt(nonce, payload),
            Self::Aes256(c) => c.decrypt(nonce, payload),
        }
        .map_err(|_| Error::AeadBadTag {
            algorithm: ALGORITHM,
        })
    }
}

/// AES-GCM with a 96-bit nonce and a 128-bit tag.
///
/// Additional data must be supplied before any message data. After an
/// encrypting `finalize` the engine refuses further work until it is
/// re-initialized, and re-initializing for encryption with the key and
/// nonce of the previous encryption is rejected.
pub struct GcmEngine {
    cipher: Option<GcmCipher>,
    encrypting: bool,
    nonce: Option<[u8; NONCE_LEN]>,
    aad: Vec<u8>,
    data: Zeroizing<Vec<u8>>,
    data_started: bool,
    needs_reinit: bool,
    last_encryption: Option<(Zeroizing<Vec<u8>>, [u8; NONCE_LEN])>,
}

impl GcmEngine {
    pub fn new() -> Self {
        Self {
            cipher: None,
            encrypting: false,
            nonce: None,
            aad: Vec::new(),
            data: Zeroizing::new(Vec::new()),
            data_started: false,
            needs_reinit: false,
            last_encryption: None,
        }
    }

    fn clear(&mut self) {
        self.aad.clear();
        self.data.clear();
        self.data_started = false;
    }

    fn check_ready(&self) -> Result<()> {
        validate::state(self.cipher.is_some(), "GCM engine not initialized")?;
        validate::state(
            !self.needs_reinit,
            "GCM encryption finished; re-initialize with a new IV",
        )
    }

    fn resolve_nonce(
        op: OperationMode,
        params: Option<EngineParams<'_>>,
        random: &mut dyn SecureRandom,
    ) -> Result<[u8; NONCE_LEN]> {
        let mut nonce = [0u8; NONCE_LEN];
        match params.map(EngineParams::spec) {
            Some(ParameterSpec::Gcm { tag_len_bits, iv }) => {
                if *tag_len_bits != TAG_BITS {
                    return Err(Error::invalid_algorithm_parameter(
                        ALGORITHM,
                        format!("unsupported tag length {} bits", tag_len_bits),
                    ));
                }
                validate::parameter_length("GCM IV", iv.len(), NONCE_LEN)?;
                nonce.copy_from_slice(iv);
            }
            Some(ParameterSpec::Iv(_)) => {
                return Err(Error::invalid_algorithm_parameter(
                    ALGORITHM,
                    "GCM needs GCM parameters, not a bare IV",
                ));
            }
            None if op.is_encrypting() => {
                random.fill_bytes(&mut nonce);
                trace!("generated random GCM nonce");
            }
            None => {
                return Err(Error::invalid_algorithm_parameter(
                    ALGORITHM,
                    format!("GCM needs parameters for {}", op.describe()),
                ));
            }
        }
        Ok(nonce)
    }
}

impl Default for GcmEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformEngine for GcmEngine {
    fn block_size(&self) -> usize {
        crate::aes::BLOCK_SIZE
    }

    fn output_size(&self, input_len: usize) -> usize {
        let total = self.data.len().saturating_add(input_len);
        if self.encrypting {
            total.saturating_add(TAG_LEN)
        } else {
            total.saturating_sub(TAG_LEN)
        }
    }

    fn iv(&self) -> Option<Vec<u8>> {
        self.nonce.map(|nonce| nonce.to_vec())
    }

    fn parameters(&self) -> Option<AlgorithmParameters> {
        self.nonce.map(|nonce| {
            AlgorithmParameters::new(
                "GCM",
                ParameterSpec::Gcm {
                    tag_len_bits: TAG_BITS,
                    iv: nonce.to_vec(),
                },
            )
        })
    }

    fn init(
        &mut self,
        op: OperationMode,
        key: &Key,
        params: Option<EngineParams<'_>>,
        random: &mut dyn SecureRandom,
    ) -> Result<()> {
        let key_bytes = aes_key_bytes(key)?;
        let cipher = GcmCipher::new(key_bytes)?;
        let nonce = Self::resolve_nonce(op, params, random)?;

        if op.is_encrypting() {
            if let Some((last_key, last_nonce)) = &self.last_encryption {
                if ct_eq(last_key.as_slice(), key_bytes) && *last_nonce == nonce {
                    debug!("refusing GCM key and IV reuse");
                    return Err(Error::invalid_algorithm_parameter(
                        ALGORITHM,
                        "cannot reuse the key and IV of the previous encryption",
                    ));
                }
            }
            self.last_encryption = Some((Zeroizing::new(key_bytes.to_vec()), nonce));
        }

        self.cipher = Some(cipher);
        self.encrypting = op.is_encrypting();
        self.nonce = Some(nonce);
        self.needs_reinit = false;
        self.clear();
        Ok(())
    }

    fn update_aad(&mut self, aad: &[u8]) -> Result<()> {
        self.check_ready()?;
        validate::state(!self.data_started, "AAD must be supplied before data")?;
        self.aad.extend_from_slice(aad);
        Ok(())
    }

    fn update(&mut self, input: &[u8], _output: &mut [u8]) -> Result<usize> {
        self.check_ready()?;
        self.data_started = true;
        self.data.extend_from_slice(input);
        Ok(0)
    }

    fn finalize(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        self.check_ready()?;
        let (cipher, nonce) = match (&self.cipher, self.nonce) {
            (Some(cipher), Some(nonce)) => (cipher, nonce),
            _ => return Err(Error::illegal_state("GCM engine not initialized")),
        };

        let mut msg = Zeroizing::new(Vec::with_capacity(self.data.len() + input.len()));
        msg.extend_from_slice(&self.data);
        msg.extend_from_slice(input);

        if self.encrypting {
            validate::output_capacity(output.len(), msg.len() + TAG_LEN)?;
            let sealed = cipher.seal(&nonce, &msg, &self.aad);
            self.clear();
            let sealed = sealed?;
            output[..sealed.len()].copy_from_slice(&sealed);
            self.needs_reinit = true;
            return Ok(sealed.len());
        }

        if msg.len() < TAG_LEN {
            self.clear();
            return Err(Error::AeadBadTag {
                algorithm: ALGORITHM,
            });
        }
        validate::output_capacity(output.len(), msg.len() - TAG_LEN)?;
        let opened = cipher.open(&nonce, &msg, &self.aad);
        self.clear();
        let plain = Zeroizing::new(opened?);
        output[..plain.len()].copy_from_slice(&plain);
        Ok(plain.len())
    }

    fn wrap(&mut self, key: &Key) -> Result<Vec<u8>> {
        if key.encoded().is_empty() {
            return Err(Error::invalid_key("wrap", "key has no encoding"));
        }
        self.finalize_vec(key.encoded())
            .map_err(|err| as_key_error("wrap", err))
    }

    fn unwrap(&mut self, wrapped: &[u8], algorithm: &str, key_type: KeyType) -> Result<Key> {
        let encoded = Zeroizing::new(
            self.finalize_vec(wrapped)
                .map_err(|err| as_key_error("unwrap", err))?,
        );
        unwrapped_key(&encoded, algorithm, key_type)
    }

    fn key_size(&self, key: &Key) -> Result<usize> {
        Ok(aes_key_bytes(key)?.len() * 8)
    }
}
