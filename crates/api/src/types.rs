//! Value types passed across the dispatcher/engine seam
//!
//! Keys, parameters and randomness are modeled only as far as the dispatcher
//! needs them: engines receive them, the dispatcher never interprets key bytes.

use core::fmt;
use core::ops::Deref;
use rand::{CryptoRng, RngCore};
use xform_internal::constant_time::ct_eq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{Error, Result};

/// Operation a facade is initialized for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OperationMode {
    Encrypt,
    Decrypt,
    WrapKey,
    UnwrapKey,
}

impl OperationMode {
    /// Numeric code of the mode (1..=4)
    pub fn code(self) -> i32 {
        match self {
            Self::Encrypt => 1,
            Self::Decrypt => 2,
            Self::WrapKey => 3,
            Self::UnwrapKey => 4,
        }
    }

    /// True for the data-processing modes that accept update/finalize
    pub fn is_data_mode(self) -> bool {
        matches!(self, Self::Encrypt | Self::Decrypt)
    }

    /// True when the engine produces ciphertext in this mode
    pub fn is_encrypting(self) -> bool {
        matches!(self, Self::Encrypt | Self::WrapKey)
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::Encrypt => "encryption",
            Self::Decrypt => "decryption",
            Self::WrapKey => "key wrapping",
            Self::UnwrapKey => "key unwrapping",
        }
    }
}

impl TryFrom<i32> for OperationMode {
    type Error = Error;

    fn try_from(code: i32) -> Result<Self> {
        match code {
            1 => Ok(Self::Encrypt),
            2 => Ok(Self::Decrypt),
            3 => Ok(Self::WrapKey),
            4 => Ok(Self::UnwrapKey),
            _ => Err(Error::invalid_parameter(
                "operation mode",
                format!("invalid operation mode {}", code),
            )),
        }
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Kind of key material a wrapped key unwraps into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KeyType {
    Public,
    Private,
    Secret,
}

impl TryFrom<i32> for KeyType {
    type Error = Error;

    fn try_from(code: i32) -> Result<Self> {
        match code {
            1 => Ok(Self::Public),
            2 => Ok(Self::Private),
            3 => Ok(Self::Secret),
            _ => Err(Error::invalid_parameter(
                "key type",
                format!("invalid key type {}", code),
            )),
        }
    }
}

/// Key material, zeroed when dropped
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub(crate) struct SecretVec {
    data: Vec<u8>,
}

impl SecretVec {
    pub(crate) fn from_slice(slice: &[u8]) -> Self {
        Self {
            data: slice.to_vec(),
        }
    }
}

impl AsRef<[u8]> for SecretVec {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl Deref for SecretVec {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl PartialEq for SecretVec {
    fn eq(&self, other: &Self) -> bool {
        ct_eq(&self.data, &other.data)
    }
}

impl Eq for SecretVec {}

impl fmt::Debug for SecretVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretVec({})[REDACTED]", self.data.len())
    }
}

/// Opaque key handed to engines
///
/// The dispatcher reads only the kind, algorithm and format; the encoded
/// material is for the engine.
#[derive(Clone, PartialEq, Eq)]
pub struct Key {
    key_type: KeyType,
    algorithm: String,
    format: Option<String>,
    encoded: SecretVec,
}

impl Key {
    /// Raw-format secret key
    pub fn secret(algorithm: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            key_type: KeyType::Secret,
            algorithm: algorithm.into(),
            format: Some("RAW".to_string()),
            encoded: SecretVec::from_slice(bytes),
        }
    }

    /// Key of any kind with an explicit encoding format
    pub fn new(
        key_type: KeyType,
        algorithm: impl Into<String>,
        format: Option<String>,
        encoded: &[u8],
    ) -> Self {
        Self {
            key_type,
            algorithm: algorithm.into(),
            format,
            encoded: SecretVec::from_slice(encoded),
        }
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("key_type", &self.key_type)
            .field("algorithm", &self.algorithm)
            .field("format", &self.format)
            .field("encoded", &self.encoded)
            .finish()
    }
}

/// Transparent parameter specification
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParameterSpec {
    /// Initialization vector for chaining and counter modes
    Iv(Vec<u8>),
    /// GCM nonce plus authentication tag length in bits
    Gcm { tag_len_bits: usize, iv: Vec<u8> },
}

impl ParameterSpec {
    pub fn iv(&self) -> &[u8] {
        match self {
            Self::Iv(iv) => iv,
            Self::Gcm { iv, .. } => iv,
        }
    }
}

/// Opaque parameter handle as produced by an engine
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlgorithmParameters {
    algorithm: String,
    spec: ParameterSpec,
}

impl AlgorithmParameters {
    pub fn new(algorithm: impl Into<String>, spec: ParameterSpec) -> Self {
        Self {
            algorithm: algorithm.into(),
            spec,
        }
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// The transparent specification behind this handle
    pub fn spec(&self) -> &ParameterSpec {
        &self.spec
    }
}

/// Parameters as supplied to an engine's init
#[derive(Debug, Clone, Copy)]
pub enum EngineParams<'a> {
    Spec(&'a ParameterSpec),
    Opaque(&'a AlgorithmParameters),
}

impl<'a> EngineParams<'a> {
    /// Resolve either form to the transparent specification
    pub fn spec(self) -> &'a ParameterSpec {
        match self {
            Self::Spec(spec) => spec,
            Self::Opaque(params) => params.spec(),
        }
    }
}

/// Randomness source accepted by engine initialization
pub trait SecureRandom: RngCore + CryptoRng {}

impl<T: RngCore + CryptoRng> SecureRandom for T {}
