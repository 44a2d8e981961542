//! Chaining modes and padding schemes of the AES engine

use core::fmt;

use xform_api::{Error, Result};

/// Block chaining mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockMode {
    Ecb,
    Cbc,
    Ctr,
}

impl BlockMode {
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_uppercase().as_str() {
            "ECB" => Ok(Self::Ecb),
            "CBC" => Ok(Self::Cbc),
            "CTR" => Ok(Self::Ctr),
            _ => Err(Error::no_such_algorithm(format!(
                "AES mode {} not supported",
                name
            ))),
        }
    }

    /// Whether the mode takes an IV
    pub fn uses_iv(self) -> bool {
        !matches!(self, Self::Ecb)
    }

    /// Whether input must be processed in whole blocks
    pub fn is_block_aligned(self) -> bool {
        !matches!(self, Self::Ctr)
    }
}

impl fmt::Display for BlockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ecb => "ECB",
            Self::Cbc => "CBC",
            Self::Ctr => "CTR",
        })
    }
}

/// Padding scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Padding {
    NoPadding,
    /// PKCS#5 padding, extended to 16-byte blocks (PKCS#7)
    Pkcs5,
}

impl Padding {
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_uppercase().as_str() {
            "NOPADDING" => Ok(Self::NoPadding),
            "PKCS5PADDING" => Ok(Self::Pkcs5),
            _ => Err(Error::NoSuchPadding {
                padding: name.to_string(),
            }),
        }
    }
}

impl fmt::Display for Padding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoPadding => "NoPadding",
            Self::Pkcs5 => "PKCS5Padding",
        })
    }
}
