//! Certificate view used by certificate-based initialization
//!
//! Certificate parsing lives outside this crate. The dispatcher only needs the
//! subject public key and, for X.509 certificates, the critical extension set
//! and key-usage bits.

use crate::Key;

/// OID of the X.509 key usage extension
pub const KEY_USAGE_OID: &str = "2.5.29.15";

/// Kind of certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateKind {
    X509,
    Other(String),
}

/// X.509 key usage bits, in RFC 5280 order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyUsage {
    bits: [bool; 9],
}

impl KeyUsage {
    pub const DIGITAL_SIGNATURE: usize = 0;
    pub const NON_REPUDIATION: usize = 1;
    pub const KEY_ENCIPHERMENT: usize = 2;
    pub const DATA_ENCIPHERMENT: usize = 3;
    pub const KEY_AGREEMENT: usize = 4;

    pub fn from_bits(bits: [bool; 9]) -> Self {
        Self { bits }
    }

    /// Usage with only the given bit positions set
    pub fn with(positions: &[usize]) -> Self {
        let mut bits = [false; 9];
        for &p in positions {
            if p < bits.len() {
                bits[p] = true;
            }
        }
        Self { bits }
    }

    pub fn allows(&self, position: usize) -> bool {
        self.bits.get(position).copied().unwrap_or(false)
    }
}

/// Certificate carrying a public key
#[derive(Debug, Clone)]
pub struct Certificate {
    kind: CertificateKind,
    public_key: Key,
    critical_extensions: Vec<String>,
    key_usage: Option<KeyUsage>,
}

impl Certificate {
    pub fn x509(public_key: Key) -> Self {
        Self {
            kind: CertificateKind::X509,
            public_key,
            critical_extensions: Vec::new(),
            key_usage: None,
        }
    }

    pub fn other(kind: impl Into<String>, public_key: Key) -> Self {
        Self {
            kind: CertificateKind::Other(kind.into()),
            public_key,
            critical_extensions: Vec::new(),
            key_usage: None,
        }
    }

    /// Attach a key usage extension, optionally marked critical
    pub fn with_key_usage(mut self, usage: KeyUsage, critical: bool) -> Self {
        self.key_usage = Some(usage);
        if critical && !self.critical_extensions.iter().any(|o| o == KEY_USAGE_OID) {
            self.critical_extensions.push(KEY_USAGE_OID.to_string());
        }
        self
    }

    pub fn kind(&self) -> &CertificateKind {
        &self.kind
    }

    pub fn public_key(&self) -> &Key {
        &self.public_key
    }

    pub fn critical_extensions(&self) -> &[String] {
        &self.critical_extensions
    }

    pub fn key_usage(&self) -> Option<&KeyUsage> {
        self.key_usage.as_ref()
    }

    /// Key usage that must be honored: X.509 with a critical key usage extension
    pub fn enforced_key_usage(&self) -> Option<&KeyUsage> {
        if self.kind != CertificateKind::X509 {
            return None;
        }
        if !self.critical_extensions.iter().any(|o| o == KEY_USAGE_OID) {
            return None;
        }
        self.key_usage.as_ref()
    }
}
