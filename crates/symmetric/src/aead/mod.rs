//! Authenticated encryption engines
//!
//! AEAD engines buffer all input until `finalize`: a decrypting engine must
//! not release plaintext before the tag has been checked, and the encrypting
//! side mirrors that so both directions report the same output sizes.

pub mod gcm;

/// Authentication tag length produced and accepted by the AEAD engines
pub const TAG_LEN: usize = 16;
