//! Error type definitions for dispatcher and engine operations

use thiserror::Error;

/// Primary error type for transformation dispatch and engine operations
///
/// Variants fall into two groups. [`Error::ShortBuffer`] is the only
/// recoverable condition: it carries the capacity the caller must supply on
/// retry. Every other variant is fatal for the call that raised it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The transformation string could not be decomposed
    #[error("malformed transformation '{transformation}': {reason}")]
    MalformedTransformation {
        transformation: String,
        reason: &'static str,
    },

    /// No registered engine accepted the request
    #[error("no such algorithm: {algorithm}")]
    NoSuchAlgorithm {
        algorithm: String,
        #[source]
        source: Option<Box<Error>>,
    },

    /// The algorithm exists but not with the requested padding
    #[error("padding not supported: {padding}")]
    NoSuchPadding { padding: String },

    /// A provider was pinned by name but is not registered
    #[error("no such provider: {provider}")]
    NoSuchProvider { provider: String },

    /// A provider was pinned by name but failed verification
    #[error("cannot authenticate provider {provider}")]
    UntrustedProvider { provider: String },

    /// The key is unusable for this engine or operation
    #[error("invalid key: {context}: {message}")]
    InvalidKey {
        context: &'static str,
        message: String,
    },

    /// The algorithm parameters are unusable for this engine
    #[error("invalid algorithm parameter: {context}: {message}")]
    InvalidAlgorithmParameter {
        context: &'static str,
        message: String,
    },

    /// An argument outside its domain (operation mode, key type, range)
    #[error("{context}: {message}")]
    InvalidParameter {
        context: &'static str,
        message: String,
    },

    /// Lifecycle contract violation
    #[error("illegal state: {context}")]
    IllegalState { context: &'static str },

    /// Output capacity too small; retry with at least `required` bytes
    #[error("output buffer too short: need {required} bytes, have {available}")]
    ShortBuffer { required: usize, available: usize },

    /// Unpadded input length is not a multiple of the block size
    #[error("illegal block size: {context}: {message}")]
    IllegalBlockSize {
        context: &'static str,
        message: String,
    },

    /// Padding bytes are malformed
    #[error("bad padding: {context}")]
    BadPadding { context: &'static str },

    /// Authentication tag mismatch
    #[error("tag mismatch: {algorithm}")]
    AeadBadTag { algorithm: &'static str },

    /// The bound engine does not implement this capability
    #[error("{operation} is not supported by this engine")]
    UnsupportedOperation { operation: &'static str },

    /// Engine-internal failure
    #[error("provider error: {context}: {message}")]
    Provider {
        context: &'static str,
        message: String,
    },
}

/// Result type for dispatcher and engine operations
pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    /// Shorthand for [`Error::InvalidKey`]
    pub fn invalid_key(context: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidKey {
            context,
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::InvalidAlgorithmParameter`]
    pub fn invalid_algorithm_parameter(context: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidAlgorithmParameter {
            context,
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::InvalidParameter`]
    pub fn invalid_parameter(context: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            context,
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::IllegalBlockSize`]
    pub fn illegal_block_size(context: &'static str, message: impl Into<String>) -> Self {
        Self::IllegalBlockSize {
            context,
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::IllegalState`]
    pub fn illegal_state(context: &'static str) -> Self {
        Self::IllegalState { context }
    }

    /// Shorthand for [`Error::UnsupportedOperation`]
    pub fn unsupported(operation: &'static str) -> Self {
        Self::UnsupportedOperation { operation }
    }

    /// Shorthand for [`Error::NoSuchAlgorithm`] without a cause
    pub fn no_such_algorithm(algorithm: impl Into<String>) -> Self {
        Self::NoSuchAlgorithm {
            algorithm: algorithm.into(),
            source: None,
        }
    }

    /// True for padding failures, including the AEAD tag mismatch subtype
    pub fn is_bad_padding(&self) -> bool {
        matches!(self, Self::BadPadding { .. } | Self::AeadBadTag { .. })
    }

    /// True only for failures the caller can retry with more output space
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ShortBuffer { .. })
    }

    /// Capacity a retry needs, for recoverable errors
    pub fn required_capacity(&self) -> Option<usize> {
        match self {
            Self::ShortBuffer { required, .. } => Some(*required),
            _ => None,
        }
    }

    /// True for failures of cryptographic validation on finalize
    pub fn is_crypto_failure(&self) -> bool {
        self.is_bad_padding() || matches!(self, Self::IllegalBlockSize { .. })
    }
}
