//! Transformation-name resolution
//!
//! A transformation is either `"alg"` or `"alg/mode/padding"`. Resolution
//! turns it into the ordered list of registry keys to probe, each paired with
//! the mode and padding that must still be applied to the engine once an
//! entry under that key is found.

use core::fmt;

use xform_api::{Error, Result};

/// Decomposed transformation string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transform {
    algorithm: String,
    mode: Option<String>,
    padding: Option<String>,
}

impl Transform {
    /// Split a transformation string into its components.
    ///
    /// Segments are trimmed and an empty mode or padding segment counts as
    /// absent. Everything after the third `/` is folded verbatim into the
    /// padding, so `"A/B/C/D"` has padding `"C/D"`.
    pub fn parse(transformation: &str) -> Result<Self> {
        let malformed = |reason| Error::MalformedTransformation {
            transformation: transformation.to_string(),
            reason,
        };

        if transformation.trim().is_empty() {
            return Err(malformed("no transformation given"));
        }

        let mut parts = transformation.splitn(3, '/');
        let algorithm = parts.next().unwrap_or_default().trim();
        let mode = parts.next();
        let padding = parts.next();

        let (mode, padding) = match (mode, padding) {
            (None, _) => (None, None),
            (Some(_), None) => {
                return Err(malformed("expected \"algorithm\" or \"algorithm/mode/padding\""))
            }
            (Some(m), Some(p)) => (non_empty(m), non_empty(p)),
        };

        if algorithm.is_empty() {
            return Err(malformed("algorithm not specified"));
        }

        Ok(Self {
            algorithm: algorithm.to_string(),
            mode,
            padding,
        })
    }

    /// Algorithm component, the part before the first `/`
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn mode(&self) -> Option<&str> {
        self.mode.as_deref()
    }

    pub fn padding(&self) -> Option<&str> {
        self.padding.as_deref()
    }

    /// Registry keys to probe, most specific first.
    pub fn candidates(&self) -> Vec<Candidate> {
        let alg = &self.algorithm;
        match (&self.mode, &self.padding) {
            (None, None) => vec![Candidate::new(alg.clone(), None, None)],
            (Some(mode), Some(pad)) => vec![
                Candidate::new(format!("{}/{}/{}", alg, mode, pad), None, None),
                Candidate::new(format!("{}/{}", alg, mode), None, Some(pad.clone())),
                Candidate::new(format!("{}//{}", alg, pad), Some(mode.clone()), None),
                Candidate::new(alg.clone(), Some(mode.clone()), Some(pad.clone())),
            ],
            (Some(mode), None) => vec![
                Candidate::new(format!("{}/{}", alg, mode), None, None),
                Candidate::new(alg.clone(), Some(mode.clone()), None),
            ],
            (None, Some(pad)) => vec![
                Candidate::new(format!("{}//{}", alg, pad), None, None),
                Candidate::new(alg.clone(), None, Some(pad.clone())),
            ],
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.mode, &self.padding) {
            (None, None) => f.write_str(&self.algorithm),
            (mode, pad) => write!(
                f,
                "{}/{}/{}",
                self.algorithm,
                mode.as_deref().unwrap_or(""),
                pad.as_deref().unwrap_or("")
            ),
        }
    }
}

fn non_empty(segment: &str) -> Option<String> {
    let trimmed = segment.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// One registry key to probe, with the components still to apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    key: String,
    apply_mode: Option<String>,
    apply_padding: Option<String>,
}

impl Candidate {
    fn new(key: String, apply_mode: Option<String>, apply_padding: Option<String>) -> Self {
        Self {
            key,
            apply_mode,
            apply_padding,
        }
    }

    /// Exact registry key, compared case-sensitively
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Mode to set on the engine after instantiation
    pub fn apply_mode(&self) -> Option<&str> {
        self.apply_mode.as_deref()
    }

    /// Padding to set on the engine after instantiation
    pub fn apply_padding(&self) -> Option<&str> {
        self.apply_padding.as_deref()
    }
}
