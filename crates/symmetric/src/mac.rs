//! HMAC-SHA256 engine

use hmac::{Hmac, Mac};
use sha2::Sha256;

use xform_api::{EngineParams, Error, Key, MacEngine, Result};

type HmacSha256 = Hmac<Sha256>;

/// Tag length of HMAC-SHA256 in bytes
pub const HMAC_SHA256_LEN: usize = 32;

/// HMAC over SHA-256; accepts secret keys of any non-zero length
#[derive(Clone, Default)]
pub struct HmacSha256Engine {
    state: Option<HmacSha256>,
}

impl HmacSha256Engine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MacEngine for HmacSha256Engine {
    fn mac_len(&self) -> usize {
        HMAC_SHA256_LEN
    }

    fn init(&mut self, key: &Key, params: Option<EngineParams<'_>>) -> Result<()> {
        if params.is_some() {
            return Err(Error::invalid_algorithm_parameter(
                "HmacSHA256",
                "HMAC takes no parameters",
            ));
        }
        if key.encoded().is_empty() {
            return Err(Error::invalid_key("HmacSHA256", "empty key"));
        }
        let state = HmacSha256::new_from_slice(key.encoded())
            .map_err(|_| Error::invalid_key("HmacSHA256", "key rejected"))?;
        self.state = Some(state);
        Ok(())
    }

    fn update(&mut self, input: &[u8]) {
        if let Some(state) = self.state.as_mut() {
            state.update(input);
        }
    }

    fn finalize(&mut self) -> Result<Vec<u8>> {
        let state = self
            .state
            .as_mut()
            .ok_or(Error::illegal_state("HMAC engine not initialized"))?;
        Ok(state.finalize_reset().into_bytes().to_vec())
    }

    fn reset(&mut self) {
        if let Some(state) = self.state.as_mut() {
            Mac::reset(state);
        }
    }

    fn duplicate(&self) -> Result<Box<dyn MacEngine>> {
        Ok(Box::new(self.clone()))
    }
}
