//! AES in ECB, CBC and CTR modes
//!
//! [`AesEngine`] drives the raw block function from [`aes`] through one of
//! three chaining modes, buffering partial blocks between `update` calls.
//! ECB and CBC process whole blocks and optionally apply PKCS#5 padding at
//! `finalize`; CTR is a stream mode and never pads.
//!
//! When decrypting with padding the engine holds back the last complete
//! block until `finalize`, because only then is it known whether that block
//! carries the padding.

mod block;
mod mode;


pub use block::BLOCK_SIZE;
pub use mode::{BlockMode, Padding};

use rand::RngCore;
use tracing::trace;
use zeroize::{Zeroize, Zeroizing};

use xform_api::{
    validate, AlgorithmParameters, EngineParams, Error, Key, KeyType, OperationMode,
    ParameterSpec, Result, SecureRandom, TransformEngine,
};
use xform_internal::block::{floor_blocks, increment_be, xor_in_place, Carry};
use xform_internal::constant_time::pkcs7_pad_len;

use self::block::BlockKey;
use crate::keys::{aes_key_bytes, as_key_error, unwrapped_key};

/// Chaining state between blocks
#[derive(Clone, Copy, Zeroize)]
struct Chain {
    /// CBC: previous ciphertext block. CTR: next counter block.
    register: [u8; BLOCK_SIZE],
    /// CTR: keystream of the last counter block
    keystream: [u8; BLOCK_SIZE],
    /// CTR: keystream bytes already consumed
    used: usize,
}

impl Chain {
    fn start(iv: Option<[u8; BLOCK_SIZE]>) -> Self {
        Self {
            register: iv.unwrap_or([0; BLOCK_SIZE]),
            keystream: [0; BLOCK_SIZE],
            used: BLOCK_SIZE,
        }
    }
}

/// AES engine for the `AES` family of transformations
pub struct AesEngine {
    mode: BlockMode,
    padding: Padding,
    padding_explicit: bool,
    key: Option<BlockKey>,
    encrypting: bool,
    iv: Option<[u8; BLOCK_SIZE]>,
    chain: Chain,
    carry: Carry,
}

impl AesEngine {
    /// A fresh engine in the default `ECB/PKCS5Padding` configuration
    pub fn new() -> Self {
        Self {
            mode: BlockMode::Ecb,
            padding: Padding::Pkcs5,
            padding_explicit: false,
            key: None,
            encrypting: false,
            iv: None,
            chain: Chain::start(None),
            carry: Carry::new(),
        }
    }

    pub fn mode(&self) -> BlockMode {
        self.mode
    }

    pub fn padding(&self) -> Padding {
        self.padding
    }

    /// Back to the post-init state
    fn reset(&mut self) {
        self.chain = Chain::start(self.iv);
        self.carry.clear();
    }

    fn resolve_iv(
        &self,
        op: OperationMode,
        params: Option<EngineParams<'_>>,
        random: &mut dyn SecureRandom,
    ) -> Result<Option<[u8; BLOCK_SIZE]>> {
        let spec = params.map(EngineParams::spec);
        if !self.mode.uses_iv() {
            return match spec {
                None => Ok(None),
                Some(_) => Err(Error::invalid_algorithm_parameter(
                    "AES",
                    "ECB mode takes no parameters",
                )),
            };
        }

        let mut iv = [0u8; BLOCK_SIZE];
        match spec {
            Some(ParameterSpec::Iv(bytes)) => {
                validate::parameter_length("AES IV", bytes.len(), BLOCK_SIZE)?;
                iv.copy_from_slice(bytes);
            }
            Some(ParameterSpec::Gcm { .. }) => {
                return Err(Error::invalid_algorithm_parameter(
                    "AES",
                    format!("GCM parameters given to {} mode", self.mode),
                ));
            }
            None if op.is_encrypting() => {
                random.fill_bytes(&mut iv);
                trace!(mode = %self.mode, "generated random IV");
            }
            None => {
                return Err(Error::invalid_algorithm_parameter(
                    "AES",
                    format!("{} mode needs an IV for {}", self.mode, op.describe()),
                ));
            }
        }
        Ok(Some(iv))
    }
}

impl Default for AesEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AesEngine {
    fn drop(&mut self) {
        self.chain.zeroize();
    }
}

fn not_initialized() -> Error {
    Error::illegal_state("AES engine not initialized")
}

/// XOR `data` with the CTR keystream, continuing mid-block where the last
/// call stopped
fn apply_keystream(cipher: &BlockKey, chain: &mut Chain, data: &mut [u8]) {
    for byte in data.iter_mut() {
        if chain.used == BLOCK_SIZE {
            chain.keystream = chain.register;
            cipher.encrypt(&mut chain.keystream);
            increment_be(&mut chain.register);
            chain.used = 0;
        }
        *byte ^= chain.keystream[chain.used];
        chain.used += 1;
    }
}

/// Run the whole blocks of `data` through ECB or CBC in place
fn crypt_blocks(
    mode: BlockMode,
    encrypting: bool,
    cipher: &BlockKey,
    chain: &mut Chain,
    data: &mut [u8],
) {
    if !mode.is_block_aligned() {
        apply_keystream(cipher, chain, data);
        return;
    }
    let cbc = mode == BlockMode::Cbc;
    for chunk in data.chunks_exact_mut(BLOCK_SIZE) {
        let mut block = [0u8; BLOCK_SIZE];
        block.copy_from_slice(chunk);
        if encrypting {
            if cbc {
                xor_in_place(&mut block, &chain.register);
            }
            cipher.encrypt(&mut block);
            if cbc {
                chain.register = block;
            }
        } else {
            let input = block;
            cipher.decrypt(&mut block);
            if cbc {
                xor_in_place(&mut block, &chain.register);
                chain.register = input;
            }
        }
        chunk.copy_from_slice(&block);
        block.zeroize();
    }
}

/// Complete an operation over `data` (carry plus final input), returning
/// how many leading bytes of `data` are output
fn finish(
    mode: BlockMode,
    padding: Padding,
    encrypting: bool,
    cipher: &BlockKey,
    chain: &mut Chain,
    data: &mut Vec<u8>,
) -> Result<usize> {
    if !mode.is_block_aligned() {
        apply_keystream(cipher, chain, data);
        return Ok(data.len());
    }

    match (encrypting, padding) {
        (true, Padding::Pkcs5) => {
            let pad = BLOCK_SIZE - data.len() % BLOCK_SIZE;
            data.resize(data.len() + pad, pad as u8);
        }
        (false, Padding::Pkcs5) if data.is_empty() => return Ok(0),
        _ => {}
    }
    if data.len() % BLOCK_SIZE != 0 {
        return Err(Error::illegal_block_size(
            "AES",
            format!(
                "input length {} is not a multiple of {} bytes",
                data.len(),
                BLOCK_SIZE
            ),
        ));
    }

    crypt_blocks(mode, encrypting, cipher, chain, data);
    if encrypting || padding == Padding::NoPadding {
        return Ok(data.len());
    }
    let last = &data[data.len() - BLOCK_SIZE..];
    let pad = pkcs7_pad_len(last).ok_or(Error::BadPadding {
        context: "PKCS5 padding",
    })?;
    Ok(data.len() - pad)
}

impl TransformEngine for AesEngine {
    fn set_mode(&mut self, mode: &str) -> Result<()> {
        let mode = BlockMode::parse(mode)?;
        if !mode.is_block_aligned() && self.padding == Padding::Pkcs5 {
            if self.padding_explicit {
                return Err(Error::no_such_algorithm(format!(
                    "AES/{} cannot be combined with {}",
                    mode,
                    Padding::Pkcs5
                )));
            }
            self.padding = Padding::NoPadding;
        }
        self.mode = mode;
        Ok(())
    }

    fn set_padding(&mut self, padding: &str) -> Result<()> {
        let parsed = Padding::parse(padding)?;
        if parsed == Padding::Pkcs5 && !self.mode.is_block_aligned() {
            return Err(Error::NoSuchPadding {
                padding: format!("{} in {} mode", padding, self.mode),
            });
        }
        self.padding = parsed;
        self.padding_explicit = true;
        Ok(())
    }

    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn output_size(&self, input_len: usize) -> usize {
        let total = self.carry.len().saturating_add(input_len);
        if self.encrypting && self.padding == Padding::Pkcs5 && self.mode.is_block_aligned() {
            floor_blocks(total, BLOCK_SIZE).saturating_add(BLOCK_SIZE)
        } else {
            total
        }
    }

    fn iv(&self) -> Option<Vec<u8>> {
        self.iv.map(|iv| iv.to_vec())
    }

    fn parameters(&self) -> Option<AlgorithmParameters> {
        self.iv
            .map(|iv| AlgorithmParameters::new("AES", ParameterSpec::Iv(iv.to_vec())))
    }

    fn init(
        &mut self,
        op: OperationMode,
        key: &Key,
        params: Option<EngineParams<'_>>,
        random: &mut dyn SecureRandom,
    ) -> Result<()> {
        let cipher = BlockKey::new(aes_key_bytes(key)?)?;
        let iv = self.resolve_iv(op, params, random)?;

        self.key = Some(cipher);
        self.encrypting = op.is_encrypting();
        self.iv = iv;
        self.reset();
        trace!(mode = %self.mode, padding = %self.padding, op = op.describe(), "AES engine initialized");
        Ok(())
    }

    fn update(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let cipher = self.key.as_ref().ok_or_else(not_initialized)?;

        if !self.mode.is_block_aligned() {
            validate::output_capacity(output.len(), input.len())?;
            let out = &mut output[..input.len()];
            out.copy_from_slice(input);
            apply_keystream(cipher, &mut self.chain, out);
            return Ok(input.len());
        }

        let total = self.carry.len() + input.len();
        let mut emit = floor_blocks(total, BLOCK_SIZE);
        if !self.encrypting && self.padding == Padding::Pkcs5 && emit == total && emit > 0 {
            // the last block may be padding
            emit -= BLOCK_SIZE;
        }
        validate::output_capacity(output.len(), emit)?;
        if emit == 0 {
            self.carry.extend(input);
            return Ok(0);
        }

        let carried = Zeroizing::new(self.carry.take_front(self.carry.len()));
        let from_input = emit - carried.len();
        let out = &mut output[..emit];
        out[..carried.len()].copy_from_slice(&carried);
        out[carried.len()..].copy_from_slice(&input[..from_input]);
        self.carry.extend(&input[from_input..]);

        crypt_blocks(self.mode, self.encrypting, cipher, &mut self.chain, out);
        Ok(emit)
    }

    fn finalize(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let cipher = self.key.as_ref().ok_or_else(not_initialized)?;

        let mut data = Zeroizing::new(Vec::with_capacity(
            self.carry.len() + input.len() + BLOCK_SIZE,
        ));
        data.extend_from_slice(self.carry.as_slice());
        data.extend_from_slice(input);

        // work on a copy so a short output buffer leaves the operation intact
        let mut chain = self.chain;
        let outcome = finish(
            self.mode,
            self.padding,
            self.encrypting,
            cipher,
            &mut chain,
            &mut data,
        );
        chain.zeroize();
        let len = match outcome {
            Ok(len) => len,
            Err(err) => {
                self.reset();
                return Err(err);
            }
        };

        validate::output_capacity(output.len(), len)?;
        output[..len].copy_from_slice(&data[..len]);
        self.reset();
        Ok(len)
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
