//! Constant-time operations to prevent timing attacks

use subtle::{ConstantTimeEq, ConstantTimeGreater};

/// Constant-time comparison of two byte slices
///
/// Slices of different length compare unequal without inspecting contents.
pub fn ct_eq<A, B>(a: A, b: B) -> bool
where
    A: AsRef<[u8]>,
    B: AsRef<[u8]>,
{
    let a = a.as_ref();
    let b = b.as_ref();

    if a.len() != b.len() {
        return false;
    }

    a.ct_eq(b).into()
}

/// Length of the PKCS#5/PKCS#7 padding at the end of `block`.
///
/// Every byte of `block` is inspected regardless of where the padding
/// starts. Returns `None` for a zero pad byte, a pad longer than the block,
/// or any mismatching pad byte.
pub fn pkcs7_pad_len(block: &[u8]) -> Option<usize> {
    let n = block.len();
    if n == 0 || n > u8::MAX as usize {
        return None;
    }
    let pad = block[n - 1];
    let pad16 = pad as u16;

    let mut good = pad.ct_gt(&0) & !pad.ct_gt(&(n as u8));
    for (i, &b) in block.iter().enumerate() {
        // distance from the end, 1 for the last byte
        let pos = (n - i) as u16;
        let in_pad = !pos.ct_gt(&pad16);
        good &= !in_pad | b.ct_eq(&pad);
    }

    if bool::from(good) {
        Some(pad as usize)
    } else {
        None
    }
}
