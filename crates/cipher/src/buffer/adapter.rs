//! Buffer-crossing adapter
//!
//! Runs one update or finalize call of an engine between two cursor buffers.
//! On success the input is consumed to its limit and the output advances by
//! exactly the number of bytes produced. Capacity is checked against the
//! engine's output-size prediction before the engine is touched.

use core::ops::Range;

use tracing::trace;
use zeroize::Zeroizing;

use xform_api::{validate, Result, TransformEngine};

use super::ByteBuffer;

/// Largest temporary copy made when neither side exposes its storage
pub(crate) const MAX_CHUNK: usize = 4096;

/// Feed `input`'s remaining bytes to `engine`, writing into `output`.
///
/// An update with nothing remaining returns 0 without calling the engine.
pub(crate) fn transfer(
    engine: &mut dyn TransformEngine,
    input: &mut ByteBuffer,
    output: &mut ByteBuffer,
    finalize: bool,
) -> Result<usize> {
    let in_len = input.remaining();
    if in_len == 0 && !finalize {
        return Ok(0);
    }

    let required = engine.output_size(in_len);
    validate::output_capacity(output.remaining(), required)?;

    let written = if input.has_array() && output.has_array() {
        addressable(engine, input, output, required, finalize)?
    } else if input.has_array() {
        trace!(in_len, "buffer transfer: engine-allocated output");
        let produced = {
            let storage = input.storage();
            let src = &storage[input.remaining_region()];
            Zeroizing::new(run_vec(engine, src, finalize)?)
        };
        output.put(&produced)?;
        produced.len()
    } else {
        trace!(in_len, "buffer transfer: chunked copy");
        chunked(engine, input, output, required, finalize)?
    };

    input.exhaust();
    Ok(written)
}

fn run(
    engine: &mut dyn TransformEngine,
    src: &[u8],
    dst: &mut [u8],
    finalize: bool,
) -> Result<usize> {
    if finalize {
        engine.finalize(src, dst)
    } else {
        engine.update(src, dst)
    }
}

fn run_vec(engine: &mut dyn TransformEngine, src: &[u8], finalize: bool) -> Result<Vec<u8>> {
    if finalize {
        engine.finalize_vec(src)
    } else {
        engine.update_vec(src)
    }
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

/// Both sides expose storage: write in place unless the regions overlap
fn addressable(
    engine: &mut dyn TransformEngine,
    input: &ByteBuffer,
    output: &mut ByteBuffer,
    required: usize,
    finalize: bool,
) -> Result<usize> {
    let in_region = input.remaining_region();
    let out_region = output.region_from_position(required);

    let written = if !input.shares_storage(output) {
        trace!(required, "buffer transfer: separate storage");
        let src = input.storage();
        let mut dst = output.storage_mut();
        run(engine, &src[in_region], &mut dst[out_region], finalize)?
    } else if overlaps(&in_region, &out_region) {
        // Any overlap goes through scratch; the engine never sees aliased memory.
        trace!(required, "buffer transfer: overlapping views, using scratch");
        let mut scratch = Zeroizing::new(vec![0u8; required]);
        let n = {
            let src = input.storage();
            run(engine, &src[in_region], &mut scratch, finalize)?
        };
        output.storage_mut()[out_region.start..out_region.start + n]
            .copy_from_slice(&scratch[..n]);
        n
    } else {
        trace!(required, "buffer transfer: disjoint views of shared storage");
        let mut storage = output.storage_mut();
        if in_region.end <= out_region.start {
            let (head, tail) = storage.split_at_mut(out_region.start);
            run(engine, &head[in_region], &mut tail[..required], finalize)?
        } else {
            let in_len = in_region.len();
            let (head, tail) = storage.split_at_mut(in_region.start);
            run(engine, &tail[..in_len], &mut head[out_region], finalize)?
        }
    };

    output.advance(written);
    Ok(written)
}

/// Input storage is not addressable: copy it out in bounded chunks
fn chunked(
    engine: &mut dyn TransformEngine,
    input: &mut ByteBuffer,
    output: &mut ByteBuffer,
    required: usize,
    finalize: bool,
) -> Result<usize> {
    let mut left = input.remaining();
    let mut chunk = Zeroizing::new(vec![0u8; left.min(MAX_CHUNK)]);
    let mut produced = Zeroizing::new(Vec::with_capacity(required));

    loop {
        let take = left.min(MAX_CHUNK);
        input.get(&mut chunk[..take])?;
        left -= take;
        let last = left == 0;
        let out = Zeroizing::new(run_vec(engine, &chunk[..take], finalize && last)?);
        produced.extend_from_slice(&out);
        if last {
            break;
        }
    }

    output.put(&produced)?;
    Ok(produced.len())
}
