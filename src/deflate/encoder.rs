//! LZ77 + adaptive-Huffman-fed encoder: the half of `process_loop` the source this was
//! distilled from left as `// TODO: write literal` / `// TODO: write len/dist pair`, plus
//! the block-close path (`h_tree_builder_build` is called after every single token there,
//! purely to print a running bit-cost estimate; this port only needs that cost once per
//! block, when deciding how to frame it).
//!
//! The source's `process_loop` rotates two `sliding_window`-sized buffers because it reads
//! its input one window at a time from a file. This encoder is handed a whole in-memory
//! slice, so `window::MatchFinder` plays the role of the hash-chain half of that struct
//! directly against the slice, and "one dynamic block per sliding window flush" becomes:
//! scan until at least `window_size` bytes have been consumed (a match may run past that
//! boundary, mirroring the original's `dup_carry_over` - the overrun stays in the block
//! that started it rather than forcing a new one mid-token), then close the block.

use crate::bitstream::{reverse_bits, BitWriter};
use crate::error::{bail, Error};
use crate::options::{Options, MAX_WINDOW_SIZE};
use crate::tools::aht::Aht;
use crate::tools::canonical::{
    codes_from_lengths, fixed_dist_lengths, fixed_lit_len_lengths, limit_lengths,
};
use crate::tools::huffman_builder::{code_lengths, encode_code_lengths, trim_hclen, ClenToken, CLEN_ORDER};

use super::adler32::adler32;
use super::tokens::{dist_code, length_code, Token, END_OF_BLOCK, NUM_DIST_CODES, NUM_LITLEN_CODES};
use super::window::MatchFinder;

/// Per-token observation passed to an optional caller-supplied sink. `dist_symbol` is
/// `Some` only for a `Match` token. The fixed-size-record shape of the original's pipe
/// protocol is gone (see `deflate::stats`); this is the same four fields as a plain call.
type StatsFn<'a> = dyn FnMut(u64, u16, Option<u16>) + 'a;

/// Compresses `data` into a complete zlib stream (2-byte header, one or more DEFLATE
/// blocks, 4-byte big-endian Adler-32 trailer), one dynamic/fixed/stored block per
/// `window_size`-byte flush of the LZ77 scan.
pub fn compress(data: &[u8], window_size: usize, options: &Options) -> Result<Vec<u8>, Error> {
    compress_inner(data, window_size, options, None)
}

pub(crate) fn compress_inner(
    data: &[u8],
    window_size: usize,
    // kept for signature symmetry with `decompress`'s Options; every field of Options is
    // currently decode-only (null_terminate applies to the decompressed output, see
    // decoder::decompress), so encoding itself doesn't consult it yet.
    _options: &Options,
    mut stats: Option<&mut StatsFn>,
) -> Result<Vec<u8>, Error> {
    if window_size == 0 || window_size > MAX_WINDOW_SIZE {
        bail!(Error::InvalidWindow);
    }

    let header = zlib_header(window_size)?;
    let mut writer = BitWriter::new();

    let fixed_ll_lengths = fixed_lit_len_lengths();
    let fixed_ll_codes = codes_from_lengths(&fixed_ll_lengths);
    let fixed_dist_lengths_v = fixed_dist_lengths();
    let fixed_dist_codes = codes_from_lengths(&fixed_dist_lengths_v);

    let mut mf = MatchFinder::new(data, window_size);
    let mut pos = 0usize;
    let mut bytes_in = 0u64;

    loop {
        let block_start = pos;
        let boundary = (block_start + window_size).min(data.len());
        log::debug!("opening block at byte {} (window {}..{})", block_start, block_start, boundary);

        let mut ll_aht = Aht::new(NUM_LITLEN_CODES);
        let mut dist_aht = Aht::new(NUM_DIST_CODES);
        // the end-of-block symbol is always present, so give it weight >= 1 up front
        // (mirrors process_loop's `aht_insert(&com->ll_aht, 256)` done once before the loop).
        ll_aht.insert(END_OF_BLOCK as usize);

        let mut tokens: Vec<Token> = Vec::new();

        while pos < boundary {
            if let Some((len, dist)) = mf.find_match(pos) {
                let (sym, _, _) = length_code(len);
                let (dsym, _, _) = dist_code(dist);
                ll_aht.insert(sym as usize);
                dist_aht.insert(dsym as usize);
                if let Some(f) = stats.as_deref_mut() {
                    f(bytes_in + len as u64, sym, Some(dsym));
                }
                for p in pos..pos + len {
                    mf.insert(p);
                }
                log::trace!("match len={} dist={} at byte {}", len, dist, pos);
                tokens.push(Token::Match { len: len as u16, dist: dist as u16 });
                pos += len;
                bytes_in += len as u64;
            } else {
                let b = data[pos];
                ll_aht.insert(b as usize);
                if let Some(f) = stats.as_deref_mut() {
                    f(bytes_in + 1, b as u16, None);
                }
                mf.insert(pos);
                tokens.push(Token::Literal(b));
                pos += 1;
                bytes_in += 1;
            }
        }

        let bfinal = pos >= data.len();
        emit_block(
            &mut writer,
            &tokens,
            &ll_aht.weights(),
            &dist_aht.weights(),
            &data[block_start..pos],
            bfinal,
            (&fixed_ll_lengths, &fixed_ll_codes),
            (&fixed_dist_lengths_v, &fixed_dist_codes),
        );

        if bfinal {
            break;
        }
    }

    let mut out = Vec::with_capacity(2 + data.len() / 2 + 4);
    out.extend_from_slice(&header);
    out.extend_from_slice(&writer.into_bytes());
    out.extend_from_slice(&adler32(data).to_be_bytes());

    Ok(out)
}

fn zlib_header(window_size: usize) -> Result<[u8; 2], Error> {
    if window_size == 0 || window_size > MAX_WINDOW_SIZE {
        bail!(Error::InvalidWindow);
    }
    let mut cinfo = 0u8;
    while (256usize << cinfo) < window_size && cinfo < 7 {
        cinfo += 1;
    }
    let cmf = (cinfo << 4) | 8;
    let mut flg = 0u8;
    while (((cmf as u16) << 8) | flg as u16) % 31 != 0 {
        flg += 1;
    }
    Ok([cmf, flg])
}

fn token_bits(tokens: &[Token], ll_lengths: &[u8], dist_lengths: &[u8]) -> u64 {
    let mut bits = ll_lengths[END_OF_BLOCK as usize] as u64;
    for t in tokens {
        match *t {
            Token::Literal(b) => bits += ll_lengths[b as usize] as u64,
            Token::Match { len, dist } => {
                let (sym, extra, _) = length_code(len as usize);
                let (dsym, dextra, _) = dist_code(dist as usize);
                bits += ll_lengths[sym as usize] as u64 + extra as u64;
                bits += dist_lengths[dsym as usize] as u64 + dextra as u64;
            }
        }
    }
    bits
}

fn write_symbol(writer: &mut BitWriter, sym: usize, lengths: &[u8], codes: &[u16]) {
    let len = lengths[sym] as u32;
    writer.write_bits(reverse_bits(codes[sym] as u32, len), len);
}

fn write_tokens(
    writer: &mut BitWriter,
    tokens: &[Token],
    ll_lengths: &[u8],
    ll_codes: &[u16],
    dist_lengths: &[u8],
    dist_codes: &[u16],
) {
    for t in tokens {
        match *t {
            Token::Literal(b) => write_symbol(writer, b as usize, ll_lengths, ll_codes),
            Token::Match { len, dist } => {
                let (sym, extra_bits, extra_val) = length_code(len as usize);
                write_symbol(writer, sym as usize, ll_lengths, ll_codes);
                if extra_bits > 0 {
                    writer.write_bits(extra_val as u32, extra_bits as u32);
                }
                let (dsym, dextra_bits, dextra_val) = dist_code(dist as usize);
                write_symbol(writer, dsym as usize, dist_lengths, dist_codes);
                if dextra_bits > 0 {
                    writer.write_bits(dextra_val as u32, dextra_bits as u32);
                }
            }
        }
    }
    write_symbol(writer, END_OF_BLOCK as usize, ll_lengths, ll_codes);
}

/// Computes a code-length vector from a weight vector, limiting it to `max_len` bits only
/// if the unconstrained build actually produced a longer code (the common case for small
/// per-block alphabets never needs the redistribution pass at all).
fn finalize_lengths(weights: &[u32], max_len: u8) -> Vec<u8> {
    let mut lengths = code_lengths(weights);
    if lengths.iter().any(|&l| l > max_len) {
        limit_lengths(&mut lengths, weights, max_len);
    }
    lengths
}

fn clen_token_symbol(t: &ClenToken) -> usize {
    match *t {
        ClenToken::Literal(d) => d as usize,
        ClenToken::RepeatPrev { .. } => 16,
        ClenToken::RepeatZeroShort { .. } => 17,
        ClenToken::RepeatZeroLong { .. } => 18,
    }
}

fn clen_token_extra(t: &ClenToken) -> (u8, u32) {
    match *t {
        ClenToken::Literal(_) => (0, 0),
        ClenToken::RepeatPrev { count } => (2, count as u32 - 3),
        ClenToken::RepeatZeroShort { count } => (3, count as u32 - 3),
        ClenToken::RepeatZeroLong { count } => (7, count as u32 - 11),
    }
}

struct DynamicPlan {
    ll_lengths: Vec<u8>,
    dist_lengths: Vec<u8>,
    clen_ordered: [u8; 19],
    hlit: usize,
    hdist: usize,
    hclen: usize,
    clen_tokens: Vec<ClenToken>,
    header_bits: u64,
    body_bits: u64,
}

fn build_dynamic_plan(ll_weights: &[u32], dist_weights: &[u32], tokens: &[Token]) -> DynamicPlan {
    let ll_lengths = finalize_lengths(ll_weights, 15);

    // RFC 1951 requires at least one representable distance code even when no match in
    // this block used one; zlib's own encoder does the same "treat symbol 0 as weight 1"
    // fix-up rather than emit a header with zero distance codes at all.
    let mut dist_weights_for_code = dist_weights.to_vec();
    if dist_weights_for_code.iter().all(|&w| w == 0) {
        dist_weights_for_code[0] = 1;
    }
    let dist_lengths = finalize_lengths(&dist_weights_for_code, 15);

    let mut clen_weights = [0u32; 19];
    let (clen_tokens, hlit, hdist) =
        encode_code_lengths(&ll_lengths, &dist_lengths, &mut clen_weights);

    let clen_lengths = finalize_lengths(&clen_weights, 7);

    let mut clen_ordered = [0u8; 19];
    for (i, &sym) in CLEN_ORDER.iter().enumerate() {
        clen_ordered[i] = clen_lengths[sym];
    }
    let hclen = trim_hclen(&clen_ordered);

    let mut header_bits = 5 + 5 + 4 + hclen as u64 * 3;
    for t in &clen_tokens {
        let sym = clen_token_symbol(t);
        let (extra, _) = clen_token_extra(t);
        header_bits += clen_lengths[sym] as u64 + extra as u64;
    }

    let body_bits = token_bits(tokens, &ll_lengths, &dist_lengths);

    DynamicPlan {
        ll_lengths,
        dist_lengths,
        clen_ordered,
        hlit,
        hdist,
        hclen,
        clen_tokens,
        header_bits,
        body_bits,
    }
}

#[allow(clippy::too_many_arguments)]
fn emit_block(
    writer: &mut BitWriter,
    tokens: &[Token],
    ll_weights: &[u32],
    dist_weights: &[u32],
    raw: &[u8],
    bfinal: bool,
    (fixed_ll_lengths, fixed_ll_codes): (&[u8], &[u16]),
    (fixed_dist_lengths_v, fixed_dist_codes): (&[u8], &[u16]),
) {
    let plan = build_dynamic_plan(ll_weights, dist_weights, tokens);
    let dynamic_bits = 3 + plan.header_bits + plan.body_bits;

    let fixed_bits = 3 + token_bits(tokens, fixed_ll_lengths, fixed_dist_lengths_v);

    let pad_to_byte = (8 - (writer.bit_len() as u64 + 3) % 8) % 8;
    let stored_bits = 3 + pad_to_byte + 32 + 8 * raw.len() as u64;

    log::debug!(
        "closing block: {} tokens, stored={} fixed={} dynamic={} bits",
        tokens.len(),
        stored_bits,
        fixed_bits,
        dynamic_bits
    );

    if stored_bits <= fixed_bits && stored_bits <= dynamic_bits {
        writer.write_bit(bfinal);
        writer.write_bits(0, 2);
        writer.write_aligned_bytes(&(raw.len() as u16).to_le_bytes());
        writer.write_aligned_bytes(&(!(raw.len() as u16)).to_le_bytes());
        writer.write_aligned_bytes(raw);
    } else if fixed_bits <= dynamic_bits {
        writer.write_bit(bfinal);
        writer.write_bits(1, 2);
        write_tokens(
            writer,
            tokens,
            fixed_ll_lengths,
            fixed_ll_codes,
            fixed_dist_lengths_v,
            fixed_dist_codes,
        );
    } else {
        writer.write_bit(bfinal);
        writer.write_bits(2, 2);
        writer.write_bits((plan.hlit - 257) as u32, 5);
        writer.write_bits((plan.hdist - 1) as u32, 5);
        writer.write_bits((plan.hclen - 4) as u32, 4);
        for i in 0..plan.hclen {
            writer.write_bits(plan.clen_ordered[i] as u32, 3);
        }
        let mut clen_lengths_by_symbol = [0u8; 19];
        for (i, &sym) in CLEN_ORDER.iter().enumerate() {
            clen_lengths_by_symbol[sym] = plan.clen_ordered[i];
        }
        let clen_codes = codes_from_lengths(&clen_lengths_by_symbol);
        for t in &plan.clen_tokens {
            let sym = clen_token_symbol(t);
            write_symbol(writer, sym, &clen_lengths_by_symbol, &clen_codes);
            let (extra_bits, extra_val) = clen_token_extra(t);
            if extra_bits > 0 {
                writer.write_bits(extra_val, extra_bits as u32);
            }
        }
        write_tokens(
            writer,
            tokens,
            &plan.ll_lengths,
            &codes_from_lengths(&plan.ll_lengths),
            &plan.dist_lengths,
            &codes_from_lengths(&plan.dist_lengths),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deflate::decoder::decompress;
    use crate::options::STD_OPTIONS;

    fn roundtrip(data: &[u8], window_size: usize) -> Vec<u8> {
        let compressed = compress(data, window_size, &STD_OPTIONS).expect("compress failed");
        decompress(&compressed, &STD_OPTIONS).expect("decompress failed")
    }

    #[test]
    fn empty_input_round_trips() {
        assert_eq!(roundtrip(b"", 32768), b"");
    }

    #[test]
    fn single_byte_round_trips() {
        assert_eq!(roundtrip(b"a", 32768), b"a");
    }

    #[test]
    fn repeated_run_round_trips() {
        assert_eq!(roundtrip(b"AAAAAAAA", 32768), b"AAAAAAAA");
    }

    #[test]
    fn repeated_triplet_round_trips() {
        assert_eq!(roundtrip(b"ABCABCABC", 32768), b"ABCABCABC");
    }

    #[test]
    fn long_run_past_max_match_round_trips() {
        let data = vec![b'z'; 1000];
        assert_eq!(roundtrip(&data, 32768), data);
    }

    #[test]
    fn length_boundary_sizes_round_trip() {
        for n in [1usize, 2, 3, 257, 258, 259, 1000] {
            let data: Vec<u8> = (0..n).map(|i| (i % 251) as u8).collect();
            assert_eq!(roundtrip(&data, 32768), data);
        }
    }

    #[test]
    fn uniform_random_like_input_round_trips() {
        // deterministic pseudo-random byte sequence (LCG), no matches expected.
        let mut state = 0x2545F4914F6CDD1Du64;
        let data: Vec<u8> = (0..70_000)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
                (state >> 56) as u8
            })
            .collect();
        assert_eq!(roundtrip(&data, 32768), data);
    }

    #[test]
    fn small_window_forces_multiple_blocks_and_still_round_trips() {
        let data: Vec<u8> = (0..5000).map(|i| ((i * 37) % 256) as u8).collect();
        assert_eq!(roundtrip(&data, 256), data);
    }

    #[test]
    fn cross_window_repeat_round_trips() {
        let w = 512usize;
        let mut data = vec![0u8; w];
        for (i, b) in data.iter_mut().enumerate() {
            *b = (i % 250) as u8;
        }
        let second = data.clone();
        data.extend_from_slice(&second);
        assert_eq!(roundtrip(&data, w), data);
    }

    #[test]
    fn rejects_window_too_large() {
        assert!(matches!(
            compress(b"x", MAX_WINDOW_SIZE + 1, &STD_OPTIONS),
            Err(Error::InvalidWindow)
        ));
    }
}
