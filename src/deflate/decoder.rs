//! zlib/DEFLATE decoder: header validation, block dispatch, and token expansion.
//!
//! Grounded on `deflate_decompress_header`, `deflate_block`, `form_d1`/`form_d2`, and
//! `do_decompress` from the source this was distilled from. That source has a few
//! operator-precedence bugs (`byte[0] & 0xf != 8` binds as `byte[0] & (0xf != 8)`, and the
//! `MASK` macro and `1 << len + 2` have the same problem) — this port implements the
//! correct RFC 1951/1950 semantics rather than reproducing them.

use crate::bitstream::BitReader;
use crate::error::{bail, Error};
use crate::options::Options;
use crate::tools::canonical::{fixed_dist_lengths, fixed_lit_len_lengths, CanonicalHuffman};
use crate::tools::huffman_builder::CLEN_ORDER;
use super::adler32::adler32;
use super::tokens::{decode_distance, decode_length, dist_extra_bits, length_extra_bits, NUM_DIST_CODES, NUM_LITLEN_CODES};

fn parse_header(data: &[u8]) -> Result<usize, Error> {
    if data.len() < 2 {
        bail!(Error::Truncated);
    }
    let cmf = data[0];
    let flg = data[1];
    if (((cmf as u16) << 8) | flg as u16) % 31 != 0 {
        bail!(Error::InvalidHeader);
    }
    if cmf & 0x0f != 8 {
        bail!(Error::InvalidCompressionMethod);
    }
    let cinfo = (cmf >> 4) & 0x0f;
    if cinfo > 7 {
        bail!(Error::InvalidWindow);
    }
    if flg & 0x20 != 0 {
        bail!(Error::PresetDictionaryUnsupported);
    }
    Ok(1usize << (cinfo as u32 + 8))
}

fn decode_stored(r: &mut BitReader, out: &mut Vec<u8>) -> Result<(), Error> {
    r.byte_align();
    let len = r.read_bits(16)?;
    let nlen = r.read_bits(16)?;
    if len != (!nlen & 0xFFFF) {
        bail!(Error::StoredLenMismatch);
    }
    out.extend_from_slice(r.read_aligned_bytes(len as usize)?);
    Ok(())
}

fn decode_block_body(
    r: &mut BitReader,
    out: &mut Vec<u8>,
    ll_tree: &CanonicalHuffman,
    dist_tree: &CanonicalHuffman,
    window_size: usize,
) -> Result<(), Error> {
    loop {
        let sym = ll_tree.decode(r)?;
        if sym == 256 {
            return Ok(());
        }
        if sym < 256 {
            out.push(sym as u8);
            continue;
        }
        if sym > 285 {
            bail!(Error::InvalidSymbol);
        }
        let extra_bits = length_extra_bits(sym);
        let extra_val = r.read_bits(extra_bits as u32)? as u16;
        let len = decode_length(sym, extra_val);

        let dsym = dist_tree.decode(r)?;
        if dsym as usize >= NUM_DIST_CODES {
            bail!(Error::InvalidDistance);
        }
        let dextra_bits = dist_extra_bits(dsym);
        let dextra_val = r.read_bits(dextra_bits as u32)?;
        let dist = decode_distance(dsym, dextra_val).map_err(|_| Error::InvalidDistance)?;

        if dist > out.len() || dist > window_size {
            bail!(Error::InvalidDistance);
        }
        let start = out.len() - dist;
        for i in 0..len {
            let b = out[start + i];
            out.push(b);
        }
    }
}

fn read_dynamic_trees(r: &mut BitReader) -> Result<(CanonicalHuffman, CanonicalHuffman), Error> {
    let hlit = r.read_bits(5)? as usize + 257;
    let hdist = r.read_bits(5)? as usize + 1;
    let hclen = r.read_bits(4)? as usize + 4;
    if hlit > NUM_LITLEN_CODES {
        bail!(Error::InvalidCode);
    }

    let mut clen_lengths = [0u8; 19];
    for i in 0..hclen {
        clen_lengths[CLEN_ORDER[i]] = r.read_bits(3)? as u8;
    }
    let clen_tree = CanonicalHuffman::from_lengths(&clen_lengths)?;

    let total = hlit + hdist;
    let mut lengths = vec![0u8; total];
    let mut prev = 0u8;
    let mut i = 0usize;
    while i < total {
        let sym = clen_tree.decode(r)?;
        match sym {
            0..=15 => {
                lengths[i] = sym as u8;
                prev = sym as u8;
                i += 1;
            }
            16 => {
                if i == 0 {
                    bail!(Error::InvalidCode);
                }
                let rep = r.read_bits(2)? as usize + 3;
                if i + rep > total {
                    bail!(Error::InvalidCode);
                }
                for _ in 0..rep {
                    lengths[i] = prev;
                    i += 1;
                }
            }
            17 => {
                let rep = r.read_bits(3)? as usize + 3;
                if i + rep > total {
                    bail!(Error::InvalidCode);
                }
                for _ in 0..rep {
                    lengths[i] = 0;
                    i += 1;
                }
                prev = 0;
            }
            18 => {
                let rep = r.read_bits(7)? as usize + 11;
                if i + rep > total {
                    bail!(Error::InvalidCode);
                }
                for _ in 0..rep {
                    lengths[i] = 0;
                    i += 1;
                }
                prev = 0;
            }
            _ => bail!(Error::InvalidSymbol),
        }
    }

    let mut ll_lengths = vec![0u8; NUM_LITLEN_CODES];
    ll_lengths[..hlit].copy_from_slice(&lengths[..hlit]);
    let mut dist_lengths = vec![0u8; NUM_DIST_CODES];
    dist_lengths[..hdist].copy_from_slice(&lengths[hlit..hlit + hdist]);

    Ok((
        CanonicalHuffman::from_lengths(&ll_lengths)?,
        CanonicalHuffman::from_lengths(&dist_lengths)?,
    ))
}

/// Decompresses a complete zlib stream (header, one or more DEFLATE blocks, Adler-32
/// footer) into a freshly allocated buffer.
pub fn decompress(data: &[u8], options: &Options) -> Result<Vec<u8>, Error> {
    if data.len() < 6 {
        bail!(Error::Truncated);
    }
    let window_size = parse_header(data)?;
    let body_end = data.len() - 4;
    let body = &data[2..body_end];
    let expected_adler = u32::from_be_bytes([
        data[body_end],
        data[body_end + 1],
        data[body_end + 2],
        data[body_end + 3],
    ]);

    let fixed_ll = CanonicalHuffman::from_lengths(&fixed_lit_len_lengths())?;
    let fixed_dist = CanonicalHuffman::from_lengths(&fixed_dist_lengths())?;

    let mut out = Vec::new();
    let mut r = BitReader::new(body);
    loop {
        let bfinal = r.read_bit()?;
        let btype = r.read_bits(2)?;
        log::debug!("block: btype={} bfinal={} output so far={}", btype, bfinal, out.len());
        match btype {
            0 => decode_stored(&mut r, &mut out)?,
            1 => decode_block_body(&mut r, &mut out, &fixed_ll, &fixed_dist, window_size)?,
            2 => {
                let (ll_tree, dist_tree) = read_dynamic_trees(&mut r)?;
                decode_block_body(&mut r, &mut out, &ll_tree, &dist_tree, window_size)?;
            }
            _ => bail!(Error::InvalidBlockType),
        }
        if bfinal {
            break;
        }
    }

    if adler32(&out) != expected_adler {
        bail!(Error::InvalidChecksum);
    }
    if options.null_terminate && out.last() != Some(&0) {
        out.push(0);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::STD_OPTIONS;

    #[test]
    fn rejects_short_input() {
        assert!(matches!(decompress(&[1, 2, 3], &STD_OPTIONS), Err(Error::Truncated)));
    }

    #[test]
    fn decodes_hand_built_empty_stream() {
        // zlib header (CMF=0x78 max window, FLG=0x01, a multiple of 31) + one stored
        // block (BFINAL=1, BTYPE=0, LEN=0, NLEN=0xFFFF) + Adler-32 of an empty buffer.
        let data = hex::decode("7801010000ffff00000001").unwrap();
        assert_eq!(decompress(&data, &STD_OPTIONS).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn rejects_bad_header_checksum() {
        let data = [0x78u8, 0x00, 0, 0, 0, 0];
        assert!(matches!(decompress(&data, &STD_OPTIONS), Err(Error::InvalidHeader)));
    }

    #[test]
    fn rejects_wrong_compression_method() {
        // CMF with cm=7 (not 8), header check bits adjusted to still be a multiple of 31.
        let cmf = 0x77u8;
        let mut flg = 0u8;
        while (((cmf as u16) << 8) | flg as u16) % 31 != 0 {
            flg += 1;
        }
        let data = [cmf, flg, 0, 0, 0, 0];
        assert!(matches!(
            decompress(&data, &STD_OPTIONS),
            Err(Error::InvalidCompressionMethod)
        ));
    }
}
