//! DEFLATE/zlib codec: LZ77 match search, the Vitter adaptive Huffman tree that drives
//! block statistics, the canonical-code builder, and the bit-stream encoder/decoder.

mod adler32;
pub mod decoder;
pub mod encoder;
#[cfg(feature = "statistics")]
pub mod stats;
mod tokens;
mod window;

pub use decoder::decompress;
pub use encoder::compress;
pub use tokens::Token;

#[cfg(feature = "statistics")]
pub use stats::{StatsSink, TokenStat};

/// Compresses `data`, reporting one [`stats::TokenStat`] per emitted token to `sink`.
/// Only available with the `statistics` feature, the in-process replacement for the
/// original fork/pipe test harness (see `stats` module docs).
#[cfg(feature = "statistics")]
pub fn compress_with_stats(
    data: &[u8],
    window_size: usize,
    options: &crate::options::Options,
    sink: &mut dyn stats::StatsSink,
) -> Result<Vec<u8>, crate::error::Error> {
    encoder::compress_inner(
        data,
        window_size,
        options,
        Some(&mut |bytes_in, ll_symbol, dist_symbol| {
            sink.record(stats::TokenStat { bytes_in, ll_symbol, dist_symbol });
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::STD_OPTIONS;

    #[test]
    fn round_trips_scenario_abc() {
        let data = b"ABCABCABC";
        let compressed = compress(data, 32768, &STD_OPTIONS).unwrap();
        let out = decompress(&compressed, &STD_OPTIONS).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn round_trips_repeated_window() {
        let w = 1024usize;
        let mut data = vec![0u8; w];
        for (i, b) in data.iter_mut().enumerate() {
            *b = (i % 200) as u8;
        }
        let dup = data.clone();
        data.extend_from_slice(&dup);
        let compressed = compress(&data, w, &STD_OPTIONS).unwrap();
        let out = decompress(&compressed, &STD_OPTIONS).unwrap();
        assert_eq!(out, data);
    }
}
