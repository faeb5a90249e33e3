//! Options controlling compression and decompression.
//!
//! Mirrors the shape of the teacher's `retrocompressor::Options`/`STD_OPTIONS`: a small
//! plain struct plus a constant default, rather than a builder.

/// Maximum sliding window the wire format allows (zlib CINFO field caps at 7, i.e. `2^15`).
pub const MAX_WINDOW_SIZE: usize = 32768;

#[derive(Clone, Copy, Debug)]
pub struct Options {
    /// Sliding window size used by the encoder, in bytes. Ignored by the decoder, which
    /// takes its window size from the zlib header.
    pub window_size: usize,
    /// If true, `decompress` appends a trailing `0` byte when the output does not already
    /// end with one (useful for callers that want a C-string-compatible buffer).
    pub null_terminate: bool,
}

pub const STD_OPTIONS: Options = Options {
    window_size: MAX_WINDOW_SIZE,
    null_terminate: false,
};

impl Default for Options {
    fn default() -> Self {
        STD_OPTIONS
    }
}
