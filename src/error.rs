//! Codec error type.
//!
//! Every error kind is collected into one enumeration rather than propagated as an
//! exception traversing multiple frames. Each variant carries a stable short name and a
//! numeric code partitioned by a 24-bit class mask, mirroring the `GLOBAL`/`DEFLATE`/`PNG`
//! split used at the codec/host boundary (the `PNG` class is reserved for the container
//! layer, which lives outside this crate).

/// Class mask for errors that originate below the codec (allocation failures and the like).
pub const CLASS_GLOBAL: u32 = 0;
/// Class mask for errors specific to the DEFLATE/zlib codec itself.
pub const CLASS_DEFLATE: u32 = 1 << 24;
/// Reserved for the PNG container layer, which is out of scope for this crate.
pub const CLASS_PNG: u32 = 2 << 24;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("out of memory")]
    OutOfMemory,
    #[error("truncated stream")]
    Truncated,
    #[error("invalid zlib header")]
    InvalidHeader,
    #[error("adler-32 checksum mismatch")]
    InvalidChecksum,
    #[error("invalid literal/length symbol")]
    InvalidSymbol,
    #[error("invalid or over-length huffman code")]
    InvalidCode,
    #[error("ambiguous huffman code assignment")]
    AmbiguousCode,
    #[error("back-reference distance exceeds available history")]
    InvalidDistance,
    #[error("reserved or unrecognized block type")]
    InvalidBlockType,
    #[error("stored block LEN/NLEN mismatch")]
    StoredLenMismatch,
    #[error("preset dictionaries are not supported")]
    PresetDictionaryUnsupported,
    #[error("sliding window exceeds 32768 bytes")]
    InvalidWindow,
    #[error("unsupported compression method")]
    InvalidCompressionMethod,
}

impl Error {
    /// Stable short name, for diagnostics and the class-mask ABI.
    pub fn name(&self) -> &'static str {
        match self {
            Error::OutOfMemory => "E_MALLOC",
            Error::Truncated => "E_TRUNC",
            Error::InvalidHeader => "E_ZHEAD",
            Error::InvalidChecksum => "E_ZADL32",
            Error::InvalidSymbol => "E_HUFVAL",
            Error::InvalidCode => "E_HUFINV",
            Error::AmbiguousCode => "E_HUFAMB",
            Error::InvalidDistance => "E_HUFDIS",
            Error::InvalidBlockType => "E_ZBTYPE",
            Error::StoredLenMismatch => "E_ZNLEN",
            Error::PresetDictionaryUnsupported => "E_ZPDICT",
            Error::InvalidWindow => "E_ZSLWIN",
            Error::InvalidCompressionMethod => "E_ZCMPMT",
        }
    }

    /// Class mask this error belongs to (every variant here is `CLASS_DEFLATE` except
    /// `OutOfMemory`, which can originate below the codec proper).
    pub fn class(&self) -> u32 {
        match self {
            Error::OutOfMemory => CLASS_GLOBAL,
            _ => CLASS_DEFLATE,
        }
    }

    /// Opaque numeric code for the codec/host error-propagation ABI: the class mask
    /// or'd with a small ordinal, stable for the lifetime of this enum's variant list.
    pub fn code(&self) -> u32 {
        let ordinal = match self {
            Error::OutOfMemory => 1,
            Error::Truncated => 1,
            Error::InvalidHeader => 2,
            Error::InvalidChecksum => 3,
            Error::InvalidSymbol => 4,
            Error::InvalidCode => 5,
            Error::AmbiguousCode => 6,
            Error::InvalidDistance => 7,
            Error::InvalidBlockType => 8,
            Error::StoredLenMismatch => 9,
            Error::PresetDictionaryUnsupported => 10,
            Error::InvalidWindow => 11,
            Error::InvalidCompressionMethod => 12,
        };
        self.class() | ordinal
    }
}

/// Construct an error, logging a diagnostic with file/line the way a debug build of the
/// original `fail_out()` macro would.
macro_rules! bail {
    ($e:expr) => {{
        let e = $e;
        log::error!("{} ({}:{}:{})", e.name(), file!(), line!(), column!());
        return Err(e);
    }};
}
pub(crate) use bail;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_unique() {
        let all = [
            Error::OutOfMemory,
            Error::Truncated,
            Error::InvalidHeader,
            Error::InvalidChecksum,
            Error::InvalidSymbol,
            Error::InvalidCode,
            Error::AmbiguousCode,
            Error::InvalidDistance,
            Error::InvalidBlockType,
            Error::StoredLenMismatch,
            Error::PresetDictionaryUnsupported,
            Error::InvalidWindow,
            Error::InvalidCompressionMethod,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a.code(), b.code());
            }
        }
    }

    #[test]
    fn deflate_class_is_tagged() {
        assert_eq!(Error::InvalidHeader.class(), CLASS_DEFLATE);
        assert_eq!(Error::OutOfMemory.class(), CLASS_GLOBAL);
    }
}
