//! # vitterflate
//!
//! A DEFLATE ([RFC 1951](https://www.rfc-editor.org/rfc/rfc1951)) / zlib
//! ([RFC 1950](https://www.rfc-editor.org/rfc/rfc1950)) codec built on two cores: an LZ77
//! duplicate-string finder over a hash-chain index, and an adaptive Huffman tree
//! maintained by Vitter's Algorithm V that drives a canonical Huffman code builder for
//! each block.
//!
//! ## Buffer example
//!
//! ```rs
//! use vitterflate::{deflate, options::STD_OPTIONS};
//! let compressed = deflate::compress(b"hello hello hello", 32768, &STD_OPTIONS).unwrap();
//! let restored = deflate::decompress(&compressed, &STD_OPTIONS).unwrap();
//! assert_eq!(restored, b"hello hello hello");
//! ```

pub mod deflate;
pub mod error;
pub mod options;
mod tools;

pub use error::Error;
pub use options::{Options, STD_OPTIONS};
