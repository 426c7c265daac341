//! Text compression algorithms with inspectable intermediate state.
//!
//! This module provides implementations of two classical lossless coders:
//! - Huffman coding, with a replayable trace of every greedy merge
//! - LZW, with an encoder session that can be driven one transition at a time
//!
//! Input is treated as a sequence of `char`s. Huffman codes are kept as
//! `'0'`/`'1'` strings and LZW codes as plain integers, so every artifact can be
//! rendered directly.
//!
//! # Examples
//!
//! ```rust
//! use algoviz::cs::compression::{Huffman, Lzw, TextCompression};
//!
//! let text = "AABCABAACAABCABCABAAACAABBCA";
//!
//! let huffman = Huffman::default();
//! let encoded = huffman.compress(text).unwrap();
//! assert_eq!(huffman.decompress(&encoded).unwrap(), text);
//!
//! let lzw = Lzw::default();
//! let encoded = lzw.compress(text).unwrap();
//! assert_eq!(lzw.decompress(&encoded).unwrap(), text);
//! ```

pub use crate::cs::error::Result;

/// Trait for text compression algorithms.
pub trait TextCompression {
    /// Everything the algorithm produces for one input, including what decoding needs.
    type Encoded;

    /// Compress the input text
    fn compress(&self, input: &str) -> Result<Self::Encoded>;

    /// Decompress a previous result back into text
    fn decompress(&self, encoded: &Self::Encoded) -> Result<String>;
}

/// Trait for algorithm runs that can be advanced one step at a time.
///
/// The caller owns the scheduling: it may call [`Stepper::step`] from a timer,
/// a key press or a tight loop. Stopping early needs no cleanup.
pub trait Stepper {
    /// What a single step reports.
    type Step;

    /// Perform one step. Returns `None` once the run is complete.
    fn step(&mut self) -> Option<Self::Step>;

    /// Whether every step has been taken.
    fn is_finished(&self) -> bool;

    /// Restore the run to its initial state.
    fn reset(&mut self);

    /// Take all remaining steps and return how many were taken.
    fn finish(&mut self) -> usize {
        let mut taken = 0;
        while self.step().is_some() {
            taken += 1;
        }
        taken
    }
}

/// Size accounting for one compression run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompressionStats {
    /// Size of the input, at a fixed width per symbol.
    pub original_bits: usize,
    /// Size of the output.
    pub compressed_bits: usize,
}

impl CompressionStats {
    /// Stats for `symbols` input symbols of `bits_per_symbol` bits each.
    pub fn new(symbols: usize, bits_per_symbol: usize, compressed_bits: usize) -> Self {
        Self {
            original_bits: symbols * bits_per_symbol,
            compressed_bits,
        }
    }

    /// Original size divided by compressed size; `0.0` while nothing has been emitted.
    pub fn ratio(&self) -> f64 {
        if self.compressed_bits == 0 {
            return 0.0;
        }
        self.original_bits as f64 / self.compressed_bits as f64
    }

    /// Bits saved. Negative when the output is larger than the input.
    pub fn saved_bits(&self) -> isize {
        self.original_bits as isize - self.compressed_bits as isize
    }

    /// Saved bits as a percentage of the original size.
    pub fn space_savings(&self) -> f64 {
        if self.original_bits == 0 {
            return 0.0;
        }
        self.saved_bits() as f64 * 100.0 / self.original_bits as f64
    }
}

pub mod huffman;
pub use huffman::{
    build_code_table, build_frequency_table, build_huffman_tree, build_huffman_tree_with_steps,
    decode, encode, encode_lossy, huffman_decode, huffman_encode, label_nodes, BuildStep,
    CodeTable, FrequencyTable, Huffman, HuffmanConfig, HuffmanEncoding, HuffmanNode,
    LossyEncoding, NodeCodes, NodeId, TraceReplay, TreeBuild, UnknownSymbolPolicy,
};

pub mod lzw;
pub use lzw::{
    format_code_list, in_initial_alphabet, lzw_decode, lzw_encode, parse_code_list, EmittedCode,
    Lzw, LzwConfig, LzwCursor, LzwDictionary, LzwEncoder, LzwEncoding, LzwStep,
    INITIAL_DICTIONARY_SIZE,
};

pub mod samples;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_ratio_and_savings() {
        let stats = CompressionStats::new(28, 8, 41);
        assert_eq!(stats.original_bits, 224);
        assert!((stats.ratio() - 224.0 / 41.0).abs() < 1e-12);
        assert_eq!(stats.saved_bits(), 183);
        assert!((stats.space_savings() - 18300.0 / 224.0).abs() < 1e-12);
    }

    #[test]
    fn test_stats_empty() {
        let stats = CompressionStats::default();
        assert_eq!(stats.ratio(), 0.0);
        assert_eq!(stats.space_savings(), 0.0);
        assert_eq!(stats.saved_bits(), 0);
    }

    #[test]
    fn test_stats_expansion() {
        let stats = CompressionStats::new(1, 8, 9);
        assert_eq!(stats.saved_bits(), -1);
        assert!(stats.space_savings() < 0.0);
    }
}
