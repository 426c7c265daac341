//! Error types for the compression engines.

use thiserror::Error;

/// Error variants for Huffman and LZW operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An operation that needs at least one symbol or code was given none.
    #[error("empty input")]
    EmptyInput,

    /// A Huffman bit string could not be walked through the tree.
    #[error("malformed encoded input at bit {position}: {reason}")]
    MalformedEncodedInput {
        /// Index of the offending bit (or the input length when the input ends mid-code).
        position: usize,
        /// What went wrong at that bit.
        reason: String,
    },

    /// An LZW code outside the dictionary at the time it was read.
    #[error("invalid LZW code {code} at index {position} (dictionary size {dictionary_size})")]
    InvalidLzwCode {
        /// The code that was read.
        code: u32,
        /// Index of the code in the input list.
        position: usize,
        /// Dictionary size when the code was read.
        dictionary_size: usize,
    },

    /// A symbol that has no code (Huffman) or is outside the initial alphabet (LZW).
    #[error("unknown symbol {symbol:?} at index {position}")]
    UnknownSymbol {
        /// The symbol that could not be encoded.
        symbol: char,
        /// Index of the symbol in the input, counted in chars.
        position: usize,
    },

    /// A textual code list that does not parse as comma-separated integers.
    #[error("invalid code list entry {entry:?} at index {position}")]
    InvalidCodeList {
        /// The entry as written, trimmed.
        entry: String,
        /// Index of the entry in the list.
        position: usize,
    },
}

/// A specialized Result type for compression operations.
pub type Result<T> = std::result::Result<T, Error>;
