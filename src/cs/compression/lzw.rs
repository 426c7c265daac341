use std::cmp::Ordering;
use std::collections::HashMap;

use log::{debug, trace};

use super::{CompressionStats, Stepper, TextCompression};
use crate::cs::error::{Error, Result};

/// Number of single-symbol entries every dictionary starts with.
pub const INITIAL_DICTIONARY_SIZE: usize = 256;

/// Whether `symbol` has an entry in a fresh dictionary (`U+0000..=U+00FF`).
pub fn in_initial_alphabet(symbol: char) -> bool {
    (symbol as u32) < INITIAL_DICTIONARY_SIZE as u32
}

/// Bits needed to write any code of a dictionary with `size` entries.
fn bits_for(size: usize) -> u32 {
    if size <= 1 {
        0
    } else {
        usize::BITS - (size - 1).leading_zeros()
    }
}

/// Pattern table shared by the LZW encoder and its snapshots.
///
/// Codes are handed out in insertion order starting at 0, so the code of a
/// new pattern is always the size of the dictionary before it was added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LzwDictionary {
    codes: HashMap<String, u32>,
    patterns: Vec<String>,
}

impl Default for LzwDictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl LzwDictionary {
    /// A dictionary holding the 256 single-symbol entries.
    pub fn new() -> Self {
        let patterns: Vec<String> = (0..=u8::MAX).map(|b| char::from(b).to_string()).collect();
        let codes = patterns
            .iter()
            .enumerate()
            .map(|(code, pattern)| (pattern.clone(), code as u32))
            .collect();
        Self { codes, patterns }
    }

    pub fn code_of(&self, pattern: &str) -> Option<u32> {
        self.codes.get(pattern).copied()
    }

    pub fn pattern(&self, code: u32) -> Option<&str> {
        self.patterns.get(code as usize).map(String::as_str)
    }

    pub fn contains(&self, pattern: &str) -> bool {
        self.codes.contains_key(pattern)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Add `pattern` under the next free code and return that code.
    pub fn insert(&mut self, pattern: String) -> u32 {
        let code = self.patterns.len() as u32;
        self.codes.insert(pattern.clone(), code);
        self.patterns.push(pattern);
        code
    }

    /// `ceil(log2(len))`: display width of a code at the current size.
    pub fn bits_per_code(&self) -> u32 {
        bits_for(self.len())
    }

    /// `(code, pattern)` pairs in code order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> + '_ {
        self.patterns
            .iter()
            .enumerate()
            .map(|(code, pattern)| (code as u32, pattern.as_str()))
    }

    /// Only the entries learned from the input, past the initial 256.
    pub fn learned(&self) -> impl Iterator<Item = (u32, &str)> + '_ {
        self.iter().skip(INITIAL_DICTIONARY_SIZE)
    }
}

/// One code written by the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmittedCode {
    pub code: u32,
    /// Width of the code at the dictionary size it was written with.
    pub bits: u32,
}

/// Where an encoder session stands in its input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LzwCursor {
    /// Number of input symbols consumed.
    pub position: usize,
    /// Longest prefix matched so far, not yet written out.
    pub current: String,
    /// The symbol the next step will read.
    pub next_char: Option<char>,
}

/// The transition taken by one [`Stepper::step`] of an [`LzwEncoder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LzwStep {
    /// `current + next` is known, so the match grows.
    Extend { candidate: String },
    /// `current + next` is new: the code for `current` is written and the
    /// longer pattern is learned.
    FlushAndGrow {
        emitted: EmittedCode,
        prefix: String,
        added: String,
        added_code: u32,
    },
    /// End of input: the remaining match is written.
    FinalFlush { emitted: EmittedCode, prefix: String },
}

impl LzwStep {
    /// The code written by this step, if any.
    pub fn emitted(&self) -> Option<EmittedCode> {
        match self {
            LzwStep::Extend { .. } => None,
            LzwStep::FlushAndGrow { emitted, .. } | LzwStep::FinalFlush { emitted, .. } => {
                Some(*emitted)
            }
        }
    }

    /// One-line narration of the step.
    pub fn describe(&self) -> String {
        match self {
            LzwStep::Extend { candidate } => format!(
                "\"{candidate}\" is already in the dictionary, continuing to the next character"
            ),
            LzwStep::FlushAndGrow {
                emitted,
                prefix,
                added,
                added_code,
            } => format!(
                "Adding \"{added}\" to dictionary with code {added_code}, outputting code {} for \"{prefix}\"",
                emitted.code
            ),
            LzwStep::FinalFlush { emitted, prefix } => format!(
                "End of input, outputting code {} for \"{prefix}\"",
                emitted.code
            ),
        }
    }
}

/// Configuration for LZW runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LzwConfig {
    /// Width of one uncompressed symbol, for [`CompressionStats`]
    pub bits_per_symbol: usize,
}

impl Default for LzwConfig {
    fn default() -> Self {
        Self { bits_per_symbol: 8 }
    }
}

/// An LZW encoding session that can be advanced one input symbol at a time.
///
/// Each call to [`Stepper::step`] performs exactly one transition of the
/// encoder and leaves the dictionary, cursor and output open for inspection.
/// [`Stepper::finish`] drives the same transitions to the end, so stepping and
/// finishing always agree.
///
/// # Example
///
/// ```
/// use algoviz::cs::compression::{LzwEncoder, LzwStep, Stepper};
///
/// let mut encoder = LzwEncoder::new("abab").unwrap();
/// assert!(matches!(encoder.step(), Some(LzwStep::Extend { .. })));
/// encoder.finish();
/// assert_eq!(encoder.codes(), vec![97, 98, 256]);
/// assert_eq!(encoder.dictionary().pattern(256), Some("ab"));
/// ```
#[derive(Debug, Clone)]
pub struct LzwEncoder {
    input: Vec<char>,
    config: LzwConfig,
    dictionary: LzwDictionary,
    cursor: LzwCursor,
    current_code: Option<u32>,
    output: Vec<EmittedCode>,
}

impl LzwEncoder {
    /// Start a session over `input` with the default configuration.
    ///
    /// Fails with [`Error::UnknownSymbol`] if a symbol lies outside the
    /// 256-entry initial alphabet.
    pub fn new(input: &str) -> Result<Self> {
        Self::with_config(input, LzwConfig::default())
    }

    pub fn with_config(input: &str, config: LzwConfig) -> Result<Self> {
        let input: Vec<char> = input.chars().collect();
        if let Some((position, &symbol)) = input
            .iter()
            .enumerate()
            .find(|(_, symbol)| !in_initial_alphabet(**symbol))
        {
            return Err(Error::UnknownSymbol { symbol, position });
        }
        debug!("starting lzw session over {} symbols", input.len());
        let cursor = LzwCursor {
            next_char: input.first().copied(),
            ..LzwCursor::default()
        };
        Ok(Self {
            input,
            config,
            dictionary: LzwDictionary::new(),
            cursor,
            current_code: None,
            output: Vec::new(),
        })
    }

    pub fn cursor(&self) -> &LzwCursor {
        &self.cursor
    }

    pub fn dictionary(&self) -> &LzwDictionary {
        &self.dictionary
    }

    /// Codes written so far, with their display widths.
    pub fn output(&self) -> &[EmittedCode] {
        &self.output
    }

    /// Codes written so far.
    pub fn codes(&self) -> Vec<u32> {
        self.output.iter().map(|emitted| emitted.code).collect()
    }

    pub fn bits_per_code(&self) -> u32 {
        self.dictionary.bits_per_code()
    }

    /// Number of input symbols.
    pub fn input_len(&self) -> usize {
        self.input.len()
    }

    /// Sizes so far: the whole input against the codes written up to now.
    pub fn stats(&self) -> CompressionStats {
        let compressed_bits = self.output.iter().map(|e| e.bits as usize).sum();
        CompressionStats::new(
            self.input.len(),
            self.config.bits_per_symbol,
            compressed_bits,
        )
    }

    /// Consume the session, keeping what it produced.
    pub fn into_encoding(self) -> LzwEncoding {
        let stats = self.stats();
        LzwEncoding {
            output: self.output,
            dictionary: self.dictionary,
            stats,
        }
    }

    fn emit(&mut self, code: u32) -> EmittedCode {
        let emitted = EmittedCode {
            code,
            bits: self.dictionary.bits_per_code(),
        };
        self.output.push(emitted);
        emitted
    }
}

impl Stepper for LzwEncoder {
    type Step = LzwStep;

    fn step(&mut self) -> Option<LzwStep> {
        let Some(&next) = self.input.get(self.cursor.position) else {
            // End of input: write whatever is still matched.
            let code = self.current_code.take()?;
            let emitted = self.emit(code);
            let prefix = std::mem::take(&mut self.cursor.current);
            trace!("final flush of {prefix:?} as {code}");
            debug!(
                "lzw session finished: {} codes, {} dictionary entries",
                self.output.len(),
                self.dictionary.len()
            );
            return Some(LzwStep::FinalFlush { emitted, prefix });
        };

        let mut candidate = self.cursor.current.clone();
        candidate.push(next);
        self.cursor.position += 1;
        self.cursor.next_char = self.input.get(self.cursor.position).copied();

        let step = match (self.dictionary.code_of(&candidate), self.current_code) {
            (None, Some(prefix_code)) => {
                let emitted = self.emit(prefix_code);
                let added_code = self.dictionary.insert(candidate.clone());
                trace!("learn {candidate:?} as {added_code}, emit {prefix_code}");
                let prefix = std::mem::replace(&mut self.cursor.current, next.to_string());
                self.current_code = Some(u32::from(next));
                LzwStep::FlushAndGrow {
                    emitted,
                    prefix,
                    added: candidate,
                    added_code,
                }
            }
            // With nothing matched the candidate is one symbol, whose code is
            // its ordinal.
            (known, _) => {
                let code = known.unwrap_or(u32::from(next));
                trace!("extend to {candidate:?}");
                self.cursor.current.clone_from(&candidate);
                self.current_code = Some(code);
                LzwStep::Extend { candidate }
            }
        };
        Some(step)
    }

    fn is_finished(&self) -> bool {
        self.cursor.position >= self.input.len() && self.current_code.is_none()
    }

    fn reset(&mut self) {
        debug!("resetting lzw session");
        self.dictionary = LzwDictionary::new();
        self.cursor = LzwCursor {
            next_char: self.input.first().copied(),
            ..LzwCursor::default()
        };
        self.current_code = None;
        self.output.clear();
    }
}

/// Everything an LZW run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct LzwEncoding {
    pub output: Vec<EmittedCode>,
    /// The dictionary as it stood after the last code.
    pub dictionary: LzwDictionary,
    pub stats: CompressionStats,
}

impl LzwEncoding {
    pub fn codes(&self) -> Vec<u32> {
        self.output.iter().map(|emitted| emitted.code).collect()
    }
}

/// LZW coder holding its configuration.
#[derive(Debug, Clone, Default)]
pub struct Lzw {
    config: LzwConfig,
}

impl Lzw {
    pub fn new(config: LzwConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LzwConfig {
        &self.config
    }

    /// Start a steppable session over `input` with this configuration.
    pub fn session(&self, input: &str) -> Result<LzwEncoder> {
        LzwEncoder::with_config(input, self.config.clone())
    }
}

impl TextCompression for Lzw {
    type Encoded = LzwEncoding;

    fn compress(&self, input: &str) -> Result<LzwEncoding> {
        let mut encoder = self.session(input)?;
        encoder.finish();
        Ok(encoder.into_encoding())
    }

    /// An encoding without codes is the encoding of the empty text.
    fn decompress(&self, encoded: &LzwEncoding) -> Result<String> {
        if encoded.output.is_empty() {
            return Ok(String::new());
        }
        lzw_decode(&encoded.codes())
    }
}

/// Compresses the input text using the LZW algorithm.
///
/// # Details
///
/// The dictionary is initialized with all 256 single-symbol sequences.
/// Then, the algorithm finds the longest sequence `w` present in the dictionary that
/// is a prefix of the remaining input. It outputs the code for `w`, adds `w` concatenated
/// with the next symbol to the dictionary, and continues.
///
/// # Example
///
/// ```
/// use algoviz::cs::compression::lzw::lzw_encode;
///
/// let compressed = lzw_encode("TOBEORNOTTOBE").unwrap();
/// assert!(!compressed.is_empty());
/// ```
pub fn lzw_encode(input: &str) -> Result<Vec<u32>> {
    Ok(Lzw::default().compress(input)?.codes())
}

/// Decompresses a sequence of LZW codes back into the original text.
///
/// # Details
///
/// The dictionary is initialized with all 256 single-symbol sequences.
/// Then, for each code read, the corresponding dictionary entry is output.
/// The dictionary is updated by appending the first symbol of the current entry
/// to the previous entry. A code equal to the dictionary size refers to the
/// entry being defined by that very step.
///
/// # Errors
///
/// [`Error::EmptyInput`] for an empty slice, [`Error::InvalidLzwCode`] for a
/// code past the dictionary.
///
/// # Example
///
/// ```
/// use algoviz::cs::compression::lzw::{lzw_decode, lzw_encode};
///
/// let compressed = lzw_encode("TOBEORNOTTOBE").unwrap();
/// assert_eq!(lzw_decode(&compressed).unwrap(), "TOBEORNOTTOBE");
/// ```
pub fn lzw_decode(codes: &[u32]) -> Result<String> {
    let (&first, rest) = codes.split_first().ok_or(Error::EmptyInput)?;

    // Initialize the dictionary with all 256 single-symbol sequences.
    let mut dict: Vec<String> = (0..=u8::MAX).map(|b| char::from(b).to_string()).collect();
    let mut w = dict
        .get(first as usize)
        .cloned()
        .ok_or(Error::InvalidLzwCode {
            code: first,
            position: 0,
            dictionary_size: dict.len(),
        })?;
    let mut result = w.clone();

    for (offset, &code) in rest.iter().enumerate() {
        let entry = match (code as usize).cmp(&dict.len()) {
            Ordering::Less => dict[code as usize].clone(),
            Ordering::Equal => {
                // Special case: code equals dictionary size.
                let mut temp = w.clone();
                temp.extend(w.chars().next());
                temp
            }
            Ordering::Greater => {
                return Err(Error::InvalidLzwCode {
                    code,
                    position: offset + 1,
                    dictionary_size: dict.len(),
                })
            }
        };
        result.push_str(&entry);
        // Add new dictionary entry: w + first symbol of entry.
        let mut new_entry = w;
        new_entry.extend(entry.chars().next());
        dict.push(new_entry);
        w = entry;
    }
    debug!(
        "decoded {} lzw codes into {} symbols",
        codes.len(),
        result.chars().count()
    );
    Ok(result)
}

/// Parse a comma-separated code list such as `"97, 98, 256"`.
///
/// Whitespace around entries is ignored; blank text is an empty list.
pub fn parse_code_list(text: &str) -> Result<Vec<u32>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    text.split(',')
        .enumerate()
        .map(|(position, entry)| {
            let entry = entry.trim();
            entry.parse::<u32>().map_err(|_| Error::InvalidCodeList {
                entry: entry.to_string(),
                position,
            })
        })
        .collect()
}

/// Write codes in the form [`parse_code_list`] reads.
pub fn format_code_list(codes: &[u32]) -> String {
    codes
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        let compressed = lzw_encode("").unwrap();
        assert!(compressed.is_empty());
        assert_eq!(lzw_decode(&compressed), Err(Error::EmptyInput));
        let lzw = Lzw::default();
        let encoding = lzw.compress("").unwrap();
        assert_eq!(lzw.decompress(&encoding).unwrap(), "");
    }

    #[test]
    fn test_single_character() {
        let input = "AAAAAA";
        let compressed = lzw_encode(input).unwrap();
        // A, AA, AAA: the last code is the self-referencing case.
        assert_eq!(compressed, vec![65, 256, 257]);
        assert_eq!(lzw_decode(&compressed).unwrap(), input);
    }

    #[test]
    fn test_simple_string() {
        let input = "TOBEORNOTTOBE";
        let compressed = lzw_encode(input).unwrap();
        assert_eq!(lzw_decode(&compressed).unwrap(), input);
    }

    #[test]
    fn test_longer_input() {
        let input = "abracadabra abracadabra abracadabra";
        let compressed = lzw_encode(input).unwrap();
        assert!(compressed.len() < input.len());
        assert_eq!(lzw_decode(&compressed).unwrap(), input);
    }

    #[test]
    fn test_latin1_symbols() {
        let input = "déjà vu, déjà vu";
        let compressed = lzw_encode(input).unwrap();
        assert_eq!(lzw_decode(&compressed).unwrap(), input);
    }

    #[test]
    fn test_rejects_symbols_outside_alphabet() {
        let err = LzwEncoder::new("ab这").unwrap_err();
        assert_eq!(
            err,
            Error::UnknownSymbol {
                symbol: '这',
                position: 2
            }
        );
    }

    #[test]
    fn test_known_vector() {
        let mut encoder = LzwEncoder::new("abababab").unwrap();
        assert!(matches!(encoder.step(), Some(LzwStep::Extend { .. })));
        match encoder.step() {
            Some(LzwStep::FlushAndGrow {
                emitted,
                prefix,
                added,
                added_code,
            }) => {
                assert_eq!(emitted, EmittedCode { code: 97, bits: 8 });
                assert_eq!(prefix, "a");
                assert_eq!(added, "ab");
                assert_eq!(added_code, 256);
            }
            other => panic!("expected a flush, got {other:?}"),
        }
        assert_eq!(encoder.dictionary().code_of("ab"), Some(256));
        assert!(!encoder.dictionary().contains("ba"));

        encoder.finish();
        assert_eq!(encoder.codes(), vec![97, 98, 256, 258, 98]);
        assert_eq!(encoder.dictionary().len(), 260);
        let learned: Vec<&str> = encoder.dictionary().learned().map(|(_, p)| p).collect();
        assert_eq!(learned, vec!["ab", "ba", "aba", "abab"]);
        assert_eq!(lzw_decode(&encoder.codes()).unwrap(), "abababab");
    }

    #[test]
    fn test_cursor_tracks_position() {
        let mut encoder = LzwEncoder::new("abc").unwrap();
        assert_eq!(encoder.cursor().next_char, Some('a'));
        encoder.step();
        assert_eq!(encoder.cursor().position, 1);
        assert_eq!(encoder.cursor().current, "a");
        assert_eq!(encoder.cursor().next_char, Some('b'));
        encoder.step();
        encoder.step();
        assert_eq!(encoder.cursor().next_char, None);
        assert!(!encoder.is_finished());
        assert!(matches!(encoder.step(), Some(LzwStep::FinalFlush { .. })));
        assert!(encoder.is_finished());
        assert!(encoder.step().is_none());
        assert_eq!(encoder.cursor().current, "");
    }

    #[test]
    fn test_first_step_seeds_match_from_symbol() {
        // A session built without the alphabet check still extends from the
        // symbol's ordinal.
        let mut encoder = LzwEncoder {
            input: vec!['这', 'a'],
            config: LzwConfig::default(),
            dictionary: LzwDictionary::new(),
            cursor: LzwCursor::default(),
            current_code: None,
            output: Vec::new(),
        };
        assert!(matches!(encoder.step(), Some(LzwStep::Extend { candidate }) if candidate == "这"));
        assert_eq!(encoder.cursor().current, "这");
        assert!(encoder.output().is_empty());
        assert!(matches!(
            encoder.step(),
            Some(LzwStep::FlushAndGrow { added_code: 256, .. })
        ));
        assert_eq!(encoder.finish(), 1);
        assert_eq!(encoder.codes(), vec![0x8FD9, 97]);
    }

    #[test]
    fn test_step_and_finish_agree() {
        let input = "The quick brown fox jumps over the lazy dog. The quick brown fox";
        let mut stepped = LzwEncoder::new(input).unwrap();
        while stepped.step().is_some() {}

        let mut finished = LzwEncoder::new(input).unwrap();
        finished.step();
        finished.step();
        assert_eq!(finished.finish(), input.chars().count() + 1 - 2);

        assert_eq!(stepped.output(), finished.output());
        assert_eq!(stepped.dictionary(), finished.dictionary());
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut encoder = LzwEncoder::new("abababab").unwrap();
        encoder.finish();
        assert!(encoder.dictionary().len() > INITIAL_DICTIONARY_SIZE);
        encoder.reset();
        assert_eq!(encoder.dictionary(), &LzwDictionary::new());
        assert!(encoder.output().is_empty());
        assert_eq!(encoder.cursor().position, 0);
        assert_eq!(encoder.cursor().next_char, Some('a'));
        encoder.finish();
        assert_eq!(encoder.codes(), vec![97, 98, 256, 258, 98]);
    }

    #[test]
    fn test_bits_per_code() {
        assert_eq!(bits_for(1), 0);
        assert_eq!(bits_for(2), 1);
        assert_eq!(bits_for(256), 8);
        assert_eq!(bits_for(257), 9);
        assert_eq!(bits_for(512), 9);
        assert_eq!(bits_for(513), 10);
    }

    #[test]
    fn test_emitted_bits_follow_dictionary_growth() {
        let mut encoder = LzwEncoder::new("abababab").unwrap();
        encoder.finish();
        let bits: Vec<u32> = encoder.output().iter().map(|e| e.bits).collect();
        // Written at dictionary sizes 256, 257, 258, 259 and 260.
        assert_eq!(bits, vec![8, 9, 9, 9, 9]);
        let stats = encoder.stats();
        assert_eq!(stats.original_bits, 64);
        assert_eq!(stats.compressed_bits, 44);
    }

    #[test]
    fn test_describe() {
        let step = LzwStep::FlushAndGrow {
            emitted: EmittedCode { code: 97, bits: 8 },
            prefix: "a".to_string(),
            added: "ab".to_string(),
            added_code: 256,
        };
        assert_eq!(
            step.describe(),
            "Adding \"ab\" to dictionary with code 256, outputting code 97 for \"a\""
        );
        assert_eq!(step.emitted().map(|e| e.code), Some(97));
        assert!(LzwStep::Extend {
            candidate: "ab".to_string()
        }
        .emitted()
        .is_none());
    }

    #[test]
    fn test_decode_rejects_bad_codes() {
        assert_eq!(
            lzw_decode(&[300]),
            Err(Error::InvalidLzwCode {
                code: 300,
                position: 0,
                dictionary_size: 256
            })
        );
        assert_eq!(
            lzw_decode(&[97, 258]),
            Err(Error::InvalidLzwCode {
                code: 258,
                position: 1,
                dictionary_size: 256
            })
        );
        // Equal to the size is the self-reference case.
        assert_eq!(lzw_decode(&[97, 256]).unwrap(), "aaa");
    }

    #[test]
    fn test_code_list_text() {
        assert_eq!(
            parse_code_list(" 97, 98,256 ,258\n").unwrap(),
            vec![97, 98, 256, 258]
        );
        assert_eq!(parse_code_list("  ").unwrap(), Vec::<u32>::new());
        assert_eq!(
            parse_code_list("97, x"),
            Err(Error::InvalidCodeList {
                entry: "x".to_string(),
                position: 1
            })
        );
        assert!(parse_code_list("97,,98").is_err());
        assert_eq!(format_code_list(&[97, 98, 256]), "97, 98, 256");
        assert_eq!(format_code_list(&[]), "");
    }
}
