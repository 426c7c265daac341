//! Preset inputs that show off different compression behaviour.

/// Three symbols with skewed frequencies; the default demo text.
pub const SIMPLE: &str = "AABCABAACAABCABCABAAACAABBCA";

/// One short pattern repeated many times, the best case for LZW.
pub const REPEATING_PATTERNS: &str =
    "abcabcabcabcabcabcabcabcabcabcabcabcabcabcabcabcabcabcabcabc";

pub const ENGLISH_TEXT: &str = "The quick brown fox jumps over the lazy dog. The quick brown fox jumps over the lazy dog. The quick brown fox jumps over the lazy dog.";

pub const HTML_MARKUP: &str = r#"<div class="container"><div class="header"><h1>Hello World</h1></div><div class="content"><p>This is a paragraph.</p><p>This is another paragraph.</p></div><div class="footer"><p>Copyright 2023</p></div></div>"#;

pub const ASCII_ART: &str = r"
    /\_/\
   ( o.o )
    > ^ <
   /     \
  /       \
 /         \
/           \
/\_/\       /\_/\
( o.o )     ( o.o )
 > ^ <       > ^ <
  ";

/// Every preset with a short name.
pub const ALL: [(&str, &str); 5] = [
    ("simple", SIMPLE),
    ("repeating-patterns", REPEATING_PATTERNS),
    ("english-text", ENGLISH_TEXT),
    ("html-markup", HTML_MARKUP),
    ("ascii-art", ASCII_ART),
];

/// Look up a preset by its short name.
pub fn by_name(name: &str) -> Option<&'static str> {
    ALL.iter()
        .find(|(preset, _)| *preset == name)
        .map(|(_, text)| *text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cs::compression::{huffman_decode, huffman_encode, lzw_decode, lzw_encode};

    #[test]
    fn test_by_name() {
        assert_eq!(by_name("simple"), Some(SIMPLE));
        assert_eq!(by_name("missing"), None);
    }

    #[test]
    fn test_presets_round_trip() {
        for (name, text) in ALL {
            let huffman = huffman_encode(text).unwrap();
            assert_eq!(
                huffman_decode(&huffman.encoded, huffman.tree()).unwrap(),
                text,
                "huffman round trip failed for {name}"
            );
            let codes = lzw_encode(text).unwrap();
            assert_eq!(lzw_decode(&codes).unwrap(), text, "lzw round trip failed for {name}");
        }
    }

    #[test]
    fn test_repeating_patterns_favour_lzw() {
        let codes = lzw_encode(REPEATING_PATTERNS).unwrap();
        assert!(codes.len() * 3 < REPEATING_PATTERNS.len());
    }
}
