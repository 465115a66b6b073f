//! Char/byte offset conversion for `str` content.
//!
//! Buffer and tokenizer offsets are counted in chars (Unicode scalar values);
//! slicing a `String` needs byte offsets.

/// Byte index of the `char_idx`-th char, or `None` when past the end.
/// `char_idx == char_len` maps to `s.len()`.
pub fn byte_index(s: &str, char_idx: usize) -> Option<usize> {
    if char_idx == 0 {
        return Some(0);
    }
    let mut seen = 0;
    for (byte, _) in s.char_indices() {
        if seen == char_idx {
            return Some(byte);
        }
        seen += 1;
    }
    (seen == char_idx).then_some(s.len())
}

/// Number of chars in `s[..byte_idx]`.
pub fn char_index(s: &str, byte_idx: usize) -> usize {
    s[..byte_idx].chars().count()
}

pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_index_ascii() {
        assert_eq!(byte_index("hello", 0), Some(0));
        assert_eq!(byte_index("hello", 3), Some(3));
        assert_eq!(byte_index("hello", 5), Some(5));
        assert_eq!(byte_index("hello", 6), None);
    }

    #[test]
    fn test_byte_index_multibyte() {
        let s = "héllo wörld";
        assert_eq!(byte_index(s, 2), Some(3));
        assert_eq!(byte_index(s, char_len(s)), Some(s.len()));
        assert_eq!(char_index(s, 3), 2);
    }

    #[test]
    fn test_empty() {
        assert_eq!(byte_index("", 0), Some(0));
        assert_eq!(byte_index("", 1), None);
        assert_eq!(char_len(""), 0);
    }
}
