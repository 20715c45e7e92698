//! Printable rendering of terminal responses for diagnostics

/// Letters used after `^` for the control bytes 0x00..=0x1F
const CARET_LETTERS: &[u8; 32] = b"@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^_";

/// Render `src` with control bytes in caret notation (`ESC` becomes `^[`,
/// `DEL` becomes `^?`). Other bytes are passed through.
pub fn render(src: &[u8]) -> String {
    render_bounded(src, usize::MAX)
}

/// Like [`render`], but never produce more than `capacity` characters.
///
/// Output is cut at the last whole character that fits; a caret pair is never
/// split.
pub fn render_bounded(src: &[u8], capacity: usize) -> String {
    let mut out = String::with_capacity(src.len().saturating_mul(2).min(capacity));
    let mut count = 0usize;

    for &byte in src {
        let (first, second) = match byte {
            0x00..=0x1f => ('^', Some(CARET_LETTERS[byte as usize] as char)),
            0x7f => ('^', Some('?')),
            _ => (char::from(byte), None),
        };

        let width = if second.is_some() { 2 } else { 1 };
        if count + width > capacity {
            break;
        }

        out.push(first);
        if let Some(c) = second {
            out.push(c);
        }
        count += width;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printable_ascii_unchanged() {
        assert_eq!(render(b"vt100 ready"), "vt100 ready");
    }

    #[test]
    fn test_escape_bracket() {
        assert_eq!(render(b"\x1b["), "^[[");
        assert_eq!(render(b"\x1b[?1;2c"), "^[[?1;2c");
    }

    #[test]
    fn test_all_control_bytes() {
        assert_eq!(render(&[0x00]), "^@");
        assert_eq!(render(&[0x07]), "^G");
        assert_eq!(render(b"\r\n"), "^M^J");
        assert_eq!(render(&[0x1c, 0x1d, 0x1e, 0x1f]), "^\\^]^^^_");
        assert_eq!(render(&[0x7f]), "^?");
    }

    #[test]
    fn test_embedded_nul_is_rendered_not_terminating() {
        assert_eq!(render(b"a\0b"), "a^@b");
    }

    #[test]
    fn test_bounded_truncates_without_splitting_pairs() {
        assert_eq!(render_bounded(b"ab\x1bc", 3), "ab");
        assert_eq!(render_bounded(b"ab\x1bc", 4), "ab^[");
        assert_eq!(render_bounded(b"\x1b", 1), "");
        assert_eq!(render_bounded(b"abc", 0), "");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_printable_ascii_is_identity(s in "[ -~]{0,64}") {
                prop_assert_eq!(render(s.as_bytes()), s);
            }

            #[test]
            fn prop_bounded_respects_capacity(
                bytes in prop::collection::vec(any::<u8>(), 0..128),
                capacity in 0usize..96
            ) {
                let out = render_bounded(&bytes, capacity);
                prop_assert!(out.chars().count() <= capacity);
                prop_assert!(render(&bytes).starts_with(&out));
            }

            #[test]
            fn prop_control_bytes_never_leak(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
                let out = render(&bytes);
                prop_assert!(!out.chars().any(|c| (c as u32) < 0x20 || c as u32 == 0x7f));
            }
        }
    }
}
