//! String folding used to make record fields comparable.
//!
//! Every comparison in the cache and allocator goes through [`fold`]: case,
//! runs of whitespace and diacritics are all erased, so `"  Đang  Chạy "`
//! and `"dang chay"` compare equal.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Fold a string to its canonical comparison form.
///
/// Lowercases, strips combining marks after NFD decomposition, maps the
/// stroke letters that have no decomposition (`đ`, `ł`, `ø`), trims and
/// collapses inner whitespace to a single space.
pub fn fold(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_space = false;

    for ch in input.nfd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        for lower in ch.to_lowercase() {
            out.push(fold_stroke(lower));
        }
    }

    out
}

fn fold_stroke(ch: char) -> char {
    match ch {
        'đ' => 'd',
        'ł' => 'l',
        'ø' => 'o',
        'ħ' => 'h',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_case_and_whitespace() {
        assert_eq!(fold("  Waiting   Registration \t"), "waiting registration");
        assert_eq!(fold("RUNNING"), "running");
        assert_eq!(fold(""), "");
        assert_eq!(fold("   "), "");
    }

    #[test]
    fn test_fold_diacritics() {
        assert_eq!(fold("Đang Chạy"), "dang chay");
        assert_eq!(fold("Chờ đăng nhập"), "cho dang nhap");
        assert_eq!(fold("Café"), "cafe");
    }

    #[test]
    fn test_fold_keeps_punctuation() {
        assert_eq!(fold("Dev-01 "), "dev-01");
        assert_eq!(fold("A@Mail.Example.com"), "a@mail.example.com");
        assert_ne!(fold("dev-01"), fold("dev-02"));
    }
}
