//! Quote-aware scanning over connection URL fragments.
//!
//! Text between a pair of `'` or `"` characters is opaque: delimiters inside
//! it are not treated as separators. An unterminated quote makes the rest of
//! the input opaque.

/// Characters that open and close an opaque section.
pub const ALLOWED_QUOTES: [char; 2] = ['"', '\''];

/// Byte offset of the first `needle` outside quotes.
pub fn find_unquoted(input: &str, needle: char) -> Option<usize> {
    let mut open: Option<char> = None;
    for (pos, c) in input.char_indices() {
        match open {
            Some(quote) if c == quote => open = None,
            Some(_) => {}
            None if ALLOWED_QUOTES.contains(&c) => open = Some(c),
            None if c == needle => return Some(pos),
            None => {}
        }
    }
    None
}

/// Split on `delimiter` outside quotes.
///
/// Interior empty tokens are kept; a trailing delimiter does not produce a
/// final empty token.
pub fn split_unquoted(input: &str, delimiter: char, trim: bool) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut rest = input;

    while let Some(pos) = find_unquoted(rest, delimiter) {
        push_token(&mut tokens, &rest[..pos], trim);
        rest = &rest[pos + delimiter.len_utf8()..];
    }
    if !rest.is_empty() {
        push_token(&mut tokens, rest, trim);
    }

    tokens
}

fn push_token(tokens: &mut Vec<String>, token: &str, trim: bool) {
    tokens.push(if trim { token.trim() } else { token }.to_string());
}

/// Strip one pair of matching surrounding quotes.
pub fn unquote(value: &str) -> &str {
    for quote in ALLOWED_QUOTES {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// ASCII case-insensitive prefix test.
pub fn starts_with_ignore_case(input: &str, prefix: &str) -> bool {
    input
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_skips_quoted() {
        assert_eq!(find_unquoted("a/b", '/'), Some(1));
        assert_eq!(find_unquoted("'a/b'/c", '/'), Some(5));
        assert_eq!(find_unquoted("\"a/b", '/'), None);
    }

    #[test]
    fn test_split_keeps_interior_empty() {
        assert_eq!(split_unquoted("a,,b", ',', false), vec!["a", "", "b"]);
        assert_eq!(split_unquoted("a,b,", ',', false), vec!["a", "b"]);
        assert!(split_unquoted("", ',', false).is_empty());
    }

    #[test]
    fn test_split_respects_quotes() {
        assert_eq!(
            split_unquoted("x='a,b',y", ',', false),
            vec!["x='a,b'", "y"]
        );
    }

    #[test]
    fn test_split_trims() {
        assert_eq!(split_unquoted(" a , b ", ',', true), vec!["a", "b"]);
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("'abc'"), "abc");
        assert_eq!(unquote("\"abc\""), "abc");
        assert_eq!(unquote("'abc\""), "'abc\"");
        assert_eq!(unquote("'"), "'");
    }

    #[test]
    fn test_starts_with_ignore_case() {
        assert!(starts_with_ignore_case("MySQL://x", "mysql://"));
        assert!(!starts_with_ignore_case("my", "mysql://"));
    }
}
