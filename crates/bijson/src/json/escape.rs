//! String escape decoding.
//!
//! The dialect is permissive: the JSON escapes `\b \f \n \r \t \" \\ \/`
//! and `\uXXXX` (with surrogate pairs) decode as usual, and any other
//! escaped character stands for itself, which covers `\'` in single-quoted
//! strings.

use crate::error::{Error, ErrorKind};

fn invalid(message: String) -> Error {
    Error::from(ErrorKind::UnexpectedToken(message))
}

fn hex_escape(chars: &mut std::str::Chars<'_>) -> Result<u32, Error> {
    let mut value = 0u32;
    for _ in 0..4 {
        let c = chars
            .next()
            .ok_or_else(|| invalid("truncated unicode escape".into()))?;
        let digit = c
            .to_digit(16)
            .ok_or_else(|| invalid(format!("invalid unicode escape character: '{c}'")))?;
        value = value * 16 + digit;
    }
    Ok(value)
}

/// Decodes the escape sequences in a string token's content.
pub(crate) fn unescape(text: &str) -> Result<String, Error> {
    if !text.contains('\\') {
        return Ok(text.to_owned());
    }
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        let escaped = chars
            .next()
            .ok_or_else(|| invalid("truncated escape sequence".into()))?;
        match escaped {
            'b' => result.push('\u{8}'),
            'f' => result.push('\u{c}'),
            'n' => result.push('\n'),
            'r' => result.push('\r'),
            't' => result.push('\t'),
            'u' => {
                let high = hex_escape(&mut chars)?;
                let code = if (0xD800..0xDC00).contains(&high) {
                    if chars.next() != Some('\\') || chars.next() != Some('u') {
                        return Err(invalid(format!(
                            "unpaired surrogate in unicode escape: {high:04X}"
                        )));
                    }
                    let low = hex_escape(&mut chars)?;
                    if !(0xDC00..0xE000).contains(&low) {
                        return Err(invalid(format!(
                            "invalid low surrogate in unicode escape: {low:04X}"
                        )));
                    }
                    0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
                } else {
                    high
                };
                let c = char::from_u32(code)
                    .ok_or_else(|| invalid(format!("invalid unicode escape: {code:04X}")))?;
                result.push(c);
            }
            other => result.push(other),
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(unescape("hello").unwrap(), "hello");
        assert_eq!(unescape("").unwrap(), "");
    }

    #[test]
    fn standard_escapes() {
        assert_eq!(unescape(r"a\nb\tc").unwrap(), "a\nb\tc");
        assert_eq!(unescape(r#"\"quoted\""#).unwrap(), "\"quoted\"");
        assert_eq!(unescape(r"c:\\path\\to").unwrap(), r"c:\path\to");
        assert_eq!(unescape(r"\/slash").unwrap(), "/slash");
        assert_eq!(unescape(r"\'single\'").unwrap(), "'single'");
        assert_eq!(unescape(r"\b\f").unwrap(), "\u{8}\u{c}");
    }

    #[test]
    fn unicode_escapes() {
        assert_eq!(unescape(r"\u0041").unwrap(), "A");
        assert_eq!(unescape(r"\u00e5").unwrap(), "å");
        assert_eq!(unescape(r"\uD83D\uDE00").unwrap(), "\u{1F600}");
    }

    #[test]
    fn bad_unicode_escapes() {
        assert!(unescape(r"\u00").is_err());
        assert!(unescape(r"\u00zz").is_err());
        assert!(unescape(r"\uD83D").is_err());
        assert!(unescape(r"\uD83Dx").is_err());
        assert!(unescape(r"\uD83D\u0041").is_err());
    }

    #[test]
    fn trailing_backslash_fails() {
        assert!(unescape("abc\\").is_err());
    }
}
