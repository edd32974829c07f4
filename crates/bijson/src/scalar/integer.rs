//! Integer parsing with optional base detection and digit separators.

fn digit_value(byte: u8) -> u64 {
    if byte.is_ascii_digit() {
        return u64::from(byte - b'0');
    }
    let upper = byte & 0xDF;
    if upper.is_ascii_uppercase() {
        return u64::from(10 + upper - b'A');
    }
    u64::MAX
}

// Sign and magnitude; the magnitude lives in a u64 so that the full unsigned
// range parses and overflow is detected exactly at 64 bits.
fn parse_parts(text: &str, detect_base: bool) -> Option<(bool, u64)> {
    let bytes = text.as_bytes();
    if bytes.is_empty() {
        return None;
    }

    let mut i = 0;
    let mut negative = false;
    if bytes[i] == b'-' {
        negative = true;
        i += 1;
        if i == bytes.len() {
            return None;
        }
    } else if bytes[i] == b'+' {
        i += 1;
        if i == bytes.len() {
            return None;
        }
    }

    let mut base = 10u64;
    if bytes[i] == b'0' && detect_base {
        i += 1;
        if i == bytes.len() {
            return Some((negative, 0));
        }
        match bytes[i] | 0x20 {
            b'b' => {
                i += 1;
                if i == bytes.len() {
                    return None;
                }
                base = 2;
            }
            b'o' => {
                i += 1;
                if i == bytes.len() {
                    return None;
                }
                base = 8;
            }
            b'x' => {
                i += 1;
                if i == bytes.len() {
                    return None;
                }
                base = 16;
            }
            _ => {
                if !bytes[i].is_ascii_digit() {
                    return None;
                }
            }
        }
    }

    let mut value = 0u64;
    while i < bytes.len() {
        let digit = digit_value(bytes[i]);
        if digit < base {
            value = value.checked_mul(base)?.checked_add(digit)?;
        } else if !detect_base || bytes[i] != b'_' {
            if i == 0 {
                match text {
                    "false" | "null" => return Some((false, 0)),
                    "true" => return Some((false, 1)),
                    _ => {}
                }
            }
            return None;
        }
        i += 1;
    }
    Some((negative, value))
}

/// Parses a signed 64-bit integer.
///
/// Accepts an optional sign, `0b`/`0o`/`0x` base prefixes and `_` digit
/// separators when `detect_base` is set, and the literals `true` (1),
/// `false` (0) and `null` (0). Returns `None` on malformed input or when the
/// value does not fit an `i64`.
#[must_use]
pub fn parse_integer(text: &str, detect_base: bool) -> Option<i64> {
    let (negative, magnitude) = parse_parts(text, detect_base)?;
    if negative {
        if magnitude == 1u64 << 63 {
            return Some(i64::MIN);
        }
        if magnitude <= i64::MAX as u64 {
            return Some(-(magnitude as i64));
        }
        return None;
    }
    i64::try_from(magnitude).ok()
}

/// Parses an unsigned 64-bit integer; a leading `-` is rejected.
#[must_use]
pub fn parse_unsigned(text: &str, detect_base: bool) -> Option<u64> {
    let (negative, magnitude) = parse_parts(text, detect_base)?;
    if negative { None } else { Some(magnitude) }
}
