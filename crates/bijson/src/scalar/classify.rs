//! Syntactic value-type classification.
//!
//! Both classifiers scan the textual form of a scalar without building the
//! value. The detailed classifier additionally narrows integers to the
//! smallest category that contains them by comparing digit strings against
//! per-base threshold tables; it never parses, so arbitrarily long digit
//! strings classify as `BigInt` instead of overflowing.

use crate::value_type::{DetailedValueType, ValueType};

fn digit(byte: u8) -> u8 {
    if byte.is_ascii_digit() { byte - b'0' } else { 0xFF }
}

fn legal_underscore(s: &[u8], i: usize) -> bool {
    s[i] == b'_' && i > 0 && i < s.len() - 1 && s[i - 1] != b'_'
}

/// Classifies `text` as one of the coarse value types.
#[must_use]
pub fn get_value_type(text: &str) -> ValueType {
    let s = text.as_bytes();
    if s.is_empty() {
        return ValueType::Invalid;
    }
    let mut assumed = ValueType::Unknown;
    let mut i = 0;
    if s[i] == b'-' || s[i] == b'+' {
        i += 1;
        if i == s.len() {
            return ValueType::Invalid;
        }
        assumed = ValueType::Integer;
    }

    if s[i] == b'0' {
        i += 1;
        if i == s.len() {
            return ValueType::Integer;
        }
        return match s[i] {
            b'b' | b'B' => radix_type(&s[i + 1..], |b| digit(b) <= 1),
            b'o' | b'O' => radix_type(&s[i + 1..], |b| digit(b) <= 7),
            b'x' | b'X' => radix_type(&s[i + 1..], |b| b.is_ascii_hexdigit()),
            b'.' | b'e' | b'E' => float_type(&s[i..]),
            _ => number_type(&s[i..]),
        };
    } else if digit(s[i]) <= 9 {
        return number_type(&s[i..]);
    }

    if &text[i..] == "Infinity" {
        return ValueType::Float;
    }
    if text == "NaN" {
        return ValueType::Float;
    }
    if assumed != ValueType::Unknown {
        return ValueType::Invalid;
    }
    match text {
        "true" | "false" => ValueType::Boolean,
        "null" => ValueType::Null,
        _ => ValueType::Invalid,
    }
}

fn radix_type(s: &[u8], is_digit: impl Fn(u8) -> bool) -> ValueType {
    if s.is_empty() {
        return ValueType::Invalid;
    }
    for i in 0..s.len() {
        if is_digit(s[i]) || legal_underscore(s, i) {
            continue;
        }
        return ValueType::Invalid;
    }
    ValueType::Integer
}

fn number_type(s: &[u8]) -> ValueType {
    for i in 0..s.len() {
        if digit(s[i]) <= 9 || legal_underscore(s, i) {
            continue;
        }
        if (s[i] == b'.' || s[i] == b'e' || s[i] == b'E') && i != 0 && s[i - 1] != b'_' {
            return float_type(&s[i..]);
        }
        return ValueType::Invalid;
    }
    ValueType::Integer
}

// Classifies the tail of a number starting at its `.` or exponent marker.
fn float_type(s: &[u8]) -> ValueType {
    let mut s = s;
    if s[0] == b'.' {
        let mut i = 1;
        while i < s.len() {
            if digit(s[i]) <= 9 {
                i += 1;
                continue;
            }
            if s[i - 1] == b'_' {
                return ValueType::Invalid;
            }
            if s[i] == b'_' && 1 < i && i < s.len() - 1 {
                i += 1;
                continue;
            }
            if s[i] == b'e' || s[i] == b'E' {
                s = &s[i..];
                break;
            }
            return ValueType::Invalid;
        }
        if s[0] == b'.' {
            return ValueType::Float;
        }
    }

    if s[0] != b'e' && s[0] != b'E' {
        return ValueType::Invalid;
    }
    if s.len() == 1 {
        return ValueType::Invalid;
    }
    if s[1] != b'+' && s[1] != b'-' {
        s = &s[1..];
    } else {
        if s.len() == 2 {
            return ValueType::Invalid;
        }
        s = &s[2..];
    }
    for i in 0..s.len() {
        if digit(s[i]) <= 9 || legal_underscore(s, i) {
            continue;
        }
        return ValueType::Invalid;
    }
    ValueType::Float
}

/// Classifies `text` as one of the fine-grained value types.
#[must_use]
pub fn get_detailed_value_type(text: &str) -> DetailedValueType {
    let s = text.as_bytes();
    if s.is_empty() {
        return DetailedValueType::Invalid;
    }
    let mut assumed = DetailedValueType::Unknown;
    let mut i = 0;
    let mut negative = false;
    if s[i] == b'-' || s[i] == b'+' {
        negative = s[i] == b'-';
        i += 1;
        if i == s.len() {
            return DetailedValueType::Invalid;
        }
        assumed = DetailedValueType::BigInt;
    }

    if s[i] == b'0' {
        i += 1;
        if i == s.len() {
            return DetailedValueType::UInt7;
        }
        return match s[i] {
            b'b' | b'B' => pow2_number_type(
                &s[i + 1..],
                negative,
                |b| digit(b) <= 1,
                if negative {
                    &NEGATIVE_BINARY_THRESHOLDS[..]
                } else {
                    &POSITIVE_BINARY_THRESHOLDS[..]
                },
            ),
            b'o' | b'O' => pow2_number_type(
                &s[i + 1..],
                negative,
                |b| digit(b) <= 7,
                if negative {
                    &NEGATIVE_OCTAL_THRESHOLDS[..]
                } else {
                    &POSITIVE_OCTAL_THRESHOLDS[..]
                },
            ),
            b'x' | b'X' => pow2_number_type(
                &s[i + 1..],
                negative,
                |b| b.is_ascii_hexdigit(),
                if negative {
                    &NEGATIVE_HEXADECIMAL_THRESHOLDS[..]
                } else {
                    &POSITIVE_HEXADECIMAL_THRESHOLDS[..]
                },
            ),
            b'.' | b'e' | b'E' => detailed_float_type(&s[i..]),
            _ => decimal_number_type(&s[i..], negative),
        };
    } else if digit(s[i]) <= 9 {
        return decimal_number_type(&s[i..], negative);
    }

    if &text[i..] == "Infinity" {
        return DetailedValueType::Float64;
    }
    if text == "NaN" {
        return DetailedValueType::Float64;
    }
    if assumed != DetailedValueType::Unknown {
        return DetailedValueType::Invalid;
    }
    match text {
        "true" | "false" => DetailedValueType::Boolean,
        "null" => DetailedValueType::Null,
        _ => DetailedValueType::Invalid,
    }
}

fn detailed_float_type(s: &[u8]) -> DetailedValueType {
    if float_type(s) == ValueType::Float {
        DetailedValueType::Float64
    } else {
        DetailedValueType::Invalid
    }
}

fn all_zeros(s: &[u8]) -> bool {
    s.iter().all(|&b| b == b'0' || b == b'_')
}

// Digit-string comparison that skips underscores in the probe string; both
// operands must have had leading zeros removed.
fn is_less_or_equal_number(s: &[u8], cmp: &[u8]) -> bool {
    let mut i = 0;
    let mut j = 0;
    while i < s.len() && j < cmp.len() {
        if s[i] != cmp[j] {
            if s[i] != b'_' {
                return s[i] < cmp[j];
            }
            i += 1;
        } else {
            i += 1;
            j += 1;
        }
    }
    while i < s.len() && s[i] == b'_' {
        i += 1;
    }
    i == s.len() && j == cmp.len()
}

type DecimalThreshold = (&'static str, DetailedValueType);

const POSITIVE_DECIMAL_THRESHOLDS: [DecimalThreshold; 8] = [
    ("127", DetailedValueType::UInt7),
    ("255", DetailedValueType::UInt8),
    ("32767", DetailedValueType::UInt15),
    ("65535", DetailedValueType::UInt16),
    ("2147483647", DetailedValueType::UInt31),
    ("4294967295", DetailedValueType::UInt32),
    ("9223372036854775807", DetailedValueType::UInt63),
    ("18446744073709551615", DetailedValueType::UInt64),
];

const NEGATIVE_DECIMAL_THRESHOLDS: [DecimalThreshold; 4] = [
    ("128", DetailedValueType::SInt8),
    ("32768", DetailedValueType::SInt16),
    ("2147483648", DetailedValueType::SInt32),
    ("9223372036854775808", DetailedValueType::SInt64),
];

// (digit count, highest leading digit, category)
type Pow2Threshold = (usize, u8, DetailedValueType);

const POSITIVE_BINARY_THRESHOLDS: [Pow2Threshold; 8] = [
    (7, b'1', DetailedValueType::UInt7),
    (8, b'1', DetailedValueType::UInt8),
    (15, b'1', DetailedValueType::UInt15),
    (16, b'1', DetailedValueType::UInt16),
    (31, b'1', DetailedValueType::UInt31),
    (32, b'1', DetailedValueType::UInt32),
    (63, b'1', DetailedValueType::UInt63),
    (64, b'1', DetailedValueType::UInt64),
];

const NEGATIVE_BINARY_THRESHOLDS: [Pow2Threshold; 4] = [
    (8, b'1', DetailedValueType::SInt8),
    (16, b'1', DetailedValueType::SInt16),
    (32, b'1', DetailedValueType::SInt32),
    (64, b'1', DetailedValueType::SInt64),
];

const POSITIVE_OCTAL_THRESHOLDS: [Pow2Threshold; 8] = [
    (3, b'1', DetailedValueType::UInt7),
    (3, b'3', DetailedValueType::UInt8),
    (5, b'7', DetailedValueType::UInt15),
    (6, b'1', DetailedValueType::UInt16),
    (11, b'1', DetailedValueType::UInt31),
    (11, b'3', DetailedValueType::UInt32),
    (21, b'7', DetailedValueType::UInt63),
    (22, b'1', DetailedValueType::UInt64),
];

const NEGATIVE_OCTAL_THRESHOLDS: [Pow2Threshold; 4] = [
    (3, b'2', DetailedValueType::SInt8),
    (6, b'1', DetailedValueType::SInt16),
    (11, b'2', DetailedValueType::SInt32),
    (22, b'1', DetailedValueType::SInt64),
];

const POSITIVE_HEXADECIMAL_THRESHOLDS: [Pow2Threshold; 8] = [
    (2, b'7', DetailedValueType::UInt7),
    (2, b'F', DetailedValueType::UInt8),
    (4, b'7', DetailedValueType::UInt15),
    (4, b'F', DetailedValueType::UInt16),
    (8, b'7', DetailedValueType::UInt31),
    (8, b'F', DetailedValueType::UInt32),
    (16, b'7', DetailedValueType::UInt63),
    (16, b'F', DetailedValueType::UInt64),
];

const NEGATIVE_HEXADECIMAL_THRESHOLDS: [Pow2Threshold; 4] = [
    (2, b'8', DetailedValueType::SInt8),
    (4, b'8', DetailedValueType::SInt16),
    (8, b'8', DetailedValueType::SInt32),
    (16, b'8', DetailedValueType::SInt64),
];

fn skip_leading_zeros(s: &[u8]) -> &[u8] {
    for i in 0..s.len() {
        if s[i] == b'0' || legal_underscore(s, i) {
            continue;
        }
        return &s[i..];
    }
    &[]
}

fn decimal_threshold_type(
    s: &[u8],
    digits: usize,
    thresholds: &[DecimalThreshold],
) -> DetailedValueType {
    for (limit, category) in thresholds {
        if digits < limit.len() {
            return *category;
        }
        if digits == limit.len() && is_less_or_equal_number(s, limit.as_bytes()) {
            return *category;
        }
    }
    DetailedValueType::BigInt
}

fn pow2_threshold_type(
    s: &[u8],
    digits: usize,
    thresholds: &[Pow2Threshold],
    check_subsequent_digits: bool,
) -> DetailedValueType {
    for &(limit, lead, category) in thresholds {
        if digits < limit {
            return category;
        }
        if digits > limit {
            continue;
        }
        let first = s[0].to_ascii_uppercase();
        if first < lead {
            return category;
        }
        if first > lead {
            continue;
        }
        if !check_subsequent_digits || all_zeros(&s[1..]) {
            return category;
        }
    }
    DetailedValueType::BigInt
}

fn pow2_number_type(
    s: &[u8],
    negative: bool,
    is_digit: impl Fn(u8) -> bool,
    thresholds: &[Pow2Threshold],
) -> DetailedValueType {
    if s.is_empty() {
        return DetailedValueType::Invalid;
    }
    let s = skip_leading_zeros(s);
    let mut digit_count = 0;
    for i in 0..s.len() {
        if is_digit(s[i]) {
            digit_count += 1;
        } else if !legal_underscore(s, i) {
            return DetailedValueType::Invalid;
        }
    }
    pow2_threshold_type(s, digit_count, thresholds, negative)
}

fn decimal_number_type(s: &[u8], negative: bool) -> DetailedValueType {
    let s = skip_leading_zeros(s);
    let mut digit_count = 0;
    for i in 0..s.len() {
        if digit(s[i]) <= 9 {
            digit_count += 1;
            continue;
        }
        if legal_underscore(s, i) {
            continue;
        }
        if (s[i] == b'.' || s[i] == b'e' || s[i] == b'E') && i != 0 && s[i - 1] != b'_' {
            return detailed_float_type(&s[i..]);
        }
        return DetailedValueType::Invalid;
    }
    if digit_count == 0 {
        return DetailedValueType::UInt7;
    }
    decimal_threshold_type(
        s,
        digit_count,
        if negative {
            &NEGATIVE_DECIMAL_THRESHOLDS[..]
        } else {
            &POSITIVE_DECIMAL_THRESHOLDS[..]
        },
    )
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::value_type::DetailedValueType as D;

    #[rstest]
    #[case("0", ValueType::Integer)]
    #[case("1234", ValueType::Integer)]
    #[case("-1234", ValueType::Integer)]
    #[case("1_000", ValueType::Integer)]
    #[case("0x1F", ValueType::Integer)]
    #[case("0b1010", ValueType::Integer)]
    #[case("0o777", ValueType::Integer)]
    #[case("1.5", ValueType::Float)]
    #[case("123.", ValueType::Float)]
    #[case("123.e-2", ValueType::Float)]
    #[case("1e10", ValueType::Float)]
    #[case("0.5", ValueType::Float)]
    #[case("0.5e-3", ValueType::Float)]
    #[case("Infinity", ValueType::Float)]
    #[case("-Infinity", ValueType::Float)]
    #[case("NaN", ValueType::Float)]
    #[case("true", ValueType::Boolean)]
    #[case("false", ValueType::Boolean)]
    #[case("null", ValueType::Null)]
    #[case("", ValueType::Invalid)]
    #[case("-", ValueType::Invalid)]
    #[case("-NaN", ValueType::Invalid)]
    #[case("-true", ValueType::Invalid)]
    #[case("_1", ValueType::Invalid)]
    #[case("1_", ValueType::Invalid)]
    #[case("1__0", ValueType::Invalid)]
    #[case("1.5.6", ValueType::Invalid)]
    #[case("1e", ValueType::Invalid)]
    #[case("1e+", ValueType::Invalid)]
    #[case("0x", ValueType::Invalid)]
    #[case("hello", ValueType::Invalid)]
    fn coarse(#[case] text: &str, #[case] expected: ValueType) {
        assert_eq!(get_value_type(text), expected);
    }

    #[rstest]
    #[case("0", D::UInt7)]
    #[case("127", D::UInt7)]
    #[case("128", D::UInt8)]
    #[case("255", D::UInt8)]
    #[case("256", D::UInt15)]
    #[case("32767", D::UInt15)]
    #[case("32768", D::UInt16)]
    #[case("65535", D::UInt16)]
    #[case("65536", D::UInt31)]
    #[case("2147483647", D::UInt31)]
    #[case("2147483648", D::UInt32)]
    #[case("4294967295", D::UInt32)]
    #[case("4294967296", D::UInt63)]
    #[case("9223372036854775807", D::UInt63)]
    #[case("9223372036854775808", D::UInt64)]
    #[case("18446744073709551615", D::UInt64)]
    #[case("18446744073709551616", D::BigInt)]
    fn detailed_positive_decimal(#[case] text: &str, #[case] expected: D) {
        assert_eq!(get_detailed_value_type(text), expected);
    }

    #[rstest]
    #[case("-1", D::SInt8)]
    #[case("-128", D::SInt8)]
    #[case("-129", D::SInt16)]
    #[case("-32768", D::SInt16)]
    #[case("-32769", D::SInt32)]
    #[case("-2147483648", D::SInt32)]
    #[case("-2147483649", D::SInt64)]
    #[case("-9223372036854775808", D::SInt64)]
    #[case("-9223372036854775809", D::BigInt)]
    fn detailed_negative_decimal(#[case] text: &str, #[case] expected: D) {
        assert_eq!(get_detailed_value_type(text), expected);
    }

    #[rstest]
    #[case("0x7F", D::UInt7)]
    #[case("0xFF", D::UInt8)]
    #[case("0x100", D::UInt15)]
    #[case("0xffff", D::UInt16)]
    #[case("0x7FFFFFFF", D::UInt31)]
    #[case("0xFFFFFFFFFFFFFFFF", D::UInt64)]
    #[case("0x10000000000000000", D::BigInt)]
    #[case("-0x80", D::SInt8)]
    #[case("-0x81", D::SInt16)]
    #[case("-0x8000000000000000", D::SInt64)]
    #[case("0b1111111", D::UInt7)]
    #[case("0b11111111", D::UInt8)]
    #[case("0o177", D::UInt7)]
    #[case("0o377", D::UInt8)]
    #[case("0o400", D::UInt15)]
    fn detailed_radix(#[case] text: &str, #[case] expected: D) {
        assert_eq!(get_detailed_value_type(text), expected);
    }

    #[rstest]
    #[case("1.5", D::Float64)]
    #[case("1e99", D::Float64)]
    #[case("0.25", D::Float64)]
    #[case("Infinity", D::Float64)]
    #[case("+Infinity", D::Float64)]
    #[case("NaN", D::Float64)]
    #[case("true", D::Boolean)]
    #[case("null", D::Null)]
    #[case("", D::Invalid)]
    #[case("0x", D::Invalid)]
    #[case("--1", D::Invalid)]
    fn detailed_other(#[case] text: &str, #[case] expected: D) {
        assert_eq!(get_detailed_value_type(text), expected);
    }

    #[test]
    fn leading_zeros_are_normalized() {
        assert_eq!(get_detailed_value_type("0000000255"), D::UInt8);
        assert_eq!(get_detailed_value_type("00"), D::UInt7);
        assert_eq!(get_detailed_value_type("0x00FF"), D::UInt8);
        assert_eq!(get_detailed_value_type("-0000129"), D::SInt16);
    }

    #[test]
    fn underscores_do_not_change_magnitude() {
        assert_eq!(get_detailed_value_type("1_27"), D::UInt7);
        assert_eq!(get_detailed_value_type("1_28"), D::UInt8);
        assert_eq!(get_detailed_value_type("0xF_F"), D::UInt8);
    }
}
