//! UBJSON token kinds.

/// The kind of token the UBJSON tokenizer is positioned on, named after the
/// leading marker byte where one exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UbjsonTokenType {
    /// `Z`
    Null,
    /// `N`; skipped transparently between values.
    NoOp,
    /// `T`
    True,
    /// `F`
    False,
    /// `i`, one payload byte.
    Int8,
    /// `U`, one payload byte.
    Uint8,
    /// `I`, two payload bytes.
    Int16,
    /// `l`, four payload bytes.
    Int32,
    /// `L`, eight payload bytes.
    Int64,
    /// `d`, four payload bytes.
    Float32,
    /// `D`, eight payload bytes.
    Float64,
    /// `H`, a length-prefixed decimal string.
    HighPrecision,
    /// `C`, one payload byte.
    Char,
    /// `S`, a length-prefixed string.
    String,
    /// `{`
    StartObject,
    /// `}`
    EndObject,
    /// `[`
    StartArray,
    /// `]`
    EndArray,
    /// `[` followed by `$` and/or `#` modifiers.
    StartOptimizedArray,
    /// `{` followed by `$` and/or `#` modifiers.
    StartOptimizedObject,
    /// Expected-token mode for object keys: a string without its `S`
    /// marker, or the closing `}`.
    ObjectKey,
    /// No token, or an element type that was not declared.
    Unknown,
}

impl UbjsonTokenType {
    pub(crate) fn from_marker(marker: u8) -> Option<Self> {
        Some(match marker {
            b'Z' => UbjsonTokenType::Null,
            b'N' => UbjsonTokenType::NoOp,
            b'T' => UbjsonTokenType::True,
            b'F' => UbjsonTokenType::False,
            b'i' => UbjsonTokenType::Int8,
            b'U' => UbjsonTokenType::Uint8,
            b'I' => UbjsonTokenType::Int16,
            b'l' => UbjsonTokenType::Int32,
            b'L' => UbjsonTokenType::Int64,
            b'd' => UbjsonTokenType::Float32,
            b'D' => UbjsonTokenType::Float64,
            b'H' => UbjsonTokenType::HighPrecision,
            b'C' => UbjsonTokenType::Char,
            b'S' => UbjsonTokenType::String,
            b'{' => UbjsonTokenType::StartObject,
            b'}' => UbjsonTokenType::EndObject,
            b'[' => UbjsonTokenType::StartArray,
            b']' => UbjsonTokenType::EndArray,
            _ => return None,
        })
    }

    /// Tokens that stand for a value, as opposed to container ends and
    /// no-ops.
    pub(crate) fn is_value(self) -> bool {
        !matches!(
            self,
            UbjsonTokenType::NoOp | UbjsonTokenType::EndObject | UbjsonTokenType::EndArray
        )
    }

    /// Tokens whose full extent is known from the token itself.
    pub(crate) fn is_trivial(self) -> bool {
        !matches!(
            self,
            UbjsonTokenType::Unknown
                | UbjsonTokenType::StartObject
                | UbjsonTokenType::EndObject
                | UbjsonTokenType::StartArray
                | UbjsonTokenType::EndArray
        )
    }

    /// Tokens followed by payload bytes.
    pub(crate) fn carries_value(self) -> bool {
        !matches!(
            self,
            UbjsonTokenType::Null
                | UbjsonTokenType::NoOp
                | UbjsonTokenType::True
                | UbjsonTokenType::False
        )
    }
}
