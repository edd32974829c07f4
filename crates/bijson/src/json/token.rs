//! JSON token kinds.

/// The kind of token the JSON tokenizer is positioned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonTokenType {
    /// A byte sequence that cannot form a legal token.
    Invalid,
    /// `[`
    StartArray,
    /// `]`
    EndArray,
    /// `{`
    StartObject,
    /// `}`
    EndObject,
    /// `:`
    Colon,
    /// `,`
    Comma,
    /// A quoted string; the token view excludes the quotes.
    String,
    /// Any unquoted literal: numbers, `true`, `false`, `null` and
    /// identifier-like runs.
    Value,
    /// The end of the input.
    EndOfFile,
    /// The buffer ended in the middle of a token; more input is needed.
    Incomplete,
    /// A `//` line comment.
    Comment,
    /// A `/* ... */` comment, possibly spanning lines.
    BlockComment,
    /// A run of spaces and tabs.
    Whitespace,
    /// A line break (`\n`, `\r` or `\r\n`).
    Newline,
    /// Used internally: a string containing backslash-newline
    /// continuations, rewritten to `String` before it is surfaced.
    MultilineString,
    /// Used internally: a triple-quoted string, rewritten to `String`
    /// before it is surfaced.
    BlockString,
}
