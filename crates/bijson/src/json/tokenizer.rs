//! The chunked JSON tokenizer.
//!
//! Tokens are scanned out of a growable buffer refilled from a [`TextRead`]
//! source. When a scan reaches the end of the buffer mid-token, the token
//! prefix is moved to the head of the buffer, another chunk is appended and
//! the scan re-runs; token offsets are buffer-relative and rebased on every
//! compaction, so token views stay valid between calls to [`next`].
//!
//! [`next`]: JsonTokenizer::next

use std::io::Read;
use std::path::Path;

use crate::chunk::default_chunk_size;
use crate::error::{Error, ErrorKind, Position};
use crate::json::scan::{
    add_lines_and_columns, count_lines_and_columns, find_line_continuation, next_token,
};
use crate::json::token::JsonTokenType;
use crate::text::{TextBufferReader, TextFileReader, TextRead, TextStreamReader};

/// A streaming tokenizer over one JSON document source.
pub struct JsonTokenizer {
    reader: Box<dyn TextRead>,
    buffer: Vec<u8>,
    token_start: usize,
    token_end: usize,
    next_token: usize,
    token_type: JsonTokenType,
    line_number: usize,
    column_number: usize,
    chunk_size: usize,
    block_strings: bool,
    file_name: Option<String>,
}

impl JsonTokenizer {
    /// Creates a tokenizer over an in-memory buffer.
    #[must_use]
    pub fn new(buffer: &[u8]) -> Self {
        Self::from_text_read(Box::new(TextBufferReader::new(buffer)), None)
    }

    /// Creates a tokenizer over a byte stream.
    #[must_use]
    pub fn from_stream(stream: impl Read + 'static) -> Self {
        Self::from_text_read(Box::new(TextStreamReader::new(stream)), None)
    }

    /// Opens `path` and tokenizes its contents.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let reader = TextFileReader::open(path)?;
        let file_name = reader.file_name().to_owned();
        Ok(Self::from_text_read(Box::new(reader), Some(file_name)))
    }

    pub(crate) fn from_stream_with_prefix(prefix: Vec<u8>, stream: Box<dyn Read>) -> Self {
        Self::from_text_read(
            Box::new(TextStreamReader::with_prefix(prefix, stream)),
            None,
        )
    }

    pub(crate) fn from_text_read(reader: Box<dyn TextRead>, file_name: Option<String>) -> Self {
        JsonTokenizer {
            reader,
            buffer: Vec::new(),
            token_start: 0,
            token_end: 0,
            next_token: 0,
            token_type: JsonTokenType::Invalid,
            line_number: 1,
            column_number: 1,
            chunk_size: default_chunk_size(),
            block_strings: false,
            file_name,
        }
    }

    /// Advances to the next token.
    ///
    /// Returns `Ok(false)` at end of file or when the bytes cannot form a
    /// token, in which case [`token_type`](Self::token_type) distinguishes
    /// `EndOfFile` from `Invalid`. Whitespace, newline and comment tokens
    /// are surfaced like any other token.
    pub fn next(&mut self) -> Result<bool, Error> {
        loop {
            if !self.internal_next()? {
                return Ok(false);
            }
            match self.token_type {
                JsonTokenType::Invalid => {
                    self.column_number += self.token_end.saturating_sub(self.token_start);
                    return Ok(false);
                }
                JsonTokenType::StartArray
                | JsonTokenType::EndArray
                | JsonTokenType::StartObject
                | JsonTokenType::EndObject
                | JsonTokenType::Colon
                | JsonTokenType::Comma
                | JsonTokenType::Value
                | JsonTokenType::Comment
                | JsonTokenType::Whitespace => {
                    self.column_number += self.token_end - self.token_start;
                    return Ok(true);
                }
                JsonTokenType::String => {
                    self.column_number += self.token_end - self.token_start;
                    self.token_start += 1;
                    self.token_end -= 1;
                    return Ok(true);
                }
                JsonTokenType::MultilineString => {
                    let lines_and_columns = count_lines_and_columns(self.token());
                    add_lines_and_columns(
                        &mut self.line_number,
                        &mut self.column_number,
                        lines_and_columns,
                    );
                    self.remove_line_continuations();
                    self.token_type = JsonTokenType::String;
                    return Ok(true);
                }
                JsonTokenType::BlockString => {
                    let lines_and_columns = count_lines_and_columns(self.token());
                    add_lines_and_columns(
                        &mut self.line_number,
                        &mut self.column_number,
                        lines_and_columns,
                    );
                    self.token_start += 3;
                    self.token_end -= 3;
                    self.token_type = JsonTokenType::String;
                    return Ok(true);
                }
                JsonTokenType::BlockComment => {
                    let lines_and_columns = count_lines_and_columns(self.token());
                    add_lines_and_columns(
                        &mut self.line_number,
                        &mut self.column_number,
                        lines_and_columns,
                    );
                    return Ok(true);
                }
                JsonTokenType::Newline => {
                    self.line_number += 1;
                    self.column_number = 1;
                    return Ok(true);
                }
                JsonTokenType::Incomplete => {}
                JsonTokenType::EndOfFile => return Ok(false),
            }
        }
    }

    /// The kind of the current token.
    #[must_use]
    pub fn token_type(&self) -> JsonTokenType {
        self.token_type
    }

    /// The bytes of the current token; quotes are excluded for strings.
    #[must_use]
    pub fn token(&self) -> &[u8] {
        &self.buffer[self.token_start..self.token_end]
    }

    /// The current token as UTF-8 text.
    pub fn token_str(&self) -> Result<&str, Error> {
        std::str::from_utf8(self.token()).map_err(|_| {
            Error::new(
                ErrorKind::InvalidEncoding("token is not valid UTF-8".into()),
                self.position(),
            )
        })
    }

    /// The current token as an owned string.
    pub fn token_string(&self) -> Result<String, Error> {
        Ok(self.token_str()?.to_owned())
    }

    /// 1-based line of the end of the current token.
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// 1-based column of the end of the current token.
    #[must_use]
    pub fn column_number(&self) -> usize {
        self.column_number
    }

    /// The current position as an error location.
    #[must_use]
    pub fn position(&self) -> Position {
        Position::Text {
            line: self.line_number,
            column: self.column_number,
        }
    }

    /// The file name given at construction, if any.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// How much text is pulled from the source per refill.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Sets the refill size; values below four are rejected because a
    /// single character may need up to four bytes.
    pub fn set_chunk_size(&mut self, size: usize) -> Result<(), Error> {
        if size < 4 {
            return Err(Error::from(ErrorKind::Misuse(
                "chunk size can't be less than 4".into(),
            )));
        }
        self.chunk_size = size;
        Ok(())
    }

    pub(crate) fn set_block_strings(&mut self, enabled: bool) {
        self.block_strings = enabled;
    }

    fn internal_next(&mut self) -> Result<bool, Error> {
        if self.token_type == JsonTokenType::EndOfFile {
            return Ok(false);
        }
        if self.next_token != self.token_start {
            self.token_start = self.next_token;
            let scan = next_token(&self.buffer[self.token_start..], false, self.block_strings);
            if scan.incomplete {
                self.token_type = JsonTokenType::Incomplete;
            } else {
                self.token_end = self.token_start + scan.end;
                self.next_token = self.token_end;
                self.token_type = scan.token;
            }
            Ok(true)
        } else {
            let at_end = !self.fill_buffer()?;
            if !at_end || !self.buffer.is_empty() {
                let scan = next_token(&self.buffer[self.token_start..], at_end, self.block_strings);
                if scan.incomplete {
                    self.token_type = JsonTokenType::Incomplete;
                } else {
                    self.token_end = self.token_start + scan.end;
                    self.next_token = self.token_end;
                    self.token_type = scan.token;
                }
                Ok(true)
            } else {
                self.token_type = JsonTokenType::EndOfFile;
                Ok(false)
            }
        }
    }

    // Moves any unfinished token prefix to the head of the buffer and
    // appends one more chunk. Returns false when the source is exhausted.
    fn fill_buffer(&mut self) -> Result<bool, Error> {
        if self.token_start != self.buffer.len() && self.token_start != 0 {
            self.buffer.copy_within(self.token_start.., 0);
            let tail = self.buffer.len() - self.token_start;
            self.buffer.truncate(tail);
            self.token_start = 0;
            self.token_end = 0;
            self.next_token = 0;
        } else if self.token_start == self.buffer.len() {
            self.buffer.clear();
            self.token_start = 0;
            self.token_end = 0;
            self.next_token = 0;
        }

        if !self.reader.read(&mut self.buffer, self.chunk_size)? {
            return Ok(false);
        }
        self.token_start = 0;
        self.token_end = 0;
        self.next_token = 0;
        Ok(true)
    }

    // Splices backslash-newline sequences out of a string token in place.
    fn remove_line_continuations(&mut self) {
        debug_assert!(self.token_end - self.token_start >= 2);
        self.token_start += 1;
        let to = self.token_end - 1;
        let (first_start, first_end) = find_line_continuation(&self.buffer, self.token_start, to);
        let mut dst = first_start;
        let mut from = first_end;
        while from != to {
            let (next_start, next_end) = find_line_continuation(&self.buffer, from, to);
            self.buffer.copy_within(from..next_start, dst);
            dst += next_start - from;
            from = next_end;
        }
        self.token_end = dst;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::token::JsonTokenType as T;

    fn collect_tokens(text: &str, chunk: usize) -> Vec<(T, String)> {
        let mut tokenizer = JsonTokenizer::from_stream(std::io::Cursor::new(text.as_bytes().to_vec()));
        tokenizer.set_chunk_size(chunk).unwrap();
        let mut tokens = Vec::new();
        while tokenizer.next().unwrap() {
            tokens.push((
                tokenizer.token_type(),
                tokenizer.token_string().unwrap(),
            ));
        }
        assert_eq!(tokenizer.token_type(), T::EndOfFile);
        tokens
    }

    #[test]
    fn tokenizes_a_flat_document() {
        let tokens = collect_tokens("{\"a\": 12}", 1024);
        let expected = [
            (T::StartObject, "{"),
            (T::String, "a"),
            (T::Colon, ":"),
            (T::Whitespace, " "),
            (T::Value, "12"),
            (T::EndObject, "}"),
        ];
        assert_eq!(tokens.len(), expected.len());
        for (actual, expected) in tokens.iter().zip(expected) {
            assert_eq!((actual.0, actual.1.as_str()), expected);
        }
    }

    #[test]
    fn small_chunks_do_not_split_tokens() {
        for chunk in [4, 5, 7] {
            let tokens = collect_tokens("[\"abcdefghij\", 123456789]", chunk);
            assert_eq!(tokens[1], (T::String, "abcdefghij".to_owned()));
            assert_eq!(tokens[4], (T::Value, "123456789".to_owned()));
        }
    }

    #[test]
    fn tracks_line_and_column() {
        let mut tokenizer = JsonTokenizer::new(b"[\n  12,\n  \"x\"]");
        while tokenizer.next().unwrap() {}
        assert_eq!(tokenizer.line_number(), 3);
        // Column after the final `]` on line 3: two spaces, "x" and `]`.
        assert_eq!(tokenizer.column_number(), 7);
    }

    #[test]
    fn strips_quotes_from_string_tokens() {
        let mut tokenizer = JsonTokenizer::new(b"\"hello\"");
        assert!(tokenizer.next().unwrap());
        assert_eq!(tokenizer.token_type(), T::String);
        assert_eq!(tokenizer.token(), b"hello");
    }

    #[test]
    fn splices_line_continuations() {
        let mut tokenizer = JsonTokenizer::new(b"\"ab\\\ncd\\\r\nef\"");
        assert!(tokenizer.next().unwrap());
        assert_eq!(tokenizer.token_type(), T::String);
        assert_eq!(tokenizer.token(), b"abcdef");
        assert_eq!(tokenizer.line_number(), 3);
    }

    #[test]
    fn block_strings_keep_newlines() {
        let mut tokenizer = JsonTokenizer::new(b"\"\"\"one\ntwo\"\"\"");
        tokenizer.set_block_strings(true);
        assert!(tokenizer.next().unwrap());
        assert_eq!(tokenizer.token_type(), T::String);
        assert_eq!(tokenizer.token(), b"one\ntwo");
    }

    #[test]
    fn reports_invalid_tokens() {
        let mut tokenizer = JsonTokenizer::new(b"\"open");
        assert!(!tokenizer.next().unwrap());
        assert_eq!(tokenizer.token_type(), T::Invalid);
    }

    #[test]
    fn rejects_tiny_chunk_sizes() {
        let mut tokenizer = JsonTokenizer::new(b"1");
        assert!(tokenizer.set_chunk_size(3).is_err());
        assert!(tokenizer.set_chunk_size(4).is_ok());
    }
}
