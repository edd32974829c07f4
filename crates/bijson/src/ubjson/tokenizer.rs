//! The UBJSON tokenizer.
//!
//! A marker-driven binary scanner over a chunked buffer. Fixed payloads are
//! recorded as byte ranges and decoded on demand; container starts look one
//! byte ahead for the `$` element-type and `#` element-count modifiers and
//! surface the synthetic optimized-start kinds when either is present.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use bstr::ByteSlice;

use crate::chunk::default_chunk_size;
use crate::error::{Error, ErrorKind, Position};
use crate::ubjson::token::UbjsonTokenType;

enum Source {
    Exhausted,
    Stream(Box<dyn Read>),
}

/// A streaming tokenizer over one UBJSON document source.
pub struct UbjsonTokenizer {
    source: Source,
    buffer: Vec<u8>,
    pos: usize,
    consumed: usize,
    chunk_size: usize,
    token_type: UbjsonTokenType,
    token_start: usize,
    token_end: usize,
    content_type: UbjsonTokenType,
    content_size: usize,
    file_name: Option<String>,
}

/// A fixed-size element type of an optimized array.
pub trait UbjsonElement: Sized {
    /// The token kind elements of this type are declared with.
    const TOKEN: UbjsonTokenType;
    /// The wire size of one element.
    const SIZE: usize;
    /// Decodes one big-endian element.
    fn decode(bytes: &[u8]) -> Self;
}

macro_rules! ubjson_element {
    ($type:ty, $token:expr) => {
        impl UbjsonElement for $type {
            const TOKEN: UbjsonTokenType = $token;
            const SIZE: usize = size_of::<$type>();
            fn decode(bytes: &[u8]) -> Self {
                let mut raw = [0u8; size_of::<$type>()];
                raw.copy_from_slice(bytes);
                <$type>::from_be_bytes(raw)
            }
        }
    };
}

ubjson_element!(i8, UbjsonTokenType::Int8);
ubjson_element!(u8, UbjsonTokenType::Uint8);
ubjson_element!(i16, UbjsonTokenType::Int16);
ubjson_element!(i32, UbjsonTokenType::Int32);
ubjson_element!(i64, UbjsonTokenType::Int64);
ubjson_element!(f32, UbjsonTokenType::Float32);
ubjson_element!(f64, UbjsonTokenType::Float64);

impl UbjsonTokenizer {
    /// Creates a tokenizer over an in-memory buffer.
    #[must_use]
    pub fn new(buffer: &[u8]) -> Self {
        UbjsonTokenizer {
            source: Source::Exhausted,
            buffer: buffer.to_vec(),
            pos: 0,
            consumed: 0,
            chunk_size: default_chunk_size(),
            token_type: UbjsonTokenType::Unknown,
            token_start: 0,
            token_end: 0,
            content_type: UbjsonTokenType::Unknown,
            content_size: 0,
            file_name: None,
        }
    }

    /// Creates a tokenizer over a byte stream.
    #[must_use]
    pub fn from_stream(stream: impl Read + 'static) -> Self {
        Self::from_parts(Vec::new(), Box::new(stream), None)
    }

    /// Opens `path` and tokenizes its contents.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let file = File::open(path)
            .map_err(|error| Error::from(ErrorKind::Io(error)).with_file_name(Some(name.as_str())))?;
        Ok(Self::from_parts(Vec::new(), Box::new(file), Some(name)))
    }

    pub(crate) fn from_parts(
        prefix: Vec<u8>,
        stream: Box<dyn Read>,
        file_name: Option<String>,
    ) -> Self {
        UbjsonTokenizer {
            source: Source::Stream(stream),
            buffer: prefix,
            pos: 0,
            consumed: 0,
            chunk_size: default_chunk_size(),
            token_type: UbjsonTokenType::Unknown,
            token_start: 0,
            token_end: 0,
            content_type: UbjsonTokenType::Unknown,
            content_size: 0,
            file_name,
        }
    }

    /// The byte offset of the read cursor from the start of the document.
    #[must_use]
    pub fn position(&self) -> usize {
        self.consumed + self.pos
    }

    /// The current position as an error location.
    #[must_use]
    pub fn error_position(&self) -> Position {
        Position::Offset(self.position())
    }

    /// The file name given at construction, if any.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// How many bytes are pulled from the source per refill.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Sets the refill size.
    pub fn set_chunk_size(&mut self, size: usize) -> Result<(), Error> {
        if size == 0 {
            return Err(Error::from(ErrorKind::Misuse(
                "chunk size can't be zero".into(),
            )));
        }
        self.chunk_size = size;
        Ok(())
    }

    /// The kind of the current token.
    #[must_use]
    pub fn token_type(&self) -> UbjsonTokenType {
        self.token_type
    }

    /// The payload bytes of the current token.
    #[must_use]
    pub fn token(&self) -> &[u8] {
        &self.buffer[self.token_start..self.token_end]
    }

    /// The current token payload as UTF-8 text.
    pub fn token_str(&self) -> Result<&str, Error> {
        std::str::from_utf8(self.token()).map_err(|_| {
            Error::new(
                ErrorKind::InvalidEncoding("string payload is not valid UTF-8".into()),
                self.error_position(),
            )
        })
    }

    /// The declared element type of an optimized container.
    #[must_use]
    pub fn content_type(&self) -> UbjsonTokenType {
        self.content_type
    }

    /// The declared element count of an optimized container.
    #[must_use]
    pub fn content_size(&self) -> usize {
        self.content_size
    }

    /// Decodes the current token as a signed integer.
    #[must_use]
    pub fn token_i64(&self) -> Option<i64> {
        let payload = self.token();
        Some(match self.token_type {
            UbjsonTokenType::Int8 => i64::from(i8::decode(payload)),
            UbjsonTokenType::Uint8 | UbjsonTokenType::Char => i64::from(payload[0]),
            UbjsonTokenType::Int16 => i64::from(i16::decode(payload)),
            UbjsonTokenType::Int32 => i64::from(i32::decode(payload)),
            UbjsonTokenType::Int64 => i64::decode(payload),
            _ => return None,
        })
    }

    /// Decodes the current token as a float.
    #[must_use]
    pub fn token_f64(&self) -> Option<f64> {
        match self.token_type {
            UbjsonTokenType::Float32 => Some(f64::from(f32::decode(self.token()))),
            UbjsonTokenType::Float64 => Some(f64::decode(self.token())),
            _ => None,
        }
    }

    fn truncated(&self) -> Error {
        Error::new(
            ErrorKind::TruncatedInput("unexpected end of document".into()),
            self.error_position(),
        )
        .with_file_name(self.file_name())
    }

    fn unknown_marker(&self, marker: u8) -> Error {
        Error::new(
            ErrorKind::UnexpectedToken(format!(
                "unknown type marker: '{}'",
                [marker].as_bstr()
            )),
            self.error_position(),
        )
        .with_file_name(self.file_name())
    }

    // Makes at least `need` bytes available at the read cursor, compacting
    // consumed bytes away first. Returns false when the source ends first.
    fn fill(&mut self, need: usize) -> Result<bool, Error> {
        if self.buffer.len() - self.pos >= need {
            return Ok(true);
        }
        if let Source::Stream(_) = self.source {
            // Token ranges stay valid only while their bytes do, so keep
            // everything from the current token's payload onwards.
            let keep = self.pos.min(self.token_start);
            if keep > 0 {
                self.buffer.drain(..keep);
                self.consumed += keep;
                self.pos -= keep;
                self.token_start -= keep;
                self.token_end -= keep;
            }
        }
        loop {
            if self.buffer.len() - self.pos >= need {
                return Ok(true);
            }
            let start = self.buffer.len();
            let want = self.chunk_size.max(need - (start - self.pos));
            self.buffer.resize(start + want, 0);
            let result = match &mut self.source {
                Source::Exhausted => None,
                Source::Stream(stream) => Some(stream.read(&mut self.buffer[start..])),
            };
            match result {
                None => {
                    self.buffer.truncate(start);
                    return Ok(false);
                }
                Some(Ok(0)) => {
                    self.buffer.truncate(start);
                    self.source = Source::Exhausted;
                    return Ok(self.buffer.len() - self.pos >= need);
                }
                Some(Ok(read)) => self.buffer.truncate(start + read),
                Some(Err(error)) if error.kind() == io::ErrorKind::Interrupted => {
                    self.buffer.truncate(start);
                }
                Some(Err(error)) => {
                    self.buffer.truncate(start);
                    return Err(error.into());
                }
            }
        }
    }

    fn require(&mut self, need: usize) -> Result<(), Error> {
        if self.fill(need)? {
            Ok(())
        } else {
            Err(self.truncated())
        }
    }

    fn take(&mut self, size: usize) -> Result<(), Error> {
        self.require(size)?;
        self.token_start = self.pos;
        self.token_end = self.pos + size;
        self.pos += size;
        Ok(())
    }

    fn read_length(&mut self) -> Result<usize, Error> {
        self.require(1)?;
        let marker = self.buffer[self.pos];
        self.pos += 1;
        let value = match marker {
            b'i' => {
                self.require(1)?;
                let v = i64::from(self.buffer[self.pos] as i8);
                self.pos += 1;
                v
            }
            b'U' => {
                self.require(1)?;
                let v = i64::from(self.buffer[self.pos]);
                self.pos += 1;
                v
            }
            b'I' => {
                self.require(2)?;
                let v = i64::from(i16::from_be_bytes([
                    self.buffer[self.pos],
                    self.buffer[self.pos + 1],
                ]));
                self.pos += 2;
                v
            }
            b'l' => {
                self.require(4)?;
                let mut raw = [0u8; 4];
                raw.copy_from_slice(&self.buffer[self.pos..self.pos + 4]);
                self.pos += 4;
                i64::from(i32::from_be_bytes(raw))
            }
            b'L' => {
                self.require(8)?;
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&self.buffer[self.pos..self.pos + 8]);
                self.pos += 8;
                i64::from_be_bytes(raw)
            }
            _ => return Err(self.unknown_marker(marker)),
        };
        usize::try_from(value).map_err(|_| {
            Error::new(
                ErrorKind::UnexpectedToken("negative length prefix".into()),
                self.error_position(),
            )
        })
    }

    fn reset_content(&mut self) {
        self.content_type = UbjsonTokenType::Unknown;
        self.content_size = 0;
    }

    /// Advances to the next token, reading its type marker.
    ///
    /// No-ops are skipped. Returns `Ok(false)` at the end of the document.
    pub fn next(&mut self) -> Result<bool, Error> {
        self.reset_content();
        let marker = loop {
            if !self.fill(1)? {
                self.token_type = UbjsonTokenType::Unknown;
                return Ok(false);
            }
            let marker = self.buffer[self.pos];
            if marker != b'N' {
                break marker;
            }
            self.pos += 1;
        };
        self.pos += 1;
        let token_type =
            UbjsonTokenType::from_marker(marker).ok_or_else(|| self.unknown_marker(marker))?;
        self.scan_payload(token_type)?;
        Ok(true)
    }

    /// Advances to the next token of a declared type, which appears on the
    /// wire without its marker. `Unknown` falls back to [`next`], and
    /// `ObjectKey` to [`next_key`].
    ///
    /// [`next`]: Self::next
    /// [`next_key`]: Self::next_key
    pub fn next_typed(&mut self, expected: UbjsonTokenType) -> Result<bool, Error> {
        match expected {
            UbjsonTokenType::Unknown => self.next(),
            UbjsonTokenType::ObjectKey => self.next_key(),
            _ => {
                self.reset_content();
                if !self.fill(expected.carries_value().into())? {
                    self.token_type = UbjsonTokenType::Unknown;
                    return Ok(false);
                }
                self.scan_payload(expected)?;
                Ok(true)
            }
        }
    }

    /// Advances to the next object key: the `}` terminator or a string
    /// without its `S` marker.
    pub fn next_key(&mut self) -> Result<bool, Error> {
        self.reset_content();
        loop {
            if !self.fill(1)? {
                self.token_type = UbjsonTokenType::Unknown;
                return Ok(false);
            }
            if self.buffer[self.pos] != b'N' {
                break;
            }
            self.pos += 1;
        }
        if self.buffer[self.pos] == b'}' {
            self.pos += 1;
            self.token_start = self.pos;
            self.token_end = self.pos;
            self.token_type = UbjsonTokenType::EndObject;
            return Ok(true);
        }
        let length = self.read_length()?;
        self.take(length)?;
        self.token_type = UbjsonTokenType::String;
        Ok(true)
    }

    /// Advances past one token without decoding it.
    pub fn skip(&mut self) -> Result<bool, Error> {
        self.next()
    }

    /// Advances past one marker-less token of a declared type.
    pub fn skip_typed(&mut self, expected: UbjsonTokenType) -> Result<bool, Error> {
        self.next_typed(expected)
    }

    fn scan_payload(&mut self, token_type: UbjsonTokenType) -> Result<(), Error> {
        match token_type {
            UbjsonTokenType::Null
            | UbjsonTokenType::True
            | UbjsonTokenType::False
            | UbjsonTokenType::NoOp
            | UbjsonTokenType::EndObject
            | UbjsonTokenType::EndArray => {
                self.token_start = self.pos;
                self.token_end = self.pos;
                self.token_type = token_type;
            }
            UbjsonTokenType::Int8 | UbjsonTokenType::Uint8 | UbjsonTokenType::Char => {
                self.take(1)?;
                self.token_type = token_type;
            }
            UbjsonTokenType::Int16 => {
                self.take(2)?;
                self.token_type = token_type;
            }
            UbjsonTokenType::Int32 | UbjsonTokenType::Float32 => {
                self.take(4)?;
                self.token_type = token_type;
            }
            UbjsonTokenType::Int64 | UbjsonTokenType::Float64 => {
                self.take(8)?;
                self.token_type = token_type;
            }
            UbjsonTokenType::String | UbjsonTokenType::HighPrecision => {
                let length = self.read_length()?;
                self.take(length)?;
                self.token_type = token_type;
            }
            UbjsonTokenType::StartArray => self.scan_container_start(
                UbjsonTokenType::StartArray,
                UbjsonTokenType::StartOptimizedArray,
            )?,
            UbjsonTokenType::StartObject => self.scan_container_start(
                UbjsonTokenType::StartObject,
                UbjsonTokenType::StartOptimizedObject,
            )?,
            UbjsonTokenType::StartOptimizedArray
            | UbjsonTokenType::StartOptimizedObject
            | UbjsonTokenType::ObjectKey
            | UbjsonTokenType::Unknown => {
                return Err(Error::new(
                    ErrorKind::Misuse("not a wire token type".into()),
                    self.error_position(),
                ));
            }
        }
        Ok(())
    }

    // One byte of look-ahead after `[` or `{` decides between a plain and
    // an optimized container.
    fn scan_container_start(
        &mut self,
        plain: UbjsonTokenType,
        optimized: UbjsonTokenType,
    ) -> Result<(), Error> {
        self.token_start = self.pos;
        self.token_end = self.pos;
        if !self.fill(1)? {
            self.token_type = plain;
            return Ok(());
        }
        match self.buffer[self.pos] {
            b'$' => {
                self.pos += 1;
                self.require(1)?;
                let marker = self.buffer[self.pos];
                let content_type = UbjsonTokenType::from_marker(marker)
                    .ok_or_else(|| self.unknown_marker(marker))?;
                self.pos += 1;
                self.require(1)?;
                if self.buffer[self.pos] != b'#' {
                    return Err(Error::new(
                        ErrorKind::UnexpectedToken(
                            "a '$' type modifier requires a '#' count modifier".into(),
                        ),
                        self.error_position(),
                    ));
                }
                self.pos += 1;
                self.content_size = self.read_length()?;
                self.content_type = content_type;
                self.token_type = optimized;
            }
            b'#' => {
                self.pos += 1;
                self.content_size = self.read_length()?;
                self.content_type = UbjsonTokenType::Unknown;
                self.token_type = optimized;
            }
            _ => self.token_type = plain,
        }
        Ok(())
    }

    /// Bulk-reads `count` consecutive fixed-size elements of an optimized
    /// array.
    pub fn read_elements<T: UbjsonElement>(&mut self, count: usize) -> Result<Vec<T>, Error> {
        let total = count
            .checked_mul(T::SIZE)
            .ok_or_else(|| Error::from(ErrorKind::Misuse("element count overflow".into())))?;
        self.require(total)?;
        let values = self.buffer[self.pos..self.pos + total]
            .chunks_exact(T::SIZE)
            .map(T::decode)
            .collect();
        self.pos += total;
        self.token_start = self.pos;
        self.token_end = self.pos;
        Ok(values)
    }

    /// Bulk-reads `count` raw bytes (the payload of an optimized array of
    /// `int8`, `uint8` or `char`).
    pub fn read_raw(&mut self, count: usize) -> Result<Vec<u8>, Error> {
        self.require(count)?;
        let bytes = self.buffer[self.pos..self.pos + count].to_vec();
        self.pos += count;
        self.token_start = self.pos;
        self.token_end = self.pos;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ubjson::token::UbjsonTokenType as T;

    #[test]
    fn scalar_markers() {
        let mut tokenizer = UbjsonTokenizer::new(b"ZTFi\x05U\xF0I\x01\x02");
        assert!(tokenizer.next().unwrap());
        assert_eq!(tokenizer.token_type(), T::Null);
        assert!(tokenizer.next().unwrap());
        assert_eq!(tokenizer.token_type(), T::True);
        assert!(tokenizer.next().unwrap());
        assert_eq!(tokenizer.token_type(), T::False);
        assert!(tokenizer.next().unwrap());
        assert_eq!(tokenizer.token_type(), T::Int8);
        assert_eq!(tokenizer.token_i64(), Some(5));
        assert!(tokenizer.next().unwrap());
        assert_eq!(tokenizer.token_type(), T::Uint8);
        assert_eq!(tokenizer.token_i64(), Some(240));
        assert!(tokenizer.next().unwrap());
        assert_eq!(tokenizer.token_type(), T::Int16);
        assert_eq!(tokenizer.token_i64(), Some(0x0102));
        assert!(!tokenizer.next().unwrap());
    }

    #[test]
    fn no_ops_are_skipped() {
        let mut tokenizer = UbjsonTokenizer::new(b"NNi\x01");
        assert!(tokenizer.next().unwrap());
        assert_eq!(tokenizer.token_type(), T::Int8);
        assert_eq!(tokenizer.token_i64(), Some(1));
    }

    #[test]
    fn strings_and_high_precision() {
        let mut tokenizer = UbjsonTokenizer::new(b"Si\x05helloHi\x043.14");
        assert!(tokenizer.next().unwrap());
        assert_eq!(tokenizer.token_type(), T::String);
        assert_eq!(tokenizer.token(), b"hello");
        assert!(tokenizer.next().unwrap());
        assert_eq!(tokenizer.token_type(), T::HighPrecision);
        assert_eq!(tokenizer.token(), b"3.14");
    }

    #[test]
    fn floats_decode_big_endian() {
        let mut tokenizer = UbjsonTokenizer::new(b"d\x41\x8c\x00\x00");
        assert!(tokenizer.next().unwrap());
        assert_eq!(tokenizer.token_type(), T::Float32);
        assert_eq!(tokenizer.token_f64(), Some(17.5));
    }

    #[test]
    fn optimized_container_modifiers() {
        let mut tokenizer = UbjsonTokenizer::new(b"[$i#i\x04ABCD");
        assert!(tokenizer.next().unwrap());
        assert_eq!(tokenizer.token_type(), T::StartOptimizedArray);
        assert_eq!(tokenizer.content_type(), T::Int8);
        assert_eq!(tokenizer.content_size(), 4);
        assert_eq!(tokenizer.read_elements::<i8>(4).unwrap(), vec![65, 66, 67, 68]);
    }

    #[test]
    fn count_only_container() {
        let mut tokenizer = UbjsonTokenizer::new(b"[#i\x01iA");
        assert!(tokenizer.next().unwrap());
        assert_eq!(tokenizer.token_type(), T::StartOptimizedArray);
        assert_eq!(tokenizer.content_type(), T::Unknown);
        assert_eq!(tokenizer.content_size(), 1);
    }

    #[test]
    fn type_without_count_is_an_error() {
        let mut tokenizer = UbjsonTokenizer::new(b"[$iiA");
        assert!(tokenizer.next().is_err());
    }

    #[test]
    fn unknown_markers_fail_with_offset() {
        let mut tokenizer = UbjsonTokenizer::new(b"A");
        let error = tokenizer.next().unwrap_err();
        assert!(matches!(error.kind(), ErrorKind::UnexpectedToken(_)));
        assert_eq!(error.position(), Position::Offset(1));
    }

    #[test]
    fn truncated_payloads_fail() {
        let mut tokenizer = UbjsonTokenizer::new(b"I\x01");
        assert!(matches!(
            tokenizer.next().unwrap_err().kind(),
            ErrorKind::TruncatedInput(_)
        ));
    }

    #[test]
    fn object_key_mode() {
        let mut tokenizer = UbjsonTokenizer::new(b"i\x03abc}");
        assert!(tokenizer.next_key().unwrap());
        assert_eq!(tokenizer.token_type(), T::String);
        assert_eq!(tokenizer.token(), b"abc");
        assert!(tokenizer.next_key().unwrap());
        assert_eq!(tokenizer.token_type(), T::EndObject);
    }

    #[test]
    fn typed_tokens_have_no_marker() {
        let mut tokenizer = UbjsonTokenizer::new(b"\x10\x20");
        assert!(tokenizer.next_typed(T::Int16).unwrap());
        assert_eq!(tokenizer.token_i64(), Some(0x1020));
        assert!(!tokenizer.next_typed(T::Int16).unwrap());
    }

    #[test]
    fn chunked_stream_reads() {
        let mut data = b"Si\x14".to_vec();
        data.extend_from_slice(b"12345678901234567890");
        let mut tokenizer = UbjsonTokenizer::from_stream(io::Cursor::new(data));
        tokenizer.set_chunk_size(10).unwrap();
        assert!(tokenizer.next().unwrap());
        assert_eq!(tokenizer.token_type(), T::String);
        assert_eq!(tokenizer.token(), b"12345678901234567890");
    }
}
