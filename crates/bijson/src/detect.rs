//! Content detection and the unified reader.
//!
//! [`make_reader`] inspects up to 1 KiB of leading bytes, decides between
//! the JSON and UBJSON dialects and returns a [`Reader`] pre-seeded with
//! the sniffed bytes so none are lost.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::error::{Error, ErrorKind, Position};
use crate::item::JsonItem;
use crate::json::JsonReader;
use crate::text::byte_order_mark_length;
use crate::ubjson::UbjsonReader;
use crate::value_type::{DetailedValueType, ValueType};

const SNIFF_SIZE: usize = 1024;

// Bytes that can only start a JSON document, and bytes that can only be a
// UBJSON type marker.
const JSON_BYTES: &[u8] = b"\0\t\r\n \"/0123456789fnt";
const UBJSON_BYTES: &[u8] = b"#$CDFHILNSTUZdil";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Content {
    Unknown,
    Json,
    Ubjson,
}

fn identify(contents: &[u8]) -> Content {
    if contents.is_empty() || byte_order_mark_length(contents) != 0 {
        return Content::Json;
    }
    let mut allow_comma = false;
    let mut scopes: Vec<u8> = Vec::new();
    for &byte in contents {
        match byte {
            b'{' => {
                scopes.push(b'}');
                allow_comma = false;
            }
            b'[' => {
                scopes.push(b']');
                allow_comma = false;
            }
            b'}' | b']' => {
                if scopes.last() != Some(&byte) {
                    return Content::Unknown;
                }
                scopes.pop();
                allow_comma = !scopes.is_empty();
                return if allow_comma {
                    Content::Json
                } else {
                    Content::Unknown
                };
            }
            b',' => {
                return if allow_comma {
                    Content::Json
                } else {
                    Content::Unknown
                };
            }
            _ => {
                if JSON_BYTES.contains(&byte) {
                    return Content::Json;
                }
                if UBJSON_BYTES.contains(&byte) {
                    return Content::Ubjson;
                }
                return Content::Unknown;
            }
        }
    }
    Content::Unknown
}

/// A cursor over either dialect, chosen by the content sniffer.
pub enum Reader {
    /// A reader over a textual JSON document.
    Json(JsonReader),
    /// A reader over a binary UBJSON document.
    Ubjson(UbjsonReader),
}

impl std::fmt::Debug for Reader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reader::Json(_) => f.write_str("Reader::Json(..)"),
            Reader::Ubjson(_) => f.write_str("Reader::Ubjson(..)"),
        }
    }
}

macro_rules! forward {
    ($self:ident, $reader:ident => $call:expr) => {
        match $self {
            Reader::Json($reader) => $call,
            Reader::Ubjson($reader) => $call,
        }
    };
}

impl Reader {
    /// True when the JSON dialect was detected.
    #[must_use]
    pub fn is_json(&self) -> bool {
        matches!(self, Reader::Json(_))
    }

    /// True when the UBJSON dialect was detected.
    #[must_use]
    pub fn is_ubjson(&self) -> bool {
        matches!(self, Reader::Ubjson(_))
    }

    /// The JSON reader, when that dialect was detected.
    pub fn as_json(&mut self) -> Option<&mut JsonReader> {
        match self {
            Reader::Json(reader) => Some(reader),
            Reader::Ubjson(_) => None,
        }
    }

    /// The UBJSON reader, when that dialect was detected.
    pub fn as_ubjson(&mut self) -> Option<&mut UbjsonReader> {
        match self {
            Reader::Json(_) => None,
            Reader::Ubjson(reader) => Some(reader),
        }
    }

    /// Advances to the next value of the current container.
    pub fn next_value(&mut self) -> Result<bool, Error> {
        forward!(self, reader => reader.next_value())
    }

    /// Advances to the next key of the current object.
    pub fn next_key(&mut self) -> Result<bool, Error> {
        forward!(self, reader => reader.next_key())
    }

    /// At top level, advances to the start of the next document.
    pub fn next_document(&mut self) -> Result<bool, Error> {
        forward!(self, reader => reader.next_document())
    }

    /// Enters the container the cursor is positioned on.
    pub fn enter(&mut self) -> Result<(), Error> {
        forward!(self, reader => reader.enter())
    }

    /// Consumes the rest of the current container and pops back out.
    pub fn leave(&mut self) -> Result<(), Error> {
        forward!(self, reader => reader.leave())
    }

    /// The coarse type of the current value.
    pub fn value_type(&self, analyze_strings: bool) -> Result<ValueType, Error> {
        forward!(self, reader => reader.value_type(analyze_strings))
    }

    /// The fine-grained type of the current value.
    pub fn detailed_value_type(
        &self,
        analyze_strings: bool,
    ) -> Result<DetailedValueType, Error> {
        forward!(self, reader => reader.detailed_value_type(analyze_strings))
    }

    /// True when the cursor is on a `null` value.
    #[must_use]
    pub fn read_null(&self) -> bool {
        forward!(self, reader => reader.read_null())
    }

    /// Reads the current value as a boolean.
    pub fn read_bool(&self) -> Result<bool, Error> {
        forward!(self, reader => reader.read_bool())
    }

    /// Reads the current value as an `i8`.
    pub fn read_i8(&self) -> Result<i8, Error> {
        forward!(self, reader => reader.read_i8())
    }

    /// Reads the current value as an `i16`.
    pub fn read_i16(&self) -> Result<i16, Error> {
        forward!(self, reader => reader.read_i16())
    }

    /// Reads the current value as an `i32`.
    pub fn read_i32(&self) -> Result<i32, Error> {
        forward!(self, reader => reader.read_i32())
    }

    /// Reads the current value as an `i64`.
    pub fn read_i64(&self) -> Result<i64, Error> {
        forward!(self, reader => reader.read_i64())
    }

    /// Reads the current value as a `u8`.
    pub fn read_u8(&self) -> Result<u8, Error> {
        forward!(self, reader => reader.read_u8())
    }

    /// Reads the current value as a `u16`.
    pub fn read_u16(&self) -> Result<u16, Error> {
        forward!(self, reader => reader.read_u16())
    }

    /// Reads the current value as a `u32`.
    pub fn read_u32(&self) -> Result<u32, Error> {
        forward!(self, reader => reader.read_u32())
    }

    /// Reads the current value as a `u64`.
    pub fn read_u64(&self) -> Result<u64, Error> {
        forward!(self, reader => reader.read_u64())
    }

    /// Reads the current value as an `f32`.
    pub fn read_f32(&self) -> Result<f32, Error> {
        forward!(self, reader => reader.read_f32())
    }

    /// Reads the current value as an `f64`.
    pub fn read_f64(&self) -> Result<f64, Error> {
        forward!(self, reader => reader.read_f64())
    }

    /// Reads the current value as a single character.
    pub fn read_char(&self) -> Result<char, Error> {
        forward!(self, reader => reader.read_char())
    }

    /// Reads the current value as a string.
    pub fn read_string(&self) -> Result<String, Error> {
        forward!(self, reader => reader.read_string())
    }

    /// Reads the current value as bytes: an optimized byte array in UBJSON,
    /// a Base64 string in JSON.
    pub fn read_binary(&mut self) -> Result<Vec<u8>, Error> {
        match self {
            Reader::Json(reader) => reader.read_binary(),
            Reader::Ubjson(reader) => reader.read_binary()?.ok_or_else(|| {
                Error::from(ErrorKind::TypeMismatch(
                    "current token is not an optimized byte array".into(),
                ))
            }),
        }
    }

    /// Decodes a Base64 string value into bytes.
    pub fn read_base64(&self) -> Result<Vec<u8>, Error> {
        forward!(self, reader => reader.read_base64())
    }

    /// Materializes the remainder of the current value as a tree.
    pub fn read_item(&mut self) -> Result<JsonItem, Error> {
        forward!(self, reader => reader.read_item())
    }

    /// The document file name, when read from a file.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        forward!(self, reader => reader.file_name())
    }

    /// The current position: line and column for JSON, byte offset for
    /// UBJSON.
    #[must_use]
    pub fn position(&self) -> Position {
        match self {
            Reader::Json(reader) => Position::Text {
                line: reader.line_number(),
                column: reader.column_number(),
            },
            Reader::Ubjson(reader) => Position::Offset(reader.position()),
        }
    }
}

fn unknown_content(what: &str) -> Error {
    Error::from(ErrorKind::UnknownContent(format!(
        "{what} contents appear to be neither JSON nor UBJSON"
    )))
}

/// Creates a reader over an in-memory buffer, choosing the dialect from
/// its leading bytes.
pub fn make_reader(buffer: &[u8]) -> Result<Reader, Error> {
    let prefix = &buffer[..buffer.len().min(SNIFF_SIZE)];
    match identify(prefix) {
        Content::Json => Ok(Reader::Json(JsonReader::new(buffer))),
        Content::Ubjson => Ok(Reader::Ubjson(UbjsonReader::new(buffer))),
        Content::Unknown => Err(unknown_content("buffer")),
    }
}

/// Creates a reader over a byte stream, choosing the dialect from a
/// sniffed prefix that is handed on to the reader.
pub fn make_reader_from_stream(stream: impl Read + 'static) -> Result<Reader, Error> {
    let mut stream: Box<dyn Read> = Box::new(stream);
    let mut prefix = Vec::with_capacity(SNIFF_SIZE);
    let mut chunk = [0u8; SNIFF_SIZE];
    while prefix.len() < SNIFF_SIZE {
        match stream.read(&mut chunk[..SNIFF_SIZE - prefix.len()]) {
            Ok(0) => break,
            Ok(n) => prefix.extend_from_slice(&chunk[..n]),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => return Err(error.into()),
        }
    }
    match identify(&prefix) {
        Content::Json => Ok(Reader::Json(JsonReader::from_stream_with_prefix(
            prefix, stream,
        ))),
        Content::Ubjson => Ok(Reader::Ubjson(UbjsonReader::from_stream_with_prefix(
            prefix, stream,
        ))),
        Content::Unknown => Err(unknown_content("stream")),
    }
}

/// Opens `path` and creates a reader over its contents, choosing the
/// dialect from the first bytes of the file.
pub fn make_reader_from_file(path: impl AsRef<Path>) -> Result<Reader, Error> {
    let path = path.as_ref();
    let name = path.display().to_string();
    let mut file = File::open(path)
        .map_err(|error| Error::from(ErrorKind::Io(error)).with_file_name(Some(name.as_str())))?;
    let mut prefix = Vec::with_capacity(SNIFF_SIZE);
    let mut chunk = [0u8; SNIFF_SIZE];
    while prefix.len() < SNIFF_SIZE {
        match file.read(&mut chunk[..SNIFF_SIZE - prefix.len()]) {
            Ok(0) => break,
            Ok(n) => prefix.extend_from_slice(&chunk[..n]),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => {
                return Err(Error::from(ErrorKind::Io(error)).with_file_name(Some(name.as_str())));
            }
        }
    }
    match identify(&prefix) {
        Content::Json => Ok(Reader::Json(JsonReader::from_file(path)?)),
        Content::Ubjson => Ok(Reader::Ubjson(UbjsonReader::from_file(path)?)),
        Content::Unknown => Err(unknown_content("file").with_file_name(Some(name.as_str()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_json(bytes: &[u8]) {
        assert_eq!(identify(bytes), Content::Json, "{bytes:?}");
    }

    fn assert_ubjson(bytes: &[u8]) {
        assert_eq!(identify(bytes), Content::Ubjson, "{bytes:?}");
    }

    #[test]
    fn identifies_json() {
        assert_json(b"");
        assert_json(b"1");
        assert_json(b"[1]");
        assert_json(b"[{},{}]");
        assert_json(b"{\n}");
        assert_json(b"{// Start\n}");
        assert_json(b"null");
        assert_json(b"{\"1\":2}");
        assert_json(b"\xEF\xBB\xBF{\"a\":1}");
    }

    #[test]
    fn identifies_ubjson() {
        assert_ubjson(b"[#\x01iA");
        assert_ubjson(b"IAA");
        assert_ubjson(b"Si\x03abc");
        assert_ubjson(b"{i\x01aZ}");
    }

    #[test]
    fn rejects_unknown_content() {
        assert_eq!(identify(b"Pluto"), Content::Unknown);
        assert!(make_reader(b"Pluto").is_err());
    }

    #[test]
    fn make_reader_dispatches() {
        assert!(make_reader(b"").unwrap().is_json());
        assert!(make_reader(b"IAA").unwrap().is_ubjson());
        assert!(make_reader(b"{\"a\": 1}").unwrap().is_json());
    }
}
