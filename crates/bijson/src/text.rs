//! Text sources for the JSON tokenizer.
//!
//! The tokenizer consumes UTF-8. A [`TextRead`] implementation detects the
//! source encoding (byte-order mark first, zero-byte pattern heuristic
//! otherwise), transcodes to UTF-8 and appends the result to the
//! tokenizer's buffer one chunk at a time.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::error::{Error, ErrorKind};

/// A source of UTF-8 text.
pub trait TextRead {
    /// Appends at most `max` bytes of UTF-8 text to `buffer`.
    ///
    /// Returns `Ok(false)` when the input is exhausted and nothing was
    /// appended.
    fn read(&mut self, buffer: &mut Vec<u8>, max: usize) -> Result<bool, Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Utf32Be,
}

fn invalid_encoding(message: &str) -> Error {
    Error::from(ErrorKind::InvalidEncoding(message.into()))
}

/// Returns the length of a recognized byte-order mark, or zero.
pub(crate) fn byte_order_mark_length(bytes: &[u8]) -> usize {
    if bytes.starts_with(&[0x00, 0x00, 0xFE, 0xFF]) || bytes.starts_with(&[0xFF, 0xFE, 0x00, 0x00])
    {
        4
    } else if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        3
    } else if bytes.starts_with(&[0xFE, 0xFF]) || bytes.starts_with(&[0xFF, 0xFE]) {
        2
    } else {
        0
    }
}

// BOM if present, otherwise the zero-byte pattern of the first characters.
fn detect_encoding(bytes: &[u8]) -> (Encoding, usize) {
    if bytes.starts_with(&[0x00, 0x00, 0xFE, 0xFF]) {
        return (Encoding::Utf32Be, 4);
    }
    if bytes.starts_with(&[0xFF, 0xFE, 0x00, 0x00]) {
        return (Encoding::Utf32Le, 4);
    }
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return (Encoding::Utf8, 3);
    }
    if bytes.starts_with(&[0xFE, 0xFF]) {
        return (Encoding::Utf16Be, 2);
    }
    if bytes.starts_with(&[0xFF, 0xFE]) {
        return (Encoding::Utf16Le, 2);
    }
    if bytes.len() >= 4 {
        if bytes[0] == 0 && bytes[1] == 0 && bytes[2] == 0 {
            return (Encoding::Utf32Be, 0);
        }
        if bytes[1] == 0 && bytes[2] == 0 && bytes[3] == 0 {
            return (Encoding::Utf32Le, 0);
        }
    }
    if bytes.len() >= 2 {
        if bytes[0] == 0 {
            return (Encoding::Utf16Be, 0);
        }
        if bytes[1] == 0 {
            return (Encoding::Utf16Le, 0);
        }
    }
    (Encoding::Utf8, 0)
}

fn push_char(out: &mut Vec<u8>, c: char) {
    let mut tmp = [0u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut tmp).as_bytes());
}

/// Transcodes complete characters from the head of `pending` into `out`.
///
/// Returns the number of input bytes consumed; bytes belonging to a
/// character that is still incomplete are left in place unless `at_end`,
/// in which case they are an error.
fn transcode(
    pending: &[u8],
    encoding: Encoding,
    at_end: bool,
    out: &mut Vec<u8>,
) -> Result<usize, Error> {
    match encoding {
        Encoding::Utf8 => match std::str::from_utf8(pending) {
            Ok(text) => {
                out.extend_from_slice(text.as_bytes());
                Ok(pending.len())
            }
            Err(error) => {
                let valid = error.valid_up_to();
                if error.error_len().is_some() || at_end {
                    return Err(invalid_encoding("invalid UTF-8 sequence"));
                }
                out.extend_from_slice(&pending[..valid]);
                Ok(valid)
            }
        },
        Encoding::Utf16Le | Encoding::Utf16Be => {
            let le = encoding == Encoding::Utf16Le;
            let mut i = 0;
            while i + 2 <= pending.len() {
                let unit = if le {
                    u16::from_le_bytes([pending[i], pending[i + 1]])
                } else {
                    u16::from_be_bytes([pending[i], pending[i + 1]])
                };
                if (0xD800..0xDC00).contains(&unit) {
                    if i + 4 <= pending.len() {
                        let low = if le {
                            u16::from_le_bytes([pending[i + 2], pending[i + 3]])
                        } else {
                            u16::from_be_bytes([pending[i + 2], pending[i + 3]])
                        };
                        if !(0xDC00..0xE000).contains(&low) {
                            return Err(invalid_encoding("unpaired UTF-16 surrogate"));
                        }
                        let code = 0x10000
                            + ((u32::from(unit) - 0xD800) << 10)
                            + (u32::from(low) - 0xDC00);
                        let c = char::from_u32(code)
                            .ok_or_else(|| invalid_encoding("invalid UTF-16 sequence"))?;
                        push_char(out, c);
                        i += 4;
                    } else if at_end {
                        return Err(invalid_encoding("truncated UTF-16 surrogate pair"));
                    } else {
                        break;
                    }
                } else if (0xDC00..0xE000).contains(&unit) {
                    return Err(invalid_encoding("unpaired UTF-16 surrogate"));
                } else {
                    let c = char::from_u32(u32::from(unit))
                        .ok_or_else(|| invalid_encoding("invalid UTF-16 sequence"))?;
                    push_char(out, c);
                    i += 2;
                }
            }
            if at_end && i != pending.len() && pending.len() - i < 2 {
                return Err(invalid_encoding("truncated UTF-16 code unit"));
            }
            Ok(i)
        }
        Encoding::Utf32Le | Encoding::Utf32Be => {
            let le = encoding == Encoding::Utf32Le;
            let mut i = 0;
            while i + 4 <= pending.len() {
                let word = [pending[i], pending[i + 1], pending[i + 2], pending[i + 3]];
                let code = if le {
                    u32::from_le_bytes(word)
                } else {
                    u32::from_be_bytes(word)
                };
                let c = char::from_u32(code)
                    .ok_or_else(|| invalid_encoding("invalid UTF-32 code point"))?;
                push_char(out, c);
                i += 4;
            }
            if at_end && i != pending.len() {
                return Err(invalid_encoding("truncated UTF-32 code unit"));
            }
            Ok(i)
        }
    }
}

/// Reads from an in-memory buffer.
pub struct TextBufferReader {
    data: Vec<u8>,
    text: Vec<u8>,
    offset: usize,
    transcoded: bool,
}

impl TextBufferReader {
    /// Creates a reader over a copy of `data`; the encoding is detected and
    /// transcoded on the first read.
    #[must_use]
    pub fn new(data: &[u8]) -> Self {
        TextBufferReader {
            data: data.to_vec(),
            text: Vec::new(),
            offset: 0,
            transcoded: false,
        }
    }
}

impl TextRead for TextBufferReader {
    fn read(&mut self, buffer: &mut Vec<u8>, max: usize) -> Result<bool, Error> {
        if !self.transcoded {
            let (encoding, bom) = detect_encoding(&self.data);
            transcode(&self.data[bom..], encoding, true, &mut self.text)?;
            self.data = Vec::new();
            self.transcoded = true;
        }
        if self.offset == self.text.len() {
            return Ok(false);
        }
        let n = max.min(self.text.len() - self.offset);
        buffer.extend_from_slice(&self.text[self.offset..self.offset + n]);
        self.offset += n;
        Ok(n > 0)
    }
}

/// Reads and transcodes from a byte stream.
pub struct TextStreamReader {
    source: Box<dyn Read>,
    pending: Vec<u8>,
    encoding: Option<Encoding>,
    source_done: bool,
}

impl TextStreamReader {
    /// Creates a reader over `source`.
    #[must_use]
    pub fn new(source: impl Read + 'static) -> Self {
        Self::with_prefix(Vec::new(), Box::new(source))
    }

    /// Creates a reader whose first bytes were already pulled off the
    /// stream (used when the content sniffer has consumed a prefix).
    pub(crate) fn with_prefix(prefix: Vec<u8>, source: Box<dyn Read>) -> Self {
        TextStreamReader {
            source,
            pending: prefix,
            encoding: None,
            source_done: false,
        }
    }

    fn fill_pending(&mut self, max: usize) -> Result<(), Error> {
        if self.source_done {
            return Ok(());
        }
        let start = self.pending.len();
        self.pending.resize(start + max, 0);
        let mut filled = start;
        loop {
            match self.source.read(&mut self.pending[filled..]) {
                Ok(0) => {
                    self.source_done = true;
                    break;
                }
                Ok(n) => {
                    filled += n;
                    break;
                }
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => {
                    self.pending.truncate(filled);
                    return Err(error.into());
                }
            }
        }
        self.pending.truncate(filled);
        Ok(())
    }
}

impl TextRead for TextStreamReader {
    fn read(&mut self, buffer: &mut Vec<u8>, max: usize) -> Result<bool, Error> {
        let max = max.max(4);
        let before = buffer.len();
        loop {
            self.fill_pending(max)?;
            if self.encoding.is_none() {
                // Four bytes are enough for every supported detection case.
                while self.pending.len() < 4 && !self.source_done {
                    self.fill_pending(4)?;
                }
                let (encoding, bom) = detect_encoding(&self.pending);
                self.pending.drain(..bom);
                self.encoding = Some(encoding);
            }
            let encoding = self.encoding.unwrap_or(Encoding::Utf8);
            let consumed = transcode(&self.pending, encoding, self.source_done, buffer)?;
            self.pending.drain(..consumed);
            if buffer.len() > before {
                return Ok(true);
            }
            if self.source_done {
                return Ok(false);
            }
        }
    }
}

/// Reads and transcodes from a file, remembering its name for error
/// messages.
pub struct TextFileReader {
    inner: TextStreamReader,
    file_name: String,
}

impl TextFileReader {
    /// Opens `path` for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let file_name = path.display().to_string();
        let file = File::open(path).map_err(|error| {
            Error::from(ErrorKind::Io(error)).with_file_name(Some(file_name.as_str()))
        })?;
        Ok(TextFileReader {
            inner: TextStreamReader::new(file),
            file_name,
        })
    }

    /// The name of the underlying file.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl TextRead for TextFileReader {
    fn read(&mut self, buffer: &mut Vec<u8>, max: usize) -> Result<bool, Error> {
        self.inner.read(buffer, max)
    }
}
