//! The UBJSON reader.

use std::io::Read;
use std::path::Path;

use crate::base64::from_base64;
use crate::error::{Error, ErrorKind, Position};
use crate::item::{ArrayItem, JsonItem, JsonValue, ObjectItem};
use crate::scalar::{
    get_detailed_value_type, get_value_type, parse_f64, parse_integer, parse_unsigned,
};
use crate::ubjson::scope::{ReaderState, ScopeReader, ScopeState};
use crate::ubjson::token::UbjsonTokenType;
use crate::ubjson::tokenizer::{UbjsonElement, UbjsonTokenizer};
use crate::value_type::{DetailedValueType, ValueType};

/// Options of the UBJSON reader.
#[derive(Debug, Clone, Copy)]
pub struct UbjsonReaderOptions {
    /// Expand optimized arrays of `int8`, `uint8` and `char` into element
    /// sequences. When off, the materializing tree stores such arrays as a
    /// single binary value.
    pub expand_optimized_byte_arrays: bool,
}

impl Default for UbjsonReaderOptions {
    fn default() -> Self {
        UbjsonReaderOptions {
            expand_optimized_byte_arrays: true,
        }
    }
}

struct Scope {
    reader: ScopeReader,
    state: ScopeState,
}

/// A forward-only cursor over a UBJSON document.
pub struct UbjsonReader {
    tokenizer: UbjsonTokenizer,
    scopes: Vec<Scope>,
    options: UbjsonReaderOptions,
}

impl UbjsonReader {
    /// Creates a reader over an in-memory buffer.
    #[must_use]
    pub fn new(buffer: &[u8]) -> Self {
        Self::from_tokenizer(UbjsonTokenizer::new(buffer))
    }

    /// Creates a reader over a byte stream.
    #[must_use]
    pub fn from_stream(stream: impl Read + 'static) -> Self {
        Self::from_tokenizer(UbjsonTokenizer::from_stream(stream))
    }

    /// Opens `path` and reads its contents.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        Ok(Self::from_tokenizer(UbjsonTokenizer::from_file(path)?))
    }

    pub(crate) fn from_stream_with_prefix(prefix: Vec<u8>, stream: Box<dyn Read>) -> Self {
        Self::from_tokenizer(UbjsonTokenizer::from_parts(prefix, stream, None))
    }

    fn from_tokenizer(tokenizer: UbjsonTokenizer) -> Self {
        UbjsonReader {
            tokenizer,
            // The document sentinel is never popped.
            scopes: vec![Scope {
                reader: ScopeReader::Document,
                state: ScopeState::default(),
            }],
            options: UbjsonReaderOptions::default(),
        }
    }

    /// The active options.
    #[must_use]
    pub fn options(&self) -> &UbjsonReaderOptions {
        &self.options
    }

    /// Mutable access to the options.
    pub fn options_mut(&mut self) -> &mut UbjsonReaderOptions {
        &mut self.options
    }

    /// Sets the tokenizer's refill size.
    pub fn set_chunk_size(&mut self, size: usize) -> Result<(), Error> {
        self.tokenizer.set_chunk_size(size)
    }

    /// The byte offset of the read cursor.
    #[must_use]
    pub fn position(&self) -> usize {
        self.tokenizer.position()
    }

    /// The document file name, when read from a file.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.tokenizer.file_name()
    }

    /// The markers of the active scopes, innermost last.
    #[must_use]
    pub fn scope(&self) -> String {
        self.scopes
            .iter()
            .filter_map(|scope| scope.reader.marker())
            .collect()
    }

    /// The kind of the current token.
    #[must_use]
    pub fn token_type(&self) -> UbjsonTokenType {
        self.tokenizer.token_type()
    }

    fn error(&self, kind: ErrorKind) -> Error {
        Error::new(kind, Position::Offset(self.tokenizer.position()))
            .with_file_name(self.tokenizer.file_name())
    }

    fn misuse(&self, message: &str) -> Error {
        self.error(ErrorKind::Misuse(message.into()))
    }

    fn mismatch(&self, message: &str) -> Error {
        self.error(ErrorKind::TypeMismatch(message.into()))
    }

    fn overflow(&self) -> Error {
        self.error(ErrorKind::NumericOverflow(
            "overflow error while reading integer value".into(),
        ))
    }

    fn current(&mut self) -> Result<&mut Scope, Error> {
        self.scopes
            .last_mut()
            .ok_or_else(|| Error::from(ErrorKind::Misuse("reader has no scope".into())))
    }

    fn current_state(&self) -> ReaderState {
        self.scopes
            .last()
            .map_or(ReaderState::Initial, |scope| scope.state.state)
    }

    /// Advances to the next value of the current container.
    pub fn next_value(&mut self) -> Result<bool, Error> {
        let tokenizer = &mut self.tokenizer;
        match self.scopes.last_mut() {
            Some(scope) => scope.reader.next_value(tokenizer, &mut scope.state),
            None => Err(Error::from(ErrorKind::Misuse("reader has no scope".into()))),
        }
    }

    /// Advances to the next key of the current object.
    pub fn next_key(&mut self) -> Result<bool, Error> {
        let tokenizer = &mut self.tokenizer;
        match self.scopes.last_mut() {
            Some(scope) => scope.reader.next_key(tokenizer, &mut scope.state),
            None => Err(Error::from(ErrorKind::Misuse("reader has no scope".into()))),
        }
    }

    /// At top level, advances to the start of the next document.
    pub fn next_document(&mut self) -> Result<bool, Error> {
        let tokenizer = &mut self.tokenizer;
        match self.scopes.last_mut() {
            Some(scope) => scope.reader.next_document(tokenizer, &mut scope.state),
            None => Err(Error::from(ErrorKind::Misuse("reader has no scope".into()))),
        }
    }

    /// Enters the container the cursor is positioned on.
    pub fn enter(&mut self) -> Result<(), Error> {
        if self.current_state() != ReaderState::AtValue {
            return Err(self.misuse("select a value before calling enter()"));
        }
        let scope = match self.tokenizer.token_type() {
            UbjsonTokenType::StartObject => Scope {
                reader: ScopeReader::Object,
                state: ScopeState::new(ReaderState::AtStart),
            },
            UbjsonTokenType::StartArray => Scope {
                reader: ScopeReader::Array,
                state: ScopeState::new(ReaderState::AtStart),
            },
            UbjsonTokenType::StartOptimizedArray => Scope {
                reader: ScopeReader::OptimizedArray,
                state: ScopeState::optimized(&self.tokenizer),
            },
            UbjsonTokenType::StartOptimizedObject => Scope {
                reader: ScopeReader::OptimizedObject,
                state: ScopeState::optimized(&self.tokenizer),
            },
            _ => return Err(self.misuse("there is no object or array to be entered")),
        };
        self.scopes.push(scope);
        Ok(())
    }

    /// Drains the remaining elements of the current scope and pops it.
    pub fn leave(&mut self) -> Result<(), Error> {
        if self.scopes.len() == 1 {
            return Err(self.misuse("cannot call leave() when not inside an array or object"));
        }
        if self.current_state() != ReaderState::AtEnd {
            let scope = self.current()?;
            let reader = scope.reader;
            let mut state = scope.state;
            while reader.next_value(&mut self.tokenizer, &mut state)? {}
            self.current()?.state = state;
        }
        self.scopes.pop();
        self.current()?.state.state = ReaderState::AfterValue;
        Ok(())
    }

    fn assert_key_or_value(&self) -> Result<(), Error> {
        match self.current_state() {
            ReaderState::AtKey | ReaderState::AtValue => Ok(()),
            _ => Err(self.misuse("current token is not a key or a value")),
        }
    }

    /// The coarse type of the current value.
    ///
    /// With `analyze_strings`, string payloads are classified as well and
    /// the narrower type is reported when one applies.
    pub fn value_type(&self, analyze_strings: bool) -> Result<ValueType, Error> {
        self.assert_key_or_value()?;
        Ok(match self.tokenizer.token_type() {
            UbjsonTokenType::Unknown => ValueType::Unknown,
            UbjsonTokenType::Null => ValueType::Null,
            UbjsonTokenType::True | UbjsonTokenType::False => ValueType::Boolean,
            UbjsonTokenType::Int8
            | UbjsonTokenType::Uint8
            | UbjsonTokenType::Int16
            | UbjsonTokenType::Int32
            | UbjsonTokenType::Int64
            | UbjsonTokenType::Char => ValueType::Integer,
            UbjsonTokenType::Float32
            | UbjsonTokenType::Float64
            | UbjsonTokenType::HighPrecision => ValueType::Float,
            UbjsonTokenType::String => {
                if analyze_strings {
                    let value_type = get_value_type(self.tokenizer.token_str()?);
                    if value_type != ValueType::Invalid {
                        return Ok(value_type);
                    }
                }
                ValueType::String
            }
            UbjsonTokenType::StartObject | UbjsonTokenType::StartOptimizedObject => {
                ValueType::Object
            }
            UbjsonTokenType::StartArray | UbjsonTokenType::StartOptimizedArray => {
                ValueType::Array
            }
            _ => return Err(self.error(ErrorKind::UnexpectedToken("invalid token".into()))),
        })
    }

    /// The fine-grained type of the current value.
    pub fn detailed_value_type(
        &self,
        analyze_strings: bool,
    ) -> Result<DetailedValueType, Error> {
        self.assert_key_or_value()?;
        Ok(match self.tokenizer.token_type() {
            UbjsonTokenType::Unknown => DetailedValueType::Unknown,
            UbjsonTokenType::Null => DetailedValueType::Null,
            UbjsonTokenType::True | UbjsonTokenType::False => DetailedValueType::Boolean,
            UbjsonTokenType::Int8 => DetailedValueType::UInt7,
            UbjsonTokenType::Uint8 => DetailedValueType::UInt8,
            UbjsonTokenType::Int16 => DetailedValueType::UInt15,
            UbjsonTokenType::Int32 => DetailedValueType::UInt31,
            UbjsonTokenType::Int64 => DetailedValueType::UInt63,
            UbjsonTokenType::Char => DetailedValueType::Char,
            UbjsonTokenType::Float32 => DetailedValueType::Float32,
            UbjsonTokenType::Float64 => DetailedValueType::Float64,
            UbjsonTokenType::HighPrecision => DetailedValueType::HighPrecisionNumber,
            UbjsonTokenType::String => {
                if analyze_strings {
                    let value_type = get_detailed_value_type(self.tokenizer.token_str()?);
                    if value_type != DetailedValueType::Invalid {
                        return Ok(value_type);
                    }
                }
                DetailedValueType::String
            }
            UbjsonTokenType::StartObject | UbjsonTokenType::StartOptimizedObject => {
                DetailedValueType::Object
            }
            UbjsonTokenType::StartArray | UbjsonTokenType::StartOptimizedArray => {
                DetailedValueType::Array
            }
            _ => return Err(self.error(ErrorKind::UnexpectedToken("invalid token".into()))),
        })
    }

    /// True when the cursor is on a `null` value.
    #[must_use]
    pub fn read_null(&self) -> bool {
        matches!(
            self.current_state(),
            ReaderState::AtKey | ReaderState::AtValue
        ) && self.tokenizer.token_type() == UbjsonTokenType::Null
    }

    /// Reads the current value as a boolean.
    pub fn read_bool(&self) -> Result<bool, Error> {
        self.assert_key_or_value()?;
        match self.tokenizer.token_type() {
            UbjsonTokenType::True => Ok(true),
            UbjsonTokenType::False => Ok(false),
            _ => Err(self.mismatch("current token is not a boolean")),
        }
    }

    fn signed_value(&self) -> Result<i64, Error> {
        self.assert_key_or_value()?;
        if let Some(value) = self.tokenizer.token_i64() {
            return Ok(value);
        }
        match self.tokenizer.token_type() {
            UbjsonTokenType::String | UbjsonTokenType::HighPrecision => {
                parse_integer(self.tokenizer.token_str()?, false)
                    .ok_or_else(|| self.mismatch("invalid integer"))
            }
            _ => Err(self.mismatch("current token is not an integer")),
        }
    }

    fn unsigned_value(&self) -> Result<u64, Error> {
        self.assert_key_or_value()?;
        if let Some(value) = self.tokenizer.token_i64() {
            return u64::try_from(value).map_err(|_| self.overflow());
        }
        match self.tokenizer.token_type() {
            UbjsonTokenType::String | UbjsonTokenType::HighPrecision => {
                parse_unsigned(self.tokenizer.token_str()?, false)
                    .ok_or_else(|| self.mismatch("invalid integer"))
            }
            _ => Err(self.mismatch("current token is not an integer")),
        }
    }

    /// Reads the current value as an `i8`.
    pub fn read_i8(&self) -> Result<i8, Error> {
        let value = self.signed_value()?;
        i8::try_from(value).map_err(|_| self.overflow())
    }

    /// Reads the current value as an `i16`.
    pub fn read_i16(&self) -> Result<i16, Error> {
        let value = self.signed_value()?;
        i16::try_from(value).map_err(|_| self.overflow())
    }

    /// Reads the current value as an `i32`.
    pub fn read_i32(&self) -> Result<i32, Error> {
        let value = self.signed_value()?;
        i32::try_from(value).map_err(|_| self.overflow())
    }

    /// Reads the current value as an `i64`.
    pub fn read_i64(&self) -> Result<i64, Error> {
        self.signed_value()
    }

    /// Reads the current value as a `u8`.
    pub fn read_u8(&self) -> Result<u8, Error> {
        let value = self.unsigned_value()?;
        u8::try_from(value).map_err(|_| self.overflow())
    }

    /// Reads the current value as a `u16`.
    pub fn read_u16(&self) -> Result<u16, Error> {
        let value = self.unsigned_value()?;
        u16::try_from(value).map_err(|_| self.overflow())
    }

    /// Reads the current value as a `u32`.
    pub fn read_u32(&self) -> Result<u32, Error> {
        let value = self.unsigned_value()?;
        u32::try_from(value).map_err(|_| self.overflow())
    }

    /// Reads the current value as a `u64`.
    pub fn read_u64(&self) -> Result<u64, Error> {
        self.unsigned_value()
    }

    fn float_value(&self) -> Result<f64, Error> {
        self.assert_key_or_value()?;
        if let Some(value) = self.tokenizer.token_f64() {
            return Ok(value);
        }
        if let Some(value) = self.tokenizer.token_i64() {
            #[allow(clippy::cast_precision_loss)]
            return Ok(value as f64);
        }
        match self.tokenizer.token_type() {
            UbjsonTokenType::Null => Ok(f64::NAN),
            UbjsonTokenType::String | UbjsonTokenType::HighPrecision => {
                parse_f64(self.tokenizer.token_str()?)
                    .ok_or_else(|| self.mismatch("invalid floating point value"))
            }
            _ => Err(self.mismatch("current token is not a number")),
        }
    }

    /// Reads the current value as an `f32`.
    pub fn read_f32(&self) -> Result<f32, Error> {
        let value = self.float_value()?;
        #[allow(clippy::cast_possible_truncation)]
        let narrowed = value as f32;
        Ok(narrowed)
    }

    /// Reads the current value as an `f64`.
    pub fn read_f64(&self) -> Result<f64, Error> {
        self.float_value()
    }

    /// Reads the current value as a single character.
    pub fn read_char(&self) -> Result<char, Error> {
        self.assert_key_or_value()?;
        match self.tokenizer.token_type() {
            UbjsonTokenType::Char => Ok(char::from(self.tokenizer.token()[0])),
            UbjsonTokenType::String => {
                let text = self.tokenizer.token_str()?;
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(self.mismatch("current token is not a single character")),
                }
            }
            UbjsonTokenType::Int8 | UbjsonTokenType::Uint8 => {
                let value = self.tokenizer.token_i64().unwrap_or_default();
                u8::try_from(value)
                    .map(char::from)
                    .map_err(|_| self.overflow())
            }
            _ => Err(self.mismatch("current token is not a character")),
        }
    }

    /// Reads the current value as a string.
    pub fn read_string(&self) -> Result<String, Error> {
        self.assert_key_or_value()?;
        match self.tokenizer.token_type() {
            UbjsonTokenType::String | UbjsonTokenType::HighPrecision => {
                Ok(self.tokenizer.token_str()?.to_owned())
            }
            UbjsonTokenType::Char => Ok(char::from(self.tokenizer.token()[0]).to_string()),
            _ => Err(self.mismatch("current token is not a string")),
        }
    }

    /// Reads a whole optimized array of fixed-size elements.
    ///
    /// Returns `Ok(None)` when the current value is not an optimized array
    /// with the matching declared element type.
    pub fn read_optimized_array<T: UbjsonElement>(&mut self) -> Result<Option<Vec<T>>, Error> {
        if self.current_state() != ReaderState::AtValue {
            return Err(self.misuse("current token is not an optimized array"));
        }
        if self.tokenizer.token_type() != UbjsonTokenType::StartOptimizedArray
            || self.tokenizer.content_type() != T::TOKEN
        {
            return Ok(None);
        }
        let count = self.tokenizer.content_size();
        let values = self.tokenizer.read_elements::<T>(count)?;
        self.current()?.state.state = ReaderState::AfterValue;
        Ok(Some(values))
    }

    /// Reads a whole optimized array of `int8`, `uint8` or `char` values as
    /// raw bytes.
    ///
    /// Returns `Ok(None)` when the current value is not such an array.
    pub fn read_binary(&mut self) -> Result<Option<Vec<u8>>, Error> {
        if self.current_state() != ReaderState::AtValue {
            return Err(self.misuse("current token is not an optimized array"));
        }
        if self.tokenizer.token_type() != UbjsonTokenType::StartOptimizedArray {
            return Ok(None);
        }
        match self.tokenizer.content_type() {
            UbjsonTokenType::Int8 | UbjsonTokenType::Uint8 | UbjsonTokenType::Char => {}
            _ => return Ok(None),
        }
        let count = self.tokenizer.content_size();
        let bytes = self.tokenizer.read_raw(count)?;
        self.current()?.state.state = ReaderState::AfterValue;
        Ok(Some(bytes))
    }

    /// Decodes a Base64 string value into bytes.
    pub fn read_base64(&self) -> Result<Vec<u8>, Error> {
        self.assert_key_or_value()?;
        if self.tokenizer.token_type() != UbjsonTokenType::String {
            return Err(self.mismatch("current token is not a string"));
        }
        let position = self.tokenizer.error_position();
        from_base64(self.tokenizer.token()).map_err(|error| error.with_position(position))
    }

    /// Materializes the remainder of the current value as a tree.
    pub fn read_item(&mut self) -> Result<JsonItem, Error> {
        if matches!(
            self.current_state(),
            ReaderState::Initial | ReaderState::AtStart
        ) && !self.next_value()?
        {
            return Err(self.misuse("no key or value"));
        }
        let expand = self.options.expand_optimized_byte_arrays;
        match self.current_state() {
            ReaderState::AtValue => match self.tokenizer.token_type() {
                UbjsonTokenType::StartObject | UbjsonTokenType::StartOptimizedObject => {
                    self.read_object_item(expand)
                }
                UbjsonTokenType::StartArray | UbjsonTokenType::StartOptimizedArray => {
                    self.read_array_item(expand)
                }
                _ => Ok(JsonItem::from_value(self.scalar_item()?)),
            },
            ReaderState::AtKey => Ok(JsonItem::from_value(self.scalar_item()?)),
            _ => Err(self.misuse("no key or value")),
        }
    }

    fn scalar_item(&self) -> Result<JsonValue, Error> {
        Ok(match self.tokenizer.token_type() {
            UbjsonTokenType::Null => JsonValue::null(),
            UbjsonTokenType::True => JsonValue::boolean(true),
            UbjsonTokenType::False => JsonValue::boolean(false),
            UbjsonTokenType::Int8
            | UbjsonTokenType::Uint8
            | UbjsonTokenType::Int16
            | UbjsonTokenType::Int32
            | UbjsonTokenType::Int64 => JsonValue::integer(
                self.tokenizer
                    .token_i64()
                    .ok_or_else(|| self.mismatch("invalid integer payload"))?,
            ),
            UbjsonTokenType::Char => JsonValue::character(char::from(self.tokenizer.token()[0])),
            UbjsonTokenType::Float32 | UbjsonTokenType::Float64 => JsonValue::float(
                self.tokenizer
                    .token_f64()
                    .ok_or_else(|| self.mismatch("invalid float payload"))?,
            ),
            UbjsonTokenType::String => JsonValue::text(self.tokenizer.token_str()?.to_owned()),
            UbjsonTokenType::HighPrecision => {
                JsonValue::high_precision(self.tokenizer.token_str()?.to_owned())
            }
            _ => return Err(self.misuse("no key or value")),
        })
    }

    fn read_array_item(&mut self, expand: bool) -> Result<JsonItem, Error> {
        if self.tokenizer.token_type() == UbjsonTokenType::StartOptimizedArray && !expand {
            match self.tokenizer.content_type() {
                UbjsonTokenType::Char | UbjsonTokenType::Int8 | UbjsonTokenType::Uint8 => {
                    if let Some(bytes) = self.read_binary()? {
                        return Ok(JsonItem::from_value(JsonValue::binary(bytes)));
                    }
                }
                _ => {}
            }
        }

        self.enter()?;
        let mut values = Vec::new();
        while self.next_value()? {
            match self.tokenizer.token_type() {
                UbjsonTokenType::StartObject | UbjsonTokenType::StartOptimizedObject => {
                    values.push(self.read_object_item(expand)?);
                }
                UbjsonTokenType::StartArray | UbjsonTokenType::StartOptimizedArray => {
                    values.push(self.read_array_item(expand)?);
                }
                _ => values.push(JsonItem::from_value(self.scalar_item()?)),
            }
        }
        self.leave()?;
        Ok(JsonItem::from_array(ArrayItem::new(values)))
    }

    fn read_object_item(&mut self, expand: bool) -> Result<JsonItem, Error> {
        self.enter()?;
        let mut object = ObjectItem::new();
        while self.next_key()? {
            let key = self.tokenizer.token_str()?.to_owned();
            if !self.next_value()? {
                return Err(self.error(ErrorKind::UnexpectedToken(format!(
                    "key without value: {key}"
                ))));
            }
            let value = match self.tokenizer.token_type() {
                UbjsonTokenType::StartObject | UbjsonTokenType::StartOptimizedObject => {
                    self.read_object_item(expand)?
                }
                UbjsonTokenType::StartArray | UbjsonTokenType::StartOptimizedArray => {
                    self.read_array_item(expand)?
                }
                _ => JsonItem::from_value(self.scalar_item()?),
            };
            object.insert(key, value);
        }
        self.leave()?;
        Ok(JsonItem::from_object(object))
    }
}
