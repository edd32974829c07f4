//! The JSON reader state machine.

use std::io::Read;
use std::path::Path;

use crate::base64::from_base64;
use crate::error::{Error, ErrorKind};
use crate::item::{ArrayItem, JsonItem, JsonValue, ObjectItem};
use crate::json::escape::unescape;
use crate::json::token::JsonTokenType;
use crate::json::tokenizer::JsonTokenizer;
use crate::scalar::{
    get_detailed_value_type, get_value_type, parse_f32, parse_f64, parse_integer, parse_unsigned,
};
use crate::value_type::{DetailedValueType, ValueType};

/// Language-extension options of the JSON reader.
///
/// All extensions default to off; standard JSON always parses.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReaderOptions {
    /// Allow numbers, booleans and null to be read out of string tokens.
    pub strings_as_values: bool,
    /// Allow unquoted literals to be read as strings.
    pub values_as_strings: bool,
    /// Accept a trailing comma before `]` or `}`.
    pub end_element_after_comma: bool,
    /// Accept `//` line comments and `/* ... */` block comments.
    pub comments: bool,
    /// Allow `enter()` on a `null` value; the scope is empty.
    pub enter_null: bool,
    /// Accept unquoted identifier-like keys.
    pub values_as_keys: bool,
    /// Accept `0b`, `0o` and `0x` integer literals with `_` separators.
    pub extended_integers: bool,
    /// Accept triple-quoted block strings that may span lines.
    pub block_strings: bool,
    /// Accept `Infinity`, `-Infinity` and `NaN`.
    pub extended_floats: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    AtStartOfDocument,
    AtValueOfDocument,
    AtEndOfDocument,
    AtEndOfStream,
    AtStartOfArray,
    AtValueInArray,
    AfterValueInArray,
    AtCommaInArray,
    AtEndOfArray,
    AtStartOfObject,
    AtKeyInObject,
    AfterKeyInObject,
    AtColonInObject,
    AtValueInObject,
    AfterValueInObject,
    AtCommaInObject,
    AtEndOfObject,
    AtEndOfNull,
    UnrecoverableError,
}

fn is_sub_element(token_type: JsonTokenType) -> bool {
    matches!(
        token_type,
        JsonTokenType::StartArray | JsonTokenType::StartObject
    )
}

/// A forward-only cursor over a JSON document.
pub struct JsonReader {
    tokenizer: JsonTokenizer,
    state: State,
    state_stack: Vec<State>,
    skip_depth: usize,
    options: JsonReaderOptions,
}

impl JsonReader {
    /// Creates a reader over an in-memory buffer.
    #[must_use]
    pub fn new(buffer: &[u8]) -> Self {
        Self::from_tokenizer(JsonTokenizer::new(buffer))
    }

    /// Creates a reader over a byte stream.
    #[must_use]
    pub fn from_stream(stream: impl Read + 'static) -> Self {
        Self::from_tokenizer(JsonTokenizer::from_stream(stream))
    }

    /// Opens `path` and reads its contents.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        Ok(Self::from_tokenizer(JsonTokenizer::from_file(path)?))
    }

    pub(crate) fn from_stream_with_prefix(prefix: Vec<u8>, stream: Box<dyn Read>) -> Self {
        Self::from_tokenizer(JsonTokenizer::from_stream_with_prefix(prefix, stream))
    }

    fn from_tokenizer(tokenizer: JsonTokenizer) -> Self {
        JsonReader {
            tokenizer,
            state: State::Initial,
            state_stack: Vec::new(),
            skip_depth: 0,
            options: JsonReaderOptions::default(),
        }
    }

    /// The active language-extension options.
    #[must_use]
    pub fn options(&self) -> &JsonReaderOptions {
        &self.options
    }

    /// Mutable access to the language-extension options.
    pub fn options_mut(&mut self) -> &mut JsonReaderOptions {
        &mut self.options
    }

    /// Sets the tokenizer's refill size; must be at least four.
    pub fn set_chunk_size(&mut self, size: usize) -> Result<(), Error> {
        self.tokenizer.set_chunk_size(size)
    }

    /// 1-based line number of the current position.
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.tokenizer.line_number()
    }

    /// 1-based column number of the current position.
    #[must_use]
    pub fn column_number(&self) -> usize {
        self.tokenizer.column_number()
    }

    /// The document file name, when read from a file.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.tokenizer.file_name()
    }

    /// The kind of the current token.
    #[must_use]
    pub fn token_type(&self) -> JsonTokenType {
        self.tokenizer.token_type()
    }

    fn error(&self, kind: ErrorKind) -> Error {
        Error::new(kind, self.tokenizer.position())
            .with_file_name(self.tokenizer.file_name())
    }

    fn misuse(&self, message: &str) -> Error {
        self.error(ErrorKind::Misuse(message.into()))
    }

    fn mismatch(&self, message: &str) -> Error {
        self.error(ErrorKind::TypeMismatch(message.into()))
    }

    fn syntax(&mut self, message: String) -> Error {
        self.state = State::UnrecoverableError;
        self.error(ErrorKind::UnexpectedToken(message))
    }

    /// Advances to the next significant token.
    ///
    /// Comments and whitespace drive internal state but are skipped;
    /// returns false once the current container (or document) has no more
    /// tokens to offer.
    pub fn next_token(&mut self) -> Result<bool, Error> {
        if self.skip_depth != 0 && self.state != State::UnrecoverableError {
            self.skip_element()?;
        }
        match self.state {
            State::AtValueOfDocument | State::AtValueInArray | State::AtValueInObject => {
                if is_sub_element(self.tokenizer.token_type()) {
                    self.skip_element()?;
                }
            }
            _ => {}
        }
        self.next_token_impl()
    }

    fn next_token_impl(&mut self) -> Result<bool, Error> {
        match self.state {
            State::UnrecoverableError => {
                return Err(self.misuse("can't continue reading the current stream"));
            }
            State::Initial => self.state = State::AtStartOfDocument,
            State::AtValueInArray | State::AtValueInObject => {
                if is_sub_element(self.tokenizer.token_type()) {
                    return Ok(false);
                }
            }
            State::AtValueOfDocument => {
                if is_sub_element(self.tokenizer.token_type()) {
                    return Ok(false);
                }
                self.state = State::AtEndOfDocument;
                return Ok(false);
            }
            State::AtEndOfArray
            | State::AtEndOfObject
            | State::AtEndOfNull
            | State::AtEndOfStream
            | State::AtEndOfDocument => return Ok(false),
            _ => {}
        }

        loop {
            self.tokenizer.set_block_strings(self.options.block_strings);
            if !self.tokenizer.next()? {
                return match self.tokenizer.token_type() {
                    JsonTokenType::EndOfFile => {
                        self.process_end_of_stream()?;
                        Ok(true)
                    }
                    _ => Err(self.syntax("invalid token".into())),
                };
            }
            match self.tokenizer.token_type() {
                JsonTokenType::StartArray => {
                    self.process_start_array()?;
                    return Ok(true);
                }
                JsonTokenType::EndArray => {
                    self.process_end_array()?;
                    return Ok(true);
                }
                JsonTokenType::StartObject => {
                    self.process_start_object()?;
                    return Ok(true);
                }
                JsonTokenType::EndObject => {
                    self.process_end_object()?;
                    return Ok(true);
                }
                JsonTokenType::Colon => {
                    self.process_colon()?;
                    return Ok(true);
                }
                JsonTokenType::Comma => {
                    self.process_comma()?;
                    return Ok(true);
                }
                JsonTokenType::String => {
                    self.process_string()?;
                    return Ok(true);
                }
                JsonTokenType::Value => {
                    self.process_value()?;
                    return Ok(true);
                }
                JsonTokenType::Comment | JsonTokenType::BlockComment => {
                    if !self.options.comments {
                        return Err(self.syntax("invalid token".into()));
                    }
                    self.process_whitespace();
                }
                JsonTokenType::Whitespace | JsonTokenType::Newline => self.process_whitespace(),
                _ => {}
            }
        }
    }

    /// Advances to the next key of the current object.
    pub fn next_key(&mut self) -> Result<bool, Error> {
        if self.skip_depth != 0 && self.state != State::UnrecoverableError {
            self.skip_element()?;
        }
        match self.state {
            State::AtStartOfObject
            | State::AtKeyInObject
            | State::AfterKeyInObject
            | State::AtColonInObject
            | State::AfterValueInObject
            | State::AtCommaInObject => {}
            State::AtValueInObject => self.skip_element()?,
            State::AtEndOfObject | State::AtEndOfNull => return Ok(false),
            _ => {
                return Err(self.misuse("next_key() can only be called inside an object"));
            }
        }
        while self.next_token_impl()? {
            match self.state {
                State::AtValueInObject => self.skip_element()?,
                State::AtKeyInObject => return Ok(true),
                State::AfterKeyInObject
                | State::AtColonInObject
                | State::AfterValueInObject
                | State::AtCommaInObject => {}
                _ => return Ok(false),
            }
        }
        Ok(false)
    }

    /// Advances to the next value of the current container.
    pub fn next_value(&mut self) -> Result<bool, Error> {
        if self.skip_depth != 0 && self.state != State::UnrecoverableError {
            self.skip_element()?;
        }
        match self.state {
            State::AtEndOfStream
            | State::AtEndOfDocument
            | State::AtEndOfArray
            | State::AtEndOfObject
            | State::AtEndOfNull => return Ok(false),
            State::AtValueInObject | State::AtValueInArray | State::AtValueOfDocument => {
                if is_sub_element(self.tokenizer.token_type()) {
                    self.skip_element()?;
                }
            }
            _ => {}
        }
        while self.next_token_impl()? {
            match self.state {
                State::AtValueInObject | State::AtValueInArray | State::AtValueOfDocument => {
                    return Ok(true);
                }
                _ => {}
            }
        }
        Ok(false)
    }

    /// At top level, advances past the current document to the start of the
    /// next whitespace-delimited one.
    pub fn next_document(&mut self) -> Result<bool, Error> {
        while self.state != State::AtEndOfDocument {
            match self.state {
                State::AtEndOfStream => return Ok(false),
                State::UnrecoverableError => {
                    return Err(self.misuse("can't continue reading the current stream"));
                }
                State::AtEndOfObject | State::AtEndOfArray | State::AtEndOfNull => self.leave()?,
                _ => {
                    self.next_value()?;
                }
            }
        }
        self.state = State::AtStartOfDocument;
        Ok(true)
    }

    /// Enters the array or object the cursor is positioned on.
    pub fn enter(&mut self) -> Result<(), Error> {
        let push_state = match self.state {
            State::AtValueInArray => State::AfterValueInArray,
            State::AtValueOfDocument => State::AtEndOfDocument,
            State::AtValueInObject => State::AfterValueInObject,
            _ => return Err(self.misuse("there's no array or object to enter")),
        };
        match self.tokenizer.token_type() {
            JsonTokenType::StartObject => self.state = State::AtStartOfObject,
            JsonTokenType::StartArray => self.state = State::AtStartOfArray,
            _ if self.options.enter_null && self.is_null() => self.state = State::AtEndOfNull,
            _ => return Err(self.misuse("only arrays and objects can be entered")),
        }
        self.state_stack.push(push_state);
        Ok(())
    }

    /// Consumes the rest of the current container and pops back to the
    /// parent scope.
    pub fn leave(&mut self) -> Result<(), Error> {
        match self.state {
            State::Initial
            | State::AtStartOfDocument
            | State::AtValueOfDocument
            | State::AtEndOfDocument
            | State::AtEndOfStream => Err(self.misuse("leave() wasn't preceded by enter()")),
            State::AtEndOfArray | State::AtEndOfObject | State::AtEndOfNull => {
                self.pop_scope()
            }
            _ => {
                while self.next_token()? {}
                self.pop_scope()
            }
        }
    }

    fn pop_scope(&mut self) -> Result<(), Error> {
        match self.state_stack.pop() {
            Some(state) => {
                self.state = state;
                Ok(())
            }
            None => Err(self.misuse("leave() wasn't preceded by enter()")),
        }
    }

    // Drains a nested structure with a depth counter instead of recursion.
    fn skip_element(&mut self) -> Result<(), Error> {
        if self.skip_depth == 0 {
            if !is_sub_element(self.tokenizer.token_type()) {
                return Ok(());
            }
            self.enter()?;
            self.skip_depth = 1;
        }
        while self.skip_depth != 0 {
            if !self.next_token_impl()? {
                match self.tokenizer.token_type() {
                    JsonTokenType::StartArray | JsonTokenType::StartObject => {
                        self.enter()?;
                        self.skip_depth += 1;
                    }
                    JsonTokenType::EndArray | JsonTokenType::EndObject => {
                        self.leave()?;
                        self.skip_depth -= 1;
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn process_start_array(&mut self) -> Result<(), Error> {
        match self.state {
            State::AtStartOfDocument => self.state = State::AtValueOfDocument,
            State::AtColonInObject => self.state = State::AtValueInObject,
            State::AtStartOfArray | State::AtCommaInArray => self.state = State::AtValueInArray,
            _ => return Err(self.syntax("unexpected '['".into())),
        }
        Ok(())
    }

    fn process_end_array(&mut self) -> Result<(), Error> {
        match self.state {
            State::AtStartOfArray | State::AtValueInArray | State::AfterValueInArray => {
                self.state = State::AtEndOfArray;
            }
            State::AtCommaInArray => {
                self.state = State::AtEndOfArray;
                if !self.options.end_element_after_comma {
                    return Err(self.error(ErrorKind::UnexpectedToken("unexpected ']'".into())));
                }
            }
            _ => return Err(self.syntax("unexpected ']'".into())),
        }
        Ok(())
    }

    fn process_start_object(&mut self) -> Result<(), Error> {
        match self.state {
            State::AtStartOfDocument => self.state = State::AtValueOfDocument,
            State::AtColonInObject => self.state = State::AtValueInObject,
            State::AtStartOfArray | State::AtCommaInArray => self.state = State::AtValueInArray,
            _ => return Err(self.syntax("unexpected '{'".into())),
        }
        Ok(())
    }

    fn process_end_object(&mut self) -> Result<(), Error> {
        match self.state {
            State::AtStartOfObject | State::AtValueInObject | State::AfterValueInObject => {
                self.state = State::AtEndOfObject;
            }
            State::AtCommaInObject => {
                self.state = State::AtEndOfObject;
                if !self.options.end_element_after_comma {
                    return Err(self.error(ErrorKind::UnexpectedToken("unexpected '}'".into())));
                }
            }
            _ => return Err(self.syntax("unexpected '}'".into())),
        }
        Ok(())
    }

    fn process_string(&mut self) -> Result<(), Error> {
        match self.state {
            State::AtStartOfDocument => self.state = State::AtValueOfDocument,
            State::AtStartOfArray | State::AtCommaInArray => self.state = State::AtValueInArray,
            State::AtStartOfObject | State::AtCommaInObject => self.state = State::AtKeyInObject,
            State::AtColonInObject => self.state = State::AtValueInObject,
            _ => return Err(self.syntax("unexpected string".into())),
        }
        Ok(())
    }

    fn process_value(&mut self) -> Result<(), Error> {
        match self.state {
            State::AtStartOfDocument => self.state = State::AtValueOfDocument,
            State::AtStartOfArray | State::AtCommaInArray => self.state = State::AtValueInArray,
            State::AtColonInObject => self.state = State::AtValueInObject,
            State::AtValueInObject
            | State::AtValueInArray
            | State::AtStartOfObject
            | State::AtCommaInObject => {
                self.state = State::AtKeyInObject;
                if !self.options.values_as_keys {
                    let token = self.tokenizer.token_string()?;
                    return Err(self.error(ErrorKind::UnexpectedToken(format!(
                        "unexpected value: {token}"
                    ))));
                }
            }
            _ => {
                let token = self.tokenizer.token_string().unwrap_or_default();
                return Err(self.syntax(format!("unexpected value: {token}")));
            }
        }
        Ok(())
    }

    fn process_colon(&mut self) -> Result<(), Error> {
        match self.state {
            State::AtKeyInObject | State::AfterKeyInObject => {
                self.state = State::AtColonInObject;
            }
            State::AtStartOfObject
            | State::AtCommaInObject
            | State::AtValueInObject
            | State::AfterValueInObject => {
                self.state = State::AtColonInObject;
                return Err(self.error(ErrorKind::UnexpectedToken("unexpected colon".into())));
            }
            _ => return Err(self.syntax("unexpected colon".into())),
        }
        Ok(())
    }

    fn process_comma(&mut self) -> Result<(), Error> {
        match self.state {
            State::AtValueInArray | State::AfterValueInArray => {
                self.state = State::AtCommaInArray;
            }
            State::AtValueInObject | State::AfterValueInObject => {
                self.state = State::AtCommaInObject;
            }
            State::AtStartOfArray | State::AtCommaInArray => {
                self.state = State::AtCommaInArray;
                return Err(self.error(ErrorKind::UnexpectedToken("unexpected comma".into())));
            }
            State::AtStartOfObject
            | State::AtCommaInObject
            | State::AtKeyInObject
            | State::AfterKeyInObject => {
                self.state = State::AtCommaInObject;
                return Err(self.error(ErrorKind::UnexpectedToken("unexpected comma".into())));
            }
            _ => return Err(self.syntax("unexpected comma".into())),
        }
        Ok(())
    }

    fn process_whitespace(&mut self) {
        match self.state {
            State::AtValueInArray => self.state = State::AfterValueInArray,
            State::AtKeyInObject => self.state = State::AfterKeyInObject,
            State::AtValueInObject => self.state = State::AfterValueInObject,
            _ => {}
        }
    }

    fn process_end_of_stream(&mut self) -> Result<(), Error> {
        match self.state {
            State::AtStartOfDocument | State::AtEndOfDocument => {
                self.state = State::AtEndOfStream;
            }
            State::AtEndOfStream => {}
            _ => {
                return Err(self.syntax("unexpected end of document".into()));
            }
        }
        Ok(())
    }

    fn is_null(&self) -> bool {
        self.tokenizer.token_type() == JsonTokenType::Value && self.tokenizer.token() == b"null"
    }

    fn at_key(&self) -> bool {
        matches!(self.state, State::AtKeyInObject | State::AfterKeyInObject)
    }

    // The text of the current token when it can carry a scalar value.
    fn value_text(&self) -> Result<&str, Error> {
        match self.tokenizer.token_type() {
            JsonTokenType::String | JsonTokenType::Value => self.tokenizer.token_str(),
            _ => Err(self.misuse("current token is not a value")),
        }
    }

    fn numeric_text(&self) -> Result<&str, Error> {
        match self.tokenizer.token_type() {
            JsonTokenType::Value => self.tokenizer.token_str(),
            JsonTokenType::String if self.options.strings_as_values => self.tokenizer.token_str(),
            JsonTokenType::String => {
                Err(self.mismatch("current token is a string, not a value"))
            }
            _ => Err(self.misuse("current token is not a value")),
        }
    }

    /// True when the cursor is on a `null` value.
    #[must_use]
    pub fn read_null(&self) -> bool {
        self.is_null()
    }

    /// Reads the current value as a boolean.
    pub fn read_bool(&self) -> Result<bool, Error> {
        match self.numeric_text()? {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(self.mismatch("invalid boolean value")),
        }
    }

    fn read_signed(&self) -> Result<i64, Error> {
        let text = self.numeric_text()?;
        parse_integer(text, self.options.extended_integers)
            .ok_or_else(|| self.mismatch("invalid integer"))
    }

    fn read_unsigned(&self) -> Result<u64, Error> {
        let text = self.numeric_text()?;
        if text.starts_with('-') {
            return Err(
                self.mismatch("attempt to read a signed integer as an unsigned integer")
            );
        }
        parse_unsigned(text, self.options.extended_integers)
            .ok_or_else(|| self.mismatch("invalid integer"))
    }

    fn narrow<T: TryFrom<i64>>(&self, value: i64) -> Result<T, Error> {
        T::try_from(value).map_err(|_| {
            self.error(ErrorKind::NumericOverflow(
                "overflow error while reading integer value".into(),
            ))
        })
    }

    fn narrow_unsigned<T: TryFrom<u64>>(&self, value: u64) -> Result<T, Error> {
        T::try_from(value).map_err(|_| {
            self.error(ErrorKind::NumericOverflow(
                "overflow error while reading integer value".into(),
            ))
        })
    }

    /// Reads the current value as an `i8`.
    pub fn read_i8(&self) -> Result<i8, Error> {
        let value = self.read_signed()?;
        self.narrow(value)
    }

    /// Reads the current value as an `i16`.
    pub fn read_i16(&self) -> Result<i16, Error> {
        let value = self.read_signed()?;
        self.narrow(value)
    }

    /// Reads the current value as an `i32`.
    pub fn read_i32(&self) -> Result<i32, Error> {
        let value = self.read_signed()?;
        self.narrow(value)
    }

    /// Reads the current value as an `i64`.
    pub fn read_i64(&self) -> Result<i64, Error> {
        self.read_signed()
    }

    /// Reads the current value as a `u8`.
    pub fn read_u8(&self) -> Result<u8, Error> {
        let value = self.read_unsigned()?;
        self.narrow_unsigned(value)
    }

    /// Reads the current value as a `u16`.
    pub fn read_u16(&self) -> Result<u16, Error> {
        let value = self.read_unsigned()?;
        self.narrow_unsigned(value)
    }

    /// Reads the current value as a `u32`.
    pub fn read_u32(&self) -> Result<u32, Error> {
        let value = self.read_unsigned()?;
        self.narrow_unsigned(value)
    }

    /// Reads the current value as a `u64`.
    pub fn read_u64(&self) -> Result<u64, Error> {
        self.read_unsigned()
    }

    fn check_float_extensions(&self, text: &str) -> Result<(), Error> {
        match text {
            "Infinity" | "+Infinity" | "-Infinity" | "NaN" => {
                if self.options.extended_floats {
                    Ok(())
                } else {
                    Err(self.mismatch("invalid floating point value"))
                }
            }
            "null" => Err(self.mismatch("invalid floating point value")),
            _ => Ok(()),
        }
    }

    /// Reads the current value as an `f32`.
    pub fn read_f32(&self) -> Result<f32, Error> {
        let text = self.numeric_text()?;
        self.check_float_extensions(text)?;
        parse_f32(text).ok_or_else(|| self.mismatch("invalid floating point value"))
    }

    /// Reads the current value as an `f64`.
    pub fn read_f64(&self) -> Result<f64, Error> {
        let text = self.numeric_text()?;
        self.check_float_extensions(text)?;
        parse_f64(text).ok_or_else(|| self.mismatch("invalid floating point value"))
    }

    /// Reads the current value as a string, decoding escape sequences.
    pub fn read_string(&self) -> Result<String, Error> {
        match self.tokenizer.token_type() {
            JsonTokenType::String => {
                let position = self.tokenizer.position();
                unescape(self.tokenizer.token_str()?)
                    .map_err(|error| error.with_position(position))
            }
            JsonTokenType::Value if self.options.values_as_strings || self.at_key() => {
                Ok(self.tokenizer.token_str()?.to_owned())
            }
            JsonTokenType::Value => Err(self.mismatch("current token is not a string")),
            _ => Err(self.misuse("current token is not a string")),
        }
    }

    /// Reads the current value as a single character.
    pub fn read_char(&self) -> Result<char, Error> {
        let text = self.value_text()?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(self.mismatch("current token is not a single character")),
        }
    }

    /// Decodes a Base64 string value into bytes.
    pub fn read_binary(&self) -> Result<Vec<u8>, Error> {
        self.read_base64()
    }

    /// Decodes a Base64 string value into bytes.
    pub fn read_base64(&self) -> Result<Vec<u8>, Error> {
        if self.tokenizer.token_type() != JsonTokenType::String {
            return Err(self.mismatch("current token is not a string"));
        }
        let position = self.tokenizer.position();
        from_base64(self.tokenizer.token()).map_err(|error| error.with_position(position))
    }

    fn has_base_prefix(&self) -> bool {
        let token = self.tokenizer.token();
        let unsigned = match token.first() {
            Some(b'-' | b'+') => &token[1..],
            _ => token,
        };
        unsigned.len() > 1
            && unsigned[0] == b'0'
            && matches!(unsigned[1] | 0x20, b'b' | b'o' | b'x')
    }

    /// The coarse type of the current value.
    ///
    /// With `analyze_strings`, string contents are classified as well and
    /// the narrower type is reported when one applies.
    pub fn value_type(&self, analyze_strings: bool) -> Result<ValueType, Error> {
        match self.tokenizer.token_type() {
            JsonTokenType::StartArray => Ok(ValueType::Array),
            JsonTokenType::StartObject => Ok(ValueType::Object),
            JsonTokenType::String => {
                if analyze_strings {
                    let value_type = get_value_type(self.tokenizer.token_str()?);
                    if value_type != ValueType::Invalid {
                        return Ok(value_type);
                    }
                }
                Ok(ValueType::String)
            }
            JsonTokenType::Value => {
                let value_type = get_value_type(self.tokenizer.token_str()?);
                if value_type == ValueType::Invalid
                    || (value_type == ValueType::Integer
                        && self.has_base_prefix()
                        && !self.options.extended_integers)
                {
                    return Err(self.error(ErrorKind::UnexpectedToken("invalid value".into())));
                }
                Ok(value_type)
            }
            _ => Err(self.misuse("current token has no value type")),
        }
    }

    /// The fine-grained type of the current value.
    pub fn detailed_value_type(
        &self,
        analyze_strings: bool,
    ) -> Result<DetailedValueType, Error> {
        match self.tokenizer.token_type() {
            JsonTokenType::StartArray => Ok(DetailedValueType::Array),
            JsonTokenType::StartObject => Ok(DetailedValueType::Object),
            JsonTokenType::String => {
                if analyze_strings {
                    let value_type = get_detailed_value_type(self.tokenizer.token_str()?);
                    if value_type != DetailedValueType::Invalid {
                        return Ok(value_type);
                    }
                }
                Ok(DetailedValueType::String)
            }
            JsonTokenType::Value => {
                let value_type = get_detailed_value_type(self.tokenizer.token_str()?);
                if value_type == DetailedValueType::Invalid
                    || (self.has_base_prefix() && !self.options.extended_integers)
                {
                    return Err(self.error(ErrorKind::UnexpectedToken("invalid value".into())));
                }
                Ok(value_type)
            }
            _ => Err(self.misuse("current token has no value type")),
        }
    }

    /// Materializes the remainder of the current value as a tree.
    pub fn read_item(&mut self) -> Result<JsonItem, Error> {
        if matches!(self.state, State::Initial | State::AtStartOfDocument)
            && !self.next_value()?
        {
            return Err(self.misuse("no key or value"));
        }
        match self.state {
            State::AtValueOfDocument
            | State::AtValueInArray
            | State::AtValueInObject
            | State::AtKeyInObject
            | State::AfterKeyInObject => self.read_item_inner(),
            _ => Err(self.misuse("no key or value")),
        }
    }

    fn read_item_inner(&mut self) -> Result<JsonItem, Error> {
        match self.tokenizer.token_type() {
            JsonTokenType::StartObject => self.read_object_item(),
            JsonTokenType::StartArray => self.read_array_item(),
            JsonTokenType::String => {
                let position = self.tokenizer.position();
                let text = unescape(self.tokenizer.token_str()?)
                    .map_err(|error| error.with_position(position))?;
                Ok(JsonItem::from_value(JsonValue::text(text)))
            }
            JsonTokenType::Value => Ok(JsonItem::from_value(JsonValue::literal(
                self.tokenizer.token_string()?,
            ))),
            _ => Err(self.misuse("no key or value")),
        }
    }

    fn read_array_item(&mut self) -> Result<JsonItem, Error> {
        self.enter()?;
        let mut values = Vec::new();
        while self.next_value()? {
            values.push(self.read_item_inner()?);
        }
        self.leave()?;
        Ok(JsonItem::from_array(ArrayItem::new(values)))
    }

    fn read_object_item(&mut self) -> Result<JsonItem, Error> {
        self.enter()?;
        let mut object = ObjectItem::new();
        while self.next_key()? {
            let key = self.read_string()?;
            if !self.next_value()? {
                return Err(
                    self.error(ErrorKind::UnexpectedToken(format!("key without value: {key}")))
                );
            }
            object.insert(key, self.read_item_inner()?);
        }
        self.leave()?;
        Ok(JsonItem::from_object(object))
    }
}
