//! The scope readers of the UBJSON reader.
//!
//! One scope reader per container context, dispatched as a closed enum by
//! the reader's scope stack. Every reader drives the same small state
//! machine: `AtStart → (AtKey →) AtValue → AfterValue → ... → AtEnd`, and a
//! `next_value` issued while a value is current first skips that value.

use crate::error::{Error, ErrorKind};
use crate::ubjson::token::UbjsonTokenType;
use crate::ubjson::tokenizer::UbjsonTokenizer;

/// The shared per-scope state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReaderState {
    Initial,
    AtStart,
    AtKey,
    AtValue,
    AfterValue,
    AtEnd,
    AtEndOfFile,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ScopeState {
    pub state: ReaderState,
    pub value_count: usize,
    pub value_index: usize,
    pub value_type: UbjsonTokenType,
}

impl ScopeState {
    pub fn new(state: ReaderState) -> Self {
        ScopeState {
            state,
            value_count: 0,
            value_index: 0,
            value_type: UbjsonTokenType::Unknown,
        }
    }

    /// State of an optimized scope, primed with the tokenizer's declared
    /// count and element type.
    pub fn optimized(tokenizer: &UbjsonTokenizer) -> Self {
        ScopeState {
            state: ReaderState::AtStart,
            value_count: tokenizer.content_size(),
            value_index: 0,
            value_type: tokenizer.content_type(),
        }
    }
}

impl Default for ScopeState {
    fn default() -> Self {
        ScopeState::new(ReaderState::Initial)
    }
}

pub(crate) fn unexpected_token(tokenizer: &UbjsonTokenizer) -> Error {
    Error::new(
        ErrorKind::UnexpectedToken(format!(
            "unexpected token: {:?}",
            tokenizer.token_type()
        )),
        tokenizer.error_position(),
    )
    .with_file_name(tokenizer.file_name())
}

pub(crate) fn unexpected_end(tokenizer: &UbjsonTokenizer) -> Error {
    Error::new(
        ErrorKind::TruncatedInput("unexpected end of document".into()),
        tokenizer.error_position(),
    )
    .with_file_name(tokenizer.file_name())
}

fn misuse(tokenizer: &UbjsonTokenizer, message: &str) -> Error {
    Error::new(ErrorKind::Misuse(message.into()), tokenizer.error_position())
        .with_file_name(tokenizer.file_name())
}

/// Reads the next key of an object: true at a key, false at the end of the
/// object.
fn read_key(tokenizer: &mut UbjsonTokenizer) -> Result<bool, Error> {
    if !tokenizer.next_key()? {
        return Err(unexpected_end(tokenizer));
    }
    match tokenizer.token_type() {
        UbjsonTokenType::String => Ok(true),
        UbjsonTokenType::EndObject => Ok(false),
        _ => Err(unexpected_token(tokenizer)),
    }
}

/// Reads the next value token: true at a value, false at `end_token`.
fn read_start_of_value(
    tokenizer: &mut UbjsonTokenizer,
    end_token: Option<UbjsonTokenType>,
) -> Result<bool, Error> {
    if !tokenizer.next()? {
        return Err(unexpected_end(tokenizer));
    }
    if tokenizer.token_type().is_value() {
        return Ok(true);
    }
    if end_token == Some(tokenizer.token_type()) {
        return Ok(false);
    }
    Err(unexpected_token(tokenizer))
}

/// Reads the next value of an optimized container, marker-less when the
/// element type was declared.
fn read_start_of_optimized_value(
    tokenizer: &mut UbjsonTokenizer,
    value_type: UbjsonTokenType,
) -> Result<bool, Error> {
    if value_type != UbjsonTokenType::Unknown {
        return tokenizer.next_typed(value_type);
    }
    if tokenizer.next()? {
        if tokenizer.token_type().is_value() {
            return Ok(true);
        }
        return Err(unexpected_token(tokenizer));
    }
    Ok(false)
}

fn skip_keys(tokenizer: &mut UbjsonTokenizer) -> Result<(), Error> {
    let count = tokenizer.content_size();
    for _ in 0..count {
        if !tokenizer.skip_typed(UbjsonTokenType::String)? {
            return Err(unexpected_end(tokenizer));
        }
    }
    Ok(())
}

fn skip_keys_and_trivial_values(tokenizer: &mut UbjsonTokenizer) -> Result<(), Error> {
    let count = tokenizer.content_size();
    let content_type = tokenizer.content_type();
    for _ in 0..count {
        if !tokenizer.skip_typed(UbjsonTokenType::String)? || !tokenizer.skip_typed(content_type)?
        {
            return Err(unexpected_end(tokenizer));
        }
    }
    Ok(())
}

fn skip_keys_and_complex_values(tokenizer: &mut UbjsonTokenizer) -> Result<(), Error> {
    let count = tokenizer.content_size();
    let content_type = tokenizer.content_type();
    for _ in 0..count {
        if !tokenizer.skip_typed(UbjsonTokenType::String)? || !tokenizer.skip_typed(content_type)?
        {
            return Err(unexpected_end(tokenizer));
        }
        skip_value(tokenizer)?;
    }
    Ok(())
}

fn skip_optimized_object(tokenizer: &mut UbjsonTokenizer) -> Result<(), Error> {
    if !tokenizer.content_type().carries_value() {
        skip_keys(tokenizer)
    } else if tokenizer.content_type().is_trivial() {
        skip_keys_and_trivial_values(tokenizer)
    } else {
        skip_keys_and_complex_values(tokenizer)
    }
}

fn skip_trivial_values(tokenizer: &mut UbjsonTokenizer) -> Result<(), Error> {
    let count = tokenizer.content_size();
    let content_type = tokenizer.content_type();
    for _ in 0..count {
        if !tokenizer.skip_typed(content_type)? {
            return Err(unexpected_end(tokenizer));
        }
    }
    Ok(())
}

fn skip_complex_values(tokenizer: &mut UbjsonTokenizer) -> Result<(), Error> {
    let count = tokenizer.content_size();
    let content_type = tokenizer.content_type();
    for _ in 0..count {
        if !tokenizer.skip_typed(content_type)? {
            return Err(unexpected_end(tokenizer));
        }
        skip_value(tokenizer)?;
    }
    Ok(())
}

fn skip_optimized_array(tokenizer: &mut UbjsonTokenizer) -> Result<(), Error> {
    if !tokenizer.content_type().carries_value() {
        return Ok(());
    }
    if tokenizer.content_type().is_trivial() {
        skip_trivial_values(tokenizer)
    } else {
        skip_complex_values(tokenizer)
    }
}

fn skip_object(tokenizer: &mut UbjsonTokenizer) -> Result<(), Error> {
    while tokenizer.skip_typed(UbjsonTokenType::ObjectKey)? {
        if tokenizer.token_type() == UbjsonTokenType::EndObject {
            return Ok(());
        }
        tokenizer.skip()?;
        skip_value(tokenizer)?;
    }
    Ok(())
}

fn skip_array(tokenizer: &mut UbjsonTokenizer) -> Result<(), Error> {
    while tokenizer.skip()? {
        if tokenizer.token_type() == UbjsonTokenType::EndArray {
            return Ok(());
        }
        skip_value(tokenizer)?;
    }
    Ok(())
}

/// Advances past the remainder of the current token's value, recursing
/// into plain containers and using the declared counts of optimized ones.
pub(crate) fn skip_value(tokenizer: &mut UbjsonTokenizer) -> Result<(), Error> {
    match tokenizer.token_type() {
        UbjsonTokenType::StartObject => skip_object(tokenizer),
        UbjsonTokenType::StartArray => skip_array(tokenizer),
        UbjsonTokenType::StartOptimizedObject => skip_optimized_object(tokenizer),
        UbjsonTokenType::StartOptimizedArray => skip_optimized_array(tokenizer),
        UbjsonTokenType::NoOp | UbjsonTokenType::EndArray | UbjsonTokenType::EndObject => {
            Err(unexpected_token(tokenizer))
        }
        _ => Ok(()),
    }
}

/// The five container contexts a scope frame can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScopeReader {
    Document,
    Array,
    Object,
    OptimizedArray,
    OptimizedObject,
}

impl ScopeReader {
    /// The single-character marker of this scope.
    pub fn marker(self) -> Option<char> {
        match self {
            ScopeReader::Document => None,
            ScopeReader::Array | ScopeReader::OptimizedArray => Some('['),
            ScopeReader::Object | ScopeReader::OptimizedObject => Some('{'),
        }
    }

    pub fn next_key(
        self,
        tokenizer: &mut UbjsonTokenizer,
        state: &mut ScopeState,
    ) -> Result<bool, Error> {
        match self {
            ScopeReader::Document => Err(misuse(
                tokenizer,
                "next_key() can only be called inside an object",
            )),
            ScopeReader::Array | ScopeReader::OptimizedArray => Err(misuse(
                tokenizer,
                "next_key() can't be called inside an array",
            )),
            ScopeReader::Object => object_next_key(tokenizer, state),
            ScopeReader::OptimizedObject => optimized_object_next_key(tokenizer, state),
        }
    }

    pub fn next_value(
        self,
        tokenizer: &mut UbjsonTokenizer,
        state: &mut ScopeState,
    ) -> Result<bool, Error> {
        match self {
            ScopeReader::Document => document_next_value(tokenizer, state),
            ScopeReader::Array => array_next_value(tokenizer, state),
            ScopeReader::Object => object_next_value(tokenizer, state),
            ScopeReader::OptimizedArray => optimized_array_next_value(tokenizer, state),
            ScopeReader::OptimizedObject => optimized_object_next_value(tokenizer, state),
        }
    }

    pub fn next_document(
        self,
        tokenizer: &mut UbjsonTokenizer,
        state: &mut ScopeState,
    ) -> Result<bool, Error> {
        match self {
            ScopeReader::Document => document_next_document(tokenizer, state),
            ScopeReader::Array | ScopeReader::OptimizedArray => Err(misuse(
                tokenizer,
                "next_document() can't be called inside an array",
            )),
            ScopeReader::Object | ScopeReader::OptimizedObject => Err(misuse(
                tokenizer,
                "next_document() can't be called inside an object",
            )),
        }
    }
}

fn document_next_value(
    tokenizer: &mut UbjsonTokenizer,
    state: &mut ScopeState,
) -> Result<bool, Error> {
    match state.state {
        ReaderState::Initial => {
            if !tokenizer.next()? {
                state.state = ReaderState::AtEndOfFile;
                return Ok(false);
            }
            if !tokenizer.token_type().is_value() {
                return Err(unexpected_token(tokenizer));
            }
            state.state = ReaderState::AtValue;
            Ok(true)
        }
        ReaderState::AtStart => {
            state.state = ReaderState::AtValue;
            Ok(true)
        }
        ReaderState::AtValue => {
            skip_value(tokenizer)?;
            if !tokenizer.next()? {
                state.state = ReaderState::AtEndOfFile;
                return Ok(false);
            }
            state.state = ReaderState::AtEnd;
            Ok(false)
        }
        _ => Ok(false),
    }
}

fn document_next_document(
    tokenizer: &mut UbjsonTokenizer,
    state: &mut ScopeState,
) -> Result<bool, Error> {
    match state.state {
        ReaderState::Initial => {
            if !tokenizer.next()? {
                state.state = ReaderState::AtEndOfFile;
                return Ok(false);
            }
            state.state = ReaderState::AtStart;
            Ok(true)
        }
        ReaderState::AtEndOfFile => Ok(false),
        ReaderState::AtStart | ReaderState::AtValue => {
            skip_value(tokenizer)?;
            if !tokenizer.next()? {
                state.state = ReaderState::AtEndOfFile;
                return Ok(false);
            }
            state.state = ReaderState::AtStart;
            Ok(true)
        }
        ReaderState::AfterValue => {
            if !tokenizer.next()? {
                state.state = ReaderState::AtEndOfFile;
                return Ok(false);
            }
            state.state = ReaderState::AtStart;
            Ok(true)
        }
        ReaderState::AtEnd => {
            state.state = ReaderState::AtStart;
            Ok(true)
        }
        ReaderState::AtKey => Err(unexpected_token(tokenizer)),
    }
}

fn array_next_value(
    tokenizer: &mut UbjsonTokenizer,
    state: &mut ScopeState,
) -> Result<bool, Error> {
    match state.state {
        ReaderState::AtValue => {
            skip_value(tokenizer)?;
        }
        ReaderState::AtStart | ReaderState::AfterValue => {}
        _ => return Ok(false),
    }
    if read_start_of_value(tokenizer, Some(UbjsonTokenType::EndArray))? {
        state.state = ReaderState::AtValue;
        Ok(true)
    } else {
        state.state = ReaderState::AtEnd;
        Ok(false)
    }
}

fn object_next_key(
    tokenizer: &mut UbjsonTokenizer,
    state: &mut ScopeState,
) -> Result<bool, Error> {
    let mut current = state.state;
    if current == ReaderState::AtKey {
        if !tokenizer.next()? {
            return Err(unexpected_end(tokenizer));
        }
        current = ReaderState::AtValue;
    }
    if current == ReaderState::AtValue {
        skip_value(tokenizer)?;
        current = ReaderState::AfterValue;
    }
    match current {
        ReaderState::AtStart | ReaderState::AfterValue => {
            if read_key(tokenizer)? {
                state.state = ReaderState::AtKey;
                Ok(true)
            } else {
                state.state = ReaderState::AtEnd;
                Ok(false)
            }
        }
        _ => Ok(false),
    }
}

fn object_next_value(
    tokenizer: &mut UbjsonTokenizer,
    state: &mut ScopeState,
) -> Result<bool, Error> {
    let mut current = state.state;
    if current == ReaderState::AtValue {
        skip_value(tokenizer)?;
        current = ReaderState::AfterValue;
    }
    if matches!(current, ReaderState::AtStart | ReaderState::AfterValue) {
        if !read_key(tokenizer)? {
            state.state = ReaderState::AtEnd;
            return Ok(false);
        }
        current = ReaderState::AtKey;
    }
    match current {
        ReaderState::AtKey => {
            if read_start_of_value(tokenizer, None)? {
                state.state = ReaderState::AtValue;
                Ok(true)
            } else {
                Err(unexpected_end(tokenizer))
            }
        }
        _ => Ok(false),
    }
}

fn optimized_array_next_value(
    tokenizer: &mut UbjsonTokenizer,
    state: &mut ScopeState,
) -> Result<bool, Error> {
    if state.state == ReaderState::AtValue {
        skip_value(tokenizer)?;
    }
    if state.value_index < state.value_count {
        state.value_index += 1;
        if state.value_type != UbjsonTokenType::Unknown {
            if tokenizer.next_typed(state.value_type)? {
                state.state = ReaderState::AtValue;
                return Ok(true);
            }
            return Err(unexpected_end(tokenizer));
        }
        if tokenizer.next()? {
            if tokenizer.token_type().is_value() {
                state.state = ReaderState::AtValue;
                return Ok(true);
            }
            return Err(unexpected_token(tokenizer));
        }
        return Err(unexpected_end(tokenizer));
    }
    state.state = ReaderState::AtEnd;
    Ok(false)
}

fn optimized_object_next_key(
    tokenizer: &mut UbjsonTokenizer,
    state: &mut ScopeState,
) -> Result<bool, Error> {
    let mut current = state.state;
    if current == ReaderState::AtKey {
        if !read_start_of_optimized_value(tokenizer, state.value_type)? {
            return Err(unexpected_end(tokenizer));
        }
        current = ReaderState::AtValue;
    }
    if current == ReaderState::AtValue {
        skip_value(tokenizer)?;
        current = ReaderState::AfterValue;
    }
    match current {
        ReaderState::AfterValue | ReaderState::AtStart => {
            if state.value_index == state.value_count {
                state.state = ReaderState::AtEnd;
                return Ok(false);
            }
            state.value_index += 1;
            if read_key(tokenizer)? {
                state.state = ReaderState::AtKey;
                Ok(true)
            } else {
                Err(unexpected_end(tokenizer))
            }
        }
        _ => Ok(false),
    }
}

fn optimized_object_next_value(
    tokenizer: &mut UbjsonTokenizer,
    state: &mut ScopeState,
) -> Result<bool, Error> {
    let mut current = state.state;
    if current == ReaderState::AtValue {
        skip_value(tokenizer)?;
        current = ReaderState::AfterValue;
    }
    if matches!(current, ReaderState::AfterValue | ReaderState::AtStart) {
        if state.value_index == state.value_count {
            state.state = ReaderState::AtEnd;
            return Ok(false);
        }
        state.value_index += 1;
        if !read_key(tokenizer)? {
            return Err(unexpected_end(tokenizer));
        }
        current = ReaderState::AtKey;
    }
    match current {
        ReaderState::AtKey => {
            if read_start_of_optimized_value(tokenizer, state.value_type)? {
                state.state = ReaderState::AtValue;
                Ok(true)
            } else {
                Err(unexpected_end(tokenizer))
            }
        }
        _ => Ok(false),
    }
}
