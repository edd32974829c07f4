//! The materializing tree.
//!
//! [`JsonItem`] is a tagged value: a shared array node, a shared object
//! node, or a scalar leaf. Container nodes are reference-counted so
//! subtrees can be shared between independently owned trees; every string
//! is owned, so items outlive the cursor that produced them.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::base64::from_base64;
use crate::error::{Error, ErrorKind};
use crate::scalar::{
    get_detailed_value_type, get_value_type, parse_f64, parse_integer, parse_unsigned,
};
use crate::value_type::{DetailedValueType, ValueType};

fn mismatch(message: String) -> Error {
    Error::from(ErrorKind::TypeMismatch(message))
}

fn misuse(message: String) -> Error {
    Error::from(ErrorKind::Misuse(message))
}

/// A scalar leaf of the tree.
///
/// Values built from JSON keep their textual form (strings already
/// unescaped); values built from UBJSON are stored decoded, with
/// non-expanded optimized byte arrays kept as raw bytes.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct JsonValue {
    repr: Repr,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
enum Repr {
    /// An unquoted JSON literal: number, keyword or identifier.
    Literal(String),
    /// A string value from either dialect.
    Text(String),
    Null,
    Boolean(bool),
    Integer(i64),
    Char(char),
    Float(f64),
    HighPrecision(String),
    Binary(Vec<u8>),
}

impl JsonValue {
    pub(crate) fn literal(text: String) -> Self {
        JsonValue {
            repr: Repr::Literal(text),
        }
    }

    pub(crate) fn text(text: String) -> Self {
        JsonValue {
            repr: Repr::Text(text),
        }
    }

    pub(crate) fn null() -> Self {
        JsonValue { repr: Repr::Null }
    }

    pub(crate) fn boolean(value: bool) -> Self {
        JsonValue {
            repr: Repr::Boolean(value),
        }
    }

    pub(crate) fn integer(value: i64) -> Self {
        JsonValue {
            repr: Repr::Integer(value),
        }
    }

    pub(crate) fn character(value: char) -> Self {
        JsonValue {
            repr: Repr::Char(value),
        }
    }

    pub(crate) fn float(value: f64) -> Self {
        JsonValue {
            repr: Repr::Float(value),
        }
    }

    pub(crate) fn high_precision(text: String) -> Self {
        JsonValue {
            repr: Repr::HighPrecision(text),
        }
    }

    pub(crate) fn binary(bytes: Vec<u8>) -> Self {
        JsonValue {
            repr: Repr::Binary(bytes),
        }
    }

    /// The coarse type of this value.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match &self.repr {
            Repr::Literal(text) => get_value_type(text),
            Repr::Text(_) | Repr::Binary(_) => ValueType::String,
            Repr::Null => ValueType::Null,
            Repr::Boolean(_) => ValueType::Boolean,
            Repr::Integer(_) | Repr::Char(_) => ValueType::Integer,
            Repr::Float(_) | Repr::HighPrecision(_) => ValueType::Float,
        }
    }

    /// The fine-grained type of this value.
    #[must_use]
    pub fn detailed_value_type(&self) -> DetailedValueType {
        match &self.repr {
            Repr::Literal(text) => get_detailed_value_type(text),
            Repr::Text(_) | Repr::Binary(_) => DetailedValueType::String,
            Repr::Null => DetailedValueType::Null,
            Repr::Boolean(_) => DetailedValueType::Boolean,
            Repr::Integer(value) => get_detailed_value_type(&value.to_string()),
            Repr::Char(_) => DetailedValueType::Char,
            Repr::Float(_) => DetailedValueType::Float64,
            Repr::HighPrecision(_) => DetailedValueType::HighPrecisionNumber,
        }
    }

    fn signed(&self) -> Result<i64, Error> {
        match &self.repr {
            Repr::Literal(text) | Repr::Text(text) | Repr::HighPrecision(text) => {
                parse_integer(text, true).ok_or_else(|| mismatch("invalid integer".into()))
            }
            Repr::Integer(value) => Ok(*value),
            Repr::Char(c) => Ok(i64::from(u32::from(*c))),
            _ => Err(mismatch("value is not an integer".into())),
        }
    }

    fn unsigned(&self) -> Result<u64, Error> {
        match &self.repr {
            Repr::Literal(text) | Repr::Text(text) | Repr::HighPrecision(text) => {
                parse_unsigned(text, true).ok_or_else(|| mismatch("invalid integer".into()))
            }
            Repr::Integer(value) => u64::try_from(*value)
                .map_err(|_| mismatch("negative value read as unsigned".into())),
            Repr::Char(c) => Ok(u64::from(u32::from(*c))),
            _ => Err(mismatch("value is not an integer".into())),
        }
    }

    fn as_float(&self) -> Result<f64, Error> {
        match &self.repr {
            Repr::Literal(text) | Repr::Text(text) | Repr::HighPrecision(text) => {
                parse_f64(text).ok_or_else(|| mismatch("invalid floating point value".into()))
            }
            #[allow(clippy::cast_precision_loss)]
            Repr::Integer(value) => Ok(*value as f64),
            Repr::Float(value) => Ok(*value),
            _ => Err(mismatch("value is not a number".into())),
        }
    }

    fn string(&self) -> Result<String, Error> {
        match &self.repr {
            Repr::Literal(text) | Repr::Text(text) | Repr::HighPrecision(text) => {
                Ok(text.clone())
            }
            Repr::Char(c) => Ok(c.to_string()),
            _ => Err(mismatch("value is not a string".into())),
        }
    }

    fn boolean_value(&self) -> Result<bool, Error> {
        match &self.repr {
            Repr::Literal(text) | Repr::Text(text) => match text.as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(mismatch("value is not a boolean".into())),
            },
            Repr::Boolean(value) => Ok(*value),
            _ => Err(mismatch("value is not a boolean".into())),
        }
    }

    fn char_value(&self) -> Result<char, Error> {
        match &self.repr {
            Repr::Literal(text) | Repr::Text(text) => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(mismatch("value is not a single character".into())),
                }
            }
            Repr::Char(c) => Ok(*c),
            Repr::Integer(value) => u8::try_from(*value)
                .map(char::from)
                .map_err(|_| mismatch("value is not a character".into())),
            _ => Err(mismatch("value is not a character".into())),
        }
    }

    /// The binary content: a non-expanded byte-array payload, or the
    /// Base64 decoding of a string value.
    pub fn get_binary(&self) -> Result<Vec<u8>, Error> {
        match &self.repr {
            Repr::Binary(bytes) => Ok(bytes.clone()),
            Repr::Text(text) => from_base64(text.as_bytes()),
            _ => Err(mismatch("value has no binary content".into())),
        }
    }
}

/// Conversion from a scalar leaf, used by [`JsonItem::get`].
pub trait FromJsonValue: Sized {
    /// Decodes `value` into this type.
    fn from_json_value(value: &JsonValue) -> Result<Self, Error>;
}

macro_rules! from_signed {
    ($($type:ty),*) => {$(
        impl FromJsonValue for $type {
            fn from_json_value(value: &JsonValue) -> Result<Self, Error> {
                let wide = value.signed()?;
                <$type>::try_from(wide).map_err(|_| {
                    Error::from(ErrorKind::NumericOverflow(
                        "overflow error while reading integer value".into(),
                    ))
                })
            }
        }
    )*};
}

macro_rules! from_unsigned {
    ($($type:ty),*) => {$(
        impl FromJsonValue for $type {
            fn from_json_value(value: &JsonValue) -> Result<Self, Error> {
                let wide = value.unsigned()?;
                <$type>::try_from(wide).map_err(|_| {
                    Error::from(ErrorKind::NumericOverflow(
                        "overflow error while reading integer value".into(),
                    ))
                })
            }
        }
    )*};
}

from_signed!(i8, i16, i32, i64);
from_unsigned!(u8, u16, u32, u64);

impl FromJsonValue for f64 {
    fn from_json_value(value: &JsonValue) -> Result<Self, Error> {
        value.as_float()
    }
}

impl FromJsonValue for f32 {
    fn from_json_value(value: &JsonValue) -> Result<Self, Error> {
        let wide = value.as_float()?;
        #[allow(clippy::cast_possible_truncation)]
        let narrowed = wide as f32;
        Ok(narrowed)
    }
}

impl FromJsonValue for bool {
    fn from_json_value(value: &JsonValue) -> Result<Self, Error> {
        value.boolean_value()
    }
}

impl FromJsonValue for char {
    fn from_json_value(value: &JsonValue) -> Result<Self, Error> {
        value.char_value()
    }
}

impl FromJsonValue for String {
    fn from_json_value(value: &JsonValue) -> Result<Self, Error> {
        value.string()
    }
}

/// A sequence of items.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArrayItem {
    values: Vec<JsonItem>,
}

impl ArrayItem {
    pub(crate) fn new(values: Vec<JsonItem>) -> Self {
        ArrayItem { values }
    }

    /// The elements in document order.
    #[must_use]
    pub fn values(&self) -> &[JsonItem] {
        &self.values
    }

    /// The number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when there are no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// An insertion-ordered mapping from keys to items.
///
/// A duplicated key keeps its first position; the later value wins.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectItem {
    values: IndexMap<String, JsonItem>,
}

impl ObjectItem {
    pub(crate) fn new() -> Self {
        ObjectItem {
            values: IndexMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, key: String, value: JsonItem) {
        self.values.insert(key, value);
    }

    /// The members in insertion order.
    #[must_use]
    pub fn values(&self) -> &IndexMap<String, JsonItem> {
        &self.values
    }

    /// Looks up a member by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&JsonItem> {
        self.values.get(key)
    }

    /// The number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when there are no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A materialized value: an array node, an object node or a scalar leaf.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum JsonItem {
    /// An array node, shared between trees.
    Array(Arc<ArrayItem>),
    /// An object node, shared between trees.
    Object(Arc<ObjectItem>),
    /// A scalar leaf.
    Value(JsonValue),
}

impl JsonItem {
    pub(crate) fn from_array(array: ArrayItem) -> Self {
        JsonItem::Array(Arc::new(array))
    }

    pub(crate) fn from_object(object: ObjectItem) -> Self {
        JsonItem::Object(Arc::new(object))
    }

    pub(crate) fn from_value(value: JsonValue) -> Self {
        JsonItem::Value(value)
    }

    /// True when this item is an array node.
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, JsonItem::Array(_))
    }

    /// True when this item is an object node.
    #[must_use]
    pub fn is_object(&self) -> bool {
        matches!(self, JsonItem::Object(_))
    }

    /// True when this item is a scalar leaf.
    #[must_use]
    pub fn is_value(&self) -> bool {
        matches!(self, JsonItem::Value(_))
    }

    /// The array node, failing on any other kind of item.
    pub fn array(&self) -> Result<&ArrayItem, Error> {
        match self {
            JsonItem::Array(array) => Ok(array),
            _ => Err(misuse("item isn't an array".into())),
        }
    }

    /// The object node, failing on any other kind of item.
    pub fn object(&self) -> Result<&ObjectItem, Error> {
        match self {
            JsonItem::Object(object) => Ok(object),
            _ => Err(misuse("item isn't an object".into())),
        }
    }

    /// The scalar leaf, failing on any other kind of item.
    pub fn value(&self) -> Result<&JsonValue, Error> {
        match self {
            JsonItem::Value(value) => Ok(value),
            _ => Err(misuse("item isn't a value".into())),
        }
    }

    /// The element at `index` of an array item.
    pub fn at(&self, index: usize) -> Result<&JsonItem, Error> {
        let array = self.array()?;
        array
            .values()
            .get(index)
            .ok_or_else(|| misuse(format!("index is too great: {index}")))
    }

    /// The member named `key` of an object item.
    pub fn at_key(&self, key: &str) -> Result<&JsonItem, Error> {
        let object = self.object()?;
        object
            .get(key)
            .ok_or_else(|| misuse(format!("no such key: {key}")))
    }

    /// Non-failing member lookup; `None` when this is not an object or the
    /// key is absent.
    #[must_use]
    pub fn find(&self, key: &str) -> Option<&JsonItem> {
        match self {
            JsonItem::Object(object) => object.get(key),
            _ => None,
        }
    }

    /// Decodes the scalar leaf as `T`.
    pub fn get<T: FromJsonValue>(&self) -> Result<T, Error> {
        T::from_json_value(self.value()?)
    }

    /// The binary content of the scalar leaf.
    pub fn get_binary(&self) -> Result<Vec<u8>, Error> {
        self.value()?.get_binary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_leaves_decode_on_demand() {
        let item = JsonItem::from_value(JsonValue::literal("1234".into()));
        assert!(item.is_value());
        assert_eq!(item.get::<i32>().unwrap(), 1234);
        assert_eq!(item.get::<String>().unwrap(), "1234");
        assert_eq!(item.value().unwrap().value_type(), ValueType::Integer);
    }

    #[test]
    fn narrowing_checks_round_trips() {
        let item = JsonItem::from_value(JsonValue::integer(300));
        assert_eq!(item.get::<i16>().unwrap(), 300);
        assert!(matches!(
            item.get::<i8>().unwrap_err().kind(),
            ErrorKind::NumericOverflow(_)
        ));
        assert!(matches!(
            JsonItem::from_value(JsonValue::integer(-1))
                .get::<u32>()
                .unwrap_err()
                .kind(),
            ErrorKind::TypeMismatch(_)
        ));
    }

    #[test]
    fn object_items_keep_insertion_order() {
        let mut object = ObjectItem::new();
        object.insert("b".into(), JsonItem::from_value(JsonValue::integer(1)));
        object.insert("a".into(), JsonItem::from_value(JsonValue::integer(2)));
        object.insert("b".into(), JsonItem::from_value(JsonValue::integer(3)));
        let keys: Vec<_> = object.values().keys().cloned().collect();
        assert_eq!(keys, ["b", "a"]);
        let item = JsonItem::from_object(object);
        assert_eq!(item.at_key("b").unwrap().get::<i32>().unwrap(), 3);
        assert!(item.at_key("c").is_err());
        assert!(item.find("a").is_some());
        assert!(item.find("c").is_none());
    }

    #[test]
    fn index_errors() {
        let item = JsonItem::from_array(ArrayItem::new(vec![JsonItem::from_value(
            JsonValue::null(),
        )]));
        assert!(item.at(0).is_ok());
        assert!(item.at(1).is_err());
        assert!(item.at_key("x").is_err());
    }

    #[test]
    fn binary_leaves() {
        let item = JsonItem::from_value(JsonValue::binary(b"ABCD".to_vec()));
        assert_eq!(item.get_binary().unwrap(), b"ABCD");
        let encoded = JsonItem::from_value(JsonValue::text("Zm9v".into()));
        assert_eq!(encoded.get_binary().unwrap(), b"foo");
    }

    #[test]
    fn shared_subtrees() {
        let leaf = JsonItem::from_value(JsonValue::integer(7));
        let shared = JsonItem::from_array(ArrayItem::new(vec![leaf]));
        let copy = shared.clone();
        assert_eq!(copy, shared);
        assert_eq!(copy.at(0).unwrap().get::<i64>().unwrap(), 7);
    }
}
