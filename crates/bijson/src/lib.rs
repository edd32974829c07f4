//! Streaming readers for JSON and UBJSON documents.
//!
//! A [`Reader`] is a forward-only cursor over the logical tree of values,
//! keys, arrays and objects of a document, decoding scalars into native
//! types on demand. The dialect — a permissive textual JSON or the binary
//! UBJSON encoding — is sniffed from the first bytes of the input, and both
//! readers share one navigation surface: `next_value`, `next_key`,
//! `next_document`, `enter` and `leave`.
//!
//! Input arrives from an in-memory buffer, a byte stream or a file, and is
//! consumed in chunks: a token interrupted by the end of a chunk is carried
//! over to the next one, so arbitrarily large documents stream in constant
//! space (bounded by their largest token).
//!
//! The JSON dialect accepts standard JSON everywhere; the extensions —
//! comments, single-quoted strings, block strings, trailing commas,
//! unquoted keys, extended integer bases and non-finite floats — are opt-in
//! through [`JsonReaderOptions`].
//!
//! ```
//! use bijson::make_reader;
//!
//! let mut reader = make_reader(br#"{"int": 1234, "array": [1, 2]}"#)?;
//! let item = reader.read_item()?;
//! assert_eq!(item.at_key("int")?.get::<i32>()?, 1234);
//! assert_eq!(item.at_key("array")?.at(1)?.get::<i64>()?, 2);
//! # Ok::<(), bijson::Error>(())
//! ```
//!
//! For streaming access, drive the cursor directly:
//!
//! ```
//! use bijson::make_reader;
//!
//! let mut reader = make_reader(b"[1, 2, 3]")?;
//! reader.next_value()?;
//! reader.enter()?;
//! let mut total = 0;
//! while reader.next_value()? {
//!     total += reader.read_i64()?;
//! }
//! reader.leave()?;
//! assert_eq!(total, 6);
//! # Ok::<(), bijson::Error>(())
//! ```

mod base64;
mod chunk;
mod detect;
mod error;
mod item;
mod json;
mod scalar;
mod text;
mod ubjson;
mod value_type;

pub use crate::base64::{from_base64, to_base64};
pub use crate::chunk::{default_chunk_size, set_default_chunk_size};
pub use crate::detect::{Reader, make_reader, make_reader_from_file, make_reader_from_stream};
pub use crate::error::{Error, ErrorKind, Position};
pub use crate::item::{ArrayItem, FromJsonValue, JsonItem, JsonValue, ObjectItem};
pub use crate::json::{JsonReader, JsonReaderOptions, JsonTokenType, JsonTokenizer};
pub use crate::scalar::{
    get_detailed_value_type, get_value_type, parse_f32, parse_f64, parse_integer, parse_unsigned,
};
pub use crate::text::{TextBufferReader, TextFileReader, TextRead, TextStreamReader};
pub use crate::ubjson::{
    UbjsonElement, UbjsonReader, UbjsonReaderOptions, UbjsonTokenType, UbjsonTokenizer,
};
pub use crate::value_type::{DetailedValueType, ValueType, is_compatible};
