//! The textual JSON dialect: tokenizer and reader.

mod escape;
mod reader;
mod scan;
mod token;
mod tokenizer;

pub use reader::{JsonReader, JsonReaderOptions};
pub use token::JsonTokenType;
pub use tokenizer::JsonTokenizer;
