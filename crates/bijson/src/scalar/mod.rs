//! Scalar decoders: integer and floating-point parsing plus the syntactic
//! value-type classifiers.

mod classify;
mod float;
mod integer;

pub use classify::{get_detailed_value_type, get_value_type};
pub use float::{parse_f32, parse_f64};
pub use integer::{parse_integer, parse_unsigned};
