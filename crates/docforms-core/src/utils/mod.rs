//! Utility types and functions.
//!
//! - [`MultiValueDict`]: a dictionary that can hold multiple values per key.
//! - [`text`]: label and HTML helpers (`capfirst`, `pretty_name`, `escape`).

mod multi_value_dict;
pub mod text;

pub use multi_value_dict::MultiValueDict;
