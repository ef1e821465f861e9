//! XML primitives for the Panorama configuration API.
//!
//! The appliance speaks two dialects of the same configuration tree: the XML
//! API returns raw XML documents, while the REST API exchanges JSON in a
//! "dict" shape where attributes become `@name` keys and repeated elements
//! become arrays. This crate parses and writes the XML side and converts
//! between the two so higher layers only deal with one representation.

pub mod dict;
pub mod parser;
pub mod tree;
pub mod writer;

pub use dict::{content_value, from_value, DictError, DictOptions};
pub use parser::{parse, parse_file, parse_str, ParseError};
pub use tree::XmlNode;
pub use writer::{write, write_compact, write_file, WriteError};
