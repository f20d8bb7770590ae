//! Configuration types
//!
//! Training definitions, run settings and the definition file parser.

pub mod toml;
pub mod types;

pub use self::toml::{parse_definitions, ParseError};
pub use types::*;
