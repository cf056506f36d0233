//! # Plume Syntax
//!
//! Reads the small textual grammars used throughout the compiler:
//!
//! - type expressions (`pkg::Class<T|m>`, `{String[1]->Boolean[1]}`)
//! - multiplicities (`[1]`, `[0..1]`, `[*]`, `[1..*]`, `[m]`)
//! - type parameter declarations (`T`, `-T`)
//! - function descriptors (`pkg::func(String[1]):Boolean[1]`) and the function
//!   ids derived from them
//!
//! ## Example
//!
//! ```
//! use plume_syntax::descriptor_to_id;
//!
//! let id = descriptor_to_id("pkg::func(Integer[1]):String[1]").unwrap();
//! assert_eq!(id, "pkg::func_Integer_1__String_1_");
//! ```

mod ast;
mod error;
mod lexer;
mod parser;
mod token;

pub use ast::{push_id_segment, FunctionDescriptor, MultiplicityExpr, TypeExpr, TypeParameterExpr};
pub use error::ParseError;
pub use lexer::Lexer;
pub use parser::{
    descriptor_to_id, is_valid_function_descriptor, parse_function_descriptor,
    parse_multiplicity, parse_type, parse_type_parameter, parse_typed_value, Parser,
};
pub use token::{Token, TokenKind};
