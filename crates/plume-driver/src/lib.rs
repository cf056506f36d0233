//! Compiler driver for Plume models.
//!
//! This crate owns the incremental compile pass:
//! 1. Parsing model documents
//! 2. Unbinding elements affected by a change
//! 3. Loading documents into the graph as elements and stubs
//! 4. Processing: resolving stubs and function calls
//! 5. Validation: linearizing type hierarchies
//!
//! # Example
//!
//! ```
//! use plume_driver::{CompilerConfig, Runtime};
//!
//! let mut runtime = Runtime::new(CompilerConfig::default());
//! runtime
//!     .create_source(
//!         "model.json",
//!         r#"{"package": "demo", "elements": [
//!             {"kind": "class", "name": "Shape"},
//!             {"kind": "class", "name": "Circle", "generalizations": ["Shape"]}
//!         ]}"#,
//!     )
//!     .unwrap();
//! runtime.compile().unwrap();
//! assert_eq!(
//!     runtime.linearize("demo::Circle").unwrap(),
//!     vec!["demo::Circle", "demo::Shape", "meta::pure::metamodel::type::Any"]
//! );
//! ```

mod config;
mod document;
mod error;
mod loader;
mod runtime;
mod snapshot;

pub use config::{CompilerConfig, CompilerConfigBuilder};
pub use document::{
    AssociationDecl, AssociationQualifiedPropertyDecl, CallDecl, ClassDecl, ElementDecl,
    EnumerationDecl, FunctionDecl, ParameterDecl, PathDecl, ProfileDecl, PropertyDecl,
    QualifiedPropertyDecl, SourceDocument, TaggedValueDecl,
};
pub use error::CompilationError;
pub use loader::{LoadedElement, Loader};
pub use runtime::{CallResolution, CompileReport, Runtime};
pub use snapshot::{ElementSnapshot, GraphSnapshot};
