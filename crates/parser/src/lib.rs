//! Comment discovery for protoc plugin requests
//!
//! This crate reads the `CodeGeneratorRequest` protoc sends to a plugin and
//! maps every source-location comment onto the message or field it
//! documents.
//!
//! ## Paths
//! protoc addresses schema elements with integer paths into the
//! `FileDescriptorProto` tree, read as `(field_number, index)` pairs:
//! - `[4, 0]` -> first top-level message (`message_type`)
//! - `[4, 0, 2, 1]` -> its second field (`field`)
//! - `[4, 0, 3, 0]` -> its first nested message (`nested_type`)
//! - `[4, 0, 4, 0]` -> its first enum (`enum_type`, never documented)
//!
//! ## Example
//! ```rust,ignore
//! use protoc_docs_common::StructureRegistry;
//! use protoc_docs_parser::CodeGeneratorParser;
//!
//! let parser = CodeGeneratorParser::from_reader(std::io::stdin())?;
//! let mut registry = StructureRegistry::new();
//! for file in parser.find_docs(&mut registry) {
//!     println!("{}: {} structures", file.filename, file.structures.len());
//! }
//! ```

mod descriptor;
mod parser;
mod resolver;

pub use descriptor::{ChildField, DescriptorNode, NodeKind, FILE_MESSAGE_TYPE};
pub use parser::{CodeGeneratorParser, FileDocs};
pub use resolver::{is_mixed_case, qualify, resolve, resolve_file, ResolveError, ResolvedTarget};
