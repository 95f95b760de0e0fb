//! Docstring generation for protoc-docs
//!
//! This crate turns the structures discovered by `protoc-docs-parser` into a
//! `CodeGeneratorResponse`:
//! - comments are converted from CommonMark to reStructuredText in a single
//!   batched converter call (`CommentBatcher`)
//! - each structure is rendered as a Python docstring
//! - docstrings are emitted as `'__doc__'` entries at the
//!   `class_scope:<name>` insertion point of the module protoc generated for
//!   the `.proto` file
//!
//! It also converts the comments of a whole `FileDescriptorSet` in place.

mod assembler;
mod batcher;
mod converter;
mod descriptor_set;
mod templates;

pub use assembler::{insertion_point, ResponseAssembler};
pub use batcher::{
    insert_spaces, needs_conversion, rewrite_links, BatchError, CommentBatcher, BATCH_TOKEN,
};
pub use converter::{ConvertError, MarkupConverter, PandocConverter};
pub use descriptor_set::{convert_descriptor_file, convert_descriptor_set};
pub use templates::{
    class_doc_entry, dedent, python_docstring, render_docstring, ATTRIBUTES_HEADER,
};
