//! CodeGeneratorRequest comment discovery

use crate::descriptor::FILE_MESSAGE_TYPE;
use crate::resolver::{resolve_file, ResolvedTarget};
use prost::Message;
use prost_types::compiler::CodeGeneratorRequest;
use prost_types::source_code_info::Location;
use prost_types::FileDescriptorProto;
use protoc_docs_common::{PluginError, Result, StructureHandle, StructureRegistry};
use std::collections::HashSet;
use std::io::Read;

/// Structures documented by one generated file
#[derive(Debug, Clone)]
pub struct FileDocs {
    /// Name of the `.proto` file, as listed in `file_to_generate`
    pub filename: String,

    /// Structures touched by this file's comments, in first-touch order
    pub structures: Vec<StructureHandle>,
}

/// Reads the code generator request and maps comments to structures
///
/// Takes the `CodeGeneratorRequest` sent by protoc and attaches every
/// relevant comment to the documented structure it belongs to.
pub struct CodeGeneratorParser {
    request: CodeGeneratorRequest,
}

impl CodeGeneratorParser {
    pub fn new(request: CodeGeneratorRequest) -> Self {
        Self { request }
    }

    /// Decode a serialized request
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let request = CodeGeneratorRequest::decode(bytes).map_err(|e| {
            PluginError::Decode(format!("Failed to decode CodeGeneratorRequest: {}", e))
        })?;
        Ok(Self::new(request))
    }

    /// Read a whole request from a byte stream (e.g., stdin)
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Self::from_bytes(&buf)
    }

    pub fn request(&self) -> &CodeGeneratorRequest {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut CodeGeneratorRequest {
        &mut self.request
    }

    /// Plugin parameter passed on the protoc command line, if any
    pub fn parameter(&self) -> Option<&str> {
        self.request.parameter.as_deref().filter(|p| !p.is_empty())
    }

    /// Files protoc asked us to generate, skipping dependency-only descriptors
    pub fn files_to_generate(&self) -> impl Iterator<Item = &FileDescriptorProto> {
        let wanted = &self.request.file_to_generate;
        self.request
            .proto_file
            .iter()
            .filter(move |file| wanted.iter().any(|name| name == file.name()))
    }

    /// Attach every message comment to its structure in `registry`
    ///
    /// Locations whose path cannot be resolved are logged and skipped so one
    /// bad location does not hide the rest of the file.
    pub fn find_docs(&self, registry: &mut StructureRegistry) -> Vec<FileDocs> {
        let mut docs = Vec::new();

        for file in self.files_to_generate() {
            let locations = file
                .source_code_info
                .as_ref()
                .map(|info| info.location.as_slice())
                .unwrap_or_default();

            let mut seen = HashSet::new();
            let mut structures = Vec::new();

            for location in locations {
                let Some(comment) = location_comment(location) else {
                    continue;
                };

                // Only comments inside messages are documented for now.
                if location.path.first() != Some(&FILE_MESSAGE_TYPE) {
                    continue;
                }

                match resolve_file(file, &location.path) {
                    Ok(Some(target)) => {
                        let handle = attach(registry, &target, comment);
                        if seen.insert(handle.clone()) {
                            structures.push(handle);
                        }
                    }
                    Ok(None) => {
                        log::debug!(
                            "No documentation target for path {:?} in {}",
                            location.path,
                            file.name()
                        );
                    }
                    Err(e) => {
                        log::warn!(
                            "Skipping comment at path {:?} in {}: {}",
                            location.path,
                            file.name(),
                            e
                        );
                    }
                }
            }

            if !structures.is_empty() {
                log::debug!("{}: {} documented structures", file.name(), structures.len());
                docs.push(FileDocs {
                    filename: file.name().to_string(),
                    structures,
                });
            }
        }

        docs
    }
}

/// Leading comment, then the trailing one after a blank line
fn location_comment(location: &Location) -> Option<String> {
    let leading = location.leading_comments().trim_end();
    let trailing = location.trailing_comments().trim_end();

    match (leading.is_empty(), trailing.is_empty()) {
        (true, true) => None,
        (false, true) => Some(leading.to_string()),
        (true, false) => Some(trailing.to_string()),
        (false, false) => Some(format!("{}\n\n{}", leading, trailing)),
    }
}

fn attach(
    registry: &mut StructureRegistry,
    target: &ResolvedTarget,
    comment: String,
) -> StructureHandle {
    let handle = registry.get_or_create(target.structure());
    match target {
        ResolvedTarget::Summary { .. } | ResolvedTarget::Nested { .. } => {
            handle.borrow_mut().set_summary(comment);
        }
        ResolvedTarget::Member { member, .. } => {
            handle.borrow_mut().add_member(member.as_str(), comment);
        }
    }
    handle
}
