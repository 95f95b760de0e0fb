//! CodeGeneratorResponse assembly
//!
//! Drives one plugin run: discover structures, convert all of their comments
//! with a single batch, render docstrings and emit insertion-point files.

use crate::batcher::CommentBatcher;
use crate::converter::MarkupConverter;
use crate::templates::{self, class_doc_entry, render_docstring};
use prost_types::compiler::code_generator_response::{Feature, File};
use prost_types::compiler::CodeGeneratorResponse;
use protoc_docs_common::{
    DocumentedStructure, PluginConfig, PluginError, Result, StructureHandle, StructureRegistry,
};
use protoc_docs_parser::{CodeGeneratorParser, FileDocs};
use std::collections::HashSet;
use tera::Tera;

/// Insertion point name for a message class
pub fn insertion_point(qualified_name: &str) -> String {
    format!("class_scope:{}", qualified_name)
}

/// Builds the plugin response for a request
pub struct ResponseAssembler<'a> {
    config: PluginConfig,
    converter: &'a dyn MarkupConverter,
    tera: Tera,
}

impl<'a> ResponseAssembler<'a> {
    pub fn new(config: PluginConfig, converter: &'a dyn MarkupConverter) -> Result<Self> {
        let tera = templates::load_templates()?;
        Ok(Self {
            config,
            converter,
            tera,
        })
    }

    /// Produce the response for every file protoc asked to generate
    pub fn assemble(&self, parser: &CodeGeneratorParser) -> Result<CodeGeneratorResponse> {
        let mut registry = StructureRegistry::new();
        let docs = parser.find_docs(&mut registry);

        self.convert_comments(&docs)?;

        let mut files = Vec::new();
        for file_docs in &docs {
            let module = self.config.module_name(&file_docs.filename);

            for handle in &file_docs.structures {
                let structure = handle.borrow();
                if structure.is_undocumented() {
                    continue;
                }

                files.push(File {
                    name: Some(module.clone()),
                    insertion_point: Some(insertion_point(structure.qualified_name())),
                    content: Some(self.render(&structure)?),
                    ..Default::default()
                });
            }
        }

        log::info!(
            "Documented {} structures across {} files",
            files.len(),
            docs.len()
        );

        Ok(CodeGeneratorResponse {
            file: files,
            supported_features: Some(Feature::Proto3Optional as u64),
            ..Default::default()
        })
    }

    /// Insertion content for one structure: a `'__doc__'` class dict entry
    pub fn render(&self, structure: &DocumentedStructure) -> Result<String> {
        let body = render_docstring(&self.tera, structure)?;
        Ok(class_doc_entry(&body))
    }

    /// Replace every summary and member comment with its converted text
    ///
    /// Each structure is converted once even when several files touch it.
    fn convert_comments(&self, docs: &[FileDocs]) -> Result<()> {
        let mut seen = HashSet::new();
        let structures: Vec<&StructureHandle> = docs
            .iter()
            .flat_map(|file| file.structures.iter())
            .filter(|handle| seen.insert((*handle).clone()))
            .collect();

        let mut batcher = CommentBatcher::new(self.converter, &self.config);

        for handle in &structures {
            let structure = handle.borrow();
            if !structure.summary().is_empty() {
                batcher.submit(structure.summary())?;
            }
            for (_, comment) in structure.members() {
                batcher.submit(comment)?;
            }
        }

        batcher.convert_all()?;

        for handle in &structures {
            let mut structure = handle.borrow_mut();
            if !structure.summary().is_empty() {
                let summary = next_converted(&mut batcher)?;
                structure.set_summary(summary);
            }
            for (_, comment) in structure.members_mut() {
                *comment = next_converted(&mut batcher)?;
            }
        }

        Ok(())
    }
}

fn next_converted(batcher: &mut CommentBatcher<'_>) -> Result<String> {
    batcher.next_comment()?.ok_or_else(|| {
        PluginError::Conversion("ran out of converted comments".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_point() {
        assert_eq!(insertion_point("pkg.Foo"), "class_scope:pkg.Foo");
    }
}
