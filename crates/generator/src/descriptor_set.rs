//! In-place comment conversion for FileDescriptorSets
//!
//! Rewrites every leading, trailing and detached comment of a descriptor set
//! so that later generators read reStructuredText instead of markdown.

use crate::batcher::{BatchError, CommentBatcher};
use crate::converter::MarkupConverter;
use prost::Message;
use prost_types::source_code_info::Location;
use prost_types::FileDescriptorSet;
use protoc_docs_common::{PluginConfig, PluginError, Result};
use std::fs;
use std::path::Path;

fn locations_mut(set: &mut FileDescriptorSet) -> impl Iterator<Item = &mut Location> {
    set.file
        .iter_mut()
        .filter_map(|file| file.source_code_info.as_mut())
        .flat_map(|info| info.location.iter_mut())
}

fn locations(set: &FileDescriptorSet) -> impl Iterator<Item = &Location> {
    set.file
        .iter()
        .filter_map(|file| file.source_code_info.as_ref())
        .flat_map(|info| info.location.iter())
}

/// Convert all comments of `set` with a single converter call
///
/// Only comments that are present are touched; absent leading or trailing
/// comments stay absent. Returns the number of comments written back.
pub fn convert_descriptor_set(
    set: &mut FileDescriptorSet,
    batcher: &mut CommentBatcher<'_>,
) -> std::result::Result<usize, BatchError> {
    for location in locations(set) {
        if let Some(comment) = &location.leading_comments {
            batcher.submit(comment)?;
        }
        if let Some(comment) = &location.trailing_comments {
            batcher.submit(comment)?;
        }
        for comment in &location.leading_detached_comments {
            batcher.submit(comment)?;
        }
    }

    batcher.convert_all()?;

    let mut written = 0;
    for location in locations_mut(set) {
        if location.leading_comments.is_some() {
            location.leading_comments = batcher.next_comment()?;
            written += 1;
        }
        if location.trailing_comments.is_some() {
            location.trailing_comments = batcher.next_comment()?;
            written += 1;
        }
        for comment in location.leading_detached_comments.iter_mut() {
            if let Some(converted) = batcher.next_comment()? {
                *comment = converted;
                written += 1;
            }
        }
    }

    Ok(written)
}

/// Read a binary FileDescriptorSet, convert its comments and write it out
pub fn convert_descriptor_file(
    source: &Path,
    dest: &Path,
    converter: &dyn MarkupConverter,
    config: &PluginConfig,
) -> Result<usize> {
    let bytes = fs::read(source).map_err(|e| {
        PluginError::Decode(format!(
            "Failed to read FileDescriptorSet file {}: {}",
            source.display(),
            e
        ))
    })?;

    let mut set = FileDescriptorSet::decode(bytes.as_slice()).map_err(|e| {
        PluginError::Decode(format!("Failed to decode FileDescriptorSet: {}", e))
    })?;

    let mut batcher = CommentBatcher::new(converter, config);
    let written = convert_descriptor_set(&mut set, &mut batcher)?;

    fs::write(dest, set.encode_to_vec())?;
    log::info!(
        "Converted {} comments from {} into {}",
        written,
        source.display(),
        dest.display()
    );

    Ok(written)
}
