//! Batched comment conversion
//!
//! Spawning the converter once per comment costs one process per documented
//! element, which adds up to hundreds of processes for a single file. The
//! batcher instead concatenates every comment that needs conversion with a
//! separator token, converts the whole batch with one call, and splits the
//! result back into the original comment positions.
//!
//! Comments without markdown-significant characters skip conversion and are
//! kept as they are, in the same ordinal space as converted comments.

use crate::converter::{ConvertError, MarkupConverter};
use protoc_docs_common::{PluginConfig, PluginError};
use regex::{Captures, Regex};
use std::sync::LazyLock;
use thiserror::Error;

/// Separator placed between comments of a batch
pub const BATCH_TOKEN: &str = "$#!";

/// Characters that make a comment worth converting
const MARKUP_TRIGGERS: &[char] = &['`', '[', ']', '*', '_'];

/// `[Foo][pkg.Foo]` or `[Foo][]`
static PROTO_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(?P<text>[^\]]+)\]\[(?P<uri>[A-Za-z_][A-Za-z_.0-9]*)?\]").unwrap()
});

/// `[text](/root/relative/path)`
static RELATIVE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(?P<text>[^\]]+)\]\((?P<uri>/[^\)]+)\)").unwrap());

static NEW_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?P<newlines>(\r?\n)+)(?P<followup>[^\r\n])").unwrap());

/// Errors raised while batching comments
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("comments were already converted")]
    AlreadyConverted,

    #[error("comments have not been converted yet")]
    NotConverted,

    #[error("converter returned {actual} pieces for {expected} comments")]
    PieceCountMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Convert(#[from] ConvertError),
}

impl From<BatchError> for PluginError {
    fn from(e: BatchError) -> Self {
        PluginError::Conversion(e.to_string())
    }
}

#[derive(Debug)]
enum Slot {
    Raw(String),
    Pending,
    Converted(String),
}

/// Collects comments, converts them in one call, and hands them back in order
///
/// Usage is strictly phased: `submit` one or more times, `convert_all` once,
/// then `next_comment` until it returns `None`.
pub struct CommentBatcher<'a> {
    converter: &'a dyn MarkupConverter,
    docs_host: String,
    source_format: String,
    target_format: String,
    slots: Vec<Slot>,
    batch: String,
    pending: usize,
    converted: bool,
    cursor: usize,
}

impl<'a> CommentBatcher<'a> {
    pub fn new(converter: &'a dyn MarkupConverter, config: &PluginConfig) -> Self {
        Self {
            converter,
            docs_host: config.docs_host.clone(),
            source_format: config.source_format.clone(),
            target_format: config.target_format.clone(),
            slots: Vec::new(),
            batch: String::new(),
            pending: 0,
            converted: false,
            cursor: 0,
        }
    }

    /// Number of submitted comments
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of comments waiting for conversion
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Queue a comment
    ///
    /// Links are rewritten first; the comment is then stored as is or added
    /// to the conversion batch depending on its content.
    pub fn submit(&mut self, comment: &str) -> Result<(), BatchError> {
        if self.converted {
            return Err(BatchError::AlreadyConverted);
        }

        let comment = rewrite_links(comment, &self.docs_host);

        if needs_conversion(&comment) {
            if self.pending > 0 {
                self.batch.push('\n');
                self.batch.push_str(BATCH_TOKEN);
            }
            self.batch.push_str(&comment);
            self.pending += 1;
            self.slots.push(Slot::Pending);
        } else {
            self.slots.push(Slot::Raw(comment));
        }

        Ok(())
    }

    /// Convert the pending batch with a single converter call
    ///
    /// No call is made when nothing needs conversion.
    pub fn convert_all(&mut self) -> Result<(), BatchError> {
        if self.converted {
            return Err(BatchError::AlreadyConverted);
        }

        if self.pending == 0 {
            log::debug!(
                "No comments need conversion ({} kept as is)",
                self.slots.len()
            );
            self.converted = true;
            return Ok(());
        }

        log::debug!(
            "Converting {} of {} comments in one batch ({} bytes)",
            self.pending,
            self.slots.len(),
            self.batch.len()
        );

        let output =
            self.converter
                .convert(&self.batch, &self.source_format, &self.target_format)?;

        let pieces: Vec<&str> = output.split(BATCH_TOKEN).collect();
        if pieces.len() != self.pending {
            return Err(BatchError::PieceCountMismatch {
                expected: self.pending,
                actual: pieces.len(),
            });
        }

        let pending_slots = self
            .slots
            .iter_mut()
            .filter(|slot| matches!(slot, Slot::Pending));
        for (slot, piece) in pending_slots.zip(pieces) {
            *slot = Slot::Converted(insert_spaces(piece));
        }

        self.batch.clear();
        self.converted = true;
        Ok(())
    }

    /// Next comment in submission order, `None` once all were returned
    pub fn next_comment(&mut self) -> Result<Option<String>, BatchError> {
        if !self.converted {
            return Err(BatchError::NotConverted);
        }

        let Some(slot) = self.slots.get_mut(self.cursor) else {
            return Ok(None);
        };
        self.cursor += 1;

        match slot {
            Slot::Raw(text) | Slot::Converted(text) => Ok(Some(std::mem::take(text))),
            Slot::Pending => Err(BatchError::NotConverted),
        }
    }
}

/// Rewrite links that have no meaning outside the original docs site
///
/// - `[Foo][pkg.Foo]` becomes the literal `` `Foo` ``
/// - `[text](/path)` becomes `[text](<docs_host>/path)`
pub fn rewrite_links(comment: &str, docs_host: &str) -> String {
    let comment =
        PROTO_LINK.replace_all(comment, |caps: &Captures| format!("`{}`", &caps["text"]));
    RELATIVE_LINK
        .replace_all(&comment, |caps: &Captures| {
            format!("[{}]({}{})", &caps["text"], docs_host, &caps["uri"])
        })
        .into_owned()
}

/// Whether a comment contains markdown that the converter must handle
pub fn needs_conversion(comment: &str) -> bool {
    comment.contains(MARKUP_TRIGGERS)
}

/// Give every line of converted text one extra leading space
///
/// Comments are written back after `//`, and consumers strip exactly one
/// space from each line; without this, lines that really start with a space
/// would lose their indentation.
pub fn insert_spaces(comment: &str) -> String {
    let spaced = NEW_LINES.replace_all(comment, |caps: &Captures| {
        format!("{} {}", &caps["newlines"], &caps["followup"])
    });
    format!(" {}", spaced)
}
