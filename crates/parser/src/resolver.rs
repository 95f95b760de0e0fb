//! Source-location path resolution
//!
//! Turns a `SourceCodeInfo.Location.path` into the documentation target it
//! describes: the summary of a message, the summary of a nested message, or a
//! member entry of the enclosing message.
//!
//! ## Classification
//! Once the path is consumed, the terminal element is classified by name:
//! - same name as the structure being documented -> class-level summary
//! - mixed-case name (e.g. `Bar`) -> summary of the nested structure `scope.Bar`
//! - anything else (e.g. `bar_baz`) -> member comment on the current structure
//!
//! Enum and enum-value comments have no attachment point in the generated
//! classes and resolve to no target.

use crate::descriptor::{DescriptorNode, NodeKind, FILE_MESSAGE_TYPE};
use prost_types::FileDescriptorProto;
use thiserror::Error;

/// Why a path could not be followed
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("resolution must start at a {expected} node, got {found}")]
    RootMismatch { expected: NodeKind, found: NodeKind },

    #[error("path {0:?} does not address a top-level message")]
    NotAMessagePath(Vec<i32>),

    #[error("{kind} has no child collection with field number {number}")]
    UnknownField { kind: NodeKind, number: i32 },

    #[error("{kind} has no '{field}' collection")]
    NoSuchCollection { kind: NodeKind, field: &'static str },

    #[error("index {index} out of range for '{field}' (len {len})")]
    IndexOutOfRange {
        field: &'static str,
        index: i32,
        len: usize,
    },
}

/// Where a comment belongs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTarget {
    /// Class-level comment of `structure`
    Summary { structure: String },
    /// Class-level comment of a nested structure reached through its parent
    Nested { structure: String },
    /// Comment on `member` of `structure`
    Member { structure: String, member: String },
}

impl ResolvedTarget {
    /// Qualified name of the structure the comment is attached to
    pub fn structure(&self) -> &str {
        match self {
            ResolvedTarget::Summary { structure }
            | ResolvedTarget::Nested { structure }
            | ResolvedTarget::Member { structure, .. } => structure,
        }
    }
}

/// True when `name` has both uppercase and lowercase letters
///
/// Message names are capitalized while field names are lower or snake case,
/// which is what tells a nested type apart from a member.
pub fn is_mixed_case(name: &str) -> bool {
    name.chars().any(char::is_uppercase) && name.chars().any(char::is_lowercase)
}

/// Join a scope and a name with a dot, skipping an empty scope
pub fn qualify(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", scope, name)
    }
}

/// Resolve a full file-level path (`[4, i, ...]`)
///
/// The top-level message at index `i` becomes the root structure, qualified
/// with the file's package.
pub fn resolve_file(
    file: &FileDescriptorProto,
    path: &[i32],
) -> Result<Option<ResolvedTarget>, ResolveError> {
    let (index, rest) = match path {
        [FILE_MESSAGE_TYPE, index, rest @ ..] => (*index, rest),
        _ => return Err(ResolveError::NotAMessagePath(path.to_vec())),
    };

    let root = DescriptorNode::File(file).step(FILE_MESSAGE_TYPE, index)?;
    let scope = qualify(file.package(), root.name());
    resolve(root, &scope, rest)
}

/// Resolve `path` relative to the message `root`, whose qualified name is `scope`
pub fn resolve(
    root: DescriptorNode<'_>,
    scope: &str,
    path: &[i32],
) -> Result<Option<ResolvedTarget>, ResolveError> {
    if root.kind() != NodeKind::Message {
        return Err(ResolveError::RootMismatch {
            expected: NodeKind::Message,
            found: root.kind(),
        });
    }

    descend(root, scope.to_string(), path)
}

fn descend(
    node: DescriptorNode<'_>,
    structure: String,
    path: &[i32],
) -> Result<Option<ResolvedTarget>, ResolveError> {
    match path {
        [number, index, rest @ ..] => {
            let child = node.step(*number, *index)?;

            // Only messages that are passed through open a new scope; a
            // terminal nested message is classified by name below.
            let structure = match child {
                DescriptorNode::Message(_) if rest.len() >= 2 => qualify(&structure, child.name()),
                _ => structure,
            };

            descend(child, structure, rest)
        }
        [dangling] => {
            log::debug!(
                "Path ends with a lone element {} under {} '{}'; no target",
                dangling,
                node.kind(),
                node.name()
            );
            Ok(None)
        }
        [] => Ok(classify(node, structure)),
    }
}

fn classify(node: DescriptorNode<'_>, structure: String) -> Option<ResolvedTarget> {
    match node {
        DescriptorNode::Enum(_) | DescriptorNode::EnumValue(_) => None,
        DescriptorNode::File(_) | DescriptorNode::Service(_) | DescriptorNode::Method(_) => None,
        DescriptorNode::Message(_) | DescriptorNode::Field(_) | DescriptorNode::Oneof(_) => {
            let name = node.name();
            let current = structure.rsplit('.').next().unwrap_or(&structure);

            if current == name {
                Some(ResolvedTarget::Summary { structure })
            } else if is_mixed_case(name) {
                Some(ResolvedTarget::Nested {
                    structure: qualify(&structure, name),
                })
            } else {
                Some(ResolvedTarget::Member {
                    structure,
                    member: name.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost_types::{DescriptorProto, EnumDescriptorProto, FieldDescriptorProto};

    fn field(name: &str, number: i32) -> FieldDescriptorProto {
        FieldDescriptorProto {
            name: Some(name.to_string()),
            number: Some(number),
            ..Default::default()
        }
    }

    /// package pkg; message Foo { string bar = 1; message Bar { string baz = 1; } enum Kind {} }
    fn sample_file() -> FileDescriptorProto {
        FileDescriptorProto {
            name: Some("pkg/foo.proto".to_string()),
            package: Some("pkg".to_string()),
            message_type: vec![DescriptorProto {
                name: Some("Foo".to_string()),
                field: vec![field("bar", 1)],
                nested_type: vec![DescriptorProto {
                    name: Some("Bar".to_string()),
                    field: vec![field("baz", 1)],
                    ..Default::default()
                }],
                enum_type: vec![EnumDescriptorProto {
                    name: Some("Kind".to_string()),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_is_mixed_case() {
        assert!(!is_mixed_case("foo"));
        assert!(!is_mixed_case("FOO"));
        assert!(is_mixed_case("Foo"));
        assert!(!is_mixed_case("foo_bar"));
        assert!(!is_mixed_case(""));
    }

    #[test]
    fn test_message_path_is_summary() {
        let file = sample_file();
        assert_eq!(
            resolve_file(&file, &[4, 0]).unwrap(),
            Some(ResolvedTarget::Summary {
                structure: "pkg.Foo".to_string()
            })
        );
    }

    #[test]
    fn test_field_path_is_member() {
        let file = sample_file();
        assert_eq!(
            resolve_file(&file, &[4, 0, 2, 0]).unwrap(),
            Some(ResolvedTarget::Member {
                structure: "pkg.Foo".to_string(),
                member: "bar".to_string()
            })
        );
    }

    #[test]
    fn test_nested_message_path() {
        let file = sample_file();
        assert_eq!(
            resolve_file(&file, &[4, 0, 3, 0]).unwrap(),
            Some(ResolvedTarget::Nested {
                structure: "pkg.Foo.Bar".to_string()
            })
        );
    }

    #[test]
    fn test_nested_field_documents_nested_structure() {
        let file = sample_file();
        assert_eq!(
            resolve_file(&file, &[4, 0, 3, 0, 2, 0]).unwrap(),
            Some(ResolvedTarget::Member {
                structure: "pkg.Foo.Bar".to_string(),
                member: "baz".to_string()
            })
        );
    }

    #[test]
    fn test_nested_name_suffix_is_not_summary() {
        let file = FileDescriptorProto {
            package: Some("pkg".to_string()),
            message_type: vec![DescriptorProto {
                name: Some("FooBar".to_string()),
                nested_type: vec![DescriptorProto {
                    name: Some("Bar".to_string()),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(
            resolve_file(&file, &[4, 0, 3, 0]).unwrap(),
            Some(ResolvedTarget::Nested {
                structure: "pkg.FooBar.Bar".to_string()
            })
        );
    }

    #[test]
    fn test_enum_path_has_no_target() {
        let file = sample_file();
        assert_eq!(resolve_file(&file, &[4, 0, 4, 0]).unwrap(), None);
    }

    #[test]
    fn test_dangling_element_has_no_target() {
        let file = sample_file();
        assert_eq!(resolve_file(&file, &[4, 0, 2, 0, 1]).unwrap(), None);
        assert_eq!(resolve_file(&file, &[4, 0, 2]).unwrap(), None);
    }

    #[test]
    fn test_malformed_paths_fail() {
        let file = sample_file();
        assert!(matches!(
            resolve_file(&file, &[4, 3]),
            Err(ResolveError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            resolve_file(&file, &[4, 0, 42, 0]),
            Err(ResolveError::UnknownField { .. })
        ));
        assert!(matches!(
            resolve_file(&file, &[6, 0]),
            Err(ResolveError::NotAMessagePath(_))
        ));
    }

    #[test]
    fn test_root_must_be_message() {
        let file = sample_file();
        let err = resolve(DescriptorNode::File(&file), "pkg", &[]).unwrap_err();
        assert_eq!(
            err,
            ResolveError::RootMismatch {
                expected: NodeKind::Message,
                found: NodeKind::File
            }
        );
    }

    #[test]
    fn test_file_without_package() {
        let mut file = sample_file();
        file.package = None;
        assert_eq!(
            resolve_file(&file, &[4, 0, 2, 0]).unwrap(),
            Some(ResolvedTarget::Member {
                structure: "Foo".to_string(),
                member: "bar".to_string()
            })
        );
    }
}
