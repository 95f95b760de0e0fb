//! Typed view over descriptor messages
//!
//! `SourceCodeInfo` paths address descriptor elements by protocol field
//! number and repeated-field index. Each node kind carries a small table from
//! field number to the child collection it names, so a path step is a table
//! lookup followed by a bounds-checked index.

use crate::ResolveError;
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, MethodDescriptorProto, OneofDescriptorProto, ServiceDescriptorProto,
};
use std::fmt;

/// `FileDescriptorProto.message_type`
pub const FILE_MESSAGE_TYPE: i32 = 4;

/// Kind of descriptor element a node wraps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Message,
    Field,
    Enum,
    EnumValue,
    Service,
    Method,
    Oneof,
}

/// Repeated descriptor field holding child elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildField {
    MessageType,
    EnumType,
    Service,
    Extension,
    Field,
    NestedType,
    OneofDecl,
    Value,
    Method,
}

const FILE_CHILDREN: &[(i32, ChildField)] = &[
    (FILE_MESSAGE_TYPE, ChildField::MessageType),
    (5, ChildField::EnumType),
    (6, ChildField::Service),
    (7, ChildField::Extension),
];

const MESSAGE_CHILDREN: &[(i32, ChildField)] = &[
    (2, ChildField::Field),
    (3, ChildField::NestedType),
    (4, ChildField::EnumType),
    (6, ChildField::Extension),
    (8, ChildField::OneofDecl),
];

const ENUM_CHILDREN: &[(i32, ChildField)] = &[(2, ChildField::Value)];

const SERVICE_CHILDREN: &[(i32, ChildField)] = &[(2, ChildField::Method)];

impl NodeKind {
    /// Field number to child collection table for this kind
    pub fn children(self) -> &'static [(i32, ChildField)] {
        match self {
            NodeKind::File => FILE_CHILDREN,
            NodeKind::Message => MESSAGE_CHILDREN,
            NodeKind::Enum => ENUM_CHILDREN,
            NodeKind::Service => SERVICE_CHILDREN,
            NodeKind::Field | NodeKind::EnumValue | NodeKind::Method | NodeKind::Oneof => &[],
        }
    }

    /// Child collection addressed by a protocol field number
    pub fn child_field(self, number: i32) -> Option<ChildField> {
        self.children()
            .iter()
            .find(|(n, _)| *n == number)
            .map(|(_, field)| *field)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::File => "file",
            NodeKind::Message => "message",
            NodeKind::Field => "field",
            NodeKind::Enum => "enum",
            NodeKind::EnumValue => "enum value",
            NodeKind::Service => "service",
            NodeKind::Method => "method",
            NodeKind::Oneof => "oneof",
        };
        f.write_str(name)
    }
}

impl ChildField {
    /// Descriptor field name, as written in descriptor.proto
    pub fn name(self) -> &'static str {
        match self {
            ChildField::MessageType => "message_type",
            ChildField::EnumType => "enum_type",
            ChildField::Service => "service",
            ChildField::Extension => "extension",
            ChildField::Field => "field",
            ChildField::NestedType => "nested_type",
            ChildField::OneofDecl => "oneof_decl",
            ChildField::Value => "value",
            ChildField::Method => "method",
        }
    }
}

impl fmt::Display for ChildField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Borrowed descriptor element
#[derive(Debug, Clone, Copy)]
pub enum DescriptorNode<'a> {
    File(&'a FileDescriptorProto),
    Message(&'a DescriptorProto),
    Field(&'a FieldDescriptorProto),
    Enum(&'a EnumDescriptorProto),
    EnumValue(&'a EnumValueDescriptorProto),
    Service(&'a ServiceDescriptorProto),
    Method(&'a MethodDescriptorProto),
    Oneof(&'a OneofDescriptorProto),
}

impl<'a> DescriptorNode<'a> {
    pub fn kind(&self) -> NodeKind {
        match self {
            DescriptorNode::File(_) => NodeKind::File,
            DescriptorNode::Message(_) => NodeKind::Message,
            DescriptorNode::Field(_) => NodeKind::Field,
            DescriptorNode::Enum(_) => NodeKind::Enum,
            DescriptorNode::EnumValue(_) => NodeKind::EnumValue,
            DescriptorNode::Service(_) => NodeKind::Service,
            DescriptorNode::Method(_) => NodeKind::Method,
            DescriptorNode::Oneof(_) => NodeKind::Oneof,
        }
    }

    /// Declared name of the element (the file path for files)
    pub fn name(&self) -> &'a str {
        match self {
            DescriptorNode::File(d) => d.name(),
            DescriptorNode::Message(d) => d.name(),
            DescriptorNode::Field(d) => d.name(),
            DescriptorNode::Enum(d) => d.name(),
            DescriptorNode::EnumValue(d) => d.name(),
            DescriptorNode::Service(d) => d.name(),
            DescriptorNode::Method(d) => d.name(),
            DescriptorNode::Oneof(d) => d.name(),
        }
    }

    /// Follow one `(field_number, index)` step of a path
    pub fn step(&self, number: i32, index: i32) -> Result<DescriptorNode<'a>, ResolveError> {
        let kind = self.kind();
        let field = kind
            .child_field(number)
            .ok_or(ResolveError::UnknownField { kind, number })?;
        self.child(field, index)
    }

    /// Element `index` of the child collection `field`
    pub fn child(&self, field: ChildField, index: i32) -> Result<DescriptorNode<'a>, ResolveError> {
        use ChildField as C;
        use DescriptorNode as N;

        match (*self, field) {
            (N::File(d), C::MessageType) => pick(&d.message_type, field, index).map(N::Message),
            (N::File(d), C::EnumType) => pick(&d.enum_type, field, index).map(N::Enum),
            (N::File(d), C::Service) => pick(&d.service, field, index).map(N::Service),
            (N::File(d), C::Extension) => pick(&d.extension, field, index).map(N::Field),
            (N::Message(d), C::Field) => pick(&d.field, field, index).map(N::Field),
            (N::Message(d), C::NestedType) => pick(&d.nested_type, field, index).map(N::Message),
            (N::Message(d), C::EnumType) => pick(&d.enum_type, field, index).map(N::Enum),
            (N::Message(d), C::Extension) => pick(&d.extension, field, index).map(N::Field),
            (N::Message(d), C::OneofDecl) => pick(&d.oneof_decl, field, index).map(N::Oneof),
            (N::Enum(d), C::Value) => pick(&d.value, field, index).map(N::EnumValue),
            (N::Service(d), C::Method) => pick(&d.method, field, index).map(N::Method),
            (node, _) => Err(ResolveError::NoSuchCollection {
                kind: node.kind(),
                field: field.name(),
            }),
        }
    }
}

fn pick<T>(items: &[T], field: ChildField, index: i32) -> Result<&T, ResolveError> {
    usize::try_from(index)
        .ok()
        .and_then(|i| items.get(i))
        .ok_or(ResolveError::IndexOutOfRange {
            field: field.name(),
            index,
            len: items.len(),
        })
}
