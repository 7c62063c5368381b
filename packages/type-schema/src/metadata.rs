//! Extracted class metadata.
//!
//! Everything here is owned data: a [`ClassMetadata`] handed to a hook does
//! not borrow the syntax tree it came from, so consumers may clone and keep
//! whatever they need after the call returns.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Byte offsets into the source text of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: u32,
    pub end: u32,
}

impl From<oxc_span::Span> for SourceSpan {
    fn from(span: oxc_span::Span) -> Self {
        Self {
            start: span.start,
            end: span.end,
        }
    }
}

/// A decorator argument. Literals are decoded, anything else is kept as the
/// source text of the expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum DecoratorArgument {
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
    Expression(String),
}

impl DecoratorArgument {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DecoratorArgument::String(value) => Some(value),
            _ => None,
        }
    }
}

/// A recognized decorator as written on a class, member or parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoratorRef {
    /// Identifier the decorator is recognized by.
    pub name: String,
    /// The decorator expression, without the `@`.
    pub text: String,
    /// `None` for `@name`, `Some` for `@name(...)`.
    pub arguments: Option<Vec<DecoratorArgument>>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassTarget {
    /// `None` for an anonymous `export default class`.
    pub name: Option<String>,
    pub path: PathBuf,
    pub span: SourceSpan,
    pub exported: bool,
    pub default_export: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyMetadata {
    pub name: String,
    /// Declared type annotation text, e.g. `number` or `Array<string>`.
    pub type_text: Option<String>,
    pub is_static: bool,
    pub optional: bool,
    pub decorators: Vec<DecoratorRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterMetadata {
    /// The binding as written, e.g. `id` or `{ a, b }`.
    pub name: String,
    pub type_text: Option<String>,
    pub optional: bool,
    pub rest: bool,
    pub decorator: Option<DecoratorRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodMetadata {
    pub name: String,
    pub return_type: Option<String>,
    pub is_static: bool,
    pub decorators: Vec<DecoratorRef>,
    pub parameters: Vec<ParameterMetadata>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessorKind {
    Get,
    Set,
}

impl fmt::Display for AccessorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessorKind::Get => f.write_str("get"),
            AccessorKind::Set => f.write_str("set"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessorMetadata {
    pub kind: AccessorKind,
    pub name: String,
    pub is_static: bool,
    /// Getter return type or setter parameter type.
    pub type_text: Option<String>,
    pub decorators: Vec<DecoratorRef>,
}

/// Metadata of one tagged class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetadata {
    pub target: ClassTarget,
    pub decorators: Vec<DecoratorRef>,
    pub properties: Vec<PropertyMetadata>,
    pub methods: Vec<MethodMetadata>,
    pub accessors: Vec<AccessorMetadata>,
}

impl ClassMetadata {
    /// The class name, or `default` for an anonymous default export.
    pub fn name(&self) -> &str {
        self.target.name.as_deref().unwrap_or("default")
    }

    /// The first class decorator with the given name.
    pub fn decorator(&self, name: &str) -> Option<&DecoratorRef> {
        self.decorators.iter().find(|d| d.name == name)
    }
}
