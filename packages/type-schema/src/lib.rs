#![deny(clippy::all)]

//! Type Schema - decorator metadata extraction
//!
//! Build plugin that finds classes tagged with decorators exported from
//! declaration files (`*.dec.ts`) and reports their members to consumers.

pub mod config;
pub mod declaration;
pub mod error;
pub mod extractor;
pub mod hooks;
pub mod json_schema;
pub mod metadata;
pub mod plugin;
pub mod project;
pub mod registry;
pub mod strip;

pub use config::CompilerConfig;
pub use declaration::{DeclarationFile, DeclarationFiles, DeclarationResolver};
pub use error::{ConfigError, ProjectError, TypeSchemaError};
pub use extractor::MetadataExtractor;
pub use hooks::{HookSink, NoopHooks};
pub use json_schema::{json_type_schema, ClassTypeInfo, JsonTypeSchema};
pub use metadata::*;
pub use plugin::{TypeSchema, TypeSchemaOptions};
pub use project::{Scope, SourceFile, SourceProject};
pub use registry::DecoratorRegistry;
pub use strip::DecoratorStripper;

/// Library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
