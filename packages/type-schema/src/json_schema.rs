//! JSON type document output.
//!
//! Collects a simplified view of every tagged class and writes it once the
//! build ends:
//!
//! ```json
//! [
//!     {
//!         "name": "Foo",
//!         "properties": [{ "name": "a", "type": "number" }],
//!         "methods": [{ "name": "run", "params": ["string"], "return": "void" }]
//!     }
//! ]
//! ```

use crate::hooks::HookSink;
use crate::metadata::ClassMetadata;
use crate::plugin::{TypeSchema, TypeSchemaOptions};
use anyhow::{anyhow, Context};
use host::{BuildOptions, BuildResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyTypeInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub type_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodTypeInfo {
    pub name: String,
    pub params: Vec<Option<String>>,
    #[serde(rename = "return")]
    pub return_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassTypeInfo {
    pub name: String,
    pub properties: Vec<PropertyTypeInfo>,
    pub methods: Vec<MethodTypeInfo>,
}

impl From<&ClassMetadata> for ClassTypeInfo {
    fn from(metadata: &ClassMetadata) -> Self {
        Self {
            name: metadata.name().to_string(),
            properties: metadata
                .properties
                .iter()
                .map(|prop| PropertyTypeInfo {
                    name: prop.name.clone(),
                    type_text: prop.type_text.clone(),
                })
                .collect(),
            methods: metadata
                .methods
                .iter()
                .map(|method| MethodTypeInfo {
                    name: method.name.clone(),
                    params: method
                        .parameters
                        .iter()
                        .map(|param| param.type_text.clone())
                        .collect(),
                    return_type: method.return_type.clone(),
                })
                .collect(),
        }
    }
}

/// Serializes with a four-space indent.
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    // serde_json only emits valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub struct JsonTypeSchema {
    path: PathBuf,
    classes: Mutex<Vec<ClassTypeInfo>>,
}

impl JsonTypeSchema {
    /// `path` is resolved against the build's working directory.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            classes: Mutex::new(Vec::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Classes collected so far.
    pub fn classes(&self) -> anyhow::Result<Vec<ClassTypeInfo>> {
        self.classes
            .lock()
            .map(|classes| classes.clone())
            .map_err(|_| anyhow!("type schema state poisoned"))
    }

    fn write(&self, options: &BuildOptions) -> anyhow::Result<PathBuf> {
        let path = options.resolve_path(&self.path);
        let json = to_pretty_json(&self.classes()?)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

impl HookSink for JsonTypeSchema {
    fn on_start(&self, _options: &BuildOptions) -> anyhow::Result<()> {
        self.classes
            .lock()
            .map_err(|_| anyhow!("type schema state poisoned"))?
            .clear();
        Ok(())
    }

    fn on_progress(&self, _options: &BuildOptions, metadata: &ClassMetadata) -> anyhow::Result<()> {
        self.classes
            .lock()
            .map_err(|_| anyhow!("type schema state poisoned"))?
            .push(ClassTypeInfo::from(metadata));
        Ok(())
    }

    fn on_end(&self, options: &BuildOptions, _result: &BuildResult) -> anyhow::Result<()> {
        let path = self.write(options)?;
        tracing::info!("Wrote type schema to {}", path.display());
        Ok(())
    }
}

/// The `TypeSchema` plugin writing a JSON type document to `path`.
pub fn json_type_schema(path: impl Into<PathBuf>) -> TypeSchema {
    TypeSchema::new(TypeSchemaOptions::new(JsonTypeSchema::new(path)))
}
