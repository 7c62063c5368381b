//! Build-host plugin protocol.
//!
//! The type extractor never bundles anything itself: it registers callbacks
//! on whatever build tool drives it. This crate is the capability surface it
//! depends on (options, results, plugin registration), plus [`FsBuild`], a
//! small filesystem-backed host used by the command line tool and by tests.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub mod fs_build;
pub mod plugin;

pub use fs_build::FsBuild;
pub use plugin::*;

// --- Enums ---

/// How the host should interpret module contents returned from a load callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Loader {
    #[default]
    Ts,
    Tsx,
    Js,
    Jsx,
}

impl Loader {
    /// Picks the loader from a file extension, defaulting to `ts`.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("tsx") => Loader::Tsx,
            Some("js" | "mjs" | "cjs") => Loader::Js,
            Some("jsx") => Loader::Jsx,
            _ => Loader::Ts,
        }
    }

    pub fn is_typescript(self) -> bool {
        matches!(self, Loader::Ts | Loader::Tsx)
    }

    pub fn is_jsx(self) -> bool {
        matches!(self, Loader::Tsx | Loader::Jsx)
    }
}

impl fmt::Display for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Loader::Ts => "ts",
            Loader::Tsx => "tsx",
            Loader::Js => "js",
            Loader::Jsx => "jsx",
        };
        f.write_str(name)
    }
}

/// Why a module specifier is being resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolveKind {
    EntryPoint,
    ImportStatement,
    ExportFrom,
}

// --- Build Options ---

/// Options a build was started with. Plugins receive the host's initial
/// options and may start secondary builds with their own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildOptions {
    pub entry_points: Vec<PathBuf>,
    pub outfile: Option<PathBuf>,
    pub bundle: bool,
    pub write: bool,
    pub tsconfig: Option<PathBuf>,
    pub abs_working_dir: Option<PathBuf>,
}

impl BuildOptions {
    pub fn new(entry_points: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            entry_points: entry_points.into_iter().map(Into::into).collect(),
            bundle: true,
            write: true,
            ..Self::default()
        }
    }

    /// The directory relative paths are resolved against.
    pub fn working_dir(&self) -> PathBuf {
        match &self.abs_working_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Resolves `path` against the working directory unless it is absolute.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir().join(path)
        }
    }
}

// --- Build Results ---

/// A diagnostic produced during a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub path: Option<PathBuf>,
    pub plugin: Option<String>,
}

impl Message {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            path: None,
            plugin: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_plugin(mut self, plugin: impl Into<String>) -> Self {
        self.plugin = Some(plugin.into());
        self
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(plugin) = &self.plugin {
            write!(f, "[plugin {}] ", plugin)?;
        }
        if let Some(path) = &self.path {
            write!(f, "{}: ", path.display())?;
        }
        f.write_str(&self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFile {
    pub path: PathBuf,
    pub contents: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResult {
    pub errors: Vec<Message>,
    pub warnings: Vec<Message>,
    pub output_files: Vec<OutputFile>,
}

impl BuildResult {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

// --- Errors ---

/// Failures that abort a whole build.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("plugin {plugin} failed during setup: {source}")]
    Setup {
        plugin: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("start callback of plugin {plugin} failed: {source}")]
    Start {
        plugin: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("end callback of plugin {plugin} failed: {source}")]
    End {
        plugin: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
