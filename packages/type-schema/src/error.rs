//! Error types, one enum per concern.

use std::io;
use std::path::PathBuf;

/// Problems with the compiler configuration file. All of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot find tsconfig.json at {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// Failures of a single source file. They never affect other files.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("{} is not part of the compiler configuration", .0.display())]
    NotInProject(PathBuf),
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse {}: {}", .path.display(), .diagnostics.join("; "))]
    Parse {
        path: PathBuf,
        diagnostics: Vec<String>,
    },
    #[error("a previous scope over {} panicked", .0.display())]
    Poisoned(PathBuf),
}

#[derive(Debug, thiserror::Error)]
pub enum TypeSchemaError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Project(#[from] ProjectError),
    #[error(transparent)]
    Host(#[from] host::HostError),
    #[error("declaration file traversal failed: {}", join_messages(.messages))]
    Traversal { messages: Vec<host::Message> },
    #[error("{hook} hook failed")]
    Hook {
        hook: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

fn join_messages(messages: &[host::Message]) -> String {
    messages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
