//! Declaration file discovery.
//!
//! A satellite build walks the same dependency graph as the real one with a
//! single observing plugin and discards its output. Every module whose path
//! matches the marker filter is a declaration file; every module importing
//! one is recorded as its importer.

use crate::error::TypeSchemaError;
use host::{BuildOptions, Plugin, PluginBuild};
use indexmap::{IndexMap, IndexSet};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Matches the reserved `.dec` marker, e.g. `model.dec.ts`.
pub static DEFAULT_DECLARATION_FILTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.dec").expect("declaration filter is a valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationFile {
    pub path: PathBuf,
    pub importers: IndexSet<PathBuf>,
}

/// Declaration files in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationFiles {
    files: IndexMap<PathBuf, DeclarationFile>,
}

impl DeclarationFiles {
    pub fn get(&self, path: &Path) -> Option<&DeclarationFile> {
        self.files.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeclarationFile> {
        self.files.values()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Every module importing at least one declaration file.
    pub fn importers(&self) -> IndexSet<&Path> {
        self.iter()
            .flat_map(|file| file.importers.iter().map(PathBuf::as_path))
            .collect()
    }
}

#[derive(Default)]
struct Observed {
    loaded: IndexSet<PathBuf>,
    importers: IndexMap<PathBuf, IndexSet<PathBuf>>,
}

struct DeclarationObserver {
    filter: Regex,
    observed: Arc<Mutex<Observed>>,
}

impl Plugin for DeclarationObserver {
    fn name(&self) -> &str {
        "type-schema-declarations"
    }

    fn setup(&self, build: &mut dyn PluginBuild) -> anyhow::Result<()> {
        let resolver = build.resolver();
        let observed = self.observed.clone();
        build.on_resolve(
            self.filter.clone(),
            Box::new(move |args| {
                let Some(importer) = &args.importer else {
                    return Ok(None);
                };
                if let Some(resolved) = resolver.resolve(&args.path, Some(importer.as_path())) {
                    observed
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .importers
                        .entry(resolved)
                        .or_default()
                        .insert(importer.clone());
                }
                Ok(None)
            }),
        );

        let observed = self.observed.clone();
        build.on_load(
            self.filter.clone(),
            Box::new(move |args| {
                observed
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .loaded
                    .insert(args.path.clone());
                Ok(None)
            }),
        );
        Ok(())
    }
}

pub struct DeclarationResolver {
    filter: Regex,
}

impl Default for DeclarationResolver {
    fn default() -> Self {
        Self::new(DEFAULT_DECLARATION_FILTER.clone())
    }
}

impl DeclarationResolver {
    pub fn new(filter: Regex) -> Self {
        Self { filter }
    }

    /// Runs the satellite build from the entry points of `build` and blocks
    /// until it is complete. Any error in the traversal is fatal.
    pub fn resolve(&self, build: &dyn PluginBuild) -> Result<DeclarationFiles, TypeSchemaError> {
        let initial = build.initial_options();
        let options = BuildOptions {
            entry_points: initial.entry_points.clone(),
            outfile: None,
            bundle: true,
            write: false,
            tsconfig: initial.tsconfig.clone(),
            abs_working_dir: initial.abs_working_dir.clone(),
        };

        let observed = Arc::new(Mutex::new(Observed::default()));
        let observer = Arc::new(DeclarationObserver {
            filter: self.filter.clone(),
            observed: observed.clone(),
        });

        let result = build.build(options, vec![observer])?;
        if !result.errors.is_empty() {
            return Err(TypeSchemaError::Traversal {
                messages: result.errors,
            });
        }

        let mut observed = observed.lock().unwrap_or_else(PoisonError::into_inner);
        let observed = std::mem::take(&mut *observed);
        let files = observed
            .loaded
            .into_iter()
            .map(|path| {
                let importers = observed.importers.get(&path).cloned().unwrap_or_default();
                (path.clone(), DeclarationFile { path, importers })
            })
            .collect();

        Ok(DeclarationFiles { files })
    }
}
