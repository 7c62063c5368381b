//! Source cache shared by every load event of a build.
//!
//! Committed state is plain text: one immutable [`SourceFile`] snapshot per
//! path. Trees only exist inside [`SourceProject::scoped_parse`], each in its
//! own arena that is dropped when the scope ends, so nothing created or
//! mutated by one load is visible to another and the retained size is bounded
//! by the snapshots alone.


use crate::config::CompilerConfig;
use crate::error::ProjectError;
use host::fs_build::normalize;
use oxc_allocator::Allocator;
use oxc_ast::ast::Program;
use oxc_parser::Parser;
use oxc_span::{SourceType, Span};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Committed text of one file.
#[derive(Debug)]
pub struct SourceFile {
    path: PathBuf,
    text: String,
    source_type: SourceType,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>, source_type: SourceType) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
            source_type,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source_type(&self) -> SourceType {
        self.source_type
    }

    /// Source text covered by `span`.
    pub fn slice(&self, span: Span) -> &str {
        self.text
            .get(span.start as usize..span.end as usize)
            .unwrap_or_default()
    }
}

/// A checked-out working set: the parsed tree of one file, living in an
/// arena owned by the enclosing [`SourceProject::scoped_parse`] call.
pub struct Scope<'a> {
    pub file: &'a SourceFile,
    pub program: Program<'a>,
}

/// Decrements the live scope count however the scope ends.
struct ScopeTicket<'p>(&'p AtomicUsize);

impl<'p> ScopeTicket<'p> {
    fn new(counter: &'p AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for ScopeTicket<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct SourceProject {
    config: CompilerConfig,
    /// Snapshots served by `get_or_parse`; scopes always reread from disk.
    files: RwLock<HashMap<PathBuf, Arc<SourceFile>>>,
    gates: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
    live_scopes: AtomicUsize,
}

impl SourceProject {
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            config,
            files: RwLock::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
            live_scopes: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Returns the committed snapshot of `path`, registering it first if the
    /// compiler configuration governs it.
    pub fn get_or_parse(&self, path: &Path) -> Result<Arc<SourceFile>, ProjectError> {
        let path = normalize(path);
        if let Some(file) = self.cached(&path)? {
            return Ok(file);
        }
        if !self.config.contains(&path) {
            return Err(ProjectError::NotInProject(path));
        }
        self.add_source_file_at_path(&path)
    }

    /// Reads `path` from disk and commits it, replacing a stale snapshot.
    pub fn add_source_file_at_path(&self, path: &Path) -> Result<Arc<SourceFile>, ProjectError> {
        let path = normalize(path);
        let text = fs::read_to_string(&path).map_err(|source| ProjectError::Read {
            path: path.clone(),
            source,
        })?;
        self.commit(path, text)
    }

    /// Parses the committed text of `path` into a fresh arena and runs `body`
    /// on it. The arena, and with it every node `body` created or changed, is
    /// dropped before this returns.
    ///
    /// Scopes over the same path run one at a time; scopes over different
    /// paths share nothing.
    pub fn scoped_parse<R>(
        &self,
        path: &Path,
        body: impl for<'a> FnOnce(&mut Scope<'a>) -> R,
    ) -> Result<R, ProjectError> {
        let path = normalize(path);
        let gate = self.gate(&path)?;
        let result = {
            // The gate guards no data, so a panic in an earlier scope leaves
            // nothing inconsistent behind.
            let _guard = gate.lock().unwrap_or_else(PoisonError::into_inner);
            self.parse_in_scope(&path, body)
        };
        self.release_gate(&path, gate);
        result
    }

    fn parse_in_scope<R>(
        &self,
        path: &Path,
        body: impl for<'a> FnOnce(&mut Scope<'a>) -> R,
    ) -> Result<R, ProjectError> {
        let file = self.add_source_file_at_path(path)?;
        let _ticket = ScopeTicket::new(&self.live_scopes);
        let allocator = Allocator::default();

        let ret = Parser::new(&allocator, file.text(), file.source_type()).parse();
        if ret.panicked || !ret.errors.is_empty() {
            return Err(ProjectError::Parse {
                path: path.to_path_buf(),
                diagnostics: ret.errors.iter().map(|e| e.to_string()).collect(),
            });
        }

        tracing::debug!("Scoped parse of {}", path.display());
        let mut scope = Scope {
            file: file.as_ref(),
            program: ret.program,
        };
        Ok(body(&mut scope))
    }

    /// Number of scopes currently checked out.
    pub fn live_scopes(&self) -> usize {
        self.live_scopes.load(Ordering::SeqCst)
    }

    /// Number of committed files.
    pub fn len(&self) -> usize {
        self.files.read().map(|files| files.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total size of the committed snapshots.
    pub fn retained_bytes(&self) -> usize {
        self.files
            .read()
            .map(|files| files.values().map(|f| f.text.len()).sum())
            .unwrap_or(0)
    }

    fn cached(&self, path: &Path) -> Result<Option<Arc<SourceFile>>, ProjectError> {
        let files = self
            .files
            .read()
            .map_err(|_| ProjectError::Poisoned(path.to_path_buf()))?;
        Ok(files.get(path).cloned())
    }

    fn commit(&self, path: PathBuf, text: String) -> Result<Arc<SourceFile>, ProjectError> {
        let mut files = self
            .files
            .write()
            .map_err(|_| ProjectError::Poisoned(path.clone()))?;
        if let Some(existing) = files.get(&path) {
            if existing.text == text {
                return Ok(existing.clone());
            }
        }
        let source_type = self.config.source_type(&path);
        let file = Arc::new(SourceFile::new(path.clone(), text, source_type));
        files.insert(path, file.clone());
        Ok(file)
    }

    fn gate(&self, path: &Path) -> Result<Arc<Mutex<()>>, ProjectError> {
        let mut gates = self
            .gates
            .lock()
            .map_err(|_| ProjectError::Poisoned(path.to_path_buf()))?;
        Ok(gates.entry(path.to_path_buf()).or_default().clone())
    }

    /// Drops the gate of `path` once no other scope holds or waits on it.
    fn release_gate(&self, path: &Path, gate: Arc<Mutex<()>>) {
        drop(gate);
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        if gates.get(path).is_some_and(|gate| Arc::strong_count(gate) == 1) {
            gates.remove(path);
        }
    }

    /// Number of paths with a scope running or waiting.
    pub fn gated_paths(&self) -> usize {
        self.gates.lock().map(|gates| gates.len()).unwrap_or(0)
    }
}
