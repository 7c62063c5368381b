//! Filesystem-backed reference host.
//!
//! Walks the import graph from the entry points depth-first, in source order,
//! running plugin callbacks the way a bundler would. The "bundle" is the
//! concatenation of every loaded module; it exists so plugins observe a
//! realistic load sequence, not to produce runnable output.

mod resolve;


pub use resolve::{normalize, FsResolver};

use crate::plugin::*;
use crate::{BuildOptions, BuildResult, HostError, Loader, Message, OutputFile, ResolveKind};
use oxc_allocator::Allocator;
use oxc_ast::ast::Statement;
use oxc_parser::Parser;
use oxc_span::SourceType;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

struct Registered<T> {
    plugin: String,
    filter: Regex,
    callback: T,
}

pub struct FsBuild {
    options: BuildOptions,
    current_plugin: String,
    start: Vec<(String, StartCallback)>,
    end: Vec<(String, EndCallback)>,
    resolvers: Vec<Registered<ResolveCallback>>,
    loaders: Vec<Registered<LoadCallback>>,
    resolver: Arc<FsResolver>,
}

impl FsBuild {
    fn new(options: BuildOptions) -> Self {
        let resolver = Arc::new(FsResolver::new(options.working_dir()));
        Self {
            options,
            current_plugin: String::new(),
            start: Vec::new(),
            end: Vec::new(),
            resolvers: Vec::new(),
            loaders: Vec::new(),
            resolver,
        }
    }

    /// Runs a complete build: plugin setup, start callbacks, traversal,
    /// output, end callbacks.
    ///
    /// Per-module failures are collected into [`BuildResult::errors`]; only
    /// setup, start and end failures abort the build.
    pub fn run(
        options: BuildOptions,
        plugins: &[Arc<dyn Plugin>],
    ) -> Result<BuildResult, HostError> {
        let mut build = FsBuild::new(options);
        for plugin in plugins {
            build.current_plugin = plugin.name().to_string();
            plugin
                .setup(&mut build)
                .map_err(|source| HostError::Setup {
                    plugin: plugin.name().to_string(),
                    source,
                })?;
        }
        build.current_plugin.clear();
        build.execute()
    }

    fn execute(&self) -> Result<BuildResult, HostError> {
        for (plugin, callback) in &self.start {
            callback().map_err(|source| HostError::Start {
                plugin: plugin.clone(),
                source,
            })?;
        }

        let mut result = BuildResult::default();
        let modules = self.traverse(&mut result);

        let mut bundle = String::new();
        for (path, contents) in &modules {
            bundle.push_str(&format!("// {}\n", path.display()));
            bundle.push_str(contents);
            bundle.push('\n');
        }

        let out_path = match &self.options.outfile {
            Some(outfile) => self.options.resolve_path(outfile),
            None => self.options.working_dir().join("out.js"),
        };
        if self.options.write && self.options.outfile.is_some() {
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent).map_err(|source| HostError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            fs::write(&out_path, &bundle).map_err(|source| HostError::Io {
                path: out_path.clone(),
                source,
            })?;
        }
        result.output_files.push(OutputFile {
            path: out_path,
            contents: bundle,
        });

        for error in &result.errors {
            tracing::warn!("{}", error);
        }

        for (plugin, callback) in &self.end {
            callback(&result).map_err(|source| HostError::End {
                plugin: plugin.clone(),
                source,
            })?;
        }

        Ok(result)
    }

    fn traverse(&self, result: &mut BuildResult) -> Vec<(PathBuf, String)> {
        let mut visited = HashSet::new();
        let mut modules = Vec::new();
        let mut stack = Vec::new();

        for entry in self.options.entry_points.iter().rev() {
            let specifier = entry.to_string_lossy();
            match self.resolve_module(&specifier, None, ResolveKind::EntryPoint) {
                Ok(Some(path)) => stack.push(path),
                Ok(None) => {}
                Err(message) => result.errors.push(message),
            }
        }

        while let Some(current_path) = stack.pop() {
            if !visited.insert(current_path.clone()) {
                continue;
            }
            tracing::debug!("Loading {}", current_path.display());

            let (contents, loader) = match self.load_module(&current_path) {
                Ok(loaded) => loaded,
                Err(message) => {
                    result.errors.push(message);
                    continue;
                }
            };

            if self.options.bundle {
                // Unparseable modules are still emitted; whoever consumes
                // them reports the syntax error.
                let imports = match scan_imports(&current_path, &contents, loader) {
                    Ok(imports) => imports,
                    Err(message) => {
                        result.warnings.push(message);
                        Vec::new()
                    }
                };

                let mut resolved = Vec::new();
                for (specifier, kind) in imports {
                    match self.resolve_module(&specifier, Some(&current_path), kind) {
                        Ok(Some(path)) => resolved.push(path),
                        Ok(None) => {}
                        Err(message) => result.errors.push(message),
                    }
                }
                // Reversed so the first import is loaded first.
                stack.extend(resolved.into_iter().rev());
            }

            modules.push((current_path, contents));
        }

        modules
    }

    fn resolve_module(
        &self,
        specifier: &str,
        importer: Option<&Path>,
        kind: ResolveKind,
    ) -> Result<Option<PathBuf>, Message> {
        let resolve_dir = importer
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.options.working_dir());
        let args = OnResolveArgs {
            path: specifier.to_string(),
            importer: importer.map(Path::to_path_buf),
            resolve_dir,
            kind,
        };

        for registered in &self.resolvers {
            if !registered.filter.is_match(specifier) {
                continue;
            }
            match (registered.callback)(&args) {
                Ok(Some(resolved)) if resolved.external => return Ok(None),
                Ok(Some(resolved)) => return Ok(Some(normalize(&resolved.path))),
                Ok(None) => {}
                Err(error) => {
                    return Err(error_message(error, importer, &registered.plugin));
                }
            }
        }

        match self.resolver.resolve(specifier, importer) {
            Some(path) => Ok(Some(path)),
            None if importer.is_some() && FsResolver::is_bare(specifier) => Ok(None),
            None => {
                let message = match kind {
                    ResolveKind::EntryPoint => {
                        Message::new(format!("Could not resolve entry point \"{}\"", specifier))
                    }
                    _ => Message::new(format!("Could not resolve \"{}\"", specifier)),
                };
                Err(match importer {
                    Some(importer) => message.with_path(importer),
                    None => message,
                })
            }
        }
    }

    fn load_module(&self, path: &Path) -> Result<(String, Loader), Message> {
        let args = OnLoadArgs {
            path: path.to_path_buf(),
        };
        let path_str = path.to_string_lossy();

        for registered in &self.loaders {
            if !registered.filter.is_match(&path_str) {
                continue;
            }
            match (registered.callback)(&args) {
                Ok(Some(loaded)) => return Ok((loaded.contents, loaded.loader)),
                Ok(None) => {}
                Err(error) => return Err(error_message(error, Some(path), &registered.plugin)),
            }
        }

        fs::read_to_string(path)
            .map(|contents| (contents, Loader::from_path(path)))
            .map_err(|e| Message::new(format!("Failed to read file: {}", e)).with_path(path))
    }
}

fn error_message(error: anyhow::Error, path: Option<&Path>, plugin: &str) -> Message {
    let message = Message::new(format!("{:#}", error)).with_plugin(plugin);
    match path {
        Some(path) => message.with_path(path),
        None => message,
    }
}

fn source_type_for(loader: Loader) -> SourceType {
    match loader {
        Loader::Ts => SourceType::ts(),
        Loader::Tsx => SourceType::ts().with_jsx(true),
        Loader::Js => SourceType::mjs(),
        Loader::Jsx => SourceType::mjs().with_jsx(true),
    }
}

/// Import and re-export specifiers of a module, in source order. Type-only
/// imports are skipped since they never reach the output.
fn scan_imports(
    path: &Path,
    contents: &str,
    loader: Loader,
) -> Result<Vec<(String, ResolveKind)>, Message> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, contents, source_type_for(loader)).parse();
    if ret.panicked || !ret.errors.is_empty() {
        let details: Vec<String> = ret.errors.iter().map(|e| e.to_string()).collect();
        return Err(
            Message::new(format!("Cannot scan imports: {}", details.join("; "))).with_path(path),
        );
    }

    let mut imports = Vec::new();
    for statement in &ret.program.body {
        match statement {
            Statement::ImportDeclaration(decl) if !decl.import_kind.is_type() => {
                imports.push((decl.source.value.to_string(), ResolveKind::ImportStatement));
            }
            Statement::ExportNamedDeclaration(decl) => {
                if let Some(source) = &decl.source {
                    imports.push((source.value.to_string(), ResolveKind::ExportFrom));
                }
            }
            Statement::ExportAllDeclaration(decl) => {
                imports.push((decl.source.value.to_string(), ResolveKind::ExportFrom));
            }
            _ => {}
        }
    }
    Ok(imports)
}

impl PluginBuild for FsBuild {
    fn initial_options(&self) -> &BuildOptions {
        &self.options
    }

    fn on_start(&mut self, callback: StartCallback) {
        self.start.push((self.current_plugin.clone(), callback));
    }

    fn on_end(&mut self, callback: EndCallback) {
        self.end.push((self.current_plugin.clone(), callback));
    }

    fn on_resolve(&mut self, filter: Regex, callback: ResolveCallback) {
        self.resolvers.push(Registered {
            plugin: self.current_plugin.clone(),
            filter,
            callback,
        });
    }

    fn on_load(&mut self, filter: Regex, callback: LoadCallback) {
        self.loaders.push(Registered {
            plugin: self.current_plugin.clone(),
            filter,
            callback,
        });
    }

    fn resolver(&self) -> Arc<dyn Resolve> {
        self.resolver.clone()
    }

    fn build(
        &self,
        options: BuildOptions,
        plugins: Vec<Arc<dyn Plugin>>,
    ) -> Result<BuildResult, HostError> {
        FsBuild::run(options, &plugins)
    }
}
