//! The `TypeSchema` build plugin.
//!
//! Setup is a hard barrier: the compiler configuration is loaded, the
//! declaration files are discovered through a satellite build and the
//! decorator registry is built before any load callback is registered.
//! Every load then runs extraction, emission and optional stripping inside
//! one scoped parse of the file.

use crate::config::CompilerConfig;
use crate::declaration::{DeclarationResolver, DEFAULT_DECLARATION_FILTER};
use crate::error::TypeSchemaError;
use crate::extractor::MetadataExtractor;
use crate::hooks::{HookSink, NoopHooks};
use crate::project::SourceProject;
use crate::registry::DecoratorRegistry;
use crate::strip::DecoratorStripper;
use host::{BuildOptions, Loader, OnLoadResult, Plugin, PluginBuild};
use once_cell::sync::Lazy;
use oxc_codegen::Codegen;
use regex::Regex;
use std::path::Path;
use std::sync::Arc;

/// TypeScript sources, with or without JSX.
pub static DEFAULT_LOAD_FILTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.tsx?$").expect("load filter is a valid regex"));

#[derive(Clone)]
pub struct TypeSchemaOptions {
    pub hooks: Arc<dyn HookSink>,
    /// Paths of declaration files, see [`DEFAULT_DECLARATION_FILTER`].
    pub declaration_file_filter: Regex,
    /// Paths the plugin processes on load.
    pub load_filter: Regex,
    /// Remove recognized decorators from loaded files.
    pub strip_decorators: bool,
}

impl Default for TypeSchemaOptions {
    fn default() -> Self {
        Self::with_hooks(Arc::new(NoopHooks))
    }
}

impl TypeSchemaOptions {
    pub fn new(hooks: impl HookSink + 'static) -> Self {
        Self::with_hooks(Arc::new(hooks))
    }

    pub fn with_hooks(hooks: Arc<dyn HookSink>) -> Self {
        Self {
            hooks,
            declaration_file_filter: DEFAULT_DECLARATION_FILTER.clone(),
            load_filter: DEFAULT_LOAD_FILTER.clone(),
            strip_decorators: false,
        }
    }

    pub fn declaration_file_filter(mut self, filter: Regex) -> Self {
        self.declaration_file_filter = filter;
        self
    }

    pub fn load_filter(mut self, filter: Regex) -> Self {
        self.load_filter = filter;
        self
    }

    pub fn strip_decorators(mut self, strip: bool) -> Self {
        self.strip_decorators = strip;
        self
    }
}

pub struct TypeSchema {
    options: TypeSchemaOptions,
}

impl TypeSchema {
    pub const NAME: &'static str = "TypeSchema";

    pub fn new(options: TypeSchemaOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TypeSchemaOptions {
        &self.options
    }
}

impl Plugin for TypeSchema {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn setup(&self, build: &mut dyn PluginBuild) -> anyhow::Result<()> {
        let options = build.initial_options().clone();
        let config = CompilerConfig::discover(&options).map_err(TypeSchemaError::from)?;
        tracing::debug!("Using compiler configuration {}", config.path.display());

        let hooks = self.options.hooks.clone();
        {
            let hooks = hooks.clone();
            let options = options.clone();
            build.on_start(Box::new(move || {
                hooks.on_start(&options).map_err(|source| {
                    anyhow::Error::from(TypeSchemaError::Hook {
                        hook: "on_start",
                        source,
                    })
                })
            }));
        }
        {
            let hooks = hooks.clone();
            let options = options.clone();
            build.on_end(Box::new(move |result| {
                hooks.on_end(&options, result).map_err(|source| {
                    anyhow::Error::from(TypeSchemaError::Hook {
                        hook: "on_end",
                        source,
                    })
                })
            }));
        }

        let declarations =
            DeclarationResolver::new(self.options.declaration_file_filter.clone()).resolve(&*build)?;
        tracing::info!("Found {} declaration file(s)", declarations.len());
        for file in declarations.iter() {
            tracing::debug!(
                "Declaration file {} imported by {} file(s)",
                file.path.display(),
                file.importers.len()
            );
        }

        let project = SourceProject::new(config);
        let registry = DecoratorRegistry::build(&project, &declarations).map_err(TypeSchemaError::from)?;
        tracing::info!(
            "Recognizing {} decorator(s): {}",
            registry.len(),
            registry.iter().collect::<Vec<_>>().join(", ")
        );

        let pass = Arc::new(SchemaPass {
            project,
            registry: Arc::new(registry),
            hooks,
            options,
            strip_decorators: self.options.strip_decorators,
        });
        build.on_load(
            self.options.load_filter.clone(),
            Box::new(move |args| pass.load(&args.path).map_err(anyhow::Error::from)),
        );
        Ok(())
    }
}

/// Per-build state shared by every load callback.
struct SchemaPass {
    project: SourceProject,
    registry: Arc<DecoratorRegistry>,
    hooks: Arc<dyn HookSink>,
    options: BuildOptions,
    strip_decorators: bool,
}

impl SchemaPass {
    fn load(&self, path: &Path) -> Result<Option<OnLoadResult>, TypeSchemaError> {
        let contents = self.project.scoped_parse(
            path,
            |scope| -> Result<Option<String>, TypeSchemaError> {
                let classes = MetadataExtractor::new(&self.registry).extract(scope.file, &scope.program);
                for class in &classes {
                    tracing::debug!("Emitting {} from {}", class.name(), path.display());
                    self.hooks
                        .on_progress(&self.options, class)
                        .map_err(|source| TypeSchemaError::Hook {
                            hook: "on_progress",
                            source,
                        })?;
                }

                if !self.strip_decorators {
                    return Ok(None);
                }
                let removed = DecoratorStripper::new(&self.registry).strip_program(&mut scope.program);
                if removed == 0 {
                    return Ok(Some(scope.file.text().to_string()));
                }
                tracing::debug!("Stripped {} decorator(s) from {}", removed, path.display());
                Ok(Some(Codegen::new().build(&scope.program).code))
            },
        )??;

        Ok(contents.map(|contents| OnLoadResult {
            contents,
            loader: Loader::from_path(path),
        }))
    }
}
