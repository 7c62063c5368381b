// Plugin Protocol
//
// Callback registration surface shared by every host.

use crate::{BuildOptions, BuildResult, HostError, Loader, ResolveKind};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Arguments passed to a resolve callback.
#[derive(Debug, Clone)]
pub struct OnResolveArgs {
    /// The specifier as written in the importing module.
    pub path: String,
    /// The importing module; `None` for entry points.
    pub importer: Option<PathBuf>,
    /// Directory relative specifiers are resolved from.
    pub resolve_dir: PathBuf,
    pub kind: ResolveKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnResolveResult {
    pub path: PathBuf,
    /// External modules are neither loaded nor traversed.
    pub external: bool,
}

/// Arguments passed to a load callback.
#[derive(Debug, Clone)]
pub struct OnLoadArgs {
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnLoadResult {
    pub contents: String,
    pub loader: Loader,
}

pub type StartCallback = Box<dyn Fn() -> anyhow::Result<()> + Send + Sync>;
pub type EndCallback = Box<dyn Fn(&BuildResult) -> anyhow::Result<()> + Send + Sync>;
pub type ResolveCallback =
    Box<dyn Fn(&OnResolveArgs) -> anyhow::Result<Option<OnResolveResult>> + Send + Sync>;
pub type LoadCallback =
    Box<dyn Fn(&OnLoadArgs) -> anyhow::Result<Option<OnLoadResult>> + Send + Sync>;

/// The host's own module resolution, exposed to plugins.
pub trait Resolve: Send + Sync {
    /// Resolves `specifier` as imported from `importer` (or as an entry point).
    /// Returns `None` for external or unresolvable modules.
    fn resolve(&self, specifier: &str, importer: Option<&Path>) -> Option<PathBuf>;
}

/// A build plugin. `setup` runs once per build, before any module is loaded.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn setup(&self, build: &mut dyn PluginBuild) -> anyhow::Result<()>;
}

/// What a host offers to plugins during setup.
pub trait PluginBuild {
    /// Options the current build was started with.
    fn initial_options(&self) -> &BuildOptions;

    fn on_start(&mut self, callback: StartCallback);

    fn on_end(&mut self, callback: EndCallback);

    /// Registers a callback for specifiers matching `filter`.
    fn on_resolve(&mut self, filter: Regex, callback: ResolveCallback);

    /// Registers a callback for resolved paths matching `filter`.
    fn on_load(&mut self, filter: Regex, callback: LoadCallback);

    /// The host resolver, for plugins that need resolved paths inside callbacks.
    fn resolver(&self) -> Arc<dyn Resolve>;

    /// Runs a secondary build to completion with its own options and plugins.
    fn build(
        &self,
        options: BuildOptions,
        plugins: Vec<Arc<dyn Plugin>>,
    ) -> Result<BuildResult, HostError>;
}
