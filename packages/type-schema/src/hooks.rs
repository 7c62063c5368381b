use crate::metadata::ClassMetadata;
use host::{BuildOptions, BuildResult};

/// Consumer of extracted metadata.
///
/// `on_progress` is called once per tagged class, in source order within a
/// file and in host load order across files. An error from `on_progress`
/// fails the load of the current file only; errors from `on_start` and
/// `on_end` fail the build.
pub trait HookSink: Send + Sync {
    fn on_start(&self, _options: &BuildOptions) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_progress(&self, options: &BuildOptions, metadata: &ClassMetadata) -> anyhow::Result<()>;

    fn on_end(&self, _options: &BuildOptions, _result: &BuildResult) -> anyhow::Result<()> {
        Ok(())
    }
}

impl<F> HookSink for F
where
    F: Fn(&BuildOptions, &ClassMetadata) -> anyhow::Result<()> + Send + Sync,
{
    fn on_progress(&self, options: &BuildOptions, metadata: &ClassMetadata) -> anyhow::Result<()> {
        self(options, metadata)
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl HookSink for NoopHooks {
    fn on_progress(&self, _options: &BuildOptions, _metadata: &ClassMetadata) -> anyhow::Result<()> {
        Ok(())
    }
}
