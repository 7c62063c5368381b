use crate::plugin::Resolve;
use std::path::{Component, Path, PathBuf};

/// Relative-path resolution against the filesystem. Bare specifiers are
/// treated as external and never resolved.
#[derive(Debug, Clone)]
pub struct FsResolver {
    working_dir: PathBuf,
}

impl FsResolver {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }

    pub fn is_bare(specifier: &str) -> bool {
        !(specifier.starts_with('.') || Path::new(specifier).is_absolute())
    }

    fn candidates(base: &Path) -> Vec<PathBuf> {
        vec![
            base.to_path_buf(),
            append_extension(base, "ts"),
            append_extension(base, "tsx"),
            append_extension(base, "js"),
            base.join("index.ts"),
            base.join("index.tsx"),
            base.join("index.js"),
        ]
    }
}

impl Resolve for FsResolver {
    fn resolve(&self, specifier: &str, importer: Option<&Path>) -> Option<PathBuf> {
        let base = match importer {
            // Entry points are resolved from the working directory, bare or not.
            None => self.working_dir.join(specifier),
            Some(_) if Self::is_bare(specifier) => return None,
            Some(importer) => importer
                .parent()
                .unwrap_or(&self.working_dir)
                .join(specifier),
        };
        let base = normalize(&base);

        Self::candidates(&base)
            .into_iter()
            .find(|candidate| candidate.is_file())
    }
}

/// `foo.dec` + `ts` is `foo.dec.ts`, unlike `Path::with_extension`.
fn append_extension(base: &Path, extension: &str) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Lexically removes `.` and `..` components.
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_removes_dot_segments() {
        assert_eq!(
            normalize(Path::new("/a/b/./c/../d.ts")),
            PathBuf::from("/a/b/d.ts")
        );
    }

    #[test]
    fn test_append_extension_keeps_inner_dots() {
        assert_eq!(
            append_extension(Path::new("/src/model.dec"), "ts"),
            PathBuf::from("/src/model.dec.ts")
        );
    }

    #[test]
    fn test_bare_specifiers() {
        assert!(FsResolver::is_bare("lodash"));
        assert!(FsResolver::is_bare("@scope/pkg"));
        assert!(!FsResolver::is_bare("./local"));
        assert!(!FsResolver::is_bare("../up"));
    }
}
