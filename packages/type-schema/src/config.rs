//! Compiler configuration (`tsconfig.json`).
//!
//! Only the parts that decide which files belong to the project and how they
//! are parsed are read; everything else in the file is ignored.

use crate::error::ConfigError;
use host::fs_build::normalize;
use host::BuildOptions;
use oxc_span::SourceType;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompilerOptions {
    pub experimental_decorators: Option<bool>,
    pub jsx: Option<String>,
    pub root_dir: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TsConfigFile {
    compiler_options: CompilerOptions,
    files: Option<Vec<String>>,
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
}

/// Parsed `tsconfig.json`.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Location of the configuration file.
    pub path: PathBuf,
    /// Directory patterns and file lists are relative to.
    pub base_dir: PathBuf,
    pub options: CompilerOptions,
    files: Vec<PathBuf>,
    include: Vec<glob::Pattern>,
    exclude: Vec<glob::Pattern>,
}

impl CompilerConfig {
    pub const FILE_NAME: &'static str = "tsconfig.json";

    /// Finds the configuration governing a build: the `tsconfig` build
    /// option when set, otherwise `tsconfig.json` in the working directory.
    pub fn discover(options: &BuildOptions) -> Result<Self, ConfigError> {
        let path = match &options.tsconfig {
            Some(tsconfig) => options.resolve_path(tsconfig),
            None => options.working_dir().join(Self::FILE_NAME),
        };
        Self::load(&path)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(path, &content)
    }

    /// Parses configuration text as if it had been read from `path`.
    pub fn from_json(path: &Path, content: &str) -> Result<Self, ConfigError> {
        let content = strip_json_comments(content);
        let raw: TsConfigFile =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let path = normalize(path);
        let base_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();

        let files = raw
            .files
            .unwrap_or_default()
            .iter()
            .map(|file| normalize(&base_dir.join(file)))
            .collect();
        let include = raw.include.unwrap_or_else(|| vec!["**/*".to_string()]);
        let exclude = raw
            .exclude
            .unwrap_or_else(|| vec!["**/node_modules/**".to_string()]);

        Ok(Self {
            include: compile_patterns(&base_dir, &include)?,
            exclude: compile_patterns(&base_dir, &exclude)?,
            path,
            base_dir,
            options: raw.compiler_options,
            files,
        })
    }

    /// Whether `path` is a source file governed by this configuration.
    pub fn contains(&self, path: &Path) -> bool {
        let path = normalize(path);
        if self.files.contains(&path) {
            return true;
        }
        if !is_source_file(&path) {
            return false;
        }
        self.include.iter().any(|p| p.matches_path(&path))
            && !self.exclude.iter().any(|p| p.matches_path(&path))
    }

    /// How files are parsed. TypeScript sources accept JSX only as `.tsx`;
    /// script sources accept it whenever `jsx` is configured.
    pub fn source_type(&self, path: &Path) -> SourceType {
        let source_type = SourceType::from_path(path).unwrap_or_else(|_| SourceType::ts());
        if self.options.jsx.is_some() && !source_type.is_typescript() {
            source_type.with_jsx(true)
        } else {
            source_type
        }
    }
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| SOURCE_EXTENSIONS.contains(&ext))
}

fn compile_patterns(base_dir: &Path, patterns: &[String]) -> Result<Vec<glob::Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            // A bare directory name includes everything below it.
            let is_directory = !pattern.contains('*') && Path::new(pattern).extension().is_none();
            let full = if is_directory {
                base_dir.join(pattern).join("**/*")
            } else {
                base_dir.join(pattern)
            };
            let full = normalize(&full);
            glob::Pattern::new(&full.to_string_lossy()).map_err(|source| {
                ConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                }
            })
        })
        .collect()
}

/// Removes `//` and `/* */` comments and trailing commas, which tsconfig
/// files allow but JSON does not.
fn strip_json_comments(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            result.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        result.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                result.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        result.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            ',' => {
                let rest: String = chars.clone().collect();
                let next_significant = rest.trim_start().chars().next();
                if !matches!(next_significant, Some('}') | Some(']')) {
                    result.push(c);
                }
            }
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_comments() {
        let input = r#"{
    // line comment
    "compilerOptions": { /* block */ "jsx": "react", },
    "include": ["src/**/*.ts", "http://not-a-comment"],
}"#;
        let value: serde_json::Value =
            serde_json::from_str(&strip_json_comments(input)).unwrap();
        assert_eq!(value["compilerOptions"]["jsx"], "react");
        assert_eq!(value["include"][1], "http://not-a-comment");
    }

    #[test]
    fn test_default_include_covers_sources_only() {
        let config = CompilerConfig::from_json(Path::new("/proj/tsconfig.json"), "{}").unwrap();
        assert!(config.contains(Path::new("/proj/src/model.ts")));
        assert!(config.contains(Path::new("/proj/index.tsx")));
        assert!(!config.contains(Path::new("/proj/readme.md")));
        assert!(!config.contains(Path::new("/proj/node_modules/lib/index.ts")));
        assert!(!config.contains(Path::new("/elsewhere/model.ts")));
    }

    #[test]
    fn test_include_and_exclude_patterns() {
        let config = CompilerConfig::from_json(
            Path::new("/proj/tsconfig.json"),
            r#"{ "include": ["src"], "exclude": ["src/**/*.spec.ts"] }"#,
        )
        .unwrap();
        assert!(config.contains(Path::new("/proj/src/a/b.ts")));
        assert!(!config.contains(Path::new("/proj/src/a/b.spec.ts")));
        assert!(!config.contains(Path::new("/proj/test/b.ts")));
    }

    #[test]
    fn test_explicit_files() {
        let config = CompilerConfig::from_json(
            Path::new("/proj/tsconfig.json"),
            r#"{ "files": ["./main.ts"], "include": [] }"#,
        )
        .unwrap();
        assert!(config.contains(Path::new("/proj/main.ts")));
        assert!(!config.contains(Path::new("/proj/other.ts")));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = CompilerConfig::load(Path::new("/definitely/not/here/tsconfig.json")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_source_type_follows_extension_and_jsx_option() {
        let config = CompilerConfig::from_json(
            Path::new("/proj/tsconfig.json"),
            r#"{ "compilerOptions": { "jsx": "preserve" } }"#,
        )
        .unwrap();
        assert!(!config.source_type(Path::new("/proj/a.ts")).is_jsx());
        assert!(config.source_type(Path::new("/proj/a.tsx")).is_jsx());
        assert!(config.source_type(Path::new("/proj/a.js")).is_jsx());
        assert!(config.source_type(Path::new("/proj/a.ts")).is_typescript());
    }
}
