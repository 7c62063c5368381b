//! TypeSchema Plugin Tests
//!
//! Runs the plugin inside the filesystem host against small TypeScript
//! projects written to temporary directories.

use host::{BuildOptions, BuildResult, FsBuild, HostError, Plugin, PluginBuild};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use type_schema::{
    ClassMetadata, DeclarationFiles, DeclarationResolver, HookSink, TypeSchema, TypeSchemaOptions,
};

const DECORATORS: &str = r#"export const cls = (name: string) => (target: any) => target;
export const prop = (desc: string) => (target: any, key: string) => {};
export function method() {
    return (target: any, key: string) => {};
}
"#;

const MODELS: &str = r#"import { cls, prop, method } from "./decorators.dec";

@cls("Foo")
export class Foo {
    @prop("bar:string") a: number;
    b: string;

    @method()
    run(x: string, y?: number): boolean {
        return true;
    }
}

export class Untagged {
    @prop("c") c: number;
}
"#;

const INDEX: &str = r#"import { Foo } from "./models";
export { Foo };
"#;

fn workspace(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, contents) in files {
        let path = dir.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }
    dir
}

fn scenario(extra: &[(&str, &str)]) -> TempDir {
    let mut files = vec![
        ("tsconfig.json", "{}"),
        ("decorators.dec.ts", DECORATORS),
        ("models.ts", MODELS),
        ("index.ts", INDEX),
    ];
    files.extend_from_slice(extra);
    workspace(&files)
}

fn options(dir: &TempDir, entry: &str) -> BuildOptions {
    BuildOptions {
        entry_points: vec![PathBuf::from(entry)],
        bundle: true,
        write: false,
        abs_working_dir: Some(dir.path().to_path_buf()),
        ..BuildOptions::default()
    }
}

fn run(options: BuildOptions, schema: TypeSchema) -> Result<BuildResult, HostError> {
    let plugin: Arc<dyn Plugin> = Arc::new(schema);
    FsBuild::run(options, &[plugin])
}

#[derive(Default)]
struct Recorder {
    starts: AtomicUsize,
    ends: AtomicUsize,
    classes: Mutex<Vec<ClassMetadata>>,
    fail_start: bool,
    fail_end: bool,
    fail_on_class: Option<&'static str>,
}

impl Recorder {
    fn names(&self) -> Vec<String> {
        self.classes
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }
}

impl HookSink for Recorder {
    fn on_start(&self, _options: &BuildOptions) -> anyhow::Result<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if self.fail_start {
            anyhow::bail!("not ready");
        }
        Ok(())
    }

    fn on_progress(&self, _options: &BuildOptions, metadata: &ClassMetadata) -> anyhow::Result<()> {
        if self.fail_on_class == Some(metadata.name()) {
            anyhow::bail!("refusing {}", metadata.name());
        }
        self.classes.lock().unwrap().push(metadata.clone());
        Ok(())
    }

    fn on_end(&self, _options: &BuildOptions, _result: &BuildResult) -> anyhow::Result<()> {
        self.ends.fetch_add(1, Ordering::SeqCst);
        if self.fail_end {
            anyhow::bail!("cannot flush");
        }
        Ok(())
    }
}

fn recorded(recorder: &Arc<Recorder>) -> TypeSchema {
    TypeSchema::new(TypeSchemaOptions::with_hooks(recorder.clone()))
}

#[test]
fn should_emit_only_tagged_classes_with_decorated_members() {
    let dir = scenario(&[]);
    let recorder = Arc::new(Recorder::default());

    let result = run(options(&dir, "index.ts"), recorded(&recorder)).unwrap();
    assert!(result.is_success(), "errors: {:?}", result.errors);

    let classes = recorder.classes.lock().unwrap();
    assert_eq!(classes.len(), 1);
    let foo = &classes[0];
    assert_eq!(foo.name(), "Foo");
    assert_eq!(foo.target.path, dir.path().join("models.ts"));
    assert!(foo.decorator("cls").is_some());

    let props: Vec<_> = foo
        .properties
        .iter()
        .map(|p| (p.name.as_str(), p.type_text.as_deref()))
        .collect();
    assert_eq!(props, vec![("a", Some("number"))]);

    assert_eq!(foo.methods.len(), 1);
    let params: Vec<_> = foo.methods[0]
        .parameters
        .iter()
        .map(|p| p.type_text.as_deref())
        .collect();
    assert_eq!(params, vec![Some("string"), Some("number")]);
    assert_eq!(foo.methods[0].return_type.as_deref(), Some("boolean"));

    assert_eq!(recorder.starts.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.ends.load(Ordering::SeqCst), 1);
}

#[test]
fn should_match_decorators_by_exported_name_across_the_build() {
    let dir = scenario(&[(
        "local.ts",
        r#"import "./models";
const cls = (name: string) => (target: any) => target;

@cls("Local")
export class Local {}
"#,
    )]);
    let recorder = Arc::new(Recorder::default());

    let result = run(options(&dir, "local.ts"), recorded(&recorder)).unwrap();
    assert!(result.is_success(), "errors: {:?}", result.errors);
    assert_eq!(recorder.names(), vec!["Local", "Foo"]);
}

#[test]
fn should_ignore_decorators_not_exported_by_declaration_files() {
    let dir = workspace(&[
        ("tsconfig.json", "{}"),
        ("decorators.dec.ts", "export const other = () => () => {};\n"),
        (
            "index.ts",
            r#"import { other } from "./decorators.dec";
const cls = (name: string) => (target: any) => target;

@cls("Local")
export class Local {}
"#,
        ),
    ]);
    let recorder = Arc::new(Recorder::default());

    let result = run(options(&dir, "index.ts"), recorded(&recorder)).unwrap();
    assert!(result.is_success(), "errors: {:?}", result.errors);
    assert!(recorder.names().is_empty());
}

#[test]
fn should_deliver_classes_in_source_and_load_order() {
    let dir = workspace(&[
        ("tsconfig.json", "{}"),
        ("decorators.dec.ts", DECORATORS),
        (
            "index.ts",
            r#"import { cls } from "./decorators.dec";
import "./second";

@cls("A") export class A {}
@cls("B") export class B {}
"#,
        ),
        (
            "second.ts",
            r#"import { cls } from "./decorators.dec";

@cls("C") export class C {}
"#,
        ),
    ]);
    let recorder = Arc::new(Recorder::default());

    run(options(&dir, "index.ts"), recorded(&recorder)).unwrap();
    assert_eq!(recorder.names(), vec!["A", "B", "C"]);
}

#[test]
fn should_produce_identical_metadata_across_builds() {
    let dir = scenario(&[]);
    let first = Arc::new(Recorder::default());
    let second = Arc::new(Recorder::default());

    run(options(&dir, "index.ts"), recorded(&first)).unwrap();
    run(options(&dir, "index.ts"), recorded(&second)).unwrap();

    let first = first.classes.lock().unwrap().clone();
    let second = second.classes.lock().unwrap().clone();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn should_strip_registered_decorators_when_enabled() {
    let dir = scenario(&[(
        "other.ts",
        r#"import "./models";
declare const Component: any;

@Component()
export class Widget {}
"#,
    )]);
    let recorder = Arc::new(Recorder::default());
    let schema = TypeSchema::new(
        TypeSchemaOptions::with_hooks(recorder.clone()).strip_decorators(true),
    );

    let result = run(options(&dir, "other.ts"), schema).unwrap();
    assert!(result.is_success(), "errors: {:?}", result.errors);
    assert_eq!(recorder.names(), vec!["Foo"]);

    let bundle = &result.output_files[0].contents;
    assert!(!bundle.contains("@cls"));
    assert!(!bundle.contains("@prop"));
    assert!(!bundle.contains("@method"));
    assert!(bundle.contains("@Component()"));
    assert!(bundle.contains("class Foo"));
    // Files without recognized decorators come back untouched.
    assert!(bundle.contains(DECORATORS));
}

#[test]
fn should_leave_sources_to_the_host_when_not_stripping() {
    let dir = scenario(&[]);
    let result = run(
        options(&dir, "index.ts"),
        TypeSchema::new(TypeSchemaOptions::default()),
    )
    .unwrap();

    let bundle = &result.output_files[0].contents;
    assert!(bundle.contains(MODELS));
}

#[test]
fn should_fail_setup_without_compiler_configuration() {
    let dir = workspace(&[("decorators.dec.ts", DECORATORS), ("index.ts", INDEX)]);
    let recorder = Arc::new(Recorder::default());

    let err = run(options(&dir, "index.ts"), recorded(&recorder)).unwrap_err();
    match err {
        HostError::Setup { plugin, source } => {
            assert_eq!(plugin, "TypeSchema");
            assert!(format!("{:#}", source).contains("tsconfig.json"));
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(recorder.starts.load(Ordering::SeqCst), 0);
}

#[test]
fn should_use_the_configured_tsconfig_path() {
    let dir = scenario(&[("config/tsconfig.app.json", "{}")]);
    fs::remove_file(dir.path().join("tsconfig.json")).unwrap();
    let recorder = Arc::new(Recorder::default());

    let mut opts = options(&dir, "index.ts");
    opts.tsconfig = Some(PathBuf::from("config/tsconfig.app.json"));
    let result = run(opts, recorded(&recorder)).unwrap();
    assert!(result.is_success(), "errors: {:?}", result.errors);
    assert_eq!(recorder.names(), vec!["Foo"]);
}

#[test]
fn should_fail_setup_when_an_entry_point_cannot_be_resolved() {
    let dir = scenario(&[]);
    let recorder = Arc::new(Recorder::default());

    let err = run(options(&dir, "missing.ts"), recorded(&recorder)).unwrap_err();
    assert!(matches!(err, HostError::Setup { .. }));
    assert!(err.to_string().contains("Could not resolve entry point"));
}

#[test]
fn should_report_parse_errors_per_file() {
    let dir = scenario(&[
        ("broken.ts", "export class {\n"),
        (
            "main.ts",
            r#"import "./broken";
import "./models";
"#,
        ),
    ]);
    let recorder = Arc::new(Recorder::default());

    let result = run(options(&dir, "main.ts"), recorded(&recorder)).unwrap();
    assert_eq!(result.errors.len(), 1);
    let error = &result.errors[0];
    assert_eq!(error.path, Some(dir.path().join("broken.ts")));
    assert_eq!(error.plugin.as_deref(), Some("TypeSchema"));
    assert_eq!(recorder.names(), vec!["Foo"]);
}

#[test]
fn should_abort_only_the_current_file_when_progress_fails() {
    let dir = scenario(&[
        (
            "bar.ts",
            r#"import { cls } from "./decorators.dec";

@cls("Bar") export class Bar {}
"#,
        ),
        (
            "main.ts",
            r#"import "./bar";
import "./models";
"#,
        ),
    ]);
    let recorder = Arc::new(Recorder {
        fail_on_class: Some("Bar"),
        ..Recorder::default()
    });

    let result = run(options(&dir, "main.ts"), recorded(&recorder)).unwrap();
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].path, Some(dir.path().join("bar.ts")));
    assert!(result.errors[0].text.contains("on_progress hook failed"));
    assert!(result.errors[0].text.contains("refusing Bar"));
    assert_eq!(recorder.names(), vec!["Foo"]);
    assert_eq!(recorder.ends.load(Ordering::SeqCst), 1);
}

#[test]
fn should_abort_the_build_when_start_fails() {
    let dir = scenario(&[]);
    let recorder = Arc::new(Recorder {
        fail_start: true,
        ..Recorder::default()
    });

    let err = run(options(&dir, "index.ts"), recorded(&recorder)).unwrap_err();
    assert!(matches!(err, HostError::Start { .. }));
    assert!(recorder.names().is_empty());
    assert_eq!(recorder.ends.load(Ordering::SeqCst), 0);
}

#[test]
fn should_abort_the_build_when_end_fails() {
    let dir = scenario(&[]);
    let recorder = Arc::new(Recorder {
        fail_end: true,
        ..Recorder::default()
    });

    let err = run(options(&dir, "index.ts"), recorded(&recorder)).unwrap_err();
    match err {
        HostError::End { plugin, source } => {
            assert_eq!(plugin, "TypeSchema");
            assert!(format!("{:#}", source).contains("cannot flush"));
        }
        other => panic!("expected an end failure, got {:?}", other),
    }
    assert_eq!(recorder.names(), vec!["Foo"]);
    assert_eq!(recorder.ends.load(Ordering::SeqCst), 1);
}

#[test]
fn should_accept_closures_as_hooks() {
    let dir = scenario(&[]);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = {
        let seen = seen.clone();
        move |_: &BuildOptions, metadata: &ClassMetadata| -> anyhow::Result<()> {
            seen.lock().unwrap().push(metadata.name().to_string());
            Ok(())
        }
    };

    run(options(&dir, "index.ts"), TypeSchema::new(TypeSchemaOptions::new(sink))).unwrap();
    assert_eq!(*seen.lock().unwrap(), vec!["Foo".to_string()]);
}

struct DiscoverDeclarations {
    found: Arc<Mutex<Option<DeclarationFiles>>>,
}

impl Plugin for DiscoverDeclarations {
    fn name(&self) -> &str {
        "discover-declarations"
    }

    fn setup(&self, build: &mut dyn PluginBuild) -> anyhow::Result<()> {
        let files = DeclarationResolver::default().resolve(&*build)?;
        *self.found.lock().unwrap() = Some(files);
        Ok(())
    }
}

#[test]
fn should_discover_declaration_files_and_their_importers() {
    let dir = scenario(&[
        ("extra.dec.ts", "export const extra = () => () => {};\n"),
        (
            "main.ts",
            r#"import "./models";
import { extra } from "./extra.dec";
import { cls } from "./decorators.dec";
"#,
        ),
    ]);
    let found = Arc::new(Mutex::new(None));
    let plugin: Arc<dyn Plugin> = Arc::new(DiscoverDeclarations {
        found: found.clone(),
    });

    FsBuild::run(options(&dir, "main.ts"), &[plugin]).unwrap();
    let files = found.lock().unwrap().take().unwrap();

    let paths: Vec<PathBuf> = files.iter().map(|f| f.path.clone()).collect();
    assert_eq!(
        paths,
        vec![
            dir.path().join("decorators.dec.ts"),
            dir.path().join("extra.dec.ts"),
        ]
    );

    let importers: Vec<PathBuf> = files
        .get(&dir.path().join("decorators.dec.ts"))
        .unwrap()
        .importers
        .iter()
        .cloned()
        .collect();
    assert_eq!(
        importers,
        vec![dir.path().join("main.ts"), dir.path().join("models.ts")]
    );

    let all: Vec<PathBuf> = files.importers().into_iter().map(PathBuf::from).collect();
    assert_eq!(all, importers);
}
