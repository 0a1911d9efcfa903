//! Build orchestration: discovery, workspace and staged compilation.

use crate::collaborators::{Generation, IdlLowering, Lowering, RustGeneration};
use crate::compiler::{BatchOutcome, CompiledFile, StagedCompiler};
use crate::discover::{SourceSpec, discover};
use crate::error::{BuildError, CleanupError};
use crate::host::BuildHost;
use crate::workspace::{default_workspace_root, with_workspace};
use std::path::{Path, PathBuf};
use tracing::info;

/// Source directory relative to the project root.
pub const DEFAULT_SOURCE_DIR: &str = "src/schema";

/// Output directory relative to the project root.
pub const DEFAULT_OUTPUT_DIR: &str = "target/generated-sources/ironproto";

/// Summary of a successful run.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Number of files discovered.
    pub discovered: usize,
    /// Files compiled, in processing order.
    pub compiled: Vec<CompiledFile>,
    /// Workspace cleanup failure, if any. Never fails the run.
    pub cleanup: Option<CleanupError>,
}

impl BuildReport {
    /// Returns true if the run had nothing to do.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.discovered == 0
    }
}

/// Compiles every protocol source under a directory into Rust sources.
///
/// # Example
///
/// ```ignore
/// // build.rs
/// fn main() {
///     ironproto_build::ProtocolCompiler::from_cargo_env()
///         .and_then(|c| c.run(&mut ironproto_build::CargoHost::new()))
///         .expect("protocol compilation failed");
/// }
/// ```
pub struct ProtocolCompiler {
    source_dir: PathBuf,
    output_dir: PathBuf,
    includes: Vec<String>,
    excludes: Vec<String>,
    workspace_root: PathBuf,
    lowering: Box<dyn Lowering>,
    generation: Box<dyn Generation>,
}

impl ProtocolCompiler {
    /// Creates a compiler for explicit source and output directories, with
    /// default patterns and the built-in collaborators.
    #[must_use]
    pub fn new(source_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_dir: output_dir.into(),
            includes: Vec::new(),
            excludes: Vec::new(),
            workspace_root: default_workspace_root(),
            lowering: Box::new(IdlLowering),
            generation: Box::new(RustGeneration),
        }
    }

    /// Creates a compiler using the conventional directories of a project:
    /// `src/schema` in, `target/generated-sources/ironproto` out.
    #[must_use]
    pub fn for_project(project_dir: &Path) -> Self {
        Self::new(
            project_dir.join(DEFAULT_SOURCE_DIR),
            project_dir.join(DEFAULT_OUTPUT_DIR),
        )
    }

    /// Creates a compiler for use in a Cargo build script: sources from
    /// `$CARGO_MANIFEST_DIR/src/schema`, output to `$OUT_DIR/ironproto`.
    ///
    /// # Errors
    /// Returns `BuildError::Config` if either variable is unset.
    pub fn from_cargo_env() -> Result<Self, BuildError> {
        let manifest_dir = std::env::var_os("CARGO_MANIFEST_DIR")
            .ok_or_else(|| BuildError::config("CARGO_MANIFEST_DIR is not set"))?;
        let out_dir = std::env::var_os("OUT_DIR")
            .ok_or_else(|| BuildError::config("OUT_DIR is not set"))?;
        Ok(Self::new(
            PathBuf::from(manifest_dir).join(DEFAULT_SOURCE_DIR),
            PathBuf::from(out_dir).join("ironproto"),
        ))
    }

    /// Adds an include pattern. The first one replaces the defaults.
    #[must_use]
    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.includes.push(pattern.into());
        self
    }

    /// Adds an exclude pattern.
    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.excludes.push(pattern.into());
        self
    }

    /// Sets the directory run workspaces are created in.
    #[must_use]
    pub fn workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = root.into();
        self
    }

    /// Replaces the lowering step.
    #[must_use]
    pub fn lowering(mut self, lowering: impl Lowering + 'static) -> Self {
        self.lowering = Box::new(lowering);
        self
    }

    /// Replaces the generation step.
    #[must_use]
    pub fn generation(mut self, generation: impl Generation + 'static) -> Self {
        self.generation = Box::new(generation);
        self
    }

    /// Returns the source directory.
    #[must_use]
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Returns the output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Returns the source spec this compiler discovers with.
    #[must_use]
    pub fn source_spec(&self) -> SourceSpec {
        SourceSpec::new(&self.source_dir)
            .includes(self.includes.iter().cloned())
            .excludes(self.excludes.iter().cloned())
    }

    /// Runs the whole pipeline.
    ///
    /// A missing source directory makes the run a no-op: no workspace is
    /// created and `host` is not called. Otherwise the output directory is
    /// registered with `host` once every file compiled.
    ///
    /// # Errors
    /// Returns `BuildError::Match` or `BuildError::Walk` if discovery fails,
    /// `BuildError::Workspace` if the workspace cannot be created, and
    /// `BuildError::Lowering` or `BuildError::Generation` for the first file
    /// that fails to compile.
    pub fn run(&self, host: &mut dyn BuildHost) -> Result<BuildReport, BuildError> {
        if !self.source_dir.is_dir() {
            info!(
                source = %self.source_dir.display(),
                "no protocol source directory, skipping"
            );
            return Ok(BuildReport::default());
        }

        let files = discover(&self.source_spec())?;
        host.watch_sources(&self.source_dir);

        let compiler = StagedCompiler::with_collaborators(&*self.lowering, &*self.generation);
        let (outcome, cleanup) = with_workspace(&self.workspace_root, |workspace| {
            compiler.compile(&files, workspace, &self.output_dir)
        })?;

        match outcome {
            BatchOutcome::Success { compiled } => {
                host.register_source_root(&self.output_dir);
                info!(
                    compiled = compiled.len(),
                    output = %self.output_dir.display(),
                    "protocol sources generated"
                );
                Ok(BuildReport {
                    discovered: files.len(),
                    compiled,
                    cleanup,
                })
            }
            BatchOutcome::Failure { failure, .. } => Err(failure.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NoopHost;
    use crate::stage::PipelineStage;
    use ironproto_codegen::CodegenError;
    use std::fs;

    const FOO_IDL: &str = r#"
/** Foo service. */
@namespace("org.example")
protocol Foo {
    enum Level { LOW, HIGH }
    record Reading { double value; Level level; }
    Reading read(string sensor);
}
"#;

    const BAR_SCHEMA: &str = r#"{
  "protocol": "Bar",
  "types": [{"type": "fixed", "name": "Id", "size": 4}],
  "messages": {}
}"#;

    /// Records host calls.
    #[derive(Default)]
    struct RecordingHost {
        watched: Vec<PathBuf>,
        registered: Vec<PathBuf>,
    }

    impl BuildHost for RecordingHost {
        fn watch_sources(&mut self, source_dir: &Path) {
            self.watched.push(source_dir.to_path_buf());
        }

        fn register_source_root(&mut self, output_dir: &Path) {
            self.registered.push(output_dir.to_path_buf());
        }
    }

    struct Fixture {
        project: tempfile::TempDir,
        workspaces: tempfile::TempDir,
    }

    impl Fixture {
        fn new(files: &[(&str, &str)]) -> Self {
            let project = tempfile::tempdir().unwrap();
            for (relative, content) in files {
                let path = project.path().join(DEFAULT_SOURCE_DIR).join(relative);
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(path, content).unwrap();
            }
            Self {
                project,
                workspaces: tempfile::tempdir().unwrap(),
            }
        }

        fn compiler(&self) -> ProtocolCompiler {
            ProtocolCompiler::for_project(self.project.path()).workspace_root(self.workspaces.path())
        }

        fn output(&self) -> PathBuf {
            self.project.path().join(DEFAULT_OUTPUT_DIR)
        }

        fn workspace_entries(&self) -> usize {
            fs::read_dir(self.workspaces.path()).unwrap().count()
        }
    }

    fn read_tree(root: &Path) -> Vec<(PathBuf, String)> {
        let mut entries: Vec<_> = walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let content = fs::read_to_string(e.path()).unwrap();
                (e.path().strip_prefix(root).unwrap().to_path_buf(), content)
            })
            .collect();
        entries.sort();
        entries
    }

    #[test]
    fn test_for_project_paths() {
        let compiler = ProtocolCompiler::for_project(Path::new("/proj"));
        assert_eq!(compiler.source_dir(), Path::new("/proj/src/schema"));
        assert_eq!(
            compiler.output_dir(),
            Path::new("/proj/target/generated-sources/ironproto")
        );
        assert_eq!(
            compiler.source_spec().include_patterns(),
            vec!["**/*.schema", "**/*.idl"]
        );
    }

    #[test]
    fn test_idl_and_schema_scenario() {
        let fixture = Fixture::new(&[("foo.idl", FOO_IDL), ("bar.schema", BAR_SCHEMA)]);
        let mut host = RecordingHost::default();

        let report = fixture.compiler().run(&mut host).unwrap();

        assert_eq!(report.discovered, 2);
        let stages: Vec<_> = report
            .compiled
            .iter()
            .map(|c| (c.relative_path.as_str(), c.stage))
            .collect();
        assert_eq!(
            stages,
            vec![
                ("bar.schema", PipelineStage::CanonicalSchema),
                ("foo.idl", PipelineStage::InterfaceDefinition),
            ]
        );
        assert!(report.cleanup.is_none());

        let output = fixture.output();
        assert!(output.join("bar.rs").is_file());
        let foo = fs::read_to_string(output.join("org/example/foo.rs")).unwrap();
        assert!(foo.contains("pub trait FooProtocol {"));

        let lowered = report.compiled[1].lowered.as_ref().unwrap();
        assert!(!lowered.exists());
        assert_eq!(fixture.workspace_entries(), 0);
        assert_eq!(host.registered, vec![output]);
        assert_eq!(host.watched.len(), 1);
    }

    #[test]
    fn test_malformed_idl_scenario() {
        let fixture = Fixture::new(&[("broken.idl", "protocol Broken { record R { int x }")]);
        let mut host = RecordingHost::default();

        let err = fixture.compiler().run(&mut host).unwrap_err();

        assert!(matches!(err, BuildError::Lowering(_)));
        let failure = err.failure().unwrap();
        assert_eq!(failure.filename, "broken.idl");
        assert_eq!(failure.output_directory, fixture.output());
        assert!(err.to_string().contains("broken.idl"));

        assert!(!fixture.output().exists());
        assert_eq!(fixture.workspace_entries(), 0);
        assert!(host.registered.is_empty());
    }

    #[test]
    fn test_generation_failure_keeps_earlier_outputs() {
        let fixture = Fixture::new(&[
            ("a.schema", BAR_SCHEMA),
            ("b.schema", r#"{"protocol": "B", "types": [{"type": "fixed", "name": "Z", "size": 0}]}"#),
            ("c.idl", FOO_IDL),
        ]);

        let err = fixture.compiler().run(&mut NoopHost).unwrap_err();

        assert!(matches!(err, BuildError::Generation(_)));
        assert_eq!(err.failure().unwrap().filename, "b.schema");
        assert!(fixture.output().join("bar.rs").is_file());
        assert!(!fixture.output().join("org/example/foo.rs").exists());
        assert_eq!(fixture.workspace_entries(), 0);
    }

    #[test]
    fn test_missing_source_dir_is_noop() {
        let fixture = Fixture::new(&[]);
        let mut host = RecordingHost::default();

        let report = fixture.compiler().run(&mut host).unwrap();

        assert!(report.is_empty());
        assert!(report.compiled.is_empty());
        assert!(host.watched.is_empty());
        assert!(host.registered.is_empty());
        assert!(!fixture.output().exists());
        assert_eq!(fixture.workspace_entries(), 0);
    }

    #[test]
    fn test_excludes_applied() {
        let fixture = Fixture::new(&[("foo.idl", FOO_IDL), ("drafts/bar.schema", BAR_SCHEMA)]);

        let report = fixture
            .compiler()
            .exclude("drafts/**")
            .run(&mut NoopHost)
            .unwrap();

        assert_eq!(report.discovered, 1);
        assert!(!fixture.output().join("bar.rs").exists());
    }

    #[test]
    fn test_repeated_runs_are_byte_identical() {
        let fixture = Fixture::new(&[("foo.idl", FOO_IDL), ("bar.schema", BAR_SCHEMA)]);

        fixture.compiler().run(&mut NoopHost).unwrap();
        let first = read_tree(&fixture.output());
        fs::remove_dir_all(fixture.output()).unwrap();
        fixture.compiler().run(&mut NoopHost).unwrap();
        let second = read_tree(&fixture.output());

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[test]
    fn test_cleanup_failure_is_not_fatal() {
        /// Generates normally, then deletes the workspace holding a lowered file.
        struct RemovesWorkspace {
            workspaces: PathBuf,
        }
        impl Generation for RemovesWorkspace {
            fn generate(&self, schema_file: &Path, output_dir: &Path) -> Result<(), CodegenError> {
                RustGeneration.generate(schema_file, output_dir)?;
                match schema_file.parent() {
                    Some(workspace) if schema_file.starts_with(&self.workspaces) => {
                        fs::remove_dir_all(workspace)?;
                    }
                    _ => {}
                }
                Ok(())
            }
        }

        let fixture = Fixture::new(&[("foo.idl", FOO_IDL)]);
        let mut host = RecordingHost::default();
        let report = fixture
            .compiler()
            .generation(RemovesWorkspace {
                workspaces: fixture.workspaces.path().to_path_buf(),
            })
            .run(&mut host)
            .unwrap();

        let cleanup = report.cleanup.as_ref().expect("cleanup failure reported");
        assert!(cleanup.path.starts_with(fixture.workspaces.path()));
        assert_eq!(report.compiled.len(), 1);
        assert!(fixture.output().join("org/example/foo.rs").is_file());
        assert_eq!(host.registered, vec![fixture.output()]);
    }

    #[test]
    fn test_escaping_namespace_writes_nothing() {
        let project = tempfile::tempdir().unwrap();
        let outside = project.path().join("outside");
        let source = format!("@namespace(\"{}\") protocol Evil {{ }}", outside.display());
        let fixture = Fixture::new(&[("p.idl", source.as_str())]);

        let err = fixture.compiler().run(&mut NoopHost).unwrap_err();

        assert!(matches!(err, BuildError::Lowering(_)));
        assert!(!outside.exists());
        assert!(!fixture.output().exists());
    }

    #[test]
    fn test_custom_lowering() {
        struct Fixed;
        impl Lowering for Fixed {
            fn lower(&self, _text: &str) -> Result<ironproto_schema::Protocol, ironproto_schema::ParseError> {
                Ok(ironproto_schema::Protocol::new("Stub", None))
            }
        }

        let fixture = Fixture::new(&[("anything.idl", "not even idl")]);
        fixture.compiler().lowering(Fixed).run(&mut NoopHost).unwrap();
        assert!(fixture.output().join("stub.rs").is_file());
    }
}
