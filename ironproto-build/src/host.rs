//! Build-system integration.

use std::io::Write;
use std::path::Path;
use tracing::warn;

/// Environment variable a build script exports with the generated directory.
pub const GENERATED_DIR_ENV: &str = "IRONPROTO_GENERATED_DIR";

/// The build system the generated sources are handed to.
pub trait BuildHost {
    /// Called with the source directory before anything is compiled.
    fn watch_sources(&mut self, _source_dir: &Path) {}

    /// Registers the output directory as an additional source root.
    fn register_source_root(&mut self, output_dir: &Path);
}

/// Host that ignores every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHost;

impl BuildHost for NoopHost {
    fn register_source_root(&mut self, _output_dir: &Path) {}
}

/// Host for Cargo build scripts.
///
/// Emits `cargo:` directives so Cargo reruns the script when schemas change
/// and the crate can `include!` generated files via
/// `env!("IRONPROTO_GENERATED_DIR")`.
#[derive(Debug)]
pub struct CargoHost<W: Write = std::io::Stdout> {
    out: W,
}

impl CargoHost {
    /// Creates a host writing directives to standard output.
    #[must_use]
    pub fn new() -> Self {
        Self::with_writer(std::io::stdout())
    }
}

impl Default for CargoHost {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> CargoHost<W> {
    /// Creates a host writing directives to `out`.
    #[must_use]
    pub fn with_writer(out: W) -> Self {
        Self { out }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn directive(&mut self, line: String) {
        if let Err(err) = writeln!(self.out, "{line}") {
            warn!(error = %err, directive = %line, "failed to emit cargo directive");
        }
    }
}

impl<W: Write> BuildHost for CargoHost<W> {
    fn watch_sources(&mut self, source_dir: &Path) {
        self.directive(format!("cargo:rerun-if-changed={}", source_dir.display()));
    }

    fn register_source_root(&mut self, output_dir: &Path) {
        self.directive(format!(
            "cargo:rustc-env={}={}",
            GENERATED_DIR_ENV,
            output_dir.display()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cargo_host_directives() {
        let mut host = CargoHost::with_writer(Vec::new());
        host.watch_sources(Path::new("/p/src/schema"));
        host.register_source_root(Path::new("/p/target/out"));

        let text = String::from_utf8(host.into_inner()).unwrap();
        assert_eq!(
            text,
            "cargo:rerun-if-changed=/p/src/schema\n\
             cargo:rustc-env=IRONPROTO_GENERATED_DIR=/p/target/out\n"
        );
    }

    #[test]
    fn test_noop_host() {
        let mut host = NoopHost;
        host.watch_sources(Path::new("a"));
        host.register_source_root(Path::new("b"));
    }
}
