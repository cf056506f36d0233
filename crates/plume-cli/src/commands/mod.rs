//! CLI commands.

use std::path::PathBuf;

use miette::{NamedSource, Report};
use plume_driver::{CompilationError, CompilerConfig, Runtime};
use plume_resolver::NullMatching;

pub mod check;
pub mod descriptor;
pub mod info;
pub mod linearize;
pub mod resolve;

/// Flags shared by every command.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    pub verbose: bool,
    pub lenient: bool,
}

impl Options {
    fn config(self) -> CompilerConfig {
        let mut config = CompilerConfig::from_env();
        config.verbose = self.verbose;
        if self.lenient {
            config.null_matching = NullMatching::Lenient;
        }
        config
    }
}

/// Turn a compilation error into a report showing the source it points into.
pub(crate) fn render(runtime: &Runtime, err: CompilationError) -> Report {
    let source = err
        .source_id()
        .and_then(|id| Some((id.to_string(), runtime.source_text(id)?.to_string())));
    match source {
        Some((id, text)) => Report::new(err).with_source_code(NamedSource::new(id, text)),
        None => Report::new(err),
    }
}

/// Load and compile the given files.
pub(crate) fn compile(files: &[PathBuf], options: Options) -> miette::Result<Runtime> {
    if files.is_empty() {
        return Err(miette::miette!("No files specified"));
    }
    let mut runtime = Runtime::new(options.config());
    for file in files {
        runtime.load_file(file).map_err(|err| render(&runtime, err))?;
    }
    if let Err(err) = runtime.compile() {
        return Err(render(&runtime, err));
    }
    Ok(runtime)
}
