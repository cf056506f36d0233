//! Check command - compile model files without querying them.

use std::path::PathBuf;

use super::Options;

pub fn run(files: &[PathBuf], snapshot: bool, options: Options) -> miette::Result<()> {
    if files.is_empty() {
        return Err(miette::miette!("No files specified"));
    }

    for file in files {
        println!("Checking: {}", file.display());
    }

    let runtime = match super::compile(files, options) {
        Ok(runtime) => runtime,
        Err(report) => {
            println!();
            println!("Check complete: 1 error(s), 0 warning(s)");
            return Err(report);
        }
    };
    println!("  ok");

    if snapshot {
        let json = runtime
            .snapshot()
            .to_json()
            .map_err(|err| miette::miette!("Failed to serialize snapshot: {}", err))?;
        println!("{}", json);
    }

    println!();
    println!("Check complete: no issues found");
    Ok(())
}
