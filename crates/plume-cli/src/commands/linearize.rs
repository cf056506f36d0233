//! Linearize command - print the method resolution order of a type.

use std::path::PathBuf;

use super::Options;

pub fn run(files: &[PathBuf], type_path: &str, options: Options) -> miette::Result<()> {
    let mut runtime = super::compile(files, options)?;
    let linearization = runtime
        .linearize(type_path)
        .map_err(|err| super::render(&runtime, err))?;

    println!("Linearization of {}:", type_path);
    for (index, path) in linearization.iter().enumerate() {
        println!("  {:>2}. {}", index, path);
    }
    Ok(())
}
