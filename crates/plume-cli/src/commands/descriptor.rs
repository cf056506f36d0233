//! Descriptor command - inspect a function descriptor.

use std::path::PathBuf;

use plume_syntax::descriptor_to_id;

use super::Options;

pub fn run(descriptor: &str, files: &[PathBuf], options: Options) -> miette::Result<()> {
    let id = descriptor_to_id(descriptor).map_err(|err| miette::miette!("{}", err))?;
    println!("Descriptor: {}", descriptor);
    println!("Id:         {}", id);

    if files.is_empty() {
        return Ok(());
    }

    let runtime = super::compile(files, options)?;
    let found = runtime
        .find_function(descriptor)
        .map_err(|err| super::render(&runtime, err))?;
    match found {
        Some(function) => println!("Function:   {}", runtime.graph().user_path(function)),
        None => {
            println!("Function:   not found");
            return Err(miette::miette!("No function matches {}", descriptor));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_descriptor() {
        assert!(run("pkg::f(String[1]", &[], Options::default()).is_err());
        assert!(run("pkg::f(String[1]):Boolean[1]", &[], Options::default()).is_ok());
    }

    #[test]
    fn test_lookup_in_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(
            &path,
            r#"{"package": "lib", "elements": [
                {"kind": "function", "name": "f", "parameters": [{"name": "s", "type": "String"}],
                 "return_type": "Boolean"}
            ]}"#,
        )
        .unwrap();

        let files = [path];
        assert!(run("lib::f(String[1]):Boolean[1]", &files, Options::default()).is_ok());
        assert!(run("lib::f(Integer[1]):Boolean[1]", &files, Options::default()).is_err());
    }
}
