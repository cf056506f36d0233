//! Resolve command - show which function a call binds to.

use std::path::PathBuf;

use super::Options;

/// `_` marks an argument whose type is unknown.
fn parse_arguments(args: &[String]) -> Vec<Option<String>> {
    args.iter()
        .map(|arg| (arg.trim() != "_").then(|| arg.clone()))
        .collect()
}

pub fn run(files: &[PathBuf], function: &str, args: &[String], options: Options) -> miette::Result<()> {
    let mut runtime = super::compile(files, options)?;
    let resolution = runtime
        .resolve_query(function, &parse_arguments(args))
        .map_err(|err| super::render(&runtime, err))?;

    println!("Call: {}", resolution.signature);
    match &resolution.best {
        Some(best) => println!("Binds to: {}", best),
        None => println!("Binds to: nothing"),
    }
    if !resolution.ranked.is_empty() {
        println!("Candidates:");
        for (index, descriptor) in resolution.ranked.iter().enumerate() {
            println!("  {}. {}", index + 1, descriptor);
        }
    }

    if resolution.best.is_none() {
        return Err(miette::miette!(
            "The system can't find a match for the function: {}",
            resolution.signature
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arguments() {
        let args = vec!["Integer[1]".to_string(), "_".to_string()];
        assert_eq!(
            parse_arguments(&args),
            vec![Some("Integer[1]".to_string()), None]
        );
    }

    #[test]
    fn test_resolve_against_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lib.json");
        std::fs::write(
            &path,
            r#"{"package": "lib", "elements": [
                {"kind": "function", "name": "describe", "parameters": [{"name": "n", "type": "Number"}],
                 "return_type": "String"}
            ]}"#,
        )
        .unwrap();

        let files = [path];
        let args = vec!["Integer[1]".to_string()];
        assert!(run(&files, "lib::describe", &args, Options::default()).is_ok());
        let args = vec!["String[1]".to_string()];
        assert!(run(&files, "lib::describe", &args, Options::default()).is_err());
    }
}
