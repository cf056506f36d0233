//! Info command - show information about Plume.

use plume_driver::CompilerConfig;

pub fn run() -> miette::Result<()> {
    let config = CompilerConfig::from_env();

    println!("Plume v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Core imports:");
    for package in &config.core_imports {
        println!("  {}", package);
    }
    println!("Null matching: {:?}", config.null_matching);
    println!();
    println!("Environment:");
    println!("  PLUME_CORE_IMPORTS      comma separated packages imported everywhere");
    println!("  PLUME_LENIENT_MATCHING  let unknown arguments match any parameter");

    Ok(())
}
