//! Simple validation example: check one part file and print the results.

use fzpcheck::prelude::*;
use std::path::Path;

fn main() -> Result<(), FzpCheckError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/core/hybrid_connectors.fzp".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example simple_validation [path/to/part.fzp]");
        std::process::exit(1);
    }

    let options = CheckOptions {
        verbose: true,
        ..Default::default()
    };
    let selection = CheckSelection::from_names(&["all"])?;

    let mut runner = CheckerRunner::new(path, options);
    let errors = runner.check(&selection.fzp, &selection.svg)?;

    println!();
    if errors == 0 {
        println!("{} passed every check", path.display());
    } else {
        println!("{} has {} problem(s)", path.display(), errors);
    }
    Ok(())
}
