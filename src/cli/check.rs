//! Check command implementation.

use super::{read_file, CliError};
use std::path::PathBuf;
use tankasm::isa::compile;

/// Execute the check command.
///
/// Compiles every file and reports each result. Fails if any file does not
/// compile.
///
/// # Errors
///
/// Returns an error if a file cannot be read or does not compile.
#[allow(clippy::needless_pass_by_value)]
pub(crate) fn execute(files: Vec<PathBuf>, listing: bool) -> Result<(), CliError> {
    let mut failed = 0;

    for path in &files {
        let source = read_file(path)?;
        match compile(&source) {
            Ok(program) => {
                println!(
                    "ok     {} ({} instructions, {} labels)",
                    path.display(),
                    program.len(),
                    program.labels().len()
                );
                if listing {
                    print!("{}", program.listing());
                    println!();
                }
            }
            Err(e) => {
                failed += 1;
                println!("error  {}: {e}", path.display());
            }
        }
    }

    if failed > 0 {
        return Err(CliError::new(format!(
            "{failed} of {} programs failed to compile",
            files.len()
        )));
    }
    Ok(())
}
