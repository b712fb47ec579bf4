/*!
hdl - lexer, parser, AST, elaborator, and JSON test-vector runner for the
HDL chip description language (spec.md §3/§4).

Submodules:
    ast        - the tagged-sum `ChipDef`/`Statement`/`Expression` types.
    lexer      - hand-rolled byte scanner.
    parser     - recursive-descent parser building `ast` values.
    elaborator - recursive chip instantiation onto a [`crate::breadboard::Breadboard`].
    testvec    - JSON test-case structs and runner, driving the `hdl` CLI.
*/

pub mod ast;
pub mod elaborator;
pub mod lexer;
pub mod parser;
pub mod testvec;

use crate::breadboard::Breadboard;
use crate::error::HdlError;
use elaborator::{Elaborated, Library};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Loads `entry` and every file it transitively `use`s (paths resolved
/// relative to `entry`'s parent directory), parsing each into chip
/// definitions and merging them into one [`Library`].
pub fn load_library(entry: &Path) -> Result<Library, HdlError> {
    let mut library = Library::new();
    let mut visited = HashSet::new();
    load_file(entry, &mut library, &mut visited)?;
    Ok(library)
}

fn load_file(
    path: &Path,
    library: &mut Library,
    visited: &mut HashSet<PathBuf>,
) -> Result<(), HdlError> {
    let canonical = path.to_path_buf();
    if !visited.insert(canonical.clone()) {
        return Ok(());
    }
    let source = std::fs::read_to_string(path).map_err(|e| HdlError::Io(e.to_string()))?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    for used in parser::Parser::scan_uses(&source)? {
        load_file(&dir.join(used), library, visited)?;
    }
    let chips = parser::Parser::new(&source).parse_unit()?;
    for chip in chips {
        library.insert(chip.name.clone(), chip);
    }
    Ok(())
}

/// Elaborates `chip_name` from `library` onto a fresh [`Breadboard`],
/// returning both for further use (wiring test-vector inputs, ticking).
pub fn build(library: &Library, chip_name: &str) -> Result<(Breadboard, Elaborated), HdlError> {
    let mut board = Breadboard::new();
    let elaborated = elaborator::elaborate(library, &mut board, chip_name)?;
    Ok((board, elaborated))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_library_resolves_single_file_with_no_uses() {
        let dir = std::env::temp_dir().join(format!("hdl_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("not.hdl");
        std::fs::write(&path, "chip not (a: 1) -> (1) { out nand(in: [a, a]) }").unwrap();
        let library = load_library(&path).unwrap();
        assert!(library.contains_key("not"));
        std::fs::remove_dir_all(&dir).ok();
    }
}
