//! `vm` - translates a VM source file to Hack assembly and prints it.
//!
//! ```text
//! vm --file <PATH>
//! ```
//!
//! Mirrors `original_source/cmd/vm/main.go`'s behavior: one output line per
//! emitted assembly instruction, the module name (the file's stem) scoping
//! `static` segment accesses.

use clap::Parser;
use hacknand::vmtranslate;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Translate a Hack VM source file to assembly")]
struct Args {
    /// VM source file to translate.
    #[arg(long)]
    file: PathBuf,
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        log::error!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), hacknand::Error> {
    let args = Args::parse();
    let source = std::fs::read_to_string(&args.file)?;
    let module_name = args
        .file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Main");
    let lines = vmtranslate::translate(module_name, &source)?;
    for line in lines {
        println!("{line}");
    }
    Ok(())
}
