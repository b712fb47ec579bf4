//! `hdl` - elaborates an HDL chip and evaluates JSON test vectors against it.
//!
//! ```text
//! hdl --file <PATH> --target <CHIP_NAME> --tests <PATH.json>
//! ```

use clap::Parser;
use hacknand::hdl::{self, testvec};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Elaborate an HDL chip and run its test vectors")]
struct Args {
    /// Entry HDL file (transitively resolves `use` directives).
    #[arg(long)]
    file: PathBuf,

    /// Name of the chip to elaborate and test.
    #[arg(long)]
    target: String,

    /// JSON file of test cases, per spec.md §6.
    #[arg(long)]
    tests: PathBuf,
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
    let library = hdl::load_library(&args.file)?;
    let (mut board, elaborated) = hdl::build(&library, &args.target)?;

    let json = std::fs::read_to_string(&args.tests)?;
    let cases = testvec::parse_cases(&json)?;

    let mut failures = 0;
    for (index, case) in cases.iter().enumerate() {
        let result = testvec::run_case(
            &mut board,
            &elaborated.inputs,
            &elaborated.outputs,
            case,
        )?;
        if !result.passed {
            failures += 1;
            log::error!(
                "chip '{}' test #{index}: expected {:?}, got {:?}",
                args.target,
                result.expected,
                result.actual
            );
        }
    }

    if failures > 0 {
        log::error!("{failures} of {} test case(s) failed for '{}'", cases.len(), args.target);
        std::process::exit(1);
    }
    log::info!("all {} test case(s) passed for '{}'", cases.len(), args.target);
    Ok(())
}
