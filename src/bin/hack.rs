//! `hack` - runs the machine-level simulator against a ROM file.
//!
//! ```text
//! hack --rom <PATH> [--rate <HZ>] [--headless] [--screenshot-on-exit <PATH>]
//! ```

use clap::Parser;
use hacknand::sim::headless::{HeadlessKeyboard, HeadlessScreenHandle};
use hacknand::sim::{self, Simulator};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run a Hack ROM on the machine simulator")]
struct Args {
    /// Path to a `.hack` (binary text) or `.asm` (assembled on load) ROM file.
    #[arg(long)]
    rom: PathBuf,

    /// Cap the compute-tick rate in Hz; unset runs unthrottled.
    #[arg(long)]
    rate: Option<u32>,

    /// Use the in-memory Screen/Keyboard stand-ins instead of a window.
    #[arg(long)]
    headless: bool,

    /// On exit, save the final framebuffer as a PNG to this path (requires
    /// the `screenshot` feature).
    #[arg(long)]
    screenshot_on_exit: Option<PathBuf>,
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
    let source = std::fs::read_to_string(&args.rom)?;
    let rom = if args.rom.extension().and_then(|e| e.to_str()) == Some("asm") {
        sim::load_rom_asm(&source)?
    } else {
        sim::load_rom_text(&source)?
    };

    let stop = Arc::new(AtomicBool::new(false));

    if !args.headless && cfg!(feature = "display") {
        run_windowed(rom, args.rate, stop)?;
        return Ok(());
    }

    let screen_handle = HeadlessScreenHandle::new();
    let mut simulator = Simulator::new(
        rom,
        Box::new(screen_handle.clone()),
        Box::new(HeadlessKeyboard::new()),
    );
    simulator.run(args.rate, || !stop.load(Ordering::SeqCst))?;

    if let Some(path) = args.screenshot_on_exit {
        save_screenshot(&screen_handle, &path);
    }
    Ok(())
}

#[cfg(feature = "screenshot")]
fn save_screenshot(screen: &HeadlessScreenHandle, path: &std::path::Path) {
    if let Err(err) = screen.save_png(path) {
        log::error!("failed to save screenshot to {path:?}: {err}");
    }
}

#[cfg(not(feature = "screenshot"))]
fn save_screenshot(_screen: &HeadlessScreenHandle, path: &std::path::Path) {
    log::warn!("--screenshot-on-exit {path:?} requested but the `screenshot` feature is not compiled in");
}

#[cfg(feature = "display")]
fn run_windowed(
    rom: Vec<u16>,
    rate: Option<u32>,
    stop: Arc<AtomicBool>,
) -> Result<(), hacknand::Error> {
    use hacknand::sim::display::WindowedScreen;
    let screen = WindowedScreen::new()?;
    let keyboard = screen.keyboard();
    let close_signal = screen.stop_signal();
    let mut simulator = Simulator::new(rom, Box::new(screen), Box::new(keyboard));
    simulator.run(rate, || {
        !stop.load(Ordering::SeqCst) && !close_signal.get()
    })?;
    Ok(())
}

#[cfg(not(feature = "display"))]
fn run_windowed(
    _rom: Vec<u16>,
    _rate: Option<u32>,
    _stop: Arc<AtomicBool>,
) -> Result<(), hacknand::Error> {
    unreachable!("windowed mode requires the `display` feature")
}
