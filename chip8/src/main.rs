use std::path::PathBuf;

use clap::Parser;

mod keymap;
mod run;

/// Runs a Chip-8 ROM in an SDL2 window.
///
/// Keys: the keypad sits on 1234/QWER/ASDF/ZXCV. P pauses, N steps while paused,
/// Return continues, Backspace resets, F5 saves the state, F9 loads it, Space fast
/// forwards and Escape quits.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the ROM file to run
    pub rom: PathBuf,

    #[arg(short, long, default_value_t = 10, help = "Size of each Chip-8 pixel in screen pixels")]
    pub scale: u32,

    #[arg(short, long, default_value_t = 1_000_000_000 / emu8::CLOCK_SPEED, help = "Instructions per second")]
    pub clock_speed: u64,

    #[arg(long, default_value = "emu8-state.json", help = "Where F5 saves and F9 loads the state")]
    pub state_file: PathBuf,

    #[arg(long, help = "Start paused, stepping with N")]
    pub paused: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    run::run(&args)
}
