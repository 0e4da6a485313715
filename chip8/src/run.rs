use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context};
use sdl2::event::Event;
use sdl2::keyboard::Keycode;

use display::Display;
use emu8::cpu::{listing, listing_start};
use emu8::Chip8;

use crate::keymap::keymap;
use crate::Args;

pub fn run(args: &Args) -> anyhow::Result<()> {
    let mut chip8: Chip8 = Chip8::new();

    // Load ROM
    let rom = fs::read(&args.rom).with_context(|| format!("unable to read {:?}", args.rom))?;
    chip8.load_rom(&rom)?;
    log::info!("loaded {:?} ({} bytes)", args.rom, rom.len());

    // Get SDL2 context
    let sdl = sdl2::init().map_err(|e| anyhow!(e))?;
    let mut display = Display::new(&sdl, args.scale).map_err(|e| anyhow!(e))?;
    let mut events = sdl.event_pump().map_err(|e| anyhow!(e))?;

    // Set initial timing
    let cycle_time = Duration::from_nanos(1_000_000_000 / args.clock_speed.max(1));
    let mut last_cycle: Instant = Instant::now();

    // Whether or not the default clock speed should be respected
    let mut fast_forward = false;
    // Whether the CPU only advances one instruction at a time
    let mut paused = args.paused;
    let mut step = false;
    // Start of the instruction listing shown while paused
    let mut window: u16 = 0;

    if paused {
        log_debugger(&chip8, &mut window);
    }

    'event: loop {
        // If the display changed, render the current frame
        if let Some(frame) = chip8.get_frame() {
            display.render(frame).map_err(|e| anyhow!(e))?;
        }

        // Handle input
        for event in events.poll_iter() {
            match event {
                Event::Quit { .. } => break 'event,
                Event::KeyDown {
                    keycode: Some(key), ..
                } => match (key, keymap(key)) {
                    (_, Some(kc)) => chip8.key_press(kc),
                    (Keycode::Space, _) => fast_forward = true,
                    (Keycode::Escape, _) => break 'event,
                    (Keycode::P, _) => {
                        paused = true;
                        log_debugger(&chip8, &mut window);
                    }
                    (Keycode::N, _) => step = true,
                    (Keycode::Return, _) => paused = false,
                    (Keycode::Backspace, _) => {
                        chip8.reset()?;
                        window = 0;
                        log::info!("reset");
                    }
                    (Keycode::F5, _) => save_state(&chip8, &args.state_file)?,
                    (Keycode::F9, _) => load_state(&mut chip8, &args.state_file),
                    _ => continue,
                },
                Event::KeyUp {
                    keycode: Some(key), ..
                } => match (key, keymap(key)) {
                    (_, Some(kc)) => chip8.key_release(kc),
                    (Keycode::Space, _) => fast_forward = false,
                    _ => continue,
                },
                _ => continue,
            };
        }

        // Update state
        if !paused || step {
            chip8.advance_cpu()?;
            chip8.advance_timers();
        }
        if step {
            step = false;
            log_debugger(&chip8, &mut window);
        }

        // Handle timing
        let current_time = Instant::now();
        let elapsed_cycle_time = current_time - last_cycle;
        if !fast_forward && cycle_time > elapsed_cycle_time {
            std::thread::sleep(cycle_time - elapsed_cycle_time);
        }
        last_cycle = current_time;
    }

    Ok(())
}

/// Logs the registers and the instructions around the pc.
fn log_debugger(chip8: &Chip8, window: &mut u16) {
    let state = chip8.state();
    *window = listing_start(*window, state.pc);

    for line in listing(state, *window) {
        let marker = if line.addr == state.pc { '>' } else { ' ' };
        log::info!("{} {}", marker, line);
    }
    log::info!(
        "PC: {:04X} I: {:04X} SP: {:02X} DT: {:02X} ST: {:02X}",
        state.pc,
        state.i,
        state.stack.len(),
        state.delay_timer,
        state.sound_timer
    );
    let registers: Vec<String> = state
        .v
        .iter()
        .enumerate()
        .map(|(n, value)| format!("V{:X}: {:02X}", n, value))
        .collect();
    log::info!("{}", registers.join(" "));
}

fn save_state(chip8: &Chip8, path: &Path) -> anyhow::Result<()> {
    fs::write(path, chip8.save_state()?)
        .with_context(|| format!("unable to write state to {:?}", path))?;
    log::info!("saved state to {:?}", path);
    Ok(())
}

/// A missing or unreadable save leaves the running program alone.
fn load_state(chip8: &mut Chip8, path: &Path) {
    let restored = fs::read_to_string(path)
        .map_err(anyhow::Error::from)
        .and_then(|json| chip8.restore_state(&json).map_err(anyhow::Error::from));
    match restored {
        Ok(()) => log::info!("loaded state from {:?}", path),
        Err(e) => log::warn!("unable to load state from {:?}: {}", path, e),
    }
}
