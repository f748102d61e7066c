// src/snake/mod.rs

//! The snake game and its render session: keyboard poll, game-state update,
//! software drawing into the mapped surface, blocking commit, sleep.

mod game;


pub use game::{Cell, Controls, Game, Outcome};

use anyhow::{Context, Result};
use log::info;
use std::thread;
use std::time::Duration;

use crate::config::CONFIG;
use crate::drm::{DisplayPipeline, DrmDevice};
use crate::input::{EvdevDevice, EventSource, Keyboard};
use crate::input::keys;
use crate::util;
use crate::vt::ConsoleRedirect;

fn sample_controls<S: EventSource>(keyboard: &Keyboard<S>) -> Controls {
    Controls {
        toggle_pause: keyboard.was_just_released(keys::KEY_ESC),
        quit: keyboard.is_pressed(keys::KEY_LEFTCTRL)
            && keyboard.was_just_released(keys::KEY_C),
        up: keyboard.is_pressed(keys::KEY_W) || keyboard.is_pressed(keys::KEY_UP),
        down: keyboard.is_pressed(keys::KEY_S) || keyboard.is_pressed(keys::KEY_DOWN),
        left: keyboard.is_pressed(keys::KEY_A) || keyboard.is_pressed(keys::KEY_LEFT),
        right: keyboard.is_pressed(keys::KEY_D) || keyboard.is_pressed(keys::KEY_RIGHT),
        boost: keyboard.is_pressed(keys::KEY_LEFTSHIFT),
    }
}

/// Grid dimensions for a frame, never below 1x1: a configured cell size
/// larger than the frame degrades to a single cell instead of an empty grid.
fn grid_for(width: u32, height: u32, scale: i64) -> Cell {
    Cell {
        x: (width as i64 / scale).max(1),
        y: (height as i64 / scale).max(1),
    }
}

/// One full game session: claim the display, run the loop, release
/// everything. The console redirect guard restores the shell console on any
/// exit path, errors included.
pub fn run() -> Result<()> {
    let config = &*CONFIG;

    let _console = ConsoleRedirect::acquire(
        &config.devices.game_console,
        &config.devices.shell_console,
    )?;

    let device = DrmDevice::open(&config.devices.card)?;
    let mut pipeline = DisplayPipeline::initialize(device)
        .context("Display pipeline initialization failed")?;
    let frame = pipeline.frame_info()?;

    let mut keyboard = Keyboard::new(EvdevDevice::open(&config.devices.keyboard)?);

    let scale = (config.game.cell_px as i64).max(1);
    let grid = grid_for(frame.width, frame.height, scale);
    let mut rng = util::random_range;
    let food = Cell {
        x: rng(0, grid.x)?,
        y: rng(0, grid.y)?,
    };
    let mut game = Game::new(grid, food, config.game.base_speed, config.game.speed_gain);
    info!(
        "Game session: grid {}x{}, cell {} px, frame {}x{}",
        grid.x, grid.y, scale, frame.width, frame.height
    );

    let dt = config.game.tick_ms as f32 / 1000.0;
    let outcome = loop {
        keyboard.update()?;
        let controls = sample_controls(&keyboard);
        game.tick(&controls, dt, &mut rng)?;

        if let Some(outcome) = game.outcome() {
            break outcome;
        }

        game.draw(pipeline.surface_mut()?, scale);
        pipeline.present().context("Frame commit failed")?;

        thread::sleep(Duration::from_millis(config.game.tick_ms));
    };

    match outcome {
        Outcome::Won => println!("You win! Score: {}", game.score()),
        Outcome::Lost => println!("You lose! Score: {}", game.score()),
        Outcome::Quit => info!("Game quit, score {}", game.score()),
    }

    pipeline.shutdown();
    Ok(())
}
