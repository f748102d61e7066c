// src/snake/game.rs

use anyhow::Result;
use log::debug;

use crate::drm::{Rgb, Surface};

const HEAD_COLOR: Rgb = Rgb::new(2, 181, 38);
const BODY_COLOR: Rgb = Rgb::new(38, 126, 5);
const FOOD_COLOR: Rgb = Rgb::new(240, 255, 0);

/// A grid position (or extent), in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Edge-triggered and level inputs for one tick, already folded from the
/// keyboard state machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct Controls {
    pub toggle_pause: bool,
    pub quit: bool,
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub boost: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Won,
    Lost,
    Quit,
}

pub struct Game {
    paused: bool,
    outcome: Option<Outcome>,
    score: usize,
    grid: Cell,
    move_progress: f32,
    move_speed: f32,
    speed_gain: f32,
    direction: Direction,
    head: Cell,
    food: Cell,
    body: Vec<Cell>,
}

fn wrap(value: i64, max: i64) -> i64 {
    value.rem_euclid(max)
}

impl Game {
    pub fn new(grid: Cell, food: Cell, base_speed: f32, speed_gain: f32) -> Self {
        Self {
            paused: false,
            outcome: None,
            score: 0,
            grid,
            move_progress: 0.0,
            move_speed: base_speed,
            speed_gain,
            direction: Direction::Right,
            head: Cell {
                x: grid.x / 2,
                y: grid.y / 2,
            },
            food,
            body: Vec::with_capacity(64),
        }
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    #[cfg(test)]
    pub(crate) fn head(&self) -> Cell {
        self.head
    }

    #[cfg(test)]
    pub(crate) fn body(&self) -> &[Cell] {
        &self.body
    }

    #[cfg(test)]
    pub(crate) fn food(&self) -> Cell {
        self.food
    }

    #[cfg(test)]
    pub(crate) fn is_paused(&self) -> bool {
        self.paused
    }

    /// A reversal guard: turning is refused only when the cell in the chosen
    /// direction holds the first body segment (the neck).
    fn neck_at(&self, pos: Cell) -> bool {
        let wrapped = Cell {
            x: wrap(pos.x, self.grid.x),
            y: wrap(pos.y, self.grid.y),
        };
        self.body.first() == Some(&wrapped)
    }

    fn next_cell(pos: Cell, direction: Direction) -> Cell {
        match direction {
            Direction::Up => Cell { x: pos.x, y: pos.y - 1 },
            Direction::Down => Cell { x: pos.x, y: pos.y + 1 },
            Direction::Left => Cell { x: pos.x - 1, y: pos.y },
            Direction::Right => Cell { x: pos.x + 1, y: pos.y },
        }
    }

    pub fn tick(
        &mut self,
        controls: &Controls,
        dt: f32,
        rng: &mut dyn FnMut(i64, i64) -> Result<i64>,
    ) -> Result<()> {
        if controls.toggle_pause {
            self.paused = !self.paused;
            return Ok(());
        }
        if controls.quit {
            self.outcome = Some(Outcome::Quit);
            return Ok(());
        }

        // A neck-blocked turn consumes the whole chord; a second pressed
        // direction does not get a look-in on the same tick.
        if controls.up {
            if !self.neck_at(Self::next_cell(self.head, Direction::Up)) {
                self.direction = Direction::Up;
            }
        } else if controls.down {
            if !self.neck_at(Self::next_cell(self.head, Direction::Down)) {
                self.direction = Direction::Down;
            }
        } else if controls.left {
            if !self.neck_at(Self::next_cell(self.head, Direction::Left)) {
                self.direction = Direction::Left;
            }
        } else if controls.right {
            if !self.neck_at(Self::next_cell(self.head, Direction::Right)) {
                self.direction = Direction::Right;
            }
        }

        if self.paused {
            return Ok(());
        }

        let boost = if controls.boost { 2.0 } else { 1.0 };
        self.move_progress += self.move_speed * boost * dt;

        if self.move_progress >= 1.0 {
            self.move_progress = 0.0;
            let mut prev_pos = self.head;

            self.head = Self::next_cell(self.head, self.direction);
            self.head.x = wrap(self.head.x, self.grid.x);
            self.head.y = wrap(self.head.y, self.grid.y);

            for i in 0..self.body.len() {
                let segment = self.body[i];

                if segment == self.head {
                    self.outcome = Some(Outcome::Lost);
                    return Ok(());
                }
                // A segment already sitting on the vacated cell (fresh growth)
                // stays put and keeps the shift going from there.
                if segment == prev_pos {
                    continue;
                }
                self.body[i] = prev_pos;
                prev_pos = segment;
            }
        }

        if self.head == self.food {
            self.eat(rng)?;
        }
        Ok(())
    }

    fn eat(&mut self, rng: &mut dyn FnMut(i64, i64) -> Result<i64>) -> Result<()> {
        self.score += 1;
        self.move_speed += self.speed_gain;
        self.body.push(self.head);
        debug!("Ate food at {:?}, score {}", self.food, self.score);

        if self.body.len() as i64 + 1 == self.grid.x * self.grid.y {
            self.outcome = Some(Outcome::Won);
            return Ok(());
        }

        // Respawn on a free cell.
        loop {
            let candidate = Cell {
                x: rng(0, self.grid.x)?,
                y: rng(0, self.grid.y)?,
            };
            if candidate != self.head && !self.body.contains(&candidate) {
                self.food = candidate;
                return Ok(());
            }
        }
    }

    pub fn draw(&self, surface: &mut Surface, scale: i64) {
        surface.clear();
        draw_cell(surface, self.food, scale, FOOD_COLOR);
        for segment in &self.body {
            draw_cell(surface, *segment, scale, BODY_COLOR);
        }
        draw_cell(surface, self.head, scale, HEAD_COLOR);
    }
}

fn draw_cell(surface: &mut Surface, cell: Cell, scale: i64, color: Rgb) {
    surface.fill_rect(cell.x * scale, cell.y * scale, scale, scale, color);
}
