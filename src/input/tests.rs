// src/input/tests.rs

#![cfg(test)]

use std::collections::VecDeque;

use anyhow::{bail, Result};
use test_log::test;

use super::device::{EventSource, InputEvent};
use super::keyboard::Keyboard;
use super::keys::{EV_KEY, KEY_C, KEY_LEFTCTRL, KEY_W};

struct ScriptedSource {
    events: VecDeque<InputEvent>,
    fail_when_drained: bool,
}

impl ScriptedSource {
    fn new() -> Self {
        Self {
            events: VecDeque::new(),
            fail_when_drained: false,
        }
    }

    fn push_key(&mut self, code: u16, value: i32) {
        self.events.push_back(InputEvent {
            seconds: 0,
            microseconds: 0,
            kind: EV_KEY,
            code,
            value,
        });
    }

    fn push_other(&mut self, kind: u16) {
        self.events.push_back(InputEvent {
            seconds: 0,
            microseconds: 0,
            kind,
            code: 0,
            value: 1,
        });
    }
}

impl EventSource for ScriptedSource {
    fn poll_event(&mut self) -> Result<Option<InputEvent>> {
        match self.events.pop_front() {
            Some(event) => Ok(Some(event)),
            None if self.fail_when_drained => bail!("simulated read failure"),
            None => Ok(None),
        }
    }
}

fn keyboard() -> Keyboard<ScriptedSource> {
    Keyboard::new(ScriptedSource::new())
}

#[test]
fn empty_source_drains_to_none_repeatedly() {
    let mut source = ScriptedSource::new();
    source.push_key(KEY_W, 1);
    assert!(source.poll_event().unwrap().is_some());
    assert!(source.poll_event().unwrap().is_none());
    // A drained source stays drained; asking again is not an error.
    assert!(source.poll_event().unwrap().is_none());
}

#[test]
fn last_event_within_a_tick_wins() {
    let mut kb = keyboard();
    for values in [[1, 0, 1], [0, 1, 0]] {
        for value in values {
            kb.source_mut().push_key(KEY_W, value);
        }
        kb.update().unwrap();
        assert_eq!(kb.is_pressed(KEY_W), values[2] != 0);
    }
}

#[test]
fn just_released_fires_only_on_the_release_tick() {
    let mut kb = keyboard();

    kb.source_mut().push_key(KEY_W, 1);
    kb.update().unwrap();
    assert!(kb.is_pressed(KEY_W));
    assert!(!kb.was_just_released(KEY_W));

    kb.source_mut().push_key(KEY_W, 0);
    kb.update().unwrap();
    assert!(!kb.is_pressed(KEY_W));
    assert!(kb.was_just_released(KEY_W));

    // Next tick with no events: the previous frame resets to all-false.
    kb.update().unwrap();
    assert!(!kb.was_just_released(KEY_W));
}

#[test]
fn press_and_release_in_one_tick_counts_as_released() {
    // The per-event copy means the release sees the press from the same
    // drain, not the state before the tick.
    let mut kb = keyboard();
    kb.source_mut().push_key(KEY_C, 1);
    kb.source_mut().push_key(KEY_C, 0);
    kb.update().unwrap();
    assert!(!kb.is_pressed(KEY_C));
    assert!(kb.was_just_released(KEY_C));
}

#[test]
fn held_key_with_no_new_events_is_not_just_released() {
    let mut kb = keyboard();
    kb.source_mut().push_key(KEY_W, 1);
    kb.update().unwrap();

    kb.update().unwrap();
    assert!(kb.is_pressed(KEY_W));
    assert!(!kb.was_just_released(KEY_W));
}

#[test]
fn autorepeat_value_keeps_the_key_pressed() {
    let mut kb = keyboard();
    kb.source_mut().push_key(KEY_W, 1);
    kb.update().unwrap();
    // Kernel autorepeat reports value 2.
    kb.source_mut().push_key(KEY_W, 2);
    kb.update().unwrap();
    assert!(kb.is_pressed(KEY_W));
    assert!(!kb.was_just_released(KEY_W));
}

#[test]
fn non_key_events_are_ignored() {
    let mut kb = keyboard();
    kb.source_mut().push_other(0x00); // EV_SYN
    kb.source_mut().push_other(0x02); // EV_REL
    kb.update().unwrap();
    assert!(!kb.is_pressed(0));
}

#[test]
fn chorded_quit_combination_is_observable() {
    let mut kb = keyboard();
    kb.source_mut().push_key(KEY_LEFTCTRL, 1);
    kb.source_mut().push_key(KEY_C, 1);
    kb.update().unwrap();

    kb.source_mut().push_key(KEY_C, 0);
    kb.update().unwrap();
    assert!(kb.is_pressed(KEY_LEFTCTRL));
    assert!(kb.was_just_released(KEY_C));
}

#[test]
fn read_failure_propagates_out_of_update() {
    let mut kb = keyboard();
    kb.source_mut().fail_when_drained = true;
    kb.source_mut().push_key(KEY_W, 1);
    assert!(kb.update().is_err());
}
