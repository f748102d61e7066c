// src/input/keyboard.rs

use anyhow::Result;

use super::device::EventSource;
use super::keys::{EV_KEY, KEY_CNT};

/// Per-key two-frame state machine over a drained event stream.
///
/// `update` resets the previous frame to all-false, then drains every pending
/// event and, per key event, moves that key's old current value into the
/// previous frame before overwriting the current one. So `previous[k]` means
/// "k was down at the moment of its most recent event this tick" and defaults
/// to false for keys with no event. This reset-then-detect shape is a
/// compatibility contract; it is deliberately not the conventional
/// shift-then-compare.
pub struct Keyboard<S: EventSource> {
    source: S,
    previous: [bool; KEY_CNT],
    current: [bool; KEY_CNT],
}

impl<S: EventSource> Keyboard<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            previous: [false; KEY_CNT],
            current: [false; KEY_CNT],
        }
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Drains the source to exhaustion and folds key events into the two
    /// frames. Invoked once per render tick.
    pub fn update(&mut self) -> Result<()> {
        self.previous = [false; KEY_CNT];

        while let Some(event) = self.source.poll_event()? {
            if event.kind != EV_KEY {
                continue;
            }
            let code = usize::from(event.code);
            assert!(code < KEY_CNT, "key code {code} out of range");
            self.previous[code] = self.current[code];
            self.current[code] = event.value != 0;
        }
        Ok(())
    }

    /// The key is down as of its last event.
    pub fn is_pressed(&self, key: u16) -> bool {
        let code = usize::from(key);
        assert!(code < KEY_CNT, "key code {code} out of range");
        self.current[code]
    }

    /// The key went from down to up within the last `update`.
    pub fn was_just_released(&self, key: u16) -> bool {
        let code = usize::from(key);
        assert!(code < KEY_CNT, "key code {code} out of range");
        self.previous[code] && !self.current[code]
    }
}
