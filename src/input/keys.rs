// src/input/keys.rs

//! Event types and key codes of the kernel input subsystem. The numeric
//! values are a stable ABI shared with every other consumer of the event
//! devices; they must never be renumbered.

/// Event type: key press/release.
pub const EV_KEY: u16 = 0x01;

/// Size of the key-code space (`KEY_CNT`). State arrays are indexed by code.
pub const KEY_CNT: usize = 0x300;

pub const KEY_ESC: u16 = 1;
pub const KEY_W: u16 = 17;
pub const KEY_LEFTCTRL: u16 = 29;
pub const KEY_A: u16 = 30;
pub const KEY_S: u16 = 31;
pub const KEY_D: u16 = 32;
pub const KEY_LEFTSHIFT: u16 = 42;
pub const KEY_C: u16 = 46;
pub const KEY_UP: u16 = 103;
pub const KEY_LEFT: u16 = 105;
pub const KEY_RIGHT: u16 = 106;
pub const KEY_DOWN: u16 = 108;

/// Human-readable event type name, for trace logging.
pub fn event_type_name(kind: u16) -> &'static str {
    match kind {
        0x00 => "EV_SYN",
        0x01 => "EV_KEY",
        0x02 => "EV_REL",
        0x03 => "EV_ABS",
        0x04 => "EV_MSC",
        0x05 => "EV_SW",
        0x11 => "EV_LED",
        0x12 => "EV_SND",
        0x14 => "EV_REP",
        0x15 => "EV_FF",
        0x16 => "EV_PWR",
        0x17 => "EV_FF_STATUS",
        _ => "unknown",
    }
}
