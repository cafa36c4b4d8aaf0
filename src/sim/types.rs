use clap::ValueEnum;
use rdev::Key;
use serde::{Deserialize, Serialize};

/// How synthetic keystrokes reach the OS.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum KeystrokeBackend {
    /// Simulate key events directly (X11, Windows, macOS)
    #[default]
    Rdev,
    /// Spawn the xdotool utility
    Xdotool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSimCommand {
    TypeText(String),
    PressEnter,
}

/// The key to tap for a character of a formatted reading.
pub fn rdev_key(ch: char) -> Option<Key> {
    let key = match ch {
        '0' => Key::Num0,
        '1' => Key::Num1,
        '2' => Key::Num2,
        '3' => Key::Num3,
        '4' => Key::Num4,
        '5' => Key::Num5,
        '6' => Key::Num6,
        '7' => Key::Num7,
        '8' => Key::Num8,
        '9' => Key::Num9,
        '.' => Key::Dot,
        '-' => Key::Minus,
        _ => return None,
    };

    Some(key)
}
