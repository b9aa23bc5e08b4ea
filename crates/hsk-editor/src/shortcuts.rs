//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s, so every host
//! shares one set of bindings.

use crate::input::Modifiers;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── File ──
    New,
    Open,
    Save,

    // ── Edit ──
    Undo,
    Redo,
    Delete,
    Copy,
    Cut,
    Paste,

    // ── Transform ──
    RotateClockwise,
    ScaleUp,
    ScaleDown,

    // ── Interaction ──
    /// Abandon the current drag or cut gesture.
    Cancel,
}

/// Resolves key events into shortcut actions.
///
/// `meta` (⌘) and `ctrl` are interchangeable for command shortcuts.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        let cmd = modifiers.command();

        if cmd && modifiers.shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "n" | "N" => Some(ShortcutAction::New),
                "o" | "O" | "l" | "L" => Some(ShortcutAction::Open),
                "s" | "S" => Some(ShortcutAction::Save),
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "c" | "C" => Some(ShortcutAction::Copy),
                "x" | "X" => Some(ShortcutAction::Cut),
                "v" | "V" => Some(ShortcutAction::Paste),
                _ => None,
            };
        }

        match key {
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "r" | "R" => Some(ShortcutAction::RotateClockwise),
            "=" | "+" => Some(ShortcutAction::ScaleUp),
            "-" => Some(ShortcutAction::ScaleDown),
            "Escape" => Some(ShortcutAction::Cancel),
            _ => None,
        }
    }
}
