#![forbid(unsafe_code)]

//! Keyboard shortcuts.

/// Keys the page reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    ArrowDown,
    ArrowUp,
    PageDown,
    PageUp,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` name. Unhandled keys give `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "Escape" | "Esc" => Self::Escape,
            "ArrowDown" => Self::ArrowDown,
            "ArrowUp" => Self::ArrowUp,
            "PageDown" => Self::PageDown,
            "PageUp" => Self::PageUp,
            _ => return None,
        })
    }

    #[must_use]
    pub const fn action(self) -> KeyAction {
        match self {
            Self::Escape => KeyAction::CloseMenu,
            Self::ArrowDown | Self::PageDown => KeyAction::ScrollPages(1),
            Self::ArrowUp | Self::PageUp => KeyAction::ScrollPages(-1),
        }
    }
}

/// What a key press asks the page to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    CloseMenu,
    /// Scroll by this many viewport heights.
    ScrollPages(i8),
}
