//! Decoded input events
//!
//! The terminal front end turns raw input into these values; the core never
//! sees escape sequences or terminal-specific key codes.

use std::time::Instant;

/// A decoded key press
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character key, including shifted letters and punctuation
    Char(char),
    /// A character pressed together with Ctrl
    Ctrl(char),
    /// Enter / Return
    Enter,
    /// Escape
    Esc,
    /// Backspace
    Backspace,
    /// Tab
    Tab,
    /// Shift+Tab
    BackTab,
    /// Arrow up
    Up,
    /// Arrow down
    Down,
    /// Arrow left
    Left,
    /// Arrow right
    Right,
    /// Page up
    PageUp,
    /// Page down
    PageDown,
    /// Home
    Home,
    /// End
    End,
}

impl Key {
    /// Returns the character this key would insert into a text buffer
    #[must_use]
    pub fn printable(self) -> Option<char> {
        match self {
            Self::Char(c) if !c.is_control() => Some(c),
            _ => None,
        }
    }
}

/// The list shown in the main area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum View {
    /// Configured SSH connections
    #[default]
    Ssh,
    /// Local Docker containers
    Docker,
}

impl View {
    /// All views in tab order
    pub const ALL: [Self; 2] = [Self::Ssh, Self::Docker];

    /// Display label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ssh => "SSH",
            Self::Docker => "Docker",
        }
    }

    /// Returns the view after this one, wrapping around
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Ssh => Self::Docker,
            Self::Docker => Self::Ssh,
        }
    }

    /// Returns the view before this one, wrapping around
    #[must_use]
    pub const fn previous(self) -> Self {
        // Two views: previous and next coincide
        self.next()
    }
}

/// An inbound event for the session dispatch loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A key was pressed
    Key(Key),
    /// A row was selected directly (e.g., by a pointer)
    Select(usize),
    /// The main view should change
    SwitchView(View),
    /// Periodic timer tick
    Tick(Instant),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printable() {
        assert_eq!(Key::Char('a').printable(), Some('a'));
        assert_eq!(Key::Char('\u{7}').printable(), None);
        assert_eq!(Key::Ctrl('u').printable(), None);
        assert_eq!(Key::Enter.printable(), None);
    }

    #[test]
    fn test_view_cycle() {
        assert_eq!(View::Ssh.next(), View::Docker);
        assert_eq!(View::Docker.next(), View::Ssh);
        assert_eq!(View::Ssh.previous(), View::Docker);
    }
}
