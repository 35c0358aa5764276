//! Rendering boundary
//!
//! The session pushes a [`Frame`] to a [`Renderer`] after every event. The
//! renderer paints it however it likes and hands nothing back.

use std::collections::VecDeque;
use std::time::Instant;

use crate::input::View;
use crate::list::{Row, SortPolicy};
use crate::models::Container;
use crate::session::{FocusTarget, Mnemonic};

/// Rows of the active view
#[derive(Debug, Clone, Copy)]
pub enum FrameRows<'a> {
    /// SSH view rows
    Connections(&'a [Row]),
    /// Docker view rows
    Containers(&'a [Container]),
}

impl FrameRows<'_> {
    /// Number of visible rows
    #[must_use]
    pub const fn len(&self) -> usize {
        match self {
            Self::Connections(rows) => rows.len(),
            Self::Containers(rows) => rows.len(),
        }
    }

    /// Returns true if no row is visible
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Severity of a status message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    /// Confirmation of a completed action
    Info,
    /// A failed action
    Error,
}

/// A transient message shown in the status line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    /// Message text
    pub text: String,
    /// Severity
    pub level: StatusLevel,
    /// When the message disappears
    pub expires_at: Instant,
}

/// A panel drawn over the list
#[derive(Debug, Clone, Copy)]
pub enum Panel<'a> {
    /// Static text (info, inspect output, help)
    Text {
        /// Panel title
        title: &'a str,
        /// Panel content
        body: &'a str,
    },
    /// Followed container logs
    Logs {
        /// Panel title
        title: &'a str,
        /// Lines received so far
        lines: &'a VecDeque<String>,
        /// Whether consumption is paused
        paused: bool,
    },
    /// A yes/no question
    Confirm {
        /// Question text
        prompt: &'a str,
    },
}

/// Everything needed to paint one screen
#[derive(Debug, Clone)]
pub struct Frame<'a> {
    /// Active view
    pub view: View,
    /// Visible rows of the active view
    pub rows: FrameRows<'a>,
    /// Selected row position, if any row is visible
    pub selected: Option<usize>,
    /// Target of the focused region
    pub focus: Option<FocusTarget>,
    /// Whether keys currently edit the filter
    pub filter_active: bool,
    /// Filter buffer, kept while inactive
    pub filter_buffer: &'a str,
    /// Current status message
    pub status: Option<&'a StatusMessage>,
    /// Key hints for the current context
    pub mnemonics: Vec<Mnemonic>,
    /// Highlighted hint while the actions region has focus
    pub action_cursor: Option<usize>,
    /// Open overlay panel
    pub panel: Option<Panel<'a>>,
    /// SSH row ordering
    pub sort: SortPolicy,
    /// SSH favorites-only toggle
    pub favorites_only: bool,
    /// Docker show-all toggle
    pub show_all: bool,
}

/// Paints frames
pub trait Renderer {
    /// Paints one frame
    fn render(&mut self, frame: &Frame<'_>);
}
