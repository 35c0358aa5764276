//! Real-time list filtering
//!
//! [`FilterEngine`] is a two-state machine. While **Inactive**, character keys
//! are commands and pass through untouched. While **Active**, every printable
//! key goes into the buffer and nothing is dispatched as a command. The buffer
//! survives deactivation; clearing it is a separate action.
//!
//! Matching is a pure function of the buffer and the searched fields: a row
//! matches when the case-folded buffer is a substring of at least one
//! case-folded field value. An empty buffer matches everything.

use tracing::debug;

use crate::input::Key;
use crate::models::{Connection, Container};

/// A field that can be searched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchField {
    /// Connection or container name
    Name,
    /// Connection address
    Address,
    /// Connection user
    User,
    /// Connection category
    Category,
    /// Container ID
    ContainerId,
    /// Container image
    Image,
}

/// Fields searched in the SSH view
pub const CONNECTION_FIELDS: [SearchField; 4] = [
    SearchField::Name,
    SearchField::Address,
    SearchField::User,
    SearchField::Category,
];

/// Fields searched in the Docker view
pub const CONTAINER_FIELDS: [SearchField; 3] = [
    SearchField::ContainerId,
    SearchField::Name,
    SearchField::Image,
];

/// Something with searchable text fields
pub trait Searchable {
    /// Returns the value of a field, or `None` if the item lacks it
    fn field(&self, field: SearchField) -> Option<&str>;
}

impl Searchable for Connection {
    fn field(&self, field: SearchField) -> Option<&str> {
        match field {
            SearchField::Name => Some(&self.name),
            SearchField::Address => Some(&self.address),
            SearchField::User => self.user.as_deref(),
            SearchField::Category => self.category.as_deref(),
            SearchField::ContainerId | SearchField::Image => None,
        }
    }
}

impl Searchable for Container {
    fn field(&self, field: SearchField) -> Option<&str> {
        match field {
            SearchField::ContainerId => Some(&self.id),
            SearchField::Name => Some(&self.name),
            SearchField::Image => Some(&self.image),
            SearchField::Address | SearchField::User | SearchField::Category => None,
        }
    }
}

/// A case-folded needle, prepared once per recomputation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matcher {
    needle: String,
}

impl Matcher {
    /// Prepares a matcher for the given buffer
    #[must_use]
    pub fn new(buffer: &str) -> Self {
        Self {
            needle: buffer.to_lowercase(),
        }
    }

    /// Returns true if this matcher accepts everything
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    /// Returns true if any of the given fields contains the needle
    pub fn matches<T: Searchable + ?Sized>(&self, item: &T, fields: &[SearchField]) -> bool {
        if self.needle.is_empty() {
            return true;
        }
        fields.iter().any(|&field| {
            item.field(field)
                .is_some_and(|value| value.to_lowercase().contains(&self.needle))
        })
    }
}

/// Returns true if `item` matches `buffer` on any of `fields`
pub fn matches<T: Searchable + ?Sized>(buffer: &str, fields: &[SearchField], item: &T) -> bool {
    Matcher::new(buffer).matches(item, fields)
}

/// Returns the indices of the items matching `buffer`, in order
pub fn filter_indices<T: Searchable>(items: &[T], buffer: &str, fields: &[SearchField]) -> Vec<usize> {
    let matcher = Matcher::new(buffer);
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| matcher.matches(*item, fields))
        .map(|(i, _)| i)
        .collect()
}

/// Filter activation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Keys are commands
    #[default]
    Inactive,
    /// Keys edit the buffer
    Active,
}

/// What the engine did with a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterResponse {
    /// The key is not for the filter; dispatch it as a command
    Ignored,
    /// The key was swallowed without changing anything
    Consumed,
    /// The filter became active
    Activated,
    /// The filter became inactive
    Deactivated,
    /// The buffer changed; matched rows must be recomputed
    BufferChanged,
}

/// Filter activation state machine and buffer
#[derive(Debug, Clone)]
pub struct FilterEngine {
    mode: FilterMode,
    buffer: String,
    fields: Vec<SearchField>,
}

impl FilterEngine {
    /// Key that activates the filter while it is inactive
    pub const ACTIVATION_KEY: Key = Key::Char('/');

    /// Creates an inactive engine searching the given fields
    #[must_use]
    pub fn new(fields: &[SearchField]) -> Self {
        Self {
            mode: FilterMode::Inactive,
            buffer: String::new(),
            fields: fields.to_vec(),
        }
    }

    /// Returns the current mode
    #[must_use]
    pub const fn mode(&self) -> FilterMode {
        self.mode
    }

    /// Returns true while keys edit the buffer
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.mode == FilterMode::Active
    }

    /// Returns the current buffer
    #[must_use]
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Returns the searched fields
    #[must_use]
    pub fn fields(&self) -> &[SearchField] {
        &self.fields
    }

    /// Replaces the searched fields (used when the view changes)
    pub fn set_fields(&mut self, fields: &[SearchField]) {
        self.fields = fields.to_vec();
    }

    /// Returns a matcher for the current buffer
    #[must_use]
    pub fn matcher(&self) -> Matcher {
        Matcher::new(&self.buffer)
    }

    /// Returns true if `item` matches the current buffer
    pub fn matches<T: Searchable + ?Sized>(&self, item: &T) -> bool {
        self.matcher().matches(item, &self.fields)
    }

    /// Enters the active state, keeping the buffer
    ///
    /// Returns true if the state changed.
    pub fn activate(&mut self) -> bool {
        if self.is_active() {
            return false;
        }
        self.mode = FilterMode::Active;
        debug!(buffer = %self.buffer, "Filter activated");
        true
    }

    /// Returns to the inactive state, keeping the buffer
    ///
    /// Returns true if the state changed.
    pub fn deactivate(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.mode = FilterMode::Inactive;
        debug!(buffer = %self.buffer, "Filter deactivated");
        true
    }

    /// Focus moved away from the filter region
    pub fn on_focus_lost(&mut self) -> bool {
        self.deactivate()
    }

    /// Empties the buffer
    ///
    /// Returns true if the buffer changed.
    pub fn clear(&mut self) -> bool {
        if self.buffer.is_empty() {
            return false;
        }
        self.buffer.clear();
        true
    }

    /// Removes the last character of the buffer
    ///
    /// Returns true if the buffer changed.
    pub fn backspace(&mut self) -> bool {
        self.buffer.pop().is_some()
    }

    /// Feeds a key through the state machine
    pub fn handle_key(&mut self, key: Key) -> FilterResponse {
        match self.mode {
            FilterMode::Inactive => {
                if key == Self::ACTIVATION_KEY {
                    self.activate();
                    FilterResponse::Activated
                } else {
                    FilterResponse::Ignored
                }
            }
            FilterMode::Active => self.handle_active_key(key),
        }
    }

    fn handle_active_key(&mut self, key: Key) -> FilterResponse {
        let changed = match key {
            Key::Esc | Key::Enter => {
                self.deactivate();
                return FilterResponse::Deactivated;
            }
            Key::Backspace => self.backspace(),
            Key::Ctrl('u') => self.clear(),
            Key::Char(c) if !c.is_control() => {
                self.buffer.push(c);
                true
            }
            Key::Char(_) => false,
            _ => return FilterResponse::Ignored,
        };

        if changed {
            FilterResponse::BufferChanged
        } else {
            FilterResponse::Consumed
        }
    }
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::new(&CONNECTION_FIELDS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(engine: &mut FilterEngine, text: &str) {
        for c in text.chars() {
            engine.handle_key(Key::Char(c));
        }
    }

    #[test]
    fn test_prod_scenario() {
        let rows = vec![
            Connection::new("prod-web", "10.0.0.1"),
            Connection::new("dev-web", "10.0.0.2"),
        ];
        assert_eq!(filter_indices(&rows, "prod", &CONNECTION_FIELDS), vec![0]);
        assert_eq!(filter_indices(&rows, "", &CONNECTION_FIELDS), vec![0, 1]);
    }

    #[test]
    fn test_case_folding_and_optional_fields() {
        let conn = Connection::new("Web", "10.0.0.1")
            .with_user("Deploy")
            .with_category("PROD");
        assert!(matches("web", &CONNECTION_FIELDS, &conn));
        assert!(matches("deploy", &CONNECTION_FIELDS, &conn));
        assert!(matches("Prod", &CONNECTION_FIELDS, &conn));
        assert!(!matches("prod", &[SearchField::Name], &conn));
        assert!(!matches("staging", &CONNECTION_FIELDS, &conn));
    }

    #[test]
    fn test_container_fields() {
        let container = Container::new("abc123", "api", "nginx:latest", "Up 2 hours");
        assert!(matches("ABC", &CONTAINER_FIELDS, &container));
        assert!(matches("nginx", &CONTAINER_FIELDS, &container));
        assert!(!matches("hours", &CONTAINER_FIELDS, &container));
    }

    #[test]
    fn test_inactive_passes_command_keys() {
        let mut engine = FilterEngine::default();
        assert_eq!(engine.handle_key(Key::Char('f')), FilterResponse::Ignored);
        assert_eq!(engine.handle_key(Key::Backspace), FilterResponse::Ignored);
        assert_eq!(engine.buffer(), "");
    }

    #[test]
    fn test_active_consumes_command_keys() {
        let mut engine = FilterEngine::default();
        assert_eq!(engine.handle_key(Key::Char('/')), FilterResponse::Activated);
        assert_eq!(engine.handle_key(Key::Char('f')), FilterResponse::BufferChanged);
        assert_eq!(engine.handle_key(Key::Char('/')), FilterResponse::BufferChanged);
        assert_eq!(engine.buffer(), "f/");
    }

    #[test]
    fn test_buffer_retained_across_deactivation() {
        let mut engine = FilterEngine::default();
        engine.activate();
        type_str(&mut engine, "prod");
        assert_eq!(engine.handle_key(Key::Esc), FilterResponse::Deactivated);
        assert_eq!(engine.buffer(), "prod");

        engine.handle_key(Key::Char('/'));
        assert!(engine.is_active());
        assert_eq!(engine.buffer(), "prod");
    }

    #[test]
    fn test_backspace_and_clear() {
        let mut engine = FilterEngine::default();
        engine.activate();
        type_str(&mut engine, "ab");
        assert_eq!(engine.handle_key(Key::Backspace), FilterResponse::BufferChanged);
        assert_eq!(engine.buffer(), "a");
        assert_eq!(engine.handle_key(Key::Ctrl('u')), FilterResponse::BufferChanged);
        assert_eq!(engine.buffer(), "");
        assert_eq!(engine.handle_key(Key::Backspace), FilterResponse::Consumed);
    }

    #[test]
    fn test_navigation_keys_pass_through_while_active() {
        let mut engine = FilterEngine::default();
        engine.activate();
        assert_eq!(engine.handle_key(Key::Tab), FilterResponse::Ignored);
        assert_eq!(engine.handle_key(Key::Down), FilterResponse::Ignored);
        assert!(engine.is_active());
    }

    #[test]
    fn test_focus_loss_deactivates_without_clearing() {
        let mut engine = FilterEngine::default();
        engine.activate();
        type_str(&mut engine, "db");
        assert!(engine.on_focus_lost());
        assert!(!engine.is_active());
        assert_eq!(engine.buffer(), "db");
        assert!(!engine.on_focus_lost());
    }
}
