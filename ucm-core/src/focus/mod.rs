//! Keyboard focus cycling
//!
//! [`FocusController`] keeps an ordered cycle of named regions. Regions are
//! keyed by a stable name, so a whole panel can be swapped behind its slot
//! with [`FocusController::register_or_replace`] without moving focus.

use tracing::debug;

use crate::error::{FocusError, FocusResult};

/// Direction of a focus move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Tab
    Forward,
    /// Shift+Tab
    Backward,
}

/// A completed focus move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusChange {
    /// Region focused before the move
    pub from: String,
    /// Region focused after the move
    pub to: String,
}

impl FocusChange {
    /// Returns true if this move took focus away from `name`
    #[must_use]
    pub fn left(&self, name: &str) -> bool {
        self.from == name && self.to != name
    }

    /// Returns true if this move brought focus to `name`
    #[must_use]
    pub fn entered(&self, name: &str) -> bool {
        self.to == name && self.from != name
    }
}

#[derive(Debug, Clone)]
struct Region<T> {
    name: String,
    order: i32,
    target: T,
}

/// Ordered cycle of named focus regions
///
/// The first registered region holds focus initially. Regions are kept
/// sorted by their order hint; equal hints keep registration order.
#[derive(Debug, Clone)]
pub struct FocusController<T> {
    regions: Vec<Region<T>>,
    current: Option<String>,
}

impl<T> Default for FocusController<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FocusController<T> {
    /// Creates an empty controller
    #[must_use]
    pub const fn new() -> Self {
        Self {
            regions: Vec::new(),
            current: None,
        }
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.regions.iter().position(|r| r.name == name)
    }

    fn current_index(&self) -> Option<usize> {
        self.current.as_deref().and_then(|name| self.index_of(name))
    }

    /// Adds a region or replaces the target of an existing one
    ///
    /// An existing region keeps its position in the cycle and its order
    /// hint; only the target changes. Returns the replaced target.
    pub fn register_or_replace(
        &mut self,
        name: impl Into<String>,
        order: i32,
        target: T,
    ) -> Option<T> {
        let name = name.into();

        if let Some(index) = self.index_of(&name) {
            debug!(region = %name, "Replaced focus region target");
            return Some(std::mem::replace(&mut self.regions[index].target, target));
        }

        let position = self
            .regions
            .iter()
            .position(|r| r.order > order)
            .unwrap_or(self.regions.len());

        if self.current.is_none() {
            self.current = Some(name.clone());
        }
        debug!(region = %name, order, position, "Registered focus region");
        self.regions.insert(
            position,
            Region {
                name,
                order,
                target,
            },
        );
        None
    }

    /// Moves focus to the next or previous region, wrapping around
    ///
    /// # Errors
    ///
    /// Returns [`FocusError::NoRegions`] if nothing is registered.
    pub fn advance(&mut self, direction: Direction) -> FocusResult<FocusChange> {
        let len = self.regions.len();
        if len == 0 {
            return Err(FocusError::NoRegions);
        }

        let from_index = self.current_index().unwrap_or(0);
        let to_index = match direction {
            Direction::Forward => (from_index + 1) % len,
            Direction::Backward => (from_index + len - 1) % len,
        };

        Ok(self.move_to(from_index, to_index))
    }

    /// Moves focus directly to a named region
    ///
    /// # Errors
    ///
    /// Returns [`FocusError::UnknownRegion`] if no region has that name.
    pub fn focus(&mut self, name: &str) -> FocusResult<FocusChange> {
        let to_index = self
            .index_of(name)
            .ok_or_else(|| FocusError::UnknownRegion(name.to_string()))?;
        let from_index = self.current_index().unwrap_or(to_index);
        Ok(self.move_to(from_index, to_index))
    }

    fn move_to(&mut self, from_index: usize, to_index: usize) -> FocusChange {
        let change = FocusChange {
            from: self.regions[from_index].name.clone(),
            to: self.regions[to_index].name.clone(),
        };
        self.current = Some(change.to.clone());
        change
    }

    /// Returns the focused region's target
    #[must_use]
    pub fn current(&self) -> Option<&T> {
        self.current_index().map(|i| &self.regions[i].target)
    }

    /// Returns the focused region's name
    #[must_use]
    pub fn current_name(&self) -> Option<&str> {
        self.current_index().map(|i| self.regions[i].name.as_str())
    }

    /// Returns true if the named region has focus
    #[must_use]
    pub fn is_focused(&self, name: &str) -> bool {
        self.current_name() == Some(name)
    }

    /// Returns the target of a named region
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&T> {
        self.index_of(name).map(|i| &self.regions[i].target)
    }

    /// Iterates region names in cycle order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().map(|r| r.name.as_str())
    }

    /// Returns the number of regions
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Returns true if no region is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
