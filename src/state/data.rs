//! Shared data structures for the gallery state
//!
//! These types flow between the photo source, the controller and the
//! tile grid.

use std::fmt;

/// URL of one displayable photo.
///
/// The API may return items without any usable URL. Such items keep their
/// slot in the link cache so absolute positions stay aligned with the
/// remote collection; the grid shows a placeholder for them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhotoLink(Option<String>);

impl PhotoLink {
    pub fn new(url: impl Into<String>) -> Self {
        PhotoLink(Some(url.into()))
    }

    /// A slot for an item that had no URL at all
    pub fn missing() -> Self {
        PhotoLink(None)
    }

    pub fn url(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_missing(&self) -> bool {
        self.0.is_none()
    }
}

impl fmt::Display for PhotoLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(url) => f.write_str(url),
            None => f.write_str("<missing>"),
        }
    }
}

/// Which end of the rendered window an operation works on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Start,
    End,
}

/// Arrow keys the gallery reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Left,
    Right,
    Up,
    Down,
}

impl NavKey {
    /// Selection step for this key on a grid with `columns` tiles per row
    pub fn step(self, columns: usize) -> isize {
        let columns = columns as isize;
        match self {
            NavKey::Left => -1,
            NavKey::Right => 1,
            NavKey::Up => -columns,
            NavKey::Down => columns,
        }
    }
}

/// Direction of a mouse wheel notch, in page terms (`Down` moves forward)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelDirection {
    Up,
    Down,
}

impl WheelDirection {
    pub fn step(self, columns: usize) -> isize {
        match self {
            WheelDirection::Up => -(columns as isize),
            WheelDirection::Down => columns as isize,
        }
    }
}

/// 1-based grid row of a window-relative index
pub fn row_of(index: usize, columns: usize) -> usize {
    index / columns + 1
}
