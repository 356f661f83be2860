use serde::{Deserialize, Serialize};

/// Ordered child indices from the document root down to a text run
pub type Path = Vec<usize>;

/// A single location in the document: the path of a text run plus a
/// character offset within it.
///
/// Points order lexicographically by path, then by offset, which is
/// document order for run-level points.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Point {
    pub path: Path,
    pub offset: usize,
}

impl Point {
    pub fn new(path: impl Into<Path>, offset: usize) -> Self {
        Self {
            path: path.into(),
            offset,
        }
    }
}

/// An anchor/focus pair of points. The anchor is where the selection was
/// started, the focus where it currently ends; either may come first in
/// document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    /// A cursor: both ends at the same point
    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn range(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// The earlier of the two points in document order
    pub fn start(&self) -> &Point {
        if self.anchor <= self.focus {
            &self.anchor
        } else {
            &self.focus
        }
    }

    /// The later of the two points in document order
    pub fn end(&self) -> &Point {
        if self.anchor <= self.focus {
            &self.focus
        } else {
            &self.anchor
        }
    }

    /// True when the anchor is the later point (a backward selection)
    pub fn is_reversed(&self) -> bool {
        self.focus < self.anchor
    }
}
