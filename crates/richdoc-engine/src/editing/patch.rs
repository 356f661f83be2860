use crate::editing::point::{Path, Selection};

/// Result of applying a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Paths of the top-level blocks the command touched
    pub changed: Vec<Path>,
    /// Selection after the command
    pub new_selection: Selection,
    /// Document version after the command
    pub version: u64,
}
