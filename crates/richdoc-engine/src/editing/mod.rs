/*!
 * # Editing Core Module
 *
 * The editing system is built from two layers:
 *
 * ### 1. Document Model
 * - The document is an owned tree of [`Node`]s: [`Element`]s carrying a
 *   block kind and ordered children, with [`TextRun`] leaves holding the
 *   literal text and its active [`Mark`]s.
 * - Nodes are addressed by [`Path`] (child indices from the root), and the
 *   [`Selection`] is an anchor/focus pair of [`Point`]s — a path plus a
 *   character offset into the run it names.
 * - [`Document`] bundles the tree with its selection and a version counter,
 *   and provides the primitive, order-preserving mutations: block kind
 *   changes, mark application with split-on-partial-coverage, and text
 *   insertion.
 *
 * ### 2. Command Engine
 * - All edits are represented as [`Cmd`] intents that compile down to the
 *   model primitives via [`Document::apply`], which keeps the tree,
 *   selection, and version in step and reports the result as a [`Patch`].
 * - [`Editor`] owns the single (document, selection) state between intents,
 *   applies each command to a scratch copy, and commits only on success, so
 *   a rejected intent never leaves partial state behind. Each successful
 *   intent notifies the registered change listener exactly once.
 *
 * ## Usage Pattern
 *
 * ```
 * use richdoc_engine::editing::{Cmd, Editor};
 *
 * // 1. Create an editor over the default single-paragraph document
 * let mut editor = Editor::new();
 *
 * // 2. Apply edits via commands
 * let patch = editor
 *     .dispatch(Cmd::InsertLiteral { text: "and".to_string() })
 *     .unwrap();
 * assert_eq!(patch.version, 1);
 *
 * // 3. Read the updated state back
 * assert!(editor.document().text().starts_with("and"));
 * ```
 */

// Module exports
pub mod commands;
pub mod document;
pub mod editor;
pub mod node;
pub mod patch;
pub mod point;

// Public API re-exports
pub use commands::Cmd;
pub use document::{DEFAULT_PLACEHOLDER, Document, PartialCoverage};
pub use editor::{ChangeListener, Editor};
pub use node::{AttrMap, Element, ElementKind, Mark, Node, TextRun};
pub use patch::Patch;
pub use point::{Path, Point, Selection};

/// Errors rejected at the engine boundary before any mutation is committed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    /// The selection does not resolve to a text run in the current tree, an
    /// offset is out of range, or the document has no blocks to address
    #[error("invalid selection: {0}")]
    InvalidSelection(String),
    /// The intent payload fails shape validation
    #[error("invalid intent: {0}")]
    InvalidIntent(String),
}
